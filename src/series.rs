use lazy_static::lazy_static;
use num_bigint::BigInt;
use num_traits::One;

use crate::fragment::{Binding, Fragment, Target, Translation};

/// 2*pi truncated to 11 decimal digits. One shared constant (and one shared
/// `reduced()` helper) keeps the sin and cos series of the same argument
/// textually in phase, which the tan ratio relies on.
const TWO_PI: &str = "6.28318530718";

lazy_static! {
    // 0!..29! - 29! is the largest coefficient a 15-term sine series asks for
    static ref FACTORIALS: Vec<BigInt> = {
        let mut t = vec![BigInt::one()];
        for i in 1..=29u32 {
            let next = &t[(i - 1) as usize] * i;
            t.push(next);
        }
        t
    };
}

fn factorial(n: u32) -> &'static BigInt {
    &FACTORIALS[n as usize]
}

/// The transcendental operators rewritten into truncated series
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeriesFn {
    Exp,
    Ln,
    Sqrt,
    Sin,
    Cos,
    Tan,
}

impl SeriesFn {
    pub(crate) fn from_keyword(s: &str) -> Option<SeriesFn> {
        match s.to_lowercase().as_str() {
            "exp" => Some(SeriesFn::Exp),
            "ln" => Some(SeriesFn::Ln),
            "sqrt" => Some(SeriesFn::Sqrt),
            "sin" => Some(SeriesFn::Sin),
            "cos" => Some(SeriesFn::Cos),
            "tan" => Some(SeriesFn::Tan),
            _ => None,
        }
    }

    pub(crate) fn keyword(self) -> &'static str {
        match self {
            SeriesFn::Exp => "exp",
            SeriesFn::Ln => "ln",
            SeriesFn::Sqrt => "sqrt",
            SeriesFn::Sin => "sin",
            SeriesFn::Cos => "cos",
            SeriesFn::Tan => "tan",
        }
    }
}

/// Issues fresh `?subN` identifiers within one statement; reset by starting
/// a new allocator for the next statement
pub struct SubAllocator {
    next: usize,
}

impl SubAllocator {
    pub fn new() -> Self {
        SubAllocator { next: 1 }
    }

    /// Reserves `count` consecutive identifiers and returns the first one
    pub fn reserve(&mut self, count: usize) -> usize {
        let first = self.next;
        self.next += count;
        first
    }
}

impl Default for SubAllocator {
    fn default() -> Self {
        SubAllocator::new()
    }
}

/// Emits the binding statements for one transcendental call and returns the
/// fragment the enclosing expression should reference. Simple series take one
/// identifier and one binding; sqrt and tan take two, with the binding the
/// second one references emitted first.
pub fn synthesize(
    func: SeriesFn,
    arg: &Fragment,
    term_count: u32,
    alloc: &mut SubAllocator,
    out: &mut Translation,
) -> Fragment {
    let s = arg.to_string();
    log::debug!("{} series over {} terms of {}", func.keyword(), term_count, s);
    match func {
        SeriesFn::Exp => single(exp_terms(&s, term_count), alloc, out),
        SeriesFn::Ln => single(format!("2*({})", atanh_terms(&s, term_count)), alloc, out),
        SeriesFn::Sqrt => {
            // exp(ln(x)/2): the atanh series without ln's leading factor 2,
            // then the exp series over that intermediate. Does not converge
            // for x <= 0, same as ln.
            let first = alloc.reserve(2);
            bind(out, atanh_terms(&s, term_count), first);
            let half_ln = Fragment::Ref(first).to_string();
            bind(out, exp_terms(&half_ln, term_count), first + 1);
            Fragment::Ref(first + 1)
        }
        SeriesFn::Sin => single(wave_terms(&s, term_count, true), alloc, out),
        SeriesFn::Cos => single(wave_terms(&s, term_count, false), alloc, out),
        SeriesFn::Tan => {
            // sin(x)/cos(x); near a cosine zero the downstream engine divides
            // by whatever the truncated series produces
            let first = alloc.reserve(2);
            bind(out, wave_terms(&s, term_count, true), first);
            bind(out, wave_terms(&s, term_count, false), first + 1);
            Fragment::Inline(format!("?sub{}/?sub{}", first, first + 1))
        }
    }
}

fn single(expr: String, alloc: &mut SubAllocator, out: &mut Translation) -> Fragment {
    let id = alloc.reserve(1);
    bind(out, expr, id);
    Fragment::Ref(id)
}

fn bind(out: &mut Translation, expr: String, id: usize) {
    out.bindings.push(Binding {
        expr,
        target: Target::Sub(id),
    });
}

/// `1*f*f*...*f` with `n` factors; also the expansion of an integer power
pub(crate) fn power_chain(factor: &str, n: u64) -> String {
    let mut s = String::from("1");
    for _ in 0..n {
        s.push('*');
        s.push_str(factor);
    }
    s
}

// argument folded into one period before powering
fn reduced(arg: &str) -> String {
    format!(" ({}-{}*FLOOR({}/{}) )", arg, TWO_PI, arg, TWO_PI)
}

// Maclaurin series of e^x over the rendered base
fn exp_terms(base: &str, terms: u32) -> String {
    let mut series = String::from("0");
    for n in 0..terms {
        series.push('+');
        series.push_str(&format!("({})/{}.0", power_chain(base, u64::from(n)), factorial(n)));
    }
    series
}

// area-hyperbolic-tangent series; sums to ln(x)/2, ln adds the factor 2
fn atanh_terms(arg: &str, terms: u32) -> String {
    let ratio = format!("(({}-1)/({}+1))", arg, arg);
    let mut series = String::from("0");
    for n in 0..terms {
        let p = 2 * n + 1;
        series.push('+');
        series.push_str(&format!("({})/{}.0", power_chain(&ratio, u64::from(p)), p));
    }
    series
}

// sine (odd powers over (2n+1)!) or cosine (even powers over (2n)!)
fn wave_terms(arg: &str, terms: u32, odd: bool) -> String {
    let r = reduced(arg);
    let mut series = String::from("0");
    for n in 0..terms {
        let p = if odd { 2 * n + 1 } else { 2 * n };
        let sign = if n % 2 == 0 { "1" } else { "-1" };
        series.push('+');
        series.push_str(&format!("{}*({})/{}.0", sign, power_chain(&r, u64::from(p)), factorial(p)));
    }
    series
}
