use pest::Parser;

use crate::errors::TranslateError;
use crate::fragment::{Binding, Fragment, Target, Translation, TranslateResult};
use crate::series::{SeriesFn, SubAllocator};
use crate::synth::{Stack, UNARY_MINUS};

#[derive(Parser)]
#[grammar = "math.pest"]
pub struct MathParser;

const DEFAULT_PRECISION: u32 = 2;
const DEFAULT_TERMS: u32 = 3;
const MAX_PRECISION: i64 = 10;
const MAX_TERMS: i64 = 15;

const USAGE: &str = "\
Supported operators and functions:
    +  -  *  /
    ** (exponent must be a non-negative integer literal)
    exp  ln  sqrt
    sin  cos  tan
Statements:
    <name> = <expression>     capture an expression under a name
    precision = <0..10>       decimal digits kept in the final result
    term = <0..15>            series terms kept for the functions above
    help                      this summary";

/// holds one captured assignment
pub struct NamedExpr {
    name: String,
    expr: String,
}

impl NamedExpr {
    fn new(name: &str, expr: String) -> Self {
        NamedExpr {
            name: name.to_string(),
            expr,
        }
    }
}

/// Session state carried across statements: the symbol table, the rounding
/// precision, and the series truncation order. One statement never sees
/// another's intermediates except through explicit assignments.
pub struct Session {
    names: Vec<NamedExpr>,
    precision: u32,
    term_count: u32,
}

impl Default for Session {
    fn default() -> Session {
        Session {
            names: Vec::new(),
            precision: DEFAULT_PRECISION,
            term_count: DEFAULT_TERMS,
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Default::default()
    }

    /// Decimal digits kept in the final result
    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Series terms kept for transcendental functions
    pub fn term_count(&self) -> u32 {
        self.term_count
    }

    /// Returns the expression captured under `name`. Names are case-insensitive
    pub fn lookup(&self, name: &str) -> Option<&str> {
        let low = name.to_lowercase();
        for v in &self.names {
            if v.name == low {
                return Some(&v.expr);
            }
        }
        None
    }

    /// Captures an expression, replacing any previous capture of the name
    pub fn assign(&mut self, name: &str, expr: String) {
        let name = name.to_lowercase();
        for v in &mut self.names {
            if v.name == name {
                v.expr = expr;
                return;
            }
        }
        self.names.push(NamedExpr::new(&name, expr));
    }

    fn set_precision(&mut self, value: i64, out: &mut Translation) {
        if (0..=MAX_PRECISION).contains(&value) {
            self.precision = value as u32;
            out.notes.push(format!("New precision is: {}", value));
        } else {
            out.report(TranslateError::PrecisionRange(value));
        }
    }

    fn set_term_count(&mut self, value: i64, out: &mut Translation) {
        if (0..=MAX_TERMS).contains(&value) {
            self.term_count = value as u32;
            out.notes.push(format!("New series term is: {}", value));
        } else {
            out.report(TranslateError::TermRange(value));
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Tok {
    Number(i64),
    Name(String),
    QueryVar(String),
    Func(SeriesFn),
    Help,
    Precision,
    Term,
    Exit,
    Plus,
    Minus,
    Times,
    Divide,
    Pow,
    Equals,
    OpenB,
    CloseB,
}

fn classify(ident: &str) -> Tok {
    let low = ident.to_lowercase();
    if let Some(func) = SeriesFn::from_keyword(&low) {
        return Tok::Func(func);
    }
    match low.as_str() {
        "help" => Tok::Help,
        "precision" => Tok::Precision,
        "term" => Tok::Term,
        "exit" | "quit" => Tok::Exit,
        _ => Tok::Name(low),
    }
}

// One pass over the line. Lexical trouble (an unrecognized character, an
// oversized literal) is reported on `out` and lexing continues.
fn tokenize(line: &str, out: &mut Translation) -> Result<Vec<Tok>, TranslateError> {
    let pairs = match MathParser::parse(Rule::line, line) {
        Ok(p) => p,
        Err(..) => return Err(TranslateError::Syntax(line.to_string())),
    };

    let mut toks = Vec::new();
    for pair in pairs {
        let rule = pair.as_rule();
        let text = pair.as_str();
        match rule {
            Rule::number => match text.parse::<i64>() {
                Ok(n) => toks.push(Tok::Number(n)),
                Err(..) => {
                    out.report(TranslateError::NumberTooLarge(text.to_string()));
                    toks.push(Tok::Number(0));
                }
            },
            Rule::ident => toks.push(classify(text)),
            Rule::qvar => toks.push(Tok::QueryVar(text.to_string())),
            Rule::pow => toks.push(Tok::Pow),
            Rule::times => toks.push(Tok::Times),
            Rule::divide => toks.push(Tok::Divide),
            Rule::plus => toks.push(Tok::Plus),
            Rule::minus => toks.push(Tok::Minus),
            Rule::equals => toks.push(Tok::Equals),
            Rule::open_b => toks.push(Tok::OpenB),
            Rule::close_b => toks.push(Tok::CloseB),
            Rule::illegal => {
                out.report(TranslateError::IllegalChar(text.chars().next().unwrap_or('?')));
            }
            Rule::EOI => {}
            _ => return Err(TranslateError::Unreachable),
        }
    }
    Ok(toks)
}

// Feeds the expression tokens through the synthesis stack. `last_value`
// distinguishes binary from unary minus: a minus not preceded by a value
// negates its operand.
fn synthesize_expr(
    toks: &[Tok],
    session: &Session,
    out: &mut Translation,
) -> Result<Fragment, TranslateError> {
    let mut stack = Stack::new();
    let mut alloc = SubAllocator::new();
    let mut last_value = false;
    for tok in toks {
        match tok {
            Tok::Number(n) => {
                stack.push_frag(Fragment::Number(*n));
                last_value = true;
            }
            Tok::QueryVar(v) => {
                // pass-through to the query engine, coerced to a number
                stack.push_frag(Fragment::Inline(format!("xsd:double({})", v)));
                last_value = true;
            }
            Tok::Name(name) => {
                match session.lookup(name) {
                    Some(expr) => stack.push_frag(Fragment::Inline(expr.to_string())),
                    None => {
                        out.report(TranslateError::UndefinedName(name.clone()));
                        stack.push_frag(Fragment::Inline("0".to_string()));
                    }
                }
                last_value = true;
            }
            Tok::Func(func) => {
                stack.push_op(func.keyword())?;
                last_value = false;
            }
            Tok::Minus => {
                if last_value {
                    stack.push_op("-")?;
                } else {
                    stack.push_op(UNARY_MINUS)?;
                }
                last_value = false;
            }
            Tok::Plus => {
                stack.push_op("+")?;
                last_value = false;
            }
            Tok::Times => {
                stack.push_op("*")?;
                last_value = false;
            }
            Tok::Divide => {
                stack.push_op("/")?;
                last_value = false;
            }
            Tok::Pow => {
                stack.push_op("**")?;
                last_value = false;
            }
            Tok::OpenB => {
                stack.push_op("(")?;
                last_value = false;
            }
            Tok::CloseB => {
                stack.push_op(")")?;
                last_value = true;
            }
            Tok::Equals => return Err(TranslateError::Syntax("=".to_string())),
            Tok::Help => return Err(TranslateError::Syntax("help".to_string())),
            Tok::Precision => return Err(TranslateError::Syntax("precision".to_string())),
            Tok::Term => return Err(TranslateError::Syntax("term".to_string())),
            Tok::Exit => return Err(TranslateError::Syntax("exit".to_string())),
        }
    }
    stack.synthesize(session.term_count, &mut alloc, out)
}

/// Translates one statement line. The returned [`Translation`] carries the
/// emitted bindings plus any user-facing notes; a syntax error discards the
/// statement and leaves the session untouched.
pub fn translate(line: &str, session: &mut Session) -> TranslateResult {
    let mut out = Translation::default();
    let toks = tokenize(line, &mut out)?;
    log::debug!("tokens: {:?}", toks);

    match toks.as_slice() {
        // blank lines and the shell's exit sentinels are not statements
        [] | [Tok::Exit] => Ok(out),
        [Tok::Help] => {
            out.notes.push(USAGE.to_string());
            Ok(out)
        }
        [Tok::Precision, Tok::Equals, Tok::Number(n)] => {
            session.set_precision(*n, &mut out);
            Ok(out)
        }
        [Tok::Term, Tok::Equals, Tok::Number(n)] => {
            session.set_term_count(*n, &mut out);
            Ok(out)
        }
        [Tok::Name(name), Tok::Equals, rest @ ..] => {
            let frag = synthesize_expr(rest, session, &mut out)?;
            session.assign(name, frag.to_string());
            out.verify_order()?;
            Ok(out)
        }
        _ => {
            let frag = synthesize_expr(&toks, session, &mut out)?;
            let threshold = 10u64.pow(session.precision);
            out.bindings.push(Binding {
                expr: format!("FLOOR(({})*{})/{}", frag, threshold, threshold),
                target: Target::Result,
            });
            out.verify_order()?;
            Ok(out)
        }
    }
}
