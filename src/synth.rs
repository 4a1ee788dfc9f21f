use crate::errors::TranslateError;
use crate::fragment::{Fragment, SynthResult, Translation};
use crate::series::{self, SeriesFn, SubAllocator};

#[derive(Clone, Debug)]
pub(crate) enum Entry {
    Frag(Fragment),
    Op(String, i32, bool),
    OpenB,
    // grouping marker: reinstates source parentheses lost by the infix-to-RPN
    // step, which textual synthesis (unlike numeric evaluation) must keep
    Group,
}

pub(crate) const UNARY_MINUS: &str = "---";

/// Infix-to-RPN stack over fragments. `push_*` feed it one token at a time,
/// `synthesize` reduces the reordered stream bottom-up into a single fragment,
/// emitting intermediate bindings for series calls along the way.
pub(crate) struct Stack {
    queue: Vec<Entry>,
    output: Vec<Entry>,
    frags: Vec<Fragment>,
}

// prefix function keywords ride the same table as operators: they bind only
// the immediately following operand, tighter than `**`, looser than negation
fn priority(op: &str) -> (i32, bool) {
    match op {
        UNARY_MINUS => (20, true),
        "sin" | "cos" | "tan" => (19, true),
        "exp" | "ln" | "sqrt" => (18, true),
        "**" => (17, false),
        "*" | "/" => (12, false),
        "+" | "-" => (8, false),
        _ => (0, false), // invalid op
    }
}

impl Stack {
    pub(crate) fn new() -> Self {
        Stack {
            queue: Vec::new(),
            output: Vec::new(),
            frags: Vec::new(),
        }
    }

    pub(crate) fn push_frag(&mut self, frag: Fragment) {
        self.output.push(Entry::Frag(frag));
    }

    pub(crate) fn push_op(&mut self, op: &str) -> SynthResult {
        if op == "(" {
            self.queue.push(Entry::OpenB);
            return Ok(());
        }
        if op == ")" {
            self.pop_until_bracket()?;
            self.output.push(Entry::Group);
            return Ok(());
        }

        let (pri, right_assoc) = priority(op);
        if pri == 0 {
            return Err(TranslateError::Syntax(op.to_string()));
        }

        self.pop_while_priority(pri);
        self.queue.push(Entry::Op(op.to_string(), pri, right_assoc));
        Ok(())
    }

    // move operators from the queue to output while the top operator in the
    // queue has equal or greater priority
    fn pop_while_priority(&mut self, priority: i32) {
        loop {
            let e = match self.queue.pop() {
                Some(e) => e,
                None => return,
            };
            match &e {
                Entry::OpenB => {
                    self.queue.push(e);
                    return;
                }
                Entry::Op(_, p, right) => {
                    if *p > priority || (*p == priority && !*right) {
                        self.output.push(e);
                    } else {
                        self.queue.push(e);
                        return;
                    }
                }
                _ => return, // unreachable
            }
        }
    }

    // move operators from the queue to output until the matching bracket
    fn pop_until_bracket(&mut self) -> SynthResult {
        loop {
            match self.queue.pop() {
                None => return Err(TranslateError::Unbalanced),
                Some(Entry::OpenB) => return Ok(()),
                Some(e) => self.output.push(e),
            }
        }
    }

    // move the remaining operators to output once the statement ends; an
    // unclosed bracket is tolerated, matching the forgiving bracket handling
    // of the surrounding statement language
    fn pop_all(&mut self) -> SynthResult {
        while let Some(e) = self.queue.pop() {
            match &e {
                Entry::OpenB => {}
                Entry::Op(..) => self.output.push(e),
                _ => return Err(TranslateError::Unreachable),
            }
        }
        Ok(())
    }

    /// Reduces the accumulated statement to its final fragment
    pub(crate) fn synthesize(
        &mut self,
        term_count: u32,
        alloc: &mut SubAllocator,
        out: &mut Translation,
    ) -> Result<Fragment, TranslateError> {
        self.pop_all()?;
        if self.output.is_empty() {
            return Err(TranslateError::EmptyExpression);
        }

        self.frags = Vec::new();
        for i in 0..self.output.len() {
            let e = self.output[i].clone();
            match e {
                Entry::Frag(fr) => self.frags.push(fr),
                Entry::Group => {
                    let inner = self.pop1()?;
                    self.frags.push(Fragment::Inline(format!("({})", inner)));
                }
                Entry::Op(name, ..) => self.apply(&name, term_count, alloc, out)?,
                Entry::OpenB => return Err(TranslateError::Unreachable),
            }
        }

        if self.frags.len() != 1 {
            return Err(TranslateError::InsufficientOps);
        }
        // exactly one fragment left - unwrap is fine
        Ok(self.frags.pop().unwrap())
    }

    fn apply(
        &mut self,
        op: &str,
        term_count: u32,
        alloc: &mut SubAllocator,
        out: &mut Translation,
    ) -> SynthResult {
        match op {
            "+" | "-" | "*" | "/" => {
                // plain concatenation: token order survives the RPN round trip,
                // and the target language shares the arithmetic precedence
                let (l, r) = self.pop2()?;
                self.frags.push(Fragment::Inline(format!("{}{}{}", l, op, r)));
                Ok(())
            }
            "**" => self.power(),
            UNARY_MINUS => {
                let v = self.pop1()?;
                self.frags.push(Fragment::Inline(format!("-{}", v)));
                Ok(())
            }
            _ => match SeriesFn::from_keyword(op) {
                Some(func) => {
                    let v = self.pop1()?;
                    let frag = series::synthesize(func, &v, term_count, alloc, out);
                    self.frags.push(frag);
                    Ok(())
                }
                None => Err(TranslateError::Unreachable),
            },
        }
    }

    // the right-hand slot of `**` accepts only an integer literal; the power
    // is expanded into a product the target engine can evaluate directly
    fn power(&mut self) -> SynthResult {
        let (base, exp) = self.pop2()?;
        let k = match exp.literal() {
            Some(k) if k >= 0 => k as u64,
            _ => return Err(TranslateError::NonLiteralExponent(exp.to_string())),
        };
        let expanded = format!("({})", series::power_chain(&base.to_string(), k));
        self.frags.push(Fragment::Inline(expanded));
        Ok(())
    }

    fn pop1(&mut self) -> Result<Fragment, TranslateError> {
        self.frags.pop().ok_or(TranslateError::TooManyOps)
    }

    fn pop2(&mut self) -> Result<(Fragment, Fragment), TranslateError> {
        if self.frags.len() < 2 {
            return Err(TranslateError::TooManyOps);
        }
        // two fragments present - unwraps are fine
        let r = self.frags.pop().unwrap();
        let l = self.frags.pop().unwrap();
        Ok((l, r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reduce(stack: &mut Stack) -> Result<Fragment, TranslateError> {
        let mut alloc = SubAllocator::new();
        let mut out = Translation::default();
        stack.synthesize(3, &mut alloc, &mut out)
    }

    #[test]
    fn test_simple_order() {
        let mut stack = Stack::new();
        // 2 + 3 * 2
        stack.push_frag(Fragment::Number(2));
        stack.push_op("+").unwrap();
        stack.push_frag(Fragment::Number(3));
        stack.push_op("*").unwrap();
        stack.push_frag(Fragment::Number(2));
        let v = reduce(&mut stack);
        assert_eq!(v, Ok(Fragment::Inline("2+3*2".to_string())));
    }

    #[test]
    fn test_braces_survive() {
        let mut stack = Stack::new();
        // ( 2 + 3 ) * 4
        stack.push_op("(").unwrap();
        stack.push_frag(Fragment::Number(2));
        stack.push_op("+").unwrap();
        stack.push_frag(Fragment::Number(3));
        stack.push_op(")").unwrap();
        stack.push_op("*").unwrap();
        stack.push_frag(Fragment::Number(4));
        let v = reduce(&mut stack);
        assert_eq!(v, Ok(Fragment::Inline("(2+3)*4".to_string())));
    }

    #[test]
    fn test_power_expands() {
        let mut stack = Stack::new();
        // 2 ** 3 -> a product of exactly three factors
        stack.push_frag(Fragment::Number(2));
        stack.push_op("**").unwrap();
        stack.push_frag(Fragment::Number(3));
        let v = reduce(&mut stack);
        assert_eq!(v, Ok(Fragment::Inline("(1*2*2*2)".to_string())));
    }

    #[test]
    fn test_power_zero() {
        let mut stack = Stack::new();
        stack.push_frag(Fragment::Number(9));
        stack.push_op("**").unwrap();
        stack.push_frag(Fragment::Number(0));
        let v = reduce(&mut stack);
        assert_eq!(v, Ok(Fragment::Inline("(1)".to_string())));
    }

    #[test]
    fn test_power_rejects_non_literal() {
        let mut stack = Stack::new();
        // 2 ** (3): a parenthesized expression is no longer a literal
        stack.push_frag(Fragment::Number(2));
        stack.push_op("**").unwrap();
        stack.push_op("(").unwrap();
        stack.push_frag(Fragment::Number(3));
        stack.push_op(")").unwrap();
        let v = reduce(&mut stack);
        assert_eq!(v, Err(TranslateError::NonLiteralExponent("(3)".to_string())));
    }

    #[test]
    fn test_unary_minus_binds_tightest() {
        let mut stack = Stack::new();
        // -2 ** 2 is (-2)*(-2)
        stack.push_op(UNARY_MINUS).unwrap();
        stack.push_frag(Fragment::Number(2));
        stack.push_op("**").unwrap();
        stack.push_frag(Fragment::Number(2));
        let v = reduce(&mut stack);
        assert_eq!(v, Ok(Fragment::Inline("(1*-2*-2)".to_string())));
    }

    #[test]
    fn test_prefix_functions_chain() {
        let mut stack = Stack::new();
        // exp ln 2: ln reduces first, exp powers its intermediate
        stack.push_op("exp").unwrap();
        stack.push_op("ln").unwrap();
        stack.push_frag(Fragment::Number(2));
        let mut alloc = SubAllocator::new();
        let mut out = Translation::default();
        let v = stack.synthesize(3, &mut alloc, &mut out).unwrap();
        assert_eq!(v, Fragment::Ref(2));
        assert_eq!(out.bindings.len(), 2);
        assert!(out.bindings[1].expr.contains("?sub1"));
        assert_eq!(out.verify_order(), Ok(()));
    }

    #[test]
    fn test_function_looser_than_times() {
        let mut stack = Stack::new();
        // sin 2 * 10 is sin(2)*10
        stack.push_op("sin").unwrap();
        stack.push_frag(Fragment::Number(2));
        stack.push_op("*").unwrap();
        stack.push_frag(Fragment::Number(10));
        let mut alloc = SubAllocator::new();
        let mut out = Translation::default();
        let v = stack.synthesize(3, &mut alloc, &mut out).unwrap();
        assert_eq!(v, Fragment::Inline("?sub1*10".to_string()));
        assert_eq!(out.bindings.len(), 1);
    }

    #[test]
    fn test_stray_closing_bracket() {
        let mut stack = Stack::new();
        assert_eq!(stack.push_op(")"), Err(TranslateError::Unbalanced));
    }

    #[test]
    fn test_leftover_values() {
        let mut stack = Stack::new();
        stack.push_frag(Fragment::Number(2));
        stack.push_frag(Fragment::Number(3));
        let v = reduce(&mut stack);
        assert_eq!(v, Err(TranslateError::InsufficientOps));
    }

    #[test]
    fn test_missing_operand() {
        let mut stack = Stack::new();
        stack.push_frag(Fragment::Number(2));
        stack.push_op("+").unwrap();
        let v = reduce(&mut stack);
        assert_eq!(v, Err(TranslateError::TooManyOps));
    }

    #[test]
    fn test_empty_statement() {
        let mut stack = Stack::new();
        let v = reduce(&mut stack);
        assert_eq!(v, Err(TranslateError::EmptyExpression));
    }
}
