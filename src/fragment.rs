use std::fmt;

use crate::errors::TranslateError;

/// Statement translation result: either the emitted output or a syntax-class error
pub type TranslateResult = Result<Translation, TranslateError>;
pub(crate) type SynthResult = Result<(), TranslateError>;

/// The synthesized form of a sub-expression, as seen by its enclosing
/// production. Keeping literals and intermediate references tagged (instead
/// of flattening everything to text immediately) lets `**` insist on a
/// literal exponent and lets the emitter check binding order.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Unsigned integer literal, kept as a number for the `**` grammar slot
    Number(i64),
    /// Composed target-language text
    Inline(String),
    /// Reference to the intermediate binding `?subN`
    Ref(usize),
}

impl Fragment {
    /// The literal value, if this fragment still is one
    pub(crate) fn literal(&self) -> Option<i64> {
        match self {
            Fragment::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            Fragment::Number(n) => write!(f, "{}", n),
            Fragment::Inline(s) => write!(f, "{}", s),
            Fragment::Ref(n) => write!(f, "?sub{}", n),
        }
    }
}

/// The identifier a binding materializes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    Sub(usize),
    Result,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            Target::Sub(n) => write!(f, "?sub{}", n),
            Target::Result => write!(f, "?result"),
        }
    }
}

/// One emitted `BIND` statement
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub expr: String,
    pub target: Target,
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BIND ( ( {} ) AS {} )", self.expr, self.target)
    }
}

/// Everything one statement produced: binding statements in emission order
/// plus human-readable notes (confirmations, warnings, recovered errors)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Translation {
    pub bindings: Vec<Binding>,
    pub notes: Vec<String>,
}

impl Translation {
    /// Records a recovered error as a user-visible note
    pub(crate) fn report(&mut self, err: TranslateError) {
        log::warn!("recovered: {}", err);
        self.notes.push(err.to_string());
    }

    /// Checks that emission order is a topological order of the dependency
    /// graph: intermediate identifiers strictly increase (the allocator only
    /// hands out increasing ones and composite series emit the referenced
    /// binding first) and the result binding, if any, comes last.
    pub fn verify_order(&self) -> Result<(), TranslateError> {
        let mut last_sub = 0usize;
        for (i, b) in self.bindings.iter().enumerate() {
            match b.target {
                Target::Sub(n) => {
                    if n <= last_sub {
                        return Err(TranslateError::Unreachable);
                    }
                    last_sub = n;
                }
                Target::Result => {
                    if i + 1 != self.bindings.len() {
                        return Err(TranslateError::Unreachable);
                    }
                }
            }
        }
        Ok(())
    }

    /// Wire text: note lines, then one line per binding, then a blank line
    /// closing the statement
    pub fn render(&self) -> String {
        let mut s = String::new();
        for n in &self.notes {
            s.push_str(n);
            s.push('\n');
        }
        for b in &self.bindings {
            s.push_str(&b.to_string());
            s.push('\n');
        }
        if !self.bindings.is_empty() {
            s.push('\n');
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_display() {
        assert_eq!(Fragment::Number(42).to_string(), "42");
        assert_eq!(Fragment::Inline("2+3".to_string()).to_string(), "2+3");
        assert_eq!(Fragment::Ref(7).to_string(), "?sub7");
    }

    #[test]
    fn test_literal() {
        assert_eq!(Fragment::Number(3).literal(), Some(3));
        assert_eq!(Fragment::Inline("3".to_string()).literal(), None);
        assert_eq!(Fragment::Ref(1).literal(), None);
    }

    #[test]
    fn test_binding_display() {
        let b = Binding {
            expr: "FLOOR((2+3)*100)/100".to_string(),
            target: Target::Result,
        };
        assert_eq!(b.to_string(), "BIND ( ( FLOOR((2+3)*100)/100 ) AS ?result )");
        let b = Binding {
            expr: "0+(1)/1.0".to_string(),
            target: Target::Sub(2),
        };
        assert_eq!(b.to_string(), "BIND ( ( 0+(1)/1.0 ) AS ?sub2 )");
    }

    #[test]
    fn test_render_ends_with_blank_line() {
        let mut t = Translation::default();
        t.notes.push("note".to_string());
        t.bindings.push(Binding {
            expr: "1".to_string(),
            target: Target::Result,
        });
        assert_eq!(t.render(), "note\nBIND ( ( 1 ) AS ?result )\n\n");
    }

    #[test]
    fn test_render_notes_only() {
        let mut t = Translation::default();
        t.notes.push("warning".to_string());
        // no bindings, no trailing blank line
        assert_eq!(t.render(), "warning\n");
    }

    #[test]
    fn test_verify_order() {
        let sub = |n, e: &str| Binding {
            expr: e.to_string(),
            target: Target::Sub(n),
        };
        let mut t = Translation::default();
        t.bindings = vec![sub(1, "a"), sub(2, "b")];
        assert_eq!(t.verify_order(), Ok(()));

        t.bindings = vec![sub(2, "a"), sub(1, "b")];
        assert!(t.verify_order().is_err());

        t.bindings = vec![
            sub(1, "a"),
            Binding {
                expr: "r".to_string(),
                target: Target::Result,
            },
            sub(2, "b"),
        ];
        assert!(t.verify_order().is_err());
    }
}
