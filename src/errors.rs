use std::fmt;

#[derive(PartialEq)]
pub enum TranslateError {
    // lexical errors, recovered inside the tokenizer
    IllegalChar(char),
    NumberTooLarge(String),

    // syntax errors, fatal to the current statement only
    Syntax(String),
    NonLiteralExponent(String),
    TooManyOps,
    InsufficientOps,
    Unbalanced,
    EmptyExpression,

    // recovered during synthesis
    UndefinedName(String),

    // configuration updates outside the valid interval
    PrecisionRange(i64),
    TermRange(i64),

    Unreachable,
}

impl fmt::Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            TranslateError::IllegalChar(c) => write!(f, "Illegal character '{}'", c),
            TranslateError::NumberTooLarge(s) => write!(f, "Integer value too large {}", s),

            TranslateError::Syntax(s) => write!(f, "Syntax error at '{}'", s),
            TranslateError::NonLiteralExponent(s) => {
                write!(f, "The exponent of '**' must be a non-negative integer literal, got '{}'", s)
            }
            TranslateError::TooManyOps => write!(f, "Too many operators"),
            TranslateError::InsufficientOps => write!(f, "Too many values"),
            TranslateError::Unbalanced => write!(f, "Mismatched closing bracket"),
            TranslateError::EmptyExpression => write!(f, "Nothing to translate"),

            TranslateError::UndefinedName(s) => write!(f, "Undefined name '{}'", s),

            TranslateError::PrecisionRange(v) => {
                write!(f, "The precision parameter should be in [0,10], got {}", v)
            }
            TranslateError::TermRange(v) => {
                write!(f, "The number of terms for the series should be in [0,15], got {}", v)
            }

            TranslateError::Unreachable => write!(f, "unreachable"),
        }
    }
}

impl fmt::Debug for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl std::error::Error for TranslateError {}
