//! # Math to SPARQL BIND sequences
//!
//! The engine behind an interactive math-to-SPARQL translator. One statement
//! per line is turned into a chain of `BIND ( ( <expression> ) AS ?subN )`
//! statements over the operators every SPARQL engine ships (`+ - * /`,
//! `FLOOR`, `xsd:double` coercion), so a query can approximate transcendental
//! functions on a store that has none.
//!
//! Supported notation:
//! * `+`, `-`, `*`, `/` - passed through to the target engine
//! * `**` - non-negative integer powers, expanded into a plain product
//! * `exp`, `ln`, `sqrt` - truncated series; `sqrt` composes `exp` and `ln`
//!   and costs two intermediate bindings
//! * `sin`, `cos`, `tan` - truncated series after folding the argument into
//!   one period of 2*pi; `tan` is emitted as the sin/cos ratio
//! * `?name` - a query-engine variable, coerced with `xsd:double`
//! * `name = expression` - captures the synthesized text for later statements
//! * `precision = 0..10` - decimal digits kept in the final `?result`
//! * `term = 0..15` - series terms kept for the functions above
//! * `help` - a usage summary
//!
//! The precision wrapper `FLOOR(expr*10^p)/10^p` is applied around the final
//! result only; series length is configured separately because every extra
//! term multiplies the emitted text size.
//!
//! Lexical errors and undefined names are recovered and reported as notes on
//! the returned [`fragment::Translation`]; a syntax error aborts only the
//! current statement. The interactive shell (prompt handling, line editing,
//! colored output) lives in a separate crate and feeds lines to
//! [`parse::translate`].
//!
//! Note: `ln` and `sqrt` are synthesized from a series that only converges
//! for positive arguments; handing them anything else is a caller error the
//! translator does not detect. `tan` emits a plain division and leaves
//! near-zero cosines to the downstream engine.

#[macro_use]
extern crate pest_derive;

pub mod errors;
pub mod fragment;
pub mod parse;
pub mod series;
pub mod synth;
