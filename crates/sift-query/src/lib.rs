//! Query language parsing for sift.
//!
//! The public query language: bare terms, quoted phrases, AND/OR/NOT (any
//! case), parentheses, trailing `*` for prefix matching, and `field:`
//! restrictions over title, h1..h6, headings, and body.
//!
//! This crate lexes and parses that language into [`QueryExpr`] trees and
//! derives the flat [`MatchTerm`] list the snippet extractor re-finds in
//! document fields. Rewriting (normalization) and compilation to engine
//! queries live in the storage crate.

#![warn(missing_docs)]

mod ast;
mod error;
mod lexer;
mod parser;
mod terms;

pub use ast::{QueryExpr, QueryField};
pub use error::{LexError, ParseError};
pub use lexer::{SpannedToken, Token, tokenize};
pub use parser::parse;
pub use terms::{MatchTerm, match_terms};
