//! Query rewriting and compilation.
//!
//! A user query travels: text → [`sift_query::parse`] → [`rewrite`]
//! (normalization) → [`QueryCompiler`] (weighted Tantivy query).

mod compile;
mod rewrite;

pub use compile::{CompileError, QueryCompiler};
pub use rewrite::rewrite;
