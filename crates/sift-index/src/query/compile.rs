//! Query compiler.
//!
//! Compiles a rewritten query AST into weighted Tantivy queries. An
//! unrestricted term fans out over all eight normalized columns as a
//! boolean-should, each clause boosted by the configured field weight, so
//! the engine's per-column BM25 scores combine into the weighted document
//! rank. Prefix terms compile to anchored regex queries over the term
//! dictionary.

use std::{error::Error, fmt};

use sift_config::Weights;
use sift_document::FieldKind;
use sift_query::{QueryExpr, QueryField};
use tantivy::{
    Term,
    query::{
        AllQuery, BooleanQuery, BoostQuery, Occur, PhraseQuery, Query, RegexQuery, TermQuery,
    },
    schema::{Field, IndexRecordOption},
    tokenizer::{TextAnalyzer, TokenStream},
};

use crate::schema::{IndexSchema, build_analyzer};

/// Error during query compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    /// Error message.
    pub message: String,
}

impl CompileError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CompileError {}

/// Compiles query AST nodes into Tantivy queries.
pub struct QueryCompiler {
    /// Index schema for field handles.
    schema: IndexSchema,
    /// Per-field ranking weights.
    weights: Weights,
    /// Analyzer matching the normalized columns.
    analyzer: TextAnalyzer,
}

impl QueryCompiler {
    /// Creates a compiler for a schema and weight set.
    pub fn new(schema: IndexSchema, weights: Weights) -> Self {
        Self {
            schema,
            weights,
            analyzer: build_analyzer(),
        }
    }

    /// Compiles an expression into a Tantivy query.
    ///
    /// Returns `None` when the expression matches nothing concrete (all
    /// tokens filtered away).
    pub fn compile(&mut self, expr: &QueryExpr) -> Result<Option<Box<dyn Query>>, CompileError> {
        self.compile_scoped(None, expr)
    }

    /// Compiles an expression under an optional field restriction.
    fn compile_scoped(
        &mut self,
        scope: Option<QueryField>,
        expr: &QueryExpr,
    ) -> Result<Option<Box<dyn Query>>, CompileError> {
        match expr {
            QueryExpr::Term { text, prefix } => Ok(self.compile_term(scope, text, *prefix)),
            QueryExpr::Phrase(content) => Ok(self.compile_phrase(scope, content)),
            QueryExpr::Not(inner) => self.compile_not(scope, inner),
            QueryExpr::And(exprs) => self.compile_and(scope, exprs),
            QueryExpr::Or(exprs) => self.compile_or(scope, exprs),
            QueryExpr::Field { field, expr } => {
                if scope.is_some() {
                    return Err(CompileError::new(format!(
                        "nested field restriction: {}",
                        field.as_str()
                    )));
                }
                self.compile_scoped(Some(*field), expr)
            }
        }
    }

    /// The target columns and weights for a scope.
    fn columns(&self, scope: Option<QueryField>) -> Vec<(Field, f32)> {
        let kinds: Vec<FieldKind> = match scope {
            None => FieldKind::ALL.to_vec(),
            Some(QueryField::Headings) => FieldKind::ALL
                .into_iter()
                .filter(|k| k.is_heading())
                .collect(),
            Some(QueryField::Field(kind)) => vec![kind],
        };

        kinds
            .into_iter()
            .map(|kind| (self.schema.norm_field(kind), self.weight(kind)))
            .collect()
    }

    /// The configured weight of a field.
    fn weight(&self, kind: FieldKind) -> f32 {
        match kind {
            FieldKind::Title => self.weights.title,
            FieldKind::Body => self.weights.body,
            heading => self.weights.heading(heading.level().unwrap_or(6)),
        }
    }

    /// Splits text through the column analyzer.
    fn tokenize(&mut self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut stream = self.analyzer.token_stream(text);
        while let Some(token) = stream.next() {
            tokens.push(token.text.clone());
        }
        tokens
    }

    /// Compiles a term (or prefix term) against the scope's columns.
    fn compile_term(
        &mut self,
        scope: Option<QueryField>,
        text: &str,
        prefix: bool,
    ) -> Option<Box<dyn Query>> {
        let tokens = self.tokenize(text);
        match tokens.len() {
            0 => None,
            1 => self.single_token_query(scope, &tokens[0], prefix),
            // Punctuation split a single written term into several tokens;
            // match them as a phrase. The prefix marker has no meaning then.
            _ => self.phrase_from_tokens(scope, &tokens),
        }
    }

    /// Compiles a quoted phrase against the scope's columns.
    fn compile_phrase(&mut self, scope: Option<QueryField>, content: &str) -> Option<Box<dyn Query>> {
        let tokens = self.tokenize(content);
        match tokens.len() {
            0 => None,
            1 => self.single_token_query(scope, &tokens[0], false),
            _ => self.phrase_from_tokens(scope, &tokens),
        }
    }

    /// Builds the per-column query for one token, should-combined.
    fn single_token_query(
        &self,
        scope: Option<QueryField>,
        token: &str,
        prefix: bool,
    ) -> Option<Box<dyn Query>> {
        let clauses: Vec<(Occur, Box<dyn Query>)> = self
            .columns(scope)
            .into_iter()
            .filter_map(|(field, weight)| {
                let query: Box<dyn Query> = if prefix {
                    let pattern = format!("{}.*", escape_regex(token));
                    Box::new(RegexQuery::from_pattern(&pattern, field).ok()?)
                } else {
                    Box::new(TermQuery::new(
                        Term::from_field_text(field, token),
                        IndexRecordOption::WithFreqs,
                    ))
                };
                Some((
                    Occur::Should,
                    Box::new(BoostQuery::new(query, weight)) as Box<dyn Query>,
                ))
            })
            .collect();

        combine_should(clauses)
    }

    /// Builds per-column phrase queries, should-combined.
    fn phrase_from_tokens(
        &self,
        scope: Option<QueryField>,
        tokens: &[String],
    ) -> Option<Box<dyn Query>> {
        let clauses: Vec<(Occur, Box<dyn Query>)> = self
            .columns(scope)
            .into_iter()
            .map(|(field, weight)| {
                let terms: Vec<Term> = tokens
                    .iter()
                    .map(|t| Term::from_field_text(field, t))
                    .collect();
                let phrase: Box<dyn Query> = Box::new(PhraseQuery::new(terms));
                (
                    Occur::Should,
                    Box::new(BoostQuery::new(phrase, weight)) as Box<dyn Query>,
                )
            })
            .collect();

        combine_should(clauses)
    }

    /// Compiles a standalone NOT: everything except the inner matches.
    fn compile_not(
        &mut self,
        scope: Option<QueryField>,
        inner: &QueryExpr,
    ) -> Result<Option<Box<dyn Query>>, CompileError> {
        match self.compile_scoped(scope, inner)? {
            Some(q) => {
                let clauses = vec![
                    (Occur::Must, Box::new(AllQuery) as Box<dyn Query>),
                    (Occur::MustNot, q),
                ];
                Ok(Some(Box::new(BooleanQuery::new(clauses))))
            }
            None => Ok(None),
        }
    }

    /// Compiles an AND, separating positive and negative clauses.
    ///
    /// Negative clauses become MUST_NOT; a pure-negative conjunction gets
    /// an AllQuery base to exclude from.
    fn compile_and(
        &mut self,
        scope: Option<QueryField>,
        exprs: &[QueryExpr],
    ) -> Result<Option<Box<dyn Query>>, CompileError> {
        let mut positive: Vec<Box<dyn Query>> = Vec::new();
        let mut negative: Vec<Box<dyn Query>> = Vec::new();

        for expr in exprs {
            match expr {
                QueryExpr::Not(inner) => {
                    if let Some(q) = self.compile_scoped(scope, inner)? {
                        negative.push(q);
                    }
                }
                other => {
                    if let Some(q) = self.compile_scoped(scope, other)? {
                        positive.push(q);
                    }
                }
            }
        }

        if positive.is_empty() && negative.is_empty() {
            return Ok(None);
        }

        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for q in positive {
            clauses.push((Occur::Must, q));
        }
        if clauses.is_empty() {
            clauses.push((Occur::Must, Box::new(AllQuery)));
        }
        for q in negative {
            clauses.push((Occur::MustNot, q));
        }

        Ok(Some(Box::new(BooleanQuery::new(clauses))))
    }

    /// Compiles an OR as boolean-should.
    fn compile_or(
        &mut self,
        scope: Option<QueryField>,
        exprs: &[QueryExpr],
    ) -> Result<Option<Box<dyn Query>>, CompileError> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for expr in exprs {
            if let Some(q) = self.compile_scoped(scope, expr)? {
                clauses.push((Occur::Should, q));
            }
        }
        Ok(combine_should(clauses))
    }
}

/// Wraps should-clauses in a boolean query; a single clause passes through.
fn combine_should(mut clauses: Vec<(Occur, Box<dyn Query>)>) -> Option<Box<dyn Query>> {
    match clauses.len() {
        0 => None,
        1 => Some(clauses.remove(0).1),
        _ => Some(Box::new(BooleanQuery::new(clauses))),
    }
}

/// Escapes regex metacharacters for the term-dictionary regex engine.
///
/// Analyzer tokens are alphanumeric, so this is defensive only for custom
/// analyzer setups.
fn escape_regex(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    for ch in token.chars() {
        if "\\.+*?()[]{}|^$".contains(ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
