//! Search execution.
//!
//! Ties the pipeline together: parse the public query, rewrite it to the
//! normalized internal form, compile to a weighted Tantivy query, apply the
//! tag filter, rank, and extract snippets from each hit.

use serde::Serialize;
use tantivy::{
    TantivyDocument, Term,
    collector::{Count, TopDocs},
    query::{BooleanQuery, BoostQuery, Occur, Query, TermQuery},
    schema::IndexRecordOption,
};

use sift_config::{
    DEFAULT_SEARCH_LIMIT, DEFAULT_SNIPPET_LENGTH, DEFAULT_SNIPPETS_PER_DOC, SearchDefaults,
    Weights,
};
use sift_query::match_terms;

use crate::{
    IndexError,
    query::{QueryCompiler, rewrite},
    record::DocumentRecord,
    schema::UNTAGGED,
    snippet::{Snippet, document_snippet, extract_snippets},
    store::Store,
};

/// Options for one search call.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Maximum documents returned.
    pub limit: usize,
    /// Keep only hits ranking at or above this score (engine convention:
    /// larger is better).
    pub min_score: Option<f32>,
    /// Tag filter; untagged documents always match.
    pub tags: Vec<String>,
    /// Whether to extract snippets.
    pub snippets: bool,
    /// Snippet context window in characters.
    pub snippet_length: usize,
    /// Maximum snippets per document.
    pub snippets_per_doc: usize,
    /// Whether to compute the total match count before the limit.
    pub count: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_SEARCH_LIMIT,
            min_score: None,
            tags: Vec::new(),
            snippets: true,
            snippet_length: DEFAULT_SNIPPET_LENGTH,
            snippets_per_doc: DEFAULT_SNIPPETS_PER_DOC,
            count: false,
        }
    }
}

impl SearchOptions {
    /// Options seeded from configured defaults.
    pub fn with_defaults(defaults: &SearchDefaults) -> Self {
        Self {
            limit: defaults.limit,
            snippet_length: defaults.snippet_length,
            snippets_per_doc: defaults.snippets_per_doc,
            ..Self::default()
        }
    }
}

/// Result of a search call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResponse {
    /// Snippets of the ranked documents, document rank order preserved.
    pub results: Vec<Snippet>,
    /// Total matching documents before the limit, when requested.
    pub total_count: Option<usize>,
    /// Number of extracted snippets in `results`.
    pub total_snippets: usize,
}

impl SearchResponse {
    /// The empty response, with a zero count when counting was requested.
    fn empty(count: bool) -> Self {
        Self {
            results: Vec::new(),
            total_count: count.then_some(0),
            total_snippets: 0,
        }
    }
}

impl Store {
    /// Runs a query and returns ranked, snippet-annotated results.
    ///
    /// An empty index or a query with no concrete tokens yields an empty
    /// response, never an error.
    pub fn search(
        &self,
        query: &str,
        options: &SearchOptions,
        weights: &Weights,
    ) -> Result<SearchResponse, IndexError> {
        let Some(expr) = sift_query::parse(query).map_err(|e| IndexError::QueryInvalid {
            query: query.to_string(),
            rewritten: query.to_string(),
            position: e.position,
            message: e.message,
        })?
        else {
            return Ok(SearchResponse::empty(options.count));
        };

        let rewritten = rewrite(expr);
        let mut compiler = QueryCompiler::new(self.schema().clone(), *weights);
        let compiled = compiler
            .compile(&rewritten)
            .map_err(|e| IndexError::QueryInvalid {
                query: query.to_string(),
                rewritten: rewritten.to_query_string(),
                message: e.message,
                position: None,
            })?;
        let Some(compiled) = compiled else {
            return Ok(SearchResponse::empty(options.count));
        };

        let final_query = self.apply_tag_filter(compiled, &options.tags);
        tracing::debug!(query, rewritten = %rewritten.to_query_string(), "executing search");

        let searcher = self.searcher()?;
        let limit = options.limit.max(1);
        let (hits, total_count) = if options.count {
            let (count, top) = searcher
                .search(&*final_query, &(Count, TopDocs::with_limit(limit)))
                .map_err(|e| IndexError::write(&e))?;
            (top, Some(count))
        } else {
            let top = searcher
                .search(&*final_query, &TopDocs::with_limit(limit))
                .map_err(|e| IndexError::write(&e))?;
            (top, None)
        };

        let terms = match_terms(query);
        let mut results = Vec::new();
        let mut total_snippets = 0;

        for (score, addr) in hits {
            if let Some(min) = options.min_score
                && score < min
            {
                continue;
            }

            let doc: TantivyDocument = searcher.doc(addr).map_err(|e| IndexError::write(&e))?;
            let record = DocumentRecord::from_tantivy(&doc, self.schema())?;

            if options.snippets {
                let snippets = extract_snippets(
                    &record,
                    score,
                    &terms,
                    options.snippet_length,
                    options.snippets_per_doc,
                );
                total_snippets += snippets.len();
                results.extend(snippets);
            } else {
                results.push(document_snippet(&record, score));
            }
        }

        Ok(SearchResponse {
            results,
            total_count,
            total_snippets,
        })
    }

    /// Wraps the query with the tag filter when tags are given.
    ///
    /// A document passes when its tag set intersects the filter or when it
    /// carries no tags at all (untagged documents are global). The filter
    /// clause is boosted to zero so it never disturbs ranking.
    fn apply_tag_filter(&self, query: Box<dyn Query>, tags: &[String]) -> Box<dyn Query> {
        if tags.is_empty() {
            return query;
        }

        let mut should: Vec<(Occur, Box<dyn Query>)> = tags
            .iter()
            .map(|tag| {
                (
                    Occur::Should,
                    Box::new(TermQuery::new(
                        Term::from_field_text(self.schema().tag_filter, tag),
                        IndexRecordOption::Basic,
                    )) as Box<dyn Query>,
                )
            })
            .collect();
        should.push((
            Occur::Should,
            Box::new(TermQuery::new(
                Term::from_field_text(self.schema().tag_filter, UNTAGGED),
                IndexRecordOption::Basic,
            )),
        ));

        let filter: Box<dyn Query> =
            Box::new(BoostQuery::new(Box::new(BooleanQuery::new(should)), 0.0));
        Box::new(BooleanQuery::new(vec![
            (Occur::Must, query),
            (Occur::Must, filter),
        ]))
    }
}
