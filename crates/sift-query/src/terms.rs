//! Match-term derivation for snippet extraction.
//!
//! The snippet extractor re-finds query terms in document fields, so it
//! needs the plain terms of a query with operators, grouping and field
//! prefixes stripped, each tagged with its match mode (whole word vs
//! prefix).

use sift_normalize::normalize;

use crate::lexer::{Token, tokenize};

/// A query term as matched by the snippet extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTerm {
    /// Normalized term text, `*` marker removed.
    pub text: String,
    /// True when the term matches any word starting with `text`.
    pub prefix: bool,
}

/// Derives the extractor's term list from a raw query string.
///
/// Operator keywords, parentheses and field prefixes are dropped; quoted
/// phrases contribute their individual words; tokens of one char or less
/// (after removing a trailing `*`) are discarded; the rest is normalized.
/// Duplicates are removed keeping first occurrence, so extraction order
/// follows the query.
pub fn match_terms(query: &str) -> Vec<MatchTerm> {
    let words: Vec<String> = match tokenize(query) {
        Ok(tokens) => tokens
            .into_iter()
            .filter_map(|spanned| match spanned.token {
                Token::Term(text) | Token::Phrase(text) => Some(text),
                _ => None,
            })
            .collect(),
        // A query that failed to lex never reaches search; fall back to a
        // crude whitespace split so extraction still has something to work
        // with.
        Err(_) => vec![query.replace(['"', '(', ')'], " ")],
    };

    let terms = collect(&words, 1);
    if !terms.is_empty() {
        return terms;
    }
    // A query made only of one-char terms (e.g. a heading named "C") would
    // otherwise extract nothing; keep them rather than fall back blind.
    collect(&words, 0)
}

/// Collects normalized terms, discarding stems of `min_len` chars or fewer.
fn collect(words: &[String], min_len: usize) -> Vec<MatchTerm> {
    let mut terms: Vec<MatchTerm> = Vec::new();
    for word in words.iter().flat_map(|w| w.split_whitespace()) {
        let (stem, prefix) = match word.strip_suffix('*') {
            Some(stem) => (stem, true),
            None => (word, false),
        };
        if stem.chars().count() <= min_len {
            continue;
        }
        let term = MatchTerm {
            text: normalize(stem),
            prefix,
        };
        if !terms.contains(&term) {
            terms.push(term);
        }
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(query: &str) -> Vec<String> {
        match_terms(query).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn plain_terms() {
        assert_eq!(texts("alpha beta"), vec!["alpha", "beta"]);
    }

    #[test]
    fn operators_and_grouping_stripped() {
        assert_eq!(
            texts("alpha AND (beta OR gamma) NOT delta"),
            vec!["alpha", "beta", "gamma", "delta"]
        );
    }

    #[test]
    fn field_prefixes_stripped() {
        assert_eq!(texts("title:alpha h3:beta"), vec!["alpha", "beta"]);
    }

    #[test]
    fn phrases_split_into_words() {
        assert_eq!(texts("\"error handling\" rust"), vec!["error", "handling", "rust"]);
    }

    #[test]
    fn short_tokens_discarded() {
        assert_eq!(texts("a xy b* c"), vec!["xy"]);
    }

    #[test]
    fn all_short_query_keeps_its_terms() {
        // A single-letter heading must stay findable.
        assert_eq!(texts("C"), vec!["c"]);
    }

    #[test]
    fn prefix_mode_recorded() {
        let terms = match_terms("medit* exact");
        assert_eq!(
            terms,
            vec![
                MatchTerm {
                    text: "medit".into(),
                    prefix: true
                },
                MatchTerm {
                    text: "exact".into(),
                    prefix: false
                },
            ]
        );
    }

    #[test]
    fn terms_are_normalized() {
        assert_eq!(texts("Mediterráneo"), vec!["mediterraneo"]);
    }

    #[test]
    fn duplicates_keep_first_position() {
        assert_eq!(texts("alpha beta alpha"), vec!["alpha", "beta"]);
    }

    #[test]
    fn lex_failure_falls_back_to_split() {
        // Unclosed quote still yields usable terms.
        assert_eq!(texts("alpha \"beta gam"), vec!["alpha", "beta", "gam"]);
    }
}
