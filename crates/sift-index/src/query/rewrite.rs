//! Query rewriting.
//!
//! Rewrites a parsed public-language query into the internal form the
//! engine matches against: every term and phrase is accent- and
//! case-folded exactly like the indexed columns, prefix markers and the
//! boolean structure are preserved, and field restrictions keep addressing
//! the same logical fields (the compiler routes them to the `_normalized`
//! columns).

use sift_normalize::normalize;
use sift_query::QueryExpr;

/// Normalizes every term and phrase in the expression.
pub fn rewrite(expr: QueryExpr) -> QueryExpr {
    match expr {
        QueryExpr::Term { text, prefix } => QueryExpr::Term {
            text: normalize(&text),
            prefix,
        },
        QueryExpr::Phrase(content) => QueryExpr::Phrase(normalize(&content)),
        QueryExpr::Not(inner) => QueryExpr::Not(Box::new(rewrite(*inner))),
        QueryExpr::And(exprs) => QueryExpr::And(exprs.into_iter().map(rewrite).collect()),
        QueryExpr::Or(exprs) => QueryExpr::Or(exprs.into_iter().map(rewrite).collect()),
        QueryExpr::Field { field, expr } => QueryExpr::Field {
            field,
            expr: Box::new(rewrite(*expr)),
        },
    }
}

#[cfg(test)]
mod tests {
    use sift_query::parse;

    use super::*;

    fn rewritten(input: &str) -> String {
        rewrite(parse(input).unwrap().unwrap()).to_query_string()
    }

    #[test]
    fn terms_are_folded() {
        assert_eq!(rewritten("Mediterráneo"), "mediterraneo");
    }

    #[test]
    fn prefix_marker_survives() {
        assert_eq!(rewritten("Médit*"), "medit*");
    }

    #[test]
    fn phrases_fold_as_a_unit() {
        assert_eq!(rewritten("\"Año Nuevo\""), "\"ano nuevo\"");
    }

    #[test]
    fn structure_and_fields_preserved() {
        assert_eq!(
            rewritten("title:Guía (Rust OR Ñu*) NOT \"Viejo Mundo\""),
            "title:guia (rust OR nu*) NOT \"viejo mundo\""
        );
    }

    #[test]
    fn idempotent_on_folded_input() {
        let once = rewritten("Café AND té*");
        let twice = rewrite(parse(&once).unwrap().unwrap()).to_query_string();
        assert_eq!(once, twice);
    }
}
