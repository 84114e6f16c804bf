//! Query abstract syntax tree.
//!
//! Represents parsed query expressions before rewriting and compilation to
//! search engine queries.

use std::fmt;

use sift_document::FieldKind;

/// A field restriction accepted in query syntax.
///
/// `headings` addresses all six heading columns at once; everything else
/// maps to a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryField {
    /// A single column (title, h1..h6, body).
    Field(FieldKind),
    /// All heading columns (h1..h6).
    Headings,
}

impl QueryField {
    /// Parses a field name as written in a query.
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "headings" {
            return Some(Self::Headings);
        }
        FieldKind::from_name(name).map(Self::Field)
    }

    /// The name as written in query syntax.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Headings => "headings",
            Self::Field(kind) => kind.as_str(),
        }
    }
}

/// A parsed query expression.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryExpr {
    /// A single search term, possibly in prefix mode (trailing `*`).
    Term {
        /// The term text, without the `*` marker.
        text: String,
        /// Whether the term matches as a prefix.
        prefix: bool,
    },

    /// An exact phrase (quoted span, quotes stripped).
    Phrase(String),

    /// Negation: results must NOT match this expression.
    Not(Box<Self>),

    /// Conjunction: all sub-expressions must match.
    And(Vec<Self>),

    /// Disjunction: at least one sub-expression must match.
    Or(Vec<Self>),

    /// Field-scoped query: match only within the named field(s).
    Field {
        /// The restricted field.
        field: QueryField,
        /// Expression to match within that field.
        expr: Box<Self>,
    },
}

impl QueryExpr {
    /// Creates a term expression.
    pub fn term(text: impl Into<String>) -> Self {
        Self::Term {
            text: text.into(),
            prefix: false,
        }
    }

    /// Creates a prefix term expression.
    pub fn prefix(text: impl Into<String>) -> Self {
        Self::Term {
            text: text.into(),
            prefix: true,
        }
    }

    /// Creates an And expression, flattening nested Ands.
    pub fn and(exprs: Vec<Self>) -> Self {
        let flattened: Vec<Self> = exprs
            .into_iter()
            .flat_map(|e| match e {
                Self::And(inner) => inner,
                other => vec![other],
            })
            .collect();

        match flattened.len() {
            1 => flattened.into_iter().next().unwrap(),
            _ => Self::And(flattened),
        }
    }

    /// Creates an Or expression, flattening nested Ors.
    pub fn or(exprs: Vec<Self>) -> Self {
        let flattened: Vec<Self> = exprs
            .into_iter()
            .flat_map(|e| match e {
                Self::Or(inner) => inner,
                other => vec![other],
            })
            .collect();

        match flattened.len() {
            1 => flattened.into_iter().next().unwrap(),
            _ => Self::Or(flattened),
        }
    }

    /// Renders the expression back to query syntax.
    ///
    /// Used in error messages to show the rewritten form of a query.
    pub fn to_query_string(&self) -> String {
        self.render(false)
    }

    /// Internal renderer; `grouped` adds parentheses around multi-part
    /// expressions nested under an operator or field.
    fn render(&self, grouped: bool) -> String {
        match self {
            Self::Term { text, prefix } => {
                if *prefix {
                    format!("{text}*")
                } else {
                    text.clone()
                }
            }
            Self::Phrase(content) => format!("\"{content}\""),
            Self::Not(inner) => format!("NOT {}", inner.render(true)),
            Self::And(exprs) => {
                let parts: Vec<String> = exprs.iter().map(|e| e.render(true)).collect();
                let joined = parts.join(" ");
                if grouped && exprs.len() > 1 {
                    format!("({joined})")
                } else {
                    joined
                }
            }
            Self::Or(exprs) => {
                let parts: Vec<String> = exprs.iter().map(|e| e.render(true)).collect();
                let joined = parts.join(" OR ");
                if grouped && exprs.len() > 1 {
                    format!("({joined})")
                } else {
                    joined
                }
            }
            Self::Field { field, expr } => {
                format!("{}:{}", field.as_str(), expr.render(true))
            }
        }
    }
}

impl fmt::Display for QueryExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_flattens_nested() {
        let expr = QueryExpr::and(vec![
            QueryExpr::and(vec![QueryExpr::term("a"), QueryExpr::term("b")]),
            QueryExpr::term("c"),
        ]);
        assert_eq!(
            expr,
            QueryExpr::And(vec![
                QueryExpr::term("a"),
                QueryExpr::term("b"),
                QueryExpr::term("c")
            ])
        );
    }

    #[test]
    fn single_element_collapses() {
        assert_eq!(QueryExpr::and(vec![QueryExpr::term("a")]), QueryExpr::term("a"));
        assert_eq!(QueryExpr::or(vec![QueryExpr::term("a")]), QueryExpr::term("a"));
    }

    #[test]
    fn query_field_names() {
        assert_eq!(
            QueryField::from_name("title"),
            Some(QueryField::Field(FieldKind::Title))
        );
        assert_eq!(QueryField::from_name("headings"), Some(QueryField::Headings));
        assert_eq!(QueryField::from_name("h3").unwrap().as_str(), "h3");
        assert_eq!(QueryField::from_name("tags"), None);
    }

    #[test]
    fn renders_query_syntax() {
        let expr = QueryExpr::And(vec![
            QueryExpr::Field {
                field: QueryField::Field(FieldKind::Title),
                expr: Box::new(QueryExpr::term("guia")),
            },
            QueryExpr::Or(vec![QueryExpr::term("rust"), QueryExpr::prefix("go")]),
            QueryExpr::Not(Box::new(QueryExpr::Phrase("old stuff".into()))),
        ]);
        assert_eq!(
            expr.to_query_string(),
            "title:guia (rust OR go*) NOT \"old stuff\""
        );
    }
}
