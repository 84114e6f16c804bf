//! Query parser.
//!
//! Parses a token stream into a query AST using recursive descent.
//!
//! # Grammar
//!
//! ```text
//! query      → or_expr
//! or_expr    → and_expr ("OR" and_expr)*
//! and_expr   → unary ("AND"? unary)*
//! unary      → "NOT" unary | primary
//! primary    → TERM | PHRASE | field_expr | "(" or_expr ")"
//! field_expr → FIELD_PREFIX (TERM | PHRASE | "(" or_expr ")")
//! ```
//!
//! AND between adjacent expressions is implicit; the keyword is accepted but
//! optional. Operator keywords match in any case.

use crate::{
    ast::{QueryExpr, QueryField},
    error::ParseError,
    lexer::{SpannedToken, Token, tokenize},
};

/// Recursive descent parser for query expressions.
struct Parser {
    /// Token stream to parse.
    tokens: Vec<SpannedToken>,
    /// Current position in token stream.
    position: usize,
}

impl Parser {
    fn new(tokens: Vec<SpannedToken>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Parses the token stream into a query expression.
    fn parse(mut self) -> Result<Option<QueryExpr>, ParseError> {
        if self.tokens.is_empty() {
            return Ok(None);
        }

        let expr = self.parse_or_expr()?;

        if self.position < self.tokens.len() {
            return Err(self.error_here(format!(
                "unexpected token: {:?}",
                self.tokens[self.position].token
            )));
        }

        Ok(Some(expr))
    }

    /// Parses: or_expr → and_expr ("OR" and_expr)*
    fn parse_or_expr(&mut self) -> Result<QueryExpr, ParseError> {
        let mut left = self.parse_and_expr()?;

        while self.check(&Token::Or) {
            self.advance(); // consume OR
            let right = self.parse_and_expr()?;
            left = QueryExpr::or(vec![left, right]);
        }

        Ok(left)
    }

    /// Parses: and_expr → unary ("AND"? unary)*
    fn parse_and_expr(&mut self) -> Result<QueryExpr, ParseError> {
        let mut exprs = Vec::new();

        exprs.push(self.parse_unary()?);

        loop {
            if self.check(&Token::And) {
                self.advance(); // consume explicit AND
                exprs.push(self.parse_unary()?);
            } else if self.can_start_unary() {
                exprs.push(self.parse_unary()?);
            } else {
                break;
            }
        }

        Ok(QueryExpr::and(exprs))
    }

    /// Checks if the current token can start a unary expression.
    fn can_start_unary(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                Token::Term(_)
                    | Token::Phrase(_)
                    | Token::Not
                    | Token::LParen
                    | Token::FieldPrefix(_)
            )
        )
    }

    /// Parses: unary → "NOT" unary | primary
    fn parse_unary(&mut self) -> Result<QueryExpr, ParseError> {
        if self.check(&Token::Not) {
            self.advance(); // consume NOT
            let expr = self.parse_unary()?;
            return Ok(QueryExpr::Not(Box::new(expr)));
        }

        self.parse_primary()
    }

    /// Parses: primary → TERM | PHRASE | field_expr | "(" or_expr ")"
    fn parse_primary(&mut self) -> Result<QueryExpr, ParseError> {
        match self.peek().cloned() {
            Some(Token::Term(_) | Token::Phrase(_)) => self.parse_term_or_phrase(),

            Some(Token::FieldPrefix(name)) => {
                let position = self.current_position();
                self.advance();
                self.parse_field_expr(&name, position)
            }

            Some(Token::LParen) => self.parse_group(),

            Some(Token::RParen) => Err(self.error_here("unexpected closing parenthesis")),

            Some(Token::Or) => {
                Err(self.error_here("unexpected OR (needs expression before it)"))
            }

            Some(Token::And) => {
                Err(self.error_here("unexpected AND (needs expression before it)"))
            }

            // parse_unary consumes NOT, so this is unreachable in practice.
            Some(Token::Not) => Err(self.error_here("unexpected NOT")),

            None => Err(ParseError::new("unexpected end of query", None)),
        }
    }

    /// Parses the expression after a field prefix.
    fn parse_field_expr(
        &mut self,
        name: &str,
        position: Option<usize>,
    ) -> Result<QueryExpr, ParseError> {
        let Some(field) = QueryField::from_name(name) else {
            return Err(ParseError::new(format!("unknown field: {name}"), position));
        };

        let expr = match self.peek().cloned() {
            Some(Token::Term(_) | Token::Phrase(_)) => self.parse_term_or_phrase()?,
            Some(Token::LParen) => self.parse_group()?,
            _ => {
                return Err(self.error_here(format!(
                    "expected term, phrase, or group after '{name}:'"
                )));
            }
        };

        Ok(QueryExpr::Field {
            field,
            expr: Box::new(expr),
        })
    }

    /// Parses a TERM or PHRASE token, consuming it.
    fn parse_term_or_phrase(&mut self) -> Result<QueryExpr, ParseError> {
        let position = self.current_position();
        match self.peek().cloned() {
            Some(Token::Term(text)) => {
                self.advance();
                match text.strip_suffix('*') {
                    Some(stem) if stem.is_empty() => {
                        Err(ParseError::new("prefix marker without a term", position))
                    }
                    Some(stem) => Ok(QueryExpr::prefix(stem)),
                    None => Ok(QueryExpr::term(text)),
                }
            }
            Some(Token::Phrase(content)) => {
                self.advance();
                Ok(QueryExpr::Phrase(content))
            }
            _ => Err(self.error_here("expected term or phrase")),
        }
    }

    /// Parses a parenthesized group.
    fn parse_group(&mut self) -> Result<QueryExpr, ParseError> {
        self.advance(); // consume (
        let expr = self.parse_or_expr()?;

        if !self.check(&Token::RParen) {
            return Err(self.error_here("expected closing parenthesis"));
        }
        self.advance(); // consume )

        Ok(expr)
    }

    /// The current token, if any.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|t| &t.token)
    }

    /// Byte position of the current token.
    fn current_position(&self) -> Option<usize> {
        self.tokens.get(self.position).map(|t| t.position)
    }

    /// True if the current token equals `token`.
    fn check(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    /// Advances past the current token.
    fn advance(&mut self) {
        self.position += 1;
    }

    /// Builds an error at the current token's byte position.
    fn error_here(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.current_position())
    }
}

/// Parses a query string into an expression tree.
///
/// Returns `None` for an empty or whitespace-only query.
pub fn parse(input: &str) -> Result<Option<QueryExpr>, ParseError> {
    let tokens = tokenize(input)?;
    Parser::new(tokens).parse()
}
