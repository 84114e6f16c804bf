//! Query lexer (tokenizer).
//!
//! Converts a query string into a stream of position-tagged tokens for the
//! parser. Quoted spans stay atomic; operators, parentheses and field
//! prefixes become their own tokens; everything else is a term.

use std::{iter::Peekable, str::Chars};

use crate::error::LexError;

/// A token in the query language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A bare word (search term), `*` suffix included verbatim.
    Term(String),

    /// A quoted phrase (quotes stripped, content preserved).
    Phrase(String),

    /// The AND keyword.
    And,

    /// The OR keyword.
    Or,

    /// The NOT keyword.
    Not,

    /// Left parenthesis.
    LParen,

    /// Right parenthesis.
    RParen,

    /// Field prefix (e.g. "title:" produces FieldPrefix("title")).
    FieldPrefix(String),
}

/// A token plus the byte position where it starts in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    /// The token.
    pub token: Token,
    /// Byte offset of the token's first character.
    pub position: usize,
}

/// Tokenizes a query string.
struct Lexer<'a> {
    /// Character iterator with one-character lookahead.
    chars: Peekable<Chars<'a>>,
    /// Current byte position in input.
    position: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            position: 0,
        }
    }

    /// Tokenizes the entire input, returning all tokens or an error.
    fn tokenize(mut self) -> Result<Vec<SpannedToken>, LexError> {
        let mut tokens = Vec::new();

        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }

        Ok(tokens)
    }

    /// Returns the next token, or None at end of input.
    fn next_token(&mut self) -> Result<Option<SpannedToken>, LexError> {
        self.skip_whitespace();

        let start = self.position;
        let Some(&ch) = self.chars.peek() else {
            return Ok(None);
        };

        let token = match ch {
            '"' => Some(self.read_phrase(start)?),
            '(' => {
                self.advance();
                Some(Token::LParen)
            }
            ')' => {
                self.advance();
                Some(Token::RParen)
            }
            _ => self.read_word()?,
        };

        Ok(token.map(|token| SpannedToken {
            token,
            position: start,
        }))
    }

    /// Reads a quoted phrase.
    fn read_phrase(&mut self, start: usize) -> Result<Token, LexError> {
        self.advance(); // consume opening quote

        let mut content = String::new();

        loop {
            match self.chars.peek() {
                Some(&'"') => {
                    self.advance(); // consume closing quote
                    return Ok(Token::Phrase(content));
                }
                Some(&ch) => {
                    content.push(ch);
                    self.advance();
                }
                None => {
                    return Err(LexError::new("unclosed quote", start));
                }
            }
        }
    }

    /// Reads a term, operator keyword, or field prefix.
    fn read_word(&mut self) -> Result<Option<Token>, LexError> {
        let mut word = String::new();

        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() || ch == '(' || ch == ')' || ch == '"' {
                break;
            }

            // A word ending in a colon is a field prefix.
            if ch == ':' {
                self.advance(); // consume the colon
                if word.is_empty() {
                    // Bare colon, treat as part of the next term.
                    continue;
                }
                return Ok(Some(Token::FieldPrefix(word)));
            }

            word.push(ch);
            self.advance();
        }

        if word.is_empty() {
            return Ok(None);
        }

        // Operator keywords are case-insensitive.
        if word.eq_ignore_ascii_case("AND") {
            return Ok(Some(Token::And));
        }
        if word.eq_ignore_ascii_case("OR") {
            return Ok(Some(Token::Or));
        }
        if word.eq_ignore_ascii_case("NOT") {
            return Ok(Some(Token::Not));
        }

        Ok(Some(Token::Term(word)))
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Advances to the next character.
    fn advance(&mut self) {
        if let Some(ch) = self.chars.next() {
            self.position += ch.len_utf8();
        }
    }
}

/// Convenience function to tokenize a query string.
pub fn tokenize(input: &str) -> Result<Vec<SpannedToken>, LexError> {
    Lexer::new(input).tokenize()
}
