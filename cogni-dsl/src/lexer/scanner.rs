//! Lexer implementation

use super::token::*;
use crate::error::{Diagnostic, FrontendError};
use crate::grammar;
use std::iter::Peekable;
use std::str::CharIndices;

// ============================================================================
// LEXER IMPLEMENTATION
// ============================================================================

/// Lexer for the Cogni language.
///
/// Never fails: malformed input yields [`TokenKind::Error`] tokens, each paired
/// with one `LexError` diagnostic.
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
    pos: usize,
    /// Open `(` / `[` count; newlines inside brackets are layout only.
    nesting: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
            pos: 0,
            nesting: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Tokenize the entire source. The last token is always `Eof`.
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        (tokens, self.diagnostics)
    }

    /// Get the next token from the source.
    fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start_pos = self.pos;
        let start_line = self.line;
        let start_col = self.column;

        let scanned = match self.peek_char() {
            None => Ok(TokenKind::Eof),
            Some(c) => match c {
                '\n' => {
                    self.advance();
                    self.line += 1;
                    self.column = 1;
                    Ok(TokenKind::Newline)
                }
                '#' => Ok(self.scan_comment()),
                '(' => {
                    self.advance();
                    self.nesting += 1;
                    Ok(TokenKind::LParen)
                }
                ')' => {
                    self.advance();
                    self.nesting = self.nesting.saturating_sub(1);
                    Ok(TokenKind::RParen)
                }
                '[' => {
                    self.advance();
                    self.nesting += 1;
                    Ok(TokenKind::LBracket)
                }
                ']' => {
                    self.advance();
                    self.nesting = self.nesting.saturating_sub(1);
                    Ok(TokenKind::RBracket)
                }
                ':' => {
                    self.advance();
                    Ok(TokenKind::Colon)
                }
                ',' => {
                    self.advance();
                    Ok(TokenKind::Comma)
                }
                '.' => {
                    self.advance();
                    Ok(TokenKind::Dot)
                }
                '+' => {
                    self.advance();
                    Ok(TokenKind::Plus)
                }
                '*' => {
                    self.advance();
                    Ok(TokenKind::Star)
                }
                '/' => {
                    self.advance();
                    Ok(TokenKind::Slash)
                }
                '%' => {
                    self.advance();
                    Ok(TokenKind::Percent)
                }

                '-' => {
                    self.advance();
                    if self.peek_char() == Some('>') {
                        self.advance();
                        Ok(TokenKind::Arrow)
                    } else {
                        Ok(TokenKind::Minus)
                    }
                }

                '=' => {
                    self.advance();
                    if self.peek_char() == Some('=') {
                        self.advance();
                        Ok(TokenKind::Eq)
                    } else {
                        Ok(TokenKind::Assign)
                    }
                }

                '!' => {
                    self.advance();
                    if self.peek_char() == Some('=') {
                        self.advance();
                        Ok(TokenKind::Ne)
                    } else {
                        Err("unexpected character '!' (use 'not' for negation)".to_string())
                    }
                }

                '<' => {
                    self.advance();
                    if self.peek_char() == Some('=') {
                        self.advance();
                        Ok(TokenKind::Le)
                    } else {
                        Ok(TokenKind::Lt)
                    }
                }

                '>' => {
                    self.advance();
                    if self.peek_char() == Some('=') {
                        self.advance();
                        Ok(TokenKind::Ge)
                    } else {
                        Ok(TokenKind::Gt)
                    }
                }

                '"' | '\'' => self.scan_string(c),

                c if c.is_ascii_digit() => self.scan_number(),

                c if c.is_ascii_alphabetic() || c == '_' => Ok(self.scan_identifier()),

                c => {
                    self.advance();
                    Err(format!("unexpected character '{}'", c))
                }
            },
        };

        let span = Span {
            start: start_pos,
            end: self.pos,
            line: start_line,
            column: start_col,
        };

        let kind = match scanned {
            Ok(kind) => kind,
            Err(message) => {
                self.diagnostics
                    .push(FrontendError::Lex { message, span }.into());
                TokenKind::Error
            }
        };

        Token {
            kind,
            lexeme: self.source[start_pos..self.pos].to_string(),
            span,
        }
    }

    /// Scan an identifier or keyword.
    fn scan_identifier(&mut self) -> TokenKind {
        let start = self.pos;

        while let Some(c) = self.peek_char() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        grammar::keyword(&self.source[start..self.pos]).unwrap_or(TokenKind::Identifier)
    }

    /// Scan a single-line string literal. The lexeme keeps its quotes and
    /// escapes; they are resolved by the transformer.
    fn scan_string(&mut self, quote: char) -> Result<TokenKind, String> {
        self.advance(); // consume opening quote

        loop {
            match self.peek_char() {
                None | Some('\n') => return Err("unterminated string literal".to_string()),
                Some('\\') => {
                    self.advance();
                    if !matches!(self.peek_char(), None | Some('\n')) {
                        self.advance();
                    }
                }
                Some(c) if c == quote => {
                    self.advance();
                    return Ok(TokenKind::String);
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// Scan an unsigned integer or decimal literal. Literals that do not fit
    /// in an `f64` are rejected here.
    fn scan_number(&mut self) -> Result<TokenKind, String> {
        let start = self.pos;
        self.skip_digits();

        if self.peek_char() == Some('.')
            && self.peek_next_char().map(|c| c.is_ascii_digit()).unwrap_or(false)
        {
            self.advance();
            self.skip_digits();
        }

        let lexeme = &self.source[start..self.pos];
        match lexeme.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(TokenKind::Number),
            _ => Err(format!("number literal `{}` is out of range", lexeme)),
        }
    }

    fn skip_digits(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Scan a `#` comment up to (not including) the end of the line.
    fn scan_comment(&mut self) -> TokenKind {
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
        TokenKind::Comment
    }

    /// Skip insignificant whitespace. Inside brackets, newlines and comments
    /// are layout as well.
    fn skip_whitespace(&mut self) {
        loop {
            match self.peek_char() {
                Some(' ') | Some('\t') | Some('\r') => {
                    self.advance();
                }
                Some('\n') if self.nesting > 0 => {
                    self.advance();
                    self.line += 1;
                    self.column = 1;
                }
                Some('#') if self.nesting > 0 => {
                    self.scan_comment();
                }
                _ => break,
            }
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_next_char(&self) -> Option<char> {
        let mut iter = self.source[self.pos..].chars();
        iter.next();
        iter.next()
    }

    fn advance(&mut self) -> Option<char> {
        if let Some((i, c)) = self.chars.next() {
            self.pos = i + c.len_utf8();
            self.column += 1;
            Some(c)
        } else {
            None
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
