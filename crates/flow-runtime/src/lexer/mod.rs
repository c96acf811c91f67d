//! Lexical analysis (tokenization)
//!
//! The lexer is pulled one token at a time by the parser. Every keyword and
//! symbol is looked up in the active [`Settings`], so a translated table
//! changes what the lexer recognizes without changing the grammar.
//!
//! Unclosed brackets, quotes, doc comments and datetime literals are
//! reported at their opening position. The first opener triggers a single
//! scan of the whole source that records every opener left unclosed.

mod literals;

use crate::diagnostic::{error_codes, Diagnostic};
use crate::span::Span;
use crate::token::{Token, TokenKind};
use crate::value::FlowError;
use flow_config::Settings;
use std::collections::HashSet;
use std::rc::Rc;

/// Lexer state for tokenizing source code
pub struct Lexer {
    /// Active translation table
    pub(super) settings: Rc<Settings>,
    /// Characters of source code
    pub(super) chars: Vec<char>,
    /// Current position in chars
    pub(super) current: usize,
    /// Start position of current token
    pub(super) start_pos: usize,
    /// Openers without a matching closer, computed on first use
    unclosed: Option<HashSet<usize>>,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str, settings: Rc<Settings>) -> Self {
        Self {
            settings,
            chars: source.chars().collect(),
            current: 0,
            start_pos: 0,
            unclosed: None,
        }
    }

    /// Source characters, used for rendering diagnostics
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn settings(&self) -> &Rc<Settings> {
        &self.settings
    }

    /// Tokenize the whole source, stopping at the first error
    pub fn tokenize(&mut self) -> Result<Vec<Token>, FlowError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    /// Scan the next token
    ///
    /// On return the cursor sits on the first character after the token.
    pub fn next_token(&mut self) -> Result<Token, FlowError> {
        self.skip_whitespace_and_comments();
        self.start_pos = self.current;

        if self.is_at_end() {
            return Ok(self.make_token(TokenKind::Eof, ""));
        }

        let settings = Rc::clone(&self.settings);
        let symbols = settings.symbols();

        if self.starts_with_at(self.current, &symbols.doc_marker) {
            return self.doc_comment();
        }

        let c = self.peek();

        if c == symbols.datetime_sigil
            && self.peek_at(1) == Some(symbols.datetime_marker)
            && self.peek_at(2) == Some('[')
        {
            return self.datetime();
        }
        if symbols.quotes.contains(&c) {
            return self.string(c);
        }
        if c == symbols.argument_separator {
            self.advance();
            return Ok(self.make_token(TokenKind::Separator, c.to_string()));
        }
        if c.is_ascii_digit() {
            return self.number();
        }
        if is_identifier_start(c) {
            return Ok(self.identifier());
        }

        self.advance();
        let token = match c {
            '(' => {
                self.check_closed(self.start_pos, "'(' must close", "add a matching ')'")?;
                self.make_token(TokenKind::LeftParen, "(")
            }
            '[' => {
                self.check_closed(self.start_pos, "'[' must close", "add a matching ']'")?;
                self.make_token(TokenKind::LeftBracket, "[")
            }
            '{' => {
                self.check_closed(self.start_pos, "'{' must close", "add a matching '}'")?;
                self.make_token(TokenKind::LeftBrace, "{")
            }
            ')' => self.make_token(TokenKind::RightParen, ")"),
            ']' => self.make_token(TokenKind::RightBracket, "]"),
            '}' => self.make_token(TokenKind::RightBrace, "}"),
            '.' => self.make_token(TokenKind::Dot, "."),
            ':' => self.make_token(TokenKind::Colon, ":"),
            ';' => self.make_token(TokenKind::Semicolon, ";"),
            '+' => self.make_token(TokenKind::Plus, "+"),
            '-' => self.make_token(TokenKind::Minus, "-"),
            '*' => self.make_token(TokenKind::Star, "*"),
            '/' => self.make_token(TokenKind::Slash, "/"),
            '%' => self.make_token(TokenKind::Percent, "%"),
            '^' => self.make_token(TokenKind::Caret, "^"),
            '=' => {
                if self.match_char('=') {
                    self.make_token(TokenKind::EqualEqual, "==")
                } else {
                    self.make_token(TokenKind::Equal, "=")
                }
            }
            '!' if self.match_char('=') => self.make_token(TokenKind::BangEqual, "!="),
            '<' => {
                if self.match_char('=') {
                    self.make_token(TokenKind::LessEqual, "<=")
                } else {
                    self.make_token(TokenKind::Less, "<")
                }
            }
            '>' => {
                if self.match_char('=') {
                    self.make_token(TokenKind::GreaterEqual, ">=")
                } else {
                    self.make_token(TokenKind::Greater, ">")
                }
            }
            _ => {
                let span = Span::new(self.start_pos, self.current);
                return Err(FlowError::syntax(
                    self.diagnostic(
                        error_codes::UNEXPECTED_CHARACTER,
                        format!("unexpected character '{}'", c),
                        span,
                    ),
                    span,
                ));
            }
        };
        Ok(token)
    }

    /// Skip whitespace and line comments, stopping at a doc marker
    fn skip_whitespace_and_comments(&mut self) {
        let settings = Rc::clone(&self.settings);
        let symbols = settings.symbols();
        while !self.is_at_end() {
            if self.starts_with_at(self.current, &symbols.doc_marker) {
                return;
            }
            if self.starts_with_at(self.current, &symbols.line_comment) {
                while !self.is_at_end() && self.peek() != '\n' {
                    self.advance();
                }
                continue;
            }
            if self.peek().is_whitespace() {
                self.advance();
            } else {
                return;
            }
        }
    }

    /// Fail if the opener at `pos` has no matching closer
    pub(super) fn check_closed(
        &mut self,
        pos: usize,
        message: &str,
        help: &str,
    ) -> Result<(), FlowError> {
        self.check_closed_with_code(pos, error_codes::UNCLOSED_DELIMITER, message, help)
    }

    pub(super) fn check_closed_with_code(
        &mut self,
        pos: usize,
        code: &str,
        message: &str,
        help: &str,
    ) -> Result<(), FlowError> {
        if self.unclosed.is_none() {
            self.unclosed = Some(self.scan_delimiters());
        }
        let is_unclosed = self
            .unclosed
            .as_ref()
            .map(|set| set.contains(&pos))
            .unwrap_or(false);
        if is_unclosed {
            let span = Span::new(pos, pos + 1);
            let diagnostic = self
                .diagnostic(code, message, span)
                .with_label("opened here")
                .with_help(help);
            return Err(FlowError::syntax(diagnostic, span));
        }
        Ok(())
    }

    /// Record the position of every opener left unclosed in the source.
    ///
    /// Skips the same regions the lexer treats as opaque: line comments,
    /// doc comments, string and datetime contents.
    fn scan_delimiters(&self) -> HashSet<usize> {
        let symbols = self.settings.symbols();
        let len = self.chars.len();
        let mut unclosed = HashSet::new();
        let mut stack: Vec<(char, usize)> = Vec::new();
        let mut i = 0;

        while i < len {
            if self.starts_with_at(i, &symbols.doc_marker) {
                let marker = i;
                i += symbols.doc_marker.chars().count();
                let mut j = i;
                while j < len && self.chars[j].is_whitespace() {
                    j += 1;
                }
                if self.starts_with_at(j, "/*") {
                    match self.find_str(j + 2, "*/") {
                        Some(end) => i = end + 2,
                        None => {
                            unclosed.insert(marker);
                            i = len;
                        }
                    }
                }
                continue;
            }
            if self.starts_with_at(i, &symbols.line_comment) {
                while i < len && self.chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }

            let c = self.chars[i];
            if c == symbols.datetime_sigil
                && self.chars.get(i + 1) == Some(&symbols.datetime_marker)
                && self.chars.get(i + 2) == Some(&'[')
            {
                match self.chars[i + 3..].iter().position(|ch| *ch == ']') {
                    Some(offset) => i = i + 3 + offset + 1,
                    None => {
                        unclosed.insert(i + 2);
                        i = len;
                    }
                }
                continue;
            }
            if symbols.quotes.contains(&c) {
                let mut j = i + 1;
                loop {
                    if j >= len {
                        unclosed.insert(i);
                        i = len;
                        break;
                    }
                    if self.chars[j] == '\\' {
                        j += 2;
                        continue;
                    }
                    if self.chars[j] == c {
                        i = j + 1;
                        break;
                    }
                    j += 1;
                }
                continue;
            }

            match c {
                '(' | '[' | '{' => stack.push((c, i)),
                ')' | ']' | '}' => {
                    if let Some(&(open, _)) = stack.last() {
                        if closer_for(open) == c {
                            stack.pop();
                        }
                    }
                }
                _ => {}
            }
            i += 1;
        }

        unclosed.extend(stack.into_iter().map(|(_, pos)| pos));
        unclosed
    }

    /// Located diagnostic for a span of this source
    pub(super) fn diagnostic(&self, code: &str, message: impl Into<String>, span: Span) -> Diagnostic {
        Diagnostic::error_with_code(code, message, span).locate(&self.chars, span)
    }

    pub(super) fn make_token(&self, kind: TokenKind, lexeme: impl Into<String>) -> Token {
        Token::new(kind, lexeme, Span::new(self.start_pos, self.current))
    }

    pub(super) fn is_at_end(&self) -> bool {
        self.current >= self.chars.len()
    }

    pub(super) fn advance(&mut self) -> char {
        let c = self.chars[self.current];
        self.current += 1;
        c
    }

    pub(super) fn peek(&self) -> char {
        self.chars.get(self.current).copied().unwrap_or('\0')
    }

    pub(super) fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.current + offset).copied()
    }

    pub(super) fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.chars[self.current] != expected {
            return false;
        }
        self.current += 1;
        true
    }

    pub(super) fn starts_with_at(&self, pos: usize, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let mut i = pos;
        for expected in text.chars() {
            if self.chars.get(i) != Some(&expected) {
                return false;
            }
            i += 1;
        }
        true
    }

    pub(super) fn find_str(&self, from: usize, text: &str) -> Option<usize> {
        (from..self.chars.len()).find(|&i| self.starts_with_at(i, text))
    }
}

fn closer_for(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

pub(crate) fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

pub(crate) fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_config::SettingsLoader;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source, Rc::new(Settings::default()));
        lexer
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn lex_error(source: &str) -> FlowError {
        let mut lexer = Lexer::new(source, Rc::new(Settings::default()));
        lexer.tokenize().unwrap_err()
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("+ - * / % ^ == != < <= > >= = . : ;"),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Percent,
                TokenKind::Caret,
                TokenKind::EqualEqual,
                TokenKind::BangEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Equal,
                TokenKind::Dot,
                TokenKind::Colon,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_cursor_rests_on_next_token() {
        let mut lexer = Lexer::new("ab+1", Rc::new(Settings::default()));
        let token = lexer.next_token().unwrap();
        assert_eq!(token.lexeme, "ab");
        assert_eq!(lexer.current, 2);
        assert_eq!(lexer.peek(), '+');
    }

    #[test]
    fn test_else_if_phrase() {
        assert_eq!(
            kinds("else if else iffy else"),
            vec![
                TokenKind::ElseIf,
                TokenKind::Else,
                TokenKind::Identifier,
                TokenKind::Else,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_phrase_requires_single_space() {
        assert_eq!(
            kinds("else  if"),
            vec![TokenKind::Else, TokenKind::If, TokenKind::Eof]
        );
    }

    #[test]
    fn test_translated_keywords() {
        let settings = SettingsLoader::new()
            .without_env()
            .load_from_str("[keywords]\nif = \"si\"\nelse_if = \"sinon si\"\nelse = \"sinon\"")
            .unwrap();
        let mut lexer = Lexer::new("si sinon si sinon if", Rc::new(settings));
        let kinds: Vec<TokenKind> = lexer
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::If,
                TokenKind::ElseIf,
                TokenKind::Else,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_line_comment_skipped() {
        assert_eq!(
            kinds("1 # comment ( unbalanced\n2"),
            vec![TokenKind::Integer, TokenKind::Integer, TokenKind::Eof]
        );
    }

    #[test]
    fn test_unclosed_paren_reported_at_open() {
        let err = lex_error("x = (1 + [2]");
        assert!(err.is_syntax());
        assert_eq!(err.span, Some(Span::new(4, 5)));
        let diagnostic = err.diagnostic.unwrap();
        assert_eq!(diagnostic.code, error_codes::UNCLOSED_DELIMITER);
        assert!(diagnostic.message.contains("must close"));
    }

    #[test]
    fn test_unclosed_reported_before_later_tokens() {
        // The error surfaces on the opener, not at end of input
        let mut lexer = Lexer::new("f( 1 2 3", Rc::new(Settings::default()));
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Identifier);
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn test_brackets_in_strings_ignored() {
        assert_eq!(
            kinds("(\")\")"),
            vec![
                TokenKind::LeftParen,
                TokenKind::String,
                TokenKind::RightParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unexpected_character() {
        let err = lex_error("1 ! 2");
        assert_eq!(
            err.diagnostic.unwrap().code,
            error_codes::UNEXPECTED_CHARACTER
        );
    }
}
