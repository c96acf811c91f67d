//! Parsing (tokens to AST)
//!
//! Recursive descent over a fixed precedence ladder, pulling tokens from
//! the lexer with one token of lookahead. The first error aborts the
//! parse; there is no recovery.

mod expr;
mod stmt;

use crate::ast::*;
use crate::diagnostic::{error_codes, Diagnostic};
use crate::lexer::Lexer;
use crate::span::Span;
use crate::token::{Token, TokenKind};
use crate::value::FlowError;
use flow_config::Settings;
use std::rc::Rc;

/// Parser state for building AST from tokens
pub struct Parser {
    pub(super) lexer: Lexer,
    /// Lookahead token
    pub(super) current: Token,
    /// End offset of the last consumed token
    pub(super) previous_end: usize,
    primed: bool,
}

impl Parser {
    /// Create a parser pulling tokens from `lexer`
    pub fn new(lexer: Lexer) -> Self {
        Self {
            lexer,
            current: Token::new(TokenKind::Eof, "", Span::default()),
            previous_end: 0,
            primed: false,
        }
    }

    /// Parser over `source` with the given translation table
    pub fn from_source(source: &str, settings: Rc<Settings>) -> Self {
        Self::new(Lexer::new(source, settings))
    }

    /// Parse the whole program
    pub fn parse(&mut self) -> Result<Program, FlowError> {
        if !self.primed {
            self.current = self.lexer.next_token()?;
            self.primed = true;
        }
        let body = self.parse_block(&[])?;
        if !self.check(TokenKind::Eof) {
            return Err(self.unexpected("a statement"));
        }
        Ok(Program { body })
    }

    /// Statements up to (not including) one of `terminators` or end of input
    pub(super) fn parse_block(&mut self, terminators: &[TokenKind]) -> Result<Block, FlowError> {
        let mut block = Vec::new();
        loop {
            while self.is_statement_separator() {
                self.advance()?;
            }
            if self.check(TokenKind::Eof) || terminators.contains(&self.current.kind) {
                break;
            }
            if !self.starts_statement() {
                break;
            }
            block.push(self.parse_statement()?);
        }
        Ok(block)
    }

    /// `;` separates statements, also when it doubles as the argument separator
    fn is_statement_separator(&self) -> bool {
        self.check(TokenKind::Semicolon)
            || (self.check(TokenKind::Separator) && self.current.lexeme == ";")
    }

    fn starts_statement(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Doc | TokenKind::Return | TokenKind::Raise
        ) || self.starts_expression()
    }

    pub(super) fn starts_expression(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Integer
                | TokenKind::Float
                | TokenKind::String
                | TokenKind::DateTime
                | TokenKind::Identifier
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::Not
                | TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::LeftParen
                | TokenKind::LeftBracket
                | TokenKind::LeftBrace
                | TokenKind::If
                | TokenKind::Try
                | TokenKind::Function
                | TokenKind::Module
        )
    }

    // === Token helpers ===

    /// Consume the lookahead and pull the next token
    pub(super) fn advance(&mut self) -> Result<Token, FlowError> {
        let next = self.lexer.next_token()?;
        let previous = std::mem::replace(&mut self.current, next);
        self.previous_end = previous.span.end;
        Ok(previous)
    }

    pub(super) fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    pub(super) fn match_token(&mut self, kind: TokenKind) -> Result<bool, FlowError> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(super) fn consume(&mut self, kind: TokenKind) -> Result<Token, FlowError> {
        if self.check(kind) {
            self.advance()
        } else {
            Err(self.unexpected(&self.describe(kind)))
        }
    }

    pub(super) fn consume_identifier(&mut self, context: &str) -> Result<String, FlowError> {
        if self.check(TokenKind::Identifier) {
            Ok(self.advance()?.lexeme)
        } else {
            Err(self.unexpected(&format!("a name {}", context)))
        }
    }

    /// Span from `start` to the end of the last consumed token
    pub(super) fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.previous_end.max(start))
    }

    pub(super) fn settings(&self) -> &Settings {
        self.lexer.settings()
    }

    /// Active spelling of a token kind, for messages
    pub(super) fn describe(&self, kind: TokenKind) -> String {
        match kind.keyword_role() {
            Some(role) => format!("'{}'", self.settings().keyword(role)),
            None if kind == TokenKind::Separator => {
                format!("'{}'", self.settings().argument_separator())
            }
            None => kind.describe().to_string(),
        }
    }

    fn describe_current(&self) -> String {
        match self.current.kind {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::String => format!("string \"{}\"", self.current.lexeme),
            TokenKind::Doc => "a documentation comment".to_string(),
            _ => format!("'{}'", self.current.lexeme),
        }
    }

    /// "expected X, found Y" at the lookahead token
    pub(super) fn unexpected(&self, expected: &str) -> FlowError {
        let message = format!("expected {}, found {}", expected, self.describe_current());
        self.error_at(self.current.span, error_codes::SYNTAX_ERROR, message)
    }

    pub(super) fn error_at(&self, span: Span, code: &str, message: impl Into<String>) -> FlowError {
        let diagnostic = Diagnostic::error_with_code(code, message, span).locate(self.lexer.chars(), span);
        FlowError::syntax(diagnostic, span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_source(source: &str) -> Result<Program, FlowError> {
        Parser::from_source(source, Rc::new(Settings::default())).parse()
    }

    fn single(source: &str) -> NodeKind {
        let mut program = parse_source(source).unwrap();
        assert_eq!(program.body.len(), 1, "expected one statement in {:?}", source);
        program.body.remove(0).kind
    }

    #[test]
    fn test_empty_program() {
        assert!(parse_source("").unwrap().body.is_empty());
        assert!(parse_source(" ; ;\n").unwrap().body.is_empty());
    }

    #[test]
    fn test_statements_split_by_whitespace_or_semicolon() {
        assert_eq!(parse_source("a = 1\nb = 2; c = 3").unwrap().body.len(), 3);
    }

    #[test]
    fn test_integer_literal() {
        assert_eq!(single("42"), NodeKind::Integer(42));
    }

    #[test]
    fn test_precedence_ladder() {
        // 1 + 2 * 3 == 7 parses as (1 + (2 * 3)) == 7
        match single("1 + 2 * 3 == 7") {
            NodeKind::Binary {
                op: BinaryOp::Equal,
                left,
                ..
            } => match left.kind {
                NodeKind::Binary {
                    op: BinaryOp::Add,
                    right,
                    ..
                } => assert!(matches!(
                    right.kind,
                    NodeKind::Binary {
                        op: BinaryOp::Multiply,
                        ..
                    }
                )),
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_power_is_right_associative() {
        match single("2 ^ 3 ^ 2") {
            NodeKind::Binary {
                op: BinaryOp::Power,
                left,
                right,
            } => {
                assert_eq!(left.kind, NodeKind::Integer(2));
                assert!(matches!(
                    right.kind,
                    NodeKind::Binary {
                        op: BinaryOp::Power,
                        ..
                    }
                ));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_not_binds_looser_than_equality() {
        assert!(matches!(single("not a == b"), NodeKind::Not(_)));
    }

    #[test]
    fn test_unexpected_eof_message() {
        let err = parse_source("if x do 1").unwrap_err();
        assert!(err.message.contains("expected 'end'"), "{}", err.message);
        assert!(err.message.contains("end of input"));
    }

    #[test]
    fn test_stray_closer() {
        let err = parse_source("1 )").unwrap_err();
        assert!(err.is_syntax());
    }
}
