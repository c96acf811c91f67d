//! Expression parsing
//!
//! Lowest to highest binding:
//! or, and, not, equality, relational (with `in`), additive,
//! multiplicative, power (right-associative), unary sign, primary.

use crate::ast::*;
use crate::diagnostic::error_codes;
use crate::parser::Parser;
use crate::stack::ensure_sufficient_stack;
use crate::token::TokenKind;
use crate::value::{FlowError, MAX_SAFE_INTEGER};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

impl Parser {
    /// Nested expressions recurse through here, so the host stack is
    /// grown before it runs out
    pub(super) fn parse_expression(&mut self) -> Result<Node, FlowError> {
        ensure_sufficient_stack(|| self.parse_disjunction())
    }

    fn parse_disjunction(&mut self) -> Result<Node, FlowError> {
        let start = self.current.span.start;
        let mut left = self.parse_conjunction()?;
        while self.match_token(TokenKind::Or)? {
            let right = self.parse_conjunction()?;
            left = self.logical(LogicalOp::Or, left, right, start);
        }
        Ok(left)
    }

    fn parse_conjunction(&mut self) -> Result<Node, FlowError> {
        let start = self.current.span.start;
        let mut left = self.parse_inversion()?;
        while self.match_token(TokenKind::And)? {
            let right = self.parse_inversion()?;
            left = self.logical(LogicalOp::And, left, right, start);
        }
        Ok(left)
    }

    fn parse_inversion(&mut self) -> Result<Node, FlowError> {
        let start = self.current.span.start;
        if self.match_token(TokenKind::Not)? {
            let operand = ensure_sufficient_stack(|| self.parse_inversion())?;
            return Ok(Node::new(NodeKind::Not(Box::new(operand)), self.span_from(start)));
        }
        self.parse_equality()
    }

    fn parse_equality(&mut self) -> Result<Node, FlowError> {
        let start = self.current.span.start;
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.current.kind {
                TokenKind::EqualEqual => BinaryOp::Equal,
                TokenKind::BangEqual => BinaryOp::NotEqual,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_relational()?;
            left = self.binary(op, left, right, start);
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Node, FlowError> {
        let start = self.current.span.start;
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Less => BinaryOp::Less,
                TokenKind::LessEqual => BinaryOp::LessEqual,
                TokenKind::Greater => BinaryOp::Greater,
                TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
                TokenKind::In => BinaryOp::In,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_additive()?;
            left = self.binary(op, left, right, start);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Node, FlowError> {
        let start = self.current.span.start;
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Subtract,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = self.binary(op, left, right, start);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Node, FlowError> {
        let start = self.current.span.start;
        let mut left = self.parse_power()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Star => BinaryOp::Multiply,
                TokenKind::Slash => BinaryOp::Divide,
                TokenKind::Percent => BinaryOp::Remainder,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_power()?;
            left = self.binary(op, left, right, start);
        }
        Ok(left)
    }

    fn parse_power(&mut self) -> Result<Node, FlowError> {
        let start = self.current.span.start;
        let base = self.parse_unary()?;
        if self.match_token(TokenKind::Caret)? {
            let exponent = ensure_sufficient_stack(|| self.parse_power())?;
            return Ok(self.binary(BinaryOp::Power, base, exponent, start));
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> Result<Node, FlowError> {
        let start = self.current.span.start;
        let op = match self.current.kind {
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Minus => UnaryOp::Minus,
            _ => return self.parse_primary(),
        };
        self.advance()?;
        let operand = ensure_sufficient_stack(|| self.parse_unary())?;
        Ok(Node::new(
            NodeKind::Unary {
                op,
                operand: Box::new(operand),
            },
            self.span_from(start),
        ))
    }

    /// An atom followed by any chain of `.name`, `[index]`, `(args)` and
    /// `{args}`
    fn parse_primary(&mut self) -> Result<Node, FlowError> {
        let start = self.current.span.start;
        let mut node = self.parse_atom()?;
        loop {
            match self.current.kind {
                TokenKind::Dot => {
                    self.advance()?;
                    let name = self.consume_identifier("after '.'")?;
                    node = Node::new(
                        NodeKind::Attribute {
                            object: Box::new(node),
                            name,
                        },
                        self.span_from(start),
                    );
                }
                TokenKind::LeftBracket => {
                    self.advance()?;
                    let index = self.parse_expression()?;
                    self.consume(TokenKind::RightBracket)?;
                    node = Node::new(
                        NodeKind::Index {
                            object: Box::new(node),
                            index: Box::new(index),
                        },
                        self.span_from(start),
                    );
                }
                TokenKind::LeftParen => {
                    self.advance()?;
                    let args = self.parse_arguments(TokenKind::RightParen)?;
                    node = Node::new(
                        NodeKind::Call {
                            callee: Box::new(node),
                            args,
                        },
                        self.span_from(start),
                    );
                }
                TokenKind::LeftBrace => {
                    self.advance()?;
                    let args = self.parse_arguments(TokenKind::RightBrace)?;
                    node = Node::new(
                        NodeKind::Construct {
                            callee: Box::new(node),
                            args,
                        },
                        self.span_from(start),
                    );
                }
                _ => break,
            }
        }
        Ok(node)
    }

    /// Positional and `name = value` arguments through `close`
    fn parse_arguments(&mut self, close: TokenKind) -> Result<Vec<Argument>, FlowError> {
        let mut args: Vec<Argument> = Vec::new();
        while !self.check(close) {
            let value = self.parse_expression()?;
            let argument = if self.check(TokenKind::Equal) {
                let name = match value.kind {
                    NodeKind::Variable(name) => name,
                    _ => {
                        return Err(self.error_at(
                            value.span,
                            error_codes::INVALID_PARAMETER,
                            "a named argument must be written name = value",
                        ))
                    }
                };
                self.advance()?;
                Argument {
                    name: Some(name),
                    value: self.parse_expression()?,
                }
            } else {
                if args.iter().any(|arg| arg.name.is_some()) {
                    return Err(self.error_at(
                        value.span,
                        error_codes::SYNTAX_ERROR,
                        "positional argument after a named argument",
                    ));
                }
                Argument { name: None, value }
            };
            args.push(argument);
            if !self.match_token(TokenKind::Separator)? {
                break;
            }
        }
        self.consume(close)?;
        Ok(args)
    }

    fn parse_atom(&mut self) -> Result<Node, FlowError> {
        let start = self.current.span.start;
        match self.current.kind {
            TokenKind::Integer => {
                let token = self.advance()?;
                match token.lexeme.parse::<i64>() {
                    Ok(n) if n <= MAX_SAFE_INTEGER => {
                        Ok(Node::new(NodeKind::Integer(n), token.span))
                    }
                    _ => Err(FlowError::number_too_big(format!(
                        "{} exceeds the largest supported integer",
                        token.lexeme
                    ))
                    .with_span(token.span)),
                }
            }
            TokenKind::Float => {
                let token = self.advance()?;
                let separator = self.settings().decimal_separator();
                let text = token.lexeme.replace(separator, ".");
                match text.parse::<f64>() {
                    Ok(f) if f.is_finite() => Ok(Node::new(NodeKind::Float(f), token.span)),
                    _ => Err(self.error_at(
                        token.span,
                        error_codes::MALFORMED_NUMBER,
                        format!("'{}' is not a valid number", token.lexeme),
                    )),
                }
            }
            TokenKind::String => {
                let token = self.advance()?;
                Ok(Node::new(NodeKind::Str(token.lexeme), token.span))
            }
            TokenKind::DateTime => {
                let token = self.advance()?;
                match normalize_datetime(&token.lexeme) {
                    Some(text) => Ok(Node::new(NodeKind::DateTime(text), token.span)),
                    None => Err(self.error_at(
                        token.span,
                        error_codes::MALFORMED_DATETIME,
                        format!("'{}' is not a valid date or datetime", token.lexeme),
                    )),
                }
            }
            TokenKind::True => {
                let token = self.advance()?;
                Ok(Node::new(NodeKind::Boolean(true), token.span))
            }
            TokenKind::False => {
                let token = self.advance()?;
                Ok(Node::new(NodeKind::Boolean(false), token.span))
            }
            TokenKind::Null => {
                let token = self.advance()?;
                Ok(Node::new(NodeKind::Null, token.span))
            }
            TokenKind::Identifier => {
                let token = self.advance()?;
                Ok(Node::new(NodeKind::Variable(token.lexeme), token.span))
            }
            TokenKind::LeftParen => {
                self.advance()?;
                let inner = self.parse_expression()?;
                self.consume(TokenKind::RightParen)?;
                Ok(Node::new(inner.kind, self.span_from(start)))
            }
            TokenKind::LeftBracket => {
                self.advance()?;
                let mut items = Vec::new();
                while !self.check(TokenKind::RightBracket) {
                    items.push(self.parse_expression()?);
                    if !self.match_token(TokenKind::Separator)? {
                        break;
                    }
                }
                self.consume(TokenKind::RightBracket)?;
                Ok(Node::new(NodeKind::List(items), self.span_from(start)))
            }
            TokenKind::LeftBrace => {
                self.advance()?;
                let mut entries = Vec::new();
                while !self.check(TokenKind::RightBrace) {
                    let key = self.parse_expression()?;
                    self.consume(TokenKind::Colon)?;
                    let value = self.parse_expression()?;
                    entries.push((key, value));
                    if !self.match_token(TokenKind::Separator)? {
                        break;
                    }
                }
                self.consume(TokenKind::RightBrace)?;
                Ok(Node::new(NodeKind::Dict(entries), self.span_from(start)))
            }
            TokenKind::Function => self.parse_function(),
            TokenKind::Module => self.parse_module(),
            TokenKind::If => self.parse_if(),
            TokenKind::Try => self.parse_try(),
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn binary(&self, op: BinaryOp, left: Node, right: Node, start: usize) -> Node {
        Node::new(
            NodeKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            self.span_from(start),
        )
    }

    fn logical(&self, op: LogicalOp, left: Node, right: Node, start: usize) -> Node {
        Node::new(
            NodeKind::Logical {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            self.span_from(start),
        )
    }
}

/// Normalized ISO-8601 text of a date, a date-time, or an RFC 3339 stamp
pub(crate) fn normalize_datetime(text: &str) -> Option<String> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date.format("%Y-%m-%d").to_string());
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(stamp) = NaiveDateTime::parse_from_str(text, format) {
            return Some(stamp.format("%Y-%m-%dT%H:%M:%S").to_string());
        }
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|stamp| stamp.to_rfc3339())
}
