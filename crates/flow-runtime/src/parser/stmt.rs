//! Statement and definition parsing

use crate::ast::*;
use crate::diagnostic::error_codes;
use crate::parser::Parser;
use crate::stack::ensure_sufficient_stack;
use crate::token::TokenKind;
use crate::value::FlowError;
use std::collections::HashSet;
use std::rc::Rc;

impl Parser {
    /// Parse a statement: documentation, `return`, `raise`, assignment or
    /// a bare expression
    pub(super) fn parse_statement(&mut self) -> Result<Node, FlowError> {
        let start = self.current.span.start;
        match self.current.kind {
            TokenKind::Doc => {
                let text = self.advance()?.lexeme;
                if !self.starts_statement_after_doc() {
                    return Err(self.unexpected("a statement after the documentation"));
                }
                let target = ensure_sufficient_stack(|| self.parse_statement())?;
                Ok(Node::new(
                    NodeKind::Doc {
                        text,
                        target: Box::new(target),
                    },
                    self.span_from(start),
                ))
            }
            TokenKind::Return => {
                self.advance()?;
                let value = if self.starts_expression() {
                    Some(Box::new(self.parse_expression()?))
                } else {
                    None
                };
                Ok(Node::new(NodeKind::Return(value), self.span_from(start)))
            }
            TokenKind::Raise => {
                self.advance()?;
                let first = self.parse_expression()?;
                let kind = if self.match_token(TokenKind::Colon)? {
                    let message = self.parse_expression()?;
                    NodeKind::Raise {
                        kind: Some(Box::new(first)),
                        message: Box::new(message),
                    }
                } else {
                    NodeKind::Raise {
                        kind: None,
                        message: Box::new(first),
                    }
                };
                Ok(Node::new(kind, self.span_from(start)))
            }
            _ => self.parse_assignment(),
        }
    }

    fn starts_statement_after_doc(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Return | TokenKind::Raise | TokenKind::Doc
        ) || self.starts_expression()
    }

    /// `target = value` or a bare expression
    fn parse_assignment(&mut self) -> Result<Node, FlowError> {
        let start = self.current.span.start;
        let target = self.parse_expression()?;
        if !self.check(TokenKind::Equal) {
            return Ok(target);
        }
        if !target.is_assignable() {
            return Err(self.error_at(
                target.span,
                error_codes::INVALID_ASSIGNMENT_TARGET,
                "can only assign to a name, an index or an attribute",
            ));
        }
        self.advance()?;
        let value = self.parse_expression()?;
        Ok(Node::new(
            NodeKind::Assign {
                target: Box::new(target),
                value: Box::new(value),
            },
            self.span_from(start),
        ))
    }

    /// `function name?(params) do ... end`
    pub(super) fn parse_function(&mut self) -> Result<Node, FlowError> {
        let start = self.consume(TokenKind::Function)?.span.start;
        let name = if self.check(TokenKind::Identifier) {
            Some(self.advance()?.lexeme)
        } else {
            None
        };
        self.consume(TokenKind::LeftParen)?;
        let params = self.parse_parameters()?;
        self.consume(TokenKind::Do)?;
        let body = self.parse_block(&[TokenKind::End])?;
        self.consume(TokenKind::End)?;

        let span = self.span_from(start);
        Ok(Node::new(
            NodeKind::Function(Rc::new(FunctionDef {
                name,
                params,
                body,
                span,
            })),
            span,
        ))
    }

    /// `module name? (params)? do ... end`
    pub(super) fn parse_module(&mut self) -> Result<Node, FlowError> {
        let start = self.consume(TokenKind::Module)?.span.start;
        let name = if self.check(TokenKind::Identifier) {
            Some(self.advance()?.lexeme)
        } else {
            None
        };
        let params = if self.match_token(TokenKind::LeftParen)? {
            Some(self.parse_parameters()?)
        } else {
            None
        };
        self.consume(TokenKind::Do)?;
        let body = self.parse_block(&[TokenKind::End])?;
        self.consume(TokenKind::End)?;

        let span = self.span_from(start);
        Ok(Node::new(
            NodeKind::Module(Rc::new(ModuleDef {
                name,
                params,
                body,
                span,
            })),
            span,
        ))
    }

    /// Parameter list after `(`, through the closing `)`.
    /// Each parameter is a bare name or `name = default`.
    fn parse_parameters(&mut self) -> Result<Vec<Parameter>, FlowError> {
        let mut params = Vec::new();
        let mut seen = HashSet::new();
        while !self.check(TokenKind::RightParen) {
            let start = self.current.span.start;
            if !self.check(TokenKind::Identifier) {
                return Err(self.error_at(
                    self.current.span,
                    error_codes::INVALID_PARAMETER,
                    format!(
                        "a parameter must be a name or name = default, found '{}'",
                        self.current.lexeme
                    ),
                ));
            }
            let name = self.advance()?.lexeme;
            let default = if self.match_token(TokenKind::Equal)? {
                Some(self.parse_expression()?)
            } else {
                None
            };
            let span = self.span_from(start);
            if !seen.insert(name.clone()) {
                return Err(self.error_at(
                    span,
                    error_codes::INVALID_PARAMETER,
                    format!("duplicate parameter '{}'", name),
                ));
            }
            params.push(Parameter {
                name,
                default,
                span,
            });
            if !self.check(TokenKind::Separator) && !self.check(TokenKind::RightParen) {
                return Err(self.error_at(
                    self.current.span,
                    error_codes::INVALID_PARAMETER,
                    "a parameter must be a name or name = default",
                ));
            }
            if !self.match_token(TokenKind::Separator)? {
                break;
            }
        }
        self.consume(TokenKind::RightParen)?;
        Ok(params)
    }

    /// `if c do ... else if c do ... else do? ... end`
    ///
    /// The `else if` chain is collected in a loop so its length never
    /// deepens the parser's recursion.
    pub(super) fn parse_if(&mut self) -> Result<Node, FlowError> {
        let start = self.consume(TokenKind::If)?.span.start;
        let mut branches = Vec::new();

        let condition = self.parse_expression()?;
        self.consume(TokenKind::Do)?;
        let block = self.parse_block(&[TokenKind::ElseIf, TokenKind::Else, TokenKind::End])?;
        branches.push((condition, block));

        while self.match_token(TokenKind::ElseIf)? {
            let condition = self.parse_expression()?;
            self.consume(TokenKind::Do)?;
            let block = self.parse_block(&[TokenKind::ElseIf, TokenKind::Else, TokenKind::End])?;
            branches.push((condition, block));
        }

        let otherwise = if self.match_token(TokenKind::Else)? {
            self.match_token(TokenKind::Do)?;
            Some(self.parse_block(&[TokenKind::End])?)
        } else {
            None
        };
        self.consume(TokenKind::End)?;

        Ok(Node::new(
            NodeKind::If {
                branches,
                otherwise,
            },
            self.span_from(start),
        ))
    }

    /// `try do ... otherwise (e)? do ... end`
    pub(super) fn parse_try(&mut self) -> Result<Node, FlowError> {
        let start = self.consume(TokenKind::Try)?.span.start;
        self.consume(TokenKind::Do)?;
        let body = self.parse_block(&[TokenKind::Otherwise])?;
        self.consume(TokenKind::Otherwise)?;

        let binding = if self.match_token(TokenKind::LeftParen)? {
            let name = self.consume_identifier("for the caught error")?;
            self.consume(TokenKind::RightParen)?;
            Some(name)
        } else if self.check(TokenKind::Identifier) {
            Some(self.advance()?.lexeme)
        } else {
            None
        };

        self.consume(TokenKind::Do)?;
        let handler = self.parse_block(&[TokenKind::End])?;
        self.consume(TokenKind::End)?;

        Ok(Node::new(
            NodeKind::Try {
                body,
                binding,
                handler,
            },
            self.span_from(start),
        ))
    }
}
