//! Runtime errors and non-local exits

use crate::diagnostic::Diagnostic;
use crate::span::Span;
use crate::value::Value;
use flow_config::{ErrorClass, Settings};
use std::fmt;
use thiserror::Error;

/// Error taxonomy. Built-in kinds have translatable names; `Custom` carries
/// the name a user gave in a `raise "Type": message` statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Syntax,
    Type,
    Attribute,
    Key,
    Index,
    ZeroDivision,
    NumberTooBig,
    Name,
    Error,
    Custom(String),
}

impl ErrorKind {
    pub fn class(&self) -> Option<ErrorClass> {
        match self {
            ErrorKind::Syntax => Some(ErrorClass::Syntax),
            ErrorKind::Type => Some(ErrorClass::Type),
            ErrorKind::Attribute => Some(ErrorClass::Attribute),
            ErrorKind::Key => Some(ErrorClass::Key),
            ErrorKind::Index => Some(ErrorClass::Index),
            ErrorKind::ZeroDivision => Some(ErrorClass::ZeroDivision),
            ErrorKind::NumberTooBig => Some(ErrorClass::NumberTooBig),
            ErrorKind::Name => Some(ErrorClass::Name),
            ErrorKind::Error => Some(ErrorClass::Error),
            ErrorKind::Custom(_) => None,
        }
    }

    pub fn from_class(class: ErrorClass) -> Self {
        match class {
            ErrorClass::Syntax => ErrorKind::Syntax,
            ErrorClass::Type => ErrorKind::Type,
            ErrorClass::Attribute => ErrorKind::Attribute,
            ErrorClass::Key => ErrorKind::Key,
            ErrorClass::Index => ErrorKind::Index,
            ErrorClass::ZeroDivision => ErrorKind::ZeroDivision,
            ErrorClass::NumberTooBig => ErrorKind::NumberTooBig,
            ErrorClass::Name => ErrorKind::Name,
            ErrorClass::Error => ErrorKind::Error,
        }
    }

    /// Name under the active translation table
    pub fn name<'a>(&'a self, settings: &'a Settings) -> &'a str {
        match (self, self.class()) {
            (ErrorKind::Custom(name), _) => name,
            (_, Some(class)) => settings.error_name(class),
            (_, None) => "",
        }
    }

    /// Kind displayed as `name`: a built-in kind when the name matches
    /// its translated spelling, a custom kind otherwise
    pub fn from_name(name: &str, settings: &Settings) -> Self {
        settings
            .error_class(name)
            .map(ErrorKind::from_class)
            .unwrap_or_else(|| ErrorKind::Custom(name.to_string()))
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.class()) {
            (ErrorKind::Custom(name), _) => write!(f, "{}", name),
            (_, Some(class)) => write!(f, "{}", class.default_name()),
            (_, None) => Ok(()),
        }
    }
}

/// A raised Flow error
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct FlowError {
    pub kind: ErrorKind,
    pub message: String,
    /// Source location of the failing node or token
    pub span: Option<Span>,
    /// Rendered source context for syntax errors
    pub diagnostic: Option<Box<Diagnostic>>,
    /// The message value given to `raise`
    pub payload: Option<Value>,
}

impl FlowError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            span: None,
            diagnostic: None,
            payload: None,
        }
    }

    pub fn syntax(diagnostic: Diagnostic, span: Span) -> Self {
        Self {
            kind: ErrorKind::Syntax,
            message: diagnostic.message.clone(),
            span: Some(span),
            diagnostic: Some(Box::new(diagnostic)),
            payload: None,
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, message)
    }

    pub fn attribute(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Attribute, message)
    }

    pub fn key(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Key, message)
    }

    pub fn index(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Index, message)
    }

    pub fn zero_division() -> Self {
        Self::new(ErrorKind::ZeroDivision, "division by zero")
    }

    pub fn number_too_big(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NumberTooBig, message)
    }

    pub fn name_error(name: &str) -> Self {
        Self::new(ErrorKind::Name, format!("'{}' is not defined", name))
    }

    /// Attach a span unless one is already recorded
    pub fn with_span(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn is_syntax(&self) -> bool {
        self.kind == ErrorKind::Syntax
    }

    /// Human-readable report under the active translation table
    pub fn render(&self, settings: &Settings) -> String {
        match &self.diagnostic {
            Some(diagnostic) => diagnostic.to_human_string(),
            None => format!("{}: {}", self.kind.name(settings), self.message),
        }
    }
}

/// Non-local exit travelling up the evaluation chain
#[derive(Debug, Clone)]
pub enum Unwind {
    Return(Value),
    Raise(FlowError),
}

impl From<FlowError> for Unwind {
    fn from(error: FlowError) -> Self {
        Unwind::Raise(error)
    }
}
