//! Syntax diagnostics
//!
//! Lexer and parser failures carry a [`Diagnostic`] with the offending
//! source line and a caret range, so hosts can show actionable feedback
//! without inspecting the AST.

use crate::span::{line_column, line_text, Span};
use serde::{Deserialize, Serialize};

/// A positioned syntax diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Error code (e.g., "FL1002")
    pub code: String,
    /// Main diagnostic message
    pub message: String,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based)
    pub column: usize,
    /// Length of error span
    pub length: usize,
    /// Source line string
    pub snippet: String,
    /// Short label for caret range
    pub label: String,
    /// Suggested fix (optional)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub help: Option<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic with code
    pub fn error_with_code(code: impl Into<String>, message: impl Into<String>, span: Span) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            line: 1,
            column: span.start + 1,
            length: span.len().max(1),
            snippet: String::new(),
            label: String::new(),
            help: None,
        }
    }

    /// Fill line, column and snippet from the source the span points into
    pub fn locate(mut self, chars: &[char], span: Span) -> Self {
        let (line, column) = line_column(chars, span.start);
        let snippet = line_text(chars, span.start);
        // Keep the caret range on the snippet line
        let remaining = snippet.chars().count().saturating_sub(column - 1).max(1);
        self.line = line;
        self.column = column;
        self.length = self.length.min(remaining);
        self.snippet = snippet;
        self
    }

    /// Set the label (caret description)
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Add a help message
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Format as human-readable string
    pub fn to_human_string(&self) -> String {
        let mut output = String::new();

        // Header: error[FL1002]: string literal must close
        output.push_str(&format!("error[{}]: {}\n", self.code, self.message));

        // Location: --> 3:9
        output.push_str(&format!("  --> {}:{}\n", self.line, self.column));

        if !self.snippet.is_empty() {
            output.push_str("   |\n");
            output.push_str(&format!("{:>2} | {}\n", self.line, self.snippet));

            let padding = " ".repeat(self.column.saturating_sub(1));
            let carets = "^".repeat(self.length);
            output.push_str(&format!("   | {}{}", padding, carets));
            if !self.label.is_empty() {
                output.push_str(&format!(" {}", self.label));
            }
            output.push('\n');
        }

        if let Some(help) = &self.help {
            output.push_str(&format!("   = help: {}\n", help));
        }

        output
    }

    /// Format as JSON string
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Error code registry
pub mod error_codes {
    pub const SYNTAX_ERROR: &str = "FL1000";
    pub const UNEXPECTED_CHARACTER: &str = "FL1001";
    pub const UNTERMINATED_STRING: &str = "FL1002";
    pub const INVALID_ESCAPE: &str = "FL1003";
    pub const UNCLOSED_DELIMITER: &str = "FL1004";
    pub const MALFORMED_NUMBER: &str = "FL1005";
    pub const MALFORMED_DOC: &str = "FL1006";
    pub const MALFORMED_DATETIME: &str = "FL1007";
    pub const INVALID_ASSIGNMENT_TARGET: &str = "FL1008";
    pub const INVALID_PARAMETER: &str = "FL1009";
}
