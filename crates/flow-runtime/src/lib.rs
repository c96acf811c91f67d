//! Flow Runtime - Translatable scripting language
//!
//! This library provides the complete Flow language runtime including:
//! - Lexical analysis and parsing under a replaceable keyword table
//! - A reference-counted value model with operator overloading
//! - Tree-walking evaluation with trampolined tail calls
//! - Builtin-module registration and translation
//! - Standard modules

/// Flow runtime version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Public API modules
pub mod ast;
pub mod containers;
pub mod context;
pub mod diagnostic;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod span;
pub(crate) mod stack;
pub mod stdlib;
pub mod token;
pub mod value;

// Re-export commonly used types
pub use context::{
    BuiltinModule, Context, ModuleTranslation, Operation, OperationTranslation, ParamSpec,
};
pub use diagnostic::Diagnostic;
pub use flow_config::{KeywordRole, MethodRole, Settings, SettingsLoader};
pub use interpreter::Interpreter;
pub use lexer::Lexer;
pub use parser::Parser;
pub use runtime::{evaluate, Flow};
pub use span::Span;
pub use token::{Token, TokenKind};
pub use value::{
    Arguments, Data, ErrorKind, FlowError, Heap, Interchange, Invoke, Value, ValueKind,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoke() {
        assert_eq!(VERSION, "0.1.0");
    }
}
