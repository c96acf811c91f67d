//! Translatable roles
//!
//! A role is a fixed meaning in the language (the `if` keyword, the `add`
//! special method, the `ZeroDivision` error kind). Settings map each role
//! to the spelling active for a run.

/// A keyword role. The TOML key is the snake_case variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeywordRole {
    True,
    False,
    Null,
    And,
    Or,
    Not,
    In,
    If,
    ElseIf,
    Else,
    Do,
    End,
    Function,
    Module,
    Return,
    Raise,
    Try,
    Otherwise,
}

impl KeywordRole {
    pub const ALL: [KeywordRole; 18] = [
        KeywordRole::True,
        KeywordRole::False,
        KeywordRole::Null,
        KeywordRole::And,
        KeywordRole::Or,
        KeywordRole::Not,
        KeywordRole::In,
        KeywordRole::If,
        KeywordRole::ElseIf,
        KeywordRole::Else,
        KeywordRole::Do,
        KeywordRole::End,
        KeywordRole::Function,
        KeywordRole::Module,
        KeywordRole::Return,
        KeywordRole::Raise,
        KeywordRole::Try,
        KeywordRole::Otherwise,
    ];

    /// English spelling
    pub fn default_spelling(self) -> &'static str {
        match self {
            KeywordRole::True => "true",
            KeywordRole::False => "false",
            KeywordRole::Null => "null",
            KeywordRole::And => "and",
            KeywordRole::Or => "or",
            KeywordRole::Not => "not",
            KeywordRole::In => "in",
            KeywordRole::If => "if",
            KeywordRole::ElseIf => "else if",
            KeywordRole::Else => "else",
            KeywordRole::Do => "do",
            KeywordRole::End => "end",
            KeywordRole::Function => "function",
            KeywordRole::Module => "module",
            KeywordRole::Return => "return",
            KeywordRole::Raise => "raise",
            KeywordRole::Try => "try",
            KeywordRole::Otherwise => "otherwise",
        }
    }

    /// Role for a `[keywords]` table key
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.key() == key)
    }

    /// Key used in the `[keywords]` table
    pub fn key(self) -> &'static str {
        match self {
            KeywordRole::True => "true",
            KeywordRole::False => "false",
            KeywordRole::Null => "null",
            KeywordRole::And => "and",
            KeywordRole::Or => "or",
            KeywordRole::Not => "not",
            KeywordRole::In => "in",
            KeywordRole::If => "if",
            KeywordRole::ElseIf => "else_if",
            KeywordRole::Else => "else",
            KeywordRole::Do => "do",
            KeywordRole::End => "end",
            KeywordRole::Function => "function",
            KeywordRole::Module => "module",
            KeywordRole::Return => "return",
            KeywordRole::Raise => "raise",
            KeywordRole::Try => "try",
            KeywordRole::Otherwise => "otherwise",
        }
    }
}

/// An overridable operator-protocol role.
///
/// A struct whose module defines a function under the active name for a
/// role has that function called in place of the default behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MethodRole {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Power,
    Positive,
    Negative,
    Contains,
    Equals,
    NotEquals,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Boolean,
    Not,
    And,
    Or,
    GetItem,
    SetItem,
    GetAttribute,
    SetAttribute,
    Length,
    Hash,
    Display,
    Transfer,
    Interchange,
}

impl MethodRole {
    pub const ALL: [MethodRole; 28] = [
        MethodRole::Add,
        MethodRole::Subtract,
        MethodRole::Multiply,
        MethodRole::Divide,
        MethodRole::Remainder,
        MethodRole::Power,
        MethodRole::Positive,
        MethodRole::Negative,
        MethodRole::Contains,
        MethodRole::Equals,
        MethodRole::NotEquals,
        MethodRole::Less,
        MethodRole::LessEqual,
        MethodRole::Greater,
        MethodRole::GreaterEqual,
        MethodRole::Boolean,
        MethodRole::Not,
        MethodRole::And,
        MethodRole::Or,
        MethodRole::GetItem,
        MethodRole::SetItem,
        MethodRole::GetAttribute,
        MethodRole::SetAttribute,
        MethodRole::Length,
        MethodRole::Hash,
        MethodRole::Display,
        MethodRole::Transfer,
        MethodRole::Interchange,
    ];

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.key() == key)
    }

    /// snake_case role name, also the `[special_methods]` key
    pub fn key(self) -> &'static str {
        match self {
            MethodRole::Add => "add",
            MethodRole::Subtract => "subtract",
            MethodRole::Multiply => "multiply",
            MethodRole::Divide => "divide",
            MethodRole::Remainder => "remainder",
            MethodRole::Power => "power",
            MethodRole::Positive => "positive",
            MethodRole::Negative => "negative",
            MethodRole::Contains => "contains",
            MethodRole::Equals => "equals",
            MethodRole::NotEquals => "not_equals",
            MethodRole::Less => "less",
            MethodRole::LessEqual => "less_equal",
            MethodRole::Greater => "greater",
            MethodRole::GreaterEqual => "greater_equal",
            MethodRole::Boolean => "boolean",
            MethodRole::Not => "not",
            MethodRole::And => "and",
            MethodRole::Or => "or",
            MethodRole::GetItem => "get_item",
            MethodRole::SetItem => "set_item",
            MethodRole::GetAttribute => "get_attribute",
            MethodRole::SetAttribute => "set_attribute",
            MethodRole::Length => "length",
            MethodRole::Hash => "hash",
            MethodRole::Display => "display",
            MethodRole::Transfer => "transfer",
            MethodRole::Interchange => "interchange",
        }
    }

    /// Default name, the role key wrapped in double underscores
    pub fn default_name(self) -> String {
        format!("__{}__", self.key())
    }
}

/// Built-in error kinds with a translatable display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorClass {
    Syntax,
    Type,
    Attribute,
    Key,
    Index,
    ZeroDivision,
    NumberTooBig,
    Name,
    Error,
}

impl ErrorClass {
    pub const ALL: [ErrorClass; 9] = [
        ErrorClass::Syntax,
        ErrorClass::Type,
        ErrorClass::Attribute,
        ErrorClass::Key,
        ErrorClass::Index,
        ErrorClass::ZeroDivision,
        ErrorClass::NumberTooBig,
        ErrorClass::Name,
        ErrorClass::Error,
    ];

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|class| class.key() == key)
    }

    /// `[errors]` table key
    pub fn key(self) -> &'static str {
        match self {
            ErrorClass::Syntax => "syntax",
            ErrorClass::Type => "type",
            ErrorClass::Attribute => "attribute",
            ErrorClass::Key => "key",
            ErrorClass::Index => "index",
            ErrorClass::ZeroDivision => "zero_division",
            ErrorClass::NumberTooBig => "number_too_big",
            ErrorClass::Name => "name",
            ErrorClass::Error => "error",
        }
    }

    pub fn default_name(self) -> &'static str {
        match self {
            ErrorClass::Syntax => "SyntaxError",
            ErrorClass::Type => "TypeError",
            ErrorClass::Attribute => "AttributeError",
            ErrorClass::Key => "KeyError",
            ErrorClass::Index => "IndexError",
            ErrorClass::ZeroDivision => "ZeroDivisionError",
            ErrorClass::NumberTooBig => "NumberTooBigError",
            ErrorClass::Name => "NameError",
            ErrorClass::Error => "Error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_default_names() {
        assert_eq!(MethodRole::Add.default_name(), "__add__");
        assert_eq!(MethodRole::GetAttribute.default_name(), "__get_attribute__");
    }

    #[test]
    fn test_keyword_defaults_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for role in KeywordRole::ALL {
            assert!(seen.insert(role.default_spelling()), "{:?}", role);
        }
    }
}
