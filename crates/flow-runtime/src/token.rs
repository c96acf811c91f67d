//! Token types for lexical analysis

use crate::span::Span;
use flow_config::KeywordRole;

/// Token type produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// Source text, or the decoded contents for strings, docs and datetimes
    pub lexeme: String,
    /// Source location
    pub span: Span,
}

impl Token {
    /// Create a new token
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }
}

/// Classification of token types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literals
    /// Integer literal (42)
    Integer,
    /// Float literal, written with the active decimal separator
    Float,
    /// String literal
    String,
    /// Datetime literal (`~D[...]`); lexeme is the bracket contents
    DateTime,
    /// Documentation comment; lexeme is the raw comment interior
    Doc,
    Identifier,

    // Keywords
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

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    EqualEqual,
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,

    // Punctuation
    Dot,
    /// The active argument separator
    Separator,
    Colon,
    Semicolon,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,

    Eof,
}

impl TokenKind {
    /// Token kind for a keyword role
    pub fn from_keyword(role: KeywordRole) -> TokenKind {
        match role {
            KeywordRole::True => TokenKind::True,
            KeywordRole::False => TokenKind::False,
            KeywordRole::Null => TokenKind::Null,
            KeywordRole::And => TokenKind::And,
            KeywordRole::Or => TokenKind::Or,
            KeywordRole::Not => TokenKind::Not,
            KeywordRole::In => TokenKind::In,
            KeywordRole::If => TokenKind::If,
            KeywordRole::ElseIf => TokenKind::ElseIf,
            KeywordRole::Else => TokenKind::Else,
            KeywordRole::Do => TokenKind::Do,
            KeywordRole::End => TokenKind::End,
            KeywordRole::Function => TokenKind::Function,
            KeywordRole::Module => TokenKind::Module,
            KeywordRole::Return => TokenKind::Return,
            KeywordRole::Raise => TokenKind::Raise,
            KeywordRole::Try => TokenKind::Try,
            KeywordRole::Otherwise => TokenKind::Otherwise,
        }
    }

    /// Keyword role of this kind, if it is a keyword
    pub fn keyword_role(self) -> Option<KeywordRole> {
        KeywordRole::ALL
            .into_iter()
            .find(|role| TokenKind::from_keyword(*role) == self)
    }

    /// Human-readable description used in "expected ..." messages
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Integer | TokenKind::Float => "a number",
            TokenKind::String => "a string",
            TokenKind::DateTime => "a datetime",
            TokenKind::Doc => "a documentation comment",
            TokenKind::Identifier => "a name",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::Caret => "'^'",
            TokenKind::EqualEqual => "'=='",
            TokenKind::BangEqual => "'!='",
            TokenKind::Less => "'<'",
            TokenKind::LessEqual => "'<='",
            TokenKind::Greater => "'>'",
            TokenKind::GreaterEqual => "'>='",
            TokenKind::Equal => "'='",
            TokenKind::Dot => "'.'",
            TokenKind::Separator => "an argument separator",
            TokenKind::Colon => "':'",
            TokenKind::Semicolon => "';'",
            TokenKind::LeftParen => "'('",
            TokenKind::RightParen => "')'",
            TokenKind::LeftBracket => "'['",
            TokenKind::RightBracket => "']'",
            TokenKind::LeftBrace => "'{'",
            TokenKind::RightBrace => "'}'",
            TokenKind::Eof => "end of input",
            _ => "a keyword",
        }
    }
}
