//! Abstract Syntax Tree (AST) definitions
//!
//! Every construct is an expression node; statements such as `return` and
//! assignment are nodes that evaluate to a value too. Function and module
//! definitions sit behind `Rc` so runtime values can share their bodies
//! with the tree.

use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Top-level program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub body: Block,
}

/// Sequence of statements; evaluates to its last statement
pub type Block = Vec<Node>;

/// A positioned AST node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Whether this node may appear on the left of `=`
    pub fn is_assignable(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Variable(_) | NodeKind::Index { .. } | NodeKind::Attribute { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    // Literals
    Integer(i64),
    Float(f64),
    Str(String),
    /// Normalized ISO-8601 text of a datetime literal
    DateTime(String),
    Boolean(bool),
    Null,
    List(Vec<Node>),
    Dict(Vec<(Node, Node)>),

    Variable(String),

    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    /// Short-circuiting `and` / `or`
    Logical {
        op: LogicalOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Not(Box<Node>),

    // Postfix chain
    Attribute {
        object: Box<Node>,
        name: String,
    },
    Index {
        object: Box<Node>,
        index: Box<Node>,
    },
    Call {
        callee: Box<Node>,
        args: Vec<Argument>,
    },
    /// `Module{args}` struct construction
    Construct {
        callee: Box<Node>,
        args: Vec<Argument>,
    },

    Assign {
        target: Box<Node>,
        value: Box<Node>,
    },

    /// `if` / `else if` chain, kept flat
    If {
        branches: Vec<(Node, Block)>,
        otherwise: Option<Block>,
    },
    Try {
        body: Block,
        binding: Option<String>,
        handler: Block,
    },
    Function(Rc<FunctionDef>),
    Module(Rc<ModuleDef>),
    Return(Option<Box<Node>>),
    /// `raise message` or `raise "Type": message`
    Raise {
        kind: Option<Box<Node>>,
        message: Box<Node>,
    },
    /// Documentation attached to the value of `target`
    Doc {
        text: String,
        target: Box<Node>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Power,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOp {
    And,
    Or,
}

/// Call or construction argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    /// Set for `name = value` arguments
    pub name: Option<String>,
    pub value: Node,
}

/// Declared parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Evaluated once, when the definition is evaluated
    pub default: Option<Node>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: Option<String>,
    pub params: Vec<Parameter>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDef {
    pub name: Option<String>,
    /// `Some` when the module can construct structs
    pub params: Option<Vec<Parameter>>,
    pub body: Block,
    pub span: Span,
}
