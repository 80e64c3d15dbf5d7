use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A parsed environment program: assignments in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<Assignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub name: String,
    pub value: Expr,
    /// 1-based source line, used in evaluation errors
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// String, number, boolean or null literal
    Literal(Value),
    List(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    Name(String),
    Call { function: String, args: Vec<Expr> },
    Subscript { target: Box<Expr>, index: Box<Expr> },
    Add(Box<Expr>, Box<Expr>),
}
