//! Errors raised while parsing or executing environment sources.
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EnvLangError {
    #[error("invalid syntax at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("malformed syntax tree: expected {0}")]
    Malformed(&'static str),

    #[error("line {line}: name '{name}' is not defined")]
    Undefined { name: String, line: usize },

    #[error("line {line}: unsupported operand types for +: '{left}' and '{right}'")]
    Operands {
        left: &'static str,
        right: &'static str,
        line: usize,
    },

    #[error("line {line}: {message}")]
    Subscript { message: String, line: usize },

    #[error("line {line}: {message}")]
    Call { message: String, line: usize },

    #[error("line {line}: dict keys must be strings, got '{found}'")]
    DictKey { found: &'static str, line: usize },

    #[error("line {line}: invalid number literal '{literal}'")]
    Number { literal: String, line: usize },
}
