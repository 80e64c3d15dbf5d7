//! Requester environment language.
//!
//! Environment blocks (`###env ... ###env`) and env files are small programs
//! of `name = expression` assignments. This crate parses them with pest and
//! executes them into isolated [`Namespace`]s. Programs can only build
//! values, reference earlier names and call the builtins `env` and `str`.
pub mod ast;
pub mod error;
pub mod interpreter;
pub mod parser;

pub use ast::{Assignment, Expr, Program};
pub use error::EnvLangError;
pub use interpreter::{execute, to_display_string, type_name, Namespace};
pub use parser::parse_program;

/// Name bound to `__name__` in environment namespaces.
pub const ENV_MODULE_NAME: &str = "requester.env";
