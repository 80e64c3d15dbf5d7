//! Requester Core: environment resolution and concurrent request execution
//!
//! One command invocation flows through two polling loops that never block
//! the caller's task:
//!
//! ```text
//! buffer ─ extractor ─▶ env_runner (thread, 50ms ticks, timeout)
//!                           │
//!                           ▼
//!                        driver ─▶ pool (bounded workers)
//!                           │
//!                           ▼
//!                        gatherer (200ms ticks) ─▶ hooks, sorted report
//! ```

pub mod activity;
pub mod command;
pub mod context;
pub mod data_model;
pub mod driver;
pub mod env_runner;
pub mod error;
pub mod evaluator;
pub mod extractor;
pub mod gatherer;
pub mod hooks;
pub mod host;
pub mod pool;
pub mod settings;

pub use command::RequestCommand;
pub use context::CommandContext;
pub use data_model::{BatchReport, Environment, EnvironmentSource, ResponseRecord};
pub use driver::BatchDriver;
pub use error::RequesterError;
pub use hooks::{error_report, RequestHooks, StaticRequests};
pub use host::{BufferView, HostView, ACTIVITY_STATUS_KEY};
pub use pool::{PoolSnapshot, RequestSender, ResponsePool, SendError};
pub use settings::Settings;

/// Requester engine version
pub const REQUESTER_VERSION: &str = env!("CARGO_PKG_VERSION");
