//! sqlpool Core - Core abstractions shared by the pool and database drivers
//!
//! This crate defines:
//!
//! - `Connection` - Trait for a single physical database connection
//! - `Command` - A query or statement waiting to run on a connection
//! - `SqlFormatter` - Value/identifier escaping and placeholder substitution
//! - Common types like `Value`, `Row`, `QueryResult`, and the error type

mod command;
mod connection;
mod error;
mod format;
mod types;

pub use command::*;
pub use connection::*;
pub use error::*;
pub use format::*;
pub use types::*;
