//! Query and execute command objects

use crate::Value;

/// Which connection operation a command runs through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Text query with client-side parameter substitution
    Query,
    /// Prepared statement with server-side parameters
    Execute,
}

/// A query or statement waiting to be run on a connection
///
/// # Example
///
/// ```
/// use sqlpool_core::{Command, CommandKind, Value};
///
/// let cmd = Command::query("SELECT * FROM users WHERE id = ?").bind(42);
/// assert_eq!(cmd.kind(), CommandKind::Query);
/// assert_eq!(cmd.values(), &[Value::Int64(42)]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    kind: CommandKind,
    sql: String,
    values: Vec<Value>,
}

impl Command {
    /// Build a text query command
    pub fn query(sql: impl Into<String>) -> Self {
        Self::new(CommandKind::Query, sql)
    }

    /// Build a prepared-statement command
    pub fn execute(sql: impl Into<String>) -> Self {
        Self::new(CommandKind::Execute, sql)
    }

    fn new(kind: CommandKind, sql: impl Into<String>) -> Self {
        Self {
            kind,
            sql: sql.into(),
            values: Vec::new(),
        }
    }

    /// Append one bound value
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.values.push(value.into());
        self
    }

    /// Replace all bound values
    pub fn with_values(mut self, values: Vec<Value>) -> Self {
        self.values = values;
        self
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}
