//! In-flight query and execute commands

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use sqlpool_core::{Command, Result, SqlPoolError};
use tokio::task::JoinHandle;

/// A command submitted through `ConnectionPool::query` or
/// `ConnectionPool::execute`
///
/// The command runs in the background whether or not this handle is
/// polled. Awaiting it yields the command's result, or the reason no
/// connection could be acquired. If the command panicked, awaiting
/// re-raises that panic.
#[derive(Debug)]
pub struct PendingQuery<T> {
    command: Arc<Command>,
    handle: JoinHandle<Result<T>>,
}

impl<T> PendingQuery<T> {
    pub(crate) fn new(command: Arc<Command>, handle: JoinHandle<Result<T>>) -> Self {
        Self { command, handle }
    }

    /// The command being run
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Whether the command has completed
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<T> Future for PendingQuery<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match ready!(Pin::new(&mut self.handle).poll(cx)) {
            Ok(result) => Poll::Ready(result),
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => Poll::Ready(Err(SqlPoolError::Cancelled)),
        }
    }
}
