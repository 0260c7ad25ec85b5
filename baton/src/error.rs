use crate::coroutine::ThreadId;

use std::io;

/// Errors reported by the coroutine manager.
///
/// Only [`Error::NotRunning`] describes programmer misuse; it is raised as a
/// panic by [`Coroutines::yield_now`](crate::Coroutines::yield_now) and
/// returned as a value by [`Coroutines::try_yield`](crate::Coroutines::try_yield).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A yield named a thread that is not running on the calling OS thread.
    #[error("cannot yield a non-running thread (thread {thread}, current {current:?})")]
    NotRunning {
        /// The identity passed to the yield call.
        thread: ThreadId,
        /// The identity holding the run lock, if any thread ever ran.
        current: Option<ThreadId>,
    },

    /// `resume` targeted a thread whose body already ended.
    #[error("thread {0} has already finished")]
    Finished(ThreadId),

    /// The identity was created by a different manager.
    #[error("thread {0} belongs to another coroutine manager")]
    ForeignThread(ThreadId),

    /// The thread's body panicked instead of returning a status.
    #[error("thread {0} panicked")]
    Panicked(ThreadId),

    /// The OS refused to start the thread hosting a logical thread.
    #[error("failed to spawn thread: {0}")]
    Spawn(#[from] io::Error),
}

/// A specialized [`Result`](std::result::Result) for coroutine operations.
pub type Result<T> = std::result::Result<T, Error>;
