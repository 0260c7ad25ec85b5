use crate::error::{Error, Result};

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, OnceLock};
use std::thread;

/// Source of process-wide unique thread identifiers. `0` is reserved for
/// "no thread".
static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

/// A stable, printable name for a logical thread.
///
/// Identifiers are unique across every manager in the process and are
/// never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(u64);

impl ThreadId {
    fn next() -> Self {
        Self(NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Rebuilds an identifier loaded from an atomic slot.
    pub(crate) fn from_raw(raw: u64) -> Option<Self> {
        (raw != 0).then_some(Self(raw))
    }

    /// Returns the raw numeric value of this identifier.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a logical thread's body ended.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Exit {
    /// The body has not returned yet.
    Running,

    /// The body returned the given status code.
    Returned(i32),

    /// The body unwound instead of returning.
    Panicked,
}

struct Inner<P> {
    id: ThreadId,

    /// Identifier of the manager that created this thread.
    manager: u64,

    payload: P,

    /// OS thread running the body, set once it starts.
    host: OnceLock<thread::ThreadId>,

    /// Exit status, written exactly once when the body ends.
    exit: Mutex<Exit>,

    /// Signalled when `exit` leaves [`Exit::Running`].
    done: Condvar,
}

/// Identity of a logical thread.
///
/// A `Thread` is a cheap, clonable handle. Two handles compare equal only
/// if they were cloned from the same spawn, regardless of their payloads.
/// The payload is whatever the creator attached to the thread (a sprite,
/// a script context, ...).
pub struct Thread<P = ()> {
    inner: Arc<Inner<P>>,
}

impl<P> Thread<P> {
    pub(crate) fn new(manager: u64, payload: P) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: ThreadId::next(),
                manager,
                payload,
                host: OnceLock::new(),
                exit: Mutex::new(Exit::Running),
                done: Condvar::new(),
            }),
        }
    }

    /// Returns the identifier of this thread.
    pub fn id(&self) -> ThreadId {
        self.inner.id
    }

    /// Returns the payload attached when the thread was created.
    pub fn payload(&self) -> &P {
        &self.inner.payload
    }

    pub(crate) fn manager(&self) -> u64 {
        self.inner.manager
    }

    /// Records the calling OS thread as the host of this thread's body.
    pub(crate) fn bind_host(&self) {
        let _ = self.inner.host.set(thread::current().id());
    }

    /// Returns `true` if called from the OS thread running the body.
    pub(crate) fn is_hosted_here(&self) -> bool {
        self.inner.host.get() == Some(&thread::current().id())
    }

    /// Returns `true` once the body has returned or panicked.
    pub fn is_finished(&self) -> bool {
        !matches!(*self.inner.exit.lock().unwrap(), Exit::Running)
    }

    /// Blocks the calling OS thread until the body has ended.
    ///
    /// Returns the status code produced by the body, or
    /// [`Error::Panicked`] if it unwound.
    ///
    /// Calling this from inside a logical thread of the same manager
    /// blocks while still holding the run lock: the joined thread can only
    /// finish if it no longer needs to run.
    pub fn join(&self) -> Result<i32> {
        let mut exit = self.inner.exit.lock().unwrap();

        while matches!(*exit, Exit::Running) {
            exit = self.inner.done.wait(exit).unwrap();
        }

        match *exit {
            Exit::Returned(status) => Ok(status),
            Exit::Panicked | Exit::Running => Err(Error::Panicked(self.inner.id)),
        }
    }

    /// Records how the body ended and wakes every joiner.
    pub(crate) fn finish(&self, exit: Exit) {
        *self.inner.exit.lock().unwrap() = exit;
        self.inner.done.notify_all();
    }
}

impl<P> Clone for Thread<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<P> PartialEq for Thread<P> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<P> Eq for Thread<P> {}

impl<P> Hash for Thread<P> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl<P> fmt::Debug for Thread<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thread")
            .field("id", &self.inner.id)
            .finish_non_exhaustive()
    }
}
