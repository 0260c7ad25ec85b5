//! Synchronization primitives for Baton.
//!
//! The coroutine manager is built from two distinct locks:
//! - a regular `std::sync::Mutex`/`Condvar` pair guarding suspension state,
//! - the [`RunLock`], which decides which logical thread may execute.
//!
//! They are never merged: a thread releasing the run lock inside `yield`
//! still has to take the state mutex to record itself as parked.

mod run_lock;

pub(crate) use run_lock::{RunLock, Ticket};
