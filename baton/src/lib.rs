//! # Baton
//!
//! **Baton** runs many script-like *logical threads* that appear to execute
//! one at a time, even though each of them lives on its own OS thread.
//!
//! It is meant as the scheduling substrate of scripted, animated systems
//! (think independently "running" sprite scripts): a driving loop creates
//! one logical thread per script and resumes parked scripts once per frame.
//! Because a single logical thread holds the run lock at any instant, scripts
//! can share state without synchronizing it themselves.
//!
//! The API is small:
//!
//! - [`Coroutines::create`] / [`Coroutines::create_and_start`] spawn a
//!   logical thread that starts running as soon as it gets the run lock,
//! - [`Coroutines::yield_now`] parks the running thread and hands the lock
//!   over,
//! - [`Coroutines::resume`] wakes a parked thread (or latches the request if
//!   it has not parked yet),
//! - [`Coroutines::sched`] lets every other ready thread run once, then
//!   continues,
//! - [`Coroutines::current`] returns the running thread.
//!
//! There is no preemption, priority or timeout: a thread that never yields
//! keeps every other thread waiting.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use baton::{Coroutines, Thread};
//!
//! #[baton::main]
//! fn main(co: Coroutines, me: Thread) {
//!     let script = co.create((), {
//!         let co = co.clone();
//!         move |me| {
//!             println!("first frame");
//!             co.yield_now(&me);
//!             println!("second frame");
//!             0
//!         }
//!     });
//!
//!     // Let the script run up to its yield, then wake it and let it finish.
//!     co.sched(&me);
//!     co.resume(&script).unwrap();
//!     co.sched(&me);
//!
//!     assert!(script.is_finished());
//! }
//! ```
//!
//! ## Logging
//!
//! Scheduling transitions are reported through the [`log`] facade at the
//! `trace` level. Install any logger to see them.

mod coroutine;
mod error;
mod sync;

pub use coroutine::{Coroutines, CoroutinesBuilder, Thread, ThreadId};
pub use error::{Error, Result};

pub use baton_macros::*;
