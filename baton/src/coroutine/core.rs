use super::builder::Config;
use super::state::Parking;
use super::thread::{Exit, Thread, ThreadId};
use crate::error::{Error, Result};
use crate::sync::{RunLock, Ticket};

use log::{debug, trace, warn};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

/// Source of process-wide unique manager identifiers.
static NEXT_MANAGER_ID: AtomicU64 = AtomicU64::new(1);

/// State shared by a manager handle and every OS thread it spawned.
struct Shared<P> {
    /// Identifier stamped into every thread this manager creates.
    id: u64,

    /// Suspended table: parked threads and pending resumes.
    suspended: Mutex<HashMap<ThreadId, Parking>>,

    /// Broadcast whenever an entry of `suspended` is resumed.
    condvar: Condvar,

    /// Only the holder of this lock executes application code.
    run_lock: RunLock,

    /// Identity of the current (or last) run-lock holder, `0` if none.
    current_id: AtomicU64,

    /// Handle of the current (or last) run-lock holder.
    current: Mutex<Option<Thread<P>>>,

    config: Config,
}

impl<P> Shared<P> {
    /// Publishes `me` as the current thread. Must hold the run lock.
    fn publish(&self, me: &Thread<P>) {
        *self.current.lock().unwrap() = Some(me.clone());
        self.current_id.store(me.id().as_u64(), Ordering::Release);
    }

    /// Body of the OS thread hosting a logical thread.
    fn run<F>(&self, me: Thread<P>, ticket: Ticket, body: F)
    where
        F: FnOnce(Thread<P>) -> i32,
    {
        me.bind_host();
        self.run_lock.acquire(ticket);
        self.publish(&me);
        trace!("thread {} started", me.id());

        let exit = match panic::catch_unwind(AssertUnwindSafe(|| body(me.clone()))) {
            Ok(status) => Exit::Returned(status),
            Err(_) => {
                warn!("thread {} panicked", me.id());
                Exit::Panicked
            }
        };

        self.finish(&me, exit);
    }

    /// Retires a thread whose body ended and hands the run lock on.
    fn finish(&self, me: &Thread<P>, exit: Exit) {
        {
            let mut suspended = self.suspended.lock().unwrap();

            // A resume latched after the last yield will never be redeemed.
            if let Some(Parking::Latched(ticket)) = suspended.remove(&me.id()) {
                self.run_lock.abandon(ticket);
            }

            // Marked under the state mutex so `resume` observes it atomically.
            me.finish(exit);
        }

        trace!("thread {} finished ({:?})", me.id(), exit);
        self.run_lock.release();
    }
}

/// A coroutine manager.
///
/// `Coroutines` hosts logical threads on OS threads and guarantees that
/// exactly one of them executes application code at any instant. A thread
/// stops running only when its body returns or when it calls
/// [`yield_now`](Self::yield_now); it runs again once someone calls
/// [`resume`](Self::resume) on it.
///
/// The handle is cheap to clone; clones drive the same set of threads.
/// Bodies typically capture a clone to be able to yield.
///
/// # Examples
///
/// ```rust,ignore
/// let co = Coroutines::new();
///
/// let script = co.create((), {
///     let co = co.clone();
///     move |me| {
///         println!("frame 1");
///         co.yield_now(&me);
///         println!("frame 2");
///         0
///     }
/// });
///
/// co.resume(&script)?;
/// script.join()?;
/// ```
pub struct Coroutines<P = ()> {
    shared: Arc<Shared<P>>,
}

impl<P> Coroutines<P> {
    /// Creates a manager with default settings.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub(crate) fn with_config(config: Config) -> Self {
        let id = NEXT_MANAGER_ID.fetch_add(1, Ordering::Relaxed);
        debug!("coroutine manager {} created ({:?})", id, config);

        Self {
            shared: Arc::new(Shared {
                id,
                suspended: Mutex::new(HashMap::new()),
                condvar: Condvar::new(),
                run_lock: RunLock::new(),
                current_id: AtomicU64::new(0),
                current: Mutex::new(None),
                config,
            }),
        }
    }

    /// Returns the thread currently holding the run lock.
    ///
    /// Outside of any logical thread this is whichever thread held the
    /// lock last, or `None` if no thread ever ran.
    pub fn current(&self) -> Option<Thread<P>> {
        self.shared.current.lock().unwrap().clone()
    }

    /// Returns `true` if `thread` is the current thread.
    pub fn is_current(&self, thread: &Thread<P>) -> bool {
        self.shared.current_id.load(Ordering::Acquire) == thread.id().as_u64()
    }

    /// Returns `true` if `thread` is parked in `yield`, waiting for a resume.
    pub fn is_suspended(&self, thread: &Thread<P>) -> bool {
        matches!(
            self.shared.suspended.lock().unwrap().get(&thread.id()),
            Some(Parking::Suspended)
        )
    }

    /// Returns the number of threads parked in `yield`.
    pub fn suspended_count(&self) -> usize {
        self.shared
            .suspended
            .lock()
            .unwrap()
            .values()
            .filter(|parking| **parking == Parking::Suspended)
            .count()
    }

    /// Suspends the running thread `me` until it is resumed.
    ///
    /// The run lock is released so that another logical thread can run.
    /// When a matching [`resume`](Self::resume) arrives, `me` waits for
    /// its turn on the run lock and returns, running exclusively again.
    /// If a resume was latched while `me` was running, the call still
    /// hands the lock over but comes back on the latched turn.
    ///
    /// # Panics
    ///
    /// Panics with [`Error::NotRunning`] if `me` is not the current
    /// thread. This is a programming error; see
    /// [`try_yield`](Self::try_yield) for a non-panicking variant.
    pub fn yield_now(&self, me: &Thread<P>) {
        if let Err(err) = self.try_yield(me) {
            panic!("{err}");
        }
    }

    /// Like [`yield_now`](Self::yield_now), but reports misuse as an
    /// error instead of panicking. Nothing is changed when it fails.
    pub fn try_yield(&self, me: &Thread<P>) -> Result<()> {
        self.check_running(me)?;

        let shared = &self.shared;
        let mut suspended = shared.suspended.lock().unwrap();

        let ticket = if let Some(&Parking::Latched(ticket)) = suspended.get(&me.id()) {
            suspended.insert(me.id(), Parking::Resumed(ticket));
            shared.run_lock.release();
            trace!("thread {} yields on a latched resume", me.id());
            ticket
        } else {
            suspended.insert(me.id(), Parking::Suspended);
            shared.run_lock.release();
            trace!("thread {} parked", me.id());

            loop {
                if let Some(&Parking::Resumed(ticket)) = suspended.get(&me.id()) {
                    break ticket;
                }

                suspended = shared.condvar.wait(suspended).unwrap();
            }
        };

        drop(suspended);

        // The `Resumed` entry stays until the turn comes, so that resumes
        // arriving in between are no-ops. Nobody waits for the run lock
        // while holding the state mutex, so taking it here is safe.
        shared.run_lock.acquire(ticket);
        shared.suspended.lock().unwrap().remove(&me.id());
        shared.publish(me);
        trace!("thread {} running again", me.id());

        Ok(())
    }

    /// Wakes `target` if it is parked, or latches the request otherwise.
    ///
    /// Each resume reserves the target's next turn on the run lock, so
    /// threads run in the order they were resumed. The call never blocks:
    /// - a parked target is woken,
    /// - a running target keeps the request for its next `yield`,
    /// - an already resumed target is left untouched.
    ///
    /// # Errors
    ///
    /// - [`Error::Finished`] if the target's body already ended.
    /// - [`Error::ForeignThread`] if the target belongs to another manager.
    pub fn resume(&self, target: &Thread<P>) -> Result<()> {
        if target.manager() != self.shared.id {
            return Err(Error::ForeignThread(target.id()));
        }

        let shared = &self.shared;
        let mut suspended = shared.suspended.lock().unwrap();

        match suspended.get_mut(&target.id()) {
            Some(parking) if *parking == Parking::Suspended => {
                *parking = Parking::Resumed(shared.run_lock.reserve());
                shared.condvar.notify_all();
                trace!("thread {} woken", target.id());
            }
            Some(_) => {
                trace!("thread {} already resumed", target.id());
            }
            None if target.is_finished() => {
                return Err(Error::Finished(target.id()));
            }
            None => {
                let ticket = shared.run_lock.reserve();
                suspended.insert(target.id(), Parking::Latched(ticket));
                trace!("resume of thread {} latched", target.id());
            }
        }

        Ok(())
    }

    /// Lets every other ready thread run once, then continues `me`.
    ///
    /// Equivalent to resuming `me` and yielding: the resume is latched,
    /// so `me` comes back on its own without an external driver, after
    /// every thread that was resumed before it.
    ///
    /// # Panics
    ///
    /// Panics with [`Error::NotRunning`] if `me` is not the current thread.
    pub fn sched(&self, me: &Thread<P>) {
        if let Err(err) = self.try_sched(me) {
            panic!("{err}");
        }
    }

    /// Like [`sched`](Self::sched), but reports misuse as an error.
    pub fn try_sched(&self, me: &Thread<P>) -> Result<()> {
        self.check_running(me)?;
        self.resume(me)?;
        self.try_yield(me)
    }

    /// Fails unless `me` holds the run lock and the call comes from the OS
    /// thread hosting it.
    fn check_running(&self, me: &Thread<P>) -> Result<()> {
        let current = self.shared.current_id.load(Ordering::Acquire);

        if current != me.id().as_u64() || me.is_finished() || !me.is_hosted_here() {
            return Err(Error::NotRunning {
                thread: me.id(),
                current: ThreadId::from_raw(current),
            });
        }

        Ok(())
    }
}

impl<P: Send + Sync + 'static> Coroutines<P> {
    /// Creates a logical thread running `body` and starts it.
    ///
    /// The body runs on a new OS thread as soon as it gets the run lock,
    /// i.e. right away if no other logical thread is running, or at the
    /// next `yield` otherwise. The identity is returned immediately.
    ///
    /// # Panics
    ///
    /// Panics if the OS fails to create a thread; see
    /// [`try_create`](Self::try_create).
    pub fn create<F>(&self, payload: P, body: F) -> Thread<P>
    where
        F: FnOnce(Thread<P>) -> i32 + Send + 'static,
    {
        self.create_and_start(payload, body, None)
    }

    /// Like [`create`](Self::create), with a predecessor hint.
    ///
    /// When `predecessor` is given, the calling OS thread gives up its
    /// time slice right after spawning, so the new thread is more likely to
    /// start promptly. This neither blocks nor guarantees any ordering.
    ///
    /// # Panics
    ///
    /// Panics if the OS fails to create a thread.
    pub fn create_and_start<F>(
        &self,
        payload: P,
        body: F,
        predecessor: Option<&Thread<P>>,
    ) -> Thread<P>
    where
        F: FnOnce(Thread<P>) -> i32 + Send + 'static,
    {
        match self.try_create_and_start(payload, body, predecessor) {
            Ok(thread) => thread,
            Err(err) => panic!("{err}"),
        }
    }

    /// Like [`create`](Self::create), but returns an error if the OS
    /// thread cannot be spawned.
    pub fn try_create<F>(&self, payload: P, body: F) -> Result<Thread<P>>
    where
        F: FnOnce(Thread<P>) -> i32 + Send + 'static,
    {
        self.try_create_and_start(payload, body, None)
    }

    /// Like [`create_and_start`](Self::create_and_start), but returns an
    /// error if the OS thread cannot be spawned.
    pub fn try_create_and_start<F>(
        &self,
        payload: P,
        body: F,
        predecessor: Option<&Thread<P>>,
    ) -> Result<Thread<P>>
    where
        F: FnOnce(Thread<P>) -> i32 + Send + 'static,
    {
        let config = &self.shared.config;
        let new_thread = Thread::new(self.shared.id, payload);

        // Reserved by the creator so that threads start in creation order.
        let ticket = self.shared.run_lock.reserve();

        let mut builder =
            thread::Builder::new().name(format!("{}-{}", config.name, new_thread.id().as_u64()));

        if let Some(size) = config.stack_size {
            builder = builder.stack_size(size);
        }

        let shared = self.shared.clone();
        let me = new_thread.clone();

        if let Err(err) = builder.spawn(move || shared.run(me, ticket, body)) {
            self.shared.run_lock.abandon(ticket);
            return Err(err.into());
        }

        trace!("thread {} spawned", new_thread.id());

        if let Some(predecessor) = predecessor {
            trace!("thread {} steps aside for {}", predecessor.id(), new_thread.id());
            thread::yield_now();
        }

        Ok(new_thread)
    }
}

impl<P> Clone for Coroutines<P> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<P> Default for Coroutines<P> {
    /// Returns a manager with default settings.
    fn default() -> Self {
        Self::new()
    }
}
