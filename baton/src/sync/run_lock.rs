use std::collections::BTreeSet;
use std::sync::{Condvar, Mutex};

/// A reserved turn on the [`RunLock`].
pub(crate) type Ticket = u64;

/// Execution-exclusivity lock shared by every logical thread of a manager.
///
/// The lock is a ticket lock: a turn is reserved first (at spawn or at
/// resume time) and later redeemed by the thread that will run. Turns are
/// served strictly in reservation order, which is what makes the order of
/// `resume` calls the order in which logical threads run.
///
/// Unlike `std::sync::Mutex`, acquisition and release are not tied to a
/// guard, so a logical thread can release the lock inside `yield` and take
/// it back later from the same OS thread.
pub(crate) struct RunLock {
    /// Ticket counters, protected by a regular blocking mutex.
    tickets: Mutex<Tickets>,

    /// Signalled every time the served ticket moves forward.
    condvar: Condvar,
}

struct Tickets {
    /// Next ticket handed out by [`RunLock::reserve`].
    next: Ticket,

    /// Ticket currently allowed to hold the lock.
    serving: Ticket,

    /// Reserved tickets that will never be redeemed.
    abandoned: BTreeSet<Ticket>,
}

impl Tickets {
    /// Passes the lock to the next ticket that is still going to show up.
    fn advance(&mut self) {
        self.serving += 1;

        while self.abandoned.remove(&self.serving) {
            self.serving += 1;
        }
    }
}

impl RunLock {
    /// Creates an unlocked run lock.
    pub(crate) fn new() -> Self {
        Self {
            tickets: Mutex::new(Tickets {
                next: 0,
                serving: 0,
                abandoned: BTreeSet::new(),
            }),
            condvar: Condvar::new(),
        }
    }

    /// Reserves the next turn on the lock.
    ///
    /// The returned ticket must eventually be passed to either
    /// [`acquire`](Self::acquire) or [`abandon`](Self::abandon), otherwise
    /// every later ticket waits forever.
    pub(crate) fn reserve(&self) -> Ticket {
        let mut tickets = self.tickets.lock().unwrap();
        let ticket = tickets.next;
        tickets.next += 1;

        ticket
    }

    /// Blocks the calling OS thread until `ticket` is served.
    pub(crate) fn acquire(&self, ticket: Ticket) {
        let mut tickets = self.tickets.lock().unwrap();

        while tickets.serving != ticket {
            tickets = self.condvar.wait(tickets).unwrap();
        }
    }

    /// Releases the lock held by the currently served ticket.
    pub(crate) fn release(&self) {
        self.tickets.lock().unwrap().advance();
        self.condvar.notify_all();
    }

    /// Gives up a reserved ticket without ever acquiring it.
    pub(crate) fn abandon(&self, ticket: Ticket) {
        let mut tickets = self.tickets.lock().unwrap();

        if tickets.serving == ticket {
            tickets.advance();
            drop(tickets);
            self.condvar.notify_all();
        } else {
            tickets.abandoned.insert(ticket);
        }
    }

    /// Returns `true` if no reserved ticket is waiting for its turn and
    /// nobody holds the lock.
    #[cfg(test)]
    pub(crate) fn is_idle(&self) -> bool {
        let tickets = self.tickets.lock().unwrap();
        tickets.serving == tickets.next
    }
}
