use crate::sync::Ticket;

/// Scheduling state of a logical thread, as recorded in the manager's
/// suspended table.
///
/// A running thread with no pending resume has no entry at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Parking {
    /// Parked inside `yield`, waiting for a matching `resume`.
    Suspended,

    /// Woken by `resume` (or yielding on a latched resume) and waiting for
    /// its turn on the run lock. Further resumes are no-ops.
    ///
    /// Holds the run-lock turn reserved by the resumer.
    Resumed(Ticket),

    /// Resumed while still running; the next `yield` comes back on this
    /// turn instead of parking.
    ///
    /// This is the single latched slot: further resumes before that
    /// `yield` are no-ops.
    Latched(Ticket),
}
