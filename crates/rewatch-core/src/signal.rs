//! The termination-class signals the supervisor intercepts and relays.

use std::fmt;

/// A termination-class OS signal.
///
/// These are the only signals the supervisor subscribes to. Each one is
/// treated as a kill event: broadcast to descendants, full teardown, then
/// re-raised against the supervisor itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KillSignal {
    Hangup,
    Interrupt,
    Quit,
    Terminate,
}

impl KillSignal {
    /// Every signal in the kill set, in subscription order.
    pub const ALL: [KillSignal; 4] = [
        KillSignal::Hangup,
        KillSignal::Interrupt,
        KillSignal::Quit,
        KillSignal::Terminate,
    ];

    /// Raw signal number for libc calls.
    #[must_use]
    pub fn as_raw(self) -> libc::c_int {
        match self {
            KillSignal::Hangup => libc::SIGHUP,
            KillSignal::Interrupt => libc::SIGINT,
            KillSignal::Quit => libc::SIGQUIT,
            KillSignal::Terminate => libc::SIGTERM,
        }
    }

    /// Maps a raw signal number back into the kill set.
    ///
    /// Returns `None` for signals outside the set (e.g. SIGCHLD, SIGWINCH).
    #[must_use]
    pub fn from_raw(raw: libc::c_int) -> Option<Self> {
        Self::ALL.into_iter().find(|sig| sig.as_raw() == raw)
    }

    /// Conventional upper-case name, e.g. `SIGTERM`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            KillSignal::Hangup => "SIGHUP",
            KillSignal::Interrupt => "SIGINT",
            KillSignal::Quit => "SIGQUIT",
            KillSignal::Terminate => "SIGTERM",
        }
    }
}

impl fmt::Display for KillSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
