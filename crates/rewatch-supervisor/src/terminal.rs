//! Raw terminal mode, entered once at startup and restored on every exit path.
//!
//! Raw here means: no line buffering and no signal-generating control codes,
//! so ^C and friends reach the input interpreter as plain bytes. Output
//! post-processing is left alone so the child's `\n` still renders as a line
//! break. The saved attributes are the only terminal state the supervisor
//! owns; the kernel does not restore them when the process dies.

use std::io;
use std::os::fd::RawFd;

use rewatch_core::EchoMode;
use tracing::{debug, warn};

/// A device whose attributes can be read and written.
pub trait TermDevice: Send {
    type Attrs: Clone + Send;

    fn get_attrs(&self) -> io::Result<Self::Attrs>;
    fn set_attrs(&self, attrs: &Self::Attrs) -> io::Result<()>;

    /// Derives raw-mode attributes from `saved`.
    fn raw_from(&self, saved: &Self::Attrs, keep_echo: bool) -> Self::Attrs;
}

/// The controlling terminal on standard input, via termios.
#[derive(Debug, Clone, Copy)]
pub struct StdinTerm {
    fd: RawFd,
}

impl StdinTerm {
    #[must_use]
    pub fn new() -> Self {
        Self {
            fd: libc::STDIN_FILENO,
        }
    }
}

impl Default for StdinTerm {
    fn default() -> Self {
        Self::new()
    }
}

impl TermDevice for StdinTerm {
    type Attrs = libc::termios;

    fn get_attrs(&self) -> io::Result<libc::termios> {
        let mut attrs = std::mem::MaybeUninit::<libc::termios>::uninit();
        // SAFETY: tcgetattr fills the whole struct when it returns 0.
        let result = unsafe { libc::tcgetattr(self.fd, attrs.as_mut_ptr()) };
        if result != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(unsafe { attrs.assume_init() })
    }

    fn set_attrs(&self, attrs: &libc::termios) -> io::Result<()> {
        let result = unsafe { libc::tcsetattr(self.fd, libc::TCSANOW, attrs) };
        if result != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn raw_from(&self, saved: &libc::termios, keep_echo: bool) -> libc::termios {
        let mut raw = *saved;
        raw.c_lflag &= !(libc::ICANON | libc::ISIG);
        if !keep_echo {
            raw.c_lflag &= !libc::ECHO;
        }
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;
        raw
    }
}

/// Inactive until [`init`](Self::init), active until [`deinit`](Self::deinit).
pub struct TerminalMode<D: TermDevice = StdinTerm> {
    device: D,
    requested: bool,
    keep_echo: bool,
    saved: Option<D::Attrs>,
}

impl<D: TermDevice> TerminalMode<D> {
    pub fn new(device: D, requested: bool, echo: EchoMode) -> Self {
        Self {
            device,
            requested,
            keep_echo: echo == EchoMode::Preserve,
            saved: None,
        }
    }

    /// Enters raw mode if it was requested.
    ///
    /// Failures are logged and leave the terminal untouched; the caller
    /// checks [`is_active`](Self::is_active) to decide whether hotkeys work.
    pub fn init(&mut self) {
        if !self.requested || self.saved.is_some() {
            return;
        }

        let saved = match self.device.get_attrs() {
            Ok(attrs) => attrs,
            Err(e) => {
                warn!(error = %e, "unable to read terminal attributes, continuing without raw mode");
                return;
            }
        };

        let raw = self.device.raw_from(&saved, self.keep_echo);
        if let Err(e) = self.device.set_attrs(&raw) {
            warn!(error = %e, "unable to enter raw mode, continuing without it");
            return;
        }

        debug!(echo = self.keep_echo, "terminal in raw mode");
        self.saved = Some(saved);
    }

    /// Restores the saved attributes. A no-op when not active.
    pub fn deinit(&mut self) {
        let Some(saved) = self.saved.take() else {
            return;
        };
        match self.device.set_attrs(&saved) {
            Ok(()) => debug!("terminal restored"),
            Err(e) => warn!(error = %e, "failed to restore terminal; run `reset` to recover"),
        }
    }

    pub fn is_active(&self) -> bool {
        self.saved.is_some()
    }
}

impl<D: TermDevice> Drop for TerminalMode<D> {
    fn drop(&mut self) {
        self.deinit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Attrs {
        canonical: bool,
        signals: bool,
        echo: bool,
        speed: u32,
    }

    const COOKED: Attrs = Attrs {
        canonical: true,
        signals: true,
        echo: true,
        speed: 38400,
    };

    #[derive(Clone)]
    struct FakeTerm {
        current: Arc<Mutex<Attrs>>,
        writes: Arc<Mutex<usize>>,
        broken: bool,
    }

    impl FakeTerm {
        fn new() -> Self {
            Self {
                current: Arc::new(Mutex::new(COOKED)),
                writes: Arc::new(Mutex::new(0)),
                broken: false,
            }
        }

        fn current(&self) -> Attrs {
            self.current.lock().unwrap().clone()
        }

        fn writes(&self) -> usize {
            *self.writes.lock().unwrap()
        }
    }

    impl TermDevice for FakeTerm {
        type Attrs = Attrs;

        fn get_attrs(&self) -> io::Result<Attrs> {
            if self.broken {
                return Err(io::Error::from_raw_os_error(libc::ENOTTY));
            }
            Ok(self.current())
        }

        fn set_attrs(&self, attrs: &Attrs) -> io::Result<()> {
            *self.current.lock().unwrap() = attrs.clone();
            *self.writes.lock().unwrap() += 1;
            Ok(())
        }

        fn raw_from(&self, saved: &Attrs, keep_echo: bool) -> Attrs {
            Attrs {
                canonical: false,
                signals: false,
                echo: keep_echo && saved.echo,
                speed: saved.speed,
            }
        }
    }

    #[test]
    fn test_not_requested_is_noop() {
        let term = FakeTerm::new();
        let mut mode = TerminalMode::new(term.clone(), false, EchoMode::Manual);
        mode.init();
        assert!(!mode.is_active());
        mode.deinit();
        assert_eq!(term.writes(), 0);
        assert_eq!(term.current(), COOKED);
    }

    #[test]
    fn test_init_enters_raw_without_echo() {
        let term = FakeTerm::new();
        let mut mode = TerminalMode::new(term.clone(), true, EchoMode::Manual);
        mode.init();
        assert!(mode.is_active());
        let raw = term.current();
        assert!(!raw.canonical && !raw.signals && !raw.echo);
    }

    #[test]
    fn test_preserve_keeps_echo() {
        let term = FakeTerm::new();
        let mut mode = TerminalMode::new(term.clone(), true, EchoMode::Preserve);
        mode.init();
        assert!(term.current().echo);
    }

    #[test]
    fn test_round_trip_restores_exact_attributes() {
        let term = FakeTerm::new();
        let mut mode = TerminalMode::new(term.clone(), true, EchoMode::Off);
        mode.init();
        assert_ne!(term.current(), COOKED);
        mode.deinit();
        assert_eq!(term.current(), COOKED);
        assert!(!mode.is_active());
    }

    #[test]
    fn test_deinit_twice_is_idempotent() {
        let term = FakeTerm::new();
        let mut mode = TerminalMode::new(term.clone(), true, EchoMode::Manual);
        mode.init();
        mode.deinit();
        let writes = term.writes();
        mode.deinit();
        drop(mode);
        assert_eq!(term.writes(), writes);
        assert_eq!(term.current(), COOKED);
    }

    #[test]
    fn test_init_failure_continues_inactive() {
        let mut term = FakeTerm::new();
        term.broken = true;
        let mut mode = TerminalMode::new(term.clone(), true, EchoMode::Manual);
        mode.init();
        assert!(!mode.is_active());
        mode.deinit();
        assert_eq!(term.writes(), 0);
    }

    #[test]
    fn test_drop_restores() {
        let term = FakeTerm::new();
        {
            let mut mode = TerminalMode::new(term.clone(), true, EchoMode::Manual);
            mode.init();
        }
        assert_eq!(term.current(), COOKED);
    }
}
