//! # Raw-Mode Guard
//!
//! Scoped acquisition of the terminal's raw input mode. A leaked raw
//! terminal corrupts the user's shell session after the process exits, so
//! restoration must happen on every exit path: normal return, cancellation,
//! decode failure, or unwind. The guard restores on `Drop`, and `release()`
//! is idempotent so explicit early release composes with the drop path.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::terminal;
use log::warn;

/// Seam between the guard and the real terminal, so the selection loop can
/// run against in-memory fakes in tests.
pub trait RawModeBackend {
    fn enter_raw(&mut self) -> io::Result<()>;
    fn leave_raw(&mut self) -> io::Result<()>;
}

impl<T: RawModeBackend + ?Sized> RawModeBackend for &mut T {
    fn enter_raw(&mut self) -> io::Result<()> {
        (**self).enter_raw()
    }

    fn leave_raw(&mut self) -> io::Result<()> {
        (**self).leave_raw()
    }
}

/// Tags the process-wide raw-mode session. At most one guard may be
/// outstanding per process; a second acquisition is refused rather than
/// double-snapshotting the terminal state.
static RAW_SESSION_HELD: AtomicBool = AtomicBool::new(false);

/// Production backend over crossterm.
#[derive(Debug, Default)]
pub struct CrosstermRaw;

impl RawModeBackend for CrosstermRaw {
    fn enter_raw(&mut self) -> io::Result<()> {
        if RAW_SESSION_HELD
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(io::Error::other("a raw-mode session is already active"));
        }
        if let Err(e) = terminal::enable_raw_mode() {
            RAW_SESSION_HELD.store(false, Ordering::SeqCst);
            return Err(e);
        }
        Ok(())
    }

    fn leave_raw(&mut self) -> io::Result<()> {
        let result = terminal::disable_raw_mode();
        RAW_SESSION_HELD.store(false, Ordering::SeqCst);
        result
    }
}

/// Holds the terminal in raw mode until released or dropped.
pub struct RawModeGuard<'a> {
    backend: &'a mut dyn RawModeBackend,
    active: bool,
}

impl<'a> RawModeGuard<'a> {
    /// Enter raw mode. Failure means the caller must drop to a lower
    /// selection tier, not retry.
    pub fn acquire(backend: &'a mut dyn RawModeBackend) -> io::Result<Self> {
        backend.enter_raw()?;
        Ok(Self {
            backend,
            active: true,
        })
    }

    /// Restore the previous terminal mode. Safe to call more than once; a
    /// restore failure is a warning on stderr, never fatal — the selection
    /// itself may already have succeeded.
    pub fn release(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Err(e) = self.backend.leave_raw() {
            warn!("failed to restore terminal mode: {e}");
            eprintln!("shunt: warning: failed to restore terminal mode: {e}");
        }
    }
}

impl Drop for RawModeGuard<'_> {
    fn drop(&mut self) {
        self.release();
    }
}
