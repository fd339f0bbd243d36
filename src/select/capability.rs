//! # Capability Probe
//!
//! Inspects the controlling terminal and reports what it can do. The probe
//! is recomputed on every call — terminal size and attachment can change
//! between runs — and never errors: fields degrade to safe defaults instead.

use std::env;
use std::io;

use crossterm::terminal;
use crossterm::tty::IsTty;
use log::{debug, warn};

pub const FALLBACK_WIDTH: u16 = 80;
pub const FALLBACK_HEIGHT: u16 = 24;

/// `TERM` values that cannot interpret cursor/clear escape sequences.
const DUMB_TERMS: [&str; 2] = ["dumb", "cons25"];

/// What the controlling terminal supports, computed fresh per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalCapabilities {
    /// Stdin is a real terminal, not a pipe or file.
    pub is_interactive: bool,
    /// The terminal can be switched out of line-buffered, echoing mode.
    pub supports_raw_mode: bool,
    /// The terminal is expected to understand cursor/clear escape sequences.
    pub supports_escape_sequences: bool,
    /// Cursor control is assumed bundled with escape-sequence support.
    pub supports_cursor_control: bool,
    pub width: u16,
    pub height: u16,
}

impl TerminalCapabilities {
    /// Capabilities for a stream set that is not driving a terminal.
    pub fn detached() -> Self {
        Self {
            is_interactive: false,
            supports_raw_mode: false,
            supports_escape_sequences: false,
            supports_cursor_control: false,
            width: FALLBACK_WIDTH,
            height: FALLBACK_HEIGHT,
        }
    }
}

/// Probe the controlling terminal.
///
/// Probing never leaves the terminal mode altered: the raw-mode check enters
/// and immediately leaves raw mode, and skips the toggle entirely when the
/// terminal is already raw.
pub fn probe() -> TerminalCapabilities {
    let is_interactive = io::stdin().is_tty();
    let supports_raw_mode = is_interactive && raw_mode_works();
    let supports_escape_sequences = escapes_supported(env::var("TERM").ok().as_deref());
    let (width, height) = terminal::size().unwrap_or((FALLBACK_WIDTH, FALLBACK_HEIGHT));

    let caps = TerminalCapabilities {
        is_interactive,
        supports_raw_mode,
        supports_escape_sequences,
        supports_cursor_control: supports_escape_sequences,
        width,
        height,
    };
    debug!("terminal capabilities: {caps:?}");
    caps
}

/// Confirm raw mode works by entering and unconditionally leaving it.
fn raw_mode_works() -> bool {
    if terminal::is_raw_mode_enabled().unwrap_or(false) {
        return true;
    }
    match terminal::enable_raw_mode() {
        Ok(()) => {
            if let Err(e) = terminal::disable_raw_mode() {
                warn!("failed to leave raw mode after probing: {e}");
            }
            true
        }
        Err(e) => {
            debug!("raw mode probe failed: {e}");
            false
        }
    }
}

fn escapes_supported(term: Option<&str>) -> bool {
    match term {
        None => false,
        Some(term) => {
            let term = term.trim();
            !term.is_empty() && !DUMB_TERMS.contains(&term)
        }
    }
}
