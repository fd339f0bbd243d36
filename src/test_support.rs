//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::VecDeque;
use std::io::{self, Read};

use crate::select::{RawModeBackend, TerminalCapabilities};

/// Raw-mode backend that records transitions instead of touching a terminal.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub enters: usize,
    pub leaves: usize,
    pub fail_enter: bool,
}

impl RawModeBackend for RecordingBackend {
    fn enter_raw(&mut self) -> io::Result<()> {
        if self.fail_enter {
            return Err(io::Error::other("raw mode refused"));
        }
        self.enters += 1;
        Ok(())
    }

    fn leave_raw(&mut self) -> io::Result<()> {
        self.leaves += 1;
        Ok(())
    }
}

/// Reader that yields one pre-arranged chunk per `read()` call, the way a
/// terminal delivers one keypress at a time. Returns 0 (closed stream)
/// once the chunks run out.
pub struct ChunkedInput {
    chunks: VecDeque<Vec<u8>>,
    pub reads: usize,
}

impl ChunkedInput {
    pub fn new(chunks: &[&[u8]]) -> Self {
        Self {
            chunks: chunks.iter().map(|chunk| chunk.to_vec()).collect(),
            reads: 0,
        }
    }
}

impl Read for ChunkedInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads += 1;
        match self.chunks.pop_front() {
            Some(chunk) => {
                buf[..chunk.len()].copy_from_slice(&chunk);
                Ok(chunk.len())
            }
            None => Ok(0),
        }
    }
}

/// Capabilities with everything switched on, 80×24.
pub fn interactive_caps() -> TerminalCapabilities {
    caps(true, true, true)
}

pub fn caps(is_interactive: bool, raw: bool, escapes: bool) -> TerminalCapabilities {
    TerminalCapabilities {
        is_interactive,
        supports_raw_mode: raw,
        supports_escape_sequences: escapes,
        supports_cursor_control: escapes,
        width: 80,
        height: 24,
    }
}
