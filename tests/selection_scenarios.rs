//! End-to-end selection scenarios, driven through in-memory streams and a
//! recording raw-mode backend so every tier runs without a real terminal.

use std::collections::VecDeque;
use std::io::{self, Read};

use shunt::select::{
    ESC, RawModeBackend, SelectError, SelectItem, Selector, TerminalCapabilities,
};

// ============================================================================
// Helpers
// ============================================================================

/// Raw-mode backend that records transitions instead of touching a terminal.
#[derive(Debug, Default)]
struct RecordingBackend {
    enters: usize,
    leaves: usize,
    fail_enter: bool,
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

/// Yields one pre-arranged chunk per read, like a terminal delivering one
/// keypress at a time.
struct ChunkedInput {
    chunks: VecDeque<Vec<u8>>,
    reads: usize,
}

impl ChunkedInput {
    fn new(chunks: &[&[u8]]) -> Self {
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

fn fully_capable() -> TerminalCapabilities {
    TerminalCapabilities {
        is_interactive: true,
        supports_raw_mode: true,
        supports_escape_sequences: true,
        supports_cursor_control: true,
        width: 80,
        height: 24,
    }
}

fn environments() -> Vec<SelectItem<&'static str>> {
    vec![
        SelectItem::new("prod", "prod"),
        SelectItem::new("staging", "staging"),
        SelectItem::new("dev", "dev"),
    ]
}

const DOWN: &[u8] = &[ESC, b'[', b'B'];
const UP: &[u8] = &[ESC, b'[', b'A'];
const ENTER: &[u8] = &[b'\r'];
const ESCAPE: &[u8] = &[ESC];

// ============================================================================
// Headless tier
// ============================================================================

#[test]
fn headless_selection_is_deterministic_and_reads_nothing() {
    let mut input = ChunkedInput::new(&[DOWN, ENTER]);
    let mut output = Vec::new();
    let selector = Selector::new(
        &mut input,
        &mut output,
        RecordingBackend::default(),
        fully_capable(),
        true,
    );

    let item = selector.select(environments()).unwrap();
    assert_eq!(item.value, "prod");
    assert_eq!(input.reads, 0);
    assert!(output.is_empty());
}

#[test]
fn headless_empty_list_is_still_no_items() {
    let selector = Selector::new(
        ChunkedInput::new(&[]),
        Vec::new(),
        RecordingBackend::default(),
        fully_capable(),
        true,
    );
    let result = selector.select(Vec::<SelectItem<&str>>::new());
    assert!(matches!(result, Err(SelectError::NoItems)));
}

// ============================================================================
// Scenario A: navigate and confirm in the full tier
// ============================================================================

#[test]
fn full_tier_down_down_up_enter_selects_staging() {
    let mut backend = RecordingBackend::default();
    let selector = Selector::new(
        ChunkedInput::new(&[DOWN, DOWN, UP, ENTER]),
        Vec::new(),
        &mut backend,
        fully_capable(),
        false,
    );

    let item = selector.select(environments()).unwrap();
    assert_eq!(item.value, "staging");
    assert_eq!(backend.enters, 1);
    assert_eq!(backend.leaves, 1);
}

// ============================================================================
// Scenario B: cancel restores the terminal mode
// ============================================================================

#[test]
fn full_tier_escape_cancels_and_restores_mode() {
    let mut backend = RecordingBackend::default();
    let selector = Selector::new(
        ChunkedInput::new(&[ESCAPE]),
        Vec::new(),
        &mut backend,
        fully_capable(),
        false,
    );

    let result = selector.select(environments());
    assert!(matches!(result, Err(SelectError::Cancelled)));
    // As many restores as acquisitions: the mode after the call matches the
    // mode before it.
    assert_eq!(backend.enters, 1);
    assert_eq!(backend.leaves, backend.enters);
}

// ============================================================================
// Scenario C: raw-mode refusal degrades to the numbered tier
// ============================================================================

fn refused_raw_selector(
    line: &[u8],
) -> Selector<ChunkedInput, Vec<u8>, RecordingBackend> {
    Selector::new(
        ChunkedInput::new(&[line]),
        Vec::new(),
        RecordingBackend {
            fail_enter: true,
            ..Default::default()
        },
        fully_capable(),
        false,
    )
}

#[test]
fn refused_raw_mode_falls_back_to_numbered_selection() {
    let item = refused_raw_selector(b"2\n").select(environments()).unwrap();
    assert_eq!(item.value, "staging");
}

#[test]
fn refused_raw_mode_numbered_rejects_out_of_range() {
    let result = refused_raw_selector(b"9\n").select(environments());
    assert!(matches!(
        result,
        Err(SelectError::OutOfRange { given: 9, max: 3 })
    ));
}

#[test]
fn refused_raw_mode_numbered_rejects_non_numeric() {
    let result = refused_raw_selector(b"abc\n").select(environments());
    match result {
        Err(SelectError::NotANumber(input)) => assert_eq!(input, "abc"),
        other => panic!("expected NotANumber, got {other:?}"),
    }
}

#[test]
fn refused_raw_mode_never_restores_what_it_never_acquired() {
    let mut backend = RecordingBackend {
        fail_enter: true,
        ..Default::default()
    };
    let selector = Selector::new(
        ChunkedInput::new(&[b"1\n".as_slice()]),
        Vec::new(),
        &mut backend,
        fully_capable(),
        false,
    );
    selector.select(environments()).unwrap();
    assert_eq!(backend.enters, 0);
    assert_eq!(backend.leaves, 0);
}

// ============================================================================
// Single-item shortcut
// ============================================================================

#[test]
fn single_item_returns_without_any_terminal_work() {
    let mut input = ChunkedInput::new(&[]);
    let mut backend = RecordingBackend::default();
    let selector = Selector::new(
        &mut input,
        Vec::new(),
        &mut backend,
        fully_capable(),
        false,
    );

    let item = selector
        .select(vec![SelectItem::new("only", "only")])
        .unwrap();
    assert_eq!(item.value, "only");
    assert_eq!(input.reads, 0);
    assert_eq!(backend.enters, 0);
}
