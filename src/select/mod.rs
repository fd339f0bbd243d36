//! # Interactive Selection
//!
//! List selection across four tiers of terminal capability:
//!
//! - **Headless** — automation or redirected output; the first item is
//!   taken deterministically so a CI job never hangs waiting for input.
//! - **Full interactive** — raw mode plus escape-sequence rendering; the
//!   list is redrawn in place with a `►` marker.
//! - **Basic interactive** — raw mode without escape sequences; plain-text
//!   reprints with a `*` marker.
//! - **Numbered** — no terminal manipulation at all; a numbered list and
//!   one line of buffered input.
//!
//! The controller is the only entry point the rest of the application uses.
//! Raw-mode acquisition failures and mid-loop read failures degrade to the
//! numbered tier instead of failing the selection; the raw-mode guard is
//! released on every path out of an interactive loop.

mod capability;
mod decoder;
mod guard;
mod headless;

pub use capability::{FALLBACK_HEIGHT, FALLBACK_WIDTH, TerminalCapabilities, probe};
pub use decoder::{CTRL_C, DecodeError, Direction, ESC, KeyEvent, decode};
pub use guard::{CrosstermRaw, RawModeBackend, RawModeGuard};
pub use headless::is_headless;

use std::fmt;
use std::io::{self, BufRead, BufReader, Read, Stdin, Stdout, Write};

use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use log::{debug, info, warn};
use unicode_width::UnicodeWidthStr;

const POINTER: &str = "►";
const PLAIN_MARKER: &str = "*";

/// One selectable entry: a label, an optional detail line, and the opaque
/// payload handed back to the caller. Read-only to this subsystem.
#[derive(Debug, Clone)]
pub struct SelectItem<T> {
    pub label: String,
    pub detail: Option<String>,
    pub value: T,
}

impl<T> SelectItem<T> {
    pub fn new(label: impl Into<String>, value: T) -> Self {
        Self {
            label: label.into(),
            detail: None,
            value,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[derive(Debug)]
pub enum SelectError {
    /// The user backed out. A normal outcome, not a failure.
    Cancelled,
    /// The caller passed an empty list.
    NoItems,
    Io(io::Error),
    /// Numbered tier: the input line was not an integer.
    NotANumber(String),
    /// Numbered tier: the integer was outside `[1, max]`.
    OutOfRange { given: usize, max: usize },
}

impl fmt::Display for SelectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectError::Cancelled => write!(f, "selection cancelled"),
            SelectError::NoItems => write!(f, "nothing to select from"),
            SelectError::Io(e) => write!(f, "selection I/O error: {e}"),
            SelectError::NotANumber(input) => write!(f, "'{input}' is not a number"),
            SelectError::OutOfRange { given, max } => {
                write!(f, "{given} is out of range (expected 1-{max})")
            }
        }
    }
}

impl std::error::Error for SelectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SelectError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SelectError {
    fn from(e: io::Error) -> Self {
        SelectError::Io(e)
    }
}

/// The closed set of selection strategies, ordered from no interaction to
/// full terminal control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Headless,
    FullInteractive,
    BasicInteractive,
    Numbered,
}

/// Pick the selection tier. Pure: no I/O, no side effects.
pub fn choose_tier(headless: bool, caps: &TerminalCapabilities) -> Tier {
    if headless {
        return Tier::Headless;
    }
    if !caps.is_interactive {
        return Tier::Numbered;
    }
    if caps.supports_raw_mode && caps.supports_escape_sequences && caps.supports_cursor_control {
        Tier::FullInteractive
    } else if caps.supports_raw_mode {
        Tier::BasicInteractive
    } else {
        Tier::Numbered
    }
}

/// How an interactive tier paints the list between keypresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenderStyle {
    /// Cursor-up and clear, then repaint in place (full tier).
    Redraw,
    /// Reprint the whole list below the previous one (basic tier).
    Append,
}

enum LoopOutcome<T> {
    Chosen(SelectItem<T>),
    Cancelled,
    /// Raw input became unusable; retry these items in the numbered tier.
    Degrade(Vec<SelectItem<T>>),
}

/// List selector over an input stream, an output stream, and a raw-mode
/// backend. Generic so tests can drive every tier with in-memory streams.
pub struct Selector<R, W, B> {
    input: R,
    output: W,
    backend: B,
    caps: TerminalCapabilities,
    headless: bool,
}

impl Selector<Stdin, Stdout, CrosstermRaw> {
    /// Selector over the real process streams, probing the terminal fresh.
    /// Headless sessions skip the probe entirely — the probe's raw-mode
    /// check must not touch a terminal that automation owns.
    pub fn from_env() -> Self {
        let headless = is_headless();
        let caps = if headless {
            TerminalCapabilities::detached()
        } else {
            probe()
        };
        Self::new(io::stdin(), io::stdout(), CrosstermRaw, caps, headless)
    }
}

impl<R: Read, W: Write, B: RawModeBackend> Selector<R, W, B> {
    pub fn new(
        input: R,
        output: W,
        backend: B,
        caps: TerminalCapabilities,
        headless: bool,
    ) -> Self {
        Self {
            input,
            output,
            backend,
            caps,
            headless,
        }
    }

    /// Resolve one choice from `items`.
    ///
    /// Zero items is [`SelectError::NoItems`]; a single item is returned
    /// immediately with no terminal manipulation and no input read.
    pub fn select<T>(mut self, mut items: Vec<SelectItem<T>>) -> Result<SelectItem<T>, SelectError> {
        if items.is_empty() {
            return Err(SelectError::NoItems);
        }
        if items.len() == 1 {
            return Ok(items.remove(0));
        }

        let tier = choose_tier(self.headless, &self.caps);
        debug!("selection tier: {tier:?}");
        match tier {
            Tier::Headless => {
                // Already screened above; re-checked so this arm can never panic.
                if items.is_empty() {
                    return Err(SelectError::NoItems);
                }
                info!("headless session, taking the first of {} entries", items.len());
                Ok(items.remove(0))
            }
            Tier::FullInteractive => self.interactive(items, RenderStyle::Redraw),
            Tier::BasicInteractive => self.interactive(items, RenderStyle::Append),
            Tier::Numbered => self.numbered(items),
        }
    }

    fn interactive<T>(
        &mut self,
        items: Vec<SelectItem<T>>,
        style: RenderStyle,
    ) -> Result<SelectItem<T>, SelectError> {
        match self.raw_loop(items, style)? {
            LoopOutcome::Chosen(item) => Ok(item),
            LoopOutcome::Cancelled => Err(SelectError::Cancelled),
            LoopOutcome::Degrade(items) => self.numbered(items),
        }
    }

    /// Render/read/decode/act loop shared by both interactive tiers.
    ///
    /// Navigation wraps around. Unrecognized sequences are skipped; a read
    /// failure or closed stream degrades to the numbered tier. The guard is
    /// released before every return, and its `Drop` covers the `?` paths.
    fn raw_loop<T>(
        &mut self,
        mut items: Vec<SelectItem<T>>,
        style: RenderStyle,
    ) -> Result<LoopOutcome<T>, SelectError> {
        let mut guard = match RawModeGuard::acquire(&mut self.backend) {
            Ok(guard) => guard,
            Err(e) => {
                warn!("raw mode unavailable ({e}), dropping to numbered selection");
                return Ok(LoopOutcome::Degrade(items));
            }
        };

        let mut index = 0usize;
        let mut painted = false;
        loop {
            match style {
                RenderStyle::Redraw => {
                    render_redraw(&mut self.output, &items, index, painted)?;
                }
                RenderStyle::Append => render_append(&mut self.output, &items, index)?,
            }
            painted = true;

            let mut buf = [0u8; 16];
            let n = match self.input.read(&mut buf) {
                Ok(0) => {
                    warn!("input stream closed mid-selection, dropping to numbered selection");
                    guard.release();
                    return Ok(LoopOutcome::Degrade(items));
                }
                Ok(n) => n,
                Err(e) => {
                    warn!("read failed mid-selection ({e}), dropping to numbered selection");
                    guard.release();
                    return Ok(LoopOutcome::Degrade(items));
                }
            };

            match decode(&buf[..n]) {
                Ok(KeyEvent::Navigate(Direction::Up)) => {
                    index = (index + items.len() - 1) % items.len();
                }
                Ok(KeyEvent::Navigate(Direction::Down)) => {
                    index = (index + 1) % items.len();
                }
                // Left/Right are decoded but a single-column list has nowhere to go.
                Ok(KeyEvent::Navigate(_)) | Ok(KeyEvent::Char(_)) => {}
                Ok(KeyEvent::Confirm) => {
                    guard.release();
                    finish_render(&mut self.output)?;
                    return Ok(LoopOutcome::Chosen(items.remove(index)));
                }
                Ok(KeyEvent::Cancel) => {
                    guard.release();
                    finish_render(&mut self.output)?;
                    return Ok(LoopOutcome::Cancelled);
                }
                // Fragmented or unknown sequence: skip it and read again.
                Err(e) => debug!("ignoring undecodable input: {e}"),
            }
        }
    }

    /// Numbered tier: print a 1-based list, read one buffered line, validate.
    /// Invalid input is surfaced to the caller, not re-prompted here.
    fn numbered<T>(&mut self, mut items: Vec<SelectItem<T>>) -> Result<SelectItem<T>, SelectError> {
        for (i, item) in items.iter().enumerate() {
            match &item.detail {
                Some(detail) => writeln!(self.output, "{}. {} ({detail})", i + 1, item.label)?,
                None => writeln!(self.output, "{}. {}", i + 1, item.label)?,
            }
        }
        write!(self.output, "Enter number (1-{}): ", items.len())?;
        self.output.flush()?;

        let mut line = String::new();
        let n = BufReader::new(&mut self.input).read_line(&mut line)?;
        if n == 0 {
            return Err(SelectError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input stream closed before a choice was made",
            )));
        }

        let trimmed = line.trim();
        let choice: usize = trimmed
            .parse()
            .map_err(|_| SelectError::NotANumber(trimmed.to_string()))?;
        if choice < 1 || choice > items.len() {
            return Err(SelectError::OutOfRange {
                given: choice,
                max: items.len(),
            });
        }
        Ok(items.remove(choice - 1))
    }
}

/// One rendered row. Labels are padded to a common display width so detail
/// columns line up.
fn item_line<T>(item: &SelectItem<T>, marker: &str, label_width: usize) -> String {
    match &item.detail {
        Some(detail) => {
            let pad = label_width.saturating_sub(item.label.width());
            format!("{marker} {}{}  {detail}", item.label, " ".repeat(pad))
        }
        None => format!("{marker} {}", item.label),
    }
}

fn label_width<T>(items: &[SelectItem<T>]) -> usize {
    items.iter().map(|item| item.label.width()).max().unwrap_or(0)
}

/// Full tier: move back up over the previous frame, clear it, repaint.
fn render_redraw<W: Write, T>(
    out: &mut W,
    items: &[SelectItem<T>],
    selected: usize,
    repaint: bool,
) -> io::Result<()> {
    if repaint {
        queue!(
            out,
            MoveToColumn(0),
            MoveUp(items.len() as u16),
            Clear(ClearType::FromCursorDown)
        )?;
    }
    let width = label_width(items);
    for (i, item) in items.iter().enumerate() {
        let marker = if i == selected { POINTER } else { " " };
        // Raw mode needs explicit carriage returns.
        write!(out, "{}\r\n", item_line(item, marker, width))?;
    }
    out.flush()
}

/// Basic tier: no cursor movement, no clearing — reprint the list.
fn render_append<W: Write, T>(
    out: &mut W,
    items: &[SelectItem<T>],
    selected: usize,
) -> io::Result<()> {
    write!(out, "\r\n")?;
    let width = label_width(items);
    for (i, item) in items.iter().enumerate() {
        let marker = if i == selected { PLAIN_MARKER } else { " " };
        write!(out, "{}\r\n", item_line(item, marker, width))?;
    }
    out.flush()
}

/// Leave the cursor on a clean line before handing the terminal back.
fn finish_render<W: Write>(out: &mut W) -> io::Result<()> {
    write!(out, "\r\n")?;
    out.flush()
}
