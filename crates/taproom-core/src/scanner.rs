//! # Scanner Input
//!
//! A keyboard-wedge scanner types the code followed by Enter, much faster
//! than a person can. This module turns such a keystroke stream into codes
//! without any window-level key listener, so it can be driven from tests.
//!
//! ```text
//! KeyEvent stream ──► KeystrokeDecoder ──► code ──► ScanDebouncer ──► accepted code
//!   '6' '0' '0' '1' ⏎     (burst, Enter)              (same code within
//!                                                       the window dropped)
//! ```
//!
//! Everything takes explicit `Instant`s; nothing reads the clock.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use ts_rs::TS;

/// Default gap between scanner keystrokes before the burst is abandoned.
pub const DEFAULT_BURST_GAP: Duration = Duration::from_millis(50);

/// Default window in which a repeated code is ignored.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Codes shorter than this are treated as stray typing.
pub const DEFAULT_MIN_CODE_LEN: usize = 3;

/// One key press from the input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    /// A printable character.
    Char(char),
    Enter,
    /// Any other key (modifiers, arrows, ...). Ends the burst.
    Other,
}

/// Something that yields decoded codes: a keystroke decoder, a camera
/// decoder, a test fixture.
pub trait CodeSource {
    /// The next decoded code, or `None` when the source is exhausted.
    fn next_code(&mut self) -> Option<String>;
}

impl CodeSource for std::vec::IntoIter<String> {
    fn next_code(&mut self) -> Option<String> {
        self.next()
    }
}

// =============================================================================
// Keystroke Decoder
// =============================================================================

/// Assembles printable bursts terminated by Enter into codes.
#[derive(Debug, Clone)]
pub struct KeystrokeDecoder {
    buffer: String,
    last_key: Option<Instant>,
    burst_gap: Duration,
    min_code_len: usize,
}

impl Default for KeystrokeDecoder {
    fn default() -> Self {
        KeystrokeDecoder::new(DEFAULT_BURST_GAP, DEFAULT_MIN_CODE_LEN)
    }
}

impl KeystrokeDecoder {
    pub fn new(burst_gap: Duration, min_code_len: usize) -> Self {
        KeystrokeDecoder {
            buffer: String::new(),
            last_key: None,
            burst_gap,
            min_code_len,
        }
    }

    /// Feeds one key press received at `at`.
    ///
    /// Returns the code when Enter closes a burst of at least
    /// `min_code_len` characters. A gap longer than `burst_gap` since the
    /// previous key drops whatever was buffered (a human typed it).
    pub fn feed(&mut self, event: KeyEvent, at: Instant) -> Option<String> {
        if let Some(last) = self.last_key {
            if at.saturating_duration_since(last) > self.burst_gap {
                self.buffer.clear();
            }
        }
        self.last_key = Some(at);

        match event {
            KeyEvent::Char(c) if !c.is_control() => {
                self.buffer.push(c);
                None
            }
            KeyEvent::Enter => {
                let code = std::mem::take(&mut self.buffer);
                let code = code.trim();
                (code.chars().count() >= self.min_code_len).then(|| code.to_string())
            }
            KeyEvent::Char(_) | KeyEvent::Other => {
                self.buffer.clear();
                None
            }
        }
    }

    /// Discards any partial burst.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.last_key = None;
    }
}

/// A [`CodeSource`] over a recorded or live stream of timestamped keys.
pub struct KeystrokeSource<I> {
    keys: I,
    decoder: KeystrokeDecoder,
}

impl<I> KeystrokeSource<I>
where
    I: Iterator<Item = (KeyEvent, Instant)>,
{
    pub fn new(keys: I, decoder: KeystrokeDecoder) -> Self {
        KeystrokeSource { keys, decoder }
    }
}

impl<I> CodeSource for KeystrokeSource<I>
where
    I: Iterator<Item = (KeyEvent, Instant)>,
{
    fn next_code(&mut self) -> Option<String> {
        for (event, at) in self.keys.by_ref() {
            if let Some(code) = self.decoder.feed(event, at) {
                return Some(code);
            }
        }
        None
    }
}

// =============================================================================
// Debounce
// =============================================================================

/// Drops a code identical to the last accepted one inside the window.
#[derive(Debug, Clone)]
pub struct ScanDebouncer {
    window: Duration,
    last: Option<(String, Instant)>,
}

impl Default for ScanDebouncer {
    fn default() -> Self {
        ScanDebouncer::new(DEFAULT_DEBOUNCE)
    }
}

impl ScanDebouncer {
    pub fn new(window: Duration) -> Self {
        ScanDebouncer { window, last: None }
    }

    /// Whether `code` seen at `now` should be processed.
    pub fn accept(&mut self, code: &str, now: Instant) -> bool {
        if let Some((last_code, last_at)) = &self.last {
            if last_code == code && now.saturating_duration_since(*last_at) < self.window {
                return false;
            }
        }
        self.last = Some((code.to_string(), now));
        true
    }
}

/// Feedback for the operator after a scan (beep, flash).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ScanSignal {
    /// The product was added to the cart.
    Accepted,
    /// Unknown code, out of stock, or stock ceiling reached.
    Rejected,
    /// A duplicate read inside the debounce window. Nothing happened.
    Ignored,
}

// =============================================================================
// Unit Tests
// =============================================================================
