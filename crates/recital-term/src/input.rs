// SPDX-License-Identifier: MIT
//
// Key decoding.
//
// A presenter drives a talk with a handful of keys: arrows, space, page
// up/down, a few letters, Escape and Ctrl-C. This decoder understands the
// legacy encodings every terminal sends for those (plain bytes, CSI and
// SS3 sequences, UTF-8) and drops everything else.
//
// Escape sequences can straddle two reads, so the decoder keeps a small
// pending buffer. A lone ESC stays pending until `flush` is called after
// a quiet period, at which point it becomes a real Escape keypress.

use bitflags::bitflags;

/// A decoded keypress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl Key {
    #[must_use]
    pub const fn plain(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
        }
    }

    #[must_use]
    pub const fn ctrl(ch: char) -> Self {
        Self {
            code: KeyCode::Char(ch),
            modifiers: Modifiers::CTRL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Char(char),
    Enter,
    Tab,
    BackTab,
    Backspace,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
}

bitflags! {
    /// Modifier keys, xterm bit order (`param = 1 + bits`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b001;
        const ALT   = 0b010;
        const CTRL  = 0b100;
    }
}

/// Incremental byte-to-key decoder.
#[derive(Debug, Default)]
pub struct KeyDecoder {
    pending: Vec<u8>,
}

/// Result of trying to decode one key from the front of a buffer.
enum Step {
    /// A key (or an ignored sequence, `None`) that consumed `n` bytes.
    Done(Option<Key>, usize),
    /// Need more bytes.
    Incomplete,
}

impl KeyDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether bytes are waiting for a continuation (e.g. a lone ESC).
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Feed bytes, get every key they complete.
    pub fn advance(&mut self, bytes: &[u8]) -> Vec<Key> {
        self.pending.extend_from_slice(bytes);
        let mut keys = Vec::new();
        let mut pos = 0;
        while pos < self.pending.len() {
            match decode(&self.pending[pos..]) {
                Step::Done(key, n) => {
                    keys.extend(key);
                    pos += n;
                }
                Step::Incomplete => break,
            }
        }
        self.pending.drain(..pos);
        keys
    }

    /// Give up waiting: a pending lone ESC becomes Escape, anything else
    /// is discarded.
    pub fn flush(&mut self) -> Vec<Key> {
        let keys = if self.pending.first() == Some(&0x1b) {
            vec![Key::plain(KeyCode::Escape)]
        } else {
            Vec::new()
        };
        self.pending.clear();
        keys
    }
}

fn decode(buf: &[u8]) -> Step {
    match buf[0] {
        0x1b => decode_escape(buf),
        b'\r' | b'\n' => Step::Done(Some(Key::plain(KeyCode::Enter)), 1),
        b'\t' => Step::Done(Some(Key::plain(KeyCode::Tab)), 1),
        0x7f | 0x08 => Step::Done(Some(Key::plain(KeyCode::Backspace)), 1),
        b @ 0x01..=0x1a => Step::Done(Some(Key::ctrl(char::from(b'a' + b - 1))), 1),
        b if b < 0x80 => Step::Done(Some(Key::plain(KeyCode::Char(char::from(b)))), 1),
        b => decode_utf8(buf, b),
    }
}

fn decode_utf8(buf: &[u8], lead: u8) -> Step {
    let len = match lead {
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        _ => return Step::Done(None, 1),
    };
    if buf.len() < len {
        return Step::Incomplete;
    }
    match std::str::from_utf8(&buf[..len]).ok().and_then(|s| s.chars().next()) {
        Some(ch) => Step::Done(Some(Key::plain(KeyCode::Char(ch))), len),
        None => Step::Done(None, 1),
    }
}

fn decode_escape(buf: &[u8]) -> Step {
    let Some(&second) = buf.get(1) else {
        return Step::Incomplete;
    };
    match second {
        b'[' => decode_csi(buf),
        b'O' => match buf.get(2) {
            None => Step::Incomplete,
            Some(&b) => Step::Done(final_key(b).map(Key::plain), 3),
        },
        0x1b => Step::Done(Some(Key::plain(KeyCode::Escape)), 1),
        b if (0x20..0x7f).contains(&b) => Step::Done(
            Some(Key {
                code: KeyCode::Char(char::from(b)),
                modifiers: Modifiers::ALT,
            }),
            2,
        ),
        _ => Step::Done(Some(Key::plain(KeyCode::Escape)), 1),
    }
}

/// `ESC [ params final`. Params are digits and `;`.
fn decode_csi(buf: &[u8]) -> Step {
    let body = &buf[2..];
    let Some(end) = body.iter().position(|b| (0x40..=0x7e).contains(b)) else {
        return Step::Incomplete;
    };
    let consumed = 2 + end + 1;
    let params: Vec<u16> = std::str::from_utf8(&body[..end])
        .unwrap_or("")
        .split(';')
        .map(|p| p.parse().unwrap_or(0))
        .collect();
    let modifiers = params
        .get(1)
        .and_then(|&m| u8::try_from(m.saturating_sub(1)).ok())
        .map_or(Modifiers::empty(), Modifiers::from_bits_truncate);

    let code = match body[end] {
        b'~' => match params.first().copied().unwrap_or(0) {
            1 | 7 => Some(KeyCode::Home),
            4 | 8 => Some(KeyCode::End),
            5 => Some(KeyCode::PageUp),
            6 => Some(KeyCode::PageDown),
            _ => None,
        },
        b'Z' => Some(KeyCode::BackTab),
        b => final_key(b),
    };
    Step::Done(code.map(|code| Key { code, modifiers }), consumed)
}

fn final_key(b: u8) -> Option<KeyCode> {
    match b {
        b'A' => Some(KeyCode::Up),
        b'B' => Some(KeyCode::Down),
        b'C' => Some(KeyCode::Right),
        b'D' => Some(KeyCode::Left),
        b'H' => Some(KeyCode::Home),
        b'F' => Some(KeyCode::End),
        _ => None,
    }
}
