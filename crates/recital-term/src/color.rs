// SPDX-License-Identifier: MIT
//
// Terminal colors and color-depth downgrading.
//
// Themes are authored in 24-bit RGB. Not every terminal a talk gets given
// on supports that, so the renderer downgrades to the 256-color palette,
// the 16 basic colors, or nothing at all depending on `ColorDepth`.
//
// Nearest-match is plain squared distance in RGB. Good enough for picking
// a palette slot for syntax colors; nobody is color-grading a slide deck.

use std::fmt;

// ─── CellColor ───────────────────────────────────────────────────────────────

/// Compact color as stored in a [`Cell`](crate::cell::Cell).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellColor {
    /// 24-bit color.
    Rgb(u8, u8, u8),
    /// Index into the 256-color palette.
    Ansi256(u8),
    /// Whatever the terminal's default is.
    #[default]
    Default,
}

impl CellColor {
    /// Parse `#rrggbb` (leading `#` optional).
    #[must_use]
    pub fn hex(s: &str) -> Option<Self> {
        let s = s.strip_prefix('#').unwrap_or(s);
        if s.len() != 6 || !s.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&s[0..2], 16).ok()?;
        let g = u8::from_str_radix(&s[2..4], 16).ok()?;
        let b = u8::from_str_radix(&s[4..6], 16).ok()?;
        Some(Self::Rgb(r, g, b))
    }

    /// RGB components, or `None` for the terminal default.
    #[must_use]
    pub fn to_rgb(self) -> Option<(u8, u8, u8)> {
        match self {
            Self::Rgb(r, g, b) => Some((r, g, b)),
            Self::Ansi256(idx) => Some(palette::ansi256_to_rgb(idx)),
            Self::Default => None,
        }
    }

    /// `#rrggbb`, or `None` for the terminal default.
    #[must_use]
    pub fn to_hex(self) -> Option<String> {
        self.to_rgb()
            .map(|(r, g, b)| format!("#{r:02x}{g:02x}{b:02x}"))
    }

    /// Fit this color into the given depth.
    #[must_use]
    pub fn downgrade(self, depth: ColorDepth) -> Self {
        match (depth, self) {
            (ColorDepth::TrueColor, c) | (_, c @ Self::Default) => c,
            (ColorDepth::Mono, _) => Self::Default,
            (ColorDepth::Ansi256, Self::Rgb(r, g, b)) => {
                Self::Ansi256(palette::nearest(r, g, b, 256))
            }
            (ColorDepth::Ansi256, c @ Self::Ansi256(_)) => c,
            (ColorDepth::Ansi16, Self::Ansi256(idx)) if idx < 16 => Self::Ansi256(idx),
            (ColorDepth::Ansi16, c) => match c.to_rgb() {
                Some((r, g, b)) => Self::Ansi256(palette::nearest(r, g, b, 16)),
                None => Self::Default,
            },
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_default(self) -> bool {
        matches!(self, Self::Default)
    }
}

impl fmt::Debug for CellColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rgb(r, g, b) => write!(f, "#{r:02x}{g:02x}{b:02x}"),
            Self::Ansi256(idx) => write!(f, "ansi({idx})"),
            Self::Default => write!(f, "default"),
        }
    }
}

// ─── ColorDepth ──────────────────────────────────────────────────────────────

/// How many colors the output target can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorDepth {
    #[default]
    TrueColor,
    Ansi256,
    Ansi16,
    /// No color at all; attributes only.
    Mono,
}

impl ColorDepth {
    /// Parse the names used in config files and on the command line.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "truecolor" | "24bit" | "rgb" => Some(Self::TrueColor),
            "ansi256" | "256" => Some(Self::Ansi256),
            "ansi16" | "16" | "ansi" => Some(Self::Ansi16),
            "mono" | "none" | "0" => Some(Self::Mono),
            _ => None,
        }
    }

    /// Guess from `COLORTERM` / `TERM`.
    #[must_use]
    pub fn detect() -> Self {
        let colorterm = std::env::var("COLORTERM").unwrap_or_default();
        if colorterm.contains("truecolor") || colorterm.contains("24bit") {
            return Self::TrueColor;
        }
        let term = std::env::var("TERM").unwrap_or_default();
        if term == "dumb" {
            Self::Mono
        } else if term.contains("256color") {
            Self::Ansi256
        } else {
            Self::Ansi16
        }
    }
}

// ─── Palette ─────────────────────────────────────────────────────────────────

pub mod palette {
    //! The xterm 256-color palette.
    //!
    //! - 0–15: basic + bright colors
    //! - 16–231: 6×6×6 color cube
    //! - 232–255: grayscale ramp

    /// xterm defaults for the 16 basic colors.
    pub const ANSI16_RGB: [(u8, u8, u8); 16] = [
        (0, 0, 0),
        (128, 0, 0),
        (0, 128, 0),
        (128, 128, 0),
        (0, 0, 128),
        (128, 0, 128),
        (0, 128, 128),
        (192, 192, 192),
        (128, 128, 128),
        (255, 0, 0),
        (0, 255, 0),
        (255, 255, 0),
        (0, 0, 255),
        (255, 0, 255),
        (0, 255, 255),
        (255, 255, 255),
    ];

    /// RGB value of a palette index.
    #[must_use]
    pub fn ansi256_to_rgb(idx: u8) -> (u8, u8, u8) {
        match idx {
            0..=15 => ANSI16_RGB[idx as usize],
            16..=231 => {
                let i = idx - 16;
                let level = |n: u8| if n == 0 { 0 } else { 55 + 40 * n };
                (level(i / 36), level((i % 36) / 6), level(i % 6))
            }
            232..=255 => {
                let v = 8 + 10 * (idx - 232);
                (v, v, v)
            }
        }
    }

    /// Closest palette index among the first `limit` entries (16 or 256).
    #[must_use]
    pub fn nearest(r: u8, g: u8, b: u8, limit: u16) -> u8 {
        let dist = |(pr, pg, pb): (u8, u8, u8)| {
            let dr = i32::from(r) - i32::from(pr);
            let dg = i32::from(g) - i32::from(pg);
            let db = i32::from(b) - i32::from(pb);
            dr * dr + dg * dg + db * db
        };
        let top = u8::try_from(limit.saturating_sub(1)).unwrap_or(u8::MAX);
        (0..=top)
            .min_by_key(|&idx| dist(ansi256_to_rgb(idx)))
            .unwrap_or(0)
    }
}
