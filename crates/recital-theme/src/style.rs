//! Resolved display styles.
//!
//! A `Style` is what a palette hands back for a token class: terminal-ready
//! colors plus attributes. Export formatters read the same struct, turning
//! the colors into hex for HTML and a color table for RTF.

use recital_term::buffer::Pen;
use recital_term::cell::Attr;
use recital_term::color::CellColor;

// ---------------------------------------------------------------------------
// Style
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Style {
    pub fg: CellColor,
    pub bg: CellColor,
    pub attrs: Attr,
}

impl Style {
    pub const PLAIN: Self = Self {
        fg: CellColor::Default,
        bg: CellColor::Default,
        attrs: Attr::empty(),
    };

    #[must_use]
    pub const fn fg(fg: CellColor) -> Self {
        Self {
            fg,
            bg: CellColor::Default,
            attrs: Attr::empty(),
        }
    }

    #[must_use]
    pub const fn fg_attrs(fg: CellColor, attrs: Attr) -> Self {
        Self {
            fg,
            bg: CellColor::Default,
            attrs,
        }
    }

    #[must_use]
    pub const fn fg_bg(fg: CellColor, bg: CellColor) -> Self {
        Self {
            fg,
            bg,
            attrs: Attr::empty(),
        }
    }

    /// This style drawn over `bg` when it has no background of its own.
    #[must_use]
    pub const fn over(self, bg: CellColor) -> Self {
        if self.bg.is_default() {
            Self { bg, ..self }
        } else {
            self
        }
    }

    /// The pen a frame buffer paints with.
    #[must_use]
    pub const fn pen(self) -> Pen {
        Pen::new(self.fg, self.bg, self.attrs)
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::PLAIN
    }
}
