// SPDX-License-Identifier: MIT
//
// Cell: one character position on screen.
//
// A presentation screen is a grid of these. Code text, line-number gutter,
// highlight bars and the status line all end up as cells before the diff
// renderer turns them into bytes.
//
// Wide characters (CJK, emoji) take two columns. The first cell holds the
// character, the second is a continuation cell with `ch == '\0'`. The
// renderer skips continuation cells when emitting text.

use crate::color::CellColor;

// ─── Text Attributes ─────────────────────────────────────────────────────────

bitflags::bitflags! {
    /// Text attributes as a compact bitfield.
    ///
    /// Each flag maps to one SGR parameter:
    ///
    /// ```
    /// use recital_term::cell::Attr;
    ///
    /// let style = Attr::BOLD | Attr::ITALIC;
    /// assert!(style.contains(Attr::BOLD));
    /// assert!(!style.contains(Attr::DIM));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Attr: u8 {
        /// SGR 1.
        const BOLD      = 1 << 0;
        /// SGR 2.
        const DIM       = 1 << 1;
        /// SGR 3.
        const ITALIC    = 1 << 2;
        /// SGR 4.
        const UNDERLINE = 1 << 3;
        /// SGR 7, swaps foreground and background.
        const INVERSE   = 1 << 4;
    }
}

impl Attr {
    /// SGR parameter codes for every set flag, in ascending order.
    #[must_use]
    pub fn sgr_codes(self) -> Vec<u8> {
        let mut codes = Vec::with_capacity(5);
        if self.contains(Self::BOLD) {
            codes.push(1);
        }
        if self.contains(Self::DIM) {
            codes.push(2);
        }
        if self.contains(Self::ITALIC) {
            codes.push(3);
        }
        if self.contains(Self::UNDERLINE) {
            codes.push(4);
        }
        if self.contains(Self::INVERSE) {
            codes.push(7);
        }
        codes
    }
}

// ─── Cell ────────────────────────────────────────────────────────────────────

/// A single terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// The character in this cell. `'\0'` marks a wide-char continuation.
    pub ch: char,
    pub fg: CellColor,
    pub bg: CellColor,
    pub attrs: Attr,
}

impl Cell {
    /// A blank cell: a space with default colors.
    pub const EMPTY: Self = Self {
        ch: ' ',
        fg: CellColor::Default,
        bg: CellColor::Default,
        attrs: Attr::empty(),
    };

    #[must_use]
    pub const fn new(ch: char, fg: CellColor, bg: CellColor, attrs: Attr) -> Self {
        Self { ch, fg, bg, attrs }
    }

    /// A space with the given background. Used to paint highlight bars.
    #[must_use]
    pub const fn blank(bg: CellColor) -> Self {
        Self {
            ch: ' ',
            fg: CellColor::Default,
            bg,
            attrs: Attr::empty(),
        }
    }

    /// Whether this is the trailing half of a wide character.
    #[inline]
    #[must_use]
    pub const fn is_continuation(&self) -> bool {
        self.ch == '\0'
    }

    /// Whether the style (colors + attrs) matches another cell's.
    #[inline]
    #[must_use]
    pub fn same_style(&self, other: &Self) -> bool {
        self.fg == other.fg && self.bg == other.bg && self.attrs == other.attrs
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_cell_is_space() {
        let c = Cell::default();
        assert_eq!(c.ch, ' ');
        assert!(c.fg.is_default());
        assert!(!c.is_continuation());
    }

    #[test]
    fn sgr_codes_in_order() {
        let a = Attr::INVERSE | Attr::BOLD | Attr::ITALIC;
        assert_eq!(a.sgr_codes(), vec![1, 3, 7]);
        assert!(Attr::empty().sgr_codes().is_empty());
    }

    #[test]
    fn same_style_ignores_char() {
        let a = Cell::new('a', CellColor::Ansi256(1), CellColor::Default, Attr::BOLD);
        let b = Cell { ch: 'b', ..a };
        assert!(a.same_style(&b));
        let c = Cell { attrs: Attr::empty(), ..a };
        assert!(!a.same_style(&c));
    }

    #[test]
    fn blank_keeps_background() {
        let c = Cell::blank(CellColor::Rgb(1, 2, 3));
        assert_eq!(c.bg, CellColor::Rgb(1, 2, 3));
        assert_eq!(c.ch, ' ');
    }
}
