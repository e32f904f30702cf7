// SPDX-License-Identifier: MIT
//
// FrameBuffer: the cell grid a presentation frame is painted into.
//
// The player paints every viewport, gutter and status line into a fresh
// FrameBuffer each frame; the DiffRenderer compares it with the last one
// and sends only what changed. Painting never fails: anything outside the
// grid, or past the caller's right edge, is dropped.

use unicode_width::UnicodeWidthChar;

use crate::cell::{Attr, Cell};
use crate::color::CellColor;

// ─── Pen ─────────────────────────────────────────────────────────────────────

/// The style text gets painted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pen {
    pub fg: CellColor,
    pub bg: CellColor,
    pub attrs: Attr,
}

impl Pen {
    #[must_use]
    pub const fn new(fg: CellColor, bg: CellColor, attrs: Attr) -> Self {
        Self { fg, bg, attrs }
    }

    /// Same pen with a different background.
    #[must_use]
    pub const fn on(self, bg: CellColor) -> Self {
        Self { bg, ..self }
    }
}

// ─── FrameBuffer ─────────────────────────────────────────────────────────────

/// A width × height grid of cells, row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::EMPTY; usize::from(width) * usize::from(height)],
        }
    }

    #[inline]
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    #[inline]
    const fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[must_use]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if x < self.width && y < self.height {
            Some(&self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    /// One row of cells.
    #[must_use]
    pub fn row(&self, y: u16) -> Option<&[Cell]> {
        if y >= self.height {
            return None;
        }
        let start = self.index(0, y);
        Some(&self.cells[start..start + usize::from(self.width)])
    }

    /// Set one cell. Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            self.cells[idx] = cell;
        }
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::EMPTY);
    }

    /// Resize and clear.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.cells.clear();
        self.cells
            .resize(usize::from(width) * usize::from(height), Cell::EMPTY);
    }

    /// Paint blanks with `bg` over columns `x0..x1` of row `y`.
    pub fn fill_row(&mut self, y: u16, x0: u16, x1: u16, bg: CellColor) {
        let x1 = x1.min(self.width);
        for x in x0..x1 {
            self.set(x, y, Cell::blank(bg));
        }
    }

    /// Paint `text` starting at (`x`, `y`), never past column `max_x`.
    ///
    /// Returns the number of columns used. Zero-width characters are
    /// skipped; a wide character that would straddle `max_x` becomes a
    /// space.
    pub fn paint_text(&mut self, x: u16, y: u16, text: &str, pen: Pen, max_x: u16) -> u16 {
        let max_x = max_x.min(self.width);
        if y >= self.height {
            return 0;
        }

        let mut col = x;
        for ch in text.chars() {
            if col >= max_x {
                break;
            }
            let w = ch.width().unwrap_or(0);
            if w == 0 {
                continue;
            }
            if w == 2 && col + 1 >= max_x {
                self.set(col, y, Cell::new(' ', pen.fg, pen.bg, pen.attrs));
                col += 1;
                break;
            }
            self.set(col, y, Cell::new(ch, pen.fg, pen.bg, pen.attrs));
            if w == 2 {
                self.set(col + 1, y, Cell::new('\0', pen.fg, pen.bg, pen.attrs));
                col += 2;
            } else {
                col += 1;
            }
        }
        col.saturating_sub(x)
    }

    /// The characters of row `y` as a string, continuation cells dropped.
    /// Handy in tests and for the flat-text renderer.
    #[must_use]
    pub fn row_text(&self, y: u16) -> String {
        self.row(y)
            .map(|cells| {
                cells
                    .iter()
                    .filter(|c| !c.is_continuation())
                    .map(|c| c.ch)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FrameBuffer({}x{})", self.width, self.height)
    }
}

// ─── Text Width ──────────────────────────────────────────────────────────────

/// Display width of one character (0, 1 or 2).
#[inline]
#[must_use]
pub fn char_width(ch: char) -> usize {
    ch.width().unwrap_or(0)
}

/// Display width of a string.
#[must_use]
pub fn string_width(s: &str) -> usize {
    s.chars().map(char_width).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pen() -> Pen {
        Pen::new(CellColor::Ansi256(2), CellColor::Default, Attr::empty())
    }

    #[test]
    fn new_is_blank() {
        let fb = FrameBuffer::new(4, 2);
        assert_eq!(fb.row_text(0), "    ");
        assert_eq!(fb.row_text(1), "    ");
        assert!(fb.get(4, 0).is_none());
    }

    #[test]
    fn paint_text_clips_at_max_x() {
        let mut fb = FrameBuffer::new(10, 1);
        let used = fb.paint_text(2, 0, "abcdef", pen(), 6);
        assert_eq!(used, 4);
        assert_eq!(fb.row_text(0), "  abcd    ");
    }

    #[test]
    fn wide_chars_take_two_columns() {
        let mut fb = FrameBuffer::new(6, 1);
        let used = fb.paint_text(0, 0, "日本", pen(), 6);
        assert_eq!(used, 4);
        assert!(fb.get(1, 0).unwrap().is_continuation());
        assert_eq!(fb.row_text(0), "日本  ");
    }

    #[test]
    fn wide_char_at_edge_becomes_space() {
        let mut fb = FrameBuffer::new(3, 1);
        let used = fb.paint_text(0, 0, "a日", pen(), 2);
        assert_eq!(used, 2);
        assert_eq!(fb.row_text(0), "a  ");
    }

    #[test]
    fn out_of_bounds_row_is_ignored() {
        let mut fb = FrameBuffer::new(3, 1);
        assert_eq!(fb.paint_text(0, 5, "abc", pen(), 3), 0);
    }

    #[test]
    fn fill_row_sets_background() {
        let mut fb = FrameBuffer::new(4, 1);
        fb.fill_row(0, 1, 10, CellColor::Ansi256(237));
        assert_eq!(fb.get(0, 0).unwrap().bg, CellColor::Default);
        assert_eq!(fb.get(3, 0).unwrap().bg, CellColor::Ansi256(237));
    }

    #[test]
    fn resize_clears() {
        let mut fb = FrameBuffer::new(2, 1);
        fb.paint_text(0, 0, "xy", pen(), 2);
        fb.resize(3, 2);
        assert_eq!(fb.width(), 3);
        assert_eq!(fb.row_text(1), "   ");
        assert_eq!(fb.row_text(0), "   ");
    }

    #[test]
    fn widths() {
        assert_eq!(string_width("abc"), 3);
        assert_eq!(string_width("日本"), 4);
        assert_eq!(char_width('\u{301}'), 0);
    }
}
