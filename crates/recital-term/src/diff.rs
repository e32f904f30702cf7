// SPDX-License-Identifier: MIT
//
// Differential frame output.
//
// A typewriter animation changes one or two cells per frame. The renderer
// compares each new FrameBuffer with the previous one and writes escape
// sequences only for the cells that differ, accumulating them in a byte
// buffer that is flushed with a single write.
//
// Per frame:
//
//   1. Unchanged rows are skipped with one slice comparison.
//   2. In a changed row, each run of differing cells gets one cursor move.
//   3. A style change emits one complete SGR sequence (see `ansi::sgr`).
//   4. Colors are fitted to the configured `ColorDepth` on the way out.
//   5. The whole frame is wrapped in synchronized-update markers.

use std::io::{self, Write};

use crate::ansi;
use crate::buffer::{FrameBuffer, Pen};
use crate::cell::Cell;
use crate::color::ColorDepth;

/// Counters from one render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    pub cells_rendered: usize,
    pub rows_touched: usize,
    pub bytes_written: usize,
}

/// Emits the difference between consecutive frames.
pub struct DiffRenderer {
    previous: Option<FrameBuffer>,
    out: Vec<u8>,
    depth: ColorDepth,
}

impl DiffRenderer {
    #[must_use]
    pub fn new(depth: ColorDepth) -> Self {
        Self {
            previous: None,
            out: Vec::with_capacity(16 * 1024),
            depth,
        }
    }

    #[must_use]
    pub const fn depth(&self) -> ColorDepth {
        self.depth
    }

    /// Forget the previous frame; the next render repaints everything.
    pub fn force_redraw(&mut self) {
        self.previous = None;
    }

    /// The bytes produced since the last flush.
    #[must_use]
    pub fn output_bytes(&self) -> &[u8] {
        &self.out
    }

    fn pen_of(&self, cell: &Cell) -> Pen {
        Pen::new(
            cell.fg.downgrade(self.depth),
            cell.bg.downgrade(self.depth),
            cell.attrs,
        )
    }

    /// Diff `current` against the previous frame into the output buffer.
    pub fn render(&mut self, current: &FrameBuffer) -> RenderStats {
        let mut stats = RenderStats::default();
        if current.width() == 0 || current.height() == 0 {
            return stats;
        }

        let start_len = self.out.len();
        let full = self
            .previous
            .as_ref()
            .is_none_or(|p| p.width() != current.width() || p.height() != current.height());

        // Writes into a Vec cannot fail.
        let _ = ansi::begin_sync(&mut self.out);
        if full {
            let _ = ansi::reset(&mut self.out);
            let _ = ansi::clear_screen(&mut self.out);
        }

        let mut pen: Option<Pen> = None;
        for y in 0..current.height() {
            let Some(row) = current.row(y) else { continue };
            let old_row = if full {
                None
            } else {
                self.previous.as_ref().and_then(|p| p.row(y))
            };
            if old_row == Some(row) {
                continue;
            }
            stats.rows_touched += 1;

            let mut cursor_at: Option<u16> = None;
            for (x, cell) in row.iter().enumerate() {
                let x = u16::try_from(x).unwrap_or(u16::MAX);
                if old_row.is_some_and(|old| old[usize::from(x)] == *cell) {
                    continue;
                }
                if cell.is_continuation() {
                    // The wide char before it already covered this column.
                    cursor_at = None;
                    continue;
                }
                if cursor_at != Some(x) {
                    let _ = ansi::cursor_to(&mut self.out, x, y);
                }
                let wanted = self.pen_of(cell);
                if pen != Some(wanted) {
                    let _ = ansi::sgr(&mut self.out, wanted);
                    pen = Some(wanted);
                }
                let mut utf8 = [0u8; 4];
                self.out
                    .extend_from_slice(cell.ch.encode_utf8(&mut utf8).as_bytes());
                stats.cells_rendered += 1;
                let w = u16::try_from(crate::buffer::char_width(cell.ch).max(1)).unwrap_or(1);
                cursor_at = Some(x.saturating_add(w));
            }
        }

        let _ = ansi::reset(&mut self.out);
        let _ = ansi::end_sync(&mut self.out);
        stats.bytes_written = self.out.len() - start_len;
        self.previous = Some(current.clone());
        stats
    }

    /// Write the accumulated bytes to stdout.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    pub fn flush(&mut self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        self.flush_to(&mut lock)
    }

    /// Write the accumulated bytes to `w` and clear the buffer.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        if !self.out.is_empty() {
            w.write_all(&self.out)?;
            w.flush()?;
            self.out.clear();
        }
        Ok(())
    }
}

impl Default for DiffRenderer {
    fn default() -> Self {
        Self::new(ColorDepth::TrueColor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Attr;
    use crate::color::CellColor;
    use pretty_assertions::assert_eq;

    fn render(r: &mut DiffRenderer, fb: &FrameBuffer) -> (RenderStats, String) {
        let stats = r.render(fb);
        let mut sink = Vec::new();
        r.flush_to(&mut sink).unwrap();
        (stats, String::from_utf8(sink).unwrap())
    }

    fn pen() -> Pen {
        Pen::new(CellColor::Rgb(200, 10, 10), CellColor::Default, Attr::empty())
    }

    #[test]
    fn first_frame_is_full() {
        let mut r = DiffRenderer::default();
        let fb = FrameBuffer::new(3, 2);
        let (stats, out) = render(&mut r, &fb);
        assert_eq!(stats.cells_rendered, 6);
        assert_eq!(stats.rows_touched, 2);
        assert!(out.contains("\x1b[2J"));
        assert!(out.starts_with("\x1b[?2026h"));
        assert!(out.ends_with("\x1b[?2026l"));
    }

    #[test]
    fn identical_frame_renders_nothing() {
        let mut r = DiffRenderer::default();
        let fb = FrameBuffer::new(4, 2);
        render(&mut r, &fb);
        let (stats, out) = render(&mut r, &fb);
        assert_eq!(stats.cells_rendered, 0);
        assert_eq!(stats.rows_touched, 0);
        assert!(!out.contains("\x1b[2J"));
    }

    #[test]
    fn one_typed_char_is_one_cell() {
        let mut r = DiffRenderer::default();
        let mut fb = FrameBuffer::new(10, 3);
        fb.paint_text(0, 1, "de", pen(), 10);
        render(&mut r, &fb);

        fb.paint_text(2, 1, "f", pen(), 10);
        let (stats, out) = render(&mut r, &fb);
        assert_eq!(stats.cells_rendered, 1);
        assert!(out.contains("\x1b[2;3H"));
        assert!(out.contains("38;2;200;10;10"));
        assert!(out.contains('f'));
    }

    #[test]
    fn contiguous_changes_share_one_cursor_move() {
        let mut r = DiffRenderer::default();
        let mut fb = FrameBuffer::new(10, 1);
        render(&mut r, &fb);
        fb.paint_text(0, 0, "abc", pen(), 10);
        let (stats, out) = render(&mut r, &fb);
        assert_eq!(stats.cells_rendered, 3);
        assert_eq!(out.matches('H').count(), 1);
    }

    #[test]
    fn depth_is_applied_on_output() {
        let mut r = DiffRenderer::new(ColorDepth::Mono);
        let mut fb = FrameBuffer::new(2, 1);
        fb.paint_text(0, 0, "x", pen(), 2);
        let (_, out) = render(&mut r, &fb);
        assert!(!out.contains("38;2"));
    }

    #[test]
    fn resize_forces_full_repaint() {
        let mut r = DiffRenderer::default();
        render(&mut r, &FrameBuffer::new(2, 2));
        let (stats, out) = render(&mut r, &FrameBuffer::new(3, 2));
        assert_eq!(stats.cells_rendered, 6);
        assert!(out.contains("\x1b[2J"));
    }

    #[test]
    fn force_redraw_repaints() {
        let mut r = DiffRenderer::default();
        let fb = FrameBuffer::new(2, 1);
        render(&mut r, &fb);
        r.force_redraw();
        let (stats, _) = render(&mut r, &fb);
        assert_eq!(stats.cells_rendered, 2);
    }

    #[test]
    fn empty_frame_writes_nothing() {
        let mut r = DiffRenderer::default();
        let (stats, out) = render(&mut r, &FrameBuffer::new(0, 0));
        assert_eq!(stats, RenderStats::default());
        assert!(out.is_empty());
    }
}
