//! Painting viewports into a frame buffer.
//!
//! A viewport owns its lines, scroll and highlight state; this module only
//! decides where each character lands on screen:
//!
//! ```text
//! ┌────┬──────────────────────────┐
//! │  5 │def two():                │
//! │  6 │    return 2              │ ← highlighted: highlight_bg across the row
//! │    │⋮                         │ ← fold marker, no number
//! │ 12 │x = two()                 │
//! └────┴──────────────────────────┘
//!  gutter       text area
//! ```

use std::borrow::Cow;

use recital_term::buffer::{FrameBuffer, char_width, string_width};
use recital_theme::Theme;

use crate::viewport::Viewport;

/// Tab stop width in display columns.
pub const TAB_WIDTH: usize = 4;

/// A rectangle of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Area {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Area {
    #[must_use]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub const fn right(self) -> u16 {
        self.x.saturating_add(self.width)
    }

    /// Split into a top part of `top` rows and whatever is left.
    #[must_use]
    pub const fn split_rows(self, top: u16) -> (Self, Self) {
        let top = if top < self.height { top } else { self.height };
        (
            Self::new(self.x, self.y, self.width, top),
            Self::new(self.x, self.y + top, self.width, self.height - top),
        )
    }
}

/// Columns needed for right-aligned numbers up to `largest`, plus one for
/// the separator. Zero when numbers are hidden.
#[must_use]
pub fn gutter_width(largest: usize, show_numbers: bool) -> u16 {
    if !show_numbers {
        return 0;
    }
    let digits = largest.max(1).ilog10() + 1;
    u16::try_from(digits + 1).unwrap_or(u16::MAX)
}

/// Expand tabs to the next stop, counting from display column `col`.
#[must_use]
pub fn expand_tabs(text: &str, mut col: usize) -> Cow<'_, str> {
    if !text.contains('\t') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + TAB_WIDTH);
    for ch in text.chars() {
        if ch == '\t' {
            let n = TAB_WIDTH - col % TAB_WIDTH;
            out.extend(std::iter::repeat_n(' ', n));
            col += n;
        } else {
            out.push(ch);
            col += char_width(ch);
        }
    }
    Cow::Owned(out)
}

/// Paint the visible window of `vp` into `area`.
pub fn paint_viewport(vp: &Viewport, theme: &Theme, frame: &mut FrameBuffer, area: Area) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let largest = vp
        .numbered()
        .iter()
        .filter_map(|(n, _)| *n)
        .max()
        .unwrap_or(0);
    let gw = gutter_width(largest, vp.show_numbers()).min(area.width);
    let text_x = area.x + gw;
    let right = area.right();
    let rows = vp.visible();

    for row in 0..area.height {
        let y = area.y + row;
        let entry = rows.get(usize::from(row));
        let highlighted = entry.is_some_and(|(_, line)| line.highlight);
        let bg = if highlighted {
            theme.highlight_bg
        } else {
            theme.normal.bg
        };
        frame.fill_row(y, area.x, right, bg);

        let Some((number, line)) = entry else {
            continue;
        };
        if let Some(n) = number.filter(|_| gw > 1) {
            let digits = usize::from(gw - 1);
            let label = format!("{n:>digits$} ");
            frame.paint_text(area.x, y, &label, theme.line_nr.over(bg).pen(), text_x);
        }

        if line.is_fold() {
            frame.paint_text(text_x, y, &line.text(), theme.fold.over(bg).pen(), right);
            continue;
        }
        let mut col = text_x;
        for span in &line.spans {
            let text = expand_tabs(&span.text, usize::from(col - text_x));
            let pen = theme.style_on(span.class, highlighted).pen();
            col += frame.paint_text(col, y, &text, pen, right);
            if col >= right {
                break;
            }
        }
    }
}

/// Paint a one-row status line: `left` flush left, `right_text` flush right.
pub fn paint_status(frame: &mut FrameBuffer, theme: &Theme, area: Area, left: &str, right_text: &str) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let pen = theme.status.pen();
    frame.fill_row(area.y, area.x, area.right(), pen.bg);
    let used = frame.paint_text(area.x + 1, area.y, left, pen, area.right());
    let width = u16::try_from(string_width(right_text)).unwrap_or(u16::MAX);
    let start = area.right().saturating_sub(width + 1);
    if start > area.x + used + 1 {
        frame.paint_text(start, area.y, right_text, pen, area.right());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Line;
    use crate::lexer::Span;
    use pretty_assertions::assert_eq;
    use recital_theme::TokenClass;

    fn frame_of(vp: &Viewport, width: u16, height: u16) -> FrameBuffer {
        let mut frame = FrameBuffer::new(width, height);
        paint_viewport(vp, &Theme::monokai(), &mut frame, Area::new(0, 0, width, height));
        frame
    }

    fn boxed(texts: &[&str]) -> Viewport {
        let mut vp = Viewport::new("code", 10).with_numbers(true);
        vp.append(texts.iter().map(|t| Line::plain(*t)).collect());
        vp
    }

    // ── gutter ──

    #[test]
    fn gutter_grows_with_numbers() {
        assert_eq!(gutter_width(0, true), 2);
        assert_eq!(gutter_width(9, true), 2);
        assert_eq!(gutter_width(10, true), 3);
        assert_eq!(gutter_width(1000, true), 5);
        assert_eq!(gutter_width(1000, false), 0);
    }

    #[test]
    fn numbers_are_right_aligned() {
        let texts: Vec<String> = (1..=10).map(|i| format!("l{i}")).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let frame = frame_of(&boxed(&refs), 8, 10);
        assert_eq!(frame.row_text(0), " 1 l1   ");
        assert_eq!(frame.row_text(9), "10 l10  ");
    }

    #[test]
    fn numbering_follows_starting_line_number() {
        let mut vp = boxed(&["a", "b"]);
        vp.set_lines(vec![Line::plain("a"), Line::plain("b")], Some(41));
        let frame = frame_of(&vp, 6, 2);
        assert_eq!(frame.row_text(0), "41 a  ");
        assert_eq!(frame.row_text(1), "42 b  ");
    }

    #[test]
    fn fold_marker_has_no_number() {
        let mut vp = boxed(&["a", "b", "c", "d"]);
        vp.fold(2, Some(3)).unwrap();
        let frame = frame_of(&vp, 5, 3);
        assert_eq!(frame.row_text(0), "1 a  ");
        assert_eq!(frame.row_text(1), "  ⋮  ");
        assert_eq!(frame.row_text(2), "4 d  ");
    }

    // ── text ──

    #[test]
    fn tabs_expand_to_stops() {
        assert_eq!(expand_tabs("a\tb", 0), "a   b");
        assert_eq!(expand_tabs("\tx", 2), "  x");
        assert!(matches!(expand_tabs("plain", 0), Cow::Borrowed(_)));
    }

    #[test]
    fn long_lines_clip_at_the_edge() {
        let mut vp = Viewport::new("code", 3).with_numbers(false);
        vp.append(vec![Line::new(vec![
            Span::new("fn", TokenClass::Keyword),
            Span::text(" main()"),
        ])]);
        let frame = frame_of(&vp, 6, 1);
        assert_eq!(frame.row_text(0), "fn mai");
    }

    #[test]
    fn highlighted_rows_get_highlight_background() {
        let mut vp = boxed(&["a", "b"]);
        vp.set_highlight(true, 2, 2).unwrap();
        let frame = frame_of(&vp, 6, 3);
        let theme = Theme::monokai();
        assert_eq!(frame.get(5, 1).unwrap().bg, theme.highlight_bg);
        assert_eq!(frame.get(5, 0).unwrap().bg, theme.normal.bg);
        assert_eq!(frame.get(5, 2).unwrap().bg, theme.normal.bg);
    }

    #[test]
    fn scrolled_window_shows_later_lines() {
        let mut vp = Viewport::new("code", 2).with_numbers(false);
        vp.append(["a", "b", "c"].iter().map(|t| Line::plain(*t)).collect());
        vp.scroll_by(1);
        let frame = frame_of(&vp, 2, 2);
        assert_eq!(frame.row_text(0), "b ");
        assert_eq!(frame.row_text(1), "c ");
    }

    #[test]
    fn status_line_puts_text_at_both_ends() {
        let mut frame = FrameBuffer::new(20, 1);
        paint_status(&mut frame, &Theme::monokai(), Area::new(0, 0, 20, 1), "3/9", "wait");
        assert_eq!(frame.row_text(0), " 3/9           wait ");
    }

    #[test]
    fn split_rows_clamps() {
        let (a, b) = Area::new(0, 0, 10, 5).split_rows(7);
        assert_eq!(a.height, 5);
        assert_eq!(b.height, 0);
    }
}
