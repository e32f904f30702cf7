// SPDX-License-Identifier: MIT
//
// ANSI escape sequences.
//
// Stateless writers for every control sequence recital sends: cursor
// movement, screen modes, and SGR styling. The diff renderer decides
// *when* to emit; these only know the bytes.
//
// Styling is always emitted as one complete SGR sequence that starts from
// a reset (`0;...`), so no attribute carries over from the previous run
// of cells.
//
// Coordinates are 0-indexed here and converted to the terminal's 1-indexed
// form on output.

use std::io::{self, Write};

use crate::buffer::Pen;
use crate::color::CellColor;

// ─── Cursor ──────────────────────────────────────────────────────────────────

#[inline]
pub fn cursor_to(w: &mut impl Write, x: u16, y: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", y + 1, x + 1)
}

#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

// ─── Screen ──────────────────────────────────────────────────────────────────

#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

/// SGR 0.
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0m")
}

#[inline]
pub fn enter_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049h")
}

#[inline]
pub fn exit_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049l")
}

/// Begin a synchronized update (DEC mode 2026). Terminals that support it
/// hold the frame until `end_sync`; the rest ignore it.
#[inline]
pub fn begin_sync(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2026h")
}

#[inline]
pub fn end_sync(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2026l")
}

// ─── Styling ─────────────────────────────────────────────────────────────────

fn push_color(params: &mut Vec<String>, color: CellColor, foreground: bool) {
    let (base, bright, extended) = if foreground { (30, 90, 38) } else { (40, 100, 48) };
    match color {
        CellColor::Default => {}
        CellColor::Ansi256(idx) if idx < 8 => params.push((base + u16::from(idx)).to_string()),
        CellColor::Ansi256(idx) if idx < 16 => {
            params.push((bright + u16::from(idx) - 8).to_string());
        }
        CellColor::Ansi256(idx) => params.push(format!("{extended};5;{idx}")),
        CellColor::Rgb(r, g, b) => params.push(format!("{extended};2;{r};{g};{b}")),
    }
}

/// The full SGR sequence for a pen, starting from a reset.
#[must_use]
pub fn sgr_string(pen: Pen) -> String {
    let mut params = vec!["0".to_string()];
    params.extend(pen.attrs.sgr_codes().into_iter().map(|c| c.to_string()));
    push_color(&mut params, pen.fg, true);
    push_color(&mut params, pen.bg, false);
    format!("\x1b[{}m", params.join(";"))
}

/// Write the full SGR sequence for a pen.
#[inline]
pub fn sgr(w: &mut impl Write, pen: Pen) -> io::Result<()> {
    w.write_all(sgr_string(pen).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Attr;
    use pretty_assertions::assert_eq;

    fn bytes(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn cursor_is_one_indexed() {
        assert_eq!(bytes(|w| cursor_to(w, 0, 0)), "\x1b[1;1H");
        assert_eq!(bytes(|w| cursor_to(w, 9, 4)), "\x1b[5;10H");
    }

    #[test]
    fn default_pen_is_bare_reset() {
        assert_eq!(sgr_string(Pen::default()), "\x1b[0m");
    }

    #[test]
    fn basic_and_bright_colors_use_short_codes() {
        let pen = Pen::new(CellColor::Ansi256(1), CellColor::Ansi256(12), Attr::empty());
        assert_eq!(sgr_string(pen), "\x1b[0;31;104m");
    }

    #[test]
    fn extended_colors_and_attrs() {
        let pen = Pen::new(
            CellColor::Rgb(1, 2, 3),
            CellColor::Ansi256(237),
            Attr::BOLD | Attr::UNDERLINE,
        );
        assert_eq!(sgr_string(pen), "\x1b[0;1;4;38;2;1;2;3;48;5;237m");
    }

    #[test]
    fn screen_modes() {
        assert_eq!(bytes(enter_alt_screen), "\x1b[?1049h");
        assert_eq!(bytes(begin_sync), "\x1b[?2026h");
        assert_eq!(bytes(cursor_hide), "\x1b[?25l");
    }
}
