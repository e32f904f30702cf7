//! Themes: token-class palettes plus the few pieces of chrome a
//! presentation has (gutter, highlighted rows, fold marker, status line).

use recital_term::cell::Attr;
use recital_term::color::CellColor;

use crate::style::Style;
use crate::token::TokenClass;

/// Shorthand for the literal palettes below.
const fn rgb(r: u8, g: u8, b: u8) -> CellColor {
    CellColor::Rgb(r, g, b)
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub name: String,
    pub is_dark: bool,

    // ── Chrome ────────────────────────────────────────────────
    /// Plain text and the background of the whole code box.
    pub normal: Style,
    /// Line numbers in the gutter.
    pub line_nr: Style,
    /// Background of rows with highlighting turned on.
    pub highlight_bg: CellColor,
    /// The `⋮` line left behind by a fold.
    pub fold: Style,
    /// Bottom status line.
    pub status: Style,

    // ── Syntax ────────────────────────────────────────────────
    syntax: [Style; TokenClass::ALL.len()],
}

impl Theme {
    /// Style for a token class.
    #[must_use]
    pub fn style(&self, class: TokenClass) -> Style {
        self.syntax[class as usize]
    }

    /// Style for a token class on a possibly highlighted row.
    #[must_use]
    pub fn style_on(&self, class: TokenClass, highlighted: bool) -> Style {
        let base = self.style(class).over(self.normal.bg);
        if highlighted {
            Style {
                bg: self.highlight_bg,
                ..base
            }
        } else {
            base
        }
    }

    /// Replace the style of one class.
    pub fn set_style(&mut self, class: TokenClass, style: Style) {
        self.syntax[class as usize] = style;
    }

    /// The dark default, close to the Monokai palette long used for code
    /// on projectors.
    #[must_use]
    pub fn monokai() -> Self {
        let fg = rgb(0xf8, 0xf8, 0xf2);
        let mut syntax = [Style::fg(fg); TokenClass::ALL.len()];
        let mut put = |c: TokenClass, s: Style| syntax[c as usize] = s;
        put(TokenClass::Keyword, Style::fg(rgb(0xf9, 0x26, 0x72)));
        put(TokenClass::Function, Style::fg(rgb(0xa6, 0xe2, 0x2e)));
        put(TokenClass::Type, Style::fg(rgb(0x66, 0xd9, 0xef)));
        put(TokenClass::String, Style::fg(rgb(0xe6, 0xdb, 0x74)));
        put(TokenClass::Number, Style::fg(rgb(0xae, 0x81, 0xff)));
        put(
            TokenClass::Comment,
            Style::fg_attrs(rgb(0x75, 0x71, 0x5e), Attr::ITALIC),
        );
        put(TokenClass::Operator, Style::fg(rgb(0xf9, 0x26, 0x72)));
        put(TokenClass::Constant, Style::fg(rgb(0xae, 0x81, 0xff)));
        put(TokenClass::Builtin, Style::fg(rgb(0x66, 0xd9, 0xef)));
        put(TokenClass::Property, Style::fg(rgb(0xfd, 0x97, 0x1f)));
        put(TokenClass::Attribute, Style::fg(rgb(0xa6, 0xe2, 0x2e)));
        put(
            TokenClass::Prompt,
            Style::fg_attrs(rgb(0x66, 0xd9, 0xef), Attr::BOLD),
        );
        put(TokenClass::Output, Style::fg(rgb(0xcf, 0xcf, 0xc2)));
        put(TokenClass::Traceback, Style::fg(rgb(0xf9, 0x26, 0x72)));

        Self {
            name: "monokai".to_string(),
            is_dark: true,
            normal: Style::fg_bg(fg, rgb(0x27, 0x28, 0x22)),
            line_nr: Style::fg(rgb(0x90, 0x90, 0x8a)),
            highlight_bg: rgb(0x49, 0x48, 0x3e),
            fold: Style::fg_attrs(rgb(0x75, 0x71, 0x5e), Attr::BOLD),
            status: Style::fg_bg(rgb(0x27, 0x28, 0x22), rgb(0xa6, 0xe2, 0x2e)),
            syntax,
        }
    }

    /// Light variant for bright rooms.
    #[must_use]
    pub fn paper() -> Self {
        let fg = rgb(0x38, 0x3a, 0x42);
        let mut syntax = [Style::fg(fg); TokenClass::ALL.len()];
        let mut put = |c: TokenClass, s: Style| syntax[c as usize] = s;
        put(TokenClass::Keyword, Style::fg(rgb(0xa6, 0x26, 0xa4)));
        put(TokenClass::Function, Style::fg(rgb(0x40, 0x78, 0xf2)));
        put(TokenClass::Type, Style::fg(rgb(0xc1, 0x84, 0x01)));
        put(TokenClass::String, Style::fg(rgb(0x50, 0xa1, 0x4f)));
        put(TokenClass::Number, Style::fg(rgb(0x98, 0x68, 0x01)));
        put(
            TokenClass::Comment,
            Style::fg_attrs(rgb(0xa0, 0xa1, 0xa7), Attr::ITALIC),
        );
        put(TokenClass::Operator, Style::fg(rgb(0x01, 0x84, 0xbc)));
        put(TokenClass::Constant, Style::fg(rgb(0x98, 0x68, 0x01)));
        put(TokenClass::Builtin, Style::fg(rgb(0xc1, 0x84, 0x01)));
        put(TokenClass::Property, Style::fg(rgb(0xe4, 0x56, 0x49)));
        put(TokenClass::Attribute, Style::fg(rgb(0x40, 0x78, 0xf2)));
        put(
            TokenClass::Prompt,
            Style::fg_attrs(rgb(0x40, 0x78, 0xf2), Attr::BOLD),
        );
        put(TokenClass::Output, Style::fg(rgb(0x69, 0x6c, 0x77)));
        put(TokenClass::Traceback, Style::fg(rgb(0xe4, 0x56, 0x49)));

        Self {
            name: "paper".to_string(),
            is_dark: false,
            normal: Style::fg_bg(fg, rgb(0xfa, 0xfa, 0xfa)),
            line_nr: Style::fg(rgb(0x9d, 0x9d, 0x9f)),
            highlight_bg: rgb(0xe5, 0xe5, 0xa6),
            fold: Style::fg_attrs(rgb(0xa0, 0xa1, 0xa7), Attr::BOLD),
            status: Style::fg_bg(rgb(0xfa, 0xfa, 0xfa), rgb(0x40, 0x78, 0xf2)),
            syntax,
        }
    }

    /// Uses only the terminal's own 16 colors and default background, so
    /// it follows whatever scheme the presenter's terminal has.
    #[must_use]
    pub fn terminal() -> Self {
        let ansi = CellColor::Ansi256;
        let mut syntax = [Style::PLAIN; TokenClass::ALL.len()];
        let mut put = |c: TokenClass, s: Style| syntax[c as usize] = s;
        put(TokenClass::Keyword, Style::fg_attrs(ansi(5), Attr::BOLD));
        put(TokenClass::Function, Style::fg(ansi(4)));
        put(TokenClass::Type, Style::fg(ansi(6)));
        put(TokenClass::String, Style::fg(ansi(2)));
        put(TokenClass::Number, Style::fg(ansi(3)));
        put(TokenClass::Comment, Style::fg_attrs(ansi(8), Attr::ITALIC));
        put(TokenClass::Constant, Style::fg(ansi(3)));
        put(TokenClass::Builtin, Style::fg(ansi(6)));
        put(TokenClass::Attribute, Style::fg(ansi(4)));
        put(TokenClass::Prompt, Style::fg_attrs(ansi(4), Attr::BOLD));
        put(TokenClass::Output, Style::fg_attrs(CellColor::Default, Attr::DIM));
        put(TokenClass::Traceback, Style::fg(ansi(1)));

        Self {
            name: "terminal".to_string(),
            is_dark: true,
            normal: Style::PLAIN,
            line_nr: Style::fg_attrs(ansi(8), Attr::DIM),
            highlight_bg: ansi(8),
            fold: Style::fg_attrs(ansi(8), Attr::BOLD),
            status: Style::fg_attrs(CellColor::Default, Attr::INVERSE),
            syntax,
        }
    }
}

// ---------------------------------------------------------------------------
// Builtins
// ---------------------------------------------------------------------------

/// Look up a builtin theme by name.
#[must_use]
pub fn builtin_theme(name: &str) -> Option<Theme> {
    match name {
        "default" | "monokai" => Some(Theme::monokai()),
        "paper" | "light" => Some(Theme::paper()),
        "terminal" => Some(Theme::terminal()),
        _ => None,
    }
}

/// Names accepted by [`builtin_theme`] (aliases excluded).
#[must_use]
pub const fn builtin_names() -> &'static [&'static str] {
    &["monokai", "paper", "terminal"]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn all_builtins_resolve_by_their_own_name() {
        for name in builtin_names() {
            let theme = builtin_theme(name).unwrap();
            assert_eq!(theme.name, *name);
        }
    }

    #[test]
    fn unknown_is_none() {
        assert!(builtin_theme("solarized-cyberpunk").is_none());
    }

    #[test]
    fn default_alias_is_monokai() {
        assert_eq!(builtin_theme("default"), Some(Theme::monokai()));
    }

    #[test]
    fn style_on_highlighted_row_uses_highlight_bg() {
        let t = Theme::monokai();
        let plain = t.style_on(TokenClass::Keyword, false);
        let lit = t.style_on(TokenClass::Keyword, true);
        assert_eq!(plain.fg, lit.fg);
        assert_eq!(plain.bg, t.normal.bg);
        assert_eq!(lit.bg, t.highlight_bg);
    }

    #[test]
    fn set_style_overrides_one_class() {
        let mut t = Theme::terminal();
        let s = Style::fg(CellColor::Ansi256(9));
        t.set_style(TokenClass::Number, s);
        assert_eq!(t.style(TokenClass::Number), s);
        assert_eq!(t.style(TokenClass::Text), Style::PLAIN);
    }

    #[test]
    fn comments_are_italic_everywhere() {
        for name in builtin_names() {
            let t = builtin_theme(name).unwrap();
            assert!(t.style(TokenClass::Comment).attrs.contains(Attr::ITALIC));
        }
    }
}
