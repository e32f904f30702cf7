//! Turning a viewport into text outside the terminal: ANSI for pasting
//! into another terminal, HTML for slides and web pages, RTF for
//! presentation software that only takes rich text.
//!
//! Every formatter writes the whole viewport, not just the visible window,
//! and honors its highlighting, folds and line numbers.

use std::fmt::Write as _;
use std::io::Write;

use recital_term::ansi::sgr_string;
use recital_term::buffer::Pen;
use recital_term::cell::Attr;
use recital_term::color::{CellColor, ColorDepth};
use recital_theme::{Style, Theme};
use tracing::warn;

use crate::engine::Renderer;
use crate::viewport::{Viewport, ViewportId};

/// Output format of an export.
pub trait Formatter {
    fn format(&self, viewport: &Viewport, theme: &Theme) -> String;
}

/// Formatter for a name: `ansi`, `html` or `rtf`.
#[must_use]
pub fn formatter(name: &str, depth: ColorDepth) -> Option<Box<dyn Formatter>> {
    match name {
        "ansi" | "term" => Some(Box::new(AnsiFormatter { depth })),
        "html" => Some(Box::new(HtmlFormatter)),
        "rtf" => Some(Box::new(RtfFormatter)),
        _ => None,
    }
}

/// Number column label, or blanks of the same width for a fold.
fn number_label(number: Option<usize>, digits: usize) -> String {
    number.map_or_else(|| " ".repeat(digits + 1), |n| format!("{n:>digits$} "))
}

fn digits_for(viewport: &Viewport) -> Option<usize> {
    if !viewport.show_numbers() {
        return None;
    }
    let largest = viewport
        .numbered()
        .iter()
        .filter_map(|(n, _)| *n)
        .max()
        .unwrap_or(1);
    Some(largest.max(1).ilog10() as usize + 1)
}

// ---------------------------------------------------------------------------
// ANSI
// ---------------------------------------------------------------------------

/// SGR-colored text, downgraded to `depth`. `Mono` gives plain text.
#[derive(Debug, Clone, Copy)]
pub struct AnsiFormatter {
    pub depth: ColorDepth,
}

impl AnsiFormatter {
    fn pen(self, style: Style) -> Pen {
        Pen::new(
            style.fg.downgrade(self.depth),
            style.bg.downgrade(self.depth),
            style.attrs,
        )
    }
}

impl Formatter for AnsiFormatter {
    fn format(&self, viewport: &Viewport, theme: &Theme) -> String {
        let mono = self.depth == ColorDepth::Mono;
        let digits = digits_for(viewport);
        let mut out = String::new();

        for (number, line) in viewport.numbered() {
            let bg = if line.highlight {
                theme.highlight_bg
            } else {
                theme.normal.bg
            };
            if let Some(d) = digits {
                if !mono {
                    out.push_str(&sgr_string(self.pen(theme.line_nr.over(bg))));
                }
                out.push_str(&number_label(number, d));
            }
            if line.is_fold() {
                if !mono {
                    out.push_str(&sgr_string(self.pen(theme.fold.over(bg))));
                }
                out.push_str(&line.text());
            } else {
                for span in &line.spans {
                    if !mono {
                        let style = theme.style_on(span.class, line.highlight);
                        out.push_str(&sgr_string(self.pen(style)));
                    }
                    out.push_str(&span.text);
                }
            }
            if !mono {
                out.push_str("\x1b[0m");
            }
            out.push('\n');
        }
        out
    }
}

// ---------------------------------------------------------------------------
// HTML
// ---------------------------------------------------------------------------

/// A self-contained `<pre>` block with inline styles.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlFormatter;

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn css(style: Style) -> String {
    let mut rules = Vec::new();
    if let Some(hex) = style.fg.to_hex() {
        rules.push(format!("color:{hex}"));
    }
    if let Some(hex) = style.bg.to_hex() {
        rules.push(format!("background:{hex}"));
    }
    if style.attrs.contains(Attr::BOLD) {
        rules.push("font-weight:bold".to_string());
    }
    if style.attrs.contains(Attr::ITALIC) {
        rules.push("font-style:italic".to_string());
    }
    if style.attrs.contains(Attr::UNDERLINE) {
        rules.push("text-decoration:underline".to_string());
    }
    rules.join(";")
}

fn html_span(out: &mut String, style: Style, text: &str) {
    let rules = css(style);
    if rules.is_empty() {
        out.push_str(&escape_html(text));
    } else {
        let _ = write!(out, "<span style=\"{rules}\">{}</span>", escape_html(text));
    }
}

impl Formatter for HtmlFormatter {
    fn format(&self, viewport: &Viewport, theme: &Theme) -> String {
        let digits = digits_for(viewport);
        let mut out = String::new();
        let _ = write!(
            out,
            "<div class=\"recital\" style=\"{}\"><pre>",
            css(theme.normal)
        );
        for (number, line) in viewport.numbered() {
            if line.highlight {
                let _ = write!(
                    out,
                    "<span class=\"hl\" style=\"display:block;{}\">",
                    css(Style::fg_bg(CellColor::Default, theme.highlight_bg))
                );
            }
            if let Some(d) = digits {
                let _ = write!(
                    out,
                    "<span class=\"nr\" style=\"{}\">{}</span>",
                    css(theme.line_nr),
                    number_label(number, d)
                );
            }
            if line.is_fold() {
                html_span(&mut out, theme.fold, &line.text());
            } else {
                for span in &line.spans {
                    html_span(&mut out, theme.style(span.class), &span.text);
                }
            }
            if line.highlight {
                out.push_str("</span>");
            } else {
                out.push('\n');
            }
        }
        out.push_str("</pre></div>\n");
        out
    }
}

// ---------------------------------------------------------------------------
// RTF
// ---------------------------------------------------------------------------

/// Rich text with a color table, for word processors and slide software.
#[derive(Debug, Clone, Copy, Default)]
pub struct RtfFormatter;

fn escape_rtf(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' | '{' | '}' => {
                out.push('\\');
                out.push(ch);
            }
            '\t' => out.push_str("\\tab "),
            c if c.is_ascii() => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    #[allow(clippy::cast_possible_wrap)]
                    let signed = *unit as i16;
                    let _ = write!(out, "\\u{signed}?");
                }
            }
        }
    }
    out
}

/// Colors used by an export, indexed from 1 as RTF expects.
#[derive(Default)]
struct ColorTable(Vec<(u8, u8, u8)>);

impl ColorTable {
    fn index(&mut self, color: CellColor) -> Option<usize> {
        let rgb = color.to_rgb()?;
        let pos = self.0.iter().position(|c| *c == rgb).unwrap_or_else(|| {
            self.0.push(rgb);
            self.0.len() - 1
        });
        Some(pos + 1)
    }

    fn header(&self) -> String {
        let mut out = String::from("{\\colortbl;");
        for (r, g, b) in &self.0 {
            let _ = write!(out, "\\red{r}\\green{g}\\blue{b};");
        }
        out.push('}');
        out
    }
}

fn rtf_run(out: &mut String, table: &mut ColorTable, style: Style, text: &str) {
    out.push('{');
    if let Some(i) = table.index(style.fg) {
        let _ = write!(out, "\\cf{i}");
    }
    if style.attrs.contains(Attr::BOLD) {
        out.push_str("\\b");
    }
    if style.attrs.contains(Attr::ITALIC) {
        out.push_str("\\i");
    }
    out.push(' ');
    out.push_str(&escape_rtf(text));
    out.push('}');
}

impl Formatter for RtfFormatter {
    fn format(&self, viewport: &Viewport, theme: &Theme) -> String {
        let digits = digits_for(viewport);
        let mut table = ColorTable::default();
        let mut body = String::new();

        for (number, line) in viewport.numbered() {
            body.push('{');
            if line.highlight {
                if let Some(i) = table.index(theme.highlight_bg) {
                    let _ = write!(body, "\\highlight{i} ");
                }
            }
            if let Some(d) = digits {
                rtf_run(&mut body, &mut table, theme.line_nr, &number_label(number, d));
            }
            if line.is_fold() {
                rtf_run(&mut body, &mut table, theme.fold, &line.text());
            } else {
                for span in &line.spans {
                    rtf_run(&mut body, &mut table, theme.style(span.class), &span.text);
                }
            }
            body.push_str("}\\line\n");
        }

        let mut out = String::from("{\\rtf1\\ansi\\deff0{\\fonttbl{\\f0\\fmodern Courier New;}}");
        out.push_str(&table.header());
        out.push_str("\n\\f0\\fs20\n");
        out.push_str(&body);
        out.push('}');
        out
    }
}

// ---------------------------------------------------------------------------
// TextRenderer
// ---------------------------------------------------------------------------

/// Writes every frame the engine renders as plain text, for watching a
/// script play without a terminal.
pub struct TextRenderer<W: Write> {
    out: W,
}

impl<W: Write> TextRenderer<W> {
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn render(&mut self, id: ViewportId, viewport: &Viewport) {
        let mut frame = format!("--- {} ({}) ---\n", viewport.name(), id.0);
        for (_, line) in viewport.visible() {
            frame.push_str(&line.text());
            frame.push('\n');
        }
        if let Err(e) = self.out.write_all(frame.as_bytes()) {
            warn!(error = %e, "frame not written");
        }
    }
}
