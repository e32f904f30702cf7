//! Content model — lexed source as a list of lines.
//!
//! Loading runs the source through a [`Lexer`] once and splits the spans on
//! newlines, so a token that covers several lines (a docstring, a block
//! comment) becomes one span per line. Every [`Line`] remembers the source
//! line it came from; an excerpt cut with [`Content::extract_subset`] keeps
//! its true numbering.
//!
//! Lines are addressed 1-based throughout.

use std::fmt;
use std::sync::Arc;

use recital_term::buffer::string_width;
use recital_theme::TokenClass;
use tracing::debug;

use crate::error::{Result, StageError};
use crate::lexer::{Lexer, LexerRegistry, Span};

// ---------------------------------------------------------------------------
// Line
// ---------------------------------------------------------------------------

/// One displayed line: its spans and display attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    pub spans: Vec<Span>,
    /// Drawn on the theme's highlight background.
    pub highlight: bool,
    /// 1-based source line this came from, 0 for lines made up at runtime.
    pub origin: usize,
    /// Number of lines a fold marker stands in for, 0 for ordinary lines.
    pub folded: usize,
}

impl Line {
    #[must_use]
    pub const fn new(spans: Vec<Span>) -> Self {
        Self {
            spans,
            highlight: false,
            origin: 0,
            folded: 0,
        }
    }

    /// An unhighlighted line of plain text.
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            Self::blank()
        } else {
            Self::new(vec![Span::text(text)])
        }
    }

    #[must_use]
    pub const fn blank() -> Self {
        Self::new(Vec::new())
    }

    /// The `⋮` line left where `count` lines were folded away.
    #[must_use]
    pub fn fold_marker(count: usize) -> Self {
        Self {
            folded: count,
            ..Self::new(vec![Span::new("⋮", TokenClass::Comment)])
        }
    }

    #[must_use]
    pub const fn with_origin(mut self, origin: usize) -> Self {
        self.origin = origin;
        self
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.spans.iter().all(|s| s.text.trim().is_empty())
    }

    #[must_use]
    pub const fn is_fold(&self) -> bool {
        self.folded > 0
    }

    /// Display width in terminal columns.
    #[must_use]
    pub fn width(&self) -> usize {
        self.spans.iter().map(|s| string_width(&s.text)).sum()
    }

    /// Class of the first non-empty span.
    #[must_use]
    pub fn leading_class(&self) -> Option<TokenClass> {
        self.spans.iter().find(|s| !s.text.is_empty()).map(|s| s.class)
    }

    /// Add spans to the end, merging with the last span when the class
    /// matches.
    pub fn extend(&mut self, spans: impl IntoIterator<Item = Span>) {
        for span in spans {
            if span.text.is_empty() {
                continue;
            }
            match self.spans.last_mut() {
                Some(last) if last.class == span.class => last.text.push_str(&span.text),
                _ => self.spans.push(span),
            }
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for span in &self.spans {
            f.write_str(&span.text)?;
        }
        Ok(())
    }
}

/// Split a span stream into lines. Newlines are consumed; a trailing
/// newline does not open an extra empty line.
#[must_use]
pub fn split_lines(spans: Vec<Span>) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut current = Line::blank();
    let mut open = false;

    for span in spans {
        let mut pieces = span.text.split('\n').peekable();
        while let Some(piece) = pieces.next() {
            let piece = if pieces.peek().is_some() {
                piece.strip_suffix('\r').unwrap_or(piece)
            } else {
                piece
            };
            if !piece.is_empty() {
                current.extend([Span::new(piece, span.class)]);
                open = true;
            }
            if pieces.peek().is_some() {
                lines.push(std::mem::take(&mut current));
                open = false;
            }
        }
    }
    if open {
        lines.push(current);
    }
    for (i, line) in lines.iter_mut().enumerate() {
        line.origin = i + 1;
    }
    lines
}

/// Tokenize `text` with `lexer` and split it into lines.
#[must_use]
pub fn lex_lines(lexer: &dyn Lexer, text: &str) -> Vec<Line> {
    split_lines(lexer.tokenize(text))
}

// ---------------------------------------------------------------------------
// LineEdit
// ---------------------------------------------------------------------------

/// A change to a [`Content`]'s lines. Rows are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEdit {
    /// Insert so the first new line becomes row `at`. `0` and `1` both
    /// mean before the first line; `len + 1` appends.
    Insert { at: usize, lines: Vec<Line> },
    /// Remove rows `start..=end`.
    Remove { start: usize, end: usize },
    /// Overwrite rows starting at `at` with `lines`, one for one.
    Replace { at: usize, lines: Vec<Line> },
    /// Collapse each run of blank lines down to one.
    CollapseBlanks,
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// Lexed source text.
#[derive(Clone)]
pub struct Content {
    lexer: Arc<dyn Lexer>,
    lines: Vec<Line>,
    source: String,
    /// Origin of the first row of `source`.
    source_origin: usize,
    starting_line_number: usize,
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Content")
            .field("lexer", &self.lexer.name())
            .field("lines", &self.lines.len())
            .field("starting_line_number", &self.starting_line_number)
            .finish_non_exhaustive()
    }
}

impl Content {
    /// Lex `source` with the named lexer, or a detected one.
    ///
    /// # Errors
    ///
    /// [`StageError::Lex`] if `lexer` names nothing registered, or if it is
    /// `None` and detection fails.
    pub fn load(source: &str, lexer: Option<&str>, registry: &LexerRegistry) -> Result<Self> {
        let lexer = registry.resolve(lexer, source)?;
        Ok(Self::with_lexer(source, lexer))
    }

    /// Lex `source` with a lexer already in hand.
    #[must_use]
    pub fn with_lexer(source: &str, lexer: Arc<dyn Lexer>) -> Self {
        let lines = lex_lines(lexer.as_ref(), source);
        debug!(lexer = lexer.name(), lines = lines.len(), "content loaded");
        Self {
            lexer,
            lines,
            source: source.to_string(),
            source_origin: 1,
            starting_line_number: 1,
        }
    }

    #[must_use]
    pub fn lexer(&self) -> &Arc<dyn Lexer> {
        &self.lexer
    }

    #[must_use]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    #[must_use]
    pub fn into_lines(self) -> Vec<Line> {
        self.lines
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line at 1-based `row`.
    #[must_use]
    pub fn line(&self, row: usize) -> Option<&Line> {
        row.checked_sub(1).and_then(|i| self.lines.get(i))
    }

    /// Number shown for the first line.
    #[must_use]
    pub const fn starting_line_number(&self) -> usize {
        self.starting_line_number
    }

    pub const fn set_starting_line_number(&mut self, n: usize) {
        self.starting_line_number = n;
    }

    /// Plain text of every line.
    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        self.lines.iter().map(Line::text).collect()
    }

    /// Apply one edit.
    ///
    /// # Errors
    ///
    /// [`StageError::Range`] if the edit addresses rows outside the
    /// content. Nothing is changed in that case.
    pub fn edit(&mut self, edit: LineEdit) -> Result<()> {
        let len = self.lines.len();
        match edit {
            LineEdit::Insert { at, lines } => {
                if at > len + 1 {
                    return Err(StageError::range(at, format!("insert rows are 0..={}", len + 1)));
                }
                let idx = at.saturating_sub(1);
                self.lines.splice(idx..idx, lines);
            }
            LineEdit::Remove { start, end } => {
                check_rows(start, end, len)?;
                self.lines.drain(start - 1..end);
            }
            LineEdit::Replace { at, lines } => {
                if lines.is_empty() {
                    return check_rows(at, at, len);
                }
                check_rows(at, at + lines.len() - 1, len)?;
                for (slot, line) in self.lines[at - 1..].iter_mut().zip(lines) {
                    *slot = line;
                }
            }
            LineEdit::CollapseBlanks => {
                let mut prev_blank = false;
                self.lines.retain(|line| {
                    let blank = line.is_blank();
                    let keep = !(blank && prev_blank);
                    prev_blank = blank;
                    keep
                });
            }
        }
        Ok(())
    }

    /// A new content holding only the named unit: `"name"` for a top-level
    /// function or class, `"Class.method"` for a method. The excerpt keeps
    /// the numbering of where it sits in the source.
    ///
    /// # Errors
    ///
    /// [`StageError::NotFound`] if the lexer reports no unit by that name,
    /// which is always the case for lexers without structure.
    pub fn extract_subset(&self, selector: &str) -> Result<Self> {
        let unit = self
            .lexer
            .units(&self.source)
            .into_iter()
            .find(|u| u.path == selector)
            .ok_or_else(|| StageError::NotFound(selector.to_string()))?;

        let first = self.source_origin + unit.start_row;
        let last = self.source_origin + unit.end_row;
        let lines: Vec<Line> = self
            .lines
            .iter()
            .filter(|l| (first..=last).contains(&l.origin))
            .cloned()
            .collect();
        let source = self
            .source
            .lines()
            .skip(unit.start_row)
            .take(unit.end_row - unit.start_row + 1)
            .map(|l| format!("{l}\n"))
            .collect();

        debug!(selector, first, last, "extracted subset");
        Ok(Self {
            lexer: Arc::clone(&self.lexer),
            lines,
            source,
            source_origin: first,
            starting_line_number: self.starting_line_number + unit.start_row,
        })
    }
}

fn check_rows(start: usize, end: usize, len: usize) -> Result<()> {
    if start == 0 || start > len {
        return Err(StageError::range(start, format!("rows are 1..={len}")));
    }
    if end < start || end > len {
        return Err(StageError::range(end, format!("rows are {start}..={len}")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
