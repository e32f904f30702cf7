//! Viewports — the code boxes a presentation draws into.
//!
//! A [`Viewport`] holds its own copy of the lines it shows (attached from a
//! [`Content`] or fed by actions), a window of `height` rows starting at
//! `scroll`, and an optional focus row. All rows are 1-based; `0` is only
//! meaningful as an insert position, where it means "before the first line".
//!
//! Bounded viewports refuse edits outside their current lines with
//! [`StageError::Bounds`]. Auto-scrolling viewports clamp insert positions
//! instead and keep their window pinned to the bottom as they grow, the way
//! a console does.
//!
//! The one edit that does not fail when it hits the focus row is
//! [`remove`](Viewport::remove): the focus is dropped and a warning logged.
//!
//! A [`Stage`] is the set of viewports one screen drives.

use tracing::warn;

use crate::content::{Content, Line};
use crate::error::{Result, StageError};
use crate::lexer::Span;

// ---------------------------------------------------------------------------
// ViewportId / Edit
// ---------------------------------------------------------------------------

/// Index of a viewport within its [`Stage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewportId(pub usize);

/// One mutation of a viewport. Actions expand into these; typewriter
/// actions into many small ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Append(Vec<Line>),
    Insert { at: usize, lines: Vec<Line> },
    Replace { at: usize, lines: Vec<Line> },
    Remove { start: usize, end: usize },
    Suffix { row: usize, spans: Vec<Span> },
    Clear,
    Fold { start: usize, end: Option<usize> },
    Highlight { rows: Vec<usize>, on: bool },
    /// Highlight exactly `rows`, turning every other row off.
    HighlightOnly(Vec<usize>),
    /// Swap in a whole new set of lines.
    SetLines {
        lines: Vec<Line>,
        starting_line_number: Option<usize>,
    },
}

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    name: String,
    lines: Vec<Line>,
    starting_line_number: usize,
    height: usize,
    scroll: usize,
    auto_scroll: bool,
    focus: Option<usize>,
    is_virtual: bool,
    show_numbers: bool,
}

impl Viewport {
    /// A bounded viewport `height` rows tall.
    #[must_use]
    pub fn new(name: impl Into<String>, height: usize) -> Self {
        Self {
            name: name.into(),
            lines: Vec::new(),
            starting_line_number: 1,
            height: height.max(1),
            scroll: 0,
            auto_scroll: false,
            focus: None,
            is_virtual: false,
            show_numbers: true,
        }
    }

    /// A viewport that grows and follows its last line.
    #[must_use]
    pub fn auto_scrolling(name: impl Into<String>, height: usize) -> Self {
        Self {
            auto_scroll: true,
            ..Self::new(name, height)
        }
    }

    /// An off-screen viewport. Content built here reaches the screen
    /// through a transition.
    #[must_use]
    pub fn virtual_box(name: impl Into<String>) -> Self {
        Self {
            is_virtual: true,
            ..Self::new(name, usize::MAX)
        }
    }

    #[must_use]
    pub const fn with_numbers(mut self, show: bool) -> Self {
        self.show_numbers = show;
        self
    }

    // ── accessors ──

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn lines(&self) -> &[Line] {
        &self.lines
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

    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        self.lines.iter().map(Line::text).collect()
    }

    #[must_use]
    pub const fn starting_line_number(&self) -> usize {
        self.starting_line_number
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub const fn scroll(&self) -> usize {
        self.scroll
    }

    #[must_use]
    pub const fn focus(&self) -> Option<usize> {
        self.focus
    }

    #[must_use]
    pub const fn is_virtual(&self) -> bool {
        self.is_virtual
    }

    #[must_use]
    pub const fn is_auto_scroll(&self) -> bool {
        self.auto_scroll
    }

    #[must_use]
    pub const fn show_numbers(&self) -> bool {
        self.show_numbers
    }

    /// 1-based rows currently highlighted.
    #[must_use]
    pub fn highlighted_rows(&self) -> Vec<usize> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, l)| l.highlight)
            .map(|(i, _)| i + 1)
            .collect()
    }

    /// Every line with the number shown beside it. Fold markers carry no
    /// number but advance the count by the lines they hide.
    #[must_use]
    pub fn numbered(&self) -> Vec<(Option<usize>, &Line)> {
        let mut n = self.starting_line_number;
        self.lines
            .iter()
            .map(|line| {
                if line.is_fold() {
                    n += line.folded;
                    (None, line)
                } else {
                    n += 1;
                    (Some(n - 1), line)
                }
            })
            .collect()
    }

    /// The lines inside the window, numbered.
    #[must_use]
    pub fn visible(&self) -> Vec<(Option<usize>, &Line)> {
        self.numbered()
            .into_iter()
            .skip(self.scroll)
            .take(self.height)
            .collect()
    }

    // ── binding and window ──

    /// Copy `content`'s lines in, numbering from `starting_line_number`.
    pub fn attach(&mut self, content: &Content, starting_line_number: usize) {
        self.lines = content.lines().to_vec();
        self.starting_line_number = starting_line_number;
        self.focus = None;
        self.scroll = 0;
        self.follow();
    }

    pub fn set_height(&mut self, height: usize) {
        self.height = height.max(1);
        self.scroll = self.scroll.min(self.max_scroll());
        self.follow();
    }

    const fn max_scroll(&self) -> usize {
        self.lines.len().saturating_sub(self.height)
    }

    /// Scroll by `delta` rows, clamped to the content.
    pub fn scroll_by(&mut self, delta: isize) {
        self.scroll = self.scroll.saturating_add_signed(delta).min(self.max_scroll());
    }

    pub const fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
    }

    fn follow(&mut self) {
        if self.auto_scroll {
            self.scroll_to_bottom();
        } else {
            self.scroll = self.scroll.min(self.max_scroll());
        }
    }

    /// Focus a row. Focus only ever points at an existing line.
    ///
    /// # Errors
    ///
    /// [`StageError::Bounds`] if `row` is not a current line.
    pub fn set_focus(&mut self, row: usize) -> Result<()> {
        self.check_rows(row, row)?;
        self.focus = Some(row);
        Ok(())
    }

    pub const fn clear_focus(&mut self) {
        self.focus = None;
    }

    /// Check that rows `start..=end` are all current lines.
    ///
    /// # Errors
    ///
    /// [`StageError::Bounds`] naming the first row that is not.
    pub fn check_rows(&self, start: usize, end: usize) -> Result<()> {
        let len = self.lines.len();
        if start == 0 || start > len {
            return Err(StageError::Bounds { row: start, len });
        }
        if end < start || end > len {
            return Err(StageError::Bounds { row: end, len });
        }
        Ok(())
    }

    /// 0-based index new lines go in at, for an insert at `at_row`.
    ///
    /// # Errors
    ///
    /// [`StageError::Bounds`] if a bounded viewport has no row `at_row`.
    pub fn insert_index(&self, at_row: usize) -> Result<usize> {
        let len = self.lines.len();
        if at_row > len {
            if self.auto_scroll {
                return Ok(len);
            }
            return Err(StageError::Bounds { row: at_row, len });
        }
        Ok(at_row.saturating_sub(1))
    }

    // ── edits ──

    /// Add lines after the last one.
    pub fn append(&mut self, lines: Vec<Line>) {
        self.lines.extend(lines);
        self.follow();
    }

    /// Insert so the first new line becomes row `at_row` (`0` and `1` both
    /// put it first).
    ///
    /// # Errors
    ///
    /// [`StageError::Bounds`] if `at_row` is outside `0..=len` on a
    /// bounded viewport. Auto-scrolling viewports append instead.
    pub fn insert(&mut self, at_row: usize, lines: Vec<Line>) -> Result<()> {
        let idx = self.insert_index(at_row)?;
        let count = lines.len();
        self.lines.splice(idx..idx, lines);
        if let Some(f) = self.focus.filter(|f| *f > idx) {
            self.focus = Some(f + count);
        }
        self.follow();
        Ok(())
    }

    /// Remove rows `start..=end`. A focus inside the range is cleared; one
    /// below it moves up.
    ///
    /// # Errors
    ///
    /// [`StageError::Bounds`] if the range is not inside the current lines.
    pub fn remove(&mut self, start: usize, end: usize) -> Result<()> {
        self.check_rows(start, end)?;
        self.lines.drain(start - 1..end);
        match self.focus {
            Some(f) if (start..=end).contains(&f) => {
                warn!(viewport = %self.name, row = f, "focused line removed, focus cleared");
                self.focus = None;
            }
            Some(f) if f > end => self.focus = Some(f - (end - start + 1)),
            _ => {}
        }
        self.follow();
        Ok(())
    }

    /// Overwrite rows starting at `at_row`, one new line per old one.
    ///
    /// # Errors
    ///
    /// [`StageError::Bounds`] if any replaced row falls outside the current
    /// lines. Nothing is replaced in that case.
    pub fn replace(&mut self, at_row: usize, lines: Vec<Line>) -> Result<()> {
        if lines.is_empty() {
            return self.check_rows(at_row, at_row);
        }
        self.check_rows(at_row, at_row + lines.len() - 1)?;
        for (slot, line) in self.lines[at_row - 1..].iter_mut().zip(lines) {
            *slot = line;
        }
        Ok(())
    }

    /// Add spans to the end of a row.
    ///
    /// # Errors
    ///
    /// [`StageError::Bounds`] if `row` is not a current line.
    pub fn suffix(&mut self, row: usize, spans: Vec<Span>) -> Result<()> {
        self.check_rows(row, row)?;
        self.lines[row - 1].extend(spans);
        Ok(())
    }

    /// Turn highlighting on or off for rows `start..=end`.
    ///
    /// # Errors
    ///
    /// [`StageError::Bounds`] if the range is not inside the current lines.
    pub fn set_highlight(&mut self, on: bool, start: usize, end: usize) -> Result<()> {
        self.check_rows(start, end)?;
        for line in &mut self.lines[start - 1..end] {
            line.highlight = on;
        }
        Ok(())
    }

    /// Turn highlighting on or off for a set of rows, all or none.
    ///
    /// # Errors
    ///
    /// [`StageError::Bounds`] for the first row that is not a current line.
    pub fn set_highlight_rows(&mut self, on: bool, rows: &[usize]) -> Result<()> {
        for &row in rows {
            self.check_rows(row, row)?;
        }
        for &row in rows {
            self.lines[row - 1].highlight = on;
        }
        Ok(())
    }

    /// Highlight exactly `rows`.
    ///
    /// # Errors
    ///
    /// [`StageError::Bounds`] for the first row that is not a current line.
    pub fn highlight_only(&mut self, rows: &[usize]) -> Result<()> {
        for &row in rows {
            self.check_rows(row, row)?;
        }
        for (i, line) in self.lines.iter_mut().enumerate() {
            line.highlight = rows.contains(&(i + 1));
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.focus = None;
        self.scroll = 0;
    }

    /// Replace rows `start..=end` (through the last line when `end` is
    /// `None`) with a single fold marker.
    ///
    /// # Errors
    ///
    /// [`StageError::Bounds`] if the range is not inside the current lines.
    pub fn fold(&mut self, start: usize, end: Option<usize>) -> Result<()> {
        let end = end.unwrap_or(self.lines.len());
        self.check_rows(start, end)?;
        let hidden: usize = self.lines[start - 1..end]
            .iter()
            .map(|l| if l.is_fold() { l.folded } else { 1 })
            .sum();
        self.lines
            .splice(start - 1..end, [Line::fold_marker(hidden)]);
        match self.focus {
            Some(f) if (start..=end).contains(&f) => self.focus = None,
            Some(f) if f > end => self.focus = Some(f - (end - start)),
            _ => {}
        }
        self.follow();
        Ok(())
    }

    /// Swap in a whole new set of lines. Focus is dropped and the window
    /// goes back to the top, or to the bottom for auto-scrolling viewports.
    pub fn set_lines(&mut self, lines: Vec<Line>, starting_line_number: Option<usize>) {
        self.lines = lines;
        if let Some(n) = starting_line_number {
            self.starting_line_number = n;
        }
        self.focus = None;
        self.scroll = 0;
        self.follow();
    }

    /// Apply one [`Edit`].
    ///
    /// # Errors
    ///
    /// Whatever the underlying operation reports; the viewport is left
    /// unchanged on error.
    pub fn apply(&mut self, edit: &Edit) -> Result<()> {
        match edit {
            Edit::Append(lines) => self.append(lines.clone()),
            Edit::Insert { at, lines } => self.insert(*at, lines.clone())?,
            Edit::Replace { at, lines } => self.replace(*at, lines.clone())?,
            Edit::Remove { start, end } => self.remove(*start, *end)?,
            Edit::Suffix { row, spans } => self.suffix(*row, spans.clone())?,
            Edit::Clear => self.clear(),
            Edit::Fold { start, end } => self.fold(*start, *end)?,
            Edit::Highlight { rows, on } => self.set_highlight_rows(*on, rows)?,
            Edit::HighlightOnly(rows) => self.highlight_only(rows)?,
            Edit::SetLines {
                lines,
                starting_line_number,
            } => self.set_lines(lines.clone(), *starting_line_number),
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// The viewports of one screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stage {
    viewports: Vec<Viewport>,
}

impl Stage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, viewport: Viewport) -> ViewportId {
        self.viewports.push(viewport);
        ViewportId(self.viewports.len() - 1)
    }

    #[must_use]
    pub fn get(&self, id: ViewportId) -> Option<&Viewport> {
        self.viewports.get(id.0)
    }

    pub fn get_mut(&mut self, id: ViewportId) -> Option<&mut Viewport> {
        self.viewports.get_mut(id.0)
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<ViewportId> {
        self.viewports
            .iter()
            .position(|v| v.name == name)
            .map(ViewportId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ViewportId, &Viewport)> {
        self.viewports
            .iter()
            .enumerate()
            .map(|(i, v)| (ViewportId(i), v))
    }

    /// Viewports that reach the screen.
    pub fn visible(&self) -> impl Iterator<Item = (ViewportId, &Viewport)> {
        self.iter().filter(|(_, v)| !v.is_virtual)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.viewports.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.viewports.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn lines(texts: &[&str]) -> Vec<Line> {
        texts.iter().map(|t| Line::plain(*t)).collect()
    }

    fn boxed(texts: &[&str]) -> Viewport {
        let mut vp = Viewport::new("code", 10);
        vp.append(lines(texts));
        vp
    }

    // ── insert / remove ──

    #[test]
    fn remove_then_insert_scenario() {
        let mut vp = boxed(&["a", "b", "c"]);
        vp.remove(2, 2).unwrap();
        vp.insert(2, lines(&["x", "y"])).unwrap();
        assert_eq!(vp.texts(), vec!["a", "x", "y", "c"]);
    }

    #[test]
    fn insert_zero_goes_first() {
        let mut vp = boxed(&["a", "b"]);
        vp.insert(0, lines(&["z"])).unwrap();
        assert_eq!(vp.texts(), vec!["z", "a", "b"]);
    }

    #[test]
    fn bounded_insert_past_end_fails() {
        let mut vp = boxed(&["a"]);
        assert_eq!(
            vp.insert(2, lines(&["x"])),
            Err(StageError::Bounds { row: 2, len: 1 })
        );
        assert_eq!(vp.texts(), vec!["a"]);
    }

    #[test]
    fn auto_scroll_insert_past_end_appends_and_follows() {
        let mut vp = Viewport::auto_scrolling("console", 2);
        vp.append(lines(&["a", "b"]));
        vp.insert(9, lines(&["c"])).unwrap();
        assert_eq!(vp.texts(), vec!["a", "b", "c"]);
        assert_eq!(vp.scroll(), 1);
        let shown: Vec<_> = vp.visible().iter().map(|(_, l)| l.text()).collect();
        assert_eq!(shown, vec!["b", "c"]);
    }

    #[test]
    fn remove_out_of_bounds_fails() {
        let mut vp = boxed(&["a", "b"]);
        assert!(matches!(vp.remove(0, 1), Err(StageError::Bounds { .. })));
        assert!(matches!(vp.remove(2, 3), Err(StageError::Bounds { .. })));
        assert_eq!(vp.len(), 2);
    }

    // ── focus ──

    #[test]
    fn removing_focused_line_clears_focus() {
        let mut vp = boxed(&["a", "b", "c"]);
        vp.set_focus(2).unwrap();
        vp.remove(1, 2).unwrap();
        assert_eq!(vp.focus(), None);
        assert_eq!(vp.visible().len(), 1);
    }

    #[test]
    fn focus_follows_its_line() {
        let mut vp = boxed(&["a", "b", "c"]);
        vp.set_focus(3).unwrap();
        vp.remove(1, 1).unwrap();
        assert_eq!(vp.focus(), Some(2));
        vp.insert(1, lines(&["x", "y"])).unwrap();
        assert_eq!(vp.focus(), Some(4));
        assert_eq!(vp.line(4).unwrap().text(), "c");
    }

    #[test]
    fn focus_must_exist() {
        let mut vp = boxed(&["a"]);
        assert!(vp.set_focus(2).is_err());
        assert!(vp.set_focus(0).is_err());
    }

    // ── replace ──

    #[test]
    fn replace_across_edge_is_all_or_nothing() {
        let mut vp = boxed(&["a", "b", "c"]);
        assert_eq!(
            vp.replace(3, lines(&["x", "y"])),
            Err(StageError::Bounds { row: 4, len: 3 })
        );
        assert_eq!(vp.texts(), vec!["a", "b", "c"]);
    }

    // ── highlight ──

    #[test]
    fn highlight_is_idempotent() {
        let mut vp = boxed(&["a", "b", "c"]);
        vp.set_highlight(true, 2, 3).unwrap();
        let once = vp.clone();
        vp.set_highlight(true, 2, 3).unwrap();
        assert_eq!(vp, once);
        assert_eq!(vp.highlighted_rows(), vec![2, 3]);
        vp.set_highlight(false, 1, 3).unwrap();
        assert!(vp.highlighted_rows().is_empty());
    }

    #[test]
    fn highlight_rows_checks_all_first() {
        let mut vp = boxed(&["a", "b"]);
        assert!(vp.set_highlight_rows(true, &[1, 5]).is_err());
        assert!(vp.highlighted_rows().is_empty());
        vp.highlight_only(&[2]).unwrap();
        vp.highlight_only(&[1]).unwrap();
        assert_eq!(vp.highlighted_rows(), vec![1]);
    }

    // ── fold / suffix / numbering ──

    #[test]
    fn fold_keeps_numbering_after_marker() {
        let mut vp = boxed(&["a", "b", "c", "d", "e"]);
        vp.fold(2, Some(3)).unwrap();
        let numbers: Vec<_> = vp.numbered().iter().map(|(n, _)| *n).collect();
        assert_eq!(numbers, vec![Some(1), None, Some(4), Some(5)]);
        assert_eq!(vp.line(2).unwrap().text(), "⋮");

        vp.fold(3, None).unwrap();
        assert_eq!(vp.texts(), vec!["a", "⋮", "⋮"]);
    }

    #[test]
    fn suffix_extends_row() {
        let mut vp = boxed(&["let x"]);
        vp.suffix(1, vec![Span::text(" = 1;")]).unwrap();
        assert_eq!(vp.texts(), vec!["let x = 1;"]);
        assert!(vp.suffix(2, vec![Span::text("!")]).is_err());
    }

    #[test]
    fn attach_sets_starting_number() {
        let content = Content::with_lexer(
            "a\nb\n",
            std::sync::Arc::new(crate::lexer::PlainLexer),
        );
        let mut vp = Viewport::new("code", 5);
        vp.attach(&content, 40);
        let numbers: Vec<_> = vp.numbered().iter().map(|(n, _)| *n).collect();
        assert_eq!(numbers, vec![Some(40), Some(41)]);
    }

    // ── window ──

    #[test]
    fn scroll_is_clamped() {
        let mut vp = boxed(&["1", "2", "3", "4"]);
        vp.set_height(2);
        vp.scroll_by(10);
        assert_eq!(vp.scroll(), 2);
        vp.scroll_by(-5);
        assert_eq!(vp.scroll(), 0);
    }

    // ── stage ──

    #[test]
    fn stage_hands_out_ids_and_hides_virtual() {
        let mut stage = Stage::new();
        let a = stage.add(Viewport::new("top", 5));
        let v = stage.add(Viewport::virtual_box("next"));
        assert_eq!(stage.find("next"), Some(v));
        assert_eq!(stage.visible().map(|(id, _)| id).collect::<Vec<_>>(), vec![a]);
    }

    // ── properties ──

    proptest! {
        #[test]
        fn replace_then_read_returns_new_lines(
            len in 1usize..12,
            start_seed in 0usize..100,
            new in proptest::collection::vec("[a-z ]{0,8}", 1..6),
        ) {
            let texts: Vec<String> = (0..len).map(|i| format!("line {i}")).collect();
            let mut vp = Viewport::new("p", 8);
            vp.append(texts.iter().map(Line::plain).collect());

            let count = new.len().min(len);
            let new = &new[..count];
            let at = 1 + start_seed % (len - count + 1);
            vp.replace(at, new.iter().map(Line::plain).collect()).unwrap();

            let read: Vec<String> = (at..at + count)
                .map(|row| vp.line(row).unwrap().text())
                .collect();
            prop_assert_eq!(read, new.to_vec());
            prop_assert_eq!(vp.len(), len);
        }
    }
}
