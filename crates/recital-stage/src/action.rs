//! Actions — the steps of a presentation script.
//!
//! An [`Action`] is a queued mutation of one or more viewports, or a pause.
//! Constructors validate everything that can be known before the script
//! runs: negative insert positions, malformed highlight specs, transitions
//! without a source. Row bounds depend on what the viewport holds at the
//! time, so those are checked when the action executes.
//!
//! Every typewriter action has an instant sibling that ends in exactly the
//! same viewport state.

use std::time::Duration;

use crate::content::Line;
use crate::error::{Result, StageError};
use crate::lexer::Span;
use crate::viewport::ViewportId;

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

/// Where a transition takes a viewport's new lines from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionSource {
    Code(Vec<Line>),
    /// Clear the viewport.
    Blank,
    /// Copy everything from a virtual viewport.
    FromVirtual(ViewportId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    Append { target: ViewportId, lines: Vec<Line> },
    Insert { target: ViewportId, at: usize, lines: Vec<Line> },
    Replace { target: ViewportId, at: usize, lines: Vec<Line> },
    Remove { target: ViewportId, start: usize, end: usize },
    Suffix { target: ViewportId, row: usize, spans: Vec<Span> },
    Clear { target: ViewportId },
    Fold { target: ViewportId, start: usize, end: Option<usize> },
    Highlight { target: ViewportId, rows: Vec<usize>, on: bool },
    /// Highlight each group in turn, `pause` apart. Ends with the last
    /// group on and every other row off.
    HighlightChain {
        target: ViewportId,
        steps: Vec<Vec<usize>>,
        pause: Duration,
    },
    Transition { targets: Vec<(ViewportId, TransitionSource)> },
    /// Suspend until resumed.
    Wait,
    /// Suspend for a fixed time.
    Sleep(Duration),
    /// Leave movie mode for the rest of the run.
    StopMovie,
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub kind: ActionKind,
    /// Played character by character rather than all at once.
    pub typewriter: bool,
    /// The presenter may cut the animation or sleep short.
    pub skippable: bool,
}

impl Action {
    const fn instant(kind: ActionKind) -> Self {
        Self {
            kind,
            typewriter: false,
            skippable: true,
        }
    }

    const fn typed(kind: ActionKind) -> Self {
        Self {
            kind,
            typewriter: true,
            skippable: true,
        }
    }

    #[must_use]
    pub const fn skippable(mut self, skippable: bool) -> Self {
        self.skippable = skippable;
        self
    }

    // ── line edits ──

    #[must_use]
    pub const fn append(target: ViewportId, lines: Vec<Line>) -> Self {
        Self::instant(ActionKind::Append { target, lines })
    }

    #[must_use]
    pub const fn append_typewriter(target: ViewportId, lines: Vec<Line>) -> Self {
        Self::typed(ActionKind::Append { target, lines })
    }

    /// Insert so the first new line becomes row `at` (`0` puts it first).
    ///
    /// # Errors
    ///
    /// [`StageError::Range`] if `at` is negative.
    pub fn insert(target: ViewportId, at: i64, lines: Vec<Line>) -> Result<Self> {
        Ok(Self::instant(ActionKind::Insert {
            target,
            at: insert_position(at)?,
            lines,
        }))
    }

    /// # Errors
    ///
    /// [`StageError::Range`] if `at` is negative.
    pub fn insert_typewriter(target: ViewportId, at: i64, lines: Vec<Line>) -> Result<Self> {
        Ok(Self::typed(ActionKind::Insert {
            target,
            at: insert_position(at)?,
            lines,
        }))
    }

    #[must_use]
    pub const fn replace(target: ViewportId, at: usize, lines: Vec<Line>) -> Self {
        Self::instant(ActionKind::Replace { target, at, lines })
    }

    /// Each replaced row is blanked and the new line typed in its place.
    #[must_use]
    pub const fn replace_typewriter(target: ViewportId, at: usize, lines: Vec<Line>) -> Self {
        Self::typed(ActionKind::Replace { target, at, lines })
    }

    /// Remove rows `start..=end`.
    ///
    /// # Errors
    ///
    /// [`StageError::Range`] if `start` is 0 or `end` comes before it.
    pub fn remove(target: ViewportId, start: usize, end: usize) -> Result<Self> {
        if start == 0 {
            return Err(StageError::range(0, "rows start at 1"));
        }
        if end < start {
            return Err(StageError::range(end, format!("range ends before row {start}")));
        }
        Ok(Self::instant(ActionKind::Remove { target, start, end }))
    }

    #[must_use]
    pub const fn suffix(target: ViewportId, row: usize, spans: Vec<Span>) -> Self {
        Self::instant(ActionKind::Suffix { target, row, spans })
    }

    #[must_use]
    pub const fn suffix_typewriter(target: ViewportId, row: usize, spans: Vec<Span>) -> Self {
        Self::typed(ActionKind::Suffix { target, row, spans })
    }

    #[must_use]
    pub const fn clear(target: ViewportId) -> Self {
        Self::instant(ActionKind::Clear { target })
    }

    /// Fold rows `start..=end` (through the last row when `end` is `None`)
    /// into a single `⋮` line.
    #[must_use]
    pub const fn fold(target: ViewportId, start: usize, end: Option<usize>) -> Self {
        Self::instant(ActionKind::Fold { target, start, end })
    }

    // ── highlighting ──

    /// Turn highlighting on or off for the rows in `spec`, e.g. `"1,3,7-9"`.
    ///
    /// # Errors
    ///
    /// See [`parse_rows`].
    pub fn highlight(target: ViewportId, spec: &str, on: bool) -> Result<Self> {
        Ok(Self::instant(ActionKind::Highlight {
            target,
            rows: parse_rows(spec)?,
            on,
        }))
    }

    /// Highlight each spec in turn, `pause` apart.
    ///
    /// # Errors
    ///
    /// [`StageError::Config`] for an empty chain, otherwise see
    /// [`parse_rows`].
    pub fn highlight_chain(target: ViewportId, specs: &[&str], pause: Duration) -> Result<Self> {
        if specs.is_empty() {
            return Err(StageError::Config("highlight chain has no steps".into()));
        }
        let steps = specs
            .iter()
            .map(|s| parse_rows(s))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::typed(ActionKind::HighlightChain {
            target,
            steps,
            pause,
        }))
    }

    // ── transitions and pauses ──

    #[must_use]
    pub fn transition() -> TransitionBuilder {
        TransitionBuilder::default()
    }

    #[must_use]
    pub const fn wait() -> Self {
        Self::instant(ActionKind::Wait)
    }

    #[must_use]
    pub const fn sleep(duration: Duration) -> Self {
        Self::instant(ActionKind::Sleep(duration))
    }

    #[must_use]
    pub const fn stop_movie() -> Self {
        Self::instant(ActionKind::StopMovie)
    }

    /// Viewports this action changes.
    #[must_use]
    pub fn targets(&self) -> Vec<ViewportId> {
        match &self.kind {
            ActionKind::Append { target, .. }
            | ActionKind::Insert { target, .. }
            | ActionKind::Replace { target, .. }
            | ActionKind::Remove { target, .. }
            | ActionKind::Suffix { target, .. }
            | ActionKind::Clear { target }
            | ActionKind::Fold { target, .. }
            | ActionKind::Highlight { target, .. }
            | ActionKind::HighlightChain { target, .. } => vec![*target],
            ActionKind::Transition { targets } => targets.iter().map(|(id, _)| *id).collect(),
            ActionKind::Wait | ActionKind::Sleep(_) | ActionKind::StopMovie => Vec::new(),
        }
    }

    #[must_use]
    pub const fn is_wait(&self) -> bool {
        matches!(self.kind, ActionKind::Wait)
    }
}

fn insert_position(at: i64) -> Result<usize> {
    usize::try_from(at).map_err(|_| StageError::range(at, "insert positions start at 0"))
}

/// Parse a row list like `"1,3,7-9"` into sorted, deduplicated 1-based rows.
///
/// # Errors
///
/// [`StageError::Config`] if the spec is empty or a piece is not a number
/// or a `low-high` range with `low <= high`. [`StageError::Range`] for a
/// row 0.
pub fn parse_rows(spec: &str) -> Result<Vec<usize>> {
    let malformed = || StageError::Config(format!("malformed highlight spec `{spec}`"));
    let number = |s: &str| s.trim().parse::<usize>().map_err(|_| malformed());

    let mut rows = Vec::new();
    for piece in spec.split(',') {
        let piece = piece.trim();
        if piece.is_empty() {
            return Err(malformed());
        }
        let (low, high) = match piece.split_once('-') {
            Some((a, b)) => (number(a)?, number(b)?),
            None => {
                let n = number(piece)?;
                (n, n)
            }
        };
        if low == 0 {
            return Err(StageError::range(0, "rows start at 1"));
        }
        if high < low {
            return Err(malformed());
        }
        rows.extend(low..=high);
    }
    rows.sort_unstable();
    rows.dedup();
    Ok(rows)
}

// ---------------------------------------------------------------------------
// TransitionBuilder
// ---------------------------------------------------------------------------

/// Builds a [`ActionKind::Transition`]. Each `to` names a target; the
/// source call after it (`code`, `blank`, `from_virtual`) says what the
/// target gets.
///
/// ```text
/// Action::transition()
///     .to(left).code(lines)
///     .to(right).blank()
///     .animated(true)
///     .build()?
/// ```
#[derive(Debug, Default)]
pub struct TransitionBuilder {
    targets: Vec<(ViewportId, Option<TransitionSource>)>,
    animated: bool,
    skippable: Option<bool>,
}

impl TransitionBuilder {
    #[must_use]
    pub fn to(mut self, target: ViewportId) -> Self {
        self.targets.push((target, None));
        self
    }

    fn source(mut self, source: TransitionSource) -> Self {
        if let Some(last) = self.targets.last_mut() {
            last.1 = Some(source);
        }
        self
    }

    #[must_use]
    pub fn code(self, lines: Vec<Line>) -> Self {
        self.source(TransitionSource::Code(lines))
    }

    #[must_use]
    pub fn blank(self) -> Self {
        self.source(TransitionSource::Blank)
    }

    #[must_use]
    pub fn from_virtual(self, id: ViewportId) -> Self {
        self.source(TransitionSource::FromVirtual(id))
    }

    /// Wipe and redraw line by line instead of swapping at once.
    #[must_use]
    pub const fn animated(mut self, animated: bool) -> Self {
        self.animated = animated;
        self
    }

    #[must_use]
    pub const fn skippable(mut self, skippable: bool) -> Self {
        self.skippable = Some(skippable);
        self
    }

    /// # Errors
    ///
    /// [`StageError::Config`] if there are no targets, or a target was
    /// given neither code, a blank marker, nor a virtual viewport.
    pub fn build(self) -> Result<Action> {
        if self.targets.is_empty() {
            return Err(StageError::Config("transition has no target".into()));
        }
        let mut targets = Vec::with_capacity(self.targets.len());
        for (id, source) in self.targets {
            let source = source.ok_or_else(|| {
                StageError::Config(format!(
                    "transition to viewport {} has neither code nor a blank marker",
                    id.0
                ))
            })?;
            targets.push((id, source));
        }
        Ok(Action {
            kind: ActionKind::Transition { targets },
            typewriter: self.animated,
            skippable: self.skippable.unwrap_or(true),
        })
    }
}
