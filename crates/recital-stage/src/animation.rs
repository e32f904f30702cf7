//! Expanding actions into viewport edits.
//!
//! [`instant_edits`] gives the edits that take an action straight to its
//! final state. [`beats`] gives the animated path: a sequence of small
//! edits, each followed by a delay, whose last state is the same as the
//! instant one.
//!
//! Typing a line goes: insert it blank, then redraw it once per grapheme
//! with a `█` cursor trailing the text. The last frame is the line itself,
//! cursor-free. Prompt, output and traceback spans land whole, and the
//! animation holds after a prompt so the presenter can talk before the
//! command appears. Lines that open with output are never typed.
//!
//! Positions are resolved against the viewport before the first beat is
//! built, so an action that would fail does so before anything changes.

use std::time::Duration;

use rand::Rng;
use recital_theme::TokenClass;
use unicode_segmentation::UnicodeSegmentation;

use crate::action::{Action, ActionKind, TransitionSource};
use crate::content::Line;
use crate::error::{Result, StageError};
use crate::lexer::Span;
use crate::settings::Settings;
use crate::viewport::{Edit, Stage, Viewport, ViewportId};

const CURSOR: &str = "█";
const WIPE_STEP: Duration = Duration::from_millis(50);
const WIPE_PAUSE: Duration = Duration::from_millis(300);
const DRAW_STEP: Duration = Duration::from_millis(50);

/// One step of an animation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Beat {
    pub target: ViewportId,
    pub edit: Edit,
    /// Time to wait after this beat before the next.
    pub delay: Duration,
    /// Stop after this beat until resumed.
    pub hold: bool,
}

impl Beat {
    const fn new(target: ViewportId, edit: Edit, delay: Duration) -> Self {
        Self {
            target,
            edit,
            delay,
            hold: false,
        }
    }
}

fn viewport(stage: &Stage, id: ViewportId) -> Result<&Viewport> {
    stage
        .get(id)
        .ok_or_else(|| StageError::Config(format!("no viewport {}", id.0)))
}

/// Every row of every step has to exist, not only the final step's.
fn check_chain(stage: &Stage, target: ViewportId, steps: &[Vec<usize>]) -> Result<()> {
    let len = viewport(stage, target)?.len();
    match steps.iter().flatten().find(|r| **r == 0 || **r > len) {
        Some(&row) => Err(StageError::Bounds { row, len }),
        None => Ok(()),
    }
}

/// Lines a transition puts in each target, and the number to start from.
fn transition_sources(
    stage: &Stage,
    targets: &[(ViewportId, TransitionSource)],
) -> Result<Vec<(ViewportId, Vec<Line>, Option<usize>)>> {
    targets
        .iter()
        .map(|(id, source)| {
            Ok(match source {
                TransitionSource::Blank => (*id, Vec::new(), None),
                TransitionSource::Code(lines) => {
                    let start = lines.first().map_or(1, |l| l.origin.max(1));
                    (*id, lines.clone(), Some(start))
                }
                TransitionSource::FromVirtual(from) => {
                    let vp = viewport(stage, *from)?;
                    (*id, vp.lines().to_vec(), Some(vp.starting_line_number()))
                }
            })
        })
        .collect()
}

/// The edits that take `action` straight to its final state.
///
/// # Errors
///
/// [`StageError::Config`] if a transition copies from a viewport that
/// does not exist, [`StageError::Bounds`] if a highlight chain names a row
/// the viewport does not have.
pub fn instant_edits(action: &Action, stage: &Stage) -> Result<Vec<(ViewportId, Edit)>> {
    let edit = match &action.kind {
        ActionKind::Append { target, lines } => (*target, Edit::Append(lines.clone())),
        ActionKind::Insert { target, at, lines } => (
            *target,
            Edit::Insert {
                at: *at,
                lines: lines.clone(),
            },
        ),
        ActionKind::Replace { target, at, lines } => (
            *target,
            Edit::Replace {
                at: *at,
                lines: lines.clone(),
            },
        ),
        ActionKind::Remove { target, start, end } => (
            *target,
            Edit::Remove {
                start: *start,
                end: *end,
            },
        ),
        ActionKind::Suffix { target, row, spans } => (
            *target,
            Edit::Suffix {
                row: *row,
                spans: spans.clone(),
            },
        ),
        ActionKind::Clear { target } => (*target, Edit::Clear),
        ActionKind::Fold { target, start, end } => (
            *target,
            Edit::Fold {
                start: *start,
                end: *end,
            },
        ),
        ActionKind::Highlight { target, rows, on } => (
            *target,
            Edit::Highlight {
                rows: rows.clone(),
                on: *on,
            },
        ),
        ActionKind::HighlightChain { target, steps, .. } => {
            check_chain(stage, *target, steps)?;
            (
                *target,
                Edit::HighlightOnly(steps.last().cloned().unwrap_or_default()),
            )
        }
        ActionKind::Transition { targets } => {
            return Ok(transition_sources(stage, targets)?
                .into_iter()
                .map(|(id, lines, starting_line_number)| {
                    (
                        id,
                        Edit::SetLines {
                            lines,
                            starting_line_number,
                        },
                    )
                })
                .collect());
        }
        ActionKind::Wait | ActionKind::Sleep(_) | ActionKind::StopMovie => return Ok(Vec::new()),
    };
    Ok(vec![edit])
}

/// The animated path to `action`'s final state.
///
/// # Errors
///
/// [`StageError::Bounds`] if the action addresses rows the viewport does
/// not have, [`StageError::Config`] if it names a missing viewport.
pub fn beats(
    action: &Action,
    stage: &Stage,
    settings: &Settings,
    rng: &mut impl Rng,
) -> Result<Vec<Beat>> {
    let mut typist = Typist {
        settings,
        rng,
        beats: Vec::new(),
    };

    match &action.kind {
        ActionKind::Append { target, lines } => {
            let len = viewport(stage, *target)?.len();
            for (i, line) in lines.iter().enumerate() {
                typist.new_line(*target, len + i + 1, line, |l| Edit::Append(vec![l]));
            }
        }
        ActionKind::Insert { target, at, lines } => {
            let vp = viewport(stage, *target)?;
            let idx = vp.insert_index(*at)?;
            let appending = idx == vp.len();
            for (i, line) in lines.iter().enumerate() {
                let row = idx + i + 1;
                typist.new_line(*target, row, line, |l| {
                    if appending {
                        Edit::Append(vec![l])
                    } else {
                        Edit::Insert { at: row, lines: vec![l] }
                    }
                });
            }
        }
        ActionKind::Replace { target, at, lines } => {
            let vp = viewport(stage, *target)?;
            if lines.is_empty() {
                vp.check_rows(*at, *at)?;
            } else {
                vp.check_rows(*at, at + lines.len() - 1)?;
            }
            for (i, line) in lines.iter().enumerate() {
                let row = at + i;
                typist.new_line(*target, row, line, |l| Edit::Replace { at: row, lines: vec![l] });
            }
        }
        ActionKind::Suffix { target, row, spans } => {
            let vp = viewport(stage, *target)?;
            vp.check_rows(*row, *row)?;
            let base = vp.line(*row).cloned().unwrap_or_default();
            let mut last = base.clone();
            last.extend(spans.iter().cloned());
            typist.type_into(*target, *row, base, spans, last);
        }
        ActionKind::HighlightChain {
            target,
            steps,
            pause,
        } => {
            check_chain(stage, *target, steps)?;
            for step in steps {
                typist
                    .beats
                    .push(Beat::new(*target, Edit::HighlightOnly(step.clone()), *pause));
            }
        }
        ActionKind::Transition { targets } => {
            let sources = transition_sources(stage, targets)?;
            for (id, _, _) in &sources {
                for row in 1..=viewport(stage, *id)?.len() {
                    let wipe = Edit::Replace {
                        at: row,
                        lines: vec![Line::blank()],
                    };
                    typist.beats.push(Beat::new(*id, wipe, WIPE_STEP));
                }
            }
            for (id, _, start) in &sources {
                let empty = Edit::SetLines {
                    lines: Vec::new(),
                    starting_line_number: *start,
                };
                typist.beats.push(Beat::new(*id, empty, Duration::ZERO));
            }
            if let Some(last) = typist.beats.last_mut() {
                last.delay = WIPE_PAUSE;
            }
            for (id, lines, _) in sources {
                for line in lines {
                    typist.beats.push(Beat::new(id, Edit::Append(vec![line]), DRAW_STEP));
                }
            }
        }
        _ => {
            return Ok(instant_edits(action, stage)?
                .into_iter()
                .map(|(id, edit)| Beat::new(id, edit, Duration::ZERO))
                .collect());
        }
    }
    Ok(typist.beats)
}

/// Builds the beats that type lines out.
struct Typist<'a, R> {
    settings: &'a Settings,
    rng: &'a mut R,
    beats: Vec<Beat>,
}

impl<R: Rng> Typist<'_, R> {
    fn delay(&mut self) -> Duration {
        self.settings.char_delay(&mut *self.rng)
    }

    /// Put `line` at `row` via `place`, typing it unless it is console
    /// output.
    fn new_line(
        &mut self,
        target: ViewportId,
        row: usize,
        line: &Line,
        place: impl Fn(Line) -> Edit,
    ) {
        if matches!(
            line.leading_class(),
            Some(TokenClass::Output | TokenClass::Traceback)
        ) {
            self.beats
                .push(Beat::new(target, place(line.clone()), Duration::ZERO));
            return;
        }
        let base = Line {
            spans: Vec::new(),
            ..line.clone()
        };
        let delay = self.delay();
        self.beats.push(Beat::new(target, place(base.clone()), delay));
        self.type_into(target, row, base, &line.spans, line.clone());
    }

    /// Redraw `row` as `base` grows by `spans`, one grapheme (or one
    /// continuous span) per beat, ending on `last`.
    fn type_into(&mut self, target: ViewportId, row: usize, base: Line, spans: &[Span], last: Line) {
        let first = self.beats.len();
        let mut current = base;

        for span in spans {
            let units: Vec<&str> = if span.class.is_continuous() {
                vec![span.text.as_str()]
            } else {
                span.text.graphemes(true).collect()
            };
            for unit in units.into_iter().filter(|u| !u.is_empty()) {
                current.extend([Span::new(unit, span.class)]);
                let mut frame = current.clone();
                frame.spans.push(Span::text(CURSOR));
                let delay = self.delay();
                self.beats.push(Beat {
                    target,
                    edit: Edit::Replace {
                        at: row,
                        lines: vec![frame],
                    },
                    delay,
                    hold: span.class == TokenClass::Prompt,
                });
            }
        }

        let closing = Edit::Replace {
            at: row,
            lines: vec![last],
        };
        if self.beats.len() > first {
            if let Some(beat) = self.beats.last_mut() {
                beat.edit = closing;
            }
        } else {
            self.beats.push(Beat::new(target, closing, Duration::ZERO));
        }
    }
}
