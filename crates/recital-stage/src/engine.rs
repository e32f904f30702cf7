//! The animation engine — plays a script of actions against a stage.
//!
//! The engine owns the [`Stage`], the action list and a cursor: the number
//! of actions begun so far. It moves through these states:
//!
//! ```text
//!   Pending ──start/step──▶ Running ──tick──▶ Typing ──beats done──▶ Running
//!                              │                 │
//!                              │ Wait/Sleep      │ prompt typed
//!                              ▼                 ▼
//!                     Suspended(Wait|Timer)   Suspended(Hold)
//!                              │                 │
//!                              └──resume/timer───┘
//!
//!   step_backward ──▶ Suspended(Paused), or AtStart at cursor 0
//!   last action done ──▶ AtEnd          cancel token ──▶ Cancelled
//! ```
//!
//! Two ways forward:
//!
//! - **Playing.** [`tick`](Engine::tick) hands the engine real elapsed
//!   time. In `Running` it begins the next action, animated: typewriter
//!   actions expand into beats that later ticks apply on schedule. It keeps
//!   going until something suspends or the script ends.
//! - **Stepping.** [`step_forward`](Engine::step_forward) and
//!   [`skip`](Engine::skip) apply actions straight to their final state.
//!   Stepping stops at waits; skipping passes over them.
//!
//! Undo is by snapshot: before an action begins, the whole stage is saved.
//! [`step_backward`](Engine::step_backward) restores the snapshot taken
//! before the most recent action, so the stage is exactly what it was after
//! the one before.
//!
//! An action that fails while executing (a row outside a viewport, say) is
//! rolled back from its snapshot and the cursor does not move.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, trace, warn};

use crate::action::{Action, ActionKind, TransitionSource};
use crate::animation::{self, Beat};
use crate::error::{Result, StageError};
use crate::settings::Settings;
use crate::viewport::{Edit, Stage, Viewport, ViewportId};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Why the engine is not advancing on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suspension {
    /// A `Wait` action; needs [`Engine::resume`].
    Wait,
    /// A `Sleep` (or a movie-mode wait) with this much time left.
    Timer(Duration),
    /// An animation stopped after typing a prompt.
    Hold,
    /// Stepped backward; playing resumes from here on request.
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Nothing has run yet.
    Pending,
    /// Ready to begin the next action.
    Running,
    /// An animation is in flight.
    Typing,
    Suspended(Suspension),
    Cancelled,
    /// Stepped back to before the first action.
    AtStart,
    AtEnd,
}

// ---------------------------------------------------------------------------
// Renderer / CancelToken
// ---------------------------------------------------------------------------

/// A display surface. Called after every change to a non-virtual viewport.
pub trait Renderer {
    fn render(&mut self, id: ViewportId, viewport: &Viewport);
}

/// Shared flag that stops a run between beats.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Stage as it was before an action began.
#[derive(Debug, Clone)]
struct Snapshot {
    stage: Stage,
    movie_mode: bool,
}

#[derive(Debug)]
struct Animation {
    beats: VecDeque<Beat>,
    /// Time left before the next beat.
    wait: Duration,
    skippable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Typewriter actions animate; waits suspend.
    Animated,
    /// Straight to the final state; waits suspend.
    Instant,
    /// Straight to the final state; waits are passed over.
    Skip,
}

pub struct Engine {
    stage: Stage,
    actions: Vec<Action>,
    cursor: usize,
    state: EngineState,
    history: Vec<Snapshot>,
    animation: Option<Animation>,
    settings: Settings,
    movie_mode: bool,
    fast_forward: bool,
    rng: StdRng,
    cancel: CancelToken,
    renderer: Box<dyn Renderer>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state)
            .field("cursor", &self.cursor)
            .field("actions", &self.actions.len())
            .field("movie_mode", &self.movie_mode)
            .field("fast_forward", &self.fast_forward)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Take ownership of the stage, script and settings.
    ///
    /// # Errors
    ///
    /// [`StageError::Config`] if an action targets a viewport the stage
    /// does not have, a transition copies from a viewport that is not
    /// virtual, or a highlight chain has no steps.
    pub fn new(
        stage: Stage,
        actions: Vec<Action>,
        settings: Settings,
        renderer: Box<dyn Renderer>,
    ) -> Result<Self> {
        validate(&stage, &actions)?;
        let rng = settings
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        debug!(
            actions = actions.len(),
            viewports = stage.len(),
            movie = settings.movie_mode,
            "engine ready"
        );
        Ok(Self {
            stage,
            actions,
            cursor: 0,
            state: EngineState::Pending,
            history: Vec::new(),
            animation: None,
            movie_mode: settings.movie_mode,
            settings,
            fast_forward: false,
            rng,
            cancel: CancelToken::new(),
            renderer,
        })
    }

    // ── accessors ──

    #[must_use]
    pub const fn state(&self) -> EngineState {
        self.state
    }

    /// Number of actions begun.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    #[must_use]
    pub const fn stage(&self) -> &Stage {
        &self.stage
    }

    /// For changes outside the script, such as scrolling.
    pub const fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub const fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    #[must_use]
    pub const fn movie_mode(&self) -> bool {
        self.movie_mode
    }

    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn current_action(&self) -> Option<&Action> {
        self.cursor.checked_sub(1).and_then(|i| self.actions.get(i))
    }

    // ── driving ──

    /// Begin playing. Only meaningful from `Pending`.
    pub fn start(&mut self) -> bool {
        if self.state != EngineState::Pending {
            return false;
        }
        self.settle();
        true
    }

    /// Execute the next action to its final state. An animation in flight
    /// is completed first. Does nothing while suspended on a wait or sleep,
    /// after cancellation, or at the end.
    ///
    /// # Errors
    ///
    /// Whatever the action reports; it is rolled back and the cursor stays.
    pub fn step_forward(&mut self) -> Result<bool> {
        if matches!(
            self.state,
            EngineState::Cancelled
                | EngineState::Suspended(Suspension::Wait | Suspension::Timer(_))
        ) {
            return Ok(false);
        }
        self.flush()?;
        if self.cursor >= self.actions.len() {
            self.state = EngineState::AtEnd;
            return Ok(false);
        }
        self.execute_next(Mode::Instant)?;
        Ok(true)
    }

    /// Undo the most recent action, or the one in flight.
    pub fn step_backward(&mut self) -> bool {
        if self.state == EngineState::Cancelled {
            return false;
        }
        let Some(snapshot) = self.history.pop() else {
            return false;
        };
        self.animation = None;
        self.cursor -= 1;
        self.restore(snapshot);
        self.state = if self.cursor == 0 {
            EngineState::AtStart
        } else {
            EngineState::Suspended(Suspension::Paused)
        };
        trace!(cursor = self.cursor, "stepped backward");
        true
    }

    /// Step backward until just after the previous `Wait`, or to the start.
    pub fn rewind_to_wait(&mut self) -> bool {
        if !self.step_backward() {
            return false;
        }
        while self.cursor > 0 && !self.actions[self.cursor - 1].is_wait() {
            self.step_backward();
        }
        debug!(cursor = self.cursor, "rewound");
        true
    }

    /// Apply up to `n` actions instantly, passing over waits and sleeps.
    /// Returns how many were applied.
    ///
    /// # Errors
    ///
    /// The first action that fails; everything before it stays applied.
    pub fn skip(&mut self, n: usize) -> Result<usize> {
        if self.state == EngineState::Cancelled {
            return Ok(0);
        }
        self.flush()?;
        let mut done = 0;
        while done < n && self.cursor < self.actions.len() {
            self.execute_next(Mode::Skip)?;
            done += 1;
        }
        self.settle();
        debug!(done, cursor = self.cursor, "skipped");
        Ok(done)
    }

    /// Skip everything that is left.
    ///
    /// # Errors
    ///
    /// See [`skip`](Self::skip).
    pub fn skip_to_end(&mut self) -> Result<usize> {
        self.skip(self.actions.len().saturating_sub(self.cursor))
    }

    /// Run every remaining typewriter action instantly. An animation in
    /// flight is completed now.
    ///
    /// # Errors
    ///
    /// See [`step_forward`](Self::step_forward).
    pub fn fast_forward(&mut self) -> Result<()> {
        self.fast_forward = true;
        self.flush()?;
        debug!(cursor = self.cursor, "fast-forwarding");
        Ok(())
    }

    /// The resume signal: ends a wait, sleep, hold or pause.
    pub fn resume(&mut self) -> bool {
        match self.state {
            EngineState::Pending => self.start(),
            EngineState::Suspended(Suspension::Hold) => {
                self.state = EngineState::Typing;
                true
            }
            EngineState::Suspended(_) | EngineState::AtStart => {
                self.settle();
                true
            }
            _ => false,
        }
    }

    /// Cut a skippable animation or sleep short.
    ///
    /// # Errors
    ///
    /// See [`step_forward`](Self::step_forward).
    pub fn interrupt(&mut self) -> Result<bool> {
        match self.state {
            EngineState::Typing if self.animation.as_ref().is_some_and(|a| a.skippable) => {
                self.flush()?;
                Ok(true)
            }
            EngineState::Suspended(Suspension::Timer(_))
                if self.current_action().is_some_and(|a| a.skippable) =>
            {
                self.settle();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Let `elapsed` time pass: apply due beats, count timers down, and in
    /// `Running` begin the next action. Returns whether anything visible
    /// changed.
    ///
    /// # Errors
    ///
    /// An action that fails is rolled back and the engine pauses before it.
    pub fn tick(&mut self, elapsed: Duration) -> Result<bool> {
        let mut budget = elapsed;
        let mut dirty = false;
        loop {
            if self.cancel.is_cancelled() {
                if self.state != EngineState::Cancelled {
                    self.cancel_now();
                }
                return Ok(dirty);
            }
            match self.state {
                EngineState::Running => {
                    if self.cursor >= self.actions.len() {
                        self.state = EngineState::AtEnd;
                        return Ok(dirty);
                    }
                    match self.execute_next(Mode::Animated) {
                        Ok(changed) => dirty |= changed,
                        Err(e) => {
                            self.state = EngineState::Suspended(Suspension::Paused);
                            return Err(e);
                        }
                    }
                }
                EngineState::Typing => {
                    dirty |= self.advance(&mut budget)?;
                    if self.state == EngineState::Typing {
                        return Ok(dirty);
                    }
                }
                EngineState::Suspended(Suspension::Timer(left)) => {
                    if budget < left {
                        self.state = EngineState::Suspended(Suspension::Timer(left - budget));
                        return Ok(dirty);
                    }
                    budget -= left;
                    self.settle();
                }
                _ => return Ok(dirty),
            }
        }
    }

    // ── internals ──

    const fn settle(&mut self) {
        self.state = if self.cursor >= self.actions.len() {
            EngineState::AtEnd
        } else {
            EngineState::Running
        };
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            stage: self.stage.clone(),
            movie_mode: self.movie_mode,
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.stage = snapshot.stage;
        self.movie_mode = snapshot.movie_mode;
        for (id, vp) in self.stage.visible() {
            self.renderer.render(id, vp);
        }
    }

    fn roll_back(&mut self) {
        self.animation = None;
        if let Some(snapshot) = self.history.pop() {
            self.cursor -= 1;
            self.restore(snapshot);
        }
    }

    fn cancel_now(&mut self) {
        if self.animation.take().is_some() {
            warn!(cursor = self.cursor, "cancelled mid-animation");
        } else {
            debug!(cursor = self.cursor, "cancelled");
        }
        self.state = EngineState::Cancelled;
    }

    fn apply(&mut self, id: ViewportId, edit: &Edit, render: bool) -> Result<()> {
        let vp = self
            .stage
            .get_mut(id)
            .ok_or_else(|| StageError::Config(format!("no viewport {}", id.0)))?;
        vp.apply(edit)?;
        if render && !vp.is_virtual() {
            self.renderer.render(id, vp);
        }
        Ok(())
    }

    fn render(&mut self, ids: &[ViewportId]) {
        for &id in ids {
            if let Some(vp) = self.stage.get(id).filter(|v| !v.is_virtual()) {
                self.renderer.render(id, vp);
            }
        }
    }

    /// Begin the action at the cursor, rolling back if it fails.
    fn execute_next(&mut self, mode: Mode) -> Result<bool> {
        let action = self.actions[self.cursor].clone();
        let prior = self.state;
        self.history.push(self.snapshot());
        self.cursor += 1;
        trace!(cursor = self.cursor, ?mode, "begin action");

        self.execute(&action, mode).inspect_err(|e| {
            warn!(cursor = self.cursor, error = %e, "action failed, rolled back");
            self.roll_back();
            self.state = prior;
        })
    }

    fn execute(&mut self, action: &Action, mode: Mode) -> Result<bool> {
        match &action.kind {
            ActionKind::Wait => {
                if mode == Mode::Skip {
                    self.settle();
                } else if self.movie_mode {
                    let pause = self.settings.movie_pause();
                    self.state = EngineState::Suspended(Suspension::Timer(pause));
                } else {
                    self.state = EngineState::Suspended(Suspension::Wait);
                }
                Ok(false)
            }
            ActionKind::Sleep(duration) => {
                if mode == Mode::Skip {
                    self.settle();
                } else {
                    self.state = EngineState::Suspended(Suspension::Timer(*duration));
                }
                Ok(false)
            }
            ActionKind::StopMovie => {
                self.movie_mode = false;
                self.settle();
                Ok(false)
            }
            _ if mode == Mode::Animated
                && action.typewriter
                && !self.fast_forward
                && !self.settings.deactivated =>
            {
                let beats = animation::beats(action, &self.stage, &self.settings, &mut self.rng)?;
                self.animation = Some(Animation {
                    beats: beats.into(),
                    wait: Duration::ZERO,
                    skippable: action.skippable,
                });
                self.state = EngineState::Typing;
                Ok(false)
            }
            _ => {
                let edits = animation::instant_edits(action, &self.stage)?;
                for (id, edit) in &edits {
                    self.apply(*id, edit, false)?;
                }
                let ids: Vec<ViewportId> = edits.iter().map(|(id, _)| *id).collect();
                self.render(&ids);
                self.settle();
                Ok(!edits.is_empty())
            }
        }
    }

    /// Apply the beats that are due within `budget`.
    fn advance(&mut self, budget: &mut Duration) -> Result<bool> {
        let mut dirty = false;
        loop {
            if self.cancel.is_cancelled() {
                self.cancel_now();
                return Ok(dirty);
            }
            let Some(anim) = self.animation.as_mut() else {
                self.settle();
                return Ok(dirty);
            };
            if anim.wait > *budget {
                anim.wait -= *budget;
                *budget = Duration::ZERO;
                return Ok(dirty);
            }
            *budget -= anim.wait;
            anim.wait = Duration::ZERO;
            let Some(beat) = anim.beats.pop_front() else {
                self.animation = None;
                self.settle();
                return Ok(dirty);
            };
            anim.wait = beat.delay;
            if beat.hold && self.movie_mode {
                anim.wait += self.settings.movie_pause();
            }

            if let Err(e) = self.apply(beat.target, &beat.edit, true) {
                warn!(cursor = self.cursor, error = %e, "beat failed, rolled back");
                self.roll_back();
                self.state = EngineState::Suspended(Suspension::Paused);
                return Err(e);
            }
            dirty = true;
            if beat.hold && !self.movie_mode {
                self.state = EngineState::Suspended(Suspension::Hold);
                return Ok(dirty);
            }
        }
    }

    /// Complete the animation in flight, if any.
    fn flush(&mut self) -> Result<()> {
        let Some(anim) = self.animation.take() else {
            if matches!(self.state, EngineState::Typing | EngineState::Suspended(Suspension::Hold)) {
                self.settle();
            }
            return Ok(());
        };
        let mut touched = Vec::new();
        for beat in anim.beats {
            if let Err(e) = self.apply(beat.target, &beat.edit, false) {
                self.roll_back();
                return Err(e);
            }
            if !touched.contains(&beat.target) {
                touched.push(beat.target);
            }
        }
        self.render(&touched);
        self.settle();
        Ok(())
    }
}

/// Everything about a script that can be checked before it runs.
fn validate(stage: &Stage, actions: &[Action]) -> Result<()> {
    for (i, action) in actions.iter().enumerate() {
        for target in action.targets() {
            if stage.get(target).is_none() {
                return Err(StageError::Config(format!(
                    "action {i} targets viewport {}, which does not exist",
                    target.0
                )));
            }
        }
        match &action.kind {
            ActionKind::Transition { targets } => {
                for (_, source) in targets {
                    if let TransitionSource::FromVirtual(id) = source {
                        if !stage.get(*id).is_some_and(Viewport::is_virtual) {
                            return Err(StageError::Config(format!(
                                "action {i} copies from viewport {}, which is not virtual",
                                id.0
                            )));
                        }
                    }
                }
            }
            ActionKind::HighlightChain { steps, .. } if steps.is_empty() => {
                return Err(StageError::Config(format!(
                    "action {i} is a highlight chain with no steps"
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
