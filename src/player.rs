// SPDX-License-Identifier: MIT
//
// The interactive player: an engine driven by the presenter's keys and the
// event loop's clock.
//
// The engine tells its renderer whenever a viewport changes; here that
// only raises a dirty flag, and the next frame repaints every visible
// viewport from scratch. The diff renderer in recital-term keeps that
// cheap.
//
//   ┌──────────────────────────────┐
//   │ viewports, stacked           │  ← rows - 1, split evenly
//   ├──────────────────────────────┤
//   │ 3/9  wait          demo.py   │  ← status line
//   └──────────────────────────────┘
//
// Keys:
//   → l space enter   next: finish typing, else resume, else step
//   ← h               back to the previous wait
//   s / f             skip to end / fast-forward
//   ↑ ↓ PgUp PgDn     scroll the focused viewport
//   Tab               focus the next viewport
//   q Esc Ctrl-C      quit

use std::cell::Cell;
use std::io::Write;
use std::rc::Rc;
use std::time::Duration;

use recital_stage::engine::{Engine, EngineState, Renderer, Suspension};
use recital_stage::export::TextRenderer;
use recital_stage::view::{Area, paint_status, paint_viewport};
use recital_stage::{Settings, StageError, Viewport, ViewportId};
use recital_term::buffer::FrameBuffer;
use recital_term::event_loop::{Flow, Show};
use recital_term::input::{Key, KeyCode, Modifiers};
use recital_theme::Theme;
use tracing::{debug, warn};

use crate::script::Script;

/// Renderer that only notes that something changed.
struct DirtyFlag(Rc<Cell<bool>>);

impl Renderer for DirtyFlag {
    fn render(&mut self, _id: ViewportId, _viewport: &Viewport) {
        self.0.set(true);
    }
}

const fn state_label(state: EngineState) -> &'static str {
    match state {
        EngineState::Pending => "ready",
        EngineState::Running => "playing",
        EngineState::Typing => "typing",
        EngineState::Suspended(Suspension::Wait) => "wait",
        EngineState::Suspended(Suspension::Timer(_)) => "sleep",
        EngineState::Suspended(Suspension::Hold) => "hold",
        EngineState::Suspended(Suspension::Paused) => "paused",
        EngineState::Cancelled => "cancelled",
        EngineState::AtStart => "start",
        EngineState::AtEnd => "end",
    }
}

pub struct Player {
    engine: Engine,
    theme: Theme,
    title: String,
    focus: ViewportId,
    dirty: Rc<Cell<bool>>,
    message: Option<String>,
}

impl Player {
    pub fn new(
        script: Script,
        settings: Settings,
        theme: Theme,
        title: impl Into<String>,
    ) -> Result<Self, StageError> {
        let dirty = Rc::new(Cell::new(true));
        let engine = Engine::new(
            script.stage,
            script.actions,
            settings,
            Box::new(DirtyFlag(Rc::clone(&dirty))),
        )?;
        let focus = engine
            .stage()
            .visible()
            .next()
            .map_or(ViewportId(0), |(id, _)| id);
        Ok(Self {
            engine,
            theme,
            title: title.into(),
            focus,
            dirty,
            message: None,
        })
    }

    #[cfg(test)]
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }

    fn report<T>(&mut self, result: Result<T, StageError>) {
        if let Err(e) = result {
            warn!(error = %e, cursor = self.engine.cursor(), "action failed");
            self.message = Some(e.to_string());
        }
    }

    fn next(&mut self) {
        let result = match self.engine.state() {
            EngineState::Pending => Ok(self.engine.start()),
            EngineState::Typing | EngineState::Suspended(Suspension::Timer(_)) => {
                self.engine.interrupt()
            }
            EngineState::Suspended(_) | EngineState::AtStart => Ok(self.engine.resume()),
            EngineState::Running => self.engine.step_forward(),
            EngineState::AtEnd | EngineState::Cancelled => Ok(false),
        };
        self.report(result);
    }

    fn scroll(&mut self, delta: isize) {
        if let Some(vp) = self.engine.stage_mut().get_mut(self.focus) {
            vp.scroll_by(delta);
        }
    }

    fn page(&self) -> isize {
        self.engine
            .stage()
            .get(self.focus)
            .map_or(1, |vp| isize::try_from(vp.height()).unwrap_or(isize::MAX))
    }

    fn cycle_focus(&mut self) {
        let ids: Vec<ViewportId> = self.engine.stage().visible().map(|(id, _)| id).collect();
        if let Some(pos) = ids.iter().position(|id| *id == self.focus) {
            self.focus = ids[(pos + 1) % ids.len()];
        }
    }

    /// Stack the visible viewports over `rows` rows, sizing each to fit.
    fn layout(&mut self, width: u16, rows: u16) -> Vec<(ViewportId, Area)> {
        let ids: Vec<ViewportId> = self.engine.stage().visible().map(|(id, _)| id).collect();
        let Ok(count) = u16::try_from(ids.len()) else {
            return Vec::new();
        };
        if count == 0 {
            return Vec::new();
        }
        let share = rows / count;
        let mut rest = Area::new(0, 0, width, rows);
        let mut areas = Vec::with_capacity(ids.len());
        for (i, id) in ids.into_iter().enumerate() {
            let (area, below) = if i + 1 == usize::from(count) {
                (rest, Area::default())
            } else {
                rest.split_rows(share)
            };
            rest = below;
            if let Some(vp) = self.engine.stage_mut().get_mut(id) {
                vp.set_height(usize::from(area.height));
            }
            areas.push((id, area));
        }
        areas
    }
}

impl Show for Player {
    fn on_key(&mut self, key: Key) -> Flow {
        self.message = None;
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(Modifiers::CTRL) => {
                self.engine.cancel_token().cancel();
                return Flow::Quit;
            }
            KeyCode::Char('q') | KeyCode::Escape => {
                self.engine.cancel_token().cancel();
                return Flow::Quit;
            }
            KeyCode::Right | KeyCode::Enter | KeyCode::Char('l' | ' ') => self.next(),
            KeyCode::Left | KeyCode::Char('h') => {
                self.engine.rewind_to_wait();
            }
            KeyCode::Char('s') => {
                let result = self.engine.skip_to_end();
                self.report(result);
            }
            KeyCode::Char('f') => {
                let result = self.engine.fast_forward();
                self.report(result);
            }
            KeyCode::Up => self.scroll(-1),
            KeyCode::Down => self.scroll(1),
            KeyCode::PageUp => self.scroll(-self.page()),
            KeyCode::PageDown => self.scroll(self.page()),
            KeyCode::Tab | KeyCode::BackTab => self.cycle_focus(),
            _ => return Flow::Continue,
        }
        debug!(?key, state = ?self.engine.state(), "key handled");
        self.dirty.set(true);
        Flow::Continue
    }

    fn on_resize(&mut self, _size: recital_term::terminal::Size) {
        self.dirty.set(true);
    }

    fn on_tick(&mut self, elapsed: Duration) -> bool {
        let result = self.engine.tick(elapsed);
        self.report(result);
        self.dirty.replace(false)
    }

    fn paint(&mut self, frame: &mut FrameBuffer) {
        let rows = frame.height().saturating_sub(1);
        for (id, area) in self.layout(frame.width(), rows) {
            if let Some(vp) = self.engine.stage().get(id) {
                paint_viewport(vp, &self.theme, frame, area);
            }
        }
        let left = format!(
            "{}/{}  {}",
            self.engine.cursor(),
            self.engine.actions().len(),
            state_label(self.engine.state())
        );
        let right = self.message.as_deref().unwrap_or(&self.title);
        paint_status(
            frame,
            &self.theme,
            Area::new(0, rows, frame.width(), 1),
            &left,
            right,
        );
    }
}

/// Play without a terminal: every action lands instantly and each changed
/// viewport is written to `out` as plain text. Waits are passed over.
pub fn play_plain(
    script: Script,
    mut settings: Settings,
    out: impl Write + 'static,
) -> Result<(), StageError> {
    settings.deactivated = true;
    let mut engine = Engine::new(
        script.stage,
        script.actions,
        settings,
        Box::new(TextRenderer::new(out)),
    )?;
    while !matches!(engine.state(), EngineState::AtEnd | EngineState::Cancelled) {
        engine.resume();
        engine.step_forward()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script;
    use pretty_assertions::assert_eq;
    use recital_stage::{Content, LexerRegistry};

    const FOREVER: Duration = Duration::from_secs(3600);

    fn player(source: &str, highlight: Option<&str>) -> Player {
        let content = Content::load(source, Some("plain"), &LexerRegistry::with_builtins()).unwrap();
        let script = script::build(&content, None, highlight, 10, true).unwrap();
        let settings = Settings {
            seed: Some(1),
            ..Settings::default()
        };
        Player::new(script, settings, Theme::monokai(), "demo").unwrap()
    }

    fn press(p: &mut Player, code: KeyCode) -> Flow {
        p.on_key(Key::plain(code))
    }

    fn screen(p: &mut Player) -> Vec<String> {
        let mut frame = FrameBuffer::new(20, 4);
        p.paint(&mut frame);
        (0..4).map(|y| frame.row_text(y)).collect()
    }

    // ── keys ──

    #[test]
    fn space_starts_and_ticks_type() {
        let mut p = player("ab\n", None);
        assert_eq!(p.engine().state(), EngineState::Pending);
        press(&mut p, KeyCode::Char(' '));
        assert!(p.on_tick(FOREVER));
        assert_eq!(p.engine().state(), EngineState::AtEnd);
        assert_eq!(screen(&mut p)[0], "1 ab                ");
    }

    #[test]
    fn next_walks_through_waits() {
        let mut p = player("a\nb\n", Some("2"));
        press(&mut p, KeyCode::Right);
        p.on_tick(FOREVER);
        assert_eq!(p.engine().state(), EngineState::Suspended(Suspension::Wait));
        press(&mut p, KeyCode::Right);
        p.on_tick(Duration::ZERO);
        assert_eq!(p.engine().state(), EngineState::AtEnd);
        assert_eq!(p.engine().stage().get(ViewportId(0)).unwrap().highlighted_rows(), vec![2]);
    }

    #[test]
    fn back_returns_to_previous_wait() {
        let mut p = player("a\nb\n", Some("1"));
        press(&mut p, KeyCode::Char('s'));
        assert_eq!(p.engine().state(), EngineState::AtEnd);
        press(&mut p, KeyCode::Left);
        assert_eq!(p.engine().cursor(), 2);
        assert!(p.engine().stage().get(ViewportId(0)).unwrap().highlighted_rows().is_empty());
    }

    #[test]
    fn quit_keys_cancel() {
        let mut p = player("a\n", None);
        assert_eq!(p.on_key(Key::ctrl('c')), Flow::Quit);
        p.on_tick(Duration::ZERO);
        assert_eq!(p.engine().state(), EngineState::Cancelled);

        let mut p = player("a\n", None);
        assert_eq!(press(&mut p, KeyCode::Char('q')), Flow::Quit);
        assert_eq!(press(&mut player("a\n", None), KeyCode::Escape), Flow::Quit);
    }

    // ── painting ──

    #[test]
    fn status_line_shows_progress_and_title() {
        let mut p = player("a\n", None);
        let rows = screen(&mut p);
        assert_eq!(rows[3], " 0/1  ready    demo ");
        press(&mut p, KeyCode::Char('s'));
        assert!(screen(&mut p)[3].starts_with(" 1/1  end"));
    }

    #[test]
    fn action_errors_become_the_message() {
        let mut p = player("a\n", Some("5"));
        press(&mut p, KeyCode::Char('s'));
        let message = p.message.clone().unwrap_or_default();
        assert!(message.contains("row 5"), "{message}");
        p.on_key(Key::plain(KeyCode::Down));
        assert_eq!(p.message, None);
    }

    // ── plain ──

    #[test]
    fn plain_playback_writes_frames() {
        let content = Content::load("x\ny\n", Some("plain"), &LexerRegistry::with_builtins()).unwrap();
        let script = script::build(&content, None, None, 10, true).unwrap();
        let out = SharedBuf::default();
        play_plain(script, Settings::default(), out.clone()).unwrap();
        let text = String::from_utf8(out.0.borrow().clone()).unwrap();
        assert_eq!(text, "--- main (0) ---\nx\ny\n");
    }

    #[derive(Clone, Default)]
    struct SharedBuf(Rc<std::cell::RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
