// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// The presentation loop.
//
// One thread, one loop: wait on the stdin channel with a short timeout,
// hand any decoded keys to the show, hand the real elapsed time to the
// show's tick (typing animations and sleeps are timed there), and repaint
// only when the show says something changed.
//
// The timeout doubles as the animation clock. At the default 4 ms a
// 130 ms keystroke delay lands within one tick of its target, and an idle
// slide costs nothing because nothing repaints.
//
// Terminal resize arrives as SIGWINCH; the handler only sets a flag that
// the loop checks every iteration.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crate::buffer::FrameBuffer;
use crate::color::ColorDepth;
use crate::diff::DiffRenderer;
use crate::input::{Key, KeyDecoder};
use crate::reader::StdinReader;
use crate::terminal::{Screen, Size};

static RESIZED: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
fn install_sigwinch_handler() {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = on_sigwinch as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&raw mut sa.sa_mask);
        libc::sigaction(libc::SIGWINCH, &raw const sa, std::ptr::null_mut());
    }
}

#[cfg(unix)]
extern "C" fn on_sigwinch(_sig: libc::c_int) {
    RESIZED.store(true, Ordering::Relaxed);
}

#[cfg(not(unix))]
fn install_sigwinch_handler() {}

// ─── Show ────────────────────────────────────────────────────────────────────

/// What a key handler wants the loop to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Something the loop can drive.
pub trait Show {
    /// A key was pressed.
    fn on_key(&mut self, key: Key) -> Flow;

    /// The terminal changed size. The frame buffer is already resized.
    fn on_resize(&mut self, _size: Size) {}

    /// Time passed. Return `true` if the next frame would look different.
    fn on_tick(&mut self, elapsed: Duration) -> bool;

    /// Paint the whole frame. The buffer arrives cleared.
    fn paint(&mut self, frame: &mut FrameBuffer);
}

/// Loop timing and output depth.
#[derive(Debug, Clone, Copy)]
pub struct LoopConfig {
    pub tick: Duration,
    pub depth: ColorDepth,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(4),
            depth: ColorDepth::TrueColor,
        }
    }
}

// ─── EventLoop ───────────────────────────────────────────────────────────────

pub struct EventLoop {
    screen: Screen,
    renderer: DiffRenderer,
    decoder: KeyDecoder,
    config: LoopConfig,
}

impl EventLoop {
    /// Take over the terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be put in raw mode.
    pub fn new(config: LoopConfig) -> io::Result<Self> {
        let screen = Screen::take()?;
        install_sigwinch_handler();
        Ok(Self {
            screen,
            renderer: DiffRenderer::new(config.depth),
            decoder: KeyDecoder::new(),
            config,
        })
    }

    /// Run until the show quits or stdin closes. The terminal is restored
    /// before this returns, error or not.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error from reading input or writing frames.
    pub fn run(mut self, show: &mut impl Show) -> io::Result<()> {
        let (mut reader, rx) = StdinReader::spawn()?;
        let result = self.drive(show, &rx);
        reader.stop();
        self.screen.release()?;
        result
    }

    fn deliver(show: &mut impl Show, keys: Vec<Key>, dirty: &mut bool) -> Flow {
        for key in keys {
            *dirty = true;
            if show.on_key(key) == Flow::Quit {
                return Flow::Quit;
            }
        }
        Flow::Continue
    }

    fn drive(&mut self, show: &mut impl Show, rx: &Receiver<Vec<u8>>) -> io::Result<()> {
        let size = self.screen.size();
        let mut frame = FrameBuffer::new(size.cols, size.rows);
        show.on_resize(size);
        let mut dirty = true;
        let mut last = Instant::now();

        loop {
            let keys = match rx.recv_timeout(self.config.tick) {
                Ok(bytes) => self.decoder.advance(&bytes),
                Err(RecvTimeoutError::Timeout) if self.decoder.has_pending() => {
                    self.decoder.flush()
                }
                Err(RecvTimeoutError::Timeout) => Vec::new(),
                Err(RecvTimeoutError::Disconnected) => return Ok(()),
            };
            if Self::deliver(show, keys, &mut dirty) == Flow::Quit {
                return Ok(());
            }

            if RESIZED.swap(false, Ordering::Relaxed) {
                let size = self.screen.refresh_size();
                frame.resize(size.cols, size.rows);
                self.renderer.force_redraw();
                show.on_resize(size);
                dirty = true;
            }

            let now = Instant::now();
            if show.on_tick(now - last) {
                dirty = true;
            }
            last = now;

            if dirty {
                frame.clear();
                show.paint(&mut frame);
                self.renderer.render(&frame);
                self.renderer.flush()?;
                dirty = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyCode;

    struct Counter {
        keys: usize,
    }

    impl Show for Counter {
        fn on_key(&mut self, key: Key) -> Flow {
            self.keys += 1;
            if key.code == KeyCode::Char('q') {
                Flow::Quit
            } else {
                Flow::Continue
            }
        }

        fn on_tick(&mut self, _elapsed: Duration) -> bool {
            false
        }

        fn paint(&mut self, _frame: &mut FrameBuffer) {}
    }

    #[test]
    fn deliver_stops_at_quit() {
        let mut show = Counter { keys: 0 };
        let mut dirty = false;
        let keys = KeyDecoder::new().advance(b"abqcd");
        let flow = EventLoop::deliver(&mut show, keys, &mut dirty);
        assert_eq!(flow, Flow::Quit);
        assert_eq!(show.keys, 3);
        assert!(dirty);
    }

    #[test]
    fn default_tick_is_short() {
        let config = LoopConfig::default();
        assert!(config.tick <= Duration::from_millis(10));
    }
}
