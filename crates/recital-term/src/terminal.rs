// SPDX-License-Identifier: MIT
//
// Terminal ownership: raw mode, alternate screen, restore on exit.
//
// Safety: termios, ioctl(TIOCGWINSZ), isatty and the panic-path write(2)
// are POSIX calls with no safe wrapper in std. Each unsafe block does one
// call on a zeroed or previously-read struct.
#![allow(unsafe_code)]
//
// `Screen::take` puts the terminal into presentation mode and hands back a
// guard. Dropping the guard, returning from `main` with an error, or
// panicking mid-frame all leave the user's shell usable: the panic hook
// writes a fixed restore sequence straight to fd 1 (the stdout lock may be
// held by the frame being flushed) and puts termios back before the
// default hook prints the message.

use std::io::{self, Write};
use std::sync::{Mutex, Once};

use crate::ansi;

// ─── Size ────────────────────────────────────────────────────────────────────

/// Terminal size in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub cols: u16,
    pub rows: u16,
}

impl Size {
    /// Used when the size cannot be queried (pipes, CI).
    pub const FALLBACK: Self = Self { cols: 80, rows: 24 };
}

/// Query the size of the terminal on stdout.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &raw mut ws) };
    (rc == 0 && ws.ws_col > 0 && ws.ws_row > 0).then_some(Size {
        cols: ws.ws_col,
        rows: ws.ws_row,
    })
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

/// Whether stdin is a terminal.
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Panic Restore ───────────────────────────────────────────────────────────

#[cfg(unix)]
static SAVED_TERMIOS: Mutex<Option<libc::termios>> = Mutex::new(None);

#[cfg(not(unix))]
static SAVED_TERMIOS: Mutex<Option<()>> = Mutex::new(None);

static HOOK: Once = Once::new();

/// End sync, reset SGR, show cursor, leave the alternate screen.
const RESTORE: &[u8] = b"\x1b[?2026l\x1b[0m\x1b[?25h\x1b[?1049l";

fn install_panic_hook() {
    HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            write_restore_raw();
            restore_saved_termios();
            previous(info);
        }));
    });
}

fn write_restore_raw() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            RESTORE.as_ptr().cast::<libc::c_void>(),
            RESTORE.len(),
        );
    }
    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(RESTORE);
    }
}

fn restore_saved_termios() {
    let Ok(mut saved) = SAVED_TERMIOS.lock() else {
        return;
    };
    #[cfg(unix)]
    if let Some(original) = saved.take() {
        unsafe {
            let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const original);
        }
    }
    #[cfg(not(unix))]
    {
        saved.take();
    }
}

#[cfg(unix)]
fn enter_raw_mode() -> io::Result<()> {
    if !is_tty() {
        return Ok(());
    }
    unsafe {
        let mut t: libc::termios = std::mem::zeroed();
        if libc::tcgetattr(libc::STDIN_FILENO, &raw mut t) != 0 {
            return Err(io::Error::last_os_error());
        }
        if let Ok(mut saved) = SAVED_TERMIOS.lock() {
            saved.get_or_insert(t);
        }
        libc::cfmakeraw(&raw mut t);
        t.c_cc[libc::VMIN] = 1;
        t.c_cc[libc::VTIME] = 0;
        if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const t) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn enter_raw_mode() -> io::Result<()> {
    Ok(())
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Guard for presentation mode. The terminal is restored on drop.
///
/// ```no_run
/// use recital_term::terminal::Screen;
///
/// let screen = Screen::take()?;
/// // ... play the presentation ...
/// drop(screen);
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct Screen {
    size: Size,
    released: bool,
}

impl Screen {
    /// Enter raw mode and the alternate screen, hide the cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if termios or the terminal write fails.
    pub fn take() -> io::Result<Self> {
        install_panic_hook();
        enter_raw_mode()?;

        let stdout = io::stdout();
        let mut out = stdout.lock();
        ansi::enter_alt_screen(&mut out)?;
        ansi::cursor_hide(&mut out)?;
        ansi::clear_screen(&mut out)?;
        out.flush()?;

        Ok(Self {
            size: get_size().unwrap_or(Size::FALLBACK),
            released: false,
        })
    }

    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Re-query after a SIGWINCH.
    pub fn refresh_size(&mut self) -> Size {
        if let Some(size) = get_size() {
            self.size = size;
        }
        self.size
    }

    /// Restore the terminal now instead of at drop.
    ///
    /// # Errors
    ///
    /// Returns an error if writing the restore sequence fails.
    pub fn release(&mut self) -> io::Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        let stdout = io::stdout();
        let mut out = stdout.lock();
        out.write_all(RESTORE)?;
        out.flush()?;
        drop(out);
        restore_saved_termios();
        Ok(())
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        let _ = self.release();
    }
}
