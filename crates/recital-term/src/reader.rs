// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Stdin reader thread.
//
// `read(2)` on a terminal blocks, while the event loop has typewriter
// ticks to run. A background thread polls stdin with a short timeout,
// forwards whatever bytes arrive over a channel, and checks a stop flag
// between polls so dropping the reader never leaves a thread stuck in
// `read`.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

const CHUNK: usize = 1024;
const POLL_MS: i32 = 50;

/// Handle to the reader thread. Stops the thread on drop.
pub struct StdinReader {
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl StdinReader {
    /// Start reading. The channel closes on EOF or after `stop`.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn() -> io::Result<(Self, Receiver<Vec<u8>>)> {
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("recital-stdin".into())
            .spawn(move || pump(&tx, &flag))?;
        Ok((
            Self {
                handle: Some(handle),
                stop,
            },
            rx,
        ))
    }

    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for StdinReader {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(unix)]
fn pump(tx: &Sender<Vec<u8>>, stop: &AtomicBool) {
    let mut buf = [0u8; CHUNK];
    while !stop.load(Ordering::Relaxed) {
        let mut fds = libc::pollfd {
            fd: libc::STDIN_FILENO,
            events: libc::POLLIN,
            revents: 0,
        };
        let ready = unsafe { libc::poll(&raw mut fds, 1, POLL_MS) };
        if ready < 0 {
            if io::Error::last_os_error().kind() == io::ErrorKind::Interrupted {
                continue;
            }
            break;
        }
        if ready == 0 || fds.revents & libc::POLLIN == 0 {
            if fds.revents & (libc::POLLHUP | libc::POLLERR) != 0 {
                break;
            }
            continue;
        }
        let n = unsafe { libc::read(libc::STDIN_FILENO, buf.as_mut_ptr().cast(), CHUNK) };
        let Ok(n) = usize::try_from(n) else { break };
        if n == 0 || tx.send(buf[..n].to_vec()).is_err() {
            break;
        }
    }
}

#[cfg(not(unix))]
fn pump(tx: &Sender<Vec<u8>>, stop: &AtomicBool) {
    use std::io::Read;

    let mut buf = [0u8; CHUNK];
    let mut stdin = io::stdin();
    while !stop.load(Ordering::Relaxed) {
        match stdin.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if tx.send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
        }
    }
}
