// SPDX-License-Identifier: MIT
//
// recital — animated code presentations in the terminal.
//
// This is the binary that wires the crates together:
//
//   recital-term  → raw mode, frame buffer, diff renderer, keys, event loop
//   recital-theme → token classes and the styles they paint with
//   recital-stage → content, viewports, actions and the playback engine
//
// A presentation flows like this:
//
//   file → lexer → content → script (stage + actions)
//   keys/ticks → player → engine → viewports → paint → terminal
//
// Logs never touch the terminal; see logging.rs for where they go.

mod cli;
mod config;
mod logging;
mod player;
mod script;

use std::process::ExitCode;

fn main() -> ExitCode {
    let _guard = logging::init();
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("recital: {e:#}");
            ExitCode::FAILURE
        }
    }
}
