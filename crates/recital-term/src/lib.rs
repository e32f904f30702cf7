// SPDX-License-Identifier: MIT
//
// recital-term — the terminal layer under recital's interactive player.
//
// Direct terminal control over ANSI escape sequences and raw termios: a
// cell grid to paint frames into, a differential renderer that sends only
// changed cells (a typing animation touches one cell per frame), raw mode
// with panic-safe restore, a key decoder, and a tick-driven loop that
// times the animations.

pub mod ansi;
pub mod buffer;
pub mod cell;
pub mod color;
pub mod diff;
pub mod event_loop;
pub mod input;
pub mod reader;
pub mod terminal;
