//! # recital-stage — the presentation core
//!
//! Everything between a source file and the frames on screen:
//!
//! - **[`lexer`]**, **[`syntax`]**, **[`console`]**, **[`shell`]** — source text to classified spans
//! - **[`content`]** — lexed source as lines, with structural subsets
//! - **[`viewport`]** — windows onto lines: edits, highlights, folds, focus
//! - **[`action`]** — the script vocabulary: one scripted step each
//! - **[`animation`]** — actions expanded into instant edits or typed beats
//! - **[`engine`]** — plays a script: stepping, skipping, undo, timing
//! - **[`view`]** — viewports painted into a frame buffer
//! - **[`export`]** — viewports as ANSI, HTML or RTF text
//!
//! ```text
//! source ──lexer──▶ Content ──attach──▶ Viewport ◀──edits── Engine ◀── [Action]
//!                                          │                  │
//!                                          ▼                  ▼
//!                                    view / export         Renderer
//! ```

pub mod action;
pub mod animation;
pub mod console;
pub mod content;
pub mod engine;
pub mod error;
pub mod export;
pub mod lexer;
pub mod settings;
pub mod shell;
pub mod syntax;
pub mod view;
pub mod viewport;

pub use action::{Action, ActionKind, TransitionBuilder, TransitionSource};
pub use content::{Content, Line, LineEdit};
pub use engine::{CancelToken, Engine, EngineState, Renderer, Suspension};
pub use error::{Result, StageError};
pub use lexer::{Lexer, LexerRegistry, SourceUnit, Span};
pub use settings::Settings;
pub use viewport::{Edit, Stage, Viewport, ViewportId};
