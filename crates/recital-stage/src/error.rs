//! Errors raised by the presentation core.
//!
//! Every failure is reported at the point it is detected and passed to the
//! caller untouched. The only silent recovery anywhere in the crate is
//! clearing a viewport's focus when its line is removed.

/// A failure in loading, editing, scripting or playing a presentation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StageError {
    /// No lexer could be resolved for a source.
    #[error("no lexer for source: {0}")]
    Lex(String),

    /// A line or position outside what the content or action allows.
    #[error("line {index} out of range ({bounds})")]
    Range { index: i64, bounds: String },

    /// A row outside a viewport's current bounds.
    #[error("row {row} outside viewport bounds 0..={len}")]
    Bounds { row: usize, len: usize },

    /// An action or script that is malformed before it ever runs.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A structured-subset selector that matched nothing.
    #[error("no unit named `{0}` in source")]
    NotFound(String),
}

impl StageError {
    pub(crate) fn range(index: impl TryInto<i64>, bounds: impl Into<String>) -> Self {
        Self::Range {
            index: index.try_into().unwrap_or(i64::MAX),
            bounds: bounds.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StageError>;
