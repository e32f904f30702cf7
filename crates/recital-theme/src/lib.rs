//! # recital-theme — token classes and palettes
//!
//! ```text
//! lexer (tree-sitter captures, regex, prompts)
//!     │
//!     ▼
//! token.rs:  TokenClass, the shared vocabulary
//!     │
//!     ▼
//! theme.rs:  Theme maps each class to a Style, plus chrome styles
//!     │
//!     ▼
//! style.rs:  Style, resolved CellColors + Attr, ready to paint or export
//! ```

pub mod style;
pub mod theme;
pub mod token;

pub use style::Style;
pub use theme::{Theme, builtin_names, builtin_theme};
pub use token::TokenClass;
