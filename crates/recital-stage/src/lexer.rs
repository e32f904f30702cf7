//! Lexers — the tokenizer capability behind the content model.
//!
//! A [`Lexer`] turns source text into classified [`Span`]s and, for
//! dialects it understands structurally, reports the named units (functions,
//! classes, impl blocks) that `Content::extract_subset` can cut out.
//!
//! Lexers are resolved by name through an explicit [`LexerRegistry`]. The
//! built-in set:
//!
//! | name    | what                                            |
//! |---------|-------------------------------------------------|
//! | `rust`  | tree-sitter Rust                                |
//! | `py3`   | tree-sitter Python                              |
//! | `con`   | Python REPL session (`>>> `, `... `, tracebacks)|
//! | `bash`  | shell session (`$ ` prompts)                    |
//! | `shell` | shell script                                    |
//! | `plain` | no highlighting                                 |
//!
//! Custom lexers register under any name and win over the built-ins.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use recital_theme::TokenClass;
use tracing::warn;

use crate::console::ConsoleLexer;
use crate::error::{Result, StageError};
use crate::shell::ShellLexer;
use crate::syntax::TreeSitterLexer;

// ---------------------------------------------------------------------------
// Span / SourceUnit
// ---------------------------------------------------------------------------

/// A run of source text with one token class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub class: TokenClass,
}

impl Span {
    #[must_use]
    pub fn new(text: impl Into<String>, class: TokenClass) -> Self {
        Self {
            text: text.into(),
            class,
        }
    }

    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(text, TokenClass::Text)
    }
}

/// A named structural unit of a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// Dotted path, e.g. `"Parser.parse"` for a method in a class.
    pub path: String,
    /// 0-based first row, decorators and attributes included.
    pub start_row: usize,
    /// 0-based last row, inclusive.
    pub end_row: usize,
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

/// Tokenizer capability.
pub trait Lexer: Send + Sync {
    /// The name the lexer was built as.
    fn name(&self) -> &str;

    /// Console lexers mark prompts; typewriter animations type only the
    /// prompted lines of their output.
    fn is_console(&self) -> bool {
        false
    }

    /// Split `source` into spans whose texts concatenate back to `source`.
    fn tokenize(&self, source: &str) -> Vec<Span>;

    /// Map one of this lexer's raw token names to a class.
    fn classify(&self, token: &str) -> TokenClass {
        TokenClass::from_capture(token)
    }

    /// Named units in `source`. Empty for lexers without structure.
    fn units(&self, _source: &str) -> Vec<SourceUnit> {
        Vec::new()
    }
}

impl fmt::Debug for dyn Lexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lexer({})", self.name())
    }
}

/// No highlighting: the whole source is one `Text` span.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainLexer;

impl Lexer for PlainLexer {
    fn name(&self) -> &str {
        "plain"
    }

    fn tokenize(&self, source: &str) -> Vec<Span> {
        if source.is_empty() {
            Vec::new()
        } else {
            vec![Span::text(source)]
        }
    }

    fn classify(&self, _token: &str) -> TokenClass {
        TokenClass::Text
    }
}

// ---------------------------------------------------------------------------
// LexerRegistry
// ---------------------------------------------------------------------------

/// Lexers by name.
#[derive(Default)]
pub struct LexerRegistry {
    entries: Vec<(String, Arc<dyn Lexer>)>,
}

impl fmt::Debug for LexerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(name, _)| name))
            .finish()
    }
}

impl LexerRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in lexers. A grammar that fails to load is logged and
    /// left out rather than failing the whole registry.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        reg.register("plain", Arc::new(PlainLexer));
        match ShellLexer::new() {
            Ok(lexer) => reg.register("shell", Arc::new(lexer)),
            Err(e) => warn!("shell lexer unavailable: {e}"),
        }

        match TreeSitterLexer::rust() {
            Ok(lexer) => reg.register("rust", Arc::new(lexer)),
            Err(e) => warn!("rust grammar unavailable: {e}"),
        }
        match TreeSitterLexer::python() {
            Ok(lexer) => {
                let python: Arc<dyn Lexer> = Arc::new(lexer);
                reg.register("con", Arc::new(ConsoleLexer::python("con", Arc::clone(&python))));
                reg.register("py3", python);
            }
            Err(e) => warn!("python grammar unavailable: {e}"),
        }
        if let Some(shell) = reg.get("shell") {
            reg.register("bash", Arc::new(ConsoleLexer::shell("bash", shell)));
        }
        reg
    }

    /// Add a lexer, replacing any previous one with the same name.
    pub fn register(&mut self, name: impl Into<String>, lexer: Arc<dyn Lexer>) {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = lexer;
        } else {
            self.entries.push((name, lexer));
        }
    }

    /// Look a lexer up by name or common alias.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Lexer>> {
        let canonical = canonical_name(name);
        self.entries
            .iter()
            .find(|(n, _)| n == name || n == canonical)
            .map(|(_, l)| Arc::clone(l))
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// The lexer for `source`: `name` if given, otherwise detected.
    ///
    /// # Errors
    ///
    /// [`StageError::Lex`] if `name` is unknown, or if no name was given
    /// and detection finds nothing.
    pub fn resolve(&self, name: Option<&str>, source: &str) -> Result<Arc<dyn Lexer>> {
        let name = match name {
            Some(n) => n,
            None => Self::detect(source).ok_or_else(|| {
                StageError::Lex("could not detect a lexer, name one explicitly".into())
            })?,
        };
        self.get(name)
            .ok_or_else(|| StageError::Lex(format!("unknown lexer `{name}`")))
    }

    /// Guess a lexer name from the text itself.
    ///
    /// In order: a `>>> ` prompt line means a Python session; a shebang
    /// naming python or sh/bash picks the script lexer; a `$ ` prompt line
    /// means a shell session; then Rust and Python keywords at line start.
    #[must_use]
    pub fn detect(source: &str) -> Option<&'static str> {
        let starts_line = |marker: &str| {
            source.starts_with(marker) || source.contains(&format!("\n{marker}"))
        };

        if starts_line(">>> ") {
            return Some("con");
        }
        if let Some(shebang) = source.lines().next().filter(|l| l.starts_with("#!")) {
            if shebang.contains("python") {
                return Some("py3");
            }
            if shebang.contains("/sh") || shebang.contains("/bash") || shebang.contains(" bash") {
                return Some("shell");
            }
        }
        if starts_line("$ ") {
            return Some("bash");
        }
        if ["fn ", "pub fn ", "use ", "impl ", "let ", "struct ", "mod "]
            .iter()
            .any(|m| starts_line(m))
        {
            return Some("rust");
        }
        if ["def ", "import ", "from ", "class ", "print("]
            .iter()
            .any(|m| starts_line(m))
        {
            return Some("py3");
        }
        None
    }

    /// Guess a lexer name from a file extension.
    #[must_use]
    pub fn detect_path(path: &Path) -> Option<&'static str> {
        match path.extension()?.to_str()? {
            "rs" => Some("rust"),
            "py" | "pyw" => Some("py3"),
            "sh" | "bash" => Some("shell"),
            "txt" => Some("plain"),
            _ => None,
        }
    }
}

fn canonical_name(name: &str) -> &str {
    match name {
        "python" | "python3" | "py" => "py3",
        "pycon" | "console" => "con",
        "rs" => "rust",
        "sh" => "shell",
        "text" | "txt" | "none" => "plain",
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Upper;

    impl Lexer for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn tokenize(&self, source: &str) -> Vec<Span> {
            vec![Span::new(source.to_uppercase(), TokenClass::Keyword)]
        }
    }

    // ── detection ──

    #[test]
    fn detect_repl_before_everything() {
        assert_eq!(LexerRegistry::detect(">>> x = 1\n1\n"), Some("con"));
        assert_eq!(LexerRegistry::detect("# session\n>>> import os\n"), Some("con"));
    }

    #[test]
    fn detect_shebangs() {
        assert_eq!(LexerRegistry::detect("#!/usr/bin/env python3\nx=1\n"), Some("py3"));
        assert_eq!(LexerRegistry::detect("#!/bin/bash\nls\n"), Some("shell"));
        assert_eq!(LexerRegistry::detect("#!/usr/bin/env bash\nls\n"), Some("shell"));
    }

    #[test]
    fn detect_shell_session() {
        assert_eq!(LexerRegistry::detect("$ ls -la\ntotal 0\n"), Some("bash"));
    }

    #[test]
    fn detect_languages_by_keywords() {
        assert_eq!(LexerRegistry::detect("use std::io;\n\nfn main() {}\n"), Some("rust"));
        assert_eq!(LexerRegistry::detect("import os\n\ndef f():\n    pass\n"), Some("py3"));
    }

    #[test]
    fn detect_gives_up() {
        assert_eq!(LexerRegistry::detect("lorem ipsum\ndolor sit amet\n"), None);
        assert_eq!(LexerRegistry::detect(""), None);
    }

    #[test]
    fn detect_by_extension() {
        assert_eq!(LexerRegistry::detect_path(Path::new("a/b.rs")), Some("rust"));
        assert_eq!(LexerRegistry::detect_path(Path::new("x.py")), Some("py3"));
        assert_eq!(LexerRegistry::detect_path(Path::new("Makefile")), None);
    }

    // ── registry ──

    #[test]
    fn builtins_are_registered() {
        let reg = LexerRegistry::with_builtins();
        let names: Vec<_> = reg.names().collect();
        for expected in ["plain", "shell", "rust", "py3", "con", "bash"] {
            assert!(names.contains(&expected), "missing {expected}");
        }
        assert!(reg.get("con").unwrap().is_console());
        assert!(!reg.get("py3").unwrap().is_console());
    }

    #[test]
    fn aliases_resolve() {
        let reg = LexerRegistry::with_builtins();
        assert_eq!(reg.get("python").unwrap().name(), "py3");
        assert_eq!(reg.get("rs").unwrap().name(), "rust");
    }

    #[test]
    fn resolve_unknown_name_is_lex_error() {
        let reg = LexerRegistry::with_builtins();
        let err = reg.resolve(Some("cobol"), "").unwrap_err();
        assert!(matches!(err, StageError::Lex(_)));
    }

    #[test]
    fn resolve_undetectable_is_lex_error() {
        let reg = LexerRegistry::with_builtins();
        assert!(matches!(
            reg.resolve(None, "just prose"),
            Err(StageError::Lex(_))
        ));
        assert_eq!(reg.resolve(Some("plain"), "just prose").unwrap().name(), "plain");
    }

    #[test]
    fn custom_lexer_replaces_builtin() {
        let mut reg = LexerRegistry::with_builtins();
        reg.register("plain", Arc::new(Upper));
        let lexer = reg.get("plain").unwrap();
        assert_eq!(lexer.name(), "upper");
        assert_eq!(lexer.tokenize("ab"), vec![Span::new("AB", TokenClass::Keyword)]);
        assert_eq!(reg.names().filter(|n| *n == "plain").count(), 1);
    }

    #[test]
    fn plain_lexer_is_one_span() {
        assert_eq!(PlainLexer.tokenize("a\nb"), vec![Span::text("a\nb")]);
        assert!(PlainLexer.tokenize("").is_empty());
    }
}
