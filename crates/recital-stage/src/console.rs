//! Console session lexers.
//!
//! A session transcript mixes what was typed with what came back. Lines
//! that start with a prompt get a `Prompt` span followed by the inner
//! lexer's spans for the command. Everything else is `Output`, except
//! Python tracebacks, which run from the `Traceback (most recent call
//! last):` header through the first unindented line (the exception
//! message) and are classed `Traceback`.

use std::sync::Arc;

use recital_theme::TokenClass;

use crate::lexer::{Lexer, Span};

const TRACEBACK_HEADER: &str = "Traceback (most recent call last)";

pub struct ConsoleLexer {
    name: String,
    inner: Arc<dyn Lexer>,
    prompts: Vec<&'static str>,
    tracebacks: bool,
}

impl ConsoleLexer {
    /// Python REPL: `>>> ` and `... ` prompts, traceback blocks.
    #[must_use]
    pub fn python(name: impl Into<String>, inner: Arc<dyn Lexer>) -> Self {
        Self {
            name: name.into(),
            inner,
            prompts: vec![">>> ", "... "],
            tracebacks: true,
        }
    }

    /// Shell session: `$ ` and `# ` prompts.
    #[must_use]
    pub fn shell(name: impl Into<String>, inner: Arc<dyn Lexer>) -> Self {
        Self {
            name: name.into(),
            inner,
            prompts: vec!["$ ", "# "],
            tracebacks: false,
        }
    }

    /// Matching prompt of a line, if any. A prompt with nothing after it
    /// (`">>>"` on its own) still counts.
    fn prompt_of(&self, line: &str) -> Option<&'static str> {
        let bare = line.trim_end_matches(['\n', '\r']);
        self.prompts.iter().copied().find_map(|p| {
            if line.starts_with(p) {
                Some(p)
            } else if bare == p.trim_end() {
                Some(p.trim_end())
            } else {
                None
            }
        })
    }
}

impl Lexer for ConsoleLexer {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_console(&self) -> bool {
        true
    }

    fn tokenize(&self, source: &str) -> Vec<Span> {
        let mut spans = Vec::new();
        let mut in_traceback = false;

        for line in source.split_inclusive('\n') {
            if in_traceback {
                // Frames are indented; the first flush-left line is the
                // exception itself and closes the block.
                in_traceback = line.starts_with([' ', '\t']);
                spans.push(Span::new(line, TokenClass::Traceback));
            } else if let Some(prompt) = self.prompt_of(line) {
                spans.push(Span::new(prompt, TokenClass::Prompt));
                spans.extend(self.inner.tokenize(&line[prompt.len()..]));
            } else if self.tracebacks && line.starts_with(TRACEBACK_HEADER) {
                in_traceback = true;
                spans.push(Span::new(line, TokenClass::Traceback));
            } else {
                spans.push(Span::new(line, TokenClass::Output));
            }
        }
        spans
    }

    fn classify(&self, token: &str) -> TokenClass {
        match token {
            "prompt" => TokenClass::Prompt,
            "output" => TokenClass::Output,
            "traceback" => TokenClass::Traceback,
            other => self.inner.classify(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::PlainLexer;
    use pretty_assertions::assert_eq;

    fn repl() -> ConsoleLexer {
        ConsoleLexer::python("con", Arc::new(PlainLexer))
    }

    #[test]
    fn prompt_then_command_then_output() {
        let spans = repl().tokenize(">>> 1 + 1\n2\n");
        assert_eq!(
            spans,
            vec![
                Span::new(">>> ", TokenClass::Prompt),
                Span::text("1 + 1\n"),
                Span::new("2\n", TokenClass::Output),
            ]
        );
    }

    #[test]
    fn continuation_and_bare_prompts() {
        let spans = repl().tokenize("... pass\n>>>\n");
        assert_eq!(
            spans,
            vec![
                Span::new("... ", TokenClass::Prompt),
                Span::text("pass\n"),
                Span::new(">>>", TokenClass::Prompt),
                Span::text("\n"),
            ]
        );
    }

    #[test]
    fn traceback_block_ends_at_exception_line() {
        let src = "\
>>> 1/0
Traceback (most recent call last):
  File \"<stdin>\", line 1, in <module>
ZeroDivisionError: division by zero
>>> x
";
        let classes: Vec<_> = repl().tokenize(src).into_iter().map(|s| s.class).collect();
        assert_eq!(
            classes,
            vec![
                TokenClass::Prompt,
                TokenClass::Text,
                TokenClass::Traceback,
                TokenClass::Traceback,
                TokenClass::Traceback,
                TokenClass::Prompt,
                TokenClass::Text,
            ]
        );
    }

    #[test]
    fn shell_session() {
        let lexer = ConsoleLexer::shell("bash", Arc::new(PlainLexer));
        assert!(lexer.is_console());
        let spans = lexer.tokenize("$ ls\nREADME.md\n");
        assert_eq!(spans[0], Span::new("$ ", TokenClass::Prompt));
        assert_eq!(spans[2], Span::new("README.md\n", TokenClass::Output));
    }

    #[test]
    fn classify_console_names() {
        assert_eq!(repl().classify("prompt"), TokenClass::Prompt);
        assert_eq!(repl().classify("keyword"), TokenClass::Text);
    }
}
