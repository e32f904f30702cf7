//! A small regex lexer for shell commands and scripts.
//!
//! Good enough to colour what people type in a demo: the command word,
//! flags, strings, variables, comments, and the operators that start a new
//! command.

use regex::Regex;
use recital_theme::TokenClass;

use crate::lexer::{Lexer, Span};

const KEYWORDS: &[&str] = &[
    "if", "then", "else", "elif", "fi", "for", "while", "until", "do", "done", "case", "esac",
    "in", "function", "return", "export", "local",
];

const PATTERN: &str = r#"(?x)
    (?P<ws>\s+)
  | (?P<comment>\#[^\n]*)
  | (?P<string>"(?:[^"\\\n]|\\.)*"?|'[^'\n]*'?)
  | (?P<var>\$\{[^}\n]*\}?|\$\w+|\$[?\#@*!$0-9])
  | (?P<op>\|\||&&|[|&;<>()])
  | (?P<word>[^\s|&;<>()"'$]+)
"#;

pub struct ShellLexer {
    re: Regex,
}

impl ShellLexer {
    /// # Errors
    ///
    /// Whatever the regex engine reports for the token pattern.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            re: Regex::new(PATTERN)?,
        })
    }
}

fn classify_word(word: &str, command_position: bool) -> TokenClass {
    if KEYWORDS.contains(&word) {
        TokenClass::Keyword
    } else if word.contains('=') && command_position {
        TokenClass::Variable
    } else if command_position {
        TokenClass::Function
    } else if word.starts_with('-') {
        TokenClass::Attribute
    } else if word.chars().all(|c| c.is_ascii_digit()) {
        TokenClass::Number
    } else {
        TokenClass::Text
    }
}

impl Lexer for ShellLexer {
    fn name(&self) -> &str {
        "shell"
    }

    fn tokenize(&self, source: &str) -> Vec<Span> {
        let mut spans: Vec<Span> = Vec::new();
        let mut push = |text: &str, class: TokenClass| match spans.last_mut() {
            Some(last) if last.class == class => last.text.push_str(text),
            _ => spans.push(Span::new(text, class)),
        };

        let mut command_position = true;
        let mut cursor = 0;
        for caps in self.re.captures_iter(source) {
            let Some(m) = caps.get(0) else { continue };
            if m.start() > cursor {
                push(&source[cursor..m.start()], TokenClass::Text);
            }
            cursor = m.end();
            let text = m.as_str();

            let class = if caps.name("ws").is_some() {
                if text.contains('\n') {
                    command_position = true;
                }
                TokenClass::Text
            } else if caps.name("comment").is_some() {
                TokenClass::Comment
            } else if caps.name("string").is_some() {
                command_position = false;
                TokenClass::String
            } else if caps.name("var").is_some() {
                command_position = false;
                TokenClass::Variable
            } else if caps.name("op").is_some() {
                command_position = !matches!(text, ">" | "<");
                TokenClass::Operator
            } else {
                let class = classify_word(text, command_position);
                // Keywords and assignments keep the next word in command
                // position (`if grep`, `FOO=1 make`).
                command_position =
                    matches!(class, TokenClass::Keyword | TokenClass::Variable);
                class
            };
            push(text, class);
        }
        if cursor < source.len() {
            push(&source[cursor..], TokenClass::Text);
        }
        spans
    }

    fn classify(&self, token: &str) -> TokenClass {
        match token {
            "comment" => TokenClass::Comment,
            "string" => TokenClass::String,
            "var" => TokenClass::Variable,
            "op" => TokenClass::Operator,
            "command" => TokenClass::Function,
            "flag" => TokenClass::Attribute,
            _ => TokenClass::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn classes(src: &str) -> Vec<(String, TokenClass)> {
        ShellLexer::new()
            .unwrap()
            .tokenize(src)
            .into_iter()
            .filter(|s| !s.text.trim().is_empty())
            .map(|s| (s.text.trim().to_string(), s.class))
            .collect()
    }

    #[test]
    fn command_flags_and_args() {
        assert_eq!(
            classes("ls -la src"),
            vec![
                ("ls".to_string(), TokenClass::Function),
                ("-la".to_string(), TokenClass::Attribute),
                ("src".to_string(), TokenClass::Text),
            ]
        );
    }

    #[test]
    fn blanks_join_the_following_word() {
        let spans = ShellLexer::new().unwrap().tokenize("ls src");
        assert_eq!(spans.last().unwrap(), &Span::new(" src", TokenClass::Text));
    }

    #[test]
    fn pipes_start_new_commands() {
        let c = classes("cat log | grep err");
        assert_eq!(c[2], ("|".to_string(), TokenClass::Operator));
        assert_eq!(c[3], ("grep".to_string(), TokenClass::Function));
    }

    #[test]
    fn strings_vars_comments() {
        let c = classes("echo \"hi $USER\" $HOME # greet");
        assert_eq!(c[1], ("\"hi $USER\"".to_string(), TokenClass::String));
        assert_eq!(c[2], ("$HOME".to_string(), TokenClass::Variable));
        assert_eq!(c[3], ("# greet".to_string(), TokenClass::Comment));
    }

    #[test]
    fn assignment_then_command() {
        let c = classes("RUST_LOG=debug cargo run");
        assert_eq!(c[0].1, TokenClass::Variable);
        assert_eq!(c[1], ("cargo".to_string(), TokenClass::Function));
    }

    #[test]
    fn reassembles_source() {
        let src = "for f in *.rs; do\n  wc -l $f\ndone\n";
        let joined: String = ShellLexer::new()
            .unwrap()
            .tokenize(src)
            .iter()
            .map(|s| s.text.as_str())
            .collect();
        assert_eq!(joined, src);
    }
}
