// SPDX-License-Identifier: MIT
//
// Script building: source files to a stage and an action list.
//
// A plain source is typed out in one go. A console session is typed one
// prompt block at a time with a wait between blocks, so the presenter
// decides when the next command appears. A highlight request comes last,
// after its own wait. With a split, the second file plays in a lower
// viewport once the first is done.
//
//   ┌──────────────────────────────┐
//   │ main                         │  ← first file
//   ├──────────────────────────────┤
//   │ lower                        │  ← --split file
//   └──────────────────────────────┘

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use recital_stage::{Action, Content, LexerRegistry, Line, Stage, Viewport, ViewportId};
use recital_theme::TokenClass;

/// How a file is turned into content.
#[derive(Debug, Clone, Default)]
pub struct SourceOptions {
    pub lexer: Option<String>,
    pub start_line: Option<usize>,
    pub subset: Option<String>,
}

/// Read and lex `path`.
pub fn load(path: &Path, opts: &SourceOptions, registry: &LexerRegistry) -> Result<Content> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let lexer = opts
        .lexer
        .as_deref()
        .or_else(|| LexerRegistry::detect_path(path));
    let mut content = Content::load(&source, lexer, registry)
        .with_context(|| format!("failed to lex {}", path.display()))?;
    if let Some(selector) = &opts.subset {
        content = content
            .extract_subset(selector)
            .with_context(|| format!("failed to cut `{selector}` from {}", path.display()))?;
    }
    if let Some(n) = opts.start_line {
        content.set_starting_line_number(n);
    }
    Ok(content)
}

/// A stage plus the actions that play on it.
#[derive(Debug)]
pub struct Script {
    pub stage: Stage,
    pub actions: Vec<Action>,
}

/// Split console lines into prompt blocks. A block starts at a primary
/// prompt; continuation prompts and output stay with it.
fn prompt_blocks(lines: &[Line]) -> Vec<Vec<Line>> {
    let mut blocks: Vec<Vec<Line>> = Vec::new();
    for line in lines {
        let starts_block = line
            .spans
            .first()
            .is_some_and(|s| s.class == TokenClass::Prompt && !s.text.starts_with("..."));
        match blocks.last_mut() {
            Some(block) if !starts_block => block.push(line.clone()),
            _ => blocks.push(vec![line.clone()]),
        }
    }
    blocks
}

/// The actions that type `content` into `target`.
pub fn typing_actions(target: ViewportId, content: &Content) -> Vec<Action> {
    if !content.lexer().is_console() {
        return vec![Action::append_typewriter(target, content.lines().to_vec())];
    }
    let mut actions = Vec::new();
    for (i, block) in prompt_blocks(content.lines()).into_iter().enumerate() {
        if i > 0 {
            actions.push(Action::wait());
        }
        actions.push(Action::append_typewriter(target, block));
    }
    actions
}

/// An empty viewport numbered like `content`.
fn viewport_for(name: &str, content: &Content, height: usize, numbers: bool) -> Viewport {
    let mut vp = Viewport::new(name, height).with_numbers(numbers);
    vp.set_lines(Vec::new(), Some(content.starting_line_number()));
    vp
}

/// Build the script for `primary`, and `split` below it if given.
pub fn build(
    primary: &Content,
    split: Option<&Content>,
    highlight: Option<&str>,
    height: usize,
    numbers: bool,
) -> Result<Script> {
    let mut stage = Stage::new();
    let rows = if split.is_some() { height / 2 } else { height };
    let main = stage.add(viewport_for("main", primary, rows, numbers));

    let mut actions = typing_actions(main, primary);
    if let Some(spec) = highlight {
        actions.push(Action::wait());
        actions.push(
            Action::highlight(main, spec, true)
                .with_context(|| format!("bad highlight `{spec}`"))?,
        );
    }
    if let Some(lower) = split {
        let id = stage.add(viewport_for("lower", lower, height - rows, numbers));
        actions.push(Action::wait());
        actions.extend(typing_actions(id, lower));
    }
    tracing::info!(
        viewports = stage.len(),
        actions = actions.len(),
        "script built"
    );
    Ok(Script { stage, actions })
}

/// The script `export` runs: everything appears at once, then the
/// highlight.
pub fn build_static(content: &Content, highlight: Option<&str>, numbers: bool) -> Result<Script> {
    let mut stage = Stage::new();
    let main = stage.add(viewport_for("main", content, content.len().max(1), numbers));
    let mut actions = vec![Action::append(main, content.lines().to_vec())];
    if let Some(spec) = highlight {
        actions.push(
            Action::highlight(main, spec, true)
                .with_context(|| format!("bad highlight `{spec}`"))?,
        );
    }
    Ok(Script { stage, actions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use recital_stage::ActionKind;

    fn registry() -> LexerRegistry {
        LexerRegistry::with_builtins()
    }

    // ── typing ──

    #[test]
    fn plain_source_is_one_append() {
        let content = Content::load("a\nb\n", Some("plain"), &registry()).unwrap();
        let actions = typing_actions(ViewportId(0), &content);
        assert_eq!(actions.len(), 1);
        assert!(actions[0].typewriter);
    }

    #[test]
    fn console_source_waits_between_prompts() {
        let session = ">>> x = 1\n>>> for i in range(2):\n...     print(i)\n0\n1\n";
        let content = Content::load(session, Some("con"), &registry()).unwrap();
        let actions = typing_actions(ViewportId(0), &content);
        let shape: Vec<&str> = actions
            .iter()
            .map(|a| match &a.kind {
                ActionKind::Wait => "wait",
                ActionKind::Append { .. } => "append",
                _ => "other",
            })
            .collect();
        assert_eq!(shape, vec!["append", "wait", "append"]);
        let ActionKind::Append { lines, .. } = &actions[2].kind else {
            unreachable!()
        };
        assert_eq!(lines.len(), 4);
    }

    // ── building ──

    #[test]
    fn highlight_comes_after_a_wait() {
        let content = Content::load("a\nb\nc\n", Some("plain"), &registry()).unwrap();
        let script = build(&content, None, Some("2-3"), 20, true).unwrap();
        assert_eq!(script.actions.len(), 3);
        assert!(script.actions[1].is_wait());
        assert!(matches!(
            &script.actions[2].kind,
            ActionKind::Highlight { rows, on: true, .. } if rows == &vec![2, 3]
        ));
    }

    #[test]
    fn bad_highlight_spec_fails_the_build() {
        let content = Content::load("a\n", Some("plain"), &registry()).unwrap();
        assert!(build(&content, None, Some("x-"), 20, true).is_err());
    }

    #[test]
    fn split_adds_lower_viewport() {
        let a = Content::load("a\n", Some("plain"), &registry()).unwrap();
        let b = Content::load("b\n", Some("plain"), &registry()).unwrap();
        let script = build(&a, Some(&b), None, 21, false).unwrap();
        assert_eq!(script.stage.len(), 2);
        let lower = script.stage.find("lower").unwrap();
        assert_eq!(script.stage.get(lower).unwrap().height(), 11);
        assert_eq!(script.actions.last().unwrap().targets(), vec![lower]);
    }

    #[test]
    fn viewport_starts_at_content_numbering() {
        let mut content = Content::load("a\n", Some("plain"), &registry()).unwrap();
        content.set_starting_line_number(40);
        let script = build(&content, None, None, 5, true).unwrap();
        let vp = script.stage.get(ViewportId(0)).unwrap();
        assert_eq!(vp.starting_line_number(), 40);
    }

    // ── loading ──

    #[test]
    fn load_applies_subset_and_start_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.py");
        fs::write(&path, "import os\n\ndef one():\n    return 1\n\ndef two():\n    return 2\n")
            .unwrap();
        let opts = SourceOptions {
            subset: Some("two".into()),
            ..SourceOptions::default()
        };
        let content = load(&path, &opts, &registry()).unwrap();
        assert_eq!(content.starting_line_number(), 6);
        assert_eq!(content.texts(), vec!["def two():", "    return 2"]);

        let opts = SourceOptions {
            start_line: Some(100),
            ..SourceOptions::default()
        };
        assert_eq!(load(&path, &opts, &registry()).unwrap().starting_line_number(), 100);
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load(Path::new("/no/such/file.rs"), &SourceOptions::default(), &registry())
            .unwrap_err();
        assert!(err.to_string().contains("/no/such/file.rs"));
    }
}
