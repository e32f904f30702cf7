//! Tree-sitter lexers.
//!
//! Each lexer owns a grammar and its bundled highlight query. Tokenizing
//! parses the whole source, runs the query, and assigns every byte the
//! class of the first capture that covers it (the bundled queries list
//! their most specific patterns first). Runs of equal class become spans.
//!
//! The same tree also answers structural questions: which rows belong to
//! function `foo` or method `Bar.baz`.

use recital_theme::TokenClass;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor, Tree};

use crate::error::{Result, StageError};
use crate::lexer::{Lexer, SourceUnit, Span};

/// Node kinds that define a named unit, with the field holding the name.
type UnitKinds = &'static [(&'static str, &'static str)];

const RUST_UNITS: UnitKinds = &[
    ("function_item", "name"),
    ("struct_item", "name"),
    ("enum_item", "name"),
    ("trait_item", "name"),
    ("mod_item", "name"),
    ("impl_item", "type"),
];

const PYTHON_UNITS: UnitKinds = &[
    ("function_definition", "name"),
    ("class_definition", "name"),
];

pub struct TreeSitterLexer {
    name: &'static str,
    language: Language,
    query: Query,
    /// Class for each capture index of `query`.
    capture_classes: Vec<TokenClass>,
    units: UnitKinds,
}

impl TreeSitterLexer {
    fn build(
        name: &'static str,
        language: Language,
        highlights: &str,
        units: UnitKinds,
    ) -> Result<Self> {
        let query = Query::new(&language, highlights)
            .map_err(|e| StageError::Lex(format!("{name} highlight query: {e}")))?;
        let capture_classes = query
            .capture_names()
            .iter()
            .map(|n| TokenClass::from_capture(n))
            .collect();
        Ok(Self {
            name,
            language,
            query,
            capture_classes,
            units,
        })
    }

    /// # Errors
    ///
    /// [`StageError::Lex`] if the bundled query does not compile against
    /// the linked grammar.
    pub fn rust() -> Result<Self> {
        Self::build(
            "rust",
            tree_sitter_rust::LANGUAGE.into(),
            tree_sitter_rust::HIGHLIGHTS_QUERY,
            RUST_UNITS,
        )
    }

    /// # Errors
    ///
    /// [`StageError::Lex`] if the bundled query does not compile against
    /// the linked grammar.
    pub fn python() -> Result<Self> {
        Self::build(
            "py3",
            tree_sitter_python::LANGUAGE.into(),
            tree_sitter_python::HIGHLIGHTS_QUERY,
            PYTHON_UNITS,
        )
    }

    fn parse(&self, source: &str) -> Option<Tree> {
        let mut parser = Parser::new();
        parser.set_language(&self.language).ok()?;
        parser.parse(source, None)
    }

    /// Name of a unit node, generics stripped (`impl Foo<T>` is `Foo`).
    fn unit_name(&self, node: Node<'_>, source: &str) -> Option<String> {
        let field = self
            .units
            .iter()
            .find(|(kind, _)| *kind == node.kind())
            .map(|(_, field)| *field)?;
        let text = node
            .child_by_field_name(field)?
            .utf8_text(source.as_bytes())
            .ok()?;
        let bare = text.split('<').next().unwrap_or(text).trim();
        Some(bare.to_string())
    }

    fn collect_units(&self, node: Node<'_>, source: &str, scope: &str, out: &mut Vec<SourceUnit>) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            // Decorators belong to the unit they decorate.
            let (target, start_row) = if child.kind() == "decorated_definition" {
                match child.child_by_field_name("definition") {
                    Some(def) => (def, child.start_position().row),
                    None => continue,
                }
            } else {
                (child, child.start_position().row)
            };

            if let Some(name) = self.unit_name(target, source) {
                let path = if scope.is_empty() {
                    name
                } else {
                    format!("{scope}.{name}")
                };
                out.push(SourceUnit {
                    path: path.clone(),
                    start_row: leading_attributes_start(target, start_row),
                    end_row: target.end_position().row,
                });
                self.collect_units(target, source, &path, out);
            } else {
                self.collect_units(child, source, scope, out);
            }
        }
    }
}

/// Rust `#[attr]` lines directly above an item belong to it.
fn leading_attributes_start(node: Node<'_>, start_row: usize) -> usize {
    let mut row = start_row;
    let mut prev = node.prev_sibling();
    while let Some(p) = prev {
        if p.kind() != "attribute_item" || p.end_position().row + 1 < row {
            break;
        }
        row = p.start_position().row;
        prev = p.prev_sibling();
    }
    row
}

impl Lexer for TreeSitterLexer {
    fn name(&self) -> &str {
        self.name
    }

    fn tokenize(&self, source: &str) -> Vec<Span> {
        if source.is_empty() {
            return Vec::new();
        }
        let Some(tree) = self.parse(source) else {
            return vec![Span::text(source)];
        };

        let mut classes: Vec<Option<TokenClass>> = vec![None; source.len()];
        let mut cursor = QueryCursor::new();
        let mut captures = cursor.captures(&self.query, tree.root_node(), source.as_bytes());
        while let Some((m, idx)) = captures.next() {
            let capture = m.captures[*idx];
            let class = self.capture_classes[capture.index as usize];
            let range = capture.node.byte_range();
            for slot in &mut classes[range.start.min(source.len())..range.end.min(source.len())] {
                slot.get_or_insert(class);
            }
        }

        let mut spans: Vec<Span> = Vec::new();
        for (i, ch) in source.char_indices() {
            let class = classes[i].unwrap_or_default();
            match spans.last_mut() {
                Some(last) if last.class == class => last.text.push(ch),
                _ => spans.push(Span::new(ch.to_string(), class)),
            }
        }
        spans
    }

    fn units(&self, source: &str) -> Vec<SourceUnit> {
        let mut out = Vec::new();
        if let Some(tree) = self.parse(source) {
            self.collect_units(tree.root_node(), source, "", &mut out);
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn joined(spans: &[Span]) -> String {
        spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// Class of the span covering the first occurrence of `needle`.
    fn class_of(spans: &[Span], needle: &str) -> Option<TokenClass> {
        let src = joined(spans);
        let at = src.find(needle)?;
        let mut offset = 0;
        spans.iter().find_map(|s| {
            offset += s.text.len();
            (offset > at).then_some(s.class)
        })
    }

    // ── tokenize ──

    #[test]
    fn rust_spans_reassemble_source() {
        let lexer = TreeSitterLexer::rust().unwrap();
        let src = "fn main() {\n    let s = \"hé\"; // note\n}\n";
        let spans = lexer.tokenize(src);
        assert_eq!(joined(&spans), src);
    }

    #[test]
    fn rust_keywords_and_comments() {
        let lexer = TreeSitterLexer::rust().unwrap();
        let spans = lexer.tokenize("fn main() {} // done\n");
        assert_eq!(class_of(&spans, "fn"), Some(TokenClass::Keyword));
        assert_eq!(class_of(&spans, "// done"), Some(TokenClass::Comment));
    }

    #[test]
    fn python_strings_and_defs() {
        let lexer = TreeSitterLexer::python().unwrap();
        let src = "def greet():\n    return 'hi'\n";
        let spans = lexer.tokenize(src);
        assert_eq!(joined(&spans), src);
        assert_eq!(class_of(&spans, "def"), Some(TokenClass::Keyword));
        assert_eq!(class_of(&spans, "'hi'"), Some(TokenClass::String));
    }

    #[test]
    fn empty_source_has_no_spans() {
        assert!(TreeSitterLexer::python().unwrap().tokenize("").is_empty());
    }

    // ── units ──

    #[test]
    fn python_units_with_methods_and_decorators() {
        let lexer = TreeSitterLexer::python().unwrap();
        let src = "\
import os

@cache
def top():
    pass

class Shape:
    def area(self):
        return 0
";
        let units = lexer.units(src);
        let paths: Vec<_> = units.iter().map(|u| u.path.as_str()).collect();
        assert_eq!(paths, vec!["top", "Shape", "Shape.area"]);
        assert_eq!((units[0].start_row, units[0].end_row), (2, 4));
        assert_eq!((units[2].start_row, units[2].end_row), (7, 8));
    }

    #[test]
    fn rust_units_include_impl_methods() {
        let lexer = TreeSitterLexer::rust().unwrap();
        let src = "\
struct Point<T> { x: T }

impl<T> Point<T> {
    #[must_use]
    fn x(&self) -> &T {
        &self.x
    }
}
";
        let units = lexer.units(src);
        let paths: Vec<_> = units.iter().map(|u| u.path.as_str()).collect();
        assert_eq!(paths, vec!["Point", "Point", "Point.x"]);
        let method = &units[2];
        assert_eq!((method.start_row, method.end_row), (3, 6));
    }
}
