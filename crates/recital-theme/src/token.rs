//! Token classes — the vocabulary shared by lexers and palettes.
//!
//! Lexers reduce whatever their tokenizer produces (tree-sitter capture
//! names, regex matches, console prompt detection) to one of these classes.
//! Palettes map each class to a display style. Neither side knows about
//! the other's details.

/// Semantic class of a run of source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TokenClass {
    /// Anything without a more specific class.
    #[default]
    Text,
    Keyword,
    Function,
    Type,
    String,
    Number,
    Comment,
    Operator,
    Punctuation,
    Variable,
    Constant,
    Builtin,
    Property,
    Attribute,
    /// A console prompt such as `>>> ` or `$ `.
    Prompt,
    /// Program output in a console session.
    Output,
    /// A traceback block in a console session.
    Traceback,
}

impl TokenClass {
    /// Every class, in declaration order.
    pub const ALL: [Self; 17] = [
        Self::Text,
        Self::Keyword,
        Self::Function,
        Self::Type,
        Self::String,
        Self::Number,
        Self::Comment,
        Self::Operator,
        Self::Punctuation,
        Self::Variable,
        Self::Constant,
        Self::Builtin,
        Self::Property,
        Self::Attribute,
        Self::Prompt,
        Self::Output,
        Self::Traceback,
    ];

    /// Classes emitted in one piece by typewriter animations rather than
    /// character by character.
    #[must_use]
    pub const fn is_continuous(self) -> bool {
        matches!(self, Self::Prompt | Self::Output | Self::Traceback)
    }

    /// Map a tree-sitter highlight capture name (`"function.method"`,
    /// `"string.special"`, ...) to a class.
    ///
    /// Dotted names fall back to their first segment, so a query that uses
    /// a capture we have never seen still gets a sensible class.
    #[must_use]
    pub fn from_capture(name: &str) -> Self {
        match name {
            "function.builtin" | "variable.builtin" | "type.builtin" => return Self::Builtin,
            "constant.builtin" => return Self::Constant,
            "punctuation.special" => return Self::Operator,
            _ => {}
        }
        let head = name.split('.').next().unwrap_or(name);
        match head {
            "keyword" | "conditional" | "repeat" | "include" | "exception" => Self::Keyword,
            "function" | "method" | "constructor" => Self::Function,
            "type" | "class" => Self::Type,
            "string" | "escape" | "char" => Self::String,
            "number" | "float" | "boolean" => Self::Number,
            "comment" => Self::Comment,
            "operator" => Self::Operator,
            "punctuation" | "delimiter" => Self::Punctuation,
            "variable" | "parameter" | "label" => Self::Variable,
            "constant" => Self::Constant,
            "property" | "field" => Self::Property,
            "attribute" | "decorator" => Self::Attribute,
            _ => Self::Text,
        }
    }

    /// Short stable name, used as a CSS class suffix in HTML export.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Keyword => "keyword",
            Self::Function => "function",
            Self::Type => "type",
            Self::String => "string",
            Self::Number => "number",
            Self::Comment => "comment",
            Self::Operator => "operator",
            Self::Punctuation => "punctuation",
            Self::Variable => "variable",
            Self::Constant => "constant",
            Self::Builtin => "builtin",
            Self::Property => "property",
            Self::Attribute => "attribute",
            Self::Prompt => "prompt",
            Self::Output => "output",
            Self::Traceback => "traceback",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn capture_heads() {
        assert_eq!(TokenClass::from_capture("keyword"), TokenClass::Keyword);
        assert_eq!(TokenClass::from_capture("function.method"), TokenClass::Function);
        assert_eq!(TokenClass::from_capture("string.special"), TokenClass::String);
        assert_eq!(TokenClass::from_capture("punctuation.bracket"), TokenClass::Punctuation);
        assert_eq!(TokenClass::from_capture("constructor"), TokenClass::Function);
    }

    #[test]
    fn capture_specials() {
        assert_eq!(TokenClass::from_capture("function.builtin"), TokenClass::Builtin);
        assert_eq!(TokenClass::from_capture("constant.builtin"), TokenClass::Constant);
    }

    #[test]
    fn unknown_capture_is_text() {
        assert_eq!(TokenClass::from_capture("embedded"), TokenClass::Text);
        assert_eq!(TokenClass::from_capture(""), TokenClass::Text);
    }

    #[test]
    fn continuous_classes() {
        let continuous: Vec<_> = TokenClass::ALL
            .into_iter()
            .filter(|c| c.is_continuous())
            .collect();
        assert_eq!(
            continuous,
            vec![TokenClass::Prompt, TokenClass::Output, TokenClass::Traceback]
        );
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = TokenClass::ALL.iter().map(|c| c.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), TokenClass::ALL.len());
    }
}
