//! Style classes for highlighted output
//!
//! This module defines the closed vocabulary of styles a lexer can
//! assign to a run of source text, and the CSS class each maps to.

/// Semantic style classes for highlighted spans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleClass {
    /// String literals ("..." or '...'), also regex literals
    String,
    /// Language keywords (if, else, return, etc.)
    Keyword,
    /// Comments (// or /* */ or #)
    Comment,
    /// Type names (FILE, vector, CamelCase identifiers)
    Type,
    /// Literal values (numbers, @-literals)
    Literal,
    /// Punctuation and operators
    Punctuation,
    /// Plain text, identifiers and whitespace
    Plain,
    /// Markup tag names and brackets
    Tag,
    /// Markup declarations (<!DOCTYPE ...>)
    Declaration,
    /// Embedded source whose language could not be lexed
    Source,
    /// Markup attribute names
    AttribName,
    /// Markup attribute values
    AttribValue,
}

impl StyleClass {
    /// Every style, in a stable order
    pub const ALL: [StyleClass; 12] = [
        StyleClass::String,
        StyleClass::Keyword,
        StyleClass::Comment,
        StyleClass::Type,
        StyleClass::Literal,
        StyleClass::Punctuation,
        StyleClass::Plain,
        StyleClass::Tag,
        StyleClass::Declaration,
        StyleClass::Source,
        StyleClass::AttribName,
        StyleClass::AttribValue,
    ];

    /// The CSS class name emitted for this style
    pub fn class_name(&self) -> &'static str {
        match self {
            StyleClass::String => "str",
            StyleClass::Keyword => "kwd",
            StyleClass::Comment => "com",
            StyleClass::Type => "typ",
            StyleClass::Literal => "lit",
            StyleClass::Punctuation => "pun",
            StyleClass::Plain => "pln",
            StyleClass::Tag => "tag",
            StyleClass::Declaration => "dec",
            StyleClass::Source => "src",
            StyleClass::AttribName => "atn",
            StyleClass::AttribValue => "atv",
        }
    }

    /// Parse a style from its CSS class name
    pub fn from_class_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|style| style.class_name() == name)
    }
}
