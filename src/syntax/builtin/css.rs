//! CSS handlers
//!
//! Property names are handed to `css-kw` and `url(...)` bodies to
//! `css-str`, so both get a uniform style regardless of their content.

use crate::error::Result;
use crate::syntax::lexer::Lexer;
use crate::syntax::rules::LexRule;
use crate::syntax::tokens::StyleClass;

const IDENT: &str = r"^-?(?:[_a-z]|\\[\da-f]+ ?)(?:[_a-z\d\-]|\\[\da-f]+ ?)*";

/// Lexer for stylesheets
pub fn css_lexer() -> Result<Lexer> {
    Lexer::new(
        vec![LexRule::shortcut(StyleClass::Plain, r"^[ \t\r\n\f]+", " \t\r\n\x0C")?],
        vec![
            LexRule::style(StyleClass::String, r#"^"(?:[^\n\r\f\\"]|\\(?:\r\n?|\n|\f)|\\[\s\S])*""#)?,
            LexRule::style(StyleClass::String, r"^'(?:[^\n\r\f\\']|\\(?:\r\n?|\n|\f)|\\[\s\S])*'")?,
            LexRule::embed_i("css-str", r#"^url\(([^)"']+)\)"#)?,
            LexRule::style_i(
                StyleClass::Keyword,
                r"^(?:url|rgb|!important|@import|@page|@media|@charset|inherit)\b",
            )?,
            // a property name is an identifier followed by a colon
            LexRule::embed_i("css-kw", r"^(-?(?:[_a-z]|\\[0-9a-f]+ ?)(?:[_a-z0-9\-]|\\[0-9a-f]+ ?)*)\s*:")?,
            LexRule::style(StyleClass::Comment, r"^/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")?,
            LexRule::style(StyleClass::Comment, r"^(?:<!--|-->)")?,
            LexRule::style_i(StyleClass::Literal, r"^(?:\d+|\d*\.\d+)(?:%|[a-z]+)?")?,
            LexRule::style_i(StyleClass::Literal, r"^#(?:[0-9a-f]{3}){1,2}\b")?,
            LexRule::style_i(StyleClass::Plain, IDENT)?,
            LexRule::style(StyleClass::Punctuation, r#"^[^\s\w'"]+"#)?,
        ],
    )
}

/// Lexer for property names
pub fn css_keyword_lexer() -> Result<Lexer> {
    Lexer::new(vec![], vec![LexRule::style_i(StyleClass::Keyword, IDENT)?])
}

/// Lexer for unquoted `url(...)` bodies
pub fn css_string_lexer() -> Result<Lexer> {
    Lexer::new(vec![], vec![LexRule::style(StyleClass::String, r#"^[^)"']+"#)?])
}
