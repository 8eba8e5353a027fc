//! HTML/XML markup handlers
//!
//! `default-markup` splits a document into text, comments, declarations,
//! embedded script/style/processing-instruction regions, and tags. Tags
//! are handed to `in.tag`, which lexes attributes and hands event handler
//! and style attribute values on to the JavaScript and CSS handlers.

use crate::error::Result;
use crate::syntax::lexer::Lexer;
use crate::syntax::rules::LexRule;
use crate::syntax::tokens::StyleClass;

/// Extensions handled as markup
pub const MARKUP_EXTENSIONS: &[&str] = &["default-markup", "htm", "html", "mxml", "xhtml", "xml", "xsl"];

/// Lexer for whole markup documents
pub fn markup_lexer() -> Result<Lexer> {
    Lexer::new(
        vec![],
        vec![
            LexRule::style(StyleClass::Plain, r"^[^<?]+")?,
            LexRule::style(StyleClass::Declaration, r"^<!\w[^>]*(?:>|$)")?,
            LexRule::style(StyleClass::Comment, r"^<!--[\s\S]*?(?:-->|$)")?,
            // processing instructions and server-side blocks, language unknown
            LexRule::embed("", r"^<\?([\s\S]+?)(?:\?>|$)")?,
            LexRule::embed("", r"^<%([\s\S]+?)(?:%>|$)")?,
            LexRule::style(StyleClass::Punctuation, r"^(?:<[%?]|[%?]>)")?,
            LexRule::embed_i("", r"^<xmp\b[^>]*>([\s\S]+?)</xmp\b[^>]*>")?,
            LexRule::embed_i("js", r"^<script\b[^>]*>([\s\S]*?)(</script\b[^>]*>)")?,
            LexRule::embed_i("css", r"^<style\b[^>]*>([\s\S]*?)(</style\b[^>]*>)")?,
            LexRule::embed_i("in.tag", r"^(</?[a-z][^<>]*>)")?,
        ],
    )
}

/// Lexer for the inside of a single tag
pub fn in_tag_lexer() -> Result<Lexer> {
    Lexer::new(
        vec![
            LexRule::shortcut(StyleClass::Plain, r"^\s+", " \t\r\n")?,
            LexRule::shortcut(StyleClass::AttribValue, r#"^(?:"[^"]*"?|'[^']*'?)"#, "\"'")?,
        ],
        vec![
            LexRule::style_i(StyleClass::Tag, r"^^(?:</?[a-z](?:[\w.:-]*\w)?|/?>$)")?,
            // event handlers and styles come before plain attribute names
            LexRule::embed_i("js", r#"^on\w+\s*=\s*"([^"]+)""#)?,
            LexRule::embed_i("js", r"^on\w+\s*=\s*'([^']+)'")?,
            LexRule::embed_i("js", r#"^on\w+\s*=\s*([^"'>\s]+)"#)?,
            LexRule::embed_i("css", r#"^style\s*=\s*"([^"]+)""#)?,
            LexRule::embed_i("css", r"^style\s*=\s*'([^']+)'")?,
            LexRule::embed_i("css", r#"^style\s*=\s*([^"'>\s]+)"#)?,
            LexRule::style_i(StyleClass::AttribName, r"^[a-z](?:[\w:-]*\w)?")?,
            LexRule::embed("uq.val", r#"^=\s*([^>'"\s]*[^>'"\s/])"#)?,
            LexRule::style(StyleClass::Punctuation, r"^[=<>/]+")?,
        ],
    )
}

/// Lexer for an unquoted attribute value
pub fn unquoted_value_lexer() -> Result<Lexer> {
    Lexer::new(vec![], vec![LexRule::style(StyleClass::AttribValue, r"^[\s\S]+")?])
}
