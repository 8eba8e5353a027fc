//! Built-in language handlers
//!
//! Markup and CSS need bespoke rule sets; every other language is a
//! configuration of the generic source lexer, described in
//! `languages.toml`.

mod css;
mod markup;

use std::sync::Arc;

use super::language::LanguageTable;
use super::lexer::Lexer;
use super::registry::LanguageRegistry;
use super::rules::LexRule;
use super::tokens::StyleClass;
use crate::error::Result;

const LANGUAGES: &str = include_str!("languages.toml");

/// Parse the built-in language table
pub fn language_table() -> Result<LanguageTable> {
    LanguageTable::parse(LANGUAGES)
}

/// Register every built-in handler
pub fn register_defaults(registry: &mut LanguageRegistry) -> Result<()> {
    language_table()?.register_all(registry)?;

    registry.register(Arc::new(markup::markup_lexer()?), markup::MARKUP_EXTENSIONS);
    registry.register(Arc::new(markup::in_tag_lexer()?), &["in.tag"]);
    registry.register(Arc::new(markup::unquoted_value_lexer()?), &["uq.val"]);
    registry.register(Arc::new(css::css_lexer()?), &["css"]);
    registry.register(Arc::new(css::css_keyword_lexer()?), &["css-kw"]);
    registry.register(Arc::new(css::css_string_lexer()?), &["css-str"]);
    registry.register(Arc::new(regex_lexer()?), &["regex"]);
    Ok(())
}

/// Lexer styling a whole regex literal as a string
fn regex_lexer() -> Result<Lexer> {
    Lexer::new(vec![], vec![LexRule::style(StyleClass::String, r"^[\s\S]+")?])
}
