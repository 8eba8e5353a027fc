//! Syntax module
//!
//! This module turns plain source text into a decoration list:
//! - Rule patterns and their outcomes
//! - Combining rule patterns into one scanning pattern
//! - The lexer engine and the language handler registry
//! - Built-in handlers for markup, CSS and common languages

mod builtin;
mod combine;
mod language;
mod lexer;
mod registry;
mod rules;
mod style;
mod tokens;

pub use combine::combine_prefix_patterns;
pub use language::{source_decorator, LanguageDefinition, LanguageTable, SourceOptions};
pub use lexer::{decorate, LanguageHandler, LexContext, Lexer};
pub use registry::{LanguageRegistry, DEFAULT_CODE, DEFAULT_MARKUP};
pub use rules::{LexRule, RuleOutcome, RulePattern};
pub use style::{normalize, spans, Decoration, Span};
pub use tokens::StyleClass;
