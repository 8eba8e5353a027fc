//! Language handler registry
//!
//! Maps language tags and file extensions to the handler that lexes
//! them. The first handler registered for an extension keeps it.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{trace, warn};

use super::builtin;
use super::language::LanguageTable;
use super::lexer::LanguageHandler;
use crate::error::{PrettifyError, Result};

/// Handler used for untagged source that looks like markup
pub const DEFAULT_MARKUP: &str = "default-markup";
/// Handler used for any other untagged source
pub const DEFAULT_CODE: &str = "default-code";

/// Extension -> handler mapping
pub struct LanguageRegistry {
    handlers: HashMap<String, Arc<dyn LanguageHandler>>,
}

impl LanguageRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Create a registry with the built-in handlers
    pub fn with_defaults() -> Result<Self> {
        let mut registry = Self::new();
        builtin::register_defaults(&mut registry)?;
        Ok(registry)
    }

    /// Create a registry holding `table`'s languages ahead of the built-ins.
    ///
    /// Since the first registration wins, extensions defined in `table`
    /// shadow built-in ones.
    pub fn with_language_table(mut table: LanguageTable) -> Result<Self> {
        table.inherit_keywords(&builtin::language_table()?);
        let mut registry = Self::new();
        table.register_all(&mut registry)?;
        builtin::register_defaults(&mut registry)?;
        Ok(registry)
    }

    /// Bind `handler` to each extension not already taken
    pub fn register(&mut self, handler: Arc<dyn LanguageHandler>, extensions: &[&str]) {
        for &ext in extensions {
            if self.handlers.contains_key(ext) {
                warn!(extension = ext, "cannot override language handler");
                continue;
            }
            self.handlers.insert(ext.to_string(), Arc::clone(&handler));
        }
    }

    /// Check whether an extension has a handler
    pub fn contains(&self, ext: &str) -> bool {
        self.handlers.contains_key(ext)
    }

    /// Find the handler for `ext`, or infer one from the source text
    pub fn resolve(&self, ext: Option<&str>, source: &str) -> Result<&dyn LanguageHandler> {
        let key = match ext {
            Some(ext) if self.handlers.contains_key(ext) => ext,
            _ => {
                let key = if source.trim_start().starts_with('<') {
                    DEFAULT_MARKUP
                } else {
                    DEFAULT_CODE
                };
                trace!(requested = ?ext, inferred = key, "inferring language");
                key
            }
        };
        self.handlers
            .get(key)
            .map(|handler| handler.as_ref())
            .ok_or_else(|| PrettifyError::NoHandler(key.to_string()))
    }

    /// List registered extensions
    pub fn extensions(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.handlers.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}
