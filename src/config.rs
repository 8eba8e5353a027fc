//! Configuration file support
//!
//! Loads settings from ~/.prettify.conf (or %USERPROFILE%\.prettify.conf on Windows)
//!
//! Format: simple key=value pairs, one per line
//! Lines starting with # are comments
//!
//! Example:
//! ```text
//! # prettify configuration
//! tab-width = 4
//! line-numbers = true
//! first-line = 10
//! legacy-line-breaks = false
//! languages = /home/me/.prettify-languages.toml
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::error::Result;
use crate::recombine::HighlightOptions;
use crate::syntax::{LanguageRegistry, LanguageTable};

/// Configuration settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Tab width for expansion
    pub tab_width: usize,
    /// Whether to number lines
    pub line_numbers: bool,
    /// Number of the first line when numbering
    pub first_line: usize,
    /// Whether to pad line breaks for old rendering engines
    pub legacy_line_breaks: bool,
    /// Extra language table, registered ahead of the built-in languages
    pub languages: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tab_width: 8,
            line_numbers: false,
            first_line: 1,
            legacy_line_breaks: false,
            languages: None,
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        #[cfg(windows)]
        {
            std::env::var("USERPROFILE")
                .ok()
                .map(|home| PathBuf::from(home).join(".prettify.conf"))
        }

        #[cfg(not(windows))]
        {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".prettify.conf"))
        }
    }

    /// Load configuration from file
    pub fn load() -> Self {
        let mut config = Config::default();

        if let Some(path) = Self::config_path() {
            if let Ok(contents) = fs::read_to_string(&path) {
                debug!(path = %path.display(), "loading configuration");
                let settings = Self::parse(&contents);
                config.apply(&settings);
            }
        }

        config
    }

    /// Parse config file contents into key-value pairs
    fn parse(contents: &str) -> HashMap<String, String> {
        let mut settings = HashMap::new();

        for line in contents.lines() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            // Parse key = value
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim().to_lowercase();
                let value = value.trim().to_string();
                settings.insert(key, value);
            }
        }

        settings
    }

    /// Apply settings from parsed config
    fn apply(&mut self, settings: &HashMap<String, String>) {
        if let Some(value) = settings.get("tab-width") {
            if let Ok(n) = value.parse::<usize>() {
                self.tab_width = n.clamp(1, 16); // Between 1 and 16
            }
        }

        if let Some(value) = settings.get("line-numbers") {
            self.line_numbers = parse_bool(value);
        }

        if let Some(value) = settings.get("first-line") {
            if let Ok(n) = value.parse::<usize>() {
                self.first_line = n.max(1);
            }
        }

        if let Some(value) = settings.get("legacy-line-breaks") {
            self.legacy_line_breaks = parse_bool(value);
        }

        if let Some(value) = settings.get("languages") {
            self.languages = (!value.is_empty()).then(|| PathBuf::from(value));
        }
    }

    /// Rendering options these settings describe
    pub fn highlight_options(&self) -> HighlightOptions {
        HighlightOptions {
            tab_width: self.tab_width,
            line_numbers: self.line_numbers.then_some(self.first_line),
            preformatted: true,
            legacy_line_breaks: self.legacy_line_breaks,
        }
    }

    /// Build the language registry, including the extra language table if one is set
    pub fn registry(&self) -> Result<LanguageRegistry> {
        match &self.languages {
            Some(path) => {
                let table = LanguageTable::parse(&fs::read_to_string(path)?)?;
                debug!(path = %path.display(), languages = table.languages.len(), "loaded language table");
                LanguageRegistry::with_language_table(table)
            }
            None => LanguageRegistry::with_defaults(),
        }
    }
}

/// Parse a boolean value from string
fn parse_bool(s: &str) -> bool {
    let s = s.to_lowercase();
    matches!(s.as_str(), "true" | "yes" | "on" | "1")
}
