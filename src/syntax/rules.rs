//! Lexical rules for the prettifier
//!
//! This module defines the rule types a lexer is built from. Every rule
//! pattern is prefix-anchored: it only ever matches at the start of the
//! text handed to it, which is what lets many rules be unioned into a
//! single scanning pattern.

use regex::{Captures, Regex, RegexBuilder};

use super::tokens::StyleClass;
use crate::error::{PrettifyError, Result};

/// Regex source plus the flags it is compiled with
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RulePattern {
    /// Pattern source in `regex` crate syntax
    pub source: String,
    /// Whether letters match regardless of case
    pub ignore_case: bool,
}

impl RulePattern {
    /// Create a case-sensitive pattern
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            ignore_case: false,
        }
    }

    /// Create a case-insensitive pattern
    pub fn ignore_case(source: &str) -> Self {
        Self {
            source: source.to_string(),
            ignore_case: true,
        }
    }

    /// Compile this pattern on its own
    pub fn compile(&self) -> Result<Regex> {
        Ok(RegexBuilder::new(&self.source)
            .case_insensitive(self.ignore_case)
            .build()?)
    }
}

/// What a matching rule does with its token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    /// Style the whole token
    Style(StyleClass),
    /// Hand a capture group to another language's handler.
    ///
    /// `lang` of `None` means the language is inferred from the content.
    Embedded { lang: Option<String>, group: usize },
}

impl RuleOutcome {
    /// Embed capture group 1 in the named language
    pub fn embed(lang: &str) -> Self {
        RuleOutcome::Embedded {
            lang: if lang.is_empty() { None } else { Some(lang.to_string()) },
            group: 1,
        }
    }
}

/// A single lexical rule
///
/// Matches a token prefix and decides its style, or hands part of it
/// to another language.
#[derive(Debug)]
pub struct LexRule {
    /// What to do with a token this rule matches
    pub outcome: RuleOutcome,
    /// Source pattern, kept for combining
    pub pattern: RulePattern,
    /// Compiled pattern
    pub regex: Regex,
    /// First characters that route a token straight to this rule
    pub shortcut: Option<String>,
}

impl LexRule {
    /// Create a new rule, rejecting patterns that are not prefix-anchored
    pub fn new(outcome: RuleOutcome, pattern: RulePattern, shortcut: Option<&str>) -> Result<Self> {
        if !pattern.source.starts_with('^') {
            return Err(PrettifyError::Unanchored(pattern.source));
        }
        let regex = pattern.compile()?;
        Ok(Self {
            outcome,
            pattern,
            regex,
            shortcut: shortcut.map(str::to_string),
        })
    }

    /// Rule that styles whatever `source` matches
    pub fn style(style: StyleClass, source: &str) -> Result<Self> {
        Self::new(RuleOutcome::Style(style), RulePattern::new(source), None)
    }

    /// Case-insensitive variant of [`LexRule::style`]
    pub fn style_i(style: StyleClass, source: &str) -> Result<Self> {
        Self::new(RuleOutcome::Style(style), RulePattern::ignore_case(source), None)
    }

    /// Rule tried first for tokens starting with one of `chars`
    pub fn shortcut(style: StyleClass, source: &str, chars: &str) -> Result<Self> {
        Self::new(RuleOutcome::Style(style), RulePattern::new(source), Some(chars))
    }

    /// Rule whose first capture group is source in language `lang`
    pub fn embed(lang: &str, source: &str) -> Result<Self> {
        Self::new(RuleOutcome::embed(lang), RulePattern::new(source), None)
    }

    /// Case-insensitive variant of [`LexRule::embed`]
    pub fn embed_i(lang: &str, source: &str) -> Result<Self> {
        Self::new(RuleOutcome::embed(lang), RulePattern::ignore_case(source), None)
    }

    /// Match this rule against the start of a token
    pub fn captures<'t>(&self, token: &'t str) -> Option<Captures<'t>> {
        self.regex.captures(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_rule_matches_prefix() {
        let rule = LexRule::style(StyleClass::Literal, r"^\d+").unwrap();
        let caps = rule.captures("123abc").unwrap();
        assert_eq!(caps.get(0).unwrap().as_str(), "123");
        assert!(rule.captures("abc123").is_none());
    }

    #[test]
    fn test_unanchored_rule_rejected() {
        let err = LexRule::style(StyleClass::Literal, r"\d+").unwrap_err();
        assert!(matches!(err, PrettifyError::Unanchored(_)));
    }

    #[test]
    fn test_malformed_rule_rejected() {
        let err = LexRule::style(StyleClass::Literal, r"^(\d+").unwrap_err();
        assert!(matches!(err, PrettifyError::Regex(_)));
    }

    #[test]
    fn test_ignore_case_rule() {
        let rule = LexRule::style_i(StyleClass::Keyword, r"^select\b").unwrap();
        assert!(rule.captures("SELECT *").is_some());
        assert!(rule.captures("Select").is_some());
    }

    #[test]
    fn test_embed_outcome() {
        let rule = LexRule::embed("js", r"^<script>([\s\S]*?)</script>").unwrap();
        assert_eq!(
            rule.outcome,
            RuleOutcome::Embedded { lang: Some("js".to_string()), group: 1 }
        );
        assert_eq!(RuleOutcome::embed(""), RuleOutcome::Embedded { lang: None, group: 1 });
    }
}
