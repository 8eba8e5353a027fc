//! Lexer engine
//!
//! A [`Lexer`] splits source text into tokens with one combined pattern,
//! then styles each token with the first rule that claims it. Rules whose
//! outcome is an embedded language hand the captured region to the
//! handler registered for that language.

use std::collections::HashMap;

use regex::Regex;
use tracing::{debug, trace};

use super::combine::combine_prefix_patterns;
use super::registry::LanguageRegistry;
use super::rules::{LexRule, RuleOutcome, RulePattern};
use super::style::Decoration;
use super::tokens::StyleClass;
use crate::error::Result;

/// Nesting limit for embedded regions
const MAX_EMBED_DEPTH: usize = 24;

/// Anything that can decorate a run of source text
pub trait LanguageHandler: Send + Sync {
    /// Append decorations for `source`, whose first byte sits at `base_pos`.
    fn decorate(&self, ctx: &mut LexContext<'_>, source: &str, base_pos: usize);
}

/// State shared by all handlers while decorating one source text
pub struct LexContext<'r> {
    registry: &'r LanguageRegistry,
    decorations: Vec<Decoration>,
    depth: usize,
}

impl<'r> LexContext<'r> {
    /// Create an empty context resolving embedded languages in `registry`
    pub fn new(registry: &'r LanguageRegistry) -> Self {
        Self {
            registry,
            decorations: Vec::new(),
            depth: 0,
        }
    }

    /// Record that `style` starts at `pos`
    pub fn push(&mut self, pos: usize, style: StyleClass) {
        self.decorations.push(Decoration::new(pos, style));
    }

    /// Decorate a non-empty region with `handler`
    pub fn append(&mut self, handler: &dyn LanguageHandler, source: &str, base_pos: usize) {
        if source.is_empty() {
            return;
        }
        if self.depth >= MAX_EMBED_DEPTH {
            debug!(base_pos, "embedding too deep, leaving region unlexed");
            self.push(base_pos, StyleClass::Source);
            return;
        }
        self.depth += 1;
        handler.decorate(self, source, base_pos);
        self.depth -= 1;
    }

    /// Decorate a region with the handler for `lang`, inferring it when absent
    pub fn append_embedded(&mut self, lang: Option<&str>, source: &str, base_pos: usize) {
        if source.is_empty() {
            return;
        }
        let registry = self.registry;
        match registry.resolve(lang, source) {
            Ok(handler) => self.append(handler, source, base_pos),
            Err(err) => {
                debug!(%err, "no handler for embedded region");
                self.push(base_pos, StyleClass::Source);
            }
        }
    }

    /// Finish, returning the decorations in the order they were produced
    pub fn into_decorations(self) -> Vec<Decoration> {
        self.decorations
    }
}

/// Decorate `source` from scratch with `handler`
pub fn decorate(handler: &dyn LanguageHandler, registry: &LanguageRegistry, source: &str) -> Vec<Decoration> {
    let mut ctx = LexContext::new(registry);
    ctx.append(handler, source, 0);
    ctx.into_decorations()
}

/// How a single token was classified
enum Classified<'a> {
    Style(StyleClass),
    Embedded {
        lang: Option<&'a str>,
        start: usize,
        end: usize,
    },
}

/// A rule-driven lexer
pub struct Lexer {
    /// Shortcut rules followed by fallthrough rules
    rules: Vec<LexRule>,
    /// Index of the first fallthrough rule
    fallthrough: usize,
    /// First character -> rule index
    shortcuts: HashMap<char, usize>,
    /// Union of every rule pattern plus a single-character catch-all
    tokenizer: Regex,
}

impl Lexer {
    /// Build a lexer.
    ///
    /// Shortcut rules are consulted by a token's first character; the
    /// fallthrough rules are tried in order for everything else.
    pub fn new(shortcut_rules: Vec<LexRule>, fallthrough_rules: Vec<LexRule>) -> Result<Self> {
        let fallthrough = shortcut_rules.len();
        let mut rules = shortcut_rules;
        rules.extend(fallthrough_rules);

        let mut shortcuts = HashMap::new();
        let mut patterns: Vec<RulePattern> = Vec::with_capacity(rules.len() + 1);
        for (idx, rule) in rules.iter().enumerate() {
            if let Some(chars) = &rule.shortcut {
                // the first rule declared for a character keeps it
                for c in chars.chars() {
                    shortcuts.entry(c).or_insert(idx);
                }
            }
            if !patterns.contains(&rule.pattern) {
                patterns.push(rule.pattern.clone());
            }
        }
        patterns.push(RulePattern::new(r"^[\s\S]"));
        let tokenizer = combine_prefix_patterns(&patterns)?;
        trace!(pattern = tokenizer.as_str(), "built tokenizer");

        Ok(Self {
            rules,
            fallthrough,
            shortcuts,
            tokenizer,
        })
    }

    /// Byte offset where the token starting at `pos` ends
    fn token_end(&self, source: &str, pos: usize) -> usize {
        match self.tokenizer.find_at(source, pos) {
            Some(m) if m.start() == pos && m.end() > pos => m.end(),
            _ => pos + source[pos..].chars().next().map_or(1, char::len_utf8),
        }
    }

    fn classify<'a>(&'a self, token: &str) -> Classified<'a> {
        let shortcut = token.chars().next().and_then(|c| self.shortcuts.get(&c));
        let (rule, caps) = match shortcut {
            Some(&idx) => {
                let rule = &self.rules[idx];
                (rule, rule.captures(token))
            }
            None => {
                let found = self.rules[self.fallthrough..]
                    .iter()
                    .find_map(|rule| rule.captures(token).map(|caps| (rule, caps)));
                match found {
                    Some((rule, caps)) => (rule, Some(caps)),
                    None => return Classified::Style(StyleClass::Plain),
                }
            }
        };

        match &rule.outcome {
            RuleOutcome::Style(style) => Classified::Style(*style),
            RuleOutcome::Embedded { lang, group } => match caps.as_ref().and_then(|c| c.get(*group)) {
                Some(m) => Classified::Embedded {
                    lang: lang.as_deref(),
                    start: m.start(),
                    end: m.end(),
                },
                // the group did not take part, so there is nothing to recurse into
                None => Classified::Style(StyleClass::Source),
            },
        }
    }
}

impl LanguageHandler for Lexer {
    fn decorate(&self, ctx: &mut LexContext<'_>, source: &str, base_pos: usize) {
        ctx.push(base_pos, StyleClass::Plain);
        let mut cache: HashMap<&str, StyleClass> = HashMap::new();
        let mut pos = 0;

        while pos < source.len() {
            let token_start = pos;
            pos = self.token_end(source, pos);
            let token = &source[token_start..pos];

            if let Some(&style) = cache.get(token) {
                ctx.push(base_pos + token_start, style);
                continue;
            }

            match self.classify(token) {
                Classified::Style(style) => {
                    cache.insert(token, style);
                    ctx.push(base_pos + token_start, style);
                }
                Classified::Embedded { lang, start, end } => {
                    let at = base_pos + token_start;
                    ctx.append(self, &token[..start], at);
                    ctx.append_embedded(lang, &token[start..end], at + start);
                    ctx.append(self, &token[end..], at + end);
                }
            }
        }
    }
}
