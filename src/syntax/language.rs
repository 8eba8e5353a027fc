//! Language definitions for the generic source lexer
//!
//! Most programming languages differ only in which lexical features
//! they use (comment and string dialects) and in their keyword lists.
//! A [`LanguageDefinition`] names those features and
//! [`source_decorator`] turns them into a [`Lexer`].
//!
//! Definitions are data, loaded from TOML:
//!
//! ```toml
//! [keywords]
//! flow = "break continue do else for if return while"
//!
//! [[language]]
//! name = "python"
//! extensions = ["py", "python"]
//! keyword-sets = ["flow"]
//! keywords = "def lambda"
//! hash-comments = true
//! triple-quoted-strings = true
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;

use super::lexer::Lexer;
use super::registry::LanguageRegistry;
use super::rules::{LexRule, RuleOutcome, RulePattern};
use super::tokens::StyleClass;
use crate::error::{PrettifyError, Result};

/// Which lexical features a generic source lexer recognises
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SourceOptions {
    /// Python style ''' and """ strings
    pub triple_quoted_strings: bool,
    /// Strings may span lines; backquoted strings too
    pub multi_line_strings: bool,
    /// C# style @"..." strings
    pub verbatim_strings: bool,
    /// `#` starts a comment
    pub hash_comments: bool,
    /// `###` opens a block comment (needs `hash_comments`)
    pub block_hash_comments: bool,
    /// `//` and `/* */` comments
    pub c_style_comments: bool,
    /// `/regex/` literals after operators and keywords
    pub regex_literals: bool,
    /// Regex literals may span lines (needs `regex_literals`)
    pub multi_line_regex_literals: bool,
    /// Prefix-anchored pattern matching type names
    pub types: Option<String>,
    /// Whitespace or comma separated keywords
    pub keywords: String,
}

/// A named language built on the generic source lexer
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LanguageDefinition {
    /// Language name, used in diagnostics
    pub name: String,
    /// Extensions and tags this language is registered under
    pub extensions: Vec<String>,
    /// Named keyword sets from the table's `[keywords]` section
    #[serde(default)]
    pub keyword_sets: Vec<String>,
    /// Lexical features
    #[serde(flatten)]
    pub options: SourceOptions,
}

/// A parsed language table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LanguageTable {
    /// Keyword set name -> keywords
    #[serde(default)]
    pub keywords: BTreeMap<String, String>,
    /// Language definitions, in registration order
    #[serde(default, rename = "language")]
    pub languages: Vec<LanguageDefinition>,
}

impl LanguageTable {
    /// Parse a table from TOML text
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Make `other`'s keyword sets available where this table lacks them
    pub fn inherit_keywords(&mut self, other: &LanguageTable) {
        for (name, words) in &other.keywords {
            self.keywords.entry(name.clone()).or_insert_with(|| words.clone());
        }
    }

    /// Options for `lang` with its keyword sets expanded into `keywords`
    pub fn resolved_options(&self, lang: &LanguageDefinition) -> Result<SourceOptions> {
        let mut words: Vec<&str> = Vec::new();
        for set in &lang.keyword_sets {
            let list = self
                .keywords
                .get(set)
                .ok_or_else(|| PrettifyError::UnknownKeywordSet(set.clone()))?;
            words.extend(split_keywords(list));
        }
        words.extend(split_keywords(&lang.options.keywords));

        let mut seen = std::collections::HashSet::new();
        words.retain(|w| seen.insert(*w));

        Ok(SourceOptions {
            keywords: words.join(" "),
            ..lang.options.clone()
        })
    }

    /// Build and register a lexer for every language in the table
    pub fn register_all(&self, registry: &mut LanguageRegistry) -> Result<()> {
        for lang in &self.languages {
            let options = self.resolved_options(lang)?;
            let lexer = source_decorator(&options)?;
            let extensions: Vec<&str> = lang.extensions.iter().map(String::as_str).collect();
            tracing::debug!(language = %lang.name, ?extensions, "registering language");
            registry.register(Arc::new(lexer), &extensions);
        }
        Ok(())
    }
}

fn split_keywords(list: &str) -> impl Iterator<Item = &str> {
    list.split(|c: char| c.is_whitespace() || c == ',').filter(|w| !w.is_empty())
}

const TRIPLE_QUOTED_STRING: &str = r##"^(?:'''(?:[^'\\]|\\[\s\S]|''?[^'\\]|''?\\[\s\S])*(?:'''|$)|"""(?:[^"\\]|\\[\s\S]|""?[^"\\]|""?\\[\s\S])*(?:"""|$)|'(?:[^\\']|\\[\s\S])*(?:'|$)|"(?:[^\\"]|\\[\s\S])*(?:"|$))"##;
const MULTI_LINE_STRING: &str = r##"^(?:'(?:[^\\']|\\[\s\S])*(?:'|$)|"(?:[^\\"]|\\[\s\S])*(?:"|$)|`(?:[^\\`]|\\[\s\S])*(?:`|$))"##;
const SINGLE_LINE_STRING: &str = r##"^(?:'(?:[^\\'\r\n]|\\.)*(?:'|$)|"(?:[^\\"\r\n]|\\.)*(?:"|$))"##;
const VERBATIM_STRING: &str = r##"^@"(?:[^"]|"")*(?:"|$)"##;
const BLOCK_HASH_COMMENT: &str = r"^#(?:##(?:[^#]|#[^#]|##[^#])*(?:###|$)|.*)";
// A directive name ends the comment so an unclosed /* after it still lexes
const PREPROCESSOR: &str =
    r"^#(?:(?:define|e(?:l|nd)if|else|error|ifn?def|include|line|pragma|undef|warning)\b|[^\r\n]*)";
const INCLUDE_TARGET: &str = r"^<(?:(?:(?:\.\./)*|/?)(?:[\w-]+(?:/[\w-]+)+)?[\w-]+\.h(?:h|pp|\+\+)?|[a-z]\w*)>";
const HASH_COMMENT: &str = r"^#[^\r\n]*";
const LINE_COMMENT: &str = r"^//[^\r\n]*";
const BLOCK_COMMENT: &str = r"^/\*[\s\S]*?(?:\*/|$)";

/// Tokens after which a `/` starts a regex literal rather than a division
const REGEX_PRECEDER: &str = r"(?:^^\.?|[+-]|[!=]=?=?|#|%=?|&&?=?|\(|\*=?|[+\-]=|->|/=?|::?|<<?=?|>>?>?=?|,|;|\?|@|\[|~|\{|\^\^?=?|\|\|?=?|break|case|continue|delete|do|else|finally|instanceof|return|throw|try|typeof)\s*";

fn regex_literal(multi_line: bool) -> String {
    let (excl, any) = if multi_line { ("", r"[\s\S]") } else { (r"\n\r", ".") };
    let class = format!(r"\[(?:[^\\\]{excl}]|\\{any})*(?:\]|$)");
    format!(r"/(?:[^/*\[\\{excl}]|\\{any}|{class})(?:[^/\[\\{excl}]|\\{any}|{class})*/")
}

/// Build the generic source lexer for a set of options
pub fn source_decorator(options: &SourceOptions) -> Result<Lexer> {
    let mut shortcut = Vec::new();
    let mut fallthrough = Vec::new();

    if options.triple_quoted_strings {
        shortcut.push(LexRule::shortcut(StyleClass::String, TRIPLE_QUOTED_STRING, "'\"")?);
    } else if options.multi_line_strings {
        shortcut.push(LexRule::shortcut(StyleClass::String, MULTI_LINE_STRING, "'\"`")?);
    } else {
        shortcut.push(LexRule::shortcut(StyleClass::String, SINGLE_LINE_STRING, "\"'")?);
    }
    if options.verbatim_strings {
        fallthrough.push(LexRule::style(StyleClass::String, VERBATIM_STRING)?);
    }

    if options.hash_comments {
        let comment = match (options.block_hash_comments, options.c_style_comments) {
            (true, _) => BLOCK_HASH_COMMENT,
            (false, true) => PREPROCESSOR,
            (false, false) => HASH_COMMENT,
        };
        shortcut.push(LexRule::shortcut(StyleClass::Comment, comment, "#")?);
        if options.c_style_comments {
            // #include <stdio.h>
            fallthrough.push(LexRule::style(StyleClass::String, INCLUDE_TARGET)?);
        }
    }
    if options.c_style_comments {
        fallthrough.push(LexRule::style(StyleClass::Comment, LINE_COMMENT)?);
        fallthrough.push(LexRule::style(StyleClass::Comment, BLOCK_COMMENT)?);
    }
    if options.regex_literals {
        let source = format!("^{}({})", REGEX_PRECEDER, regex_literal(options.multi_line_regex_literals));
        fallthrough.push(LexRule::embed("regex", &source)?);
    }
    // keywords win over type patterns, so `int` stays a keyword while `int32_t` is a type
    let keywords: Vec<String> = split_keywords(&options.keywords).map(regex::escape).collect();
    if !keywords.is_empty() {
        let source = format!(r"^(?:{})\b", keywords.join("|"));
        fallthrough.push(LexRule::style(StyleClass::Keyword, &source)?);
    }
    if let Some(types) = &options.types {
        fallthrough.push(LexRule::style(StyleClass::Type, types)?);
    }

    shortcut.push(LexRule::shortcut(StyleClass::Plain, r"^\s+", " \r\n\t\u{a0}")?);

    fallthrough.push(LexRule::style_i(StyleClass::Literal, r"^@[a-z_$][a-z_$@0-9]*")?);
    fallthrough.push(LexRule::style(StyleClass::Type, r"^(?:[@_]?[A-Z]+[a-z][A-Za-z_$@0-9]*|\w+_t\b)")?);
    fallthrough.push(LexRule::style_i(StyleClass::Plain, r"^[a-z_$][a-z_$@0-9]*")?);
    fallthrough.push(LexRule::new(
        RuleOutcome::Style(StyleClass::Literal),
        RulePattern::ignore_case(r"^(?:0x[a-f0-9]+|(?:\d(?:_\d+)*\d*(?:\.\d*)?|\.\d+)(?:e[+\-]?\d+)?)[a-z]*"),
        Some("0123456789"),
    )?);
    // an escaped quote in shell must not open a string
    fallthrough.push(LexRule::style(StyleClass::Plain, r"^\\[\s\S]?")?);
    fallthrough.push(LexRule::style(StyleClass::Punctuation, r#"^.[^\s\w.$@'"`/#\\]*"#)?);

    Lexer::new(shortcut, fallthrough)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lexer::decorate;
    use crate::syntax::style::{normalize, spans};

    fn styled(options: &SourceOptions, source: &str) -> Vec<(String, StyleClass)> {
        let registry = LanguageRegistry::with_defaults().unwrap();
        let lexer = source_decorator(options).unwrap();
        let decorations = normalize(&decorate(&lexer, &registry, source));
        spans(&decorations, source.len())
            .into_iter()
            .map(|s| (source[s.start..s.end].to_string(), s.style))
            .collect()
    }

    fn style_of(styled: &[(String, StyleClass)], text: &str) -> Option<StyleClass> {
        styled.iter().find(|(t, _)| t == text).map(|(_, s)| *s)
    }

    #[test]
    fn test_c_like_line() {
        let options = SourceOptions {
            hash_comments: true,
            c_style_comments: true,
            keywords: "int return".to_string(),
            ..Default::default()
        };
        let styled = styled(&options, "int x = 1; // hi");
        assert_eq!(style_of(&styled, "int"), Some(StyleClass::Keyword));
        assert_eq!(style_of(&styled, " x "), Some(StyleClass::Plain));
        assert_eq!(style_of(&styled, "="), Some(StyleClass::Punctuation));
        assert_eq!(style_of(&styled, "1"), Some(StyleClass::Literal));
        assert_eq!(style_of(&styled, ";"), Some(StyleClass::Punctuation));
        assert_eq!(style_of(&styled, "// hi"), Some(StyleClass::Comment));
    }

    #[test]
    fn test_punctuation_stops_at_hash_comment() {
        let options = SourceOptions {
            hash_comments: true,
            ..Default::default()
        };
        let first = styled(&options, "f()# hi");
        assert_eq!(style_of(&first, "()"), Some(StyleClass::Punctuation));
        assert_eq!(first.last(), Some(&("# hi".to_string(), StyleClass::Comment)));

        let second = styled(&options, "x=[]# hi");
        assert_eq!(style_of(&second, "=[]"), Some(StyleClass::Punctuation));
        assert_eq!(style_of(&second, "# hi"), Some(StyleClass::Comment));
    }

    #[test]
    fn test_preprocessor_and_include() {
        let options = SourceOptions {
            hash_comments: true,
            c_style_comments: true,
            ..Default::default()
        };
        let styled = styled(&options, "#include <stdio.h>");
        assert_eq!(style_of(&styled, "#include"), Some(StyleClass::Comment));
        assert_eq!(style_of(&styled, "<stdio.h>"), Some(StyleClass::String));
    }

    #[test]
    fn test_triple_quoted_strings() {
        let options = SourceOptions {
            hash_comments: true,
            triple_quoted_strings: true,
            ..Default::default()
        };
        let source = "x = '''a\n'b'\n''' # done";
        let styled = styled(&options, source);
        assert_eq!(style_of(&styled, "'''a\n'b'\n'''"), Some(StyleClass::String));
        assert_eq!(style_of(&styled, "# done"), Some(StyleClass::Comment));
    }

    #[test]
    fn test_single_line_string_stops_at_newline() {
        let styled = styled(&SourceOptions::default(), "\"abc\ndef\"");
        assert_eq!(styled[0].1, StyleClass::String);
        assert!(!styled[0].0.contains('\n'));
    }

    #[test]
    fn test_verbatim_string() {
        let options = SourceOptions {
            verbatim_strings: true,
            ..Default::default()
        };
        let styled = styled(&options, r#"s = @"a ""q"" b";"#);
        assert_eq!(style_of(&styled, r#"@"a ""q"" b""#), Some(StyleClass::String));
    }

    #[test]
    fn test_regex_literal_is_embedded() {
        let options = SourceOptions {
            c_style_comments: true,
            regex_literals: true,
            ..Default::default()
        };
        let styled = styled(&options, "x = /a[/]b/g;");
        assert_eq!(style_of(&styled, "/a[/]b/"), Some(StyleClass::String));
        assert_eq!(style_of(&styled, "g"), Some(StyleClass::Plain));
    }

    #[test]
    fn test_division_is_not_a_regex() {
        let options = SourceOptions {
            regex_literals: true,
            ..Default::default()
        };
        let styled = styled(&options, "a / b / c");
        assert!(styled.iter().all(|(_, s)| *s != StyleClass::String));
    }

    #[test]
    fn test_types_and_literals() {
        let options = SourceOptions {
            types: Some(r"^(?:vector|FILE)\b".to_string()),
            ..Default::default()
        };
        let styled = styled(&options, "vector MyType size_t 0xFF 1.5e3f @x");
        assert_eq!(style_of(&styled, "vector"), Some(StyleClass::Type));
        assert_eq!(style_of(&styled, "MyType"), Some(StyleClass::Type));
        assert_eq!(style_of(&styled, "size_t"), Some(StyleClass::Type));
        assert_eq!(style_of(&styled, "0xFF"), Some(StyleClass::Literal));
        assert_eq!(style_of(&styled, "1.5e3f"), Some(StyleClass::Literal));
        assert_eq!(style_of(&styled, "@x"), Some(StyleClass::Literal));
    }

    #[test]
    fn test_keyword_sets_resolved() {
        let table = LanguageTable::parse(
            r#"
            [keywords]
            flow = "if else, while"

            [[language]]
            name = "toy"
            extensions = ["toy"]
            keyword-sets = ["flow"]
            keywords = "fn if"
            hash-comments = true
            "#,
        )
        .unwrap();
        let options = table.resolved_options(&table.languages[0]).unwrap();
        assert_eq!(options.keywords, "if else while fn");
        assert!(options.hash_comments);
        assert!(!options.c_style_comments);
    }

    #[test]
    fn test_unknown_keyword_set() {
        let table = LanguageTable::parse(
            r#"
            [[language]]
            name = "toy"
            extensions = ["toy"]
            keyword-sets = ["missing"]
            "#,
        )
        .unwrap();
        let err = table.resolved_options(&table.languages[0]).unwrap_err();
        assert!(matches!(err, PrettifyError::UnknownKeywordSet(name) if name == "missing"));
    }

    #[test]
    fn test_malformed_table() {
        assert!(matches!(
            LanguageTable::parse("[[language]]\nname = 3"),
            Err(PrettifyError::LanguageTable(_))
        ));
    }
}
