//! Highlighting driver
//!
//! Runs one fragment through extraction, lexing and recombination. A
//! failure in any stage leaves the fragment as it was.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{PrettifyError, Result};
use crate::extract::{extract_tags, ExtractedTag};
use crate::recombine::{recombine, HighlightOptions};
use crate::syntax::{decorate, normalize, Decoration, LanguageHandler, LanguageRegistry};

/// All the state for highlighting one fragment
#[derive(Debug, Clone, Default)]
pub struct SourceJob {
    /// Markup as given
    pub markup: String,
    /// Requested language, if any
    pub lang: Option<String>,
    /// Text with the markup stripped
    pub source: String,
    /// Tags removed from the markup
    pub tags: Vec<ExtractedTag>,
    /// Style changes over `source`
    pub decorations: Vec<Decoration>,
    /// Final HTML, once recombined
    pub result: Option<String>,
}

impl SourceJob {
    /// Create a job, splitting `markup` into source and tags
    pub fn new(markup: &str, lang: Option<&str>) -> Self {
        let extracted = extract_tags(markup);
        Self {
            markup: markup.to_string(),
            lang: lang.map(str::to_string),
            source: extracted.source,
            tags: extracted.tags,
            decorations: Vec::new(),
            result: None,
        }
    }

    /// Lex the source with the handler for this job's language
    pub fn decorate(&mut self, registry: &LanguageRegistry) -> Result<()> {
        let handler = registry.resolve(self.lang.as_deref(), &self.source)?;
        self.decorations = normalize(&decorate(handler, registry, &self.source));
        debug!(lang = ?self.lang, decorations = self.decorations.len(), "decorated fragment");
        Ok(())
    }

    /// Merge decorations and tags back into HTML
    pub fn recombine(&mut self, options: &HighlightOptions) -> Result<&str> {
        let html = recombine(&self.source, &self.tags, &self.decorations, options)?;
        Ok(self.result.insert(html).as_str())
    }
}

/// Highlights fragments with a fixed registry and options
pub struct Prettifier {
    registry: LanguageRegistry,
    options: HighlightOptions,
}

impl Prettifier {
    pub fn new(registry: LanguageRegistry, options: HighlightOptions) -> Self {
        Self { registry, options }
    }

    /// Create a prettifier with the built-in languages and default options
    pub fn with_defaults() -> Result<Self> {
        Ok(Self::new(LanguageRegistry::with_defaults()?, HighlightOptions::default()))
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    pub fn options(&self) -> &HighlightOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: HighlightOptions) {
        self.options = options;
    }

    /// Register a handler for extensions that have none yet
    pub fn register_language_handler(&mut self, handler: Arc<dyn LanguageHandler>, extensions: &[&str]) {
        self.registry.register(handler, extensions);
    }

    /// Find the handler used for `lang` and `source`
    pub fn resolve_language_handler(&self, lang: Option<&str>, source: &str) -> Result<&dyn LanguageHandler> {
        self.registry.resolve(lang, source)
    }

    /// Highlight `markup`, reporting failures
    pub fn try_highlight(&self, markup: &str, lang: Option<&str>) -> Result<String> {
        self.try_highlight_with(markup, lang, &self.options)
    }

    /// Like [`Prettifier::try_highlight`], with options for this fragment only
    pub fn try_highlight_with(&self, markup: &str, lang: Option<&str>, options: &HighlightOptions) -> Result<String> {
        let mut job = SourceJob::new(markup, lang);
        job.decorate(&self.registry)?;
        job.recombine(options)?;
        job.result
            .ok_or_else(|| PrettifyError::Message("fragment was not recombined".to_string()))
    }

    /// Highlight `markup`, returning it unchanged if anything goes wrong
    pub fn highlight_fragment(&self, markup: &str, lang: Option<&str>) -> String {
        self.highlight_fragment_with(markup, lang, &self.options)
    }

    /// Like [`Prettifier::highlight_fragment`], with options for this fragment only
    pub fn highlight_fragment_with(&self, markup: &str, lang: Option<&str>, options: &HighlightOptions) -> String {
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| self.try_highlight_with(markup, lang, options)));
        match attempt {
            Ok(Ok(html)) => html,
            Ok(Err(err)) => {
                warn!(%err, lang = ?lang, "leaving fragment unhighlighted");
                markup.to_string()
            }
            Err(_) => {
                warn!(lang = ?lang, "highlighting panicked, leaving fragment unhighlighted");
                markup.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{spans, LexContext, StyleClass};

    fn prettifier() -> Prettifier {
        Prettifier::with_defaults().unwrap()
    }

    fn styled(job: &SourceJob) -> Vec<(String, StyleClass)> {
        spans(&job.decorations, job.source.len())
            .into_iter()
            .map(|s| (job.source[s.start..s.end].to_string(), s.style))
            .collect()
    }

    #[test]
    fn test_c_fragment_decorations() {
        let p = prettifier();
        let mut job = SourceJob::new("<pre>int x = 1; // hi</pre>", Some("c"));
        assert_eq!(job.source, "int x = 1; // hi");
        job.decorate(p.registry()).unwrap();
        assert_eq!(
            styled(&job),
            vec![
                ("int".to_string(), StyleClass::Keyword),
                (" x ".to_string(), StyleClass::Plain),
                ("=".to_string(), StyleClass::Punctuation),
                (" ".to_string(), StyleClass::Plain),
                ("1".to_string(), StyleClass::Literal),
                (";".to_string(), StyleClass::Punctuation),
                (" ".to_string(), StyleClass::Plain),
                ("// hi".to_string(), StyleClass::Comment),
            ]
        );
        assert_eq!(job.decorations.last().map(|d| d.pos), Some(11));
    }

    #[test]
    fn test_c_fragment_html() {
        let html = prettifier().highlight_fragment("<pre>int x = 1; // hi</pre>", Some("c"));
        assert!(html.starts_with("<pre><span class=\"kwd\">int</span>"));
        assert!(html.ends_with("<span class=\"com\">// hi</span></pre>"));
    }

    #[test]
    fn test_shell_comment_after_punctuation() {
        let p = prettifier();
        let mut job = SourceJob::new("x=[]# hi", Some("sh"));
        job.decorate(p.registry()).unwrap();
        let styled = styled(&job);
        assert!(styled.contains(&("=[]".to_string(), StyleClass::Punctuation)));
        assert!(styled.contains(&("# hi".to_string(), StyleClass::Comment)));
    }

    #[test]
    fn test_numbered_lines_split_markup_tags() {
        let options = HighlightOptions {
            line_numbers: Some(1),
            ..HighlightOptions::default()
        };
        let html = prettifier().highlight_fragment_with("<b>a\nb</b>", Some("c"), &options);
        assert_eq!(
            html,
            "<ol class=\"linenums\"><li class=\"L0\"><b><span class=\"pln\">a</span></b></li>\
             <li class=\"L1\"><b><span class=\"pln\">b</span></b></li></ol>"
        );
    }

    #[test]
    fn test_script_in_markup_uses_js_rules() {
        let p = prettifier();
        let mut job = SourceJob::new("&lt;p&gt;&lt;script&gt;alert(1)&lt;/script&gt;", None);
        job.decorate(p.registry()).unwrap();
        let styled = styled(&job);
        assert!(styled.contains(&("alert".to_string(), StyleClass::Plain)));
        assert!(styled.contains(&("(".to_string(), StyleClass::Punctuation)));
        assert!(styled.contains(&("1".to_string(), StyleClass::Literal)));
        assert!(styled.contains(&(")".to_string(), StyleClass::Punctuation)));
        // adjacent tags share one span
        assert!(styled.contains(&("<p><script>".to_string(), StyleClass::Tag)));
    }

    #[test]
    fn test_blank_lines_keep_style_sequence() {
        let p = prettifier();
        let names = |markup: &str| -> Vec<StyleClass> {
            let mut job = SourceJob::new(markup, Some("py"));
            job.decorate(p.registry()).unwrap();
            spans(&job.decorations, job.source.len())
                .into_iter()
                .filter(|s| !job.source[s.start..s.end].trim().is_empty())
                .map(|s| s.style)
                .collect()
        };
        assert_eq!(names("def f(x):\n  return 'a' # c"), names("def f(x):\n\n\n  return 'a' # c"));
    }

    #[test]
    fn test_failure_returns_markup() {
        let p = Prettifier::new(LanguageRegistry::new(), HighlightOptions::default());
        let markup = "<b>int</b> x;";
        assert!(p.try_highlight(markup, Some("c")).is_err());
        assert_eq!(p.highlight_fragment(markup, Some("c")), markup);
    }

    struct Explode;

    impl LanguageHandler for Explode {
        fn decorate(&self, _ctx: &mut LexContext<'_>, _source: &str, _base_pos: usize) {
            panic!("boom");
        }
    }

    #[test]
    fn test_panicking_handler_returns_markup() {
        let mut p = Prettifier::new(LanguageRegistry::new(), HighlightOptions::default());
        p.register_language_handler(Arc::new(Explode), &["boom"]);
        assert_eq!(p.highlight_fragment("x &lt; y", Some("boom")), "x &lt; y");
        // the next fragment is unaffected
        p.register_language_handler(Arc::new(crate::syntax::Lexer::new(vec![], vec![]).unwrap()), &["default-code"]);
        assert_eq!(p.highlight_fragment("x", None), "<span class=\"pln\">x</span>");
    }
}
