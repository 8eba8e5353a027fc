//! Page scanning
//!
//! Finds `<pre>` and `<code>` elements marked with the `prettyprint` class
//! in a whole HTML page and highlights each one in place. Elements are
//! independent: one that fails to highlight is left as it was and the
//! scan carries on.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::{debug, trace};

use crate::prettify::Prettifier;
use crate::recombine::HighlightOptions;

const PRETTYPRINT: &str = "prettyprint";
const PRETTYPRINTED: &str = "prettyprinted";

static OPEN_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<(pre|code)\b((?:[^>"']|"[^"]*"|'[^']*')*)>"#).expect("open tag pattern is valid")
});

static BOUNDARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<(/?)(pre|code)\b(?:[^>"']|"[^"]*"|'[^']*')*>"#).expect("boundary pattern is valid")
});

static CLASS_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(\sclass\s*=\s*)(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).expect("class pattern is valid")
});

/// The class list of a candidate element
struct ClassList<'a>(Vec<&'a str>);

impl<'a> ClassList<'a> {
    fn parse(attributes: &'a str) -> Self {
        let value = CLASS_ATTR
            .captures(attributes)
            .and_then(|caps| (2..=4).find_map(|g| caps.get(g)))
            .map_or("", |m| m.as_str());
        Self(value.split_whitespace().collect())
    }

    fn has(&self, class: &str) -> bool {
        self.0.iter().any(|c| *c == class)
    }

    fn wants_highlighting(&self) -> bool {
        self.has(PRETTYPRINT) && !self.has(PRETTYPRINTED)
    }

    /// Language from a `lang-<ext>` class
    fn lang(&self) -> Option<&'a str> {
        self.0.iter().find_map(|c| c.strip_prefix("lang-")).filter(|l| !l.is_empty())
    }

    /// First line number from a `linenums` or `linenums:N` class
    fn line_numbers(&self) -> Option<usize> {
        self.0.iter().find_map(|c| match c.strip_prefix("linenums") {
            Some("") => Some(1),
            Some(rest) => rest.strip_prefix(':').map(|n| n.parse().unwrap_or(1)),
            None => None,
        })
    }
}

/// Add the `prettyprinted` class to an opening tag
fn mark_prettyprinted(tag: &str) -> String {
    CLASS_ATTR
        .replace(tag, |caps: &Captures<'_>| match caps.get(3) {
            Some(single) => format!("{}'{} {}'", &caps[1], single.as_str(), PRETTYPRINTED),
            None => {
                let value = caps.get(2).or_else(|| caps.get(4)).map_or("", |m| m.as_str());
                format!("{}\"{} {}\"", &caps[1], value, PRETTYPRINTED)
            }
        })
        .into_owned()
}

/// Byte range of the tag closing the `name` element whose content starts at `from`
fn find_close(html: &str, from: usize, name: &str) -> Option<Range<usize>> {
    let mut depth = 1usize;
    for caps in BOUNDARY.captures_iter(&html[from..]) {
        if !caps[2].eq_ignore_ascii_case(name) {
            continue;
        }
        if caps[1].is_empty() {
            depth += 1;
            continue;
        }
        depth -= 1;
        if depth == 0 {
            let m = caps.get(0)?;
            return Some(from + m.start()..from + m.end());
        }
    }
    None
}

/// Highlight every `prettyprint` element in `html`
pub fn highlight_page(prettifier: &Prettifier, html: &str) -> String {
    let mut out = String::with_capacity(html.len() * 2);
    let mut pos = 0;
    let mut highlighted = 0usize;

    while let Some(caps) = OPEN_TAG.captures_at(html, pos) {
        let Some(open) = caps.get(0) else {
            break;
        };
        let name = &caps[1];
        let classes = ClassList::parse(&caps[2]);
        let close = if classes.wants_highlighting() {
            find_close(html, open.end(), name)
        } else {
            None
        };
        let Some(close) = close else {
            trace!(at = open.start(), "skipping element");
            out.push_str(&html[pos..open.end()]);
            pos = open.end();
            continue;
        };

        let options = HighlightOptions {
            line_numbers: classes.line_numbers(),
            preformatted: name.eq_ignore_ascii_case("pre"),
            ..prettifier.options().clone()
        };
        out.push_str(&html[pos..open.start()]);
        out.push_str(&mark_prettyprinted(open.as_str()));
        out.push_str(&prettifier.highlight_fragment_with(&html[open.end()..close.start], classes.lang(), &options));
        out.push_str(&html[close.clone()]);
        pos = close.end;
        highlighted += 1;
    }
    out.push_str(&html[pos..]);

    debug!(elements = highlighted, "highlighted page");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::LanguageRegistry;

    fn prettifier() -> Prettifier {
        Prettifier::with_defaults().unwrap()
    }

    #[test]
    fn test_highlights_marked_elements() {
        let page = "<p>hi</p><pre class=\"prettyprint lang-c\">int x;</pre><p>bye</p>";
        let out = highlight_page(&prettifier(), page);
        assert!(out.starts_with("<p>hi</p><pre class=\"prettyprint lang-c prettyprinted\"><span class=\"kwd\">int</span>"));
        assert!(out.ends_with("</pre><p>bye</p>"));
    }

    #[test]
    fn test_skips_unmarked_and_finished_elements() {
        let page = "<pre>int x;</pre><code class='prettyprint prettyprinted'>int</code>";
        assert_eq!(highlight_page(&prettifier(), page), page);
    }

    #[test]
    fn test_class_list() {
        let classes = ClassList::parse(" id=a class=\"prettyprint lang-py linenums:5\"");
        assert!(classes.wants_highlighting());
        assert_eq!(classes.lang(), Some("py"));
        assert_eq!(classes.line_numbers(), Some(5));
        assert_eq!(ClassList::parse(" class=linenums").line_numbers(), Some(1));
        assert_eq!(ClassList::parse(" class=linenumsx").line_numbers(), None);
        assert_eq!(ClassList::parse("").lang(), None);
    }

    #[test]
    fn test_line_numbers_from_class() {
        let page = "<pre class=\"prettyprint linenums:5\">a\nb</pre>";
        let out = highlight_page(&prettifier(), page);
        assert!(out.contains("<ol class=\"linenums\"><li class=\"L4\" value=\"5\">"));
        assert!(out.contains("<li class=\"L5\">"));
    }

    #[test]
    fn test_nested_elements_are_part_of_the_fragment() {
        let page = "<pre class=\"prettyprint\"><pre>a</pre>b</pre>c";
        let out = highlight_page(&prettifier(), page);
        assert_eq!(
            out,
            "<pre class=\"prettyprint prettyprinted\"><pre><span class=\"pln\">a</span></pre>\
             <span class=\"pln\">b</span></pre>c"
        );
    }

    #[test]
    fn test_unclosed_element_is_left_alone() {
        let page = "<pre class=\"prettyprint\">int x;";
        assert_eq!(highlight_page(&prettifier(), page), page);
    }

    #[test]
    fn test_failed_fragment_keeps_content() {
        let p = Prettifier::new(LanguageRegistry::new(), HighlightOptions::default());
        let page = "<code class=prettyprint>a &lt; b</code> and <pre class=prettyprint>c</pre>";
        assert_eq!(
            highlight_page(&p, page),
            "<code class=\"prettyprint prettyprinted\">a &lt; b</code> and \
             <pre class=\"prettyprint prettyprinted\">c</pre>"
        );
    }
}
