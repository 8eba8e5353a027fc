//! Tag extraction
//!
//! Splits an HTML fragment into the plain text a lexer sees and the tags
//! that have to be put back afterwards. Each tag remembers the source
//! offset it belongs at, so recombination can interleave the two again.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::trace;

/// One chunk of markup: a text run, comment, CDATA section, tag or stray `<`
static CHUNK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"[^<]+|<!--[\s\S]*?-->|<!\[CDATA\[[\s\S]*?\]\]>|</?[a-zA-Z](?:[^>"']|'[^']*'|"[^"]*")*>|<"#,
    )
    .expect("chunk pattern is valid")
});

/// Attribute in any of the quoted, single-quoted or bare forms
static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\s(\w+)\s*=\s*(?:"([^"]*)"|'([^']*)'|(\S+))"#).expect("attribute pattern is valid")
});

static NOCODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[cC][lL][aA][sS][sS]="[^"]*\bnocode\b"#).expect("nocode pattern is valid"));

static TAG_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<(/?)([a-zA-Z][a-zA-Z0-9]*)").expect("tag name pattern is valid"));

static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^<br\b").expect("line break pattern is valid"));

static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:#([0-9]+)|#[xX]([0-9a-fA-F]+)|(lt|gt|amp|quot|apos|nbsp));").expect("entity pattern is valid")
});

/// A tag removed from the source, with the offset it belongs at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTag {
    /// Byte offset into the plain source
    pub pos: usize,
    /// Raw markup, emitted verbatim
    pub html: String,
}

impl ExtractedTag {
    pub fn new(pos: usize, html: impl Into<String>) -> Self {
        Self {
            pos,
            html: html.into(),
        }
    }
}

/// Plain source and the tags pulled out of it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub source: String,
    pub tags: Vec<ExtractedTag>,
}

/// Split `html` into plain source text and extracted tags.
///
/// Comments are dropped, CDATA sections are unwrapped without unescaping
/// and `<br>` becomes a newline. Anything inside an element with class
/// `nocode` is kept as a single tag up to its matching close tag.
pub fn extract_tags(html: &str) -> Extracted {
    let chunks: Vec<&str> = CHUNK.find_iter(html).map(|m| m.as_str()).collect();
    let mut out = Extracted::default();

    let mut i = 0;
    while i < chunks.len() {
        let chunk = chunks[i];
        i += 1;

        if !chunk.starts_with('<') || chunk == "<" {
            out.source.push_str(&html_to_text(chunk));
        } else if chunk.starts_with("<!--") {
            continue;
        } else if let Some(body) = chunk.strip_prefix("<![CDATA[") {
            out.source.push_str(body.strip_suffix("]]>").unwrap_or(body));
        } else if LINE_BREAK.is_match(chunk) {
            out.source.push('\n');
        } else if is_nocode(chunk) {
            let html = match nocode_end(&chunks, i - 1) {
                Some(end) => {
                    let region = chunks[i - 1..=end].concat();
                    i = end + 1;
                    region
                }
                None => chunk.to_string(),
            };
            trace!(pos = out.source.len(), "keeping nocode region");
            out.tags.push(ExtractedTag::new(out.source.len(), html));
        } else {
            out.tags.push(ExtractedTag::new(out.source.len(), chunk));
        }
    }
    out
}

/// Check whether an opening tag carries the `nocode` class
fn is_nocode(tag: &str) -> bool {
    if tag.starts_with("</") {
        return false;
    }
    let canonical = ATTRIBUTE.replace_all(tag, |caps: &Captures<'_>| {
        let value = (2..=4).find_map(|g| caps.get(g)).map_or("", |m| m.as_str());
        format!(" {}=\"{}\"", &caps[1], value)
    });
    NOCODE.is_match(&canonical)
}

/// Index of the chunk closing the element opened at `start`
fn nocode_end(chunks: &[&str], start: usize) -> Option<usize> {
    let name = TAG_NAME.captures(chunks[start])?.get(2)?.as_str();
    let mut depth = 1usize;
    for (idx, chunk) in chunks.iter().enumerate().skip(start + 1) {
        let Some(caps) = TAG_NAME.captures(chunk) else {
            continue;
        };
        if &caps[2] != name {
            continue;
        }
        if caps[1].is_empty() {
            depth += 1;
        } else {
            depth -= 1;
            if depth == 0 {
                return Some(idx);
            }
        }
    }
    None
}

/// Decode the entities that can appear in preformatted text.
///
/// `&nbsp;` becomes an ordinary space; unknown entities are left alone.
pub fn html_to_text(html: &str) -> Cow<'_, str> {
    if !html.contains('&') {
        return Cow::Borrowed(html);
    }
    ENTITY.replace_all(html, |caps: &Captures<'_>| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(dec), _) => dec.as_str().parse::<u32>().ok(),
            (_, Some(hex)) => u32::from_str_radix(hex.as_str(), 16).ok(),
            _ => {
                return match &caps[3] {
                    "lt" => "<",
                    "gt" => ">",
                    "amp" => "&",
                    "quot" => "\"",
                    "apos" => "'",
                    _ => " ",
                }
                .to_string()
            }
        };
        match code.and_then(char::from_u32) {
            Some(c) => c.to_string(),
            None => caps[0].to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        let extracted = extract_tags("int x = 1;");
        assert_eq!(extracted.source, "int x = 1;");
        assert!(extracted.tags.is_empty());
    }

    #[test]
    fn test_tags_are_recorded_at_offsets() {
        let extracted = extract_tags("<b>int</b> x<i a='>'>y</i>");
        assert_eq!(extracted.source, "int xy");
        assert_eq!(
            extracted.tags,
            vec![
                ExtractedTag::new(0, "<b>"),
                ExtractedTag::new(3, "</b>"),
                ExtractedTag::new(5, "<i a='>'>"),
                ExtractedTag::new(6, "</i>"),
            ]
        );
    }

    #[test]
    fn test_comments_cdata_and_breaks() {
        let extracted = extract_tags("a<!-- gone -->b<![CDATA[<&lt;>]]>c<BR/>d");
        assert_eq!(extracted.source, "ab<&lt;>c\nd");
        assert!(extracted.tags.is_empty());
    }

    #[test]
    fn test_entities_are_decoded() {
        let extracted = extract_tags("a &lt; b &amp;&amp; c&gt;d &#65;&#x42; &nbsp;&bogus;");
        assert_eq!(extracted.source, "a < b && c>d AB  &bogus;");
        assert_eq!(html_to_text("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_stray_angle_bracket_is_text() {
        let extracted = extract_tags("a < 3 && b<2");
        assert_eq!(extracted.source, "a < 3 && b<2");
        assert!(extracted.tags.is_empty());
    }

    #[test]
    fn test_nocode_region_is_one_tag() {
        let html = "x<span class=\"nocode\">1 <span>2</span> 3</span>y";
        let extracted = extract_tags(html);
        assert_eq!(extracted.source, "xy");
        assert_eq!(
            extracted.tags,
            vec![ExtractedTag::new(1, "<span class=\"nocode\">1 <span>2</span> 3</span>")]
        );
    }

    #[test]
    fn test_nocode_with_unquoted_class() {
        let extracted = extract_tags("<b id=x class=nocode>z</b>!");
        assert_eq!(extracted.source, "!");
        assert_eq!(extracted.tags[0].html, "<b id=x class=nocode>z</b>");
    }

    #[test]
    fn test_unclosed_nocode_keeps_only_the_tag() {
        let extracted = extract_tags("<em class='nocode'>text");
        assert_eq!(extracted.source, "text");
        assert_eq!(extracted.tags, vec![ExtractedTag::new(0, "<em class='nocode'>")]);
    }

    #[test]
    fn test_offsets_never_decrease() {
        let extracted = extract_tags("<a>1<b>22</b><c/>333<d></d></a>");
        assert!(extracted.tags.windows(2).all(|w| w[0].pos <= w[1].pos));
        assert_eq!(extracted.tags.last().unwrap().pos, extracted.source.len());
    }
}
