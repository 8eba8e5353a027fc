//! Recombination
//!
//! Merges a decoration list with the extracted tags and the plain source,
//! producing the final annotated HTML. Text between boundaries is tab
//! expanded, escaped, and has its space runs and line breaks rewritten so
//! they survive HTML rendering.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_width::UnicodeWidthChar;

use crate::error::{PrettifyError, Result};
use crate::extract::ExtractedTag;
use crate::syntax::{Decoration, StyleClass};

/// A space following a line start or another space, when the previous chunk ended in whitespace
static START_OR_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?mR)(^| ) ").expect("space pattern is valid"));
/// A space following whitespace inside a chunk
static ADJACENT_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([\r\n ]) ").expect("space pattern is valid"));
static NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n?|\n").expect("newline pattern is valid"));
/// A single start or end tag, quoted attribute values included
static SINGLE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^<(/?)([A-Za-z][A-Za-z0-9:-]*)(?:[^>"']|"[^"]*"|'[^']*')*>$"#).expect("tag pattern is valid")
});

/// Elements that never take an end tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];

/// How a fragment is rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightOptions {
    /// Columns per tab stop
    pub tab_width: usize,
    /// Number lines starting from this line number
    pub line_numbers: Option<usize>,
    /// Whether the container preserves whitespace, like `<pre>`
    pub preformatted: bool,
    /// Pad line breaks for engines that collapse adjacent breaks
    pub legacy_line_breaks: bool,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        Self {
            tab_width: 8,
            line_numbers: None,
            preformatted: true,
            legacy_line_breaks: false,
        }
    }
}

/// Escape text for inclusion in HTML
pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// Replaces tabs with spaces, remembering the column across calls
#[derive(Debug, Clone)]
pub struct TabExpander {
    tab_width: usize,
    column: usize,
}

impl TabExpander {
    pub fn new(tab_width: usize) -> Self {
        Self {
            tab_width: tab_width.max(1),
            column: 0,
        }
    }

    /// Current display column
    pub fn column(&self) -> usize {
        self.column
    }

    /// Start again at column zero
    pub fn reset(&mut self) {
        self.column = 0;
    }

    /// Expand the tabs in `text`, which continues where the last call stopped
    pub fn expand<'t>(&mut self, text: &'t str) -> Cow<'t, str> {
        if !text.contains('\t') {
            self.advance(text);
            return Cow::Borrowed(text);
        }
        let mut out = String::with_capacity(text.len() + self.tab_width);
        for ch in text.chars() {
            if ch == '\t' {
                let spaces = self.tab_width - self.column % self.tab_width;
                out.extend(std::iter::repeat(' ').take(spaces));
                self.column += spaces;
            } else {
                out.push(ch);
                self.step(ch);
            }
        }
        Cow::Owned(out)
    }

    fn advance(&mut self, text: &str) {
        for ch in text.chars() {
            self.step(ch);
        }
    }

    fn step(&mut self, ch: char) {
        match ch {
            '\n' | '\r' => self.column = 0,
            _ => self.column += ch.width().unwrap_or(1),
        }
    }
}

/// An extracted start tag whose end tag has not been emitted yet
#[derive(Debug, Clone)]
struct OpenTag {
    name: String,
    html: String,
}

/// Keeps `open` in step with the tag just written
fn track_tag(open: &mut Vec<OpenTag>, html: &str) {
    let Some(caps) = SINGLE_TAG.captures(html) else {
        return;
    };
    let name = caps[2].to_ascii_lowercase();
    if caps[1].is_empty() {
        if !html.ends_with("/>") && !VOID_ELEMENTS.contains(&name.as_str()) {
            open.push(OpenTag {
                name,
                html: html.to_string(),
            });
        }
    } else if let Some(idx) = open.iter().rposition(|tag| tag.name == name) {
        open.truncate(idx);
    }
}

/// Emits the markup for line breaks, numbering lines when asked to
#[derive(Debug, Clone)]
struct LineBreaker {
    /// Zero-based index of the current line, when numbering
    line: Option<usize>,
    preformatted: bool,
    legacy: bool,
}

impl LineBreaker {
    fn new(options: &HighlightOptions) -> Self {
        Self {
            line: options.line_numbers.map(|first| first.saturating_sub(1)),
            preformatted: options.preformatted,
            legacy: options.legacy_line_breaks,
        }
    }

    fn open(&self, out: &mut String) {
        if let Some(line) = self.line {
            out.push_str("<ol class=\"linenums\">");
            self.open_item(out, line, line != 0);
        }
    }

    fn open_item(&self, out: &mut String, line: usize, explicit: bool) {
        out.push_str(&format!("<li class=\"L{}\"", line % 10));
        if explicit {
            out.push_str(&format!(" value=\"{}\"", line + 1));
        }
        out.push('>');
    }

    /// Write one line break.
    ///
    /// When numbering, `open_span` and the `open_tags` around it are closed
    /// before the list item ends and reopened inside the next one.
    fn line_break(&mut self, out: &mut String, open_span: Option<StyleClass>, open_tags: &[OpenTag]) {
        match self.line.as_mut() {
            Some(line) => {
                if open_span.is_some() {
                    out.push_str("</span>");
                }
                for tag in open_tags.iter().rev() {
                    out.push_str("</");
                    out.push_str(&tag.name);
                    out.push('>');
                }
                if self.legacy {
                    out.push_str("&#160;");
                }
                *line += 1;
                let line = *line;
                out.push_str("</li>");
                self.open_item(out, line, false);
                for tag in open_tags {
                    out.push_str(&tag.html);
                }
                if let Some(style) = open_span {
                    push_span(out, style);
                }
            }
            None => out.push_str(match (self.legacy, self.preformatted) {
                (false, _) => "<br />",
                (true, true) => "&#160;\r",
                (true, false) => "&#160;<br />",
            }),
        }
    }

    fn close(&self, out: &mut String) {
        if self.line.is_some() {
            out.push_str("</li></ol>");
        }
    }
}

fn push_span(out: &mut String, style: StyleClass) {
    out.push_str("<span class=\"");
    out.push_str(style.class_name());
    out.push_str("\">");
}

/// Builds the annotated HTML for one source text
pub struct Recombiner<'s> {
    source: &'s str,
    out: String,
    tabs: TabExpander,
    lines: LineBreaker,
    /// Style of the decoration covering the current position
    current: Option<StyleClass>,
    /// Style of the span currently open in `out`
    open: Option<StyleClass>,
    /// Extracted tags opened but not yet closed
    open_tags: Vec<OpenTag>,
    /// Whether the last emitted text ended in whitespace, true at the start
    last_was_space: bool,
    /// Bytes of source already emitted
    emitted: usize,
}

impl<'s> Recombiner<'s> {
    pub fn new(source: &'s str, options: &HighlightOptions) -> Self {
        Self {
            source,
            out: String::with_capacity(source.len() * 2),
            tabs: TabExpander::new(options.tab_width),
            lines: LineBreaker::new(options),
            current: None,
            open: None,
            open_tags: Vec::new(),
            last_was_space: true,
            emitted: 0,
        }
    }

    /// Interleave `tags` and `decorations` with the source.
    ///
    /// At equal offsets a tag goes first, so no span is opened only to be
    /// closed again before the tag.
    pub fn recombine(mut self, tags: &[ExtractedTag], decorations: &[Decoration]) -> Result<String> {
        for pos in tags.iter().map(|t| t.pos).chain(decorations.iter().map(|d| d.pos)) {
            self.check_offset(pos)?;
        }

        self.lines.open(&mut self.out);
        let (mut t, mut d) = (0, 0);
        while t < tags.len() || d < decorations.len() {
            if t < tags.len() && (d >= decorations.len() || tags[t].pos <= decorations[d].pos) {
                self.emit_text_up_to(tags[t].pos);
                self.close_span();
                self.out.push_str(&tags[t].html);
                track_tag(&mut self.open_tags, &tags[t].html);
                t += 1;
            } else {
                self.emit_text_up_to(decorations[d].pos);
                self.current = Some(decorations[d].style);
                d += 1;
            }
        }
        self.emit_text_up_to(self.source.len());
        self.close_span();
        self.lines.close(&mut self.out);
        Ok(self.out)
    }

    fn check_offset(&self, pos: usize) -> Result<()> {
        if pos > self.source.len() || !self.source.is_char_boundary(pos) {
            return Err(PrettifyError::BadOffset {
                offset: pos,
                len: self.source.len(),
            });
        }
        Ok(())
    }

    fn close_span(&mut self) {
        if self.open.take().is_some() {
            self.out.push_str("</span>");
        }
    }

    fn emit_text_up_to(&mut self, pos: usize) {
        if pos <= self.emitted {
            return;
        }
        if self.open.is_some() && self.open != self.current {
            self.close_span();
        }
        if self.open.is_none() {
            if let Some(style) = self.current {
                push_span(&mut self.out, style);
                self.open = Some(style);
            }
        }

        let source = self.source;
        let text = &source[self.emitted..pos];
        self.emitted = pos;
        let expanded = self.tabs.expand(text);
        let escaped = escape_html(&expanded);
        let spaced = if self.last_was_space {
            START_OR_SPACE.replace_all(&escaped, "${1}&#160;")
        } else {
            ADJACENT_SPACE.replace_all(&escaped, "${1}&#160;")
        };
        self.last_was_space = spaced.ends_with([' ', '\r', '\n']);

        let mut last = 0;
        for m in NEWLINE.find_iter(&spaced) {
            self.out.push_str(&spaced[last..m.start()]);
            self.lines.line_break(&mut self.out, self.open, &self.open_tags);
            last = m.end();
        }
        self.out.push_str(&spaced[last..]);
    }
}

/// Render `source` with its tags and decorations as HTML
pub fn recombine(
    source: &str,
    tags: &[ExtractedTag],
    decorations: &[Decoration],
    options: &HighlightOptions,
) -> Result<String> {
    Recombiner::new(source, options).recombine(tags, decorations)
}
