//! Decoration lists
//!
//! A decoration marks the position where a style starts; it runs until
//! the next decoration or the end of the source. Positions are byte
//! offsets into the plain source text.

use super::tokens::StyleClass;

/// A style change at a byte offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoration {
    /// Byte offset where this style starts
    pub pos: usize,
    /// Style applied from `pos` onwards
    pub style: StyleClass,
}

impl Decoration {
    /// Create a new decoration
    pub fn new(pos: usize, style: StyleClass) -> Self {
        Self { pos, style }
    }
}

/// A resolved run of text with exactly one style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Byte offset where this span starts (inclusive)
    pub start: usize,
    /// Byte offset where this span ends (exclusive)
    pub end: usize,
    /// Style of the run
    pub style: StyleClass,
}

impl Span {
    /// Get the length of this span in bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if span is empty
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Collapse redundant entries.
///
/// Entries sharing a position keep only the last one, and an entry with the
/// same style as its predecessor is dropped.
pub fn normalize(decorations: &[Decoration]) -> Vec<Decoration> {
    let mut out: Vec<Decoration> = Vec::with_capacity(decorations.len());
    for &dec in decorations {
        if let Some(last) = out.last_mut() {
            if last.pos == dec.pos {
                *last = dec;
                // the replacement may now repeat the entry before it
                let n = out.len();
                if n >= 2 && out[n - 2].style == out[n - 1].style {
                    out.pop();
                }
                continue;
            }
            if last.style == dec.style {
                continue;
            }
        }
        out.push(dec);
    }
    out
}

/// Expand decorations into the spans they describe over `len` bytes of source.
///
/// The last span always ends at `len`.
pub fn spans(decorations: &[Decoration], len: usize) -> Vec<Span> {
    let mut spans = Vec::with_capacity(decorations.len());
    for (i, dec) in decorations.iter().enumerate() {
        let end = decorations.get(i + 1).map_or(len, |next| next.pos).min(len);
        if dec.pos < end {
            spans.push(Span { start: dec.pos, end, style: dec.style });
        }
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(pos: usize, style: StyleClass) -> Decoration {
        Decoration::new(pos, style)
    }

    #[test]
    fn test_normalize_same_position() {
        let list = [dec(0, StyleClass::Plain), dec(0, StyleClass::Keyword), dec(3, StyleClass::Plain)];
        assert_eq!(normalize(&list), vec![dec(0, StyleClass::Keyword), dec(3, StyleClass::Plain)]);
    }

    #[test]
    fn test_normalize_merges_equal_styles() {
        let list = [
            dec(0, StyleClass::Plain),
            dec(2, StyleClass::Plain),
            dec(4, StyleClass::Comment),
            dec(6, StyleClass::Plain),
            dec(6, StyleClass::Comment),
        ];
        assert_eq!(normalize(&list), vec![dec(0, StyleClass::Plain), dec(4, StyleClass::Comment)]);
    }

    #[test]
    fn test_spans_cover_source() {
        let list = [dec(0, StyleClass::Keyword), dec(3, StyleClass::Plain), dec(3, StyleClass::Literal)];
        let spans = spans(&list, 5);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0], Span { start: 0, end: 3, style: StyleClass::Keyword });
        assert_eq!(spans[1], Span { start: 3, end: 5, style: StyleClass::Literal });
        assert_eq!(spans.iter().map(Span::len).sum::<usize>(), 5);
    }
}
