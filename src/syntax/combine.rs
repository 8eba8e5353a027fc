//! Pattern combining
//!
//! Unions many prefix-anchored rule patterns into one pattern that can
//! scan a whole source text. Each pattern is split into syntactic units
//! so that anchors can be dropped, capture groups neutralised, and
//! letters case-folded when case-sensitive and case-insensitive rules
//! have to share one compiled pattern.

use regex::{Regex, RegexBuilder};

use super::rules::RulePattern;
use crate::error::{PrettifyError, Result};

/// A syntactic unit of a pattern source
#[derive(Debug, Clone, PartialEq, Eq)]
enum Unit<'a> {
    /// `[...]`, including the brackets
    Class(&'a str),
    /// `\x`, `\x{41}`, `\p{L}` and friends
    Escape(&'a str),
    /// `(` or `(?P<name>` / `(?<name>`
    Capture,
    /// `(?:`, `(?i:`, `(?i)` and other non-capturing openers
    Group(&'a str),
    /// `)`
    Close,
    /// `^`
    Anchor,
    /// Anything else, up to the next special character
    Literal(&'a str),
}

/// Combine `patterns` into a single pattern matching any of them anywhere.
///
/// Fails fast on malformed input: an empty list, a backreference, or a
/// source the regex engine rejects.
pub fn combine_prefix_patterns(patterns: &[RulePattern]) -> Result<Regex> {
    if patterns.is_empty() {
        return Err(PrettifyError::EmptyPatternList);
    }

    let parsed = patterns
        .iter()
        .map(|p| tokenize(&p.source).map(|units| (p, units)))
        .collect::<Result<Vec<_>>>()?;

    let mut ignore_case = false;
    let mut fold_case = false;
    for (pattern, units) in &parsed {
        if pattern.ignore_case {
            ignore_case = true;
        } else if has_letters(units) {
            fold_case = true;
            ignore_case = false;
            break;
        }
    }

    let alternatives: Vec<String> = parsed
        .iter()
        .map(|(pattern, units)| rewrite(units, fold_case && pattern.ignore_case))
        .collect();
    let source = format!("(?:{})", alternatives.join(")|(?:"));

    Ok(RegexBuilder::new(&source).case_insensitive(ignore_case).build()?)
}

fn tokenize(source: &str) -> Result<Vec<Unit<'_>>> {
    let bytes = source.as_bytes();
    let mut units = Vec::new();
    let mut literal_start = None;
    let mut i = 0;

    while i < bytes.len() {
        let special = matches!(bytes[i], b'\\' | b'[' | b'(' | b')' | b'^');
        if !special {
            literal_start.get_or_insert(i);
            i += 1;
            continue;
        }
        if let Some(start) = literal_start.take() {
            units.push(Unit::Literal(&source[start..i]));
        }
        match bytes[i] {
            b'\\' => {
                let end = scan_escape(source, i)?;
                units.push(Unit::Escape(&source[i..end]));
                i = end;
            }
            b'[' => {
                let end = scan_class(source, i)?;
                units.push(Unit::Class(&source[i..end]));
                i = end;
            }
            b'(' => {
                let (unit, end) = scan_group(source, i);
                units.push(unit);
                i = end;
            }
            b')' => {
                units.push(Unit::Close);
                i += 1;
            }
            _ => {
                units.push(Unit::Anchor);
                i += 1;
            }
        }
    }
    if let Some(start) = literal_start {
        units.push(Unit::Literal(&source[start..]));
    }
    Ok(units)
}

/// Returns the byte offset just past the escape starting at `start`.
fn scan_escape(source: &str, start: usize) -> Result<usize> {
    let rest = &source[start + 1..];
    let mut chars = rest.chars();
    let c = match chars.next() {
        Some(c) => c,
        None => return Err(PrettifyError::Message(format!("trailing backslash in {source}"))),
    };
    let after = start + 1 + c.len_utf8();
    if ('1'..='9').contains(&c) {
        return Err(PrettifyError::Backreference(source.to_string()));
    }
    let braced = source[after..].starts_with('{');
    let end = match c {
        'x' | 'u' | 'U' | 'p' | 'P' | 'k' if braced => match source[after..].find('}') {
            Some(close) => after + close + 1,
            None => source.len(),
        },
        'x' => after + hex_run(&source[after..], 2),
        'u' => after + hex_run(&source[after..], 4),
        'U' => after + hex_run(&source[after..], 8),
        'p' | 'P' => after + source[after..].chars().next().map_or(0, char::len_utf8),
        _ => after,
    };
    Ok(end)
}

fn hex_run(s: &str, max: usize) -> usize {
    s.bytes().take(max).take_while(u8::is_ascii_hexdigit).count()
}

/// Returns the byte offset just past the class starting at `start`.
fn scan_class(source: &str, start: usize) -> Result<usize> {
    let bytes = source.as_bytes();
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'[' => {
                depth += 1;
                i += 1;
                if bytes.get(i) == Some(&b'^') {
                    i += 1;
                }
                // a leading `]` is a literal
                if bytes.get(i) == Some(&b']') {
                    i += 1;
                }
            }
            b'\\' => i = scan_escape(source, i)?,
            b']' => {
                depth -= 1;
                i += 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => i += 1,
        }
    }
    Err(PrettifyError::Message(format!("unclosed character class in {source}")))
}

fn scan_group(source: &str, start: usize) -> (Unit<'_>, usize) {
    let rest = &source[start..];
    if !rest.starts_with("(?") {
        return (Unit::Capture, start + 1);
    }
    for prefix in ["(?P<", "(?<"] {
        if rest.starts_with(prefix) {
            // `(?<=` and `(?<!` are lookbehinds, not names
            let tail = &rest[prefix.len()..];
            if !tail.starts_with('=') && !tail.starts_with('!') {
                if let Some(close) = tail.find('>') {
                    return (Unit::Capture, start + prefix.len() + close + 1);
                }
            }
        }
    }
    let end = rest
        .find([':', ')'])
        .map_or(source.len(), |idx| start + idx + 1);
    (Unit::Group(&source[start..end]), end)
}

fn has_letters(units: &[Unit<'_>]) -> bool {
    units.iter().any(|unit| match unit {
        Unit::Literal(text) => text.bytes().any(|b| b.is_ascii_alphabetic()),
        Unit::Class(text) => class_has_letters(text),
        _ => false,
    })
}

fn class_has_letters(class: &str) -> bool {
    let bytes = class.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            i = scan_escape(class, i).unwrap_or(bytes.len());
            continue;
        }
        // `[:alpha:]` style names are not letters to match
        if bytes[i] == b'[' && bytes.get(i + 1) == Some(&b':') {
            i = class[i..].find(":]").map_or(bytes.len(), |idx| i + idx + 2);
            continue;
        }
        if bytes[i].is_ascii_alphabetic() {
            return true;
        }
        i += 1;
    }
    false
}

fn rewrite(units: &[Unit<'_>], fold_case: bool) -> String {
    let mut out = String::new();
    for (idx, unit) in units.iter().enumerate() {
        match unit {
            Unit::Capture => out.push_str("(?:"),
            Unit::Group(text) | Unit::Escape(text) => out.push_str(text),
            Unit::Close => out.push(')'),
            // `^^` stays anchored to the start of the whole text
            Unit::Anchor => {
                if units.get(idx + 1) == Some(&Unit::Anchor) {
                    out.push('^');
                }
            }
            Unit::Class(text) if fold_case => out.push_str(&fold_class(text)),
            Unit::Class(text) => out.push_str(text),
            Unit::Literal(text) if fold_case => {
                for c in text.chars() {
                    if c.is_ascii_alphabetic() {
                        out.push('[');
                        out.push(c.to_ascii_uppercase());
                        out.push(c.to_ascii_lowercase());
                        out.push(']');
                    } else {
                        out.push(c);
                    }
                }
            }
            Unit::Literal(text) => out.push_str(text),
        }
    }
    out
}

/// Item of a flat character class
enum ClassItem {
    Char(char),
    Dash,
    Opaque,
}

/// Add the case-flipped counterpart of every letter range in `class`.
///
/// Classes using nesting or set operations are returned unchanged.
fn fold_class(class: &str) -> String {
    let inner_start = if class.starts_with("[^") { 2 } else { 1 };
    let body = &class[inner_start..class.len() - 1];
    if body.contains('[') || body.contains("&&") || body.contains("--") || body.contains("~~") {
        return class.to_string();
    }

    let items = match class_items(body) {
        Some(items) => items,
        None => return class.to_string(),
    };

    let mut ranges = Vec::new();
    let mut i = 0;
    while i < items.len() {
        if let ClassItem::Char(lo) = items[i] {
            if let (Some(ClassItem::Dash), Some(ClassItem::Char(hi))) = (items.get(i + 1), items.get(i + 2)) {
                ranges.push((lo, *hi));
                i += 3;
                continue;
            }
            ranges.push((lo, lo));
        }
        i += 1;
    }

    let mut extra = String::new();
    for (lo, hi) in ranges {
        for (from, to, shift) in [('a', 'z', -32i32), ('A', 'Z', 32)] {
            let start = lo.max(from);
            let end = hi.min(to);
            if start <= end {
                let flip = |c: char| char::from_u32((c as i32 + shift) as u32).unwrap_or(c);
                push_class_char(&mut extra, flip(start));
                if end > start {
                    extra.push('-');
                    push_class_char(&mut extra, flip(end));
                }
            }
        }
    }

    if extra.is_empty() {
        return class.to_string();
    }
    format!("{}{}]", &class[..class.len() - 1], extra)
}

fn class_items(body: &str) -> Option<Vec<ClassItem>> {
    let mut items = Vec::new();
    let mut chars = body.char_indices().peekable();
    let mut first = true;
    while let Some((idx, c)) = chars.next() {
        let item = match c {
            '-' if !first && chars.peek().is_some() => ClassItem::Dash,
            '\\' => {
                let end = scan_escape(body, idx).ok()?;
                let item = decode_class_escape(&body[idx..end]);
                while chars.peek().is_some_and(|&(next, _)| next < end) {
                    chars.next();
                }
                item
            }
            c => ClassItem::Char(c),
        };
        items.push(item);
        first = false;
    }
    Some(items)
}

fn decode_class_escape(escape: &str) -> ClassItem {
    let body = &escape[1..];
    let simple = match body {
        "n" => Some('\n'),
        "r" => Some('\r'),
        "t" => Some('\t'),
        "f" => Some('\x0C'),
        "v" => Some('\x0B'),
        _ => None,
    };
    if let Some(c) = simple {
        return ClassItem::Char(c);
    }
    let hex = body
        .strip_prefix(['x', 'u', 'U'])
        .map(|digits| digits.trim_start_matches('{').trim_end_matches('}'));
    if let Some(digits) = hex {
        return u32::from_str_radix(digits, 16)
            .ok()
            .and_then(char::from_u32)
            .map_or(ClassItem::Opaque, ClassItem::Char);
    }
    let mut chars = body.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_ascii_alphanumeric() => ClassItem::Char(c),
        _ => ClassItem::Opaque,
    }
}

fn push_class_char(out: &mut String, c: char) {
    if c.is_ascii_alphanumeric() {
        out.push(c);
    } else {
        out.push_str(&format!("\\x{{{:X}}}", c as u32));
    }
}
