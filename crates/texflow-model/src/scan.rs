//! Lexical recognition of delimited math spans.
//!
//! Math is not a node kind: `$...$` (inline) and `$$...$$` (display) spans
//! are recognized inside text leaves, fresh on every scan. Delimiters are
//! tried longest-left-marker-first so the doubled marker always wins over
//! the single one, and a later match that overlaps an accepted span is
//! discarded.
//!
//! Literal dollars are escaped as `\$`; an escaped marker neither opens nor
//! closes a span.

use smol_str::SmolStr;

use crate::node::Node;
use crate::offset::collect_text_spans;

/// A delimiter pair with its display-mode flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiter {
    pub left: SmolStr,
    pub right: SmolStr,
    pub display: bool,
}

impl Delimiter {
    pub fn new(left: &str, right: &str, display: bool) -> Self {
        Self {
            left: SmolStr::new(left),
            right: SmolStr::new(right),
            display,
        }
    }
}

/// The wire-format delimiter table: `$$...$$` display, `$...$` inline.
pub fn default_delimiters() -> Vec<Delimiter> {
    vec![
        Delimiter::new("$$", "$$", true),
        Delimiter::new("$", "$", false),
    ]
}

/// Wrap raw math source in the delimiter pair for the given mode.
pub fn wrap_math(latex: &str, display: bool) -> String {
    if display {
        format!("$${latex}$$")
    } else {
        format!("${latex}$")
    }
}

/// A recognized span within a single text leaf's content.
///
/// Offsets are char offsets into the leaf text, `end` exclusive and
/// covering the delimiters. `latex` is the captured source with surrounding
/// whitespace trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathSpan {
    pub start: usize,
    pub end: usize,
    pub latex: SmolStr,
    pub display: bool,
}

/// A recognized span in the document's flat offset space.
///
/// Derived data: recomputed from the tree on every change, never cached
/// across edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathRegion {
    pub from: usize,
    pub to: usize,
    pub latex: SmolStr,
    pub display: bool,
}

impl MathRegion {
    /// Decoration identity: a widget survives a re-scan only if position,
    /// source and mode all match.
    pub fn key(&self) -> (usize, &str, bool) {
        (self.from, self.latex.as_str(), self.display)
    }
}

/// Scan a single text leaf's content for math spans.
///
/// Returns spans sorted by start offset. Scanning is pure and idempotent:
/// identical text always yields identical spans.
pub fn scan(text: &str, delimiters: &[Delimiter]) -> Vec<MathSpan> {
    if !delimiters.iter().any(|d| text.contains(d.left.as_str())) {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();

    let mut ordered: Vec<&Delimiter> = delimiters.iter().collect();
    ordered.sort_by_key(|d| std::cmp::Reverse(d.left.chars().count()));

    let mut spans: Vec<MathSpan> = Vec::new();
    for delim in ordered {
        scan_delimiter(&chars, delim, &mut spans);
    }

    spans.sort_by_key(|s| s.start);
    spans
}

/// Left-to-right pass for one delimiter class, respecting spans already
/// accepted by earlier (longer) classes.
fn scan_delimiter(chars: &[char], delim: &Delimiter, spans: &mut Vec<MathSpan>) {
    let left: Vec<char> = delim.left.chars().collect();
    let right: Vec<char> = delim.right.chars().collect();
    let single = left.len() == 1 && right.len() == 1 && left[0] == right[0];

    let mut i = 0;
    while i + left.len() + right.len() <= chars.len() {
        // An opener inside an accepted span is dead; jump past it.
        if let Some(span) = spans.iter().find(|s| i >= s.start && i < s.end) {
            i = span.end;
            continue;
        }
        if !matches_at(chars, i, &left) || is_escaped(chars, i) {
            i += 1;
            continue;
        }

        let close = if single {
            // A doubled single-char marker is the longer class's opener.
            if chars.get(i + 1) == Some(&left[0]) {
                i += 2;
                continue;
            }
            find_inline_close(chars, i + 1, left[0]).map(|j| (j, j + 1))
        } else {
            // Non-greedy: the very next occurrence of the right marker.
            find_marker(chars, i + left.len(), &right).map(|j| (j, j + right.len()))
        };

        match close {
            Some((content_end, end)) => {
                if spans.iter().any(|s| s.start < end && i < s.end) {
                    i += 1;
                    continue;
                }
                let latex: String = chars[i + left.len()..content_end].iter().collect();
                spans.push(MathSpan {
                    start: i,
                    end,
                    latex: SmolStr::new(latex.trim()),
                    display: delim.display,
                });
                i = end;
            }
            None => i += 1,
        }
    }
}

fn matches_at(chars: &[char], at: usize, marker: &[char]) -> bool {
    chars.len() >= at + marker.len() && chars[at..at + marker.len()] == *marker
}

/// Odd number of immediately preceding backslashes escapes the marker.
fn is_escaped(chars: &[char], at: usize) -> bool {
    let mut backslashes = 0;
    let mut k = at;
    while k > 0 && chars[k - 1] == '\\' {
        backslashes += 1;
        k -= 1;
    }
    backslashes % 2 == 1
}

/// Closing position for an inline span opened just before `from`.
///
/// The closer is the next unescaped occurrence of the marker that is not
/// itself immediately followed by the marker again. Inline spans never
/// cross line breaks.
fn find_inline_close(chars: &[char], from: usize, marker: char) -> Option<usize> {
    let mut j = from;
    while j < chars.len() {
        let c = chars[j];
        if c == '\n' {
            return None;
        }
        if c == marker {
            if is_escaped(chars, j) {
                j += 1;
                continue;
            }
            if chars.get(j + 1) == Some(&marker) {
                j += 2;
                continue;
            }
            return Some(j);
        }
        j += 1;
    }
    None
}

fn find_marker(chars: &[char], from: usize, marker: &[char]) -> Option<usize> {
    let mut j = from;
    while j + marker.len() <= chars.len() {
        if matches_at(chars, j, marker) && !is_escaped(chars, j) {
            return Some(j);
        }
        j += 1;
    }
    None
}

/// Scan every text leaf of the document, mapping spans into the flat
/// offset space. Regions are returned in a single left-to-right document
/// order and never overlap.
pub fn scan_document(doc: &Node, delimiters: &[Delimiter]) -> Vec<MathRegion> {
    let mut regions = Vec::new();
    for span in collect_text_spans(doc) {
        for m in scan(span.text, delimiters) {
            regions.push(MathRegion {
                from: span.start + m.start,
                to: span.start + m.end,
                latex: m.latex,
                display: m.display,
            });
        }
    }
    tracing::trace!(
        target: "texflow::model",
        count = regions.len(),
        "scanned document regions"
    );
    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_default(text: &str) -> Vec<MathSpan> {
        scan(text, &default_delimiters())
    }

    #[test]
    fn test_no_delimiters_yields_nothing() {
        assert!(scan_default("plain text, no math").is_empty());
        assert!(scan_default("").is_empty());
    }

    #[test]
    fn test_inline_basic() {
        let spans = scan_default("before $x+1$ after");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start, 7);
        assert_eq!(spans[0].end, 12);
        assert_eq!(spans[0].latex, "x+1");
        assert!(!spans[0].display);
    }

    #[test]
    fn test_display_beats_inline() {
        // Delimiter priority: block region "a" then inline region "b".
        let spans = scan_default("$$a$$ $b$");
        assert_eq!(spans.len(), 2);
        assert!(spans[0].display);
        assert_eq!(spans[0].latex, "a");
        assert_eq!((spans[0].start, spans[0].end), (0, 5));
        assert!(!spans[1].display);
        assert_eq!(spans[1].latex, "b");
        assert_eq!((spans[1].start, spans[1].end), (6, 9));
    }

    #[test]
    fn test_trim_invariant() {
        let spans = scan_default("$  x+1  $");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].latex, "x+1");
        // Offsets still cover the full delimited range.
        assert_eq!((spans[0].start, spans[0].end), (0, 9));
    }

    #[test]
    fn test_idempotence() {
        let text = r"mix $a$ and $$b$$ and \$5 and $c$";
        let first = scan_default(text);
        let second = scan_default(text);
        assert_eq!(first, second);
    }

    #[test]
    fn test_non_overlap() {
        for text in [
            "$$a$$ $b$",
            "$a$$b$$c$",
            "$$$x$",
            "$ $ $ $",
            "$$a$ b$$",
        ] {
            let spans = scan_default(text);
            for pair in spans.windows(2) {
                assert!(
                    pair[0].end <= pair[1].start,
                    "overlap in {text:?}: {pair:?}"
                );
            }
        }
    }

    #[test]
    fn test_empty_display_content() {
        let spans = scan_default("$$$$");
        assert_eq!(spans.len(), 1);
        assert!(spans[0].display);
        assert_eq!(spans[0].latex, "");
    }

    #[test]
    fn test_inline_does_not_cross_line_break() {
        assert!(scan_default("$a\nb$").is_empty());
        // Display math may span lines.
        let spans = scan_default("$$a\nb$$");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].latex, "a\nb");
    }

    #[test]
    fn test_escaped_dollar_is_literal() {
        assert!(scan_default(r"costs \$5 or \$10").is_empty());
        // An escaped marker does not close, the next one does.
        let spans = scan_default(r"$a \$ b$");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].latex, r"a \$ b");
        // Double backslash is a literal backslash, marker stays live.
        let spans = scan_default(r"$a\\$");
        assert_eq!(spans.len(), 1);
    }

    #[test]
    fn test_triple_dollar_run() {
        // First two always read as the display opener; here it never
        // closes, so the third dollar pairs inline with the final one.
        let spans = scan_default("$$$x$");
        assert_eq!(spans.len(), 1);
        assert!(!spans[0].display);
        assert_eq!(spans[0].latex, "x");
        assert_eq!((spans[0].start, spans[0].end), (2, 5));
    }

    #[test]
    fn test_unclosed_markers() {
        assert!(scan_default("$x").is_empty());
        assert!(scan_default("$$x").is_empty());
        assert!(scan_default("x$").is_empty());
    }

    #[test]
    fn test_multibyte_offsets_are_chars() {
        let spans = scan_default("π² $α+β$");
        assert_eq!(spans.len(), 1);
        assert_eq!((spans[0].start, spans[0].end), (3, 8));
        assert_eq!(spans[0].latex, "α+β");
    }

    #[test]
    fn test_scan_document_flat_offsets() {
        let doc = Node::doc(vec![
            Node::paragraph(vec![Node::text("x "), Node::text("$a$")]),
            Node::paragraph(vec![Node::text("$$b$$")]),
        ]);
        let regions = scan_document(&doc, &default_delimiters());
        assert_eq!(regions.len(), 2);
        // "x " occupies 0..2, "$a$" 2..5, separator 5, "$$b$$" 6..11.
        assert_eq!((regions[0].from, regions[0].to), (2, 5));
        assert_eq!(regions[0].latex, "a");
        assert_eq!((regions[1].from, regions[1].to), (6, 11));
        assert!(regions[1].display);
    }

    #[test]
    fn test_delimiters_never_pair_across_leaves() {
        // One "$" in each of two adjacent text leaves: leaves are scanned
        // independently, so nothing matches.
        let doc = Node::doc(vec![Node::paragraph(vec![
            Node::text("a $"),
            Node::text("b$ c"),
        ])]);
        assert!(scan_document(&doc, &default_delimiters()).is_empty());
    }

    #[test]
    fn test_wrap_math_rescans() {
        let spans = scan_default(&wrap_math("y=mx+b", true));
        assert_eq!(spans.len(), 1);
        assert!(spans[0].display);
        assert_eq!(spans[0].latex, "y=mx+b");
    }
}
