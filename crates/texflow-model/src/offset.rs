//! The flat character-offset space over a document tree.
//!
//! Math regions and decorations address the document through a single flat
//! char-offset space: a depth-first walk in which every text leaf occupies a
//! contiguous range and every closed block (and hard break) contributes one
//! separator position. Separators keep offsets in adjacent blocks distinct,
//! so a region can never straddle a block boundary.

use smol_str::SmolStr;

use crate::node::Node;

/// A text leaf located in the flat offset space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan<'a> {
    /// Child-index path from the document root to the text leaf.
    pub path: Vec<usize>,
    /// Flat char offset of the leaf's first character.
    pub start: usize,
    /// The leaf's text.
    pub text: &'a str,
}

impl TextSpan<'_> {
    pub fn len_chars(&self) -> usize {
        self.text.chars().count()
    }

    /// Flat char offset one past the leaf's last character.
    pub fn end(&self) -> usize {
        self.start + self.len_chars()
    }

    pub fn contains(&self, at: usize) -> bool {
        at >= self.start && at < self.end()
    }
}

/// Collect all text leaves of the document with their flat offsets,
/// in document order.
pub fn collect_text_spans(doc: &Node) -> Vec<TextSpan<'_>> {
    let mut out = Vec::new();
    let mut path = Vec::new();
    let mut pos = 0;
    walk(doc, &mut path, &mut pos, &mut out);
    out
}

/// Total length of the flat offset space (text chars plus separators).
pub fn doc_char_len(doc: &Node) -> usize {
    let mut out = Vec::new();
    let mut path = Vec::new();
    let mut pos = 0;
    walk(doc, &mut path, &mut pos, &mut out);
    pos
}

fn walk<'a>(
    node: &'a Node,
    path: &mut Vec<usize>,
    pos: &mut usize,
    out: &mut Vec<TextSpan<'a>>,
) {
    if let Some(text) = node.text.as_deref() {
        out.push(TextSpan {
            path: path.clone(),
            start: *pos,
            text,
        });
        *pos += text.chars().count();
        return;
    }

    for (idx, child) in node.content.iter().enumerate() {
        path.push(idx);
        walk(child, path, pos, out);
        path.pop();
    }

    // Separator after every closed block except the root, and after
    // hard breaks (inline math must not cross either).
    if (node.is_block() && !node.is_doc()) || node.kind == crate::node::kind::HARD_BREAK {
        *pos += 1;
    }
}

/// Resolve a flat char offset to the text leaf containing it.
///
/// Returns the leaf's path and the offset local to the leaf. An offset
/// sitting exactly at the end of a leaf resolves to that leaf as an append
/// position, unless a later leaf starts there (that leaf wins). Offsets
/// past every leaf resolve to `None`.
pub fn resolve_offset(doc: &Node, at: usize) -> Option<(Vec<usize>, usize)> {
    let spans = collect_text_spans(doc);
    for span in &spans {
        if span.contains(at) {
            return Some((span.path.clone(), at - span.start));
        }
    }
    spans
        .iter()
        .rev()
        .find(|s| s.end() == at)
        .map(|s| (s.path.clone(), at - s.start))
}

/// Navigate to the node at a child-index path.
pub fn node_at_path<'a>(doc: &'a Node, path: &[usize]) -> Option<&'a Node> {
    let mut node = doc;
    for &idx in path {
        node = node.content.get(idx)?;
    }
    Some(node)
}

/// Navigate to the node at a child-index path, mutably.
pub fn node_at_path_mut<'a>(doc: &'a mut Node, path: &[usize]) -> Option<&'a mut Node> {
    let mut node = doc;
    for &idx in path {
        node = node.content.get_mut(idx)?;
    }
    Some(node)
}

/// Replace a char range of a string with new text.
///
/// Range is in chars; used by region commands to rewrite a slice of a text
/// leaf without touching the rest of it.
pub fn splice_chars(text: &str, start: usize, end: usize, replacement: &str) -> String {
    let byte_start = char_to_byte(text, start);
    let byte_end = char_to_byte(text, end);
    let mut out = String::with_capacity(text.len() + replacement.len());
    out.push_str(&text[..byte_start]);
    out.push_str(replacement);
    out.push_str(&text[byte_end..]);
    out
}

fn char_to_byte(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(b, _)| b)
        .unwrap_or(text.len())
}

/// Debug label for a path, e.g. `0.2.1`.
pub fn path_label(path: &[usize]) -> SmolStr {
    let mut s = String::new();
    for (i, idx) in path.iter().enumerate() {
        if i > 0 {
            s.push('.');
        }
        s.push_str(&idx.to_string());
    }
    SmolStr::new(s)
}
