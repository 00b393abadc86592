//! The structured document tree.
//!
//! A document is a recursive `Node` tree with a `"doc"` root whose children
//! are block nodes. Text lives only in `"text"` leaves; math is never a node
//! kind - it is recognized lexically in text leaves at render time (see
//! [`crate::scan`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

/// Node kind tags used by the wire format.
pub mod kind {
    pub const DOC: &str = "doc";
    pub const PARAGRAPH: &str = "paragraph";
    pub const HEADING: &str = "heading";
    pub const BULLET_LIST: &str = "bulletList";
    pub const ORDERED_LIST: &str = "orderedList";
    pub const LIST_ITEM: &str = "listItem";
    pub const IMAGE: &str = "image";
    pub const HARD_BREAK: &str = "hardBreak";
    pub const TEXT: &str = "text";
}

/// Inline formatting mark on a text leaf (bold, italic, link, color).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: SmolStr,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<BTreeMap<SmolStr, Value>>,
}

impl Mark {
    pub fn new(kind: impl Into<SmolStr>) -> Self {
        Self {
            kind: kind.into(),
            attrs: None,
        }
    }

    pub fn with_attr(mut self, key: impl Into<SmolStr>, value: impl Into<Value>) -> Self {
        self.attrs
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }
}

/// A node in the document tree.
///
/// Wire form (structured serialization):
/// `{ "type": "doc", "content": [ { "type": "paragraph", ... } ] }`.
/// Empty `content`/`marks` and absent `attrs`/`text` are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub kind: SmolStr,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<BTreeMap<SmolStr, Value>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Node>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
}

impl Node {
    pub fn new(kind: impl Into<SmolStr>) -> Self {
        Self {
            kind: kind.into(),
            attrs: None,
            content: Vec::new(),
            text: None,
            marks: Vec::new(),
        }
    }

    /// Document root with the given block children.
    pub fn doc(content: Vec<Node>) -> Self {
        let mut node = Self::new(kind::DOC);
        node.content = content;
        node
    }

    pub fn paragraph(content: Vec<Node>) -> Self {
        let mut node = Self::new(kind::PARAGRAPH);
        node.content = content;
        node
    }

    pub fn heading(level: u8, content: Vec<Node>) -> Self {
        let mut node = Self::new(kind::HEADING);
        node.content = content;
        node.with_attr("level", level as u64)
    }

    pub fn bullet_list(items: Vec<Node>) -> Self {
        let mut node = Self::new(kind::BULLET_LIST);
        node.content = items;
        node
    }

    pub fn ordered_list(items: Vec<Node>) -> Self {
        let mut node = Self::new(kind::ORDERED_LIST);
        node.content = items;
        node
    }

    pub fn list_item(content: Vec<Node>) -> Self {
        let mut node = Self::new(kind::LIST_ITEM);
        node.content = content;
        node
    }

    /// Text leaf. The only node kind that may carry math delimiter syntax.
    pub fn text(text: impl Into<String>) -> Self {
        let mut node = Self::new(kind::TEXT);
        node.text = Some(text.into());
        node
    }

    pub fn image(src: &str, alt: Option<&str>) -> Self {
        let mut node = Self::new(kind::IMAGE).with_attr("src", src);
        if let Some(alt) = alt {
            node = node.with_attr("alt", alt);
        }
        node
    }

    pub fn hard_break() -> Self {
        Self::new(kind::HARD_BREAK)
    }

    pub fn with_attr(mut self, key: impl Into<SmolStr>, value: impl Into<Value>) -> Self {
        self.attrs
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_marks(mut self, marks: Vec<Mark>) -> Self {
        self.marks = marks;
        self
    }

    pub fn is_text(&self) -> bool {
        self.kind == kind::TEXT
    }

    pub fn is_doc(&self) -> bool {
        self.kind == kind::DOC
    }

    /// Block-level nodes occupy their own vertical slot in the layout.
    pub fn is_block(&self) -> bool {
        matches!(
            self.kind.as_str(),
            kind::DOC
                | kind::PARAGRAPH
                | kind::HEADING
                | kind::BULLET_LIST
                | kind::ORDERED_LIST
                | kind::LIST_ITEM
                | kind::IMAGE
        )
    }

    /// Length in chars of this leaf's text (0 for non-text nodes).
    pub fn text_len(&self) -> usize {
        self.text.as_deref().map_or(0, |t| t.chars().count())
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.as_ref().and_then(|a| a.get(key))
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attr(key).and_then(Value::as_str)
    }

    pub fn attr_u64(&self, key: &str) -> Option<u64> {
        self.attr(key).and_then(Value::as_u64)
    }

    pub fn has_mark(&self, kind: &str) -> bool {
        self.marks.iter().any(|m| m.kind == kind)
    }

    /// Concatenated text of this subtree, without separators.
    pub fn flat_text(&self) -> String {
        let mut out = String::new();
        self.collect_flat_text(&mut out);
        out
    }

    fn collect_flat_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.content {
            child.collect_flat_text(out);
        }
    }
}
