//! Document input normalization.
//!
//! Content arrives from storage either as an HTML string or as the
//! structured JSON tree; both normalize to the same `Node` tree before
//! decoration or pagination.

use crate::html::parse_html;
use crate::node::Node;
use crate::ModelError;

/// A document as handed over by the surrounding application.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentSource {
    /// An HTML string.
    Html(String),
    /// The structured tree, serialized as JSON (`{ "type": "doc", ... }`).
    Json(String),
    /// An already-built tree.
    Tree(Node),
}

impl DocumentSource {
    /// Normalize to the structured tree.
    pub fn normalize(&self) -> Result<Node, ModelError> {
        match self {
            DocumentSource::Html(html) => parse_html(html),
            DocumentSource::Json(json) => {
                let node: Node = serde_json::from_str(json)?;
                Ok(node)
            }
            DocumentSource::Tree(node) => Ok(node.clone()),
        }
    }

    /// The raw text of the source, used by fallback paths that must show
    /// something readable when normalization fails.
    pub fn raw(&self) -> Option<&str> {
        match self {
            DocumentSource::Html(s) | DocumentSource::Json(s) => Some(s),
            DocumentSource::Tree(_) => None,
        }
    }
}

impl From<Node> for DocumentSource {
    fn from(node: Node) -> Self {
        DocumentSource::Tree(node)
    }
}
