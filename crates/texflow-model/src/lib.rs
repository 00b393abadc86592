//! texflow-model: document tree and math span recognition.
//!
//! This crate provides:
//! - `Node`/`Mark` - the structured document tree and its JSON wire form
//! - HTML normalization into the same node vocabulary
//! - `scan`/`scan_document` - lexical recognition of delimited math spans
//! - The flat character-offset space shared by the decoration engine and
//!   the region commands

pub mod html;
pub mod node;
pub mod offset;
pub mod scan;
pub mod source;

pub use html::{parse_html, to_html};
pub use node::{kind, Mark, Node};
pub use offset::{
    collect_text_spans, doc_char_len, node_at_path, node_at_path_mut, resolve_offset,
    splice_chars, TextSpan,
};
pub use scan::{
    default_delimiters, scan, scan_document, wrap_math, Delimiter, MathRegion, MathSpan,
};
pub use smol_str::SmolStr;
pub use source::DocumentSource;

/// Error type for document model operations.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Markup could not be converted to the structured tree.
    #[error("unparseable markup: {message}")]
    Markup { message: String },

    /// Structured JSON did not deserialize into the node vocabulary.
    #[error("invalid document json: {0}")]
    Json(#[from] serde_json::Error),
}
