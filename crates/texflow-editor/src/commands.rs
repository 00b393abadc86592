//! Programmatic region commands.
//!
//! These are the host document's mutation surface for math regions. Every
//! command re-derives the region list at call time and verifies the target
//! still matches before touching anything: a stale position (the text moved
//! or changed under a concurrent edit) fails cleanly with no partial
//! mutation, and the caller decides whether to retry against a fresh scan.

use texflow_model::offset::path_label;
use texflow_model::{
    node_at_path_mut, resolve_offset, scan_document, splice_chars, wrap_math, Delimiter,
    MathRegion, Node,
};

/// Error type for region commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// No region starts at the given offset any more.
    #[error("no math region starts at offset {from}")]
    StaleRegion { from: usize },

    /// No region carries the expected source text.
    #[error("no math region with the expected source")]
    NoSuchFormula,

    /// The offset does not resolve to a text position.
    #[error("offset {at} does not resolve to a text position")]
    OffsetOutOfBounds { at: usize },
}

/// Replace the region starting at `from` with newly wrapped math source.
///
/// The new region keeps the delimiter class implied by `display`.
pub fn replace_math_at(
    doc: &mut Node,
    from: usize,
    new_latex: &str,
    display: bool,
    delimiters: &[Delimiter],
) -> Result<MathRegion, CommandError> {
    let region = region_starting_at(doc, from, delimiters)?;
    let replacement = wrap_math(new_latex, display);
    rewrite_region(doc, &region, &replacement)?;
    Ok(region)
}

/// Replace the first region whose source equals `old_latex`, keeping its
/// display mode.
pub fn replace_math_exact(
    doc: &mut Node,
    old_latex: &str,
    new_latex: &str,
    delimiters: &[Delimiter],
) -> Result<MathRegion, CommandError> {
    let region = scan_document(doc, delimiters)
        .into_iter()
        .find(|r| r.latex == old_latex)
        .ok_or(CommandError::NoSuchFormula)?;
    let replacement = wrap_math(new_latex, region.display);
    rewrite_region(doc, &region, &replacement)?;
    Ok(region)
}

/// Delete the region starting at `from`, removing its delimited text
/// entirely. Returns the removed region.
pub fn delete_math_at(
    doc: &mut Node,
    from: usize,
    delimiters: &[Delimiter],
) -> Result<MathRegion, CommandError> {
    let region = region_starting_at(doc, from, delimiters)?;
    rewrite_region(doc, &region, "")?;
    Ok(region)
}

/// Insert plain text at a flat offset.
///
/// An empty document grows a paragraph to hold the text; this is the
/// insert flow's landing point for a confirmed new formula.
pub fn insert_text(doc: &mut Node, at: usize, text: &str) -> Result<(), CommandError> {
    if at == 0 && texflow_model::collect_text_spans(doc).is_empty() {
        doc.content.push(Node::paragraph(vec![Node::text(text)]));
        return Ok(());
    }

    let (path, local) = resolve_offset(doc, at).ok_or(CommandError::OffsetOutOfBounds { at })?;
    let leaf = node_at_path_mut(doc, &path).ok_or(CommandError::OffsetOutOfBounds { at })?;
    let current = leaf.text.take().unwrap_or_default();
    leaf.text = Some(splice_chars(&current, local, local, text));
    Ok(())
}

fn region_starting_at(
    doc: &Node,
    from: usize,
    delimiters: &[Delimiter],
) -> Result<MathRegion, CommandError> {
    scan_document(doc, delimiters)
        .into_iter()
        .find(|r| r.from == from)
        .ok_or_else(|| {
            tracing::debug!(target: "texflow::editor", from, "stale region reference");
            CommandError::StaleRegion { from }
        })
}

/// Rewrite one region's char range inside its text leaf.
///
/// Regions never straddle leaves, so the whole range lives in the leaf
/// that `from` resolves to.
fn rewrite_region(
    doc: &mut Node,
    region: &MathRegion,
    replacement: &str,
) -> Result<(), CommandError> {
    let (path, local) = resolve_offset(doc, region.from)
        .ok_or(CommandError::OffsetOutOfBounds { at: region.from })?;
    tracing::trace!(
        target: "texflow::editor",
        path = %path_label(&path),
        from = region.from,
        "rewriting region"
    );
    let leaf = node_at_path_mut(doc, &path)
        .ok_or(CommandError::OffsetOutOfBounds { at: region.from })?;
    let len = region.to - region.from;
    let current = leaf.text.take().unwrap_or_default();
    leaf.text = Some(splice_chars(&current, local, local + len, replacement));
    Ok(())
}
