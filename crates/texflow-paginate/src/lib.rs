//! Fixed-height pagination of texflow documents.
//!
//! Splits a document's top-level blocks into pages whose cumulative
//! rendered height fits the page geometry. Real heights come from the
//! host through [`BlockMeasurer`]: the host mounts each block off-screen
//! at content width, lets layout settle, and reports the measured pixel
//! height. The crate itself never waits or renders.
//!
//! Pages are immutable once computed. A geometry or document change means
//! a full new run; [`Paginator`] keeps a generation counter so a run that
//! completes after a newer one started is simply discarded.
//!
//! Every degenerate input resolves to a ready state rather than an error:
//! pagination feeds a preview view, and a preview that never stops loading
//! is worse than a single unsplit page.

use serde::Serialize;

use texflow_model::{DocumentSource, Node};

/// Target page dimensions, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageGeometry {
    pub page_height: f32,
    pub padding: f32,
}

impl PageGeometry {
    pub fn new(page_height: f32, padding: f32) -> Self {
        Self {
            page_height,
            padding,
        }
    }

    /// Vertical space available for content on one page.
    pub fn content_height(&self) -> f32 {
        self.page_height - 2.0 * self.padding
    }
}

/// One page of top-level blocks, in document order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub blocks: Vec<Node>,
}

/// The outcome of one pagination run.
///
/// `ready` is always true once a run returns; it exists so hosts can keep
/// a single not-yet-paginated state alongside completed runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pagination {
    pub pages: Vec<Page>,
    pub ready: bool,
}

impl Pagination {
    fn ready(pages: Vec<Page>) -> Self {
        Self { pages, ready: true }
    }

    /// Total number of blocks across all pages.
    pub fn block_count(&self) -> usize {
        self.pages.iter().map(|p| p.blocks.len()).sum()
    }
}

/// Host-side block measurement.
///
/// The host mounts the block invisibly at the target content width, waits
/// for layout to settle, and reads back the rendered height. `ready`
/// reports whether the measurement container exists at all; `measure`
/// returns None when a particular block cannot be measured.
pub trait BlockMeasurer {
    fn ready(&self) -> bool;

    fn measure(&mut self, block: &Node) -> Option<f32>;
}

impl<T: BlockMeasurer> BlockMeasurer for &mut T {
    fn ready(&self) -> bool {
        (**self).ready()
    }

    fn measure(&mut self, block: &Node) -> Option<f32> {
        (**self).measure(block)
    }
}

/// A measurer with scripted heights, for tests and headless runs.
#[derive(Debug, Clone)]
pub struct FixedMeasurer {
    pub is_ready: bool,
    heights: Vec<Option<f32>>,
    next: usize,
    fallback: Option<f32>,
}

impl FixedMeasurer {
    /// Reports the given heights in order, then `fallback` for any
    /// further blocks.
    pub fn new(heights: Vec<f32>, fallback: f32) -> Self {
        Self {
            is_ready: true,
            heights: heights.into_iter().map(Some).collect(),
            next: 0,
            fallback: Some(fallback),
        }
    }

    /// Every block measures the same height.
    pub fn uniform(height: f32) -> Self {
        Self::new(Vec::new(), height)
    }

    /// A measurer whose container has not mounted.
    pub fn unmounted() -> Self {
        Self {
            is_ready: false,
            heights: Vec::new(),
            next: 0,
            fallback: None,
        }
    }
}

impl BlockMeasurer for FixedMeasurer {
    fn ready(&self) -> bool {
        self.is_ready
    }

    fn measure(&mut self, _block: &Node) -> Option<f32> {
        let h = self
            .heights
            .get(self.next)
            .copied()
            .unwrap_or(self.fallback);
        self.next += 1;
        h
    }
}

/// Split the source document into pages for the given geometry.
///
/// Greedy walk over top-level blocks: a page closes when adding the next
/// block would exceed the content height. A block taller than the content
/// height on its own still gets a page of its own, unsplit. Concatenating
/// all pages' blocks reproduces the original block sequence.
pub fn paginate<M: BlockMeasurer>(
    source: &DocumentSource,
    geometry: PageGeometry,
    measurer: &mut M,
) -> Pagination {
    let doc = match source.normalize() {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(target: "texflow::paginate", error = %e, "unparseable source, single raw page");
            return raw_fallback(source);
        }
    };

    let blocks = doc.content;
    if blocks.is_empty() {
        return Pagination::ready(Vec::new());
    }

    if !measurer.ready() {
        tracing::debug!(target: "texflow::paginate", "measurer not mounted, single page");
        return Pagination::ready(vec![Page { blocks }]);
    }

    let mut heights = Vec::with_capacity(blocks.len());
    for block in &blocks {
        match measurer.measure(block) {
            Some(h) => heights.push(h),
            None => {
                tracing::debug!(target: "texflow::paginate", "block failed to measure, single page");
                return Pagination::ready(vec![Page { blocks }]);
            }
        }
    }

    let limit = geometry.content_height();
    let mut pages = Vec::new();
    let mut current = Vec::new();
    let mut current_height = 0.0f32;

    for (block, height) in blocks.into_iter().zip(heights) {
        if !current.is_empty() && current_height + height > limit {
            pages.push(Page {
                blocks: std::mem::take(&mut current),
            });
            current_height = 0.0;
        }
        current_height += height;
        current.push(block);
    }
    if !current.is_empty() {
        pages.push(Page { blocks: current });
    }

    tracing::debug!(
        target: "texflow::paginate",
        pages = pages.len(),
        "pagination complete"
    );
    Pagination::ready(pages)
}

/// The unparseable-content fallback: one page holding the raw source as
/// plain text, so the preview shows something instead of spinning.
fn raw_fallback(source: &DocumentSource) -> Pagination {
    let blocks = match source.raw() {
        Some(raw) if !raw.is_empty() => vec![Node::paragraph(vec![Node::text(raw)])],
        _ => Vec::new(),
    };
    Pagination::ready(vec![Page { blocks }])
}

/// Identifies one pagination run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassToken(u64);

/// Serializes pagination runs without hard cancellation.
///
/// A measurement pass already in flight when a new run starts is not
/// interrupted; its completion is rejected by a generation check instead.
#[derive(Debug, Default)]
pub struct Paginator {
    generation: u64,
    current: Option<Pagination>,
}

impl Paginator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a run. Any pass still in flight for an earlier token becomes
    /// stale.
    pub fn begin(&mut self) -> PassToken {
        self.generation += 1;
        PassToken(self.generation)
    }

    /// Deliver a finished run. Returns false (and changes nothing) when a
    /// newer run began after this token was issued.
    pub fn complete(&mut self, token: PassToken, pagination: Pagination) -> bool {
        if token.0 != self.generation {
            tracing::debug!(
                target: "texflow::paginate",
                token = token.0,
                generation = self.generation,
                "stale pagination pass discarded"
            );
            return false;
        }
        self.current = Some(pagination);
        true
    }

    pub fn current(&self) -> Option<&Pagination> {
        self.current.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.current.as_ref().is_some_and(|p| p.ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texflow_model::Node;

    fn doc_of(n: usize) -> DocumentSource {
        let blocks = (0..n)
            .map(|i| Node::paragraph(vec![Node::text(format!("block {i}"))]))
            .collect();
        DocumentSource::Tree(Node::doc(blocks))
    }

    // 1000px page, 100px padding: 800px of content.
    fn geometry() -> PageGeometry {
        PageGeometry::new(1000.0, 100.0)
    }

    #[test]
    fn test_greedy_split() {
        let mut measurer = FixedMeasurer::uniform(300.0);
        let result = paginate(&doc_of(5), geometry(), &mut measurer);
        // 300*2 fits in 800, a third does not.
        assert_eq!(result.pages.len(), 3);
        assert_eq!(result.pages[0].blocks.len(), 2);
        assert_eq!(result.pages[1].blocks.len(), 2);
        assert_eq!(result.pages[2].blocks.len(), 1);
        assert!(result.ready);
    }

    #[test]
    fn test_coverage_preserves_block_sequence() {
        let source = doc_of(7);
        let original = source.normalize().unwrap().content;
        let mut measurer = FixedMeasurer::new(vec![100.0, 700.0, 50.0, 900.0, 10.0], 400.0);
        let result = paginate(&source, geometry(), &mut measurer);

        let rejoined: Vec<Node> = result
            .pages
            .iter()
            .flat_map(|p| p.blocks.iter().cloned())
            .collect();
        assert_eq!(rejoined, original);
    }

    #[test]
    fn test_empty_document_is_zero_pages_ready() {
        let mut measurer = FixedMeasurer::uniform(100.0);
        let result = paginate(&doc_of(0), geometry(), &mut measurer);
        assert!(result.pages.is_empty());
        assert!(result.ready);
    }

    #[test]
    fn test_oversized_block_gets_own_page() {
        // Middle block alone exceeds the 800px content height.
        let mut measurer = FixedMeasurer::new(vec![200.0, 2000.0, 200.0], 0.0);
        let result = paginate(&doc_of(3), geometry(), &mut measurer);
        assert_eq!(result.pages.len(), 3);
        assert_eq!(result.pages[1].blocks.len(), 1);
        assert_eq!(result.block_count(), 3);
    }

    #[test]
    fn test_unmounted_measurer_falls_back_to_single_page() {
        let mut measurer = FixedMeasurer::unmounted();
        let result = paginate(&doc_of(4), geometry(), &mut measurer);
        assert_eq!(result.pages.len(), 1);
        assert_eq!(result.pages[0].blocks.len(), 4);
        assert!(result.ready);
    }

    #[test]
    fn test_unmeasurable_block_falls_back_to_single_page() {
        let mut measurer = FixedMeasurer::new(vec![100.0], 0.0);
        measurer.heights.push(None);
        let result = paginate(&doc_of(3), geometry(), &mut measurer);
        assert_eq!(result.pages.len(), 1);
        assert_eq!(result.pages[0].blocks.len(), 3);
    }

    #[test]
    fn test_unparseable_html_yields_raw_page() {
        let source = DocumentSource::Html("<p>unclosed <em>tag</p>".to_string());
        let mut measurer = FixedMeasurer::uniform(100.0);
        let result = paginate(&source, geometry(), &mut measurer);
        assert!(result.ready);
        assert_eq!(result.pages.len(), 1);
        assert_eq!(
            result.pages[0].blocks[0].flat_text(),
            "<p>unclosed <em>tag</p>"
        );
    }

    #[test]
    fn test_html_source_paginates_like_tree() {
        let source = DocumentSource::Html("<p>one</p><p>two $x$</p><p>three</p>".to_string());
        let mut measurer = FixedMeasurer::uniform(500.0);
        let result = paginate(&source, geometry(), &mut measurer);
        assert_eq!(result.pages.len(), 2);
        assert_eq!(result.block_count(), 3);
    }

    #[test]
    fn test_stale_pass_is_discarded() {
        let mut paginator = Paginator::new();
        let old = paginator.begin();
        let new = paginator.begin();

        let mut measurer = FixedMeasurer::uniform(100.0);
        let stale_result = paginate(&doc_of(1), geometry(), &mut measurer);
        assert!(!paginator.complete(old, stale_result));
        assert!(paginator.current().is_none());
        assert!(!paginator.is_ready());

        let fresh = paginate(&doc_of(2), geometry(), &mut measurer);
        assert!(paginator.complete(new, fresh));
        assert!(paginator.is_ready());
        assert_eq!(paginator.current().unwrap().block_count(), 2);
    }

    #[test]
    fn test_exact_fit_stays_on_one_page() {
        // 400 + 400 == 800 exactly: no overflow, one page.
        let mut measurer = FixedMeasurer::uniform(400.0);
        let result = paginate(&doc_of(2), geometry(), &mut measurer);
        assert_eq!(result.pages.len(), 1);
    }
}
