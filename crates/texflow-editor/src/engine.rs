//! The live decoration engine.
//!
//! On every document change the engine re-scans all text leaves, derives
//! the full region list, and diffs it against the decorations currently
//! mounted. A decoration is keyed by `(from, latex, display)`: a region
//! whose latex changed at the same position is destroyed and recreated,
//! never mutated in place. Unmounts for stale keys happen before mounts
//! for fresh ones, and mounts follow a single left-to-right scan order, so
//! sibling widgets never swap non-deterministically.
//!
//! Rapid successive changes each trigger a full independent re-scan; the
//! scan is cheap and is deliberately not debounced.

use smol_str::{format_smolstr, SmolStr};

use texflow_model::{scan_document, Delimiter, MathRegion, Node};
use texflow_render::{typeset, Typeset};

use crate::host::{RegionObserver, WidgetSpec, WidgetSurface};

/// A mounted widget bound to one currently-valid math region.
///
/// Owned exclusively by the engine; interactions hand the region out by
/// value only.
#[derive(Debug, Clone)]
pub struct Decoration {
    /// Stable widget id (monotonic, never reused).
    pub id: SmolStr,
    pub region: MathRegion,
    pub typeset: Typeset,
}

/// Counts from one sync pass, mostly for tests and tracing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub mounted: usize,
    pub unmounted: usize,
    pub kept: usize,
}

/// Diffs decorations against the scanned region list on each change.
#[derive(Debug)]
pub struct DecorationEngine {
    delimiters: Vec<Delimiter>,
    decorations: Vec<Decoration>,
    next_id: usize,
}

impl Default for DecorationEngine {
    fn default() -> Self {
        Self::new(texflow_model::default_delimiters())
    }
}

impl DecorationEngine {
    pub fn new(delimiters: Vec<Delimiter>) -> Self {
        Self {
            delimiters,
            decorations: Vec::new(),
            next_id: 0,
        }
    }

    /// Current decorations, in document order.
    pub fn decorations(&self) -> &[Decoration] {
        &self.decorations
    }

    /// Find the decoration whose region starts at `from`.
    pub fn decoration_at(&self, from: usize) -> Option<&Decoration> {
        self.decorations.iter().find(|d| d.region.from == from)
    }

    /// Recompute decorations for the current document state.
    ///
    /// Call once with the starting document and then after every change.
    /// A renderer failure for one region mounts that region's error
    /// placeholder and leaves every sibling untouched.
    pub fn sync<S: WidgetSurface>(&mut self, doc: &Node, surface: &mut S) -> SyncStats {
        let regions = scan_document(doc, &self.delimiters);

        let mut old: Vec<Option<Decoration>> = self.decorations.drain(..).map(Some).collect();

        // Pair every new region with a surviving decoration, if its key
        // still matches.
        let mut carried: Vec<Option<Decoration>> = Vec::with_capacity(regions.len());
        for region in &regions {
            let slot = old.iter_mut().find(|slot| {
                slot.as_ref()
                    .is_some_and(|d| d.region.key() == region.key())
            });
            carried.push(slot.and_then(Option::take));
        }

        let mut stats = SyncStats::default();

        // Destroy stale decorations first, revealing their raw source.
        for stale in old.into_iter().flatten() {
            if let Err(e) = surface.unmount(&stale.id) {
                tracing::warn!(target: "texflow::editor", id = %stale.id, error = %e, "unmount failed");
            }
            surface.reveal_source(stale.region.from, stale.region.to);
            stats.unmounted += 1;
        }

        // Mount fresh decorations in region order.
        let mut next = Vec::with_capacity(regions.len());
        for (region, kept) in regions.into_iter().zip(carried) {
            match kept {
                Some(deco) => {
                    stats.kept += 1;
                    next.push(deco);
                }
                None => {
                    let deco = self.mount_region(region, surface);
                    stats.mounted += 1;
                    next.push(deco);
                }
            }
        }
        self.decorations = next;

        tracing::debug!(
            target: "texflow::editor",
            mounted = stats.mounted,
            unmounted = stats.unmounted,
            kept = stats.kept,
            "decoration sync"
        );
        stats
    }

    fn mount_region<S: WidgetSurface>(&mut self, region: MathRegion, surface: &mut S) -> Decoration {
        let id = format_smolstr!("w-{}", self.next_id);
        self.next_id += 1;

        let typeset = typeset(&region.latex, region.display);
        let spec = WidgetSpec {
            id: id.clone(),
            from: region.from,
            to: region.to,
            latex: region.latex.clone(),
            display: region.display,
            html: typeset.html().to_string(),
            is_error: typeset.is_error(),
        };

        surface.hide_source(region.from, region.to);
        if let Err(e) = surface.mount(&spec) {
            tracing::warn!(target: "texflow::editor", id = %id, error = %e, "mount failed");
        }

        Decoration {
            id,
            region,
            typeset,
        }
    }

    /// A widget body was clicked: hand the region to the observer for the
    /// edit flow. Returns false if no decoration starts at `from` (stale
    /// event).
    pub fn handle_click<O: RegionObserver>(&self, from: usize, observer: &O) -> bool {
        match self.decoration_at(from) {
            Some(deco) => {
                observer.edit_requested(deco.region.from, &deco.region.latex, deco.region.display);
                true
            }
            None => false,
        }
    }

    /// The hover delete control was clicked. Routed separately so deletion
    /// never triggers the edit flow.
    pub fn handle_delete<O: RegionObserver>(&self, from: usize, observer: &O) -> bool {
        match self.decoration_at(from) {
            Some(deco) => {
                observer
                    .delete_requested(deco.region.from, &deco.region.latex, deco.region.display);
                true
            }
            None => false,
        }
    }
}
