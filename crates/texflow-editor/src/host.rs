//! Host editor capability traits.
//!
//! The decoration engine does not render anything itself: the host editor
//! framework supplies a surface that can mount a positioned widget over a
//! text range and visually suppress the raw source underneath it. Any
//! framework offering those primitives can host the engine - retained-mode
//! DOM, a virtual-DOM layer, or a native toolkit.

use smol_str::SmolStr;

/// Error type for host surface operations.
#[derive(Debug, Clone)]
pub struct HostError(pub String);

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for HostError {}

impl From<&str> for HostError {
    fn from(s: &str) -> Self {
        HostError(s.to_string())
    }
}

impl From<String> for HostError {
    fn from(s: String) -> Self {
        HostError(s)
    }
}

/// Everything the host needs to place one widget.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetSpec {
    /// Stable widget identity for the host's element bookkeeping.
    pub id: SmolStr,
    /// Flat char offset where the region starts.
    pub from: usize,
    /// Flat char offset one past the region's end.
    pub to: usize,
    /// Raw math source, without delimiters.
    pub latex: SmolStr,
    /// Display-mode region (own line) vs inline.
    pub display: bool,
    /// The typeset output (or error placeholder) to show.
    pub html: String,
    /// Whether `html` is the error placeholder.
    pub is_error: bool,
}

/// Positioned visual overlays over the document.
///
/// `mount`/`unmount` calls arrive in the order the diff discovers regions
/// (left to right), so sibling widgets never swap order. Hiding a source
/// range only suppresses it visually; the text stays in the document.
pub trait WidgetSurface {
    /// Insert a widget at its region's start offset.
    fn mount(&mut self, widget: &WidgetSpec) -> Result<(), HostError>;

    /// Remove a widget and its interactive affordances.
    fn unmount(&mut self, id: &SmolStr) -> Result<(), HostError>;

    /// Visually suppress the raw delimited source for a mounted widget.
    fn hide_source(&mut self, from: usize, to: usize);

    /// Restore visibility of a range whose widget went away.
    fn reveal_source(&mut self, from: usize, to: usize);
}

impl<T: WidgetSurface> WidgetSurface for &mut T {
    fn mount(&mut self, widget: &WidgetSpec) -> Result<(), HostError> {
        (*self).mount(widget)
    }

    fn unmount(&mut self, id: &SmolStr) -> Result<(), HostError> {
        (*self).unmount(id)
    }

    fn hide_source(&mut self, from: usize, to: usize) {
        (*self).hide_source(from, to)
    }

    fn reveal_source(&mut self, from: usize, to: usize) {
        (*self).reveal_source(from, to)
    }
}

/// Receives region interactions routed through the engine.
///
/// Clicking a widget's body requests editing; the hover-revealed delete
/// control requests deletion. Both hand over the region by value only.
pub trait RegionObserver {
    /// The widget body was clicked: open an edit flow for this region.
    fn edit_requested(&self, from: usize, latex: &str, display: bool);

    /// The delete control was clicked.
    fn delete_requested(&self, from: usize, latex: &str, display: bool);
}

/// Unit type implementation - interactions are ignored.
impl RegionObserver for () {
    fn edit_requested(&self, _from: usize, _latex: &str, _display: bool) {}
    fn delete_requested(&self, _from: usize, _latex: &str, _display: bool) {}
}

impl<T: RegionObserver> RegionObserver for &T {
    fn edit_requested(&self, from: usize, latex: &str, display: bool) {
        (*self).edit_requested(from, latex, display)
    }

    fn delete_requested(&self, from: usize, latex: &str, display: bool) {
        (*self).delete_requested(from, latex, display)
    }
}

impl<T: RegionObserver> RegionObserver for Option<T> {
    fn edit_requested(&self, from: usize, latex: &str, display: bool) {
        if let Some(obs) = self.as_ref() {
            obs.edit_requested(from, latex, display)
        }
    }

    fn delete_requested(&self, from: usize, latex: &str, display: bool) {
        if let Some(obs) = self.as_ref() {
            obs.delete_requested(from, latex, display)
        }
    }
}

/// What happened on a surface, for assertions and debugging.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Mount(WidgetSpec),
    Unmount(SmolStr),
    Hide(usize, usize),
    Reveal(usize, usize),
}

/// An in-memory surface that records every operation.
///
/// Useful both as a test double and as a tracing shim wrapped around a real
/// surface during development.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub ops: Vec<SurfaceOp>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mounted_ids(&self) -> Vec<SmolStr> {
        let mut live = Vec::new();
        for op in &self.ops {
            match op {
                SurfaceOp::Mount(w) => live.push(w.id.clone()),
                SurfaceOp::Unmount(id) => live.retain(|l| l != id),
                _ => {}
            }
        }
        live
    }

    pub fn mounts(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, SurfaceOp::Mount(_)))
            .count()
    }

    pub fn unmounts(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, SurfaceOp::Unmount(_)))
            .count()
    }
}

impl WidgetSurface for RecordingSurface {
    fn mount(&mut self, widget: &WidgetSpec) -> Result<(), HostError> {
        self.ops.push(SurfaceOp::Mount(widget.clone()));
        Ok(())
    }

    fn unmount(&mut self, id: &SmolStr) -> Result<(), HostError> {
        self.ops.push(SurfaceOp::Unmount(id.clone()));
        Ok(())
    }

    fn hide_source(&mut self, from: usize, to: usize) {
        self.ops.push(SurfaceOp::Hide(from, to));
    }

    fn reveal_source(&mut self, from: usize, to: usize) {
        self.ops.push(SurfaceOp::Reveal(from, to));
    }
}
