//! Framework-agnostic live math editing for texflow documents.
//!
//! The crate is built around three pieces:
//!
//! - [`DecorationEngine`]: re-scans the document on every change and diffs
//!   the region list against the mounted widgets, through the host's
//!   [`WidgetSurface`].
//! - Region commands ([`replace_math_at`], [`delete_math_at`],
//!   [`insert_text`]): stale-guarded document mutations addressed by flat
//!   char offsets.
//! - [`FormulaSession`]: the modal compose/edit flow with live preview and
//!   the [`TemplateLibrary`] snippet catalog.
//!
//! Nothing here touches a real UI. Hosts implement [`WidgetSurface`] and
//! [`RegionObserver`] over whatever framework they render with.

pub mod commands;
pub mod engine;
pub mod host;
pub mod session;
pub mod templates;

pub use commands::{
    delete_math_at, insert_text, replace_math_at, replace_math_exact, CommandError,
};
pub use engine::{Decoration, DecorationEngine, SyncStats};
pub use host::{
    HostError, RecordingSurface, RegionObserver, SurfaceOp, WidgetSpec, WidgetSurface,
};
pub use session::{Confirmed, DisplayStyle, FormulaSession};
pub use templates::{Template, TemplateCategory, TemplateLibrary};
