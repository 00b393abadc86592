//! The formula edit session.
//!
//! A modal interactive flow for composing or editing one formula's raw
//! source: `Closed -> Open(seeded) -> editing -> Confirmed | Cancelled ->
//! Closed`. At most one session is open at a time; the session never holds
//! the document, only the seed values by copy, so cancelling is free and
//! leaves the document exactly as it was.

use smol_str::SmolStr;

use texflow_model::wrap_math;
use texflow_render::{typeset, Typeset};

/// How the confirmed formula will be laid out.
///
/// Centered and Block both wrap with the display delimiter; centering is
/// styling the host applies, not wire syntax, so re-scanning a Centered
/// confirm reports a display region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayStyle {
    #[default]
    Inline,
    Centered,
    Block,
}

impl DisplayStyle {
    pub fn is_display(self) -> bool {
        !matches!(self, DisplayStyle::Inline)
    }

    /// Wrap raw source with the delimiter pair for this style.
    pub fn wrap(self, latex: &str) -> String {
        wrap_math(latex, self.is_display())
    }

    pub fn from_display_flag(display: bool) -> Self {
        if display {
            DisplayStyle::Block
        } else {
            DisplayStyle::Inline
        }
    }
}

/// The confirmed outcome of a session.
///
/// `text` is the delimiter-wrapped source ready for insertion; `target` is
/// the original region's start for the edit flow (None for the insert
/// flow, which lands at the host's cursor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmed {
    pub latex: String,
    pub style: DisplayStyle,
    pub text: String,
    pub target: Option<usize>,
}

/// One modal formula composition flow.
#[derive(Debug, Clone, Default)]
pub struct FormulaSession {
    open: bool,
    original: SmolStr,
    edited: String,
    style: DisplayStyle,
    target: Option<usize>,
    revision: u64,
}

impl FormulaSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open for an existing region (edit flow), seeded with its source.
    pub fn open_edit(&mut self, latex: &str, display: bool, from: usize) {
        self.open = true;
        self.original = SmolStr::new(latex);
        self.edited = latex.to_string();
        self.style = DisplayStyle::from_display_flag(display);
        self.target = Some(from);
        self.revision += 1;
    }

    /// Open blank for a new formula (insert flow).
    pub fn open_insert(&mut self, default_style: DisplayStyle) {
        self.open = true;
        self.original = SmolStr::default();
        self.edited = String::new();
        self.style = default_style;
        self.target = None;
        self.revision += 1;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Bumped on every mutation; lets the host discard preview results
    /// computed for an older state or a closed session.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn text(&self) -> &str {
        &self.edited
    }

    pub fn set_text(&mut self, text: &str) {
        if !self.open {
            return;
        }
        self.edited = text.to_string();
        self.revision += 1;
    }

    /// Insert a snippet at a char position inside the edit buffer, without
    /// closing the session (template library insertions).
    pub fn insert_snippet(&mut self, cursor: usize, snippet: &str) {
        if !self.open {
            return;
        }
        let cursor = cursor.min(self.edited.chars().count());
        self.edited = texflow_model::splice_chars(&self.edited, cursor, cursor, snippet);
        self.revision += 1;
    }

    pub fn style(&self) -> DisplayStyle {
        self.style
    }

    /// Selectable at any time before confirm; affects only how the
    /// confirmed text is wrapped.
    pub fn set_style(&mut self, style: DisplayStyle) {
        if !self.open {
            return;
        }
        self.style = style;
        self.revision += 1;
    }

    /// Live preview of the current buffer. Failures render the error
    /// placeholder and never block further editing.
    pub fn preview(&self) -> Typeset {
        typeset(&self.edited, self.style.is_display())
    }

    /// Whether the buffer differs from what the session opened with.
    /// Hosts use this to skip a discard prompt on cancel.
    pub fn is_dirty(&self) -> bool {
        self.open && self.edited != self.original
    }

    /// Confirm is disabled while the buffer is blank.
    pub fn can_confirm(&self) -> bool {
        self.open && !self.edited.trim().is_empty()
    }

    /// Close the session and hand back the wrapped text.
    ///
    /// Returns None (and stays open) when the buffer is blank.
    pub fn confirm(&mut self) -> Option<Confirmed> {
        if !self.can_confirm() {
            return None;
        }
        let latex = self.edited.trim().to_string();
        let confirmed = Confirmed {
            text: self.style.wrap(&latex),
            latex,
            style: self.style,
            target: self.target,
        };
        self.close();
        Some(confirmed)
    }

    /// Discard all session state. The document was never touched.
    pub fn cancel(&mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.open = false;
        self.original = SmolStr::default();
        self.edited = String::new();
        self.target = None;
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::insert_text;
    use texflow_model::{default_delimiters, scan_document, Node};

    #[test]
    fn test_edit_flow_seeds_from_region() {
        let mut session = FormulaSession::new();
        session.open_edit("x^2", true, 7);
        assert!(session.is_open());
        assert_eq!(session.text(), "x^2");
        assert_eq!(session.style(), DisplayStyle::Block);

        let confirmed = session.confirm().unwrap();
        assert_eq!(confirmed.target, Some(7));
        assert_eq!(confirmed.text, "$$x^2$$");
        assert!(!session.is_open());
    }

    #[test]
    fn test_round_trip_through_empty_document() {
        let mut session = FormulaSession::new();
        session.open_insert(DisplayStyle::Inline);
        session.set_text("y=mx+b");
        session.set_style(DisplayStyle::Block);
        let confirmed = session.confirm().unwrap();

        let mut doc = Node::doc(vec![]);
        insert_text(&mut doc, 0, &confirmed.text).unwrap();

        let regions = scan_document(&doc, &default_delimiters());
        assert_eq!(regions.len(), 1);
        assert!(regions[0].display);
        assert_eq!(regions[0].latex, "y=mx+b");
    }

    #[test]
    fn test_blank_text_disables_confirm() {
        let mut session = FormulaSession::new();
        session.open_insert(DisplayStyle::Inline);
        assert!(!session.can_confirm());
        session.set_text("   ");
        assert!(!session.can_confirm());
        assert!(session.confirm().is_none());
        // Still open: the user can keep typing.
        assert!(session.is_open());
    }

    #[test]
    fn test_cancel_discards_everything() {
        let mut session = FormulaSession::new();
        session.open_edit("a+b", false, 3);
        assert!(!session.is_dirty());
        session.set_text("changed");
        assert!(session.is_dirty());
        session.cancel();
        assert!(!session.is_open());
        assert_eq!(session.text(), "");
        // A confirm after cancel yields nothing.
        assert!(session.confirm().is_none());
    }

    #[test]
    fn test_centered_wraps_as_display() {
        let mut session = FormulaSession::new();
        session.open_insert(DisplayStyle::Centered);
        session.set_text("a");
        let confirmed = session.confirm().unwrap();
        assert_eq!(confirmed.text, "$$a$$");
        assert_eq!(confirmed.style, DisplayStyle::Centered);
    }

    #[test]
    fn test_preview_error_does_not_block_editing() {
        let mut session = FormulaSession::new();
        session.open_insert(DisplayStyle::Inline);
        session.set_text(r"\frac{a");
        assert!(session.preview().is_error());
        // Editing continues; a fixed buffer previews cleanly.
        session.set_text(r"\frac{a}{b}");
        assert!(!session.preview().is_error());
        assert!(session.can_confirm());
    }

    #[test]
    fn test_revision_tracks_mutations() {
        let mut session = FormulaSession::new();
        let r0 = session.revision();
        session.open_insert(DisplayStyle::Inline);
        let r1 = session.revision();
        assert!(r1 > r0);
        session.set_text("x");
        assert!(session.revision() > r1);
        // A preview computed at r1 is stale now: the host checks revision
        // before applying it.
    }

    #[test]
    fn test_snippet_insertion_at_cursor() {
        let mut session = FormulaSession::new();
        session.open_insert(DisplayStyle::Inline);
        session.set_text("a+");
        session.insert_snippet(2, r"\sqrt{}");
        assert_eq!(session.text(), r"a+\sqrt{}");
        // Past-the-end cursor clamps.
        session.insert_snippet(99, "!");
        assert_eq!(session.text(), r"a+\sqrt{}!");
    }

    #[test]
    fn test_mutations_ignored_while_closed() {
        let mut session = FormulaSession::new();
        session.set_text("x");
        session.insert_snippet(0, "y");
        session.set_style(DisplayStyle::Block);
        assert_eq!(session.text(), "");
        assert_eq!(session.style(), DisplayStyle::Inline);
    }

    #[test]
    fn test_confirm_trims_buffer() {
        let mut session = FormulaSession::new();
        session.open_insert(DisplayStyle::Inline);
        session.set_text("  x+1  ");
        let confirmed = session.confirm().unwrap();
        assert_eq!(confirmed.latex, "x+1");
        assert_eq!(confirmed.text, "$x+1$");
    }
}
