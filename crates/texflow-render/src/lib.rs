//! texflow-render: LaTeX math typesetting via pulldown-latex → MathML.
//!
//! The one hard contract here: [`typeset`] never fails outward. Malformed
//! math source produces a visibly-marked error placeholder carrying the raw
//! source, never a panic, never empty output. The render configuration is
//! fixed, so a given `(latex, display)` pair always produces the same
//! output - pagination depends on remeasurement being stable.

use pulldown_latex::{
    config::DisplayMode, config::RenderConfig, mathml::push_mathml, Parser, Storage,
};

/// Result of typesetting one formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Typeset {
    /// Successfully rendered MathML.
    Formula { mathml: String, display: bool },
    /// Rendering failed - placeholder HTML with the raw source, plus the
    /// error message for diagnostics.
    Error { html: String, message: String },
}

impl Typeset {
    /// The HTML to mount, regardless of outcome.
    pub fn html(&self) -> &str {
        match self {
            Typeset::Formula { mathml, .. } => mathml,
            Typeset::Error { html, .. } => html,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Typeset::Error { .. })
    }
}

/// Typeset LaTeX math to MathML.
///
/// # Arguments
/// * `latex` - the math source, without `$`/`$$` delimiters
/// * `display` - block-level (centered, own line) if true, inline otherwise
pub fn typeset(latex: &str, display: bool) -> Typeset {
    let storage = Storage::new();
    let parser = Parser::new(latex, &storage);
    let config = RenderConfig {
        display_mode: if display {
            DisplayMode::Block
        } else {
            DisplayMode::Inline
        },
        ..Default::default()
    };

    let mut mathml = String::new();

    // Collect events, tracking any errors.
    let events: Vec<_> = parser.collect();
    let errors: Vec<String> = events
        .iter()
        .filter_map(|e| e.as_ref().err().map(|err| err.to_string()))
        .collect();

    if errors.is_empty() {
        if let Err(e) = push_mathml(&mut mathml, events.into_iter(), config) {
            let message = e.to_string();
            tracing::warn!(target: "texflow::render", %message, "mathml emit failed");
            return Typeset::Error {
                html: error_html(latex, &message, display),
                message,
            };
        }
        Typeset::Formula { mathml, display }
    } else {
        let message = errors.join("; ");
        tracing::warn!(target: "texflow::render", %message, "math parse failed");
        Typeset::Error {
            html: error_html(latex, &message, display),
            message,
        }
    }
}

/// Placeholder for formulas that failed to typeset: raw source in
/// monospace, styled distinctly by the `math-error` class.
fn error_html(latex: &str, error: &str, display: bool) -> String {
    let mode_class = if display { "math-display" } else { "math-inline" };
    let mut escaped_latex = String::new();
    let mut escaped_error = String::new();
    escape_html(&mut escaped_latex, latex);
    escape_html(&mut escaped_error, error);
    format!(
        r#"<span class="math math-error {mode_class}" title="{escaped_error}"><code>{escaped_latex}</code></span>"#
    )
}

fn escape_html(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_inline_math() {
        let result = typeset("x^2", false);
        assert!(matches!(result, Typeset::Formula { .. }));
        assert!(result.html().contains("<math"));
        assert!(result.html().contains("</math>"));
    }

    #[test]
    fn renders_display_math() {
        let result = typeset(r"\frac{a}{b}", true);
        assert!(matches!(result, Typeset::Formula { display: true, .. }));
        assert!(result.html().contains("<mfrac"));
    }

    #[test]
    fn handles_invalid_latex() {
        // Unclosed brace.
        let result = typeset(r"\frac{a", false);
        assert!(result.is_error());
        if let Typeset::Error { html, message } = result {
            assert!(html.contains("math-error"));
            assert!(html.contains(r"\frac{a"));
            assert!(!message.is_empty());
        }
    }

    #[test]
    fn error_output_is_never_empty() {
        for bad in [r"\frac{a", r"\unknowncommandxyz{q}", "{"] {
            let result = typeset(bad, true);
            assert!(!result.html().is_empty());
        }
    }

    #[test]
    fn same_input_renders_identically() {
        // Pagination remeasures; output must be stable per input.
        let a = typeset(r"\sum_{i=0}^{n} x_i", true);
        let b = typeset(r"\sum_{i=0}^{n} x_i", true);
        assert_eq!(a, b);
    }

    #[test]
    fn error_placeholder_escapes_source() {
        let result = typeset(r"\frac{<script>", false);
        assert!(result.is_error());
        assert!(!result.html().contains("<script>"));
        assert!(result.html().contains("&lt;script&gt;"));
    }
}
