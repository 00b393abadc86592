//! The formula template library.
//!
//! A static catalog of common constructions, grouped by topic, that the
//! edit session surfaces as one-click snippet insertions. The library is
//! plain serializable data so hosts can ship their own catalogs or extend
//! the standard one.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// One insertable snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Human-readable label shown in the picker.
    pub name: SmolStr,
    /// Raw source inserted at the session cursor, no delimiters.
    pub latex: SmolStr,
}

impl Template {
    pub fn new(name: &str, latex: &str) -> Self {
        Self {
            name: SmolStr::new(name),
            latex: SmolStr::new(latex),
        }
    }
}

/// A named group of templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateCategory {
    pub name: SmolStr,
    pub entries: Vec<Template>,
}

/// The full catalog a host presents alongside the edit session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateLibrary {
    pub categories: Vec<TemplateCategory>,
}

impl TemplateLibrary {
    /// The built-in catalog.
    pub fn standard() -> Self {
        let category = |name: &str, entries: &[(&str, &str)]| TemplateCategory {
            name: SmolStr::new(name),
            entries: entries
                .iter()
                .map(|(name, latex)| Template::new(name, latex))
                .collect(),
        };

        Self {
            categories: vec![
                category(
                    "Algebra",
                    &[
                        ("Fraction", r"\frac{}{}"),
                        ("Square root", r"\sqrt{}"),
                        ("Nth root", r"\sqrt[n]{}"),
                        ("Exponent", "x^{}"),
                        ("Subscript", "x_{}"),
                        ("Quadratic formula", r"x = \frac{-b \pm \sqrt{b^2-4ac}}{2a}"),
                    ],
                ),
                category(
                    "Calculus",
                    &[
                        ("Derivative", r"\frac{d}{dx}"),
                        ("Partial derivative", r"\frac{\partial}{\partial x}"),
                        ("Integral", r"\int_{a}^{b} \, dx"),
                        ("Limit", r"\lim_{x \to \infty}"),
                        ("Sum", r"\sum_{i=1}^{n}"),
                        ("Product", r"\prod_{i=1}^{n}"),
                    ],
                ),
                category(
                    "Geometry",
                    &[
                        ("Angle", r"\angle ABC"),
                        ("Triangle", r"\triangle ABC"),
                        ("Degrees", "90^\\circ"),
                        ("Pi", r"\pi"),
                        ("Vector", r"\vec{v}"),
                    ],
                ),
                category(
                    "Sets & logic",
                    &[
                        ("Element of", r"x \in A"),
                        ("Subset", r"A \subseteq B"),
                        ("Union", r"A \cup B"),
                        ("Intersection", r"A \cap B"),
                        ("For all", r"\forall x"),
                        ("There exists", r"\exists x"),
                    ],
                ),
            ],
        }
    }

    pub fn find(&self, name: &str) -> Option<&Template> {
        self.categories
            .iter()
            .flat_map(|c| c.entries.iter())
            .find(|t| t.name == name)
    }
}
