//! Plain-text report layout.
//!
//! Each document section opens with a banner:
//!
//! ```text
//! ================================================================================
//!                               COURSE 2: PERCEPTRON
//! ================================================================================
//! ```
//!
//! followed by one block per slide or page, each framed by a thin rule.

use crate::{Unit, UnitKind};

/// Formatter for section banners and unit blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFormatter {
    /// Width of the `=` banner around section titles.
    banner_width: usize,

    /// Width of the `─` rule around unit headings.
    rule_width: usize,
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self {
            banner_width: 80,
            rule_width: 60,
        }
    }
}

impl ReportFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Banner lines for a section: leading gap, rule, centered title, rule.
    pub fn section_header(&self, title: &str) -> Vec<String> {
        let rule = "=".repeat(self.banner_width);
        vec![
            "\n\n".to_string(),
            rule.clone(),
            format!("{:^width$}", title.to_uppercase(), width = self.banner_width),
            rule,
        ]
    }

    /// Render one unit: rule, heading, text or placeholder, image references.
    pub fn unit_block(&self, kind: UnitKind, unit: &Unit) -> String {
        let rule = "─".repeat(self.rule_width);
        let mut lines = vec![
            format!("\n{}", rule),
            format!("{} {}", kind.label(), unit.number),
            format!("{}\n", rule),
        ];

        if unit.has_text() {
            lines.push(unit.text.join("\n"));
        } else {
            lines.push(kind.no_text_placeholder().to_string());
        }

        if !unit.image_refs.is_empty() {
            lines.push(format!("\nImages on this {}:", kind.noun()));
            for reference in &unit.image_refs {
                lines.push(format!("   - {}", reference));
            }
        }

        lines.push(String::new());
        lines.join("\n")
    }

    /// Render every unit of a document in order.
    pub fn format_units(&self, kind: UnitKind, units: &[Unit]) -> String {
        units
            .iter()
            .map(|unit| self.unit_block(kind, unit))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
