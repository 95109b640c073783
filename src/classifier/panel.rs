//! Structured summary panel (infobox) inspection

use super::signals::{contains_term, first_match};
use super::title::collapse_whitespace;
use scraper::{ElementRef, Html, Selector};

/// Selectors for the structured panel, most specific first
const PANEL_SELECTORS: &[&str] = &[
    "table.infobox",
    "table.infobox_v2",
    ".infobox",
    ".infobox_v2",
];

/// Outcome of scanning a panel's text
#[derive(Debug, Clone, PartialEq)]
pub enum PanelVerdict {
    /// A negating field was found; carries the field name
    Negated(String),

    /// Accumulated affirming score
    Affirmed(f32),
}

/// Field sets and weights used to score a panel
#[derive(Debug, Clone)]
pub struct PanelSignals {
    pub affirming: Vec<String>,
    pub weak_affirming: Vec<String>,
    pub negating: Vec<String>,
}

impl PanelSignals {
    /// Scores lowercased panel text
    ///
    /// Any negating field dominates. Otherwise each distinct affirming field
    /// adds 1.0 and each weak one 0.5.
    pub fn score(&self, panel_text: &str) -> PanelVerdict {
        if let Some(field) = first_match(panel_text, &self.negating) {
            return PanelVerdict::Negated(field.to_string());
        }

        let strong = self
            .affirming
            .iter()
            .filter(|field| contains_term(panel_text, field))
            .count() as f32;

        let weak = self
            .weak_affirming
            .iter()
            .filter(|field| contains_term(panel_text, field))
            .count() as f32;

        PanelVerdict::Affirmed(strong + weak * 0.5)
    }
}

/// Returns the lowercased text of the first structured panel, if any
///
/// Rows are rendered as `label: value` lines so field-name substrings like
/// `"spouse:"` are found whether or not the markup carries the colon.
pub fn panel_text(document: &Html) -> Option<String> {
    let panel = PANEL_SELECTORS
        .iter()
        .filter_map(|raw| Selector::parse(raw).ok())
        .find_map(|selector| document.select(&selector).next())?;

    let row_selector = Selector::parse("tr").ok()?;
    let mut lines: Vec<String> = panel
        .select(&row_selector)
        .filter_map(row_line)
        .collect();

    if lines.is_empty() {
        lines.push(collapse_whitespace(&panel.text().collect::<String>()));
    }

    Some(lines.join("\n").to_lowercase())
}

/// Renders one table row as `label: value`
fn row_line(row: ElementRef<'_>) -> Option<String> {
    let cells: Vec<String> = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "th" | "td"))
        .map(|cell| collapse_whitespace(&cell.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .collect();

    match cells.as_slice() {
        [] => None,
        [only] => Some(only.clone()),
        [label, rest @ ..] => Some(format!("{}: {}", label, rest.join(" "))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::signals::{
        term_list, AFFIRMING_FIELDS, NEGATING_FIELDS, WEAK_AFFIRMING_FIELDS,
    };

    fn signals() -> PanelSignals {
        PanelSignals {
            affirming: term_list(None, AFFIRMING_FIELDS),
            weak_affirming: term_list(None, WEAK_AFFIRMING_FIELDS),
            negating: term_list(None, NEGATING_FIELDS),
        }
    }

    #[test]
    fn test_panel_rows_rendered_with_colons() {
        let doc = Html::parse_document(
            r#"<table class="infobox"><tr><th>Occupation</th><td>Actor</td></tr>
            <tr><th>Spouse</th><td>Jane  Doe</td></tr><tr><td colspan="2">Portrait</td></tr></table>"#,
        );
        let text = panel_text(&doc).unwrap();
        assert_eq!(text, "occupation: actor\nspouse: jane doe\nportrait");
    }

    #[test]
    fn test_no_panel() {
        let doc = Html::parse_document("<p>Just prose</p>");
        assert_eq!(panel_text(&doc), None);
    }

    #[test]
    fn test_div_panel_without_rows() {
        let doc = Html::parse_document(
            r#"<div class="infobox">Nascimento: 1940 Ocupação: cantor</div>"#,
        );
        let text = panel_text(&doc).unwrap();
        assert_eq!(signals().score(&text), PanelVerdict::Affirmed(2.0));
    }

    #[test]
    fn test_strong_and_weak_weights() {
        let verdict = signals().score("born: 1950\nnationality: brazilian");
        assert_eq!(verdict, PanelVerdict::Affirmed(1.5));
    }

    #[test]
    fn test_negation_dominates() {
        let verdict = signals().score("born: 1950\nspouse: x\nfounded: 1990");
        assert_eq!(verdict, PanelVerdict::Negated("founded:".to_string()));
    }

    #[test]
    fn test_empty_panel_scores_zero() {
        assert_eq!(signals().score("imagem"), PanelVerdict::Affirmed(0.0));
    }
}
