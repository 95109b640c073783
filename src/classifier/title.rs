//! Canonical title extraction and title-level signals

use scraper::{Html, Selector};

/// Selectors tried in order when looking for the canonical title
const TITLE_SELECTORS: &[&str] = &["span.mw-page-title-main", "h1#firstHeading", "h1"];

/// Suffix separators a `<title>` element uses before the site name
const SITE_SUFFIX_SEPARATORS: &[&str] = &[" – ", " — ", " - ", " | "];

/// Parenthesized year range in a title: `(1950–2020)`, `(1950-)`
pub const DATE_RANGE: &str = r"\(\s*\d{4}\s*[-–—]\s*(?:\d{4})?\s*\)";

/// Extracts the canonical title of a document
///
/// Tries the page-title span, then the first heading, then the `<title>`
/// element with its site suffix stripped. Returns `None` when none of them
/// carries any text.
pub fn canonical_title(document: &Html) -> Option<String> {
    for raw in TITLE_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };

        if let Some(text) = document
            .select(&selector)
            .next()
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty())
        {
            return Some(text);
        }
    }

    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| strip_site_suffix(&collapse_whitespace(&el.text().collect::<String>())))
        .filter(|t| !t.is_empty())
}

/// Removes a trailing " – Site Name" part from a `<title>` text
fn strip_site_suffix(title: &str) -> String {
    SITE_SUFFIX_SEPARATORS
        .iter()
        .filter_map(|sep| title.rfind(sep))
        .max()
        .map(|idx| title[..idx].trim().to_string())
        .unwrap_or_else(|| title.to_string())
}

/// Joins runs of whitespace into single spaces and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
