//! Context-aware link extraction
//!
//! Listing pages (category-style member lists) are harvested in bulk from
//! their member area. Every other page only contributes links found in prose
//! regions whose text carries biographical vocabulary, which keeps unrelated
//! cross-references out of the frontier.

mod filter;

pub use filter::LinkFilter;

use crate::classifier::signals::{contains_term, term_list};
use crate::config::LinkConfig;
use crate::crawler::{CrawlTarget, OriginContext, Priority};
use crate::storage::normalize_name;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Member-list containers on listing pages, tried in order
const LISTING_SELECTORS: &[&str] = &["#mw-pages a[href]", "#mw-content-text a[href]", "a[href]"];

/// Prose regions on content pages, tried in order
const PROSE_SELECTORS: &[&str] = &["#mw-content-text p, #mw-content-text li", "p, li"];

/// Article body containers used for mention extraction
const CONTENT_SELECTORS: &[&str] = &["#mw-content-text", ".mw-parser-output", "#bodyContent"];

/// Words that mark a paragraph as biographical context
const TRIGGER_WORDS: &[&str] = &[
    "nasceu",
    "nascido",
    "nascida",
    "morreu",
    "faleceu",
    "casou",
    "casado",
    "casada",
    "filho",
    "filha",
    "formou",
    "político",
    "ator",
    "atriz",
    "escritor",
    "cantor",
    "born",
    "died",
    "married",
    "son of",
    "daughter of",
    "politician",
    "actor",
    "writer",
    "singer",
];

/// Compiled link extraction policy
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    filter: LinkFilter,
    listing_markers: Vec<String>,
    trigger_words: Vec<String>,
    listing_link_cap: usize,
    prose_link_cap: usize,
    prose_region_limit: usize,
}

impl LinkExtractor {
    pub fn new(config: &LinkConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            filter: LinkFilter::new(config)?,
            listing_markers: config.listing_markers.clone(),
            trigger_words: term_list(config.trigger_words.as_ref(), TRIGGER_WORDS),
            listing_link_cap: config.listing_link_cap,
            prose_link_cap: config.prose_link_cap,
            prose_region_limit: config.prose_region_limit,
        })
    }

    /// Returns true when the URL is a listing/category page
    pub fn is_listing(&self, url: &Url) -> bool {
        let path = urlencoding::decode(url.path())
            .map(|p| p.into_owned())
            .unwrap_or_else(|_| url.path().to_string());

        self.listing_markers.iter().any(|marker| path.contains(marker.as_str()))
    }

    /// Derives candidate targets from a parsed document
    ///
    /// # Arguments
    ///
    /// * `document` - The parsed page
    /// * `origin` - The URL the page was fetched from
    ///
    /// # Returns
    ///
    /// Deduplicated targets, high priority before normal, each tier in
    /// document order.
    pub fn extract_links(&self, document: &Html, origin: &Url) -> Vec<CrawlTarget> {
        let (hrefs, context, cap) = if self.is_listing(origin) {
            (
                self.listing_hrefs(document),
                OriginContext::CategoryListing,
                self.listing_link_cap,
            )
        } else {
            (
                self.prose_hrefs(document),
                OriginContext::ProseLink,
                self.prose_link_cap,
            )
        };

        let mut seen = HashSet::new();
        seen.insert(origin.clone());

        let accepted: Vec<(Url, Priority)> = hrefs
            .iter()
            .filter_map(|href| self.filter.candidate(href, origin))
            .filter(|(url, _)| seen.insert(url.clone()))
            .take(cap)
            .collect();

        let (high, normal): (Vec<_>, Vec<_>) = accepted
            .into_iter()
            .partition(|(_, priority)| *priority == Priority::High);

        high.into_iter()
            .chain(normal)
            .map(|(url, priority)| CrawlTarget::new(url, priority, context))
            .collect()
    }

    /// Parses raw HTML and extracts links
    pub fn extract_links_from_html(&self, html: &str, origin: &Url) -> Vec<CrawlTarget> {
        let document = Html::parse_document(html);
        self.extract_links(&document, origin)
    }

    /// Returns the normalized names of every content page the document links
    /// to, from both link targets and link text
    ///
    /// This is the mention relation a co-mention graph is built from; names
    /// are comparable with [`normalize_name`] applied to stored titles.
    pub fn mentioned_names(&self, document: &Html, origin: &Url) -> Vec<String> {
        let Ok(anchor) = Selector::parse("a[href]") else {
            return Vec::new();
        };

        let root = CONTENT_SELECTORS
            .iter()
            .filter_map(|raw| Selector::parse(raw).ok())
            .find_map(|selector| document.select(&selector).next())
            .unwrap_or_else(|| document.root_element());

        let mut seen = HashSet::new();
        let mut names = Vec::new();

        for link in root.select(&anchor) {
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            let Some((_, slug)) = self.filter.content_link(href, origin) else {
                continue;
            };

            let text = link.text().collect::<String>();
            if text.trim().chars().count() < 2 {
                continue;
            }

            for name in [normalize_name(&slug), normalize_name(&text)] {
                if !name.is_empty() && seen.insert(name.clone()) {
                    names.push(name);
                }
            }
        }

        names
    }

    fn listing_hrefs(&self, document: &Html) -> Vec<String> {
        LISTING_SELECTORS
            .iter()
            .filter_map(|raw| Selector::parse(raw).ok())
            .map(|selector| hrefs_of(document.select(&selector)))
            .find(|hrefs| !hrefs.is_empty())
            .unwrap_or_default()
    }

    fn prose_hrefs(&self, document: &Html) -> Vec<String> {
        let Ok(anchor) = Selector::parse("a[href]") else {
            return Vec::new();
        };

        let regions: Vec<ElementRef<'_>> = PROSE_SELECTORS
            .iter()
            .filter_map(|raw| Selector::parse(raw).ok())
            .map(|selector| document.select(&selector).collect::<Vec<_>>())
            .find(|regions| !regions.is_empty())
            .unwrap_or_default();

        regions
            .into_iter()
            .take(self.prose_region_limit)
            .filter(|region| {
                let text = region.text().collect::<String>().to_lowercase();
                self.trigger_words.iter().any(|word| contains_term(&text, word))
            })
            .flat_map(|region| hrefs_of(region.select(&anchor)))
            .collect()
    }
}

fn hrefs_of<'a>(elements: impl Iterator<Item = ElementRef<'a>>) -> Vec<String> {
    elements
        .filter_map(|el| el.value().attr("href"))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> LinkExtractor {
        LinkExtractor::new(&LinkConfig::default()).unwrap()
    }

    fn url(path: &str) -> Url {
        Url::parse(&format!("https://pt.wikipedia.org{}", path)).unwrap()
    }

    #[test]
    fn test_listing_detection() {
        let e = extractor();
        assert!(e.is_listing(&url("/wiki/Categoria:Cantores_do_Brasil")));
        assert!(e.is_listing(&url("/wiki/Category:Brazilian_singers")));
        assert!(!e.is_listing(&url("/wiki/Gal_Costa")));
    }

    #[test]
    fn test_listing_reads_member_area() {
        let html = r#"<html><body>
            <div id="mw-subcategories"><a href="/wiki/Categoria:Sambistas">Sambistas</a></div>
            <div id="mw-pages">
              <a href="/wiki/Gal_Costa">Gal Costa</a>
              <a href="/wiki/Caetano_Veloso">Caetano Veloso</a>
              <a href="/wiki/Xuxa">Xuxa</a>
            </div>
            <a href="/wiki/Elis_Regina">outside</a>
            </body></html>"#;
        let targets =
            extractor().extract_links_from_html(html, &url("/wiki/Categoria:Cantores_do_Brasil"));

        let paths: Vec<&str> = targets.iter().map(|t| t.url.path()).collect();
        assert_eq!(paths, vec!["/wiki/Gal_Costa", "/wiki/Caetano_Veloso", "/wiki/Xuxa"]);
        assert!(targets.iter().all(|t| t.origin == OriginContext::CategoryListing));
        assert_eq!(targets[2].priority, Priority::Normal);
    }

    #[test]
    fn test_listing_cap() {
        let config = LinkConfig {
            listing_link_cap: 2,
            ..LinkConfig::default()
        };
        let e = LinkExtractor::new(&config).unwrap();
        let html = r#"<div id="mw-pages"><a href="/wiki/Ana_Lima">a</a>
            <a href="/wiki/Bia_Lima">b</a><a href="/wiki/Cris_Lima">c</a></div>"#;

        let targets = e.extract_links_from_html(html, &url("/wiki/Categoria:X"));
        assert_eq!(targets.len(), 2);
    }

    #[test]
    fn test_prose_links_gated_by_triggers() {
        let html = r#"<div id="mw-content-text">
            <p>Ela nasceu em Salvador, filha de <a href="/wiki/Mariah_Costa">Mariah</a>.</p>
            <p>A cidade tem praias e o <a href="/wiki/Farol_da_Barra">farol</a>.</p>
            <ul><li>Casou com <a href="/wiki/Jo%C3%A3o_Silva">João</a></li></ul>
            </div>"#;
        let targets = extractor().extract_links_from_html(html, &url("/wiki/Gal_Costa"));

        let paths: Vec<&str> = targets.iter().map(|t| t.url.path()).collect();
        assert_eq!(paths, vec!["/wiki/Mariah_Costa", "/wiki/Jo%C3%A3o_Silva"]);
        assert!(targets.iter().all(|t| t.origin == OriginContext::ProseLink));
    }

    #[test]
    fn test_high_tier_first_and_dedup() {
        let html = r#"<div id="mw-content-text"><p>Ele nasceu no
            <a href="/wiki/Samba">samba</a>, ao lado de <a href="/wiki/Cartola_Silva">Cartola</a>,
            <a href="/wiki/Samba#Origem">samba</a> e <a href="/wiki/Nelson_Cavaquinho">Nelson</a>.</p></div>"#;
        let targets = extractor().extract_links_from_html(html, &url("/wiki/Noel_Rosa"));

        let paths: Vec<&str> = targets.iter().map(|t| t.url.path()).collect();
        assert_eq!(
            paths,
            vec!["/wiki/Cartola_Silva", "/wiki/Nelson_Cavaquinho", "/wiki/Samba"]
        );
        assert_eq!(targets[0].priority, Priority::High);
        assert_eq!(targets[2].priority, Priority::Normal);
    }

    #[test]
    fn test_self_link_skipped() {
        let html = r#"<p>Ela nasceu em <a href="/wiki/Gal_Costa">Gal</a>.</p>"#;
        let targets = extractor().extract_links_from_html(html, &url("/wiki/Gal_Costa"));
        assert!(targets.is_empty());
    }

    #[test]
    fn test_prose_region_limit() {
        let config = LinkConfig {
            prose_region_limit: 1,
            ..LinkConfig::default()
        };
        let e = LinkExtractor::new(&config).unwrap();
        let html = r#"<p>Sem gatilho <a href="/wiki/Ana_Lima">a</a></p>
            <p>Ela nasceu com <a href="/wiki/Bia_Lima">b</a></p>"#;

        assert!(e.extract_links_from_html(html, &url("/wiki/X")).is_empty());
    }

    #[test]
    fn test_mentioned_names() {
        let html = r#"<div id="mw-content-text">
            <p><a href="/wiki/Tom_Jobim">Antônio Carlos Jobim</a> e
            <a href="/wiki/Vin%C3%ADcius_de_Moraes">Vinícius de Moraes</a>
            <a href="/wiki/Categoria:M%C3%BAsicos">Músicos</a>
            <a href="/wiki/Tom_Jobim">Tom Jobim</a></p></div>
            <a href="/wiki/Fora_do_Conteudo">fora</a>"#;
        let document = Html::parse_document(html);
        let names = extractor().mentioned_names(&document, &url("/wiki/Garota_de_Ipanema"));

        assert_eq!(
            names,
            vec!["tom jobim", "antônio carlos jobim", "vinícius de moraes"]
        );
    }
}
