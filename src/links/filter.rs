//! Candidate link filtering and prioritization

use crate::config::LinkConfig;
use crate::crawler::Priority;
use crate::url::{normalize_url, page_slug, same_site};
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Topical page names that are never biographies
const DEFAULT_DENYLIST: &[&str] = &[
    r"^Lista_de_",
    r"^List_of_",
    r"^Anexo",
    r"^\d{1,4}$",
    r"^\d{1,2}_de_",
    r"(?i)guerra",
    r"(?i)batalha",
    r"(?i)cidade",
    r"(?i)estado",
    r"(?i)país",
    r"(?i)universidade",
    r"(?i)empresa",
    r"(?i)filme",
    r"(?i)livro",
    r"(?i)(?:^|_)(?:war|battle|city|university|company|film|book)(?:_|$)",
];

/// Two or three capitalized tokens, optionally joined by a name particle:
/// `Chico_Buarque`, `Machado_de_Assis`, `Maria_da_Silva_Costa`
const PROPER_NAME: &str =
    r"^\p{Lu}[\p{Ll}'-]+(?:_(?:(?:de|da|do|dos|das|e)_)?\p{Lu}[\p{Ll}'-]+){1,2}$";

/// Compiled filter applied to every candidate href
#[derive(Debug, Clone)]
pub struct LinkFilter {
    content_prefix: String,
    denylist: Vec<Regex>,
    proper_name: Regex,
}

impl LinkFilter {
    pub fn new(config: &LinkConfig) -> Result<Self, ConfigError> {
        let patterns: Vec<String> = match &config.url_denylist {
            Some(list) => list.clone(),
            None => DEFAULT_DENYLIST.iter().map(|p| p.to_string()).collect(),
        };

        let denylist = patterns
            .iter()
            .map(|p| {
                Regex::new(p)
                    .map_err(|e| ConfigError::InvalidPattern(format!("url_denylist '{}': {}", p, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let proper_name =
            Regex::new(PROPER_NAME).map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;

        Ok(Self {
            content_prefix: config.content_prefix.clone(),
            denylist,
            proper_name,
        })
    }

    /// Resolves an href against the origin page and keeps it only if it is a
    /// same-site content page
    ///
    /// Returns the normalized URL and its decoded page name.
    pub fn content_link(&self, href: &str, origin: &Url) -> Option<(Url, String)> {
        let href = href.trim();
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
            || href.starts_with("data:")
        {
            return None;
        }

        let joined = origin.join(href).ok()?;
        let url = normalize_url(joined.as_str()).ok()?;

        if !same_site(&url, origin) || url.query().is_some() {
            return None;
        }

        let slug = page_slug(&url, &self.content_prefix)?;

        // Namespaced pages (Categoria:, Ficheiro:, Especial:...) are administrative
        if slug.contains(':') {
            return None;
        }

        Some((url, slug))
    }

    /// Filters a content link and assigns its frontier tier
    pub fn candidate(&self, href: &str, origin: &Url) -> Option<(Url, Priority)> {
        let (url, slug) = self.content_link(href, origin)?;

        if self.denylist.iter().any(|re| re.is_match(&slug)) {
            return None;
        }

        Some((url, self.priority_of(&slug)))
    }

    /// High for slugs shaped like a personal name
    pub fn priority_of(&self, slug: &str) -> Priority {
        if self.proper_name.is_match(slug) {
            Priority::High
        } else {
            Priority::Normal
        }
    }
}
