//! Opening-prose biographical patterns

use super::title::collapse_whitespace;
use crate::ConfigError;
use regex::Regex;
use scraper::{Html, Selector};

/// Containers holding the article body, most specific first
const BODY_SELECTORS: &[&str] = &[
    "#mw-content-text .mw-parser-output > p",
    "#mw-content-text p",
    ".mw-parser-output p",
    "p",
];

const BIRTH_DEATH: &str =
    r"\b(?:nasceu|nascido|nascida|morreu|faleceu|born|died)\b[^.]{0,40}?\b\d{4}\b";

const LIFE_SPAN: &str = r"\([^()]*\b\d{4}\b[^()]*[-–—][^()]*\)";

const FULL_DATE: &str = concat!(
    r"\b\d{1,2}(?:º)?\s+de\s+(?:janeiro|fevereiro|março|abril|maio|junho|julho|agosto|setembro|outubro|novembro|dezembro)\s+de\s+\d{4}\b",
    r"|\b\d{1,2}\s+(?:january|february|march|april|may|june|july|august|september|october|november|december)\s+\d{4}\b",
    r"|\b(?:january|february|march|april|may|june|july|august|september|october|november|december)\s+\d{1,2},\s+\d{4}\b",
);

/// Which prose pattern matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProseMatch {
    Copula,
    BirthDeath,
    LifeSpan,
    DateMentions(usize),
}

/// Compiled prose patterns
#[derive(Debug, Clone)]
pub struct ProsePatterns {
    copula: Regex,
    birth_death: Regex,
    life_span: Regex,
    full_date: Regex,
    min_date_mentions: usize,
}

impl ProsePatterns {
    /// Compiles the patterns for the given profession nouns
    pub fn new(professions: &[String], min_date_mentions: usize) -> Result<Self, ConfigError> {
        let alternation = professions
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");

        // "é um", "foi uma", "is a", "was an" + up to three qualifiers + profession
        let copula = format!(
            r"\b(?:é|foi|is|was)\s+(?:um|uma|a|an|the)\s+(?:[\p{{L}}-]+\s+){{0,3}}?(?:{})\b",
            alternation
        );

        Ok(Self {
            copula: compile(&copula)?,
            birth_death: compile(BIRTH_DEATH)?,
            life_span: compile(LIFE_SPAN)?,
            full_date: compile(FULL_DATE)?,
            min_date_mentions,
        })
    }

    /// Returns the first biographical pattern found in lowercased prose
    pub fn find(&self, prose: &str) -> Option<ProseMatch> {
        if self.copula.is_match(prose) {
            return Some(ProseMatch::Copula);
        }
        if self.life_span.is_match(prose) {
            return Some(ProseMatch::LifeSpan);
        }
        if self.birth_death.is_match(prose) {
            return Some(ProseMatch::BirthDeath);
        }

        let mentions = self.full_date.find_iter(prose).count();
        if mentions >= self.min_date_mentions {
            return Some(ProseMatch::DateMentions(mentions));
        }

        None
    }
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern(e.to_string()))
}

/// Returns the first `window` characters of the opening paragraph, lowercased
pub fn opening_prose(document: &Html, window: usize) -> Option<String> {
    let paragraph = BODY_SELECTORS
        .iter()
        .filter_map(|raw| Selector::parse(raw).ok())
        .find_map(|selector| {
            document
                .select(&selector)
                .map(|p| collapse_whitespace(&p.text().collect::<String>()))
                .find(|text| !text.is_empty())
        })?;

    Some(paragraph.chars().take(window).collect::<String>().to_lowercase())
}
