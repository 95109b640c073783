//! Person/non-person page classifier
//!
//! A [`Classifier`] scores one parsed document against tiered signal sets and
//! returns a one-shot [`ClassificationResult`]. Stages run in fixed order and
//! the first decisive one wins:
//!
//! 1. Title hard exclusions (non-person)
//! 2. Parenthesized year range in the title (person)
//! 3. Structured panel fields: any negating field is non-person, an affirming
//!    score at or above the threshold is person
//! 4. Opening prose patterns, only when the panel is absent or weakly affirming
//! 5. Otherwise non-person
//!
//! The classifier holds only compiled, immutable policy, so one instance is
//! shared by every worker without locking.

mod panel;
mod prose;
pub mod signals;
mod title;

pub use panel::PanelVerdict;
pub use prose::ProseMatch;
pub use title::canonical_title;

use crate::config::ClassifierConfig;
use crate::ConfigError;
use panel::PanelSignals;
use prose::ProsePatterns;
use regex::Regex;
use scraper::Html;
use signals::{first_match, term_list};
use url::Url;

/// The rule that produced a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisiveSignal {
    TitleDates,
    InfoboxFields,
    ProsePattern,
    None,
}

impl DecisiveSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisiveSignal::TitleDates => "title-dates",
            DecisiveSignal::InfoboxFields => "infobox-fields",
            DecisiveSignal::ProsePattern => "prose-pattern",
            DecisiveSignal::None => "none",
        }
    }
}

/// Why a page was judged non-person
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// No title element could be found
    MissingTitle,

    /// The title contains an excluded term
    ExcludedTitle(String),

    /// The structured panel carries a negating field
    NegatingField(String),

    /// No stage produced a positive signal
    NoSignal,
}

/// One-shot judgment over a single document
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub is_person: bool,

    /// Title as displayed by the page; empty when none was found
    pub canonical_title: String,

    /// Affirming panel score, 0 when the panel was absent or not reached
    pub signal_score: f32,

    pub decisive_signal: DecisiveSignal,

    /// Set for every non-person verdict
    pub rejection: Option<Rejection>,
}

impl ClassificationResult {
    fn person(title: String, score: f32, signal: DecisiveSignal) -> Self {
        Self {
            is_person: true,
            canonical_title: title,
            signal_score: score,
            decisive_signal: signal,
            rejection: None,
        }
    }

    fn rejected(title: String, score: f32, rejection: Rejection) -> Self {
        Self {
            is_person: false,
            canonical_title: title,
            signal_score: score,
            decisive_signal: DecisiveSignal::None,
            rejection: Some(rejection),
        }
    }
}

/// Compiled classification policy
#[derive(Debug, Clone)]
pub struct Classifier {
    title_exclusions: Vec<String>,
    title_dates: Regex,
    panel: PanelSignals,
    prose: ProsePatterns,
    threshold: f32,
    prose_window: usize,
}

impl Classifier {
    /// Compiles a classifier from configuration
    ///
    /// Signal lists left unset in the configuration fall back to the built-in
    /// Portuguese and English vocabularies.
    pub fn new(config: &ClassifierConfig) -> Result<Self, ConfigError> {
        let title_dates = Regex::new(title::DATE_RANGE)
            .map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;

        let professions = term_list(config.professions.as_ref(), signals::PROFESSIONS);

        Ok(Self {
            title_exclusions: term_list(config.title_exclusions.as_ref(), signals::TITLE_EXCLUSIONS),
            title_dates,
            panel: PanelSignals {
                affirming: term_list(config.affirming_fields.as_ref(), signals::AFFIRMING_FIELDS),
                weak_affirming: term_list(
                    config.weak_affirming_fields.as_ref(),
                    signals::WEAK_AFFIRMING_FIELDS,
                ),
                negating: term_list(config.negating_fields.as_ref(), signals::NEGATING_FIELDS),
            },
            prose: ProsePatterns::new(&professions, config.min_date_mentions)?,
            threshold: config.affirming_threshold,
            prose_window: config.prose_window,
        })
    }

    /// Classifies a parsed document
    ///
    /// # Arguments
    ///
    /// * `document` - The parsed page
    /// * `url` - The page URL, used only for diagnostics
    ///
    /// # Returns
    ///
    /// The verdict, the canonical title and the rule that decided it. Pages
    /// without a title are non-person rather than an error.
    pub fn classify(&self, document: &Html, url: &Url) -> ClassificationResult {
        let Some(title) = canonical_title(document) else {
            tracing::debug!("No title found at {}", url);
            return ClassificationResult::rejected(String::new(), 0.0, Rejection::MissingTitle);
        };

        let lowered = title.to_lowercase();
        if let Some(term) = first_match(&lowered, &self.title_exclusions) {
            return ClassificationResult::rejected(
                title,
                0.0,
                Rejection::ExcludedTitle(term.to_string()),
            );
        }

        if self.title_dates.is_match(&title) {
            return ClassificationResult::person(title, 0.0, DecisiveSignal::TitleDates);
        }

        let panel_score = match panel::panel_text(document).map(|text| self.panel.score(&text)) {
            Some(PanelVerdict::Negated(field)) => {
                return ClassificationResult::rejected(title, 0.0, Rejection::NegatingField(field));
            }
            Some(PanelVerdict::Affirmed(score)) if score >= self.threshold => {
                return ClassificationResult::person(title, score, DecisiveSignal::InfoboxFields);
            }
            Some(PanelVerdict::Affirmed(score)) if score <= 0.0 => {
                return ClassificationResult::rejected(title, 0.0, Rejection::NoSignal);
            }
            Some(PanelVerdict::Affirmed(score)) => score,
            None => 0.0,
        };

        let prose_match = prose::opening_prose(document, self.prose_window)
            .and_then(|text| self.prose.find(&text));

        match prose_match {
            Some(found) => {
                tracing::trace!("Prose pattern {:?} at {}", found, url);
                ClassificationResult::person(title, panel_score, DecisiveSignal::ProsePattern)
            }
            None => ClassificationResult::rejected(title, panel_score, Rejection::NoSignal),
        }
    }

    /// Parses raw HTML and classifies it
    pub fn classify_html(&self, html: &str, url: &Url) -> ClassificationResult {
        let document = Html::parse_document(html);
        self.classify(&document, url)
    }
}
