//! Canonical question resolver
//!
//! Maps free text onto a catalog template:
//! - renders every canonical question (labelled `Q1`, `Q2`, ...) with its
//!   alternates into a classification prompt
//! - asks the external classifier to pick one
//! - accepts the answer only if it carries a label and names a template
//!
//! Anything else is a no-match. Classifier failures are never surfaced.

use crate::capability::CanonicalClassifier;
use crate::catalog::{FaqCatalog, QuestionCatalog};
use crate::models::{InteractionStep, Template};
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, warn};

lazy_static! {
    static ref LABEL_PREFIX: Regex = Regex::new(r"^Q\d+:?").expect("label pattern is valid");
}

const QUOTE_CHARS: &[char] = &['"', '\'', '\u{201C}', '\u{201D}'];

/// A matched template with its script in step order
#[derive(Debug, Clone)]
pub struct ResolvedFaq {
    pub template: Template,
    pub steps: Vec<InteractionStep>,
}

#[derive(Debug, Clone)]
pub enum Resolution {
    Matched(ResolvedFaq),
    NoMatch,
}

impl Resolution {
    pub fn is_match(&self) -> bool {
        matches!(self, Resolution::Matched(_))
    }

    pub fn faq_key(&self) -> Option<u32> {
        match self {
            Resolution::Matched(resolved) => Some(resolved.template.faq_key),
            Resolution::NoMatch => None,
        }
    }
}

pub struct Resolver {
    catalog: Arc<FaqCatalog>,
    classifier: Arc<dyn CanonicalClassifier>,
}

impl Resolver {
    pub fn new(catalog: Arc<FaqCatalog>, classifier: Arc<dyn CanonicalClassifier>) -> Self {
        Self {
            catalog,
            classifier,
        }
    }

    pub async fn resolve(&self, user_text: &str) -> Resolution {
        let prompt = build_classification_prompt(&self.catalog.questions, user_text);

        let answer = match self.classifier.classify_canonical_question(&prompt).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Canonical question classification failed, treating as no match: {}", e);
                return Resolution::NoMatch;
            }
        };

        self.resolve_answer(&answer)
    }

    /// Pure part of `resolve`: classifier output → resolution
    pub fn resolve_answer(&self, answer: &str) -> Resolution {
        let Some(candidate) = parse_label(answer) else {
            debug!(answer = %answer, "Classifier answer carries no label");
            return Resolution::NoMatch;
        };

        let Some(template) = self.catalog.templates.find_by_faq(candidate) else {
            warn!(candidate = %candidate, "Classifier named a question outside the catalog");
            return Resolution::NoMatch;
        };

        info!(faq_key = template.faq_key, faq = %template.faq, "Matched FAQ");

        Resolution::Matched(ResolvedFaq {
            template: template.clone(),
            steps: self.catalog.scripts.script(template.faq_key).to_vec(),
        })
    }
}

/// Render the catalog and user text into the classifier prompt
pub fn build_classification_prompt(questions: &QuestionCatalog, user_text: &str) -> String {
    let mut lines = vec![
        "Here's a list of canonical questions and their alternate phrasings:".to_string(),
    ];

    for (i, question) in questions.iter().enumerate() {
        lines.push(format!("Q{}: \"{}\"", i + 1, question.text));
        for alternate in &question.alternates {
            lines.push(format!("- \"{}\"", alternate));
        }
    }

    lines.push(format!("\nUser input: \"{}\"", user_text));
    lines.push(
        "Which canonical question does this match best? Return it with its label exactly as \
         written above (for example: Q1: \"...\"), no explanations. If none match, reply NONE."
            .to_string(),
    );

    lines.join("\n")
}

/// Strip the `Q<n>:` label and surrounding quotes.
/// Returns `None` when the label is missing.
pub fn parse_label(answer: &str) -> Option<&str> {
    let answer = answer.trim();
    let label = LABEL_PREFIX.find(answer)?;

    let candidate = answer[label.end()..]
        .trim_matches(|c: char| c.is_whitespace() || QUOTE_CHARS.contains(&c));

    if candidate.is_empty() {
        None
    } else {
        Some(candidate)
    }
}
