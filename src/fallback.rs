//! Fallback policy for questions without a template
//!
//! Finance-related questions get general advice; anything else is declined.
//! Capability failures never escape: relevance defaults to "not relevant",
//! advice defaults to a fixed apology.

use crate::capability::{AdviceGenerator, RelevanceClassifier};
use std::sync::Arc;
use tracing::{info, warn};

pub const AFFIRMATIVE_TOKEN: &str = "YES";

pub const ADVICE_UNAVAILABLE: &str =
    "Sorry, I'm unable to provide financial advice at the moment. Please try again later.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackOutcome {
    Advice(String),
    Decline,
}

pub struct FallbackPolicy {
    relevance: Arc<dyn RelevanceClassifier>,
    advisor: Arc<dyn AdviceGenerator>,
    advice_max_tokens: u32,
}

impl FallbackPolicy {
    pub fn new(
        relevance: Arc<dyn RelevanceClassifier>,
        advisor: Arc<dyn AdviceGenerator>,
        advice_max_tokens: u32,
    ) -> Self {
        Self {
            relevance,
            advisor,
            advice_max_tokens,
        }
    }

    pub async fn fallback(&self, user_text: &str) -> FallbackOutcome {
        if !self.is_relevant(user_text).await {
            info!("Question is not finance-related, declining");
            return FallbackOutcome::Decline;
        }

        match self
            .advisor
            .generate_advice(user_text, self.advice_max_tokens)
            .await
        {
            Ok(advice) => FallbackOutcome::Advice(advice),
            Err(e) => {
                warn!("Advice generation failed: {}", e);
                FallbackOutcome::Advice(ADVICE_UNAVAILABLE.to_string())
            }
        }
    }

    async fn is_relevant(&self, user_text: &str) -> bool {
        match self.relevance.classify_relevance(user_text).await {
            Ok(answer) => is_affirmative(&answer),
            Err(e) => {
                warn!("Relevance classification failed, treating as not relevant: {}", e);
                false
            }
        }
    }
}

/// True only for a bare `YES`, ignoring case and surrounding whitespace
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().to_uppercase() == AFFIRMATIVE_TOKEN
}
