//! FAQ agent - one session per user question
//!
//! QUESTION → RESOLVE → { INTERACT → RECORD | FALLBACK → ADVICE / DECLINE }

use crate::capability::{AdviceGenerator, CanonicalClassifier, RelevanceClassifier};
use crate::catalog::FaqCatalog;
use crate::engine::{AnswerSource, InteractionEngine, Session, SessionObserver};
use crate::fallback::{FallbackOutcome, FallbackPolicy};
use crate::models::Record;
use crate::resolver::{Resolution, Resolver};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// How a session ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionOutcome {
    Completed {
        faq_key: u32,
        faq: String,
        record: Record,
    },
    Advice {
        text: String,
    },
    Declined,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub question: String,
    pub outcome: SessionOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub trace: Vec<String>,
}

pub struct FaqAgent {
    resolver: Resolver,
    fallback: FallbackPolicy,
}

impl FaqAgent {
    pub fn new(
        catalog: Arc<FaqCatalog>,
        classifier: Arc<dyn CanonicalClassifier>,
        relevance: Arc<dyn RelevanceClassifier>,
        advisor: Arc<dyn AdviceGenerator>,
        advice_max_tokens: u32,
    ) -> Self {
        Self {
            resolver: Resolver::new(catalog, classifier),
            fallback: FallbackPolicy::new(relevance, advisor, advice_max_tokens),
        }
    }

    /// Same provider behind all three capabilities
    pub fn with_capabilities<C>(catalog: Arc<FaqCatalog>, capabilities: Arc<C>, advice_max_tokens: u32) -> Self
    where
        C: CanonicalClassifier + RelevanceClassifier + AdviceGenerator + 'static,
    {
        Self::new(
            catalog,
            capabilities.clone(),
            capabilities.clone(),
            capabilities,
            advice_max_tokens,
        )
    }

    /// Run one session for `user_text`.
    ///
    /// Only answer-source failures are returned as errors; capability
    /// failures have already been folded into no-match / decline / apology.
    pub async fn handle<A, O>(
        &self,
        user_text: &str,
        answers: &mut A,
        observer: &mut O,
    ) -> Result<SessionReport>
    where
        A: AnswerSource + ?Sized,
        O: SessionObserver + ?Sized,
    {
        let session_id = Uuid::new_v4();
        let span = info_span!("session", %session_id);

        self.run_session(session_id, user_text, answers, observer)
            .instrument(span)
            .await
    }

    async fn run_session<A, O>(
        &self,
        session_id: Uuid,
        user_text: &str,
        answers: &mut A,
        observer: &mut O,
    ) -> Result<SessionReport>
    where
        A: AnswerSource + ?Sized,
        O: SessionObserver + ?Sized,
    {
        let started_at = Utc::now();
        let mut trace = vec!["INPUT: Question received".to_string()];

        info!(question = %user_text, "Session started");

        let outcome = match self.resolver.resolve(user_text).await {
            Resolution::Matched(resolved) => {
                let faq_key = resolved.template.faq_key;
                trace.push(format!(
                    "RESOLVE: Matched \"{}\" (faq_key {})",
                    resolved.template.faq, faq_key
                ));
                trace.push(format!("INTERACT: {} steps", resolved.steps.len()));

                let session = Session::new(user_text, &resolved.template, resolved.steps);
                let record = InteractionEngine::run_session(session, answers, observer).await?;

                trace.push(format!("RECORD: {} fields", record.len()));
                SessionOutcome::Completed {
                    faq_key,
                    faq: resolved.template.faq,
                    record,
                }
            }
            Resolution::NoMatch => {
                trace.push("RESOLVE: No matching template".to_string());

                match self.fallback.fallback(user_text).await {
                    FallbackOutcome::Advice(text) => {
                        trace.push("FALLBACK: General advice".to_string());
                        SessionOutcome::Advice { text }
                    }
                    FallbackOutcome::Decline => {
                        trace.push("FALLBACK: Declined, not finance-related".to_string());
                        SessionOutcome::Declined
                    }
                }
            }
        };

        info!(steps = trace.len(), "Session finished");

        Ok(SessionReport {
            session_id,
            question: user_text.to_string(),
            outcome,
            started_at,
            finished_at: Utc::now(),
            trace,
        })
    }
}
