//! External text-understanding capabilities
//!
//! The agent never talks to an LLM directly; it goes through these traits.
//! `GeminiClient` implements all three against the Gemini API.

use crate::error::AgentError;
use crate::Result;
use async_trait::async_trait;
use std::sync::Mutex;

/// Maps a rendered catalog + user text to a labelled canonical question
#[async_trait]
pub trait CanonicalClassifier: Send + Sync {
    async fn classify_canonical_question(&self, prompt: &str) -> Result<String>;
}

/// Answers whether a question is finance-related (`YES` / `NO`)
#[async_trait]
pub trait RelevanceClassifier: Send + Sync {
    async fn classify_relevance(&self, question: &str) -> Result<String>;
}

/// Free-text general advice
#[async_trait]
pub trait AdviceGenerator: Send + Sync {
    async fn generate_advice(&self, question: &str, max_output_tokens: u32) -> Result<String>;
}

/// Canned capability responses for development & testing.
/// An unset response behaves like a transport failure.
#[derive(Debug, Default)]
pub struct ScriptedCapabilities {
    canonical: Option<String>,
    relevance: Option<String>,
    advice: Option<String>,
    calls: Mutex<Vec<CapabilityCall>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityCall {
    Canonical(String),
    Relevance(String),
    Advice(String),
}

impl ScriptedCapabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_canonical(mut self, answer: impl Into<String>) -> Self {
        self.canonical = Some(answer.into());
        self
    }

    pub fn with_relevance(mut self, answer: impl Into<String>) -> Self {
        self.relevance = Some(answer.into());
        self
    }

    pub fn with_advice(mut self, answer: impl Into<String>) -> Self {
        self.advice = Some(answer.into());
        self
    }

    /// Calls received so far, in order
    pub fn calls(&self) -> Vec<CapabilityCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn respond(&self, call: CapabilityCall, answer: &Option<String>) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        answer
            .clone()
            .ok_or_else(|| AgentError::LlmError("no scripted response".to_string()))
    }
}

#[async_trait]
impl CanonicalClassifier for ScriptedCapabilities {
    async fn classify_canonical_question(&self, prompt: &str) -> Result<String> {
        self.respond(CapabilityCall::Canonical(prompt.to_string()), &self.canonical)
    }
}

#[async_trait]
impl RelevanceClassifier for ScriptedCapabilities {
    async fn classify_relevance(&self, question: &str) -> Result<String> {
        self.respond(CapabilityCall::Relevance(question.to_string()), &self.relevance)
    }
}

#[async_trait]
impl AdviceGenerator for ScriptedCapabilities {
    async fn generate_advice(&self, question: &str, _max_output_tokens: u32) -> Result<String> {
        self.respond(CapabilityCall::Advice(question.to_string()), &self.advice)
    }
}
