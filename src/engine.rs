//! Interaction engine
//!
//! Walks a template's script step by step:
//! - prompt steps ask the answer source for one value and store it typed
//! - checkpoint steps show the record so far, then their text
//!
//! Steps run in ascending `sequence`, each exactly once. A final snapshot
//! is emitted after the last step.

use crate::models::{FieldValue, InteractionStep, Record, Template};
use crate::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

lazy_static! {
    static ref INTEGER_PATTERN: Regex = Regex::new(r"^[0-9]+$").expect("integer pattern is valid");
    static ref REAL_PATTERN: Regex =
        Regex::new(r"^[0-9]+\.[0-9]+$").expect("real pattern is valid");
}

/// Where prompt-step answers come from (console, HTTP, scripted...)
#[async_trait]
pub trait AnswerSource: Send {
    async fn answer(&mut self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    Checkpoint,
    Final,
}

/// Receives everything the engine shows the user
pub trait SessionObserver: Send {
    /// Called once, before the first step
    fn started(&mut self, question: &str);
    fn snapshot(&mut self, kind: SnapshotKind, record: &Record);
    fn message(&mut self, text: &str);
}

/// Type an answer: digits → Integer, digits.digits → Real, else Text.
/// Signs are not part of either numeric pattern. Text keeps the raw answer.
pub fn coerce_answer(raw: &str) -> FieldValue {
    let trimmed = raw.trim();

    if INTEGER_PATTERN.is_match(trimmed) {
        if let Ok(value) = trimmed.parse::<i64>() {
            return FieldValue::Integer(value);
        }
    } else if REAL_PATTERN.is_match(trimmed) {
        if let Ok(value) = trimmed.parse::<f64>() {
            return FieldValue::Real(value);
        }
    }

    FieldValue::Text(raw.to_string())
}

/// One walk through a script
#[derive(Debug, Clone)]
pub struct Session {
    question: String,
    record: Record,
    steps: Vec<InteractionStep>,
    cursor: usize,
}

impl Session {
    pub fn new(
        question: impl Into<String>,
        template: &Template,
        mut steps: Vec<InteractionStep>,
    ) -> Self {
        // stable: equal sequences keep insertion order
        steps.sort_by_key(|s| s.sequence);

        Self {
            question: question.into(),
            record: Record::from_template(template),
            steps,
            cursor: 0,
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn current_step(&self) -> Option<&InteractionStep> {
        self.steps.get(self.cursor)
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.steps.len()
    }

    pub fn remaining(&self) -> usize {
        self.steps.len().saturating_sub(self.cursor)
    }

    fn advance(&mut self) {
        self.cursor += 1;
    }

    pub fn into_record(self) -> Record {
        self.record
    }
}

pub struct InteractionEngine;

impl InteractionEngine {
    pub async fn run<A, O>(
        question: &str,
        template: &Template,
        steps: Vec<InteractionStep>,
        answers: &mut A,
        observer: &mut O,
    ) -> Result<Record>
    where
        A: AnswerSource + ?Sized,
        O: SessionObserver + ?Sized,
    {
        let session = Session::new(question, template, steps);
        Self::run_session(session, answers, observer).await
    }

    pub async fn run_session<A, O>(
        mut session: Session,
        answers: &mut A,
        observer: &mut O,
    ) -> Result<Record>
    where
        A: AnswerSource + ?Sized,
        O: SessionObserver + ?Sized,
    {
        observer.started(session.question());

        while let Some(step) = session.current_step().cloned() {
            debug!(
                faq_key = step.faq_key,
                sequence = step.sequence,
                is_prompt = step.is_prompt,
                "Processing step"
            );

            if step.is_prompt {
                let raw = answers.answer(&step.display_text).await?;
                match step.prompt_field() {
                    Some(field) => session.record.set(field, coerce_answer(&raw)),
                    None => warn!(
                        faq_key = step.faq_key,
                        sequence = step.sequence,
                        "Prompt step has no field_key, answer discarded"
                    ),
                }
            } else {
                observer.snapshot(SnapshotKind::Checkpoint, &session.record);
                observer.message(&step.display_text);
            }

            session.advance();
        }

        observer.snapshot(SnapshotKind::Final, &session.record);
        Ok(session.into_record())
    }
}

/// Replays a fixed list of answers; runs dry with an `InputError`
#[derive(Debug, Default)]
pub struct ScriptedAnswers {
    answers: std::collections::VecDeque<String>,
    prompts: Vec<String>,
}

impl ScriptedAnswers {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
        }
    }

    /// Prompts asked so far
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

#[async_trait]
impl AnswerSource for ScriptedAnswers {
    async fn answer(&mut self, prompt: &str) -> Result<String> {
        self.prompts.push(prompt.to_string());
        self.answers.pop_front().ok_or_else(|| {
            crate::error::AgentError::InputError(format!("no answer left for {:?}", prompt))
        })
    }
}

/// Collects observer events, in order
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub events: Vec<ObservedEvent>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObservedEvent {
    Started(String),
    Snapshot(SnapshotKind, Record),
    Message(String),
}

impl SessionObserver for RecordingObserver {
    fn started(&mut self, question: &str) {
        self.events.push(ObservedEvent::Started(question.to_string()));
    }

    fn snapshot(&mut self, kind: SnapshotKind, record: &Record) {
        self.events.push(ObservedEvent::Snapshot(kind, record.clone()));
    }

    fn message(&mut self, text: &str) {
        self.events.push(ObservedEvent::Message(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FaqCatalog;
    use crate::error::AgentError;
    use indexmap::IndexMap;

    fn step(sequence: u32, is_prompt: bool, text: &str, field: &str) -> InteractionStep {
        InteractionStep {
            faq_key: 1,
            sequence,
            is_prompt,
            display_text: text.to_string(),
            field_key: Some(field.to_string()),
        }
    }

    fn empty_template() -> Template {
        Template {
            faq_key: 1,
            faq: "Test".to_string(),
            fields: IndexMap::new(),
        }
    }

    #[test]
    fn test_coercion() {
        assert_eq!(coerce_answer("42"), FieldValue::Integer(42));
        assert_eq!(coerce_answer("3.14"), FieldValue::Real(3.14));
        assert_eq!(coerce_answer("two thousand"), FieldValue::Text("two thousand".into()));
        assert_eq!(coerce_answer("-5"), FieldValue::Text("-5".into()));
    }

    #[test]
    fn test_coercion_edges() {
        assert_eq!(coerce_answer("007"), FieldValue::Integer(7));
        assert_eq!(coerce_answer(".5"), FieldValue::Text(".5".into()));
        assert_eq!(coerce_answer("5."), FieldValue::Text("5.".into()));
        assert_eq!(coerce_answer("1,000"), FieldValue::Text("1,000".into()));
        assert_eq!(coerce_answer("+3"), FieldValue::Text("+3".into()));
        assert_eq!(coerce_answer(""), FieldValue::Text(String::new()));
        assert_eq!(coerce_answer(" two grand "), FieldValue::Text(" two grand ".into()));
        // overflows i64, still digits only
        assert_eq!(
            coerce_answer("99999999999999999999"),
            FieldValue::Text("99999999999999999999".into())
        );
        assert_eq!(coerce_answer(" 2500\n"), FieldValue::Integer(2500));
    }

    #[tokio::test]
    async fn test_steps_visited_once_in_sequence_order() {
        let steps = vec![
            step(4, false, "four", "N/A"),
            step(1, true, "one", "a"),
            step(3, true, "three", "c"),
            step(2, false, "two", "N/A"),
        ];
        let mut answers = ScriptedAnswers::new(["1", "3"]);
        let mut observer = RecordingObserver::default();

        let record = InteractionEngine::run("q", &empty_template(), steps, &mut answers, &mut observer)
            .await
            .unwrap();

        assert_eq!(answers.prompts(), &["one".to_string(), "three".to_string()]);

        let messages: Vec<&str> = observer
            .events
            .iter()
            .filter_map(|e| match e {
                ObservedEvent::Message(m) => Some(m.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(messages, vec!["two", "four"]);

        let keys: Vec<&str> = record.keys().collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_checkpoint_snapshot_precedes_message_and_final_snapshot_ends() {
        let steps = vec![
            step(1, true, "Balance: ", "balance"),
            step(2, false, "Looks good", "N/A"),
        ];
        let mut answers = ScriptedAnswers::new(["10"]);
        let mut observer = RecordingObserver::default();

        let record = InteractionEngine::run("q", &empty_template(), steps, &mut answers, &mut observer)
            .await
            .unwrap();

        assert_eq!(observer.events.len(), 4);
        assert_eq!(observer.events[0], ObservedEvent::Started("q".into()));
        match &observer.events[1] {
            ObservedEvent::Snapshot(SnapshotKind::Checkpoint, snapshot) => {
                assert_eq!(snapshot.get("balance"), Some(&FieldValue::Integer(10)));
            }
            other => panic!("unexpected first event {:?}", other),
        }
        assert_eq!(observer.events[2], ObservedEvent::Message("Looks good".into()));
        assert_eq!(
            observer.events[3],
            ObservedEvent::Snapshot(SnapshotKind::Final, record)
        );
    }

    #[tokio::test]
    async fn test_rent_vs_buy_script() {
        let catalog = FaqCatalog::bundled().unwrap();
        let template = catalog.templates.get(1000).unwrap().clone();
        let steps = catalog.scripts.script(1000).to_vec();

        let mut answers = ScriptedAnswers::new(["25000", "6.5", "1800", "about 90k"]);
        let mut observer = RecordingObserver::default();

        let record = InteractionEngine::run(
            "Is it profitable to buy a home now or should I wait?",
            &template,
            steps,
            &mut answers,
            &mut observer,
        )
        .await
        .unwrap();

        assert_eq!(record.len(), 6);
        assert_eq!(record.get("balance"), Some(&FieldValue::Integer(25000)));
        assert_eq!(record.get("APR"), Some(&FieldValue::Real(6.5)));
        assert_eq!(record.get("rent"), Some(&FieldValue::Integer(1800)));
        assert_eq!(record.get("salary"), Some(&FieldValue::Text("about 90k".into())));
        assert_eq!(record.get("nickname"), Some(&FieldValue::Text("primary saving".into())));

        // checkpoint saw balance and APR, but not yet rent
        let ObservedEvent::Snapshot(SnapshotKind::Checkpoint, checkpoint) = &observer.events[1] else {
            panic!("expected checkpoint snapshot after start");
        };
        assert_eq!(checkpoint.get("APR"), Some(&FieldValue::Real(6.5)));
        assert_eq!(checkpoint.get("rent"), Some(&FieldValue::Integer(2500)));
    }

    #[tokio::test]
    async fn test_template_without_script_only_emits_final_snapshot() {
        let catalog = FaqCatalog::bundled().unwrap();
        let template = catalog.templates.get(2000).unwrap().clone();
        let mut answers = ScriptedAnswers::new(Vec::<String>::new());
        let mut observer = RecordingObserver::default();

        let record = InteractionEngine::run("q", &template, vec![], &mut answers, &mut observer)
            .await
            .unwrap();

        assert_eq!(record, Record::from_template(&template));
        assert_eq!(
            observer.events,
            vec![
                ObservedEvent::Started("q".into()),
                ObservedEvent::Snapshot(SnapshotKind::Final, record),
            ]
        );
    }

    #[tokio::test]
    async fn test_answer_source_failure_aborts() {
        let steps = vec![step(1, true, "one", "a"), step(2, true, "two", "b")];
        let mut answers = ScriptedAnswers::new(["1"]);
        let mut observer = RecordingObserver::default();

        let err = InteractionEngine::run("q", &empty_template(), steps, &mut answers, &mut observer)
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::InputError(_)));
        assert_eq!(observer.events, vec![ObservedEvent::Started("q".into())]);
    }

    #[test]
    fn test_session_cursor() {
        let session = Session::new(
            "q",
            &empty_template(),
            vec![step(2, true, "b", "b"), step(1, true, "a", "a")],
        );
        assert_eq!(session.question(), "q");
        assert_eq!(session.remaining(), 2);
        assert!(!session.is_finished());
        assert_eq!(session.current_step().unwrap().sequence, 1);
    }
}
