//! Console surface: stdin answers and stdout rendering

use crate::agent::SessionOutcome;
use crate::engine::{AnswerSource, SessionObserver, SnapshotKind};
use crate::error::AgentError;
use crate::models::Record;
use crate::Result;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

pub const GREETING: &str = "Welcome to the Finance FAQ Agent!";
pub const OPENING_QUESTION: &str =
    "We can answer most frequently asked financial questions. How could we help? ";
pub const COMPLETION_MESSAGE: &str =
    "You can now move each element to see how the wealth changes as the time changes";
pub const ADVICE_HEADER: &str =
    "I don't have a specific template for your question, but I can provide some general financial advice:";
pub const ADVICE_DISCLAIMER: &str = "Note: This is general educational information. For personalized advice,\n\
please consult with a qualified financial professional.\n\
\n\
For more detailed analysis, you can also start drawing using individual\n\
blocks in our interactive tool. Please watch the video for guidance.";
pub const DECLINE_MESSAGE: &str = "Sorry, we specialize in financial questions and do not have a template for your question.\n\
You can start drawing using individual blocks for financial planning.\n\
Please watch the video for guidance, or ask a finance-related question.";
pub const CLOSING_MESSAGE: &str = "Goodbye! Thanks for using the Finance FAQ Agent.";

/// Reads one line from stdin per prompt
pub struct ConsoleAnswerSource {
    lines: Lines<BufReader<Stdin>>,
}

impl ConsoleAnswerSource {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for ConsoleAnswerSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnswerSource for ConsoleAnswerSource {
    async fn answer(&mut self, prompt: &str) -> Result<String> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        match self.lines.next_line().await? {
            Some(line) => Ok(line),
            None => Err(AgentError::InputError("stdin closed".to_string())),
        }
    }
}

/// Prints snapshots and messages to stdout
#[derive(Debug, Default)]
pub struct ConsoleObserver;

impl SessionObserver for ConsoleObserver {
    fn started(&mut self, question: &str) {
        println!("{}", render_session_start(question));
    }

    fn snapshot(&mut self, kind: SnapshotKind, record: &Record) {
        println!("{}", render_snapshot(kind, record));
    }

    fn message(&mut self, text: &str) {
        println!("{}", text);
    }
}

pub fn render_session_start(question: &str) -> String {
    format!("\nProcessing your question about: {}\n{}", question, "-".repeat(50))
}

pub fn render_snapshot(kind: SnapshotKind, record: &Record) -> String {
    let title = match kind {
        SnapshotKind::Checkpoint => "Current Data:",
        SnapshotKind::Final => "Final Configuration:",
    };
    format!("\n{}\n{}\n{}{}", "-".repeat(30), title, record, "=".repeat(30))
}

/// Text shown once a session is over
pub fn render_outcome(outcome: &SessionOutcome) -> String {
    match outcome {
        SessionOutcome::Completed { .. } => COMPLETION_MESSAGE.to_string(),
        SessionOutcome::Advice { text } => format!(
            "\n{}\n{}\n{}\n\n{}\n{}",
            ADVICE_HEADER,
            "=".repeat(70),
            text,
            "=".repeat(70),
            ADVICE_DISCLAIMER
        ),
        SessionOutcome::Declined => DECLINE_MESSAGE.to_string(),
    }
}
