use finance_faq_agent::{
    agent::FaqAgent,
    catalog::FaqCatalog,
    config::AgentConfig,
    console::{self, ConsoleAnswerSource, ConsoleObserver},
    engine::AnswerSource,
    gemini::GeminiClient,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Logs go to stderr so they don't interleave with the dialogue
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    dotenv::dotenv().ok();

    println!("{}", console::GREETING);
    println!("{}", "=".repeat(50));

    if let Err(e) = run().await {
        error!("Session failed: {}", e);
    }

    println!("\n{}", console::CLOSING_MESSAGE);
}

async fn run() -> finance_faq_agent::Result<()> {
    let config = AgentConfig::from_env()?;
    let catalog = Arc::new(FaqCatalog::load(config.catalog_path.as_deref()).await?);
    let client = Arc::new(GeminiClient::new(&config)?);
    let agent = FaqAgent::with_capabilities(catalog, client, config.advice_max_tokens);

    info!(model = %config.model, "Finance FAQ agent ready");

    let mut answers = ConsoleAnswerSource::new();
    let mut observer = ConsoleObserver;

    let question = answers.answer(console::OPENING_QUESTION).await?;
    let question = question.trim();
    if question.is_empty() {
        info!("Empty question, nothing to do");
        return Ok(());
    }

    let report = agent.handle(question, &mut answers, &mut observer).await?;
    println!("{}", console::render_outcome(&report.outcome));

    info!(
        session_id = %report.session_id,
        elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
        "Session complete"
    );

    Ok(())
}
