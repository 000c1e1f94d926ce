//! sqlcrew - natural-language database queries answered by an agent crew
//!
//! Main entry point for the CLI application.

use std::sync::Arc;

use clap::Parser;
use sqlcrew::cli::{render_direct, render_transcript};
use sqlcrew::core::config::{LogFormat, LoggingConfig};
use sqlcrew::db::PostgresDatabase;
use sqlcrew::llm::OllamaClient;
use sqlcrew::{Config, Orchestrator};
use tracing_subscriber::EnvFilter;

/// sqlcrew - ask your database questions in plain language
#[derive(Parser, Debug)]
#[command(name = "sqlcrew")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The question to answer from the database
    #[arg(long, short = 'p')]
    prompt: String,

    /// Maximum number of conversation rounds
    #[arg(long, short = 'r')]
    max_rounds: Option<usize>,

    /// Model used by every agent
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Skip the crew: one completion, one query
    #[arg(long)]
    direct: bool,

    /// Enable debug output
    #[arg(long, short = 'd')]
    debug: bool,

    /// Log format (compact, pretty, json)
    #[arg(long)]
    log_format: Option<LogFormat>,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Build configuration
    let mut config = Config::load()?;

    // Apply CLI overrides
    if let Some(max_rounds) = args.max_rounds {
        config.conversation.max_rounds = max_rounds;
    }

    if let Some(ref model) = args.model {
        config.models.name = model.clone();
    }

    if args.debug {
        config.logging.level = "debug".to_string();
    }

    if let Some(format) = args.log_format {
        config.logging.format = format;
    }

    init_tracing(&config.logging);
    config.validate()?;

    let database = PostgresDatabase::connect(&config.database).await?;
    let backend = OllamaClient::from_config(&config)?;
    let orchestrator = Orchestrator::new(config, Arc::new(backend), Arc::new(database));
    orchestrator.initialize().await?;

    if args.direct {
        let answer = orchestrator.run_direct(&args.prompt).await?;
        println!("{}", render_direct(&answer));
        return Ok(());
    }

    let transcript = orchestrator.run(&args.prompt).await?;
    let delimiter = &orchestrator.config().conversation.sql_delimiter;
    println!("{}", render_transcript(&transcript, delimiter));

    Ok(())
}
