use chrono::Utc;
use clap::{Parser, Subcommand};
use pdf_qa_core::{
    AnswerPipeline, CharacterNgramEmbedder, LopdfExtractor, OpenRouterGenerator, RetrievalOptions,
    RetrievalService,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-qa", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Chat-completions base URL
    #[arg(long, default_value = "https://openrouter.ai/api/v1")]
    llm_url: String,

    /// Generation model
    #[arg(long, default_value = "mistralai/mistral-small-3.2-24b-instruct:free")]
    model: String,

    /// API key for the generation backend
    #[arg(long, env = "OPENROUTER_API_KEY")]
    api_key: Option<String>,

    /// External-call timeout in seconds
    #[arg(long, default_value = "60")]
    llm_timeout_secs: u64,

    /// Words per chunk
    #[arg(long, default_value = "1000")]
    chunk_words: usize,

    /// Overlapping words between consecutive chunks
    #[arg(long, default_value = "200")]
    overlap_words: usize,

    /// How many chunks of context to retrieve per question
    #[arg(long, default_value = "4")]
    top_k: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Extract, chunk, and index a PDF, then print the ingestion report.
    Ingest {
        /// Path to the PDF document
        #[arg(long)]
        pdf: String,
    },
    /// Ingest a PDF and answer a question against it.
    Ask {
        /// Path to the PDF document
        #[arg(long)]
        pdf: String,
        /// The question to answer
        #[arg(long)]
        question: String,
    },
    /// Ask a reflection pass for improvement suggestions on prior output.
    Reflect {
        /// The prior answer text to critique
        #[arg(long)]
        text: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let options = RetrievalOptions {
        chunk_words: cli.chunk_words,
        overlap_words: cli.overlap_words,
        top_k: cli.top_k,
        ..RetrievalOptions::default()
    };

    let retrieval =
        RetrievalService::new(CharacterNgramEmbedder::default(), LopdfExtractor, options);
    let generator =
        OpenRouterGenerator::new(cli.llm_url.as_str(), cli.model.as_str(), cli.api_key.clone())
            .with_timeout(Duration::from_secs(cli.llm_timeout_secs));
    let pipeline = AnswerPipeline::new(retrieval, generator);

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "pdf-qa boot"
    );

    match cli.command {
        Command::Ingest { pdf } => {
            let report = pipeline
                .ingest(Path::new(&pdf))
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            println!(
                "{} chunks indexed from {} at {}",
                report.chunk_count,
                report.source,
                report.ingested_at.to_rfc3339()
            );
            println!("checksum: {}", report.checksum);
            println!("dimensions: {}", report.dimensions);
        }
        Command::Ask { pdf, question } => {
            let report = pipeline
                .ingest(Path::new(&pdf))
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            info!(chunk_count = report.chunk_count, source = %report.source, "document indexed");

            let answer = pipeline
                .answer(&question)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            println!("{}", answer.content);
        }
        Command::Reflect { text } => {
            let suggestions = pipeline.reflect(&text).await;
            println!("{}", suggestions.content);
        }
    }

    Ok(())
}
