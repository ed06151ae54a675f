//! Currigen CLI Binary
//!
//! Thin command-line adapter over the generation pipeline. Intended for
//! manual runs and smoke checks; host applications use the library facade
//! directly.

use anyhow::Context;
use clap::{Parser, Subcommand};
use currigen::api::GenerationPipeline;
use currigen::config::CurrigenConfig;
use currigen::curriculum::{GenerationSettings, InMemoryCurriculumSource};
use currigen::error::PipelineError;
use currigen::logging::init_logging;
use currigen::provider::ProviderFactory;
use currigen::store::InMemoryDocumentStore;
use currigen::table::TableRenderer;
use currigen::types::{DocumentType, GenerationRequest};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "currigen", about = "Curriculum document generation pipeline")]
struct Cli {
    /// Path to a configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a document and print its raw content
    Generate {
        /// Document type: scheme, breakdown, lesson-plan, notes, assessment
        #[arg(long)]
        doc_type: String,

        #[arg(long)]
        grade: String,

        #[arg(long)]
        learning_area: String,

        #[arg(long)]
        strand: String,

        #[arg(long)]
        substrand: String,

        #[arg(long)]
        term: Option<String>,

        #[arg(long)]
        weeks: Option<u32>,

        #[arg(long)]
        lessons_per_week: Option<u32>,

        #[arg(long)]
        school: Option<String>,

        #[arg(long)]
        teacher: Option<String>,

        /// Provider name from configuration
        #[arg(long, default_value = "default")]
        provider: String,

        /// Print the reconstructed HTML table instead of raw content
        #[arg(long)]
        html: bool,
    },
    /// Reconstruct an HTML table from saved document content
    Render {
        /// Document type: scheme, breakdown, lesson-plan, notes, assessment
        #[arg(long)]
        doc_type: String,

        /// Path to a file holding the raw document content
        #[arg(long)]
        content: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match CurrigenConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = init_logging(Some(&config.logging)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("currigen starting");

    if let Err(e) = run(cli.command, config).await {
        error!("Command failed: {}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(command: Command, config: CurrigenConfig) -> anyhow::Result<()> {
    match command {
        Command::Generate {
            doc_type,
            grade,
            learning_area,
            strand,
            substrand,
            term,
            weeks,
            lessons_per_week,
            school,
            teacher,
            provider,
            html,
        } => {
            let doc_type = parse_doc_type(&doc_type)?;
            let provider_config = config.providers.get(&provider).ok_or_else(|| {
                PipelineError::ProviderNotConfigured(format!(
                    "no provider named '{provider}' in configuration"
                ))
            })?;
            let client = ProviderFactory::create_client(provider_config)?;

            let source = Arc::new(InMemoryCurriculumSource::new(GenerationSettings {
                lesson_duration_minutes: config.generation.lesson_duration_minutes,
                lessons_per_week: config.generation.lessons_per_week,
                weeks_per_term: config.generation.weeks_per_term,
            }));
            let store = Arc::new(InMemoryDocumentStore::new());
            let pipeline =
                GenerationPipeline::new(config.generation, Arc::from(client), source, store);

            let request = GenerationRequest {
                school,
                teacher_name: teacher,
                grade,
                learning_area,
                strand,
                substrand,
                term,
                weeks,
                lessons_per_week,
                concepts: None,
            };

            let document = pipeline.generate(doc_type, &request).await?;
            info!(
                id = %document.id,
                status = ?document.status,
                attempts = document.metadata.attempts,
                "document generated"
            );

            if html {
                let rendered = pipeline.render_html(&document.id).await?;
                println!("{}", rendered.html);
            } else {
                println!("{}", document.content);
            }
        }
        Command::Render { doc_type, content } => {
            let doc_type = parse_doc_type(&doc_type)?;
            let text = std::fs::read_to_string(&content)
                .with_context(|| format!("cannot read {}", content.display()))?;
            let rendered = TableRenderer::new().render(doc_type, &text)?;
            println!("{}", rendered.html);
        }
    }
    Ok(())
}

fn parse_doc_type(s: &str) -> Result<DocumentType, PipelineError> {
    DocumentType::parse(s)
        .ok_or_else(|| PipelineError::InvalidRequest(format!("unknown document type '{s}'")))
}
