//! CLI binary for resumind.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalyzeConfig`, wires up the filesystem-backed collaborators, and
//! prints results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use resumind::pipeline::input;
use resumind::{
    analyze, list_records, load_resume, AnalysisProgressCallback, AnalysisStage, AnalyzeConfig,
    Collaborators, FsRecordStore, FsStorageGateway, LlmFeedbackService, PdfiumConverter,
    ResumeFile, Submission,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI definition ───────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "resumind",
    version,
    about = "AI resume analysis: ATS score and improvement tips"
)]
struct Cli {
    /// Directory holding stored blobs and records.
    #[arg(long, global = true, env = "RESUMIND_DATA_DIR", default_value = "./resumind-data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a resume against a target job.
    Analyze {
        /// Resume PDF: local path or HTTP(S) URL.
        input: String,

        /// Company name of the target job.
        #[arg(long)]
        company: String,

        /// Job title of the target job.
        #[arg(long)]
        title: String,

        /// Job description text (or @path to read it from a file).
        #[arg(long)]
        description: String,

        /// AI provider name (e.g. openai, anthropic). Auto-detected if omitted.
        #[arg(long, env = "RESUMIND_PROVIDER")]
        provider: Option<String>,

        /// AI model identifier. Provider default if omitted.
        #[arg(long, env = "RESUMIND_MODEL")]
        model: Option<String>,

        /// Preview render scale factor (1.0–8.0).
        #[arg(long, default_value_t = 2.0)]
        scale: f32,

        /// Per-stage deadline in seconds. 0 disables.
        #[arg(long, default_value_t = 120)]
        stage_timeout: u64,
    },

    /// Show a completed analysis by run identifier.
    Show {
        /// Run identifier printed by `analyze`.
        id: String,
    },

    /// List all stored analyses.
    List,
}

// ── Stage spinner ────────────────────────────────────────────────────────────

/// Terminal progress callback: one spinner whose message tracks the stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_stage(&self, stage: AnalysisStage) {
        if stage == AnalysisStage::Done {
            self.bar
                .finish_with_message(green(stage.status_text()));
        } else {
            self.bar.set_message(stage.status_text());
        }
    }

    fn on_failure(&self, message: &str) {
        self.bar.finish_with_message(red(message));
    }
}

// ── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Quiet by default; RUST_LOG=resumind=debug for the full trace.
            EnvFilter::new("warn")
        }))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let storage: Arc<FsStorageGateway> =
        Arc::new(FsStorageGateway::new(cli.data_dir.join("blobs")));
    let store: Arc<FsRecordStore> = Arc::new(FsRecordStore::new(cli.data_dir.join("records")));

    match cli.command {
        Command::Analyze {
            input,
            company,
            title,
            description,
            provider,
            model,
            scale,
            stage_timeout,
        } => {
            run_analyze(
                storage,
                store,
                input,
                company,
                title,
                description,
                provider,
                model,
                scale,
                stage_timeout,
            )
            .await
        }
        Command::Show { id } => run_show(storage, store, &id).await,
        Command::List => run_list(store).await,
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_analyze(
    storage: Arc<FsStorageGateway>,
    store: Arc<FsRecordStore>,
    input: String,
    company: String,
    title: String,
    description: String,
    provider: Option<String>,
    model: Option<String>,
    scale: f32,
    stage_timeout: u64,
) -> Result<()> {
    let description = match description.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading job description from '{path}'"))?,
        None => description,
    };

    let progress = CliProgressCallback::new();

    let mut builder = AnalyzeConfig::builder()
        .preview_scale(scale)
        .progress_callback(progress.clone());
    builder = match stage_timeout {
        0 => builder.no_stage_timeout(),
        secs => builder.stage_timeout_secs(secs),
    };
    if let Some(name) = provider {
        builder = builder.provider_name(name);
    }
    if let Some(model) = model {
        builder = builder.model(model);
    }
    let config = builder.build()?;

    let bytes = input::resolve_input(&input, config.download_timeout_secs).await?;
    let file_name = input
        .rsplit(['/', '\\'])
        .next()
        .filter(|n| !n.is_empty())
        .unwrap_or("resume.pdf")
        .to_string();

    let ai = Arc::new(LlmFeedbackService::from_config(
        storage.clone(),
        config.clone(),
    )?);
    let deps = Collaborators::new(storage, store, Arc::new(PdfiumConverter), ai);

    let submission = Submission {
        company_name: company,
        job_title: title,
        job_description: description,
        file: Some(ResumeFile {
            name: file_name,
            bytes,
        }),
    };

    let id = analyze(submission, &deps, &config).await?;
    println!("\n{} {}", bold("Run id:"), id);
    println!("{}", dim(&format!("resumind show {id}")));
    Ok(())
}

async fn run_show(
    storage: Arc<FsStorageGateway>,
    store: Arc<FsRecordStore>,
    id: &str,
) -> Result<()> {
    let store: Arc<dyn resumind::RecordStore> = store;
    let storage: Arc<dyn resumind::StorageGateway> = storage;
    let view = load_resume(id, &store, &storage).await?;

    println!("{}", bold(&format!("{} — {}", view.record.company_name, view.record.job_title)));
    println!(
        "{}",
        dim(&format!(
            "resume: {} ({} bytes)   preview: {} ({} bytes)",
            view.record.resume_path,
            view.resume.len(),
            view.record.image_path,
            view.image.len()
        ))
    );
    println!();
    println!("{} {}", bold("ATS score:"), view.feedback.ats.score);
    for tip in &view.feedback.ats.tips {
        println!("  • {tip}");
    }
    if !view.feedback.sections.is_empty() {
        println!();
        println!("{}", serde_json::to_string_pretty(&view.feedback.sections)?);
    }
    Ok(())
}

async fn run_list(store: Arc<FsRecordStore>) -> Result<()> {
    let store: Arc<dyn resumind::RecordStore> = store;
    let records = list_records(&store).await?;

    if records.is_empty() {
        println!("No analyses stored yet. Run `resumind analyze` first.");
        return Ok(());
    }

    for record in records {
        let score = record
            .feedback
            .as_ready()
            .map(|f| format!("{:>3}", f.ats.score))
            .unwrap_or_else(|| dim("  —"));
        println!(
            "{}  {}  {} / {}",
            record.id,
            score,
            record.company_name,
            record.job_title
        );
    }
    Ok(())
}
