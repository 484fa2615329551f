//! CLI binary for receipt-ingest.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `IngestConfig` and prints the recognised transactions as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use receipt_ingest::{IngestConfig, IngestionOutput, Ingestor, TransactionKind};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Recognise a receipt photo (stdout)
  receipt2tx lunch.jpg

  # A PDF statement, written to a file
  receipt2tx statement.pdf -o transactions.json

  # Full output with media type and token stats
  receipt2tx --json lunch.jpg

  # Use a different provider and model
  receipt2tx --provider openai --model gpt-4.1-mini lunch.jpg

  # Download from a URL
  receipt2tx https://example.com/receipts/fuel.jpg

OUTPUT:
  Default:  {"transactions": [{"type", "amount", "category", "description"}, ...]}
  --json:   the full IngestionOutput (transactions, source, media_type, stats)

  Values are exactly what the model produced; nothing is validated.

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default provider)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  RECEIPT_LLM_PROVIDER    Override provider (with RECEIPT_MODEL)
  RECEIPT_MODEL           Override model ID
"#;

/// Turn receipt images and PDFs into candidate transactions using Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "receipt2tx",
    version,
    about = "Turn receipt images and PDFs into candidate transactions using Vision LLMs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local receipt file path (image or PDF) or HTTP/HTTPS URL.
    input: String,

    /// Write JSON to this file instead of stdout.
    #[arg(short, long, env = "RECEIPT2TX_OUTPUT")]
    output: Option<PathBuf>,

    /// LLM model ID (e.g. gemini-1.5-flash, gpt-4.1-mini).
    #[arg(long, env = "RECEIPT_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(long, env = "RECEIPT_LLM_PROVIDER")]
    provider: Option<String>,

    /// Path to a text file containing a custom extraction prompt.
    #[arg(long, env = "RECEIPT2TX_PROMPT_FILE")]
    prompt_file: Option<PathBuf>,

    /// Max LLM output tokens.
    #[arg(long, env = "RECEIPT2TX_MAX_TOKENS", default_value_t = 2048)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "RECEIPT2TX_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Extraction call timeout in seconds.
    #[arg(long, env = "RECEIPT2TX_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "RECEIPT2TX_DOWNLOAD_TIMEOUT", default_value_t = 60)]
    download_timeout: u64,

    /// Directory for the transient upload copy (default: system temp dir).
    #[arg(long, env = "RECEIPT2TX_UPLOAD_DIR")]
    upload_dir: Option<PathBuf>,

    /// Output the full IngestionOutput instead of just the transactions.
    #[arg(long, env = "RECEIPT2TX_JSON")]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "RECEIPT2TX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "RECEIPT2TX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "RECEIPT2TX_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides the feedback that matters; keep INFO logs from
    // tearing through it unless the user asked for them.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.verbose;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config and ingestor ────────────────────────────────────────
    let config = build_config(&cli).await?;
    let ingestor = Ingestor::from_config(config).context("Failed to set up the LLM provider")?;

    // ── Run ingestion ────────────────────────────────────────────────────
    let spinner = show_progress.then(|| new_spinner(&cli.input));
    let result = ingestor.ingest_input(&cli.input).await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
    let output = result.context("Receipt ingestion failed")?;

    let json = if cli.json {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string_pretty(&serde_json::json!({ "transactions": output.transactions }))
    }
    .context("Failed to serialise output")?;

    match cli.output {
        Some(ref path) => write_atomic(path, &json).await?,
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{json}").context("Failed to write to stdout")?;
        }
    }

    if !cli.quiet {
        print_summary(&output, cli.output.as_deref());
    }

    Ok(())
}

/// Map CLI args to `IngestConfig`.
async fn build_config(cli: &Cli) -> Result<IngestConfig> {
    let mut builder = IngestConfig::builder()
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref path) = cli.prompt_file {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read extraction prompt from {:?}", path))?;
        builder = builder.extraction_prompt(prompt);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref dir) = cli.upload_dir {
        builder = builder.upload_dir(dir.clone());
    }

    builder.build().context("Invalid configuration")
}

fn new_spinner(input: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix("Reading");
    bar.set_message(input.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Write via a sibling temp file and rename, so readers never see a partial file.
async fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, contents)
        .await
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("Failed to move output to {}", path.display()))?;
    Ok(())
}

fn print_summary(output: &IngestionOutput, written_to: Option<&Path>) {
    let total = |kind: TransactionKind| -> f64 {
        output
            .transactions
            .iter()
            .filter(|t| t.recognised_kind() == Some(kind))
            .filter_map(|t| t.amount_f64())
            .sum()
    };

    eprintln!(
        "{} {} transactions from {}  {}",
        green("✔"),
        bold(&output.transactions.len().to_string()),
        output.media_type,
        dim(&format!("{}ms", output.stats.total_duration_ms)),
    );
    eprintln!(
        "   expenses {:.2}  /  income {:.2}",
        total(TransactionKind::Expense),
        total(TransactionKind::Income),
    );
    eprintln!(
        "   {} tokens in  /  {} tokens out",
        dim(&output.stats.input_tokens.to_string()),
        dim(&output.stats.output_tokens.to_string()),
    );
    if let Some(path) = written_to {
        eprintln!("   →  {}", bold(&path.display().to_string()));
    }
}
