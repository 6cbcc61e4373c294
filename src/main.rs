use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use clip_regress::config::{CommandTemplate, CorpusConfig, ExecutorConfig, RegressionConfig};
use clip_regress::console::Console;
use clip_regress::corpus::{CorpusProvider, TestDataCorpus};
use clip_regress::error::RegressError;
use clip_regress::runner::{display_name, format_elapsed, RegressionRunner, RegressionSummary};
use clip_regress::shutdown::install_shutdown_handler;

#[derive(Parser, Debug)]
#[command(name = "clip-regress")]
#[command(version)]
#[command(about = "Run compressor regression tests over a clip corpus")]
#[command(propagate_version = true)]
struct Args {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Prepare the corpus and run every configuration against it
    Run(RunArgs),

    /// Locate, decompress and index the corpus without running anything
    Prepare {
        #[command(flatten)]
        corpus: CorpusArgs,
    },
}

// =============================================================================
// Corpus Arguments (shared by run and prepare)
// =============================================================================

#[derive(Parser, Debug)]
struct CorpusArgs {
    /// Directory holding the corpus archive and the configs/ directory
    #[arg(long, default_value = "test_data")]
    test_data_dir: PathBuf,

    /// Corpus version; the archive is <test-data-dir>/<data-version>.zip
    #[arg(long, default_value = clip_regress::config::DEFAULT_DATA_VERSION)]
    data_version: String,
}

impl CorpusArgs {
    fn to_config(&self) -> CorpusConfig {
        CorpusConfig {
            test_data_dir: self.test_data_dir.clone(),
            data_version: self.data_version.clone(),
            ..CorpusConfig::default()
        }
    }
}

// =============================================================================
// Run Arguments
// =============================================================================

#[derive(Parser, Debug)]
struct RunArgs {
    #[command(flatten)]
    corpus: CorpusArgs,

    /// Path to the compressor executable [default: ./bin/acl_compressor]
    #[arg(long)]
    compressor: Option<PathBuf>,

    /// Number of concurrent workers
    #[arg(long, short = 'j', default_value = "4")]
    threads: usize,

    /// Switch used to pass the clip to the compressor
    #[arg(long, default_value = "-input", allow_hyphen_values = true)]
    input_switch: String,

    /// Progress redraw interval in milliseconds
    #[arg(long, default_value = "1000")]
    poll_interval_ms: u64,

    /// Width of the progress bar in characters
    #[arg(long, default_value = "50")]
    bar_width: usize,

    /// Let compressor output through to the terminal instead of capturing it
    #[arg(long)]
    show_output: bool,

    /// Summary format
    #[arg(long, short = 'o', default_value = "table")]
    output: OutputFormat,
}

impl RunArgs {
    fn to_config(&self) -> RegressionConfig {
        let mut command = CommandTemplate::default().with_input_switch(self.input_switch.clone());
        if let Some(ref compressor) = self.compressor {
            command.compressor = compressor.clone();
        }
        // Failure diagnostics must be reproducible from any directory.
        if let Ok(absolute) = std::path::absolute(&command.compressor) {
            command.compressor = absolute;
        }

        let mut config = RegressionConfig::new(command)
            .with_worker_count(self.threads)
            .with_poll_interval_ms(self.poll_interval_ms);
        config.executor = ExecutorConfig {
            capture_output: !self.show_output,
        };
        config.progress.bar_width = self.bar_width;
        config
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

// =============================================================================
// Handlers
// =============================================================================

async fn handle_prepare(args: CorpusArgs, console: Console) -> Result<(), RegressError> {
    let provider = TestDataCorpus::new(args.to_config(), console);
    provider.load().await?;
    Ok(())
}

async fn handle_run(args: RunArgs, console: Console) -> Result<RegressionSummary, RegressError> {
    let cancel = install_shutdown_handler();
    let runner = RegressionRunner::new(args.to_config(), console.clone())?;
    let provider = TestDataCorpus::new(args.corpus.to_config(), console.clone());
    let corpus = provider.load().await?;
    if cancel.is_cancelled() {
        return Err(RegressError::Cancelled);
    }

    let summary = runner.run(&corpus, &cancel).await?;
    print_summary(&summary, &args.output, &console)?;
    Ok(summary)
}

fn print_summary(
    summary: &RegressionSummary,
    format: &OutputFormat,
    console: &Console,
) -> Result<(), RegressError> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(summary)
                .map_err(|e| RegressError::Io(e.into()))?;
            console.line(&json)?;
        }
        OutputFormat::Table => {
            console.line("")?;
            console.line(&format!(
                "{:<40} {:<8} {:>10} {:>8} {:>16}",
                "CONFIG", "VERDICT", "COMPLETED", "FAILED", "ELAPSED"
            ))?;
            for report in &summary.reports {
                console.line(&format!(
                    "{:<40} {:<8} {:>10} {:>8} {:>16}",
                    truncate(&display_name(&report.config_id), 40),
                    report.verdict().to_string(),
                    format!("{}/{}", report.completed.len(), report.total),
                    report.failed.len(),
                    format_elapsed(report.elapsed)
                ))?;
            }
        }
    }
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        s.to_string()
    }
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Logs go to stderr; stdout carries progress and diagnostics.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let console = Console::stdout();

    let result = match args.command {
        Commands::Prepare { corpus } => handle_prepare(corpus, console.clone()).await.map(|_| 0),
        Commands::Run(run_args) => handle_run(run_args, console.clone())
            .await
            .map(|summary| summary.exit_code()),
    };

    let code = match result {
        Ok(code) => code,
        Err(RegressError::Cancelled) => {
            tracing::warn!("Regression run cancelled by operator");
            1
        }
        Err(e) => {
            if e.is_environment() {
                tracing::error!(error = %e, "Environment check failed");
            } else {
                tracing::error!(error = %e, "Regression run failed");
            }
            if let Err(write_err) = console.line(&e.to_string()) {
                tracing::debug!(error = %write_err, "Failed to write to console");
            }
            1
        }
    };

    std::process::exit(code);
}
