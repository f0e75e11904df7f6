use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

use batchlinks::{
    ApiConfig, ChatError, ChatSession, ExtractOptions, LoginMethod, NoopReporter, ProgressEvent,
    ProgressReporter, ReqwestClient, SessionOptions, SharedProgressReporter, run_session,
};

// Emoji with fallback for terminals without Unicode support
static BOOKS: Emoji<'_, '_> = Emoji("📚 ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static PROMPT: Emoji<'_, '_> = Emoji("✏️  ", "> ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static PARTY: Emoji<'_, '_> = Emoji("🎉 ", "[*] ");
static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Login {
    /// Phone number and one-time code
    Otp,
    /// Paste an existing access token
    Token,
}

/// Export course batch content links into a text file
#[derive(Parser, Debug)]
#[command(name = "batchlinks")]
#[command(about = "Export course batch content links into a text file")]
#[command(version)]
struct Args {
    /// How to log in
    #[arg(short, long, value_enum, default_value_t = Login::Otp)]
    login: Login,

    /// Directory the finished export is delivered to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Directory for the temporary artifact (defaults to the system temp dir)
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Leave out items that have no content URL
    #[arg(long)]
    skip_missing_urls: bool,

    /// Organization identifier
    #[arg(long, env = "BATCHLINKS_ORGANIZATION_ID")]
    organization_id: Option<String>,

    /// OAuth client id
    #[arg(long, env = "BATCHLINKS_CLIENT_ID")]
    client_id: Option<String>,

    /// OAuth client secret
    #[arg(long, env = "BATCHLINKS_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Player URL template with {url} and {token} placeholders
    #[arg(long, env = "BATCHLINKS_PLAYER_TEMPLATE")]
    player_template: Option<String>,

    /// Base URL of the v1 API
    #[arg(long, env = "BATCHLINKS_API_BASE_V1")]
    api_base_v1: Option<String>,

    /// Base URL of the v3 API
    #[arg(long, env = "BATCHLINKS_API_BASE_V3")]
    api_base_v3: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "20")]
    timeout: u64,

    /// Quiet mode - suppress progress output
    #[arg(short, long)]
    quiet: bool,

    /// Also log pagination and artifact details to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn api_config(&self) -> ApiConfig {
        let defaults = ApiConfig::default();
        ApiConfig {
            organization_id: self
                .organization_id
                .clone()
                .unwrap_or(defaults.organization_id),
            client_id: self.client_id.clone().unwrap_or(defaults.client_id),
            client_secret: self.client_secret.clone().unwrap_or(defaults.client_secret),
            player_template: self
                .player_template
                .clone()
                .unwrap_or(defaults.player_template),
            api_base_v1: self.api_base_v1.clone().unwrap_or(defaults.api_base_v1),
            api_base_v3: self.api_base_v3.clone().unwrap_or(defaults.api_base_v3),
            timeout: Duration::from_secs(self.timeout),
            ..defaults
        }
    }
}

/// Chat transport backed by the terminal: prompts on stdout, replies from stdin
struct TerminalChat {
    lines: tokio::sync::Mutex<Lines<BufReader<Stdin>>>,
    output_dir: PathBuf,
}

impl TerminalChat {
    fn new(output_dir: PathBuf) -> Self {
        Self {
            lines: tokio::sync::Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
            output_dir,
        }
    }
}

#[async_trait]
impl ChatSession for TerminalChat {
    async fn ask(&self, prompt: &str) -> Result<String, ChatError> {
        println!("\n{}", prompt.bold());
        print!("{PROMPT}");
        let _ = std::io::stdout().flush();
        self.lines
            .lock()
            .await
            .next_line()
            .await
            .map_err(ChatError::Prompt)?
            .ok_or(ChatError::Closed)
    }

    async fn say(&self, text: &str) -> Result<(), ChatError> {
        println!("\n{text}");
        Ok(())
    }

    async fn deliver(
        &self,
        document: &Path,
        file_name: &str,
        caption: &str,
    ) -> Result<(), ChatError> {
        let target = self.output_dir.join(file_name);
        std::fs::copy(document, &target).map_err(|e| ChatError::Delivery {
            path: target.clone(),
            source: e,
        })?;

        println!("\n{SUCCESS}{}", caption.green());
        println!(
            "{FOLDER}Output: {}\n",
            target.display().to_string().cyan()
        );
        Ok(())
    }
}

/// Progress reporter using indicatif for terminal output
struct IndicatifReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl IndicatifReporter {
    fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn subject_bar(&self, total_subjects: usize) -> ProgressBar {
        let mut bar = self.bar.lock().unwrap();
        bar.get_or_insert_with(|| {
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
                .unwrap()
                .progress_chars("█▓░");
            let bar = ProgressBar::new(total_subjects as u64);
            bar.set_style(style);
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        })
        .clone()
    }

    fn current_bar(&self) -> Option<ProgressBar> {
        self.bar.lock().unwrap().clone()
    }

    /// Remove a bar left behind by an extraction that did not complete
    fn clear(&self) {
        if let Some(bar) = self.bar.lock().unwrap().take() {
            bar.finish_and_clear();
        }
    }
}

impl ProgressReporter for IndicatifReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::FetchingBatches => {
                println!("{SEARCH}Fetching batches...");
            }

            ProgressEvent::FetchingSubjects { batch_name } => {
                println!("{SEARCH}Fetching subjects of {}...", batch_name.cyan());
            }

            ProgressEvent::SubjectStarted {
                subject_name,
                subject_index,
                total_subjects,
                page_bound,
                ..
            } => {
                let bar = self.subject_bar(total_subjects);
                bar.set_position(subject_index as u64);
                bar.set_message(format!(
                    "{} (up to {} pages)",
                    subject_name.bold(),
                    page_bound.to_string().cyan()
                ));
            }

            ProgressEvent::PageFetched {
                subject_id,
                page,
                items,
            } => {
                if let Some(bar) = self.current_bar() {
                    bar.set_message(format!(
                        "{} page {} ({} items)",
                        subject_id,
                        page.to_string().cyan(),
                        items.to_string().yellow()
                    ));
                }
            }

            ProgressEvent::SubjectFailed {
                subject_id,
                page,
                error,
            } => {
                let line = format!(
                    "{FAILURE}{} stopped at page {} - {}",
                    subject_id.red(),
                    page,
                    error.red()
                );
                match self.current_bar() {
                    Some(bar) => bar.println(line),
                    None => println!("{line}"),
                }
            }

            ProgressEvent::SubjectCompleted { .. } => {
                if let Some(bar) = self.current_bar() {
                    bar.inc(1);
                }
            }

            ProgressEvent::ExtractionCompleted {
                subjects,
                records,
                failed_subjects,
            } => {
                if let Some(bar) = self.bar.lock().unwrap().take() {
                    bar.finish_and_clear();
                }
                println!(
                    "\n{PARTY}{} {} links from {} subjects, {} failed",
                    "Extraction complete:".bold().green(),
                    records.to_string().green().bold(),
                    subjects.to_string().cyan(),
                    if failed_subjects > 0 {
                        failed_subjects.to_string().red().bold()
                    } else {
                        failed_subjects.to_string().green()
                    }
                );
            }
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "warn,batchlinks=debug"
    } else {
        "warn,batchlinks=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    println!(
        "\n{}{} {}\n",
        BOOKS,
        "batchlinks".bold().magenta(),
        "- Batch Link Exporter".dimmed()
    );

    std::fs::create_dir_all(&args.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            args.output_dir.display()
        )
    })?;

    let config = args.api_config();
    let client = ReqwestClient::new();
    let chat = TerminalChat::new(args.output_dir.clone());

    let options = SessionOptions {
        login: match args.login {
            Login::Otp => LoginMethod::Otp,
            Login::Token => LoginMethod::Token,
        },
        work_dir: args.work_dir.clone().unwrap_or_else(std::env::temp_dir),
        extract: ExtractOptions {
            skip_items_without_url: args.skip_missing_urls,
        },
    };

    let indicatif = (!args.quiet).then(|| Arc::new(IndicatifReporter::new()));
    let reporter: SharedProgressReporter = match &indicatif {
        Some(reporter) => reporter.clone(),
        None => NoopReporter::shared(),
    };

    let outcome = run_session(&client, &config, &chat, &options, &reporter).await;
    if let Some(reporter) = &indicatif {
        reporter.clear();
    }
    let summary = outcome.context("Export session failed")?;

    if !args.quiet && !summary.extract.failed_subjects.is_empty() {
        println!("{}", "Subjects with missing pages:".red().bold());
        for (subject_id, error) in &summary.extract.failed_subjects {
            println!("  {} - {}", subject_id.yellow(), error.dimmed());
        }
    }

    Ok(())
}
