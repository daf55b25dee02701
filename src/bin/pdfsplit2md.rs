//! CLI binary for pdfsplit2md.
//!
//! A thin shim over the library crate that maps CLI flags to `SplitConfig`
//! and turns progress events into console output.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdfsplit2md::{
    bind_pdfium, extract_page_to_file, split_and_convert, ConverterKind, ProgressCallback,
    SplitConfig, SplitProgressCallback, WriteFailurePolicy,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── Plain console progress ───────────────────────────────────────────────────

/// Prints one line per event on stdout.
struct ConsoleProgress;

impl SplitProgressCallback for ConsoleProgress {
    fn on_split_start(&self, total_pages: usize) {
        println!("Processing PDF with {total_pages} pages...");
    }

    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        println!("Processing page {page_num}/{total_pages}...");
    }

    fn on_page_error(&self, page_num: usize, _total_pages: usize, error: &str) {
        println!("Error processing page {page_num}: {error}");
    }

    fn on_split_complete(&self, output_dir: &Path, _total_pages: usize, _success_count: usize) {
        println!(
            "All pages processed. Results saved to {}",
            output_dir.display()
        );
    }
}

// ── Progress bar using indicatif ─────────────────────────────────────────────

/// Terminal progress bar with one log line per finished page.
struct BarProgress {
    bar: ProgressBar,
    /// Start of the page currently being processed.
    page_started: Mutex<Instant>,
    errors: AtomicUsize,
}

impl BarProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Splitting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_started: Mutex::new(Instant::now()),
            errors: AtomicUsize::new(0),
        })
    }

    fn page_elapsed_secs(&self) -> f64 {
        self.page_started
            .lock()
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl SplitProgressCallback for BarProgress {
    fn on_split_start(&self, total_pages: usize) {
        self.bar.set_length(total_pages as u64);
        self.bar.reset_eta();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing PDF with {total_pages} pages..."))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total_pages: usize) {
        if let Ok(mut started) = self.page_started.lock() {
            *started = Instant::now();
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total_pages: usize, markdown_len: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            page_num,
            total_pages,
            dim(&format!("{markdown_len:>5} bytes")),
            dim(&format!("{:.1}s", self.page_elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total_pages,
            red(&msg),
            dim(&format!("{:.1}s", self.page_elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_split_complete(&self, output_dir: &Path, total_pages: usize, success_count: usize) {
        self.bar.finish_and_clear();

        let failed = self.errors.load(Ordering::SeqCst);
        let mark = if failed == 0 {
            green("✔")
        } else if success_count == 0 && total_pages > 0 {
            red("✘")
        } else {
            cyan("⚠")
        };
        println!(
            "{} {}/{} pages written to {}",
            mark,
            bold(&success_count.to_string()),
            total_pages,
            bold(&output_dir.display().to_string()),
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Split a PDF into out/page_001.md, out/page_002.md, ...
  pdfsplit2md report.pdf out

  # Transcribe scanned pages with a vision model
  pdfsplit2md --converter vision --model gpt-4.1-mini scan.pdf out

  # Encrypted document
  pdfsplit2md --password secret locked.pdf out

  # Keep going when a page file cannot be written
  pdfsplit2md --on-write-error skip report.pdf out

  # Only write page 7 as out/page_007.pdf
  pdfsplit2md --extract-page 7 report.pdf out

  # Machine-readable report
  pdfsplit2md --json report.pdf out > report.json

CONVERTERS:
  text    Offline. Reads the page's text layer; headings and lists are
          inferred from font sizes and bullet glyphs. (default)
  vision  Renders the page and asks a vision LLM to transcribe it.
          Needs an API key.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Directory or file of the pdfium shared library
  OPENAI_API_KEY          OpenAI API key (vision converter)
  ANTHROPIC_API_KEY       Anthropic API key (vision converter)
  GEMINI_API_KEY          Google Gemini API key (vision converter)
  EDGEQUAKE_LLM_PROVIDER  Provider used when --provider is not given
  EDGEQUAKE_MODEL         Model used together with EDGEQUAKE_LLM_PROVIDER
  RUST_LOG                Log filter, overrides -v / -q
"#;

/// Split a PDF into single pages and convert each page to Markdown.
#[derive(Parser, Debug)]
#[command(
    name = "pdfsplit2md",
    version,
    about = "Split a PDF into one Markdown file per page",
    long_about = "Split a multi-page PDF into single-page documents, convert each one to \
Markdown and write page_001.md, page_002.md, ... into OUTPUT_DIR. A page that fails to \
convert is reported and skipped; the remaining pages are still processed.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file to split.
    input: PathBuf,

    /// Directory receiving the page_NNN.md files (created if missing).
    output_dir: PathBuf,

    /// Markup converter: text or vision.
    #[arg(long, env = "PDFSPLIT2MD_CONVERTER", value_enum, default_value = "text")]
    converter: ConverterArg,

    /// Vision LLM model ID (e.g. gpt-4.1-nano, claude-sonnet-4-20250514).
    #[arg(long, env = "PDFSPLIT2MD_MODEL")]
    model: Option<String>,

    /// Vision LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "PDFSPLIT2MD_PROVIDER")]
    provider: Option<String>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFSPLIT2MD_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Rendering DPI for the vision converter (72–400).
    #[arg(long, env = "PDFSPLIT2MD_DPI", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Max LLM output tokens per page.
    #[arg(long, env = "PDFSPLIT2MD_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDFSPLIT2MD_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Retries per page on LLM failure (0–10).
    #[arg(long, env = "PDFSPLIT2MD_MAX_RETRIES", default_value_t = 3,
          value_parser = clap::value_parser!(u32).range(0..=10))]
    max_retries: u32,

    /// Per-page LLM call timeout in seconds.
    #[arg(long, env = "PDFSPLIT2MD_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "PDFSPLIT2MD_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// What to do when a page file cannot be written: abort or skip.
    #[arg(long, env = "PDFSPLIT2MD_ON_WRITE_ERROR", value_enum, default_value = "abort")]
    on_write_error: OnWriteErrorArg,

    /// Only write page N (1-indexed) as OUTPUT_DIR/page_NNN.pdf, then exit.
    #[arg(long, env = "PDFSPLIT2MD_EXTRACT_PAGE",
          value_parser = clap::value_parser!(u64).range(1..))]
    extract_page: Option<u64>,

    /// Print the run report as JSON instead of progress lines.
    #[arg(long, env = "PDFSPLIT2MD_JSON")]
    json: bool,

    /// Show a progress bar instead of plain progress lines.
    #[arg(long, env = "PDFSPLIT2MD_BAR")]
    bar: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFSPLIT2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFSPLIT2MD_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ConverterArg {
    Text,
    Vision,
}

impl From<ConverterArg> for ConverterKind {
    fn from(v: ConverterArg) -> Self {
        match v {
            ConverterArg::Text => ConverterKind::TextLayer,
            ConverterArg::Vision => ConverterKind::Vision,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OnWriteErrorArg {
    Abort,
    Skip,
}

impl From<OnWriteErrorArg> for WriteFailurePolicy {
    fn from(v: OnWriteErrorArg) -> Self {
        match v {
            OnWriteErrorArg::Abort => WriteFailurePolicy::Abort,
            OnWriteErrorArg::Skip => WriteFailurePolicy::Skip,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Logs go to stderr; stdout is reserved for progress lines and JSON.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Single-page extraction mode ──────────────────────────────────────
    if let Some(page) = cli.extract_page {
        let page = usize::try_from(page).context("Page number too large")?;
        let pdfium = bind_pdfium().context("Failed to load the PDFium library")?;
        let target = cli.output_dir.join(format!("page_{page:03}.pdf"));

        let written = extract_page_to_file(
            &pdfium,
            &cli.input,
            page - 1,
            &target,
            cli.password.as_deref(),
        )
        .with_context(|| format!("Failed to extract page {page} of {}", cli.input.display()))?;

        if !cli.quiet {
            println!("Page {page} written to {}", written.display());
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if cli.quiet || cli.json {
        None
    } else if cli.bar {
        Some(BarProgress::new() as Arc<dyn SplitProgressCallback>)
    } else {
        Some(Arc::new(ConsoleProgress) as Arc<dyn SplitProgressCallback>)
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let report = split_and_convert(&cli.input, &cli.output_dir, cli.converter.into(), &config)
        .with_context(|| format!("Failed to split {}", cli.input.display()))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet && cli.verbose {
        eprintln!(
            "{}",
            dim(&format!(
                "{}/{} pages written in {}ms",
                report.success_count(),
                report.total_pages,
                report.duration_ms
            ))
        );
    }

    Ok(())
}

/// Map CLI args to `SplitConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<SplitConfig> {
    let mut builder = SplitConfig::builder()
        .on_write_error(cli.on_write_error.into())
        .dpi(cli.dpi)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref path) = cli.system_prompt {
        let prompt = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
