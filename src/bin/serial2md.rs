//! CLI binary for serial2md.
//!
//! A thin shim over the library crate that maps CLI flags to `WalkConfig`,
//! runs the walk and optionally assembles the result.

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serial2md::{
    publish, walk_book, Book, BookProfile, ProgressCallback, WalkConfig, WalkProgressCallback,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a spinner with a running chapter count and one log
/// line per chapter. The book length is unknown until the walk ends, so
/// there is no bar.
struct CliProgressCallback {
    bar: ProgressBar,
    warnings: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  {pos:>4} chapters  ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Walking");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            warnings: AtomicUsize::new(0),
        })
    }
}

impl WalkProgressCallback for CliProgressCallback {
    fn on_walk_start(&self, book: &str, start_url: &str) {
        self.bar.println(format!(
            "{} {} {}",
            cyan("◆"),
            bold(&format!("Walking {book}")),
            dim(start_url)
        ));
        self.bar.set_message("fetching first chapter…");
    }

    fn on_chapter_written(&self, _index: usize, filename: &str, paragraphs: usize) {
        self.bar.println(format!(
            "  {} {:<48}  {}",
            green("✓"),
            filename,
            dim(&format!("{paragraphs:>4} paragraphs")),
        ));
        self.bar.inc(1);
        self.bar.set_message(filename.to_string());
    }

    fn on_chapter_skipped(&self, _index: usize, filename: &str) {
        self.bar
            .println(format!("  {} {}", dim("·"), dim(&format!("{filename} (exists)"))));
        self.bar.inc(1);
    }

    fn on_warning(&self, filename: &str, warning: &str) {
        self.warnings.fetch_add(1, Ordering::SeqCst);
        self.bar
            .println(format!("  {} {}: {}", yellow("⚠"), filename, yellow(warning)));
    }

    fn on_walk_complete(&self, written: usize, skipped: usize) {
        self.bar.finish_and_clear();
        let warnings = self.warnings.load(Ordering::SeqCst);
        eprintln!(
            "{} {} chapters written, {} skipped{}",
            green("✔"),
            bold(&written.to_string()),
            skipped,
            if warnings > 0 {
                format!(", {}", yellow(&format!("{warnings} warnings")))
            } else {
                String::new()
            }
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Download Worm into ./data
  serial2md worm

  # Resume an interrupted download
  serial2md worm --skip-existing

  # Download Pact, then build a single document plus meta.txt
  serial2md pact -o pact --assemble pact.md

  # Only assemble already-downloaded chapters
  serial2md twig -o twig --assemble twig.md --assemble-only

  # A book described by a JSON profile
  serial2md --profile mybook.json -o mybook

  # Convert the assembled document to EPUB
  pandoc meta.txt pact.md -o pact.epub

BOOKS:
  worm   Worm  (parahumans.wordpress.com)
  pact   Pact  (pactwebserial.wordpress.com)
  twig   Twig  (twigserial.wordpress.com)

ENVIRONMENT VARIABLES:
  RUST_LOG               Overrides the log filter (e.g. serial2md=debug)
  SERIAL2MD_OUTPUT_DIR   Default for --output-dir
  SERIAL2MD_MAX_RETRIES  Default for --max-retries
  SERIAL2MD_TIMEOUT      Default for --timeout
"#;

/// Download a web serial as one Markdown file per chapter.
#[derive(Parser, Debug)]
#[command(
    name = "serial2md",
    version,
    about = "Download a web serial as one Markdown file per chapter",
    long_about = "Follow the \"Next Chapter\" links of a web serial from its first chapter to \
its last, writing each chapter as \"{arc:02}.{chapter:02} {title}.md\" so a filename sort \
gives reading order. Optionally concatenates the chapters into a single document with a \
pandoc metadata block.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Built-in book: worm, pact or twig.
    #[arg(required_unless_present = "profile")]
    book: Option<String>,

    /// JSON book profile to use instead of a built-in book.
    #[arg(long, env = "SERIAL2MD_PROFILE", conflicts_with = "book")]
    profile: Option<PathBuf>,

    /// Directory chapter files are written to.
    #[arg(short, long, env = "SERIAL2MD_OUTPUT_DIR", default_value = "data")]
    output_dir: PathBuf,

    /// Start from this URL instead of the book's first chapter.
    #[arg(long, env = "SERIAL2MD_START_URL")]
    start_url: Option<String>,

    /// Leave chapters whose file already exists untouched.
    #[arg(long, env = "SERIAL2MD_SKIP_EXISTING")]
    skip_existing: bool,

    /// Stop after this many chapters.
    #[arg(short = 'n', long, env = "SERIAL2MD_LIMIT",
          value_parser = clap::value_parser!(u64).range(1..))]
    limit: Option<u64>,

    /// Chapter file extension, without the dot.
    #[arg(long = "ext", env = "SERIAL2MD_EXT", default_value = "md")]
    extension: String,

    /// Retries per page on transient fetch failures.
    #[arg(long, env = "SERIAL2MD_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// Per-request timeout in seconds.
    #[arg(long, env = "SERIAL2MD_TIMEOUT", default_value_t = 60,
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// After the walk, concatenate all chapters into this file (plus meta.txt).
    #[arg(long, env = "SERIAL2MD_ASSEMBLE")]
    assemble: Option<PathBuf>,

    /// Skip the walk and only assemble existing chapter files.
    #[arg(long, requires = "assemble")]
    assemble_only: bool,

    /// Print the walk result as JSON on stdout.
    #[arg(long, env = "SERIAL2MD_JSON")]
    json: bool,

    /// Disable the progress display.
    #[arg(long, env = "SERIAL2MD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SERIAL2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SERIAL2MD_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress display replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.assemble_only;
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

    let profile = load_profile(&cli)?;

    // ── Walk ─────────────────────────────────────────────────────────────
    if !cli.assemble_only {
        let progress_cb: Option<ProgressCallback> = if show_progress {
            Some(CliProgressCallback::new() as Arc<dyn WalkProgressCallback>)
        } else {
            None
        };
        let config = build_config(&cli, progress_cb)?;

        let output = walk_book(&profile, &config)
            .await
            .with_context(|| format!("Walk of '{}' failed", profile.title))?;

        if cli.json {
            let json =
                serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
            println!("{json}");
        } else if !cli.quiet {
            let stats = &output.stats;
            eprintln!(
                "{}  {} written  /  {} skipped  {}ms  →  {}",
                if stats.warnings == 0 {
                    green("✔")
                } else {
                    yellow("⚠")
                },
                stats.chapters_written,
                stats.chapters_skipped,
                stats.total_duration_ms,
                bold(&cli.output_dir.display().to_string()),
            );
            if stats.stopped_at_limit {
                eprintln!("   {}", dim("stopped at --limit; more chapters remain"));
            }
        }
    }

    // ── Assemble ─────────────────────────────────────────────────────────
    if let Some(ref target) = cli.assemble {
        let published = publish(&cli.output_dir, &cli.extension, target, &profile)
            .await
            .with_context(|| format!("Failed to assemble {}", cli.output_dir.display()))?;
        if published.chapters == 0 {
            bail!(
                "no *.{} chapter files found in {}",
                cli.extension,
                cli.output_dir.display()
            );
        }
        if !cli.quiet {
            eprintln!(
                "{}  {} chapters  →  {}  {}",
                green("✔"),
                published.chapters,
                bold(&published.document.display().to_string()),
                dim(&format!("(+ {})", published.metadata.display())),
            );
        }
    }

    Ok(())
}

fn load_profile(cli: &Cli) -> Result<BookProfile> {
    if let Some(ref path) = cli.profile {
        return BookProfile::from_json_file(path)
            .with_context(|| format!("Failed to load book profile {}", path.display()));
    }
    let name = cli.book.as_deref().unwrap_or_default();
    let book: Book = name.parse()?;
    Ok(book.profile())
}

/// Map CLI args to `WalkConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<WalkConfig> {
    let mut builder = WalkConfig::builder()
        .output_dir(&cli.output_dir)
        .extension(&cli.extension)
        .skip_existing(cli.skip_existing)
        .max_retries(cli.max_retries)
        .fetch_timeout_secs(cli.timeout);

    if let Some(n) = cli.limit {
        builder = builder.limit(usize::try_from(n).context("--limit is too large")?);
    }
    if let Some(ref url) = cli.start_url {
        builder = builder.start_url(url);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
