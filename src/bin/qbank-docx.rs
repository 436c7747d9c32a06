//! CLI binary for qbank-docx.
//!
//! A thin shim over the library crate that maps CLI flags to `ParseConfig`
//! and an image store, then prints questions as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use qbank_docx::pipeline::input::resolve_input;
use qbank_docx::{
    convert_to_html, inspect, parse, parse_to_file, Classification, FsImageStore, HttpImageStore,
    ImageStore, InlineImageStore, ParseConfig, ParseProgressCallback, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Live upload progress. Uploads finish out of order, so lines are printed as
/// they complete and the bar only counts.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Reading");
        bar.set_message("Opening DOCX…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl ParseProgressCallback for CliProgressCallback {
    fn on_parse_start(&self, total_images: usize) {
        if total_images == 0 {
            self.bar.set_prefix("Extracting");
            self.bar.set_message("no images");
            return;
        }
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} images  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        self.bar.set_length(total_images as u64);
        self.bar.set_prefix("Uploading");
    }

    fn on_image_uploaded(&self, index: usize, total: usize, url: &str) {
        let shown = if url.starts_with("data:") { "data URI" } else { url };
        self.bar.println(format!(
            "  {} Image {:>3}/{:<3}  {}",
            green("✓"),
            index + 1,
            total,
            dim(shown)
        ));
        self.bar.inc(1);
    }

    fn on_image_error(&self, index: usize, total: usize, error: &str) {
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Image {:>3}/{:<3}  {}",
            red("✗"),
            index + 1,
            total,
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_parse_complete(&self, questions: usize, failed_images: usize) {
        self.bar.finish_and_clear();
        if failed_images == 0 {
            eprintln!("{} {} questions extracted", green("✔"), bold(&questions.to_string()));
        } else {
            eprintln!(
                "{} {} questions extracted  ({} images failed)",
                cyan("⚠"),
                bold(&questions.to_string()),
                red(&failed_images.to_string())
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Dry run: images inlined as data URIs, questions on stdout
  qbank-docx chapter-3.docx

  # Store images on disk, served from a CDN path
  qbank-docx chapter-3.docx --store fs --image-dir public/img \
      --public-base-url https://cdn.example.com/img -o questions.json

  # Upload images to object storage
  qbank-docx chapter-3.docx --store http --storage-endpoint https://x.example.co/storage/v1 \
      --bucket question-images --storage-key "$STORAGE_KEY"

  # Review-queue records with curriculum ids
  qbank-docx quiz.docx --records --subject-id math --chapter-id ch3 --json

  # Count paragraphs, images and question markers (no uploads)
  qbank-docx --inspect-only quiz.docx

DOCUMENT FORMAT:
  1. Question stem            (also "Q1.")
  A) option  / A. option      (A to D)
  Answer: B
  Explanation: free text
  A picture in the question's paragraphs becomes its image_url.
"#;

/// Extract multiple-choice questions from DOCX files.
#[derive(Parser, Debug)]
#[command(
    name = "qbank-docx",
    version,
    about = "Extract multiple-choice questions from DOCX files",
    long_about = "Extract numbered multiple-choice questions (stem, options A-D, answer, \
explanation, image) from a DOCX file or URL. Embedded pictures are stored on disk, in \
object storage, or inlined as data URIs.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local DOCX file path or HTTP/HTTPS URL.
    input: String,

    /// Write the full parse output as JSON to this file instead of stdout.
    #[arg(short, long, env = "QBANK_OUTPUT")]
    output: Option<PathBuf>,

    /// Where embedded images go.
    #[arg(long, env = "QBANK_STORE", value_enum, default_value = "inline")]
    store: StoreArg,

    /// Directory for `--store fs`.
    #[arg(long, env = "QBANK_IMAGE_DIR", default_value = "images")]
    image_dir: PathBuf,

    /// Public URL prefix for images (fs store, or CDN in front of object storage).
    #[arg(long, env = "QBANK_PUBLIC_BASE_URL")]
    public_base_url: Option<String>,

    /// Object-storage REST endpoint for `--store http`.
    #[arg(long, env = "QBANK_STORAGE_ENDPOINT")]
    storage_endpoint: Option<String>,

    /// Object-storage bucket for `--store http`.
    #[arg(long, env = "QBANK_BUCKET", default_value = "question-images")]
    bucket: String,

    /// Object-storage API key for `--store http`.
    #[arg(long, env = "QBANK_STORAGE_KEY", hide_env_values = true)]
    storage_key: Option<String>,

    /// Folder prefix for stored image names.
    #[arg(long, env = "QBANK_KEY_PREFIX")]
    key_prefix: Option<String>,

    /// Difficulty stamped on every question.
    #[arg(long, env = "QBANK_DIFFICULTY", default_value = qbank_docx::DEFAULT_DIFFICULTY)]
    difficulty: String,

    /// Concurrent image uploads.
    #[arg(short, long, env = "QBANK_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Per-image upload timeout in seconds.
    #[arg(long, env = "QBANK_UPLOAD_TIMEOUT", default_value_t = 30)]
    upload_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "QBANK_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Class id attached to `--records` output.
    #[arg(long, env = "QBANK_CLASS_ID")]
    class_id: Option<String>,

    /// Subject id attached to `--records` output.
    #[arg(long, env = "QBANK_SUBJECT_ID")]
    subject_id: Option<String>,

    /// Chapter id attached to `--records` output.
    #[arg(long, env = "QBANK_CHAPTER_ID")]
    chapter_id: Option<String>,

    /// Topic id attached to `--records` output.
    #[arg(long, env = "QBANK_TOPIC_ID")]
    topic_id: Option<String>,

    /// Upload id attached to `--records` output.
    #[arg(long, env = "QBANK_UPLOAD_ID")]
    upload_id: Option<String>,

    /// Emit review-queue records (questions + ids + status) instead of drafts.
    #[arg(long)]
    records: bool,

    /// Emit the full parse output (questions, images, stats) as pretty JSON.
    #[arg(long, env = "QBANK_JSON")]
    json: bool,

    /// Print the converted HTML instead of questions.
    #[arg(long, conflicts_with_all = ["records", "json", "inspect_only"])]
    html: bool,

    /// Print paragraph, image and question-marker counts only.
    #[arg(long)]
    inspect_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "QBANK_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "QBANK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "QBANK_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum StoreArg {
    Fs,
    Http,
    Inline,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; verbose always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.inspect_only && !cli.html;
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

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let resolved = resolve_input(&cli.input, cli.download_timeout)
            .await
            .context("Failed to read input")?;
        let summary = inspect(resolved.bytes).await.context("Failed to inspect DOCX")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
            );
        } else {
            println!("File:              {}", resolved.origin);
            println!("Paragraphs:        {}", summary.paragraphs);
            println!("Images:            {}", summary.images);
            println!("Question markers:  {}", summary.question_markers);
        }
        return Ok(());
    }

    let store = build_store(&cli)?;

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ParseProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── HTML mode ────────────────────────────────────────────────────────
    if cli.html {
        let resolved = resolve_input(&cli.input, cli.download_timeout)
            .await
            .context("Failed to read input")?;
        let conversion = convert_to_html(resolved.bytes, store.as_ref(), &config)
            .await
            .context("Conversion failed")?;
        write_stdout(&conversion.html)?;
        return Ok(());
    }

    // ── Parse ────────────────────────────────────────────────────────────
    if let (Some(output_path), false) = (&cli.output, cli.records) {
        let stats = parse_to_file(&cli.input, output_path, store.as_ref(), &config)
            .await
            .context("Parse failed")?;
        if !cli.quiet {
            eprintln!(
                "{}  {} questions  {}/{} images  {}ms  →  {}",
                if stats.images_failed == 0 { green("✔") } else { cyan("⚠") },
                stats.questions,
                stats.images_uploaded,
                stats.images_total,
                stats.total_duration_ms,
                bold(&output_path.display().to_string()),
            );
        }
        return Ok(());
    }

    let output = parse(&cli.input, store.as_ref(), &config)
        .await
        .context("Parse failed")?;

    if !cli.quiet && !show_progress {
        eprintln!(
            "Extracted {} questions in {}ms ({} paragraphs dropped, {} images failed)",
            output.stats.questions,
            output.stats.total_duration_ms,
            output.stats.dropped_paragraphs,
            output.stats.images_failed
        );
    } else if !cli.quiet {
        eprintln!(
            "   {} paragraphs  /  {} dropped  —  {}ms total",
            dim(&output.stats.paragraphs.to_string()),
            dim(&output.stats.dropped_paragraphs.to_string()),
            output.stats.total_duration_ms,
        );
    }

    let json = if cli.records {
        let classification = Classification {
            class_id: cli.class_id.clone(),
            subject_id: cli.subject_id.clone(),
            chapter_id: cli.chapter_id.clone(),
            topic_id: cli.topic_id.clone(),
            upload_id: cli.upload_id.clone(),
        };
        serde_json::to_string_pretty(&output.into_records(&classification))
    } else if cli.json {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string_pretty(&output.questions)
    }
    .context("Failed to serialise output")?;

    match cli.output {
        Some(ref path) => tokio::fs::write(path, json.as_bytes())
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => write_stdout(&json)?,
    }

    Ok(())
}

/// Map `--store` and its options to an image store.
fn build_store(cli: &Cli) -> Result<Box<dyn ImageStore>> {
    Ok(match cli.store {
        StoreArg::Inline => Box::new(InlineImageStore),
        StoreArg::Fs => {
            let base = cli
                .public_base_url
                .clone()
                .unwrap_or_else(|| cli.image_dir.display().to_string());
            Box::new(FsImageStore::new(&cli.image_dir, base))
        }
        StoreArg::Http => {
            let endpoint = cli
                .storage_endpoint
                .as_deref()
                .context("--store http requires --storage-endpoint")?;
            let key = cli
                .storage_key
                .as_deref()
                .context("--store http requires --storage-key")?;
            let mut store = HttpImageStore::new(endpoint, &cli.bucket, key, cli.upload_timeout)
                .context("Invalid object-storage settings")?;
            if let Some(ref base) = cli.public_base_url {
                store = store.with_public_base_url(base);
            }
            Box::new(store)
        }
    })
}

/// Map CLI args to `ParseConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ParseConfig> {
    let mut builder = ParseConfig::builder()
        .difficulty(&cli.difficulty)
        .image_concurrency(cli.concurrency)
        .upload_timeout_secs(cli.upload_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref prefix) = cli.key_prefix {
        builder = builder.key_prefix(prefix);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn write_stdout(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    if !text.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}
