//! marksheet CLI — scan rasterized answer-sheet pages and grade them.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use marksheet_core::{
    mark_is_valid, AnswerValue, GradingSession, PageAnalysis, SheetConfig, SheetReader,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "marksheet")]
#[command(about = "Read filled bubbles from scanned mark-sheet pages and grade them against a key page")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a single page image and write its structured reading.
    Analyze(CliAnalyzeArgs),

    /// Grade a batch: the first page image is the answer key, the rest are
    /// student sheets.
    Grade(CliGradeArgs),

    /// Write a default sheet configuration to edit.
    ConfigTemplate {
        /// Path to write the config JSON.
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
struct CliAnalyzeArgs {
    /// Path to the page image (PNG/JPEG, RGBA at the rasterizer scale).
    #[arg(long)]
    image: PathBuf,

    /// Sheet configuration JSON; omit to use the built-in default layout.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to write the page analysis (JSON).
    #[arg(long)]
    out: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct CliGradeArgs {
    /// Page images in page order; the first is the key page.
    #[arg(required = true, num_args = 2..)]
    pages: Vec<PathBuf>,

    /// Sheet configuration JSON; omit to use the built-in default layout.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to write key + per-page results (JSON).
    #[arg(long)]
    out: PathBuf,

    /// Optional path for a CSV summary of the results.
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => run_analyze(&args),
        Commands::Grade(args) => run_grade(&args),
        Commands::ConfigTemplate { out } => run_config_template(&out),
    }
}

fn load_config(path: Option<&Path>) -> CliResult<SheetConfig> {
    match path {
        Some(p) => SheetConfig::from_json_file(p).map_err(|e| -> CliError {
            format!("failed to load config {}: {}", p.display(), e).into()
        }),
        None => Ok(SheetConfig::default()),
    }
}

fn load_page(path: &Path) -> CliResult<image::RgbaImage> {
    let img = image::open(path).map_err(|e| -> CliError {
        format!("failed to open image {}: {}", path.display(), e).into()
    })?;
    Ok(img.to_rgba8())
}

/// Log marks that exceed a block's configured option count. Out-of-range
/// marks keep their decoded value; this only flags them for review.
fn warn_out_of_range_marks(config: &SheetConfig, analysis: &PageAnalysis) {
    let per_block = config.questions_per_block as usize;
    for (i, value) in analysis.answers.iter().enumerate() {
        let AnswerValue::Mark(v) = *value else { continue };
        let block = i / per_block;
        let max_option = config.answer_blocks[block].max_option;
        if !mark_is_valid(v, max_option) {
            tracing::warn!(
                "Q{}: mark {} exceeds block {}'s {} options",
                i + 1,
                v,
                block + 1,
                max_option
            );
        }
    }
}

// ── config-template ────────────────────────────────────────────────────

fn run_config_template(out: &Path) -> CliResult<()> {
    let json = SheetConfig::default().to_json_string()?;
    std::fs::write(out, json)?;
    tracing::info!("Config template written to {}", out.display());
    Ok(())
}

// ── analyze ────────────────────────────────────────────────────────────

fn run_analyze(args: &CliAnalyzeArgs) -> CliResult<()> {
    let config = load_config(args.config.as_deref())?;
    let reader = SheetReader::new(config)?;

    tracing::info!("Loading page: {}", args.image.display());
    let buffer = load_page(&args.image)?;
    tracing::info!("Page size: {}x{}", buffer.width(), buffer.height());

    let analysis = reader.read_page(&buffer)?;
    warn_out_of_range_marks(reader.config(), &analysis);

    let answered = analysis
        .answers
        .iter()
        .filter(|a| !matches!(a, AnswerValue::Blank))
        .count();
    tracing::info!(
        "Student ID {}: {} of {} questions answered",
        analysis.student_id,
        answered,
        analysis.answers.len()
    );

    let json = serde_json::to_string_pretty(&analysis)?;
    std::fs::write(&args.out, &json)?;
    tracing::info!("Analysis written to {}", args.out.display());

    Ok(())
}

// ── grade ──────────────────────────────────────────────────────────────

fn run_grade(args: &CliGradeArgs) -> CliResult<()> {
    let config = load_config(args.config.as_deref())?;
    let reader = SheetReader::new(config)?;
    let mut session = GradingSession::new();

    // Page 1 is the key sheet.
    let key_path = &args.pages[0];
    tracing::info!("Reading key page: {}", key_path.display());
    let key_page = reader.read_page(&load_page(key_path)?)?;
    warn_out_of_range_marks(reader.config(), &key_page);
    session.set_answer_key(key_page.answers);

    for (i, path) in args.pages[1..].iter().enumerate() {
        let page_num = (i + 2) as u32;
        tracing::info!("Reading page {}: {}", page_num, path.display());
        let analysis = reader.read_page(&load_page(path)?)?;
        warn_out_of_range_marks(reader.config(), &analysis);
        session.grade_student(&analysis.student_id, &analysis.answers, page_num);
    }

    let json = serde_json::to_string_pretty(&session.raw_data())?;
    std::fs::write(&args.out, &json)?;
    tracing::info!("Results written to {}", args.out.display());

    if let Some(csv_path) = &args.csv {
        std::fs::write(csv_path, results_csv(&session))?;
        tracing::info!("CSV summary written to {}", csv_path.display());
    }

    Ok(())
}

/// Plain CSV summary: one row per graded page, blank cells for unanswered
/// questions.
fn results_csv(session: &GradingSession) -> String {
    let num_questions = session.answer_key().len();

    let mut headers = vec![
        "Page".to_string(),
        "Student ID".to_string(),
        "Score".to_string(),
        "Max Score".to_string(),
    ];
    for q in 1..=num_questions {
        headers.push(format!("Q{}", q));
    }

    let mut lines = vec![headers.join(",")];
    for result in session.results() {
        let mut row = vec![
            result.page.to_string(),
            result.student_id.clone(),
            result.score.to_string(),
            result.max_score.to_string(),
        ];
        for detail in &result.details {
            row.push(match detail.student {
                AnswerValue::Blank => String::new(),
                other => other.to_string(),
            });
        }
        lines.push(row.join(","));
    }

    lines.join("\n")
}
