//! Lumen progression engine (lumen-pe) - developer CLI
//!
//! Opens the learner database, loads the content catalog and drives the
//! progression engine one operation per invocation. Every run validates the
//! bootstrap first, so a fresh root folder only needs a catalog file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lumen_common::config::{find_config_file, resolve_root_folder, TomlConfig};
use lumen_common::db::init_database;
use lumen_common::time::format_countdown;
use lumen_pe::catalog::NextChapter;
use lumen_pe::db::settings;
use lumen_pe::rules::Difficulty;
use lumen_pe::{Catalog, EngineOptions, ProgressionEngine, SqliteStatusStore};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for lumen-pe
#[derive(Parser, Debug)]
#[command(name = "lumen-pe")]
#[command(about = "Curriculum progression engine for Lumen")]
#[command(version)]
struct Args {
    /// Root folder holding the database and catalog
    #[arg(short, long, env = "LUMEN_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Bootstrap config file (defaults to the user's lumen/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database file (overrides the config file)
    #[arg(long)]
    database: Option<PathBuf>,

    /// Catalog file (overrides the config file)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Ignore exam locks and cooldowns for this run
    #[arg(long)]
    debug_override: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Seed missing status rows
    Bootstrap,
    /// Show progress for every course
    Status {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Mark a chapter completed
    CompleteChapter { chapter_id: i64 },
    /// Tick a task (or untick with --undo)
    Task {
        task_id: i64,
        #[arg(long)]
        undo: bool,
    },
    /// Start an exam attempt
    BeginExam { exam_id: i64 },
    /// Score an exam attempt
    FinishExam {
        exam_id: i64,
        correct: u32,
        total: u32,
        /// Pass threshold in percent (defaults to the difficulty setting)
        #[arg(long)]
        threshold: Option<u32>,
    },
    /// Show an exam's record and cooldown
    Exam { exam_id: i64 },
    /// Where to go after a chapter
    Next { chapter_id: i64 },
    /// Show or change the exam difficulty
    Difficulty { level: Option<Difficulty> },
    /// Delete all progress and re-seed defaults
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(find_config_file);
    let config = match &config_path {
        Some(path) => Some(
            TomlConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
        ),
        None => None,
    };

    // Initialize tracing
    let default_filter = match &config {
        Some(c) => format!("lumen_pe={},lumen_common={}", c.logging.level, c.logging.level),
        None => "lumen_pe=debug,lumen_common=info".to_string(),
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let root_folder =
        resolve_root_folder(args.root_folder.as_deref(), "LUMEN_ROOT_FOLDER", config.as_ref());
    let config = config.unwrap_or_default();
    let database_path = args
        .database
        .clone()
        .unwrap_or_else(|| config.database_path(&root_folder));
    let catalog_path = args
        .catalog
        .clone()
        .unwrap_or_else(|| config.catalog_path(&root_folder));

    info!("Root folder: {}", root_folder.display());

    let catalog = Catalog::load(&catalog_path)
        .with_context(|| format!("Failed to load catalog {}", catalog_path.display()))?;
    let pool = init_database(&database_path)
        .await
        .context("Failed to initialize database")?;

    let debug_override = args.debug_override
        || settings::get_debug_override(&pool)
            .await
            .context("Failed to read debug override")?;

    let engine = ProgressionEngine::with_options(
        Arc::new(SqliteStatusStore::new(pool.clone())),
        Arc::new(catalog),
        EngineOptions {
            debug_override,
            ..EngineOptions::default()
        },
    );

    let report = engine
        .bootstrap_validate()
        .await
        .context("Bootstrap validation failed")?;

    match args.command {
        Command::Bootstrap => {
            println!(
                "Seeded {} courses, {} chapters, {} tasks, {} exams",
                report.courses, report.chapters, report.tasks, report.exams
            );
        }
        Command::Status { json } => {
            let progress = engine.curriculum_progress().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&progress)?);
            } else {
                println!("{:>8}  {:<10}  {:>8}  {:>6}  exam", "course", "status", "chapters", "tasks");
                for p in progress {
                    println!(
                        "{:>8}  {:<10}  {:>4}/{:<3}  {:>3}/{:<2}  {}",
                        p.course_id,
                        p.status,
                        p.chapters_completed,
                        p.chapters_total,
                        p.tasks_completed,
                        p.tasks_total,
                        p.exam_status
                    );
                }
            }
        }
        Command::CompleteChapter { chapter_id } => {
            let outcome = engine.complete_chapter(chapter_id).await?;
            println!("{}", serde_json::to_string(&outcome)?);
        }
        Command::Task { task_id, undo } => {
            let status = engine.set_task_completed(task_id, !undo).await?;
            println!("Task {} is now {}", task_id, status);
        }
        Command::BeginExam { exam_id } => {
            let ticket = engine.begin_exam_attempt(exam_id).await?;
            println!(
                "Exam {} started: {} questions, time limit {}",
                exam_id,
                ticket.question_amount,
                format_countdown(ticket.deadline - ticket.started_at)
            );
        }
        Command::FinishExam {
            exam_id,
            correct,
            total,
            threshold,
        } => {
            let threshold = match threshold {
                Some(t) => t,
                None => settings::get_pass_threshold_percent(&pool).await?,
            };
            let outcome = engine
                .finish_exam(exam_id, correct, total, threshold)
                .await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Exam { exam_id } => {
            let overview = engine.exam_overview(exam_id).await?;
            println!("{}", serde_json::to_string_pretty(&overview)?);
            if overview.on_cooldown {
                println!("Retry in {}", format_countdown(overview.seconds_remaining));
            }
        }
        Command::Next { chapter_id } => match engine.next_chapter(chapter_id)? {
            NextChapter::InCourse { chapter_id } => println!("Next: chapter {}", chapter_id),
            NextChapter::FirstOfNextCourse {
                course_id,
                chapter_id,
            } => println!("Next: chapter {} of course {}", chapter_id, course_id),
            NextChapter::EndOfCurriculum => println!("End of curriculum"),
        },
        Command::Difficulty { level } => {
            if let Some(level) = level {
                settings::set_difficulty(&pool, level).await?;
            }
            let current = settings::get_difficulty(&pool).await?;
            println!(
                "Difficulty: {} (pass at {}%)",
                current,
                current.pass_threshold_percent()
            );
        }
        Command::Reset => {
            let report = engine.reset_progress().await?;
            println!("Progress reset; {} rows re-seeded", report.total());
        }
    }

    Ok(())
}
