use std::path::{Path, PathBuf};

use anyhow::Context;
use attendance_forecast::advice::advise;
use attendance_forecast::config::{DbConfig, PlannerOptions};
use attendance_forecast::days::generate_days;
use attendance_forecast::impact::{cascade, current_pct};
use attendance_forecast::ledger::LedgerKey;
use attendance_forecast::models::{ImpactResult, LedgerEntry, Simulation};
use attendance_forecast::report::{build_report, signed};
use attendance_forecast::session::ForecastSession;
use attendance_forecast::{db, importer, logging};
use clap::{Args, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

#[derive(Parser)]
#[command(name = "attendance-forecast")]
#[command(about = "Plan the coming week and see what it does to your attendance", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PlanArgs {
    /// Cycle a planner cell (none -> attend -> skip), repeatable
    #[arg(long = "toggle", value_name = "DAY:SUBJECT_ID")]
    toggles: Vec<LedgerKey>,
    /// JSON file of saved entries, applied before any toggles
    #[arg(long)]
    plan: Option<PathBuf>,
    #[command(flatten)]
    options: PlannerOptions,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a sample attendance record
    Seed,
    /// Import attendance from a CSV export
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Show current attendance per subject with skip/attend advice
    Status {
        #[command(flatten)]
        options: PlannerOptions,
    },
    /// Print the planning window
    Days {
        #[command(flatten)]
        options: PlannerOptions,
    },
    /// Project attendance after the planned week
    Forecast {
        #[command(flatten)]
        plan: PlanArgs,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Apply simulations one at a time and print the percentages after each
    Steps {
        /// JSON file of `{subject_id, action, weight}` requests
        #[arg(long)]
        simulations: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Write a markdown forecast report
    Report {
        #[command(flatten)]
        plan: PlanArgs,
        #[arg(long, default_value = "forecast.md")]
        out: PathBuf,
    },
}

async fn connect() -> anyhow::Result<PgPool> {
    let config = DbConfig::from_env()?;
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
}

async fn plan_session(
    pool: &PgPool,
    args: &PlanArgs,
) -> anyhow::Result<(ForecastSession, ImpactResult)> {
    let baseline = db::fetch_baseline(pool).await?;
    let entries = match &args.plan {
        Some(path) => read_json::<Vec<LedgerEntry>>(path)?,
        None => Vec::new(),
    };

    let mut session = ForecastSession::new(baseline);
    let impact = session.apply_plan(entries, &args.toggles)?;
    info!(
        actions = session.ledger().len(),
        after = impact.global.after,
        "forecast computed"
    );
    Ok((session, impact))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::InitDb => {
            db::init_db(&connect().await?).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let summary = db::seed(&connect().await?).await?;
            println!(
                "Seed data inserted ({} logs across {} subjects).",
                summary.logs_written,
                summary.subjects.len()
            );
        }
        Commands::Import { csv } => {
            let text = std::fs::read_to_string(&csv)
                .with_context(|| format!("failed to read {}", csv.display()))?;
            let parsed = importer::parse_attendance(&text, chrono::Local::now().date_naive())?;
            info!(mode = ?parsed.mode, rows_skipped = parsed.skipped, "parsed attendance export");

            let summary = db::import_sessions(&connect().await?, &parsed.sessions).await?;
            println!(
                "Imported {} logs across {} subjects from {} ({} rows skipped).",
                summary.logs_written,
                summary.subjects.len(),
                csv.display(),
                parsed.skipped
            );
        }
        Commands::Status { options } => {
            let baseline = db::fetch_baseline(&connect().await?).await?;
            if baseline.subjects.is_empty() {
                println!("No subjects recorded yet.");
                return Ok(());
            }

            let target = options.target_pct();
            let attended: f64 = baseline.subjects.iter().map(|s| s.attended_units).sum();
            let conducted: f64 = baseline.subjects.iter().map(|s| s.conducted_units).sum();
            println!(
                "Overall {:.1}% ({attended}/{conducted}), {}",
                baseline.global_pct,
                advise(attended, conducted, target)
            );
            for subject in baseline.subjects.iter() {
                println!(
                    "- {} [{}] ({}) {:.1}% ({}/{}), {}",
                    subject.name,
                    subject.id,
                    subject.session_type,
                    current_pct(subject),
                    subject.attended_units,
                    subject.conducted_units,
                    advise(subject.attended_units, subject.conducted_units, target)
                );
            }
        }
        Commands::Days { options } => {
            for day in generate_days(options.reference_date(), options.rest_day) {
                let rest = if day.is_rest_day { " (no classes)" } else { "" };
                println!("{} {}{}", day.offset, day.date.format("%a %b %d"), rest);
            }
        }
        Commands::Forecast { plan, json, limit } => {
            let (_, impact) = plan_session(&connect().await?, &plan).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&impact)?);
                return Ok(());
            }

            println!(
                "Overall {:.2}% -> {:.2}% ({})",
                impact.global.before,
                impact.global.after,
                signed(impact.global.diff)
            );
            println!("Most affected subjects:");
            for projection in impact.subjects.iter().take(limit) {
                println!(
                    "- {} ({}) {:.1}% -> {:.1}% ({})",
                    projection.subject.name,
                    projection.subject.session_type,
                    projection.current_pct,
                    projection.final_pct,
                    signed(projection.diff)
                );
            }
        }
        Commands::Steps { simulations, json } => {
            let simulations: Vec<Simulation> = read_json(&simulations)?;
            let baseline = db::fetch_baseline(&connect().await?).await?;
            let steps = cascade(&baseline.subjects, &simulations);

            if json {
                println!("{}", serde_json::to_string_pretty(&steps)?);
                return Ok(());
            }

            let names: std::collections::HashMap<_, _> = baseline
                .subjects
                .iter()
                .map(|s| (s.id, s.name.as_str()))
                .collect();
            for (index, step) in steps.iter().enumerate() {
                println!(
                    "{}. {} {:.2}%, overall {:.2}%",
                    index + 1,
                    names.get(&step.subject_id).copied().unwrap_or("unknown subject"),
                    step.subject_pct,
                    step.global_pct
                );
            }
        }
        Commands::Report { plan, out } => {
            let (session, impact) = plan_session(&connect().await?, &plan).await?;
            let days = generate_days(plan.options.reference_date(), plan.options.rest_day);
            let report = build_report(
                &days,
                &session.baseline().subjects,
                session.ledger(),
                &impact,
                plan.options.target_pct(),
            );
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
