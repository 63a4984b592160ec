use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

mod assessment;
mod config;
mod db;
mod error;
mod models;
mod report;
mod risk;
mod store;

use crate::db::PgStore;
use crate::models::StudentStatus;
use crate::report::{RosterFilter, RosterSort};
use crate::store::RecordStore;

#[derive(Parser)]
#[command(name = "eduguard")]
#[command(version, about = "Dropout risk assessment for EduGuard student records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load demo students and records
    Seed,
    /// Import students and records from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Score one student and store the result
    Assess {
        #[arg(long)]
        student: Uuid,
        #[arg(long)]
        json: bool,
    },
    /// Score every student, one at a time
    AssessAll {
        #[arg(long)]
        json: bool,
    },
    /// List students with optional filters
    Roster {
        #[arg(long)]
        status: Option<StudentStatus>,
        #[arg(long)]
        min_score: Option<i32>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum, default_value_t = RosterSort::Risk)]
        sort: RosterSort,
        #[arg(long, default_value_t = 25)]
        limit: usize,
    },
    /// Generate a markdown report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        /// Re-score every student before writing the report
        #[arg(long)]
        refresh: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    config::init_tracing();
    let config = config::Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;
    let store = PgStore::new(pool);

    match cli.command {
        Commands::InitDb => {
            db::init_db(store.pool()).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(store.pool()).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(store.pool(), &csv).await?;
            println!("Inserted {inserted} rows from {}.", csv.display());
        }
        Commands::Assess { student, json } => {
            let assessment = assessment::assess_student(&store, student).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&assessment)?);
            } else {
                let b = assessment.breakdown;
                println!(
                    "{} score {} [{}] (academic {}, attendance {}, behavioral {}); was {} [{}]",
                    assessment.student_name,
                    b.total,
                    assessment.status,
                    b.academic,
                    b.attendance,
                    b.behavioral,
                    assessment.previous_score,
                    assessment.previous_status
                );
                for intervention in store.list_interventions(student).await? {
                    println!(
                        "  intervention: {} ({}) since {}",
                        intervention.kind, intervention.status, intervention.started_on
                    );
                }
            }
        }
        Commands::AssessAll { json } => {
            let run = assessment::assess_all(&store).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&run)?);
            } else {
                for assessment in &run.assessed {
                    println!(
                        "- {} score {} [{}]",
                        assessment.student_name,
                        assessment.score(),
                        assessment.status
                    );
                }
                for failure in &run.failed {
                    println!("- {} failed: {}", failure.student_id, failure.reason);
                }
                println!(
                    "Assessed {} students, {} failed.",
                    run.assessed.len(),
                    run.failed.len()
                );
            }
            if !run.failed.is_empty() {
                anyhow::bail!("{} student assessments failed", run.failed.len());
            }
        }
        Commands::Roster {
            status,
            min_score,
            search,
            sort,
            limit,
        } => {
            let students = store.list_students().await?;
            let filter = RosterFilter {
                status,
                min_score,
                search,
            };
            let roster = report::filter_roster(&students, &filter, sort);

            if roster.is_empty() {
                println!("No students match these filters.");
                return Ok(());
            }

            for student in roster.iter().take(limit) {
                println!(
                    "- {} ({}, grade {}) score {} [{}]",
                    student.full_name(),
                    student.email,
                    student.grade_level,
                    student.risk_score,
                    student.status
                );
            }
        }
        Commands::Report { out, refresh } => {
            let run = if refresh {
                Some(assessment::assess_all(&store).await?)
            } else {
                None
            };
            let students = store.list_students().await?;
            let report = report::build_report(&students, run.as_ref());
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
