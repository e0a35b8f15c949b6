use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

mod config;
mod db;
mod document;
mod error;
mod logging;
mod models;
mod ranking;
mod report;
mod scale;
mod scoring;

use config::{DatabaseConfig, LogConfig};
use error::LookupError;
use scale::MarksScale;
use scoring::ScoringPolicy;

#[derive(Parser)]
#[command(name = "student-performance")]
#[command(about = "Academic, extracurricular and remarks scoring for student rosters", long_about = None)]
struct Cli {
    #[command(flatten)]
    database: DatabaseConfig,
    #[command(flatten)]
    log: LogConfig,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import performance rows from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
        /// Scale the academic marks in the file are written on
        #[arg(long, value_enum, default_value_t = MarksScale::Percent)]
        marks_scale: MarksScale,
    },
    /// Rank students by total score
    Rank {
        /// Students to list; text output defaults to 10, --json to all
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Show the best performing student
    Best {
        #[arg(long)]
        json: bool,
    },
    /// Show one student's performance dashboard
    Show {
        #[arg(long)]
        email: String,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report for the roster
    Report {
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

const DEFAULT_RANK_LIMIT: usize = 10;

/// JSON output lists the whole roster unless a limit is given.
fn rank_limit(limit: Option<usize>, json: bool, roster_len: usize) -> usize {
    match limit {
        Some(limit) => limit,
        None if json => roster_len,
        None => DEFAULT_RANK_LIMIT,
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log);

    let pool = cli.database.connect().await?;
    let policy = ScoringPolicy::default();

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv, marks_scale } => {
            let imported = db::import_csv(&pool, &csv, marks_scale).await?;
            tracing::info!(students = imported, path = %csv.display(), "import finished");
            println!("Imported performance for {imported} students from {}.", csv.display());
        }
        Commands::Rank { limit, json } => {
            let students = db::fetch_students(&pool).await?;
            let ranked = match ranking::rank_students(&policy, &students) {
                Ok(ranked) => ranked,
                Err(LookupError::NoStudents) => {
                    println!("No students found.");
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            };

            let limit = rank_limit(limit, json, ranked.len());
            if json {
                let top: Vec<_> = ranked.into_iter().take(limit).collect();
                return print_json(&top);
            }

            println!("Top students by total score:");
            for (position, entry) in ranked.iter().take(limit).enumerate() {
                println!(
                    "{}. {} ({}) total {} (academic {}, extracurricular {}, remarks {})",
                    position + 1,
                    entry.name,
                    entry.email,
                    entry.score.total_score,
                    entry.score.academic_score,
                    entry.score.extra_curricular_score,
                    entry.score.remarks_score
                );
            }
        }
        Commands::Best { json } => {
            let students = db::fetch_students(&pool).await?;
            let best = ranking::best_student(&policy, &students);

            if json {
                return match best {
                    Some(best) => print_json(&best),
                    None => print_json(&serde_json::json!({ "bestStudent": null })),
                };
            }

            match best {
                Some(best) => println!(
                    "Best performing student: {} ({}) with total score {}",
                    best.best_student.name, best.best_student.email, best.total_score
                ),
                None => println!("No best performing student found."),
            }
        }
        Commands::Show { email, json } => {
            let student = db::fetch_student_by_email(&pool, &email)
                .await?
                .ok_or(LookupError::StudentNotFound { email })?;
            let view = ranking::dashboard(&policy, &student);

            if json {
                return print_json(&view);
            }

            println!("{} ({})", view.student.name, view.student.email);
            if view.score.academic_by_year.is_empty() {
                println!("No academic records.");
            }
            for year in &view.years {
                println!(
                    "- Year {}: average {:.1} (SGPA {:.2}) across {} subjects",
                    year.year, year.average, year.sgpa, year.subjects
                );
            }
            println!(
                "Academic average {:.1} (SGPA {:.2})",
                view.academic_average, view.cumulative_sgpa
            );
            println!(
                "Scores: academic {}, extracurricular {}, remarks {}, total {}",
                view.score.academic_score,
                view.score.extra_curricular_score,
                view.score.remarks_score,
                view.score.total_score
            );
        }
        Commands::Report { limit, out } => {
            let students = db::fetch_students(&pool).await?;
            let report = report::build_report(&policy, &students, limit, chrono::Utc::now());
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
