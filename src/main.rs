use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

mod db;
mod models;
mod normalize;
mod report;
mod stats;

use models::{DailyReport, ReportInput};
use normalize::NormalizedBatch;
use stats::{ReportFilter, Window};

#[derive(Parser)]
#[command(name = "telecaller-reports")]
#[command(about = "Daily activity dashboard for telecaller reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load deterministic sample reports
    Seed,
    /// Import report rows from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Append a single daily report
    Add {
        #[command(flatten)]
        fields: ReportArgs,
    },
    /// Overwrite a report row by position
    Update {
        #[arg(long)]
        row: i64,
        #[command(flatten)]
        fields: ReportArgs,
    },
    /// Delete a report row by position
    Delete {
        #[arg(long)]
        row: i64,
    },
    /// Show aggregate stats for a date window
    Stats {
        #[arg(long, value_enum, default_value_t = Window::Today)]
        window: Window,
        #[arg(long)]
        telecaller: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// List reports, newest first, with optional filters
    Reports {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        telecaller: Option<String>,
        #[arg(long, value_enum)]
        video: Option<VideoFilter>,
        /// Inclusive start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Inclusive end date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown dashboard report
    Report {
        #[arg(long)]
        telecaller: Option<String>,
        #[arg(long, default_value_t = 14)]
        days: i64,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Export the raw report table as CSV
    Export {
        #[arg(long, default_value = "reports.csv")]
        out: PathBuf,
    },
    /// Show the edit history, newest first
    History {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VideoFilter {
    Yes,
    No,
}

#[derive(Args)]
struct ReportArgs {
    /// Report timestamp, e.g. "15/01/2026 09:30:00"
    #[arg(long)]
    date: String,
    #[arg(long, default_value = "")]
    telecaller: String,
    /// Day-of-week label, stored as given
    #[arg(long, default_value = "")]
    day: String,
    #[arg(long, default_value_t = 0)]
    total_calls: i64,
    #[arg(long, default_value_t = 0)]
    new_data: i64,
    #[arg(long, default_value_t = 0)]
    crm_data: i64,
    #[arg(long, default_value = "")]
    country: String,
    #[arg(long, default_value_t = 0)]
    fair_data: i64,
    /// "Yes" marks a video activity; anything else is treated as "No"
    #[arg(long, default_value = "No")]
    video: String,
    #[arg(long, default_value = "")]
    video_details: String,
    #[arg(long, default_value = "")]
    other_work: String,
    #[arg(long, default_value_t = 0)]
    visited_students: i64,
    #[arg(long, default_value = "")]
    remarks: String,
}

impl From<ReportArgs> for ReportInput {
    fn from(args: ReportArgs) -> Self {
        ReportInput {
            date: args.date,
            telecaller: args.telecaller,
            day: args.day,
            total_calls: args.total_calls,
            new_data: args.new_data,
            crm_data: args.crm_data,
            country: args.country,
            fair_data: args.fair_data,
            video: args.video,
            video_details: args.video_details,
            other_work: args.other_work,
            visited_students: args.visited_students,
            remarks: args.remarks,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let inserted = db::seed(&pool).await?;
            println!("Inserted {inserted} sample reports.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} reports from {}.", csv.display());
        }
        Commands::Add { fields } => {
            let input = ReportInput::from(fields);
            let row_pos = db::append_report(&pool, &input).await?;
            println!("Report appended at row {row_pos}.");
        }
        Commands::Update { row, fields } => {
            let input = ReportInput::from(fields);
            if db::update_report(&pool, row, &input).await? {
                println!("Row {row} updated.");
            } else {
                println!("Row {row} not found.");
            }
        }
        Commands::Delete { row } => {
            if db::delete_report(&pool, row).await? {
                println!("Row {row} deleted.");
            } else {
                println!("Row {row} not found.");
            }
        }
        Commands::Stats {
            window,
            telecaller,
            json,
        } => {
            let rows = db::fetch_rows(&pool).await?;
            let batch = normalize::normalize(&rows);
            log_skipped(&batch);
            let reports = scope_reports(batch.reports, telecaller.as_deref());
            let today = Utc::now().date_naive();
            let window_stats = stats::dashboard_stats(&reports, window, today);

            if json {
                println!("{}", serde_json::to_string_pretty(&window_stats)?);
            } else {
                println!("Total calls: {}", window_stats.total_calls);
                println!(
                    "New data: {} (conversion {:.1}%)",
                    window_stats.new_data, window_stats.conversion_rate
                );
                println!(
                    "CRM updates: {} (completion {:.1}%)",
                    window_stats.crm_data, window_stats.crm_completion_rate
                );
                println!("Fair leads: {}", window_stats.fair_data);
                println!("Visited students: {}", window_stats.visited_students);
                println!("Video activities: {}", window_stats.video_activities);
                println!("Country entries: {}", window_stats.country_data);
                println!(
                    "Days with data: {} (avg {:.1} calls/day, {:.1} new data/day)",
                    window_stats.total_days,
                    window_stats.avg_calls_per_day,
                    window_stats.avg_new_data_per_day
                );
            }
        }
        Commands::Reports {
            search,
            telecaller,
            video,
            from,
            to,
            limit,
            json,
        } => {
            let rows = db::fetch_rows(&pool).await?;
            let batch = normalize::normalize(&rows);
            log_skipped(&batch);
            let filter = ReportFilter {
                from,
                to,
                telecaller,
                video: video.map(|flag| matches!(flag, VideoFilter::Yes)),
                search,
            };
            let matches = stats::filter_reports(&batch.reports, &filter);

            if json {
                let page: Vec<&DailyReport> = matches.into_iter().take(limit).collect();
                println!("{}", serde_json::to_string_pretty(&page)?);
            } else if matches.is_empty() {
                println!("No reports match.");
            } else {
                for report in matches.iter().take(limit) {
                    println!(
                        "- {} [row {}] {}: {} calls, {} new data, {} CRM updates{}",
                        report.calendar_date(),
                        report.row_pos,
                        report.telecaller,
                        report.total_calls,
                        report.new_data,
                        report.crm_data,
                        if report.video { ", video" } else { "" }
                    );
                }
            }
        }
        Commands::Report {
            telecaller,
            days,
            out,
        } => {
            let rows = db::fetch_rows(&pool).await?;
            let batch = normalize::normalize(&rows);
            log_skipped(&batch);
            let today = Utc::now().date_naive();
            let markdown = report::build_report(
                telecaller.as_deref(),
                days,
                today,
                &batch.reports,
                batch.skipped(),
            );
            std::fs::write(&out, markdown)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { out } => {
            let rows = db::fetch_rows(&pool).await?;
            let exported = db::export_csv(&rows, &out)?;
            println!("Exported {exported} rows to {}.", out.display());
        }
        Commands::History { limit } => {
            let logs = db::fetch_edit_logs(&pool, limit).await?;
            if logs.is_empty() {
                println!("No edit history.");
            } else {
                for entry in logs {
                    println!(
                        "- {} {} {} {}",
                        entry.logged_at, entry.action, entry.report_date, entry.telecaller
                    );
                }
            }
        }
    }

    Ok(())
}

fn scope_reports(reports: Vec<DailyReport>, telecaller: Option<&str>) -> Vec<DailyReport> {
    match telecaller {
        Some(name) => reports
            .into_iter()
            .filter(|report| report.telecaller == name)
            .collect(),
        None => reports,
    }
}

fn log_skipped(batch: &NormalizedBatch) {
    if batch.skipped() > 0 {
        tracing::warn!(
            bad_dates = batch.bad_dates,
            negative_counts = batch.negative_counts,
            "rows excluded during normalization"
        );
    }
}
