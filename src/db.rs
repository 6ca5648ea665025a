use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{EditLog, ReportInput, ReportRow};

const REPORT_COLUMNS: &str = "row_pos, date, telecaller, day, total_calls, new_data, crm_data, \
     country_data, fair_data, video, video_details, other_work, visited_students, remarks";

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<usize> {
    let today = Utc::now().date_naive();
    let seeds = vec![
        ("seed-001", 0, "Priya", 142, 18, 120, "UK", 6, "Yes", "Campus tour reel"),
        ("seed-002", 0, "Ravi", 98, 9, 70, "", 2, "No", ""),
        ("seed-003", 1, "Priya", 130, 14, 101, "Australia", 4, "No", ""),
        ("seed-004", 2, "Ravi", 110, 12, 88, "Canada", 3, "Yes", "Testimonial short"),
        ("seed-005", 3, "Priya", 125, 11, 95, "UK", 5, "No", ""),
        ("seed-006", 5, "Meera", 87, 6, 54, "Other", 1, "No", ""),
        ("seed-007", 6, "Ravi", 140, 17, 112, "USA", 7, "Yes", "Fair walkthrough"),
        ("seed-008", 9, "Priya", 118, 10, 90, "UK", 4, "No", ""),
    ];

    let mut inserted = 0usize;
    for (source_key, days_ago, telecaller, calls, new_data, crm, country, fair, video, details) in
        seeds
    {
        let date = today - chrono::Duration::days(days_ago);
        let result = sqlx::query(
            r#"
            INSERT INTO telecaller_reports.reports
            (date, telecaller, day, total_calls, new_data, crm_data, country_data,
             fair_data, video, video_details, other_work, visited_students, remarks, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, '', '1', '', $11)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(date.format("%d/%m/%Y 09:00:00").to_string())
        .bind(telecaller)
        .bind(date.format("%A").to_string())
        .bind(calls.to_string())
        .bind(new_data.to_string())
        .bind(crm.to_string())
        .bind(country)
        .bind(fair.to_string())
        .bind(video)
        .bind(details)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

/// Full snapshot of the report table in append order. An `Err` means the
/// store is unreachable; an empty vec means there is simply no data yet.
pub async fn fetch_rows(pool: &PgPool) -> anyhow::Result<Vec<ReportRow>> {
    let query = format!(
        "SELECT {REPORT_COLUMNS} FROM telecaller_reports.reports ORDER BY row_pos"
    );
    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .await
        .context("failed to read report rows from the store")?;

    Ok(rows.iter().map(report_row).collect())
}

/// Append one report; returns its position key.
pub async fn append_report(pool: &PgPool, input: &ReportInput) -> anyhow::Result<i64> {
    let row_pos: i64 = insert_row(pool, input, &format!("add-{}", Uuid::new_v4())).await?;

    log_edit(
        pool,
        &EditLog {
            logged_at: Utc::now().naive_utc(),
            action: "ADD".to_string(),
            report_date: input.date.clone(),
            telecaller: input.telecaller.clone(),
            original_data: String::new(),
            new_data: serde_json::to_string(input)?,
        },
    )
    .await?;

    Ok(row_pos)
}

/// Overwrite the whole row at `row_pos`; returns false if it does not exist.
pub async fn update_report(pool: &PgPool, row_pos: i64, input: &ReportInput) -> anyhow::Result<bool> {
    let Some(original) = fetch_row(pool, row_pos).await? else {
        return Ok(false);
    };

    sqlx::query(
        r#"
        UPDATE telecaller_reports.reports
        SET date = $2, telecaller = $3, day = $4, total_calls = $5, new_data = $6,
            crm_data = $7, country_data = $8, fair_data = $9, video = $10,
            video_details = $11, other_work = $12, visited_students = $13, remarks = $14
        WHERE row_pos = $1
        "#,
    )
    .bind(row_pos)
    .bind(&input.date)
    .bind(&input.telecaller)
    .bind(&input.day)
    .bind(input.total_calls.to_string())
    .bind(input.new_data.to_string())
    .bind(input.crm_data.to_string())
    .bind(&input.country)
    .bind(input.fair_data.to_string())
    .bind(&input.video)
    .bind(&input.video_details)
    .bind(&input.other_work)
    .bind(input.visited_students.to_string())
    .bind(&input.remarks)
    .execute(pool)
    .await
    .context("failed to update report row")?;

    log_edit(
        pool,
        &EditLog {
            logged_at: Utc::now().naive_utc(),
            action: "UPDATE".to_string(),
            report_date: input.date.clone(),
            telecaller: input.telecaller.clone(),
            original_data: serde_json::to_string(&original)?,
            new_data: serde_json::to_string(input)?,
        },
    )
    .await?;

    Ok(true)
}

/// Delete the row at `row_pos`; returns false if it does not exist.
pub async fn delete_report(pool: &PgPool, row_pos: i64) -> anyhow::Result<bool> {
    let Some(original) = fetch_row(pool, row_pos).await? else {
        return Ok(false);
    };

    sqlx::query("DELETE FROM telecaller_reports.reports WHERE row_pos = $1")
        .bind(row_pos)
        .execute(pool)
        .await
        .context("failed to delete report row")?;

    log_edit(
        pool,
        &EditLog {
            logged_at: Utc::now().naive_utc(),
            action: "DELETE".to_string(),
            report_date: original.date.clone(),
            telecaller: original.telecaller.clone(),
            original_data: serde_json::to_string(&original)?,
            new_data: String::new(),
        },
    )
    .await?;

    Ok(true)
}

pub async fn import_csv(pool: &PgPool, csv_path: &Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        date: String,
        #[serde(default)]
        telecaller: String,
        #[serde(default)]
        day: String,
        #[serde(default)]
        total_calls: String,
        #[serde(default)]
        new_data: String,
        #[serde(default)]
        crm_data: String,
        #[serde(default)]
        country_data: String,
        #[serde(default)]
        fair_data: String,
        #[serde(default)]
        video: String,
        #[serde(default)]
        video_details: String,
        #[serde(default)]
        other_work: String,
        #[serde(default)]
        visited_students: String,
        #[serde(default)]
        remarks: String,
        #[serde(default)]
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO telecaller_reports.reports
            (date, telecaller, day, total_calls, new_data, crm_data, country_data,
             fair_data, video, video_details, other_work, visited_students, remarks, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(&row.date)
        .bind(&row.telecaller)
        .bind(&row.day)
        .bind(&row.total_calls)
        .bind(&row.new_data)
        .bind(&row.crm_data)
        .bind(&row.country_data)
        .bind(&row.fair_data)
        .bind(&row.video)
        .bind(&row.video_details)
        .bind(&row.other_work)
        .bind(&row.visited_students)
        .bind(&row.remarks)
        .bind(&source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    if inserted > 0 {
        log_edit(
            pool,
            &EditLog {
                logged_at: Utc::now().naive_utc(),
                action: "IMPORT".to_string(),
                report_date: String::new(),
                telecaller: String::new(),
                original_data: String::new(),
                new_data: format!("{{\"inserted\":{inserted}}}"),
            },
        )
        .await?;
    }

    Ok(inserted)
}

/// Write the raw snapshot to a CSV file; returns the row count.
pub fn export_csv(rows: &[ReportRow], out: &Path) -> anyhow::Result<usize> {
    let mut writer = csv::Writer::from_path(out)
        .with_context(|| format!("failed to create {}", out.display()))?;

    writer.write_record([
        "row_pos",
        "date",
        "telecaller",
        "day",
        "total_calls",
        "new_data",
        "crm_data",
        "country_data",
        "fair_data",
        "video",
        "video_details",
        "other_work",
        "visited_students",
        "remarks",
    ])?;
    for row in rows {
        writer.write_record([
            row.row_pos.to_string().as_str(),
            &row.date,
            &row.telecaller,
            &row.day,
            &row.total_calls,
            &row.new_data,
            &row.crm_data,
            &row.country_data,
            &row.fair_data,
            &row.video,
            &row.video_details,
            &row.other_work,
            &row.visited_students,
            &row.remarks,
        ])?;
    }
    writer.flush()?;

    Ok(rows.len())
}

pub async fn log_edit(pool: &PgPool, entry: &EditLog) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO telecaller_reports.edit_log
        (id, logged_at, action, report_date, telecaller, original_data, new_data)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(entry.logged_at)
    .bind(&entry.action)
    .bind(&entry.report_date)
    .bind(&entry.telecaller)
    .bind(&entry.original_data)
    .bind(&entry.new_data)
    .execute(pool)
    .await
    .context("failed to append edit log entry")?;

    Ok(())
}

pub async fn fetch_edit_logs(pool: &PgPool, limit: i64) -> anyhow::Result<Vec<EditLog>> {
    let rows = sqlx::query(
        "SELECT logged_at, action, report_date, telecaller, original_data, new_data \
         FROM telecaller_reports.edit_log ORDER BY logged_at DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("failed to read edit log")?;

    Ok(rows
        .into_iter()
        .map(|row| EditLog {
            logged_at: row.get("logged_at"),
            action: row.get("action"),
            report_date: row.get("report_date"),
            telecaller: row.get("telecaller"),
            original_data: row.get("original_data"),
            new_data: row.get("new_data"),
        })
        .collect())
}

async fn fetch_row(pool: &PgPool, row_pos: i64) -> anyhow::Result<Option<ReportRow>> {
    let query = format!(
        "SELECT {REPORT_COLUMNS} FROM telecaller_reports.reports WHERE row_pos = $1"
    );
    let row = sqlx::query(&query)
        .bind(row_pos)
        .fetch_optional(pool)
        .await
        .context("failed to read report row from the store")?;

    Ok(row.as_ref().map(report_row))
}

async fn insert_row(pool: &PgPool, input: &ReportInput, source_key: &str) -> anyhow::Result<i64> {
    let row_pos: i64 = sqlx::query(
        r#"
        INSERT INTO telecaller_reports.reports
        (date, telecaller, day, total_calls, new_data, crm_data, country_data,
         fair_data, video, video_details, other_work, visited_students, remarks, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING row_pos
        "#,
    )
    .bind(&input.date)
    .bind(&input.telecaller)
    .bind(&input.day)
    .bind(input.total_calls.to_string())
    .bind(input.new_data.to_string())
    .bind(input.crm_data.to_string())
    .bind(&input.country)
    .bind(input.fair_data.to_string())
    .bind(&input.video)
    .bind(&input.video_details)
    .bind(&input.other_work)
    .bind(input.visited_students.to_string())
    .bind(&input.remarks)
    .bind(source_key)
    .fetch_one(pool)
    .await
    .context("failed to append report row")?
    .get("row_pos");

    Ok(row_pos)
}

fn report_row(row: &PgRow) -> ReportRow {
    ReportRow {
        row_pos: row.get("row_pos"),
        date: row.get("date"),
        telecaller: row.get("telecaller"),
        day: row.get("day"),
        total_calls: row.get("total_calls"),
        new_data: row.get("new_data"),
        crm_data: row.get("crm_data"),
        country_data: row.get("country_data"),
        fair_data: row.get("fair_data"),
        video: row.get("video"),
        video_details: row.get("video_details"),
        other_work: row.get("other_work"),
        visited_students: row.get("visited_students"),
        remarks: row.get("remarks"),
    }
}
