use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::DailyReport;
use crate::stats::{self, Window};

/// Render the full dashboard as markdown: window stats, recent activity,
/// trend table, country mix, per-telecaller totals, video listing.
pub fn build_report(
    telecaller: Option<&str>,
    trend_days: i64,
    today: NaiveDate,
    reports: &[DailyReport],
    skipped_rows: usize,
) -> String {
    let scoped: Vec<DailyReport> = match telecaller {
        Some(name) => reports
            .iter()
            .filter(|report| report.telecaller == name)
            .cloned()
            .collect(),
        None => reports.to_vec(),
    };

    let mut output = String::new();
    let scope_label = telecaller.unwrap_or("all telecallers");

    let _ = writeln!(output, "# Telecaller Daily Report Dashboard");
    let _ = writeln!(output, "Generated for {} on {}", scope_label, today);
    if skipped_rows > 0 {
        let _ = writeln!(output, "({skipped_rows} malformed rows excluded)");
    }

    for (title, window) in [
        ("Today", Window::Today),
        ("Last 7 Days", Window::Last7Days),
        ("All Time", Window::AllTime),
    ] {
        let window_stats = stats::dashboard_stats(&scoped, window, today);
        let _ = writeln!(output);
        let _ = writeln!(output, "## {title}");
        if window_stats.total_days == 0 {
            let _ = writeln!(output, "No reports recorded for this window.");
            continue;
        }
        let _ = writeln!(output, "- Total calls: {}", window_stats.total_calls);
        let _ = writeln!(
            output,
            "- New data: {} (conversion {:.1}%)",
            window_stats.new_data, window_stats.conversion_rate
        );
        let _ = writeln!(
            output,
            "- CRM updates: {} (completion {:.1}%)",
            window_stats.crm_data, window_stats.crm_completion_rate
        );
        let _ = writeln!(output, "- Fair leads: {}", window_stats.fair_data);
        let _ = writeln!(
            output,
            "- Visited students: {}",
            window_stats.visited_students
        );
        let _ = writeln!(
            output,
            "- Video activities: {}",
            window_stats.video_activities
        );
        let _ = writeln!(
            output,
            "- Days with data: {} (avg {:.1} calls/day)",
            window_stats.total_days, window_stats.avg_calls_per_day
        );
    }

    let summary = stats::weekly_summary(&scoped, 7, today);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Activity");
    if summary.is_empty() {
        let _ = writeln!(output, "No reports in the last 7 days.");
    } else {
        for day in &summary {
            let _ = writeln!(
                output,
                "- {}: {} calls, {} new data, {} students visited",
                day.formatted_date, day.total_calls, day.new_data, day.visited_students
            );
        }
    }

    let trend = stats::performance_trend(&scoped, trend_days, today);
    let _ = writeln!(output);
    let _ = writeln!(output, "## {trend_days}-Day Trend");
    for point in &trend {
        let _ = writeln!(
            output,
            "- {}: {} calls, {} new data",
            point.formatted_date, point.total_calls, point.new_data
        );
    }

    let mut countries: Vec<(String, usize)> =
        stats::country_distribution(&scoped).into_iter().collect();
    countries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Country Mix");
    if countries.is_empty() {
        let _ = writeln!(output, "No countries recorded.");
    } else {
        for (country, count) in &countries {
            let _ = writeln!(output, "- {country}: {count} leads");
        }
    }

    let performance = stats::telecaller_performance(&scoped);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Telecaller Performance");
    if performance.is_empty() {
        let _ = writeln!(output, "No attributed reports.");
    } else {
        for row in &performance {
            let _ = writeln!(
                output,
                "- {}: {} calls, {} new data (conversion {:.1}%), {} CRM updates, {} video activities",
                row.telecaller,
                row.total_calls,
                row.new_data,
                row.conversion_rate,
                row.crm_data,
                row.video_activities
            );
        }
    }

    let videos = stats::video_activities(&scoped, 30, 5, today);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Video Activities");
    if videos.is_empty() {
        let _ = writeln!(output, "No video activities in the last 30 days.");
    } else {
        for video in &videos {
            let detail = if video.video_details.is_empty() {
                "no details"
            } else {
                video.video_details.as_str()
            };
            let _ = writeln!(
                output,
                "- {} ({}): {}",
                video.formatted_date, video.telecaller, detail
            );
        }
    }

    output
}
