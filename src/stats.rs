use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDate};

use crate::models::{
    DailyReport, DashboardStats, DaySummary, TelecallerPerformance, TrendPoint, VideoActivity,
};

/// Date window for dashboard aggregation, relative to the caller's `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Window {
    Today,
    Yesterday,
    #[value(name = "last-7-days")]
    Last7Days,
    #[value(name = "last-30-days")]
    Last30Days,
    AllTime,
}

impl Window {
    /// Trailing ranges are inclusive on both ends: `[today - (N-1), today]`.
    pub fn contains(self, date: NaiveDate, today: NaiveDate) -> bool {
        match self {
            Window::Today => date == today,
            Window::Yesterday => date == today - Duration::days(1),
            Window::Last7Days => date >= today - Duration::days(6) && date <= today,
            Window::Last30Days => date >= today - Duration::days(29) && date <= today,
            Window::AllTime => true,
        }
    }
}

/// Filters for the report listing. `search` is a free-text term; the rest
/// are exact filters. All are optional and combine with AND.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub telecaller: Option<String>,
    pub video: Option<bool>,
    pub search: Option<String>,
}

/// Aggregate totals and derived rates over one window of the snapshot.
pub fn dashboard_stats(reports: &[DailyReport], window: Window, today: NaiveDate) -> DashboardStats {
    let mut stats = DashboardStats::default();
    let mut days: HashSet<NaiveDate> = HashSet::new();

    for report in reports {
        let date = report.calendar_date();
        if !window.contains(date, today) {
            continue;
        }
        stats.total_calls += report.total_calls;
        stats.new_data += report.new_data;
        stats.crm_data += report.crm_data;
        stats.fair_data += report.fair_data;
        stats.visited_students += report.visited_students;
        if report.video {
            stats.video_activities += 1;
        }
        if !report.country.is_empty() {
            stats.country_data += 1;
        }
        days.insert(date);
    }

    // Averages divide by days that actually have data, not the window span.
    stats.total_days = days.len() as i64;
    if stats.total_days > 0 {
        stats.avg_calls_per_day = round1(stats.total_calls as f64 / stats.total_days as f64);
        stats.avg_new_data_per_day = round1(stats.new_data as f64 / stats.total_days as f64);
    }
    if stats.total_calls > 0 {
        stats.conversion_rate = round1(stats.new_data as f64 / stats.total_calls as f64 * 100.0);
        stats.crm_completion_rate =
            round1(stats.crm_data as f64 / stats.total_calls as f64 * 100.0);
    }

    stats
}

/// Activity feed over the trailing window: one entry per distinct date with
/// data, newest first, at most `days` entries. Days without records produce
/// no entry, unlike [`performance_trend`].
pub fn weekly_summary(reports: &[DailyReport], days: i64, today: NaiveDate) -> Vec<DaySummary> {
    let days = days.max(1);
    let by_day = totals_by_day(reports, days, today);

    let mut dates: Vec<NaiveDate> = by_day.keys().copied().collect();
    dates.sort_unstable_by(|a, b| b.cmp(a));

    dates
        .into_iter()
        .take(days as usize)
        .map(|date| {
            let totals = by_day[&date];
            DaySummary {
                date: date.format("%Y-%m-%d").to_string(),
                formatted_date: date.format("%a, %b %d").to_string(),
                total_calls: totals.0,
                new_data: totals.1,
                visited_students: totals.2,
            }
        })
        .collect()
}

/// Chart series over the trailing window: exactly `days` entries, one per
/// calendar day ending at `today`, gap days zero-filled. Kept deliberately
/// asymmetric with [`weekly_summary`].
pub fn performance_trend(reports: &[DailyReport], days: i64, today: NaiveDate) -> Vec<TrendPoint> {
    let days = days.max(1);
    let by_day = totals_by_day(reports, days, today);

    (0..days)
        .map(|offset| {
            let date = today - Duration::days(days - 1 - offset);
            let totals = by_day.get(&date).copied().unwrap_or((0, 0, 0));
            TrendPoint {
                date: date.format("%Y-%m-%d").to_string(),
                formatted_date: date.format("%b %d").to_string(),
                total_calls: totals.0,
                new_data: totals.1,
                visited_students: totals.2,
            }
        })
        .collect()
}

/// Listing of video-flagged reports in the trailing window, newest first,
/// capped at `limit`.
pub fn video_activities(
    reports: &[DailyReport],
    days: i64,
    limit: usize,
    today: NaiveDate,
) -> Vec<VideoActivity> {
    let window_start = today - Duration::days(days.max(1) - 1);

    let mut matches: Vec<&DailyReport> = reports
        .iter()
        .filter(|report| report.video)
        .filter(|report| {
            let date = report.calendar_date();
            date >= window_start && date <= today
        })
        .collect();
    matches.sort_by(|a, b| b.date.cmp(&a.date));

    matches
        .into_iter()
        .take(limit)
        .map(|report| VideoActivity {
            date: report.calendar_date().format("%Y-%m-%d").to_string(),
            formatted_date: report.calendar_date().format("%b %d, %Y").to_string(),
            telecaller: report.telecaller.clone(),
            video_details: report.video_details.clone(),
            other_work: report.other_work.clone(),
            total_calls: report.total_calls,
            new_data: report.new_data,
        })
        .collect()
}

/// Lead count per country, excluding rows with no country recorded.
/// Unordered; callers sort for display.
pub fn country_distribution(reports: &[DailyReport]) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for report in reports {
        if report.country.is_empty() {
            continue;
        }
        *counts.entry(report.country.clone()).or_insert(0) += 1;
    }
    counts
}

/// Per-telecaller totals across the whole snapshot, busiest first.
pub fn telecaller_performance(reports: &[DailyReport]) -> Vec<TelecallerPerformance> {
    let mut map: HashMap<String, (i64, i64, i64, i64)> = HashMap::new();

    for report in reports {
        if report.telecaller.is_empty() {
            continue;
        }
        let entry = map.entry(report.telecaller.clone()).or_insert((0, 0, 0, 0));
        entry.0 += report.total_calls;
        entry.1 += report.new_data;
        entry.2 += report.crm_data;
        if report.video {
            entry.3 += 1;
        }
    }

    let mut rows: Vec<TelecallerPerformance> = map
        .into_iter()
        .map(
            |(telecaller, (total_calls, new_data, crm_data, video_activities))| {
                TelecallerPerformance {
                    conversion_rate: if total_calls > 0 {
                        round1(new_data as f64 / total_calls as f64 * 100.0)
                    } else {
                        0.0
                    },
                    telecaller,
                    total_calls,
                    new_data,
                    crm_data,
                    video_activities,
                }
            },
        )
        .collect();

    rows.sort_by(|a, b| {
        b.total_calls
            .cmp(&a.total_calls)
            .then_with(|| a.telecaller.cmp(&b.telecaller))
    });
    rows
}

/// Report listing: apply the filter, newest first.
pub fn filter_reports<'a>(reports: &'a [DailyReport], filter: &ReportFilter) -> Vec<&'a DailyReport> {
    let mut matches: Vec<&DailyReport> = reports
        .iter()
        .filter(|report| {
            let date = report.calendar_date();
            if let Some(from) = filter.from {
                if date < from {
                    return false;
                }
            }
            if let Some(to) = filter.to {
                if date > to {
                    return false;
                }
            }
            if let Some(telecaller) = &filter.telecaller {
                if &report.telecaller != telecaller {
                    return false;
                }
            }
            if let Some(video) = filter.video {
                if report.video != video {
                    return false;
                }
            }
            if let Some(term) = &filter.search {
                if !matches_search(report, term) {
                    return false;
                }
            }
            true
        })
        .collect();
    matches.sort_by(|a, b| b.date.cmp(&a.date));
    matches
}

/// Case-insensitive substring match over the free-text fields. The field
/// set is fixed; counts and dates are never searched.
pub fn matches_search(report: &DailyReport, term: &str) -> bool {
    let term = term.to_lowercase();
    [
        &report.country,
        &report.other_work,
        &report.video_details,
        &report.remarks,
        &report.day,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&term))
}

fn totals_by_day(
    reports: &[DailyReport],
    days: i64,
    today: NaiveDate,
) -> HashMap<NaiveDate, (i64, i64, i64)> {
    let window_start = today - Duration::days(days - 1);
    let mut by_day: HashMap<NaiveDate, (i64, i64, i64)> = HashMap::new();

    for report in reports {
        let date = report.calendar_date();
        if date < window_start || date > today {
            continue;
        }
        let entry = by_day.entry(date).or_insert((0, 0, 0));
        entry.0 += report.total_calls;
        entry.1 += report.new_data;
        entry.2 += report.visited_students;
    }
    by_day
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    fn report_on(days_ago: i64, total_calls: i64, new_data: i64, crm_data: i64) -> DailyReport {
        DailyReport {
            row_pos: days_ago,
            date: (today() - Duration::days(days_ago)).and_time(NaiveTime::MIN),
            telecaller: "Priya".to_string(),
            day: "Monday".to_string(),
            total_calls,
            new_data,
            crm_data,
            country: String::new(),
            fair_data: 0,
            video: false,
            video_details: String::new(),
            other_work: String::new(),
            visited_students: 0,
            remarks: String::new(),
        }
    }

    #[test]
    fn today_window_only_counts_todays_records() {
        let mut fresh = report_on(0, 100, 20, 80);
        fresh.video = true;
        let stale = report_on(8, 50, 5, 10);

        let stats = dashboard_stats(&[fresh, stale], Window::Today, today());
        assert_eq!(stats.total_calls, 100);
        assert_eq!(stats.new_data, 20);
        assert_eq!(stats.crm_data, 80);
        assert_eq!(stats.video_activities, 1);
        assert_eq!(stats.conversion_rate, 20.0);
        assert_eq!(stats.crm_completion_rate, 80.0);
    }

    #[test]
    fn last_7_days_excludes_the_8_day_old_record() {
        let reports = vec![report_on(0, 100, 20, 80), report_on(8, 50, 5, 10)];

        let stats = dashboard_stats(&reports, Window::Last7Days, today());
        assert_eq!(stats.total_calls, 100);
        assert_eq!(stats.total_days, 1);
    }

    #[test]
    fn trailing_window_boundaries_are_inclusive() {
        let reports = vec![report_on(6, 10, 0, 0), report_on(7, 20, 0, 0)];
        let week = dashboard_stats(&reports, Window::Last7Days, today());
        assert_eq!(week.total_calls, 10);

        let reports = vec![report_on(29, 10, 0, 0), report_on(30, 20, 0, 0)];
        let month = dashboard_stats(&reports, Window::Last30Days, today());
        assert_eq!(month.total_calls, 10);
    }

    #[test]
    fn yesterday_window_is_exactly_one_day() {
        let reports = vec![
            report_on(0, 1, 0, 0),
            report_on(1, 2, 0, 0),
            report_on(2, 4, 0, 0),
        ];
        let stats = dashboard_stats(&reports, Window::Yesterday, today());
        assert_eq!(stats.total_calls, 2);
    }

    #[test]
    fn window_sums_are_exact_over_all_matching_records() {
        let reports: Vec<DailyReport> = (0..10).map(|i| report_on(i, 10 + i, i, 0)).collect();
        let stats = dashboard_stats(&reports, Window::AllTime, today());
        assert_eq!(
            stats.total_calls,
            reports.iter().map(|r| r.total_calls).sum::<i64>()
        );
        assert_eq!(stats.total_days, 10);
    }

    #[test]
    fn empty_snapshot_yields_all_zero_stats() {
        let stats = dashboard_stats(&[], Window::AllTime, today());
        assert_eq!(stats, DashboardStats::default());
    }

    #[test]
    fn rates_are_zero_when_no_calls_were_made() {
        let reports = vec![report_on(0, 0, 5, 3)];
        let stats = dashboard_stats(&reports, Window::Today, today());
        assert_eq!(stats.conversion_rate, 0.0);
        assert_eq!(stats.crm_completion_rate, 0.0);
        assert_eq!(stats.new_data, 5);
    }

    #[test]
    fn averages_divide_by_days_with_data_not_window_span() {
        // 7-day window with data on only 2 days.
        let reports = vec![report_on(0, 60, 0, 0), report_on(3, 40, 0, 0)];
        let stats = dashboard_stats(&reports, Window::Last7Days, today());
        assert_eq!(stats.total_days, 2);
        assert_eq!(stats.avg_calls_per_day, 50.0);
    }

    #[test]
    fn average_rounds_to_one_decimal() {
        let reports = vec![
            report_on(0, 50, 0, 0),
            report_on(1, 30, 0, 0),
            report_on(2, 20, 0, 0),
        ];
        let stats = dashboard_stats(&reports, Window::Last7Days, today());
        assert_eq!(stats.avg_calls_per_day, 33.3);
    }

    #[test]
    fn trend_is_dense_and_summary_is_sparse_on_the_same_input() {
        // Data on 2 of 7 days.
        let reports = vec![report_on(0, 60, 6, 0), report_on(3, 40, 4, 0)];

        let trend = performance_trend(&reports, 7, today());
        assert_eq!(trend.len(), 7);
        assert_eq!(trend.iter().filter(|p| p.total_calls > 0).count(), 2);
        // Newest day last.
        assert_eq!(trend[6].date, "2026-03-15");
        assert_eq!(trend[6].total_calls, 60);
        assert_eq!(trend[0].total_calls, 0);

        let summary = weekly_summary(&reports, 7, today());
        assert_eq!(summary.len(), 2);
        // Newest day first.
        assert_eq!(summary[0].date, "2026-03-15");
        assert_eq!(summary[1].date, "2026-03-12");
    }

    #[test]
    fn trend_on_empty_snapshot_is_all_zero_entries() {
        let trend = performance_trend(&[], 5, today());
        assert_eq!(trend.len(), 5);
        assert!(trend.iter().all(|p| p.total_calls == 0 && p.new_data == 0));

        assert!(weekly_summary(&[], 5, today()).is_empty());
    }

    #[test]
    fn summary_merges_multiple_records_on_one_day() {
        let reports = vec![report_on(1, 30, 3, 0), report_on(1, 20, 2, 0)];
        let summary = weekly_summary(&reports, 7, today());
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].total_calls, 50);
        assert_eq!(summary[0].new_data, 5);
    }

    #[test]
    fn formatted_dates_use_abbreviated_style() {
        let reports = vec![report_on(0, 10, 0, 0)];
        let summary = weekly_summary(&reports, 7, today());
        // 2026-03-15 is a Sunday.
        assert_eq!(summary[0].formatted_date, "Sun, Mar 15");

        let trend = performance_trend(&reports, 1, today());
        assert_eq!(trend[0].formatted_date, "Mar 15");
    }

    #[test]
    fn video_listing_respects_window_limit_and_order() {
        let mut reports = Vec::new();
        for days_ago in [0, 2, 5, 40] {
            let mut report = report_on(days_ago, 10, 1, 0);
            report.video = true;
            report.video_details = format!("clip {days_ago}");
            reports.push(report);
        }
        reports.push(report_on(1, 10, 1, 0)); // not video-flagged

        let listing = video_activities(&reports, 30, 2, today());
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].video_details, "clip 0");
        assert_eq!(listing[1].video_details, "clip 2");
        assert_eq!(listing[0].formatted_date, "Mar 15, 2026");

        // The 40-day-old clip is outside the window even with a bigger limit.
        let listing = video_activities(&reports, 30, 10, today());
        assert_eq!(listing.len(), 3);
    }

    #[test]
    fn country_distribution_ignores_missing_countries() {
        let countries = ["UK", "", "UK", "Other", ""];
        let reports: Vec<DailyReport> = countries
            .iter()
            .enumerate()
            .map(|(i, country)| {
                let mut report = report_on(i as i64, 1, 0, 0);
                report.country = country.to_string();
                report
            })
            .collect();

        let distribution = country_distribution(&reports);
        assert_eq!(distribution.len(), 2);
        assert_eq!(distribution["UK"], 2);
        assert_eq!(distribution["Other"], 1);
    }

    #[test]
    fn search_matches_substrings_case_insensitively() {
        let mut trained = report_on(0, 1, 0, 0);
        trained.other_work = "Trained volunteers".to_string();
        let mut staff = report_on(1, 1, 0, 0);
        staff.other_work = "Trained staff".to_string();

        assert!(matches_search(&trained, "volunteer"));
        assert!(!matches_search(&staff, "volunteer"));
        assert!(matches_search(&trained, "VOLUNTEER"));
    }

    #[test]
    fn search_covers_day_label_but_not_counts() {
        let report = report_on(0, 120, 0, 0);
        assert!(matches_search(&report, "mon"));
        assert!(!matches_search(&report, "120"));
    }

    #[test]
    fn filter_combines_criteria_and_sorts_newest_first() {
        let mut old = report_on(5, 1, 0, 0);
        old.remarks = "follow up".to_string();
        let mut new = report_on(1, 2, 0, 0);
        new.remarks = "follow up later".to_string();
        let other = report_on(0, 3, 0, 0);

        let reports = vec![old, new, other];
        let filter = ReportFilter {
            search: Some("follow".to_string()),
            ..ReportFilter::default()
        };
        let matches = filter_reports(&reports, &filter);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].total_calls, 2);
        assert_eq!(matches[1].total_calls, 1);

        let filter = ReportFilter {
            from: Some(today() - Duration::days(1)),
            to: Some(today() - Duration::days(1)),
            ..ReportFilter::default()
        };
        assert_eq!(filter_reports(&reports, &filter).len(), 1);
    }

    #[test]
    fn telecaller_performance_groups_and_sorts() {
        let mut a1 = report_on(0, 100, 20, 50);
        a1.video = true;
        let a2 = report_on(1, 50, 10, 25);
        let mut b = report_on(0, 200, 10, 80);
        b.telecaller = "Ravi".to_string();
        let mut unattributed = report_on(0, 999, 0, 0);
        unattributed.telecaller = String::new();

        let rows = telecaller_performance(&[a1, a2, b, unattributed]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].telecaller, "Ravi");
        assert_eq!(rows[0].conversion_rate, 5.0);
        assert_eq!(rows[1].telecaller, "Priya");
        assert_eq!(rows[1].total_calls, 150);
        assert_eq!(rows[1].new_data, 30);
        assert_eq!(rows[1].video_activities, 1);
        assert_eq!(rows[1].conversion_rate, 20.0);
    }

    #[test]
    fn aggregation_is_idempotent_on_a_snapshot() {
        let reports = vec![report_on(0, 100, 20, 80), report_on(3, 40, 4, 10)];

        assert_eq!(
            dashboard_stats(&reports, Window::Last7Days, today()),
            dashboard_stats(&reports, Window::Last7Days, today())
        );
        assert_eq!(
            performance_trend(&reports, 7, today()),
            performance_trend(&reports, 7, today())
        );
        assert_eq!(
            weekly_summary(&reports, 7, today()),
            weekly_summary(&reports, 7, today())
        );
    }

    #[test]
    fn stats_json_keeps_wire_field_names() {
        let stats = dashboard_stats(&[report_on(0, 100, 20, 80)], Window::Today, today());
        let value = serde_json::to_value(&stats).unwrap();
        for key in [
            "total_calls",
            "new_data",
            "crm_data",
            "fair_data",
            "visited_students",
            "video_activities",
            "conversion_rate",
            "crm_completion_rate",
            "avg_calls_per_day",
            "avg_new_data_per_day",
        ] {
            assert!(value.get(key).is_some(), "missing wire field {key}");
        }

        let trend = performance_trend(&[report_on(0, 1, 0, 0)], 1, today());
        let value = serde_json::to_value(&trend[0]).unwrap();
        assert!(value.get("date").is_some());
        assert!(value.get("formatted_date").is_some());
    }
}
