use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::models::{DailyReport, ReportRow};

/// Result of normalizing a raw snapshot. Rows that fail validation are
/// dropped and counted here instead of failing the whole query.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub reports: Vec<DailyReport>,
    pub bad_dates: usize,
    pub negative_counts: usize,
}

impl NormalizedBatch {
    pub fn skipped(&self) -> usize {
        self.bad_dates + self.negative_counts
    }
}

/// Parse raw store rows into typed reports, preserving source order.
///
/// Rows with an unparseable date or a negative count are dropped; malformed
/// or missing counts coerce to 0. Never returns an error.
pub fn normalize(rows: &[ReportRow]) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for row in rows {
        let Some(date) = parse_report_date(&row.date) else {
            batch.bad_dates += 1;
            tracing::warn!(row = row.row_pos, raw = %row.date, "skipping row: unparseable date");
            continue;
        };

        let raw_counts = [
            &row.total_calls,
            &row.new_data,
            &row.crm_data,
            &row.fair_data,
            &row.visited_students,
        ];
        let mut counts = [0i64; 5];
        let mut negative = false;
        for (slot, raw) in counts.iter_mut().zip(raw_counts) {
            match parse_count(raw) {
                Some(value) => *slot = value,
                None => {
                    negative = true;
                    break;
                }
            }
        }
        if negative {
            batch.negative_counts += 1;
            tracing::warn!(row = row.row_pos, "skipping row: negative count");
            continue;
        }
        let [total_calls, new_data, crm_data, fair_data, visited_students] = counts;

        batch.reports.push(DailyReport {
            row_pos: row.row_pos,
            date,
            telecaller: row.telecaller.trim().to_string(),
            day: row.day.clone(),
            total_calls,
            new_data,
            crm_data,
            country: row.country_data.trim().to_string(),
            fair_data,
            video: row.video.trim() == "Yes",
            video_details: row.video_details.clone(),
            other_work: row.other_work.clone(),
            visited_students,
            remarks: row.remarks.clone(),
        });
    }

    batch
}

/// Accepts `DD/MM/YYYY HH:MM:SS` or the date-only `DD/MM/YYYY` (midnight).
fn parse_report_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, "%d/%m/%Y %H:%M:%S") {
        return Some(datetime);
    }
    NaiveDate::parse_from_str(raw, "%d/%m/%Y")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

/// Malformed or empty input coerces to 0; a parsed negative is `None`,
/// which rejects the whole row.
fn parse_count(raw: &str) -> Option<i64> {
    match raw.trim().parse::<i64>() {
        Ok(value) if value < 0 => None,
        Ok(value) => Some(value),
        Err(_) => Some(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_row(date: &str) -> ReportRow {
        ReportRow {
            row_pos: 1,
            date: date.to_string(),
            telecaller: "Priya".to_string(),
            day: "Monday".to_string(),
            total_calls: "120".to_string(),
            new_data: "15".to_string(),
            crm_data: "90".to_string(),
            country_data: "UK".to_string(),
            fair_data: "4".to_string(),
            video: "Yes".to_string(),
            video_details: "Campus tour reel".to_string(),
            other_work: "".to_string(),
            visited_students: "2".to_string(),
            remarks: "".to_string(),
        }
    }

    #[test]
    fn parses_datetime_and_date_only_forms() {
        let rows = vec![raw_row("15/01/2026 09:30:00"), raw_row("16/01/2026")];
        let batch = normalize(&rows);

        assert_eq!(batch.reports.len(), 2);
        assert_eq!(batch.skipped(), 0);
        assert_eq!(
            batch.reports[0].date,
            NaiveDate::from_ymd_opt(2026, 1, 15)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap()
        );
        assert_eq!(
            batch.reports[1].date,
            NaiveDate::from_ymd_opt(2026, 1, 16)
                .unwrap()
                .and_time(NaiveTime::MIN)
        );
    }

    #[test]
    fn drops_rows_with_unparseable_dates() {
        let rows = vec![
            raw_row("15/01/2026 09:30:00"),
            raw_row("not a date"),
            raw_row(""),
        ];
        let batch = normalize(&rows);

        assert_eq!(batch.reports.len(), 1);
        assert_eq!(batch.bad_dates, 2);
    }

    #[test]
    fn malformed_counts_coerce_to_zero() {
        let mut row = raw_row("15/01/2026");
        row.total_calls = "lots".to_string();
        row.new_data = "".to_string();
        row.fair_data = " 7 ".to_string();

        let batch = normalize(&[row]);
        let report = &batch.reports[0];
        assert_eq!(report.total_calls, 0);
        assert_eq!(report.new_data, 0);
        assert_eq!(report.fair_data, 7);
        assert_eq!(batch.skipped(), 0);
    }

    #[test]
    fn negative_counts_reject_the_row() {
        let mut row = raw_row("15/01/2026");
        row.crm_data = "-3".to_string();

        let batch = normalize(&[row]);
        assert!(batch.reports.is_empty());
        assert_eq!(batch.negative_counts, 1);
    }

    #[test]
    fn video_flag_is_yes_or_nothing() {
        let mut yes = raw_row("15/01/2026");
        yes.video = " Yes ".to_string();
        let mut no = raw_row("15/01/2026");
        no.video = "No".to_string();
        let mut garbage = raw_row("15/01/2026");
        garbage.video = "maybe".to_string();

        let batch = normalize(&[yes, no, garbage]);
        assert_eq!(
            batch.reports.iter().map(|r| r.video).collect::<Vec<_>>(),
            vec![true, false, false]
        );
    }

    #[test]
    fn preserves_source_order() {
        let mut first = raw_row("15/01/2026");
        first.row_pos = 10;
        let mut second = raw_row("14/01/2026");
        second.row_pos = 11;

        let batch = normalize(&[first, second]);
        assert_eq!(batch.reports[0].row_pos, 10);
        assert_eq!(batch.reports[1].row_pos, 11);
    }

    #[test]
    fn day_label_propagates_even_when_it_disagrees() {
        // 15/01/2026 is a Thursday; the label is kept as entered.
        let mut row = raw_row("15/01/2026");
        row.day = "Monday".to_string();

        let batch = normalize(&[row]);
        assert_eq!(batch.reports[0].day, "Monday");
    }
}
