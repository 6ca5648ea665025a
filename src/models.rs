use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// One row of the report table exactly as the store holds it: every data
/// column is a string. The sheet this schema was migrated from never typed
/// its columns, so typing is the normalizer's job.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub row_pos: i64,
    pub date: String,
    pub telecaller: String,
    pub day: String,
    pub total_calls: String,
    pub new_data: String,
    pub crm_data: String,
    pub country_data: String,
    pub fair_data: String,
    pub video: String,
    pub video_details: String,
    pub other_work: String,
    pub visited_students: String,
    pub remarks: String,
}

/// Fields for appending or overwriting a report row.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportInput {
    pub date: String,
    pub telecaller: String,
    pub day: String,
    pub total_calls: i64,
    pub new_data: i64,
    pub crm_data: i64,
    pub country: String,
    pub fair_data: i64,
    pub video: String,
    pub video_details: String,
    pub other_work: String,
    pub visited_students: i64,
    pub remarks: String,
}

/// A normalized daily report. Only the normalizer constructs these, so the
/// aggregation code can rely on the counts being non-negative and the date
/// being real.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyReport {
    pub row_pos: i64,
    pub date: NaiveDateTime,
    pub telecaller: String,
    /// Free-text day label as entered; may disagree with `date` and is
    /// never used for window filtering.
    pub day: String,
    pub total_calls: i64,
    pub new_data: i64,
    pub crm_data: i64,
    pub country: String,
    pub fair_data: i64,
    pub video: bool,
    pub video_details: String,
    pub other_work: String,
    pub visited_students: i64,
    pub remarks: String,
}

impl DailyReport {
    pub fn calendar_date(&self) -> NaiveDate {
        self.date.date()
    }
}

/// Aggregate totals and derived rates for one date window. Field names are
/// the wire contract consumed by dashboard widgets; renaming any of them
/// breaks JSON clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_calls: i64,
    pub new_data: i64,
    pub crm_data: i64,
    pub country_data: i64,
    pub fair_data: i64,
    pub visited_students: i64,
    pub video_activities: i64,
    pub total_days: i64,
    pub avg_calls_per_day: f64,
    pub avg_new_data_per_day: f64,
    pub conversion_rate: f64,
    pub crm_completion_rate: f64,
}

/// One populated day in the recent-activity feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: String,
    pub formatted_date: String,
    pub total_calls: i64,
    pub new_data: i64,
    pub visited_students: i64,
}

/// One calendar day in a trend series; gap days carry explicit zeroes so
/// charts stay continuous.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: String,
    pub formatted_date: String,
    pub total_calls: i64,
    pub new_data: i64,
    pub visited_students: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoActivity {
    pub date: String,
    pub formatted_date: String,
    pub telecaller: String,
    pub video_details: String,
    pub other_work: String,
    pub total_calls: i64,
    pub new_data: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelecallerPerformance {
    pub telecaller: String,
    pub total_calls: i64,
    pub new_data: i64,
    pub crm_data: i64,
    pub video_activities: i64,
    pub conversion_rate: f64,
}

/// One entry in the mutation audit trail.
#[derive(Debug, Clone, Serialize)]
pub struct EditLog {
    pub logged_at: NaiveDateTime,
    pub action: String,
    pub report_date: String,
    pub telecaller: String,
    pub original_data: String,
    pub new_data: String,
}
