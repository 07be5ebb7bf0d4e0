use chrono::{Datelike, Duration, Months, NaiveDate};
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{AttendanceStatus, LeaveRequest};
use crate::store::Store;

/// Attendance percentage over the student's full history. No history means
/// 100: new students start unpenalized. Days on approved leave count the
/// same as present days.
pub async fn attendance_percent(store: &dyn Store, student_id: Uuid) -> Result<i64, CoreError> {
    let statuses = store.attendance_statuses(student_id).await?;
    if statuses.is_empty() {
        return Ok(100);
    }
    let counted = statuses
        .iter()
        .filter(|s| matches!(s, AttendanceStatus::Present | AttendanceStatus::Leave))
        .count();
    Ok(percent_of(counted, statuses.len()))
}

fn percent_of(part: usize, total: usize) -> i64 {
    ((part as f64 / total as f64) * 100.0).round() as i64
}

/// Pending or approved requests whose from_date falls inside today's
/// calendar month. A request starting in a prior month is never counted
/// here, even when it spans into this one.
pub async fn leaves_this_month(
    store: &dyn Store,
    student_id: Uuid,
    today: NaiveDate,
) -> Result<i64, CoreError> {
    let (start, end) = month_bounds(today);
    Ok(store
        .countable_leaves_between(student_id, start, end)
        .await?)
}

pub fn month_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today.with_day(1).unwrap_or(today);
    (start, start + Months::new(1))
}

pub async fn approved_leaves_in_window(
    store: &dyn Store,
    student_id: Uuid,
    today: NaiveDate,
    window_days: i64,
) -> Result<Vec<LeaveRequest>, CoreError> {
    let since = today - Duration::days(window_days);
    Ok(store.approved_leaves_since(student_id, since).await?)
}
