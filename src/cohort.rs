use chrono::{NaiveDate, Utc};

use crate::error::CoreError;
use crate::metrics;
use crate::models::{CohortReport, RiskLabel, StudentRisk};
use crate::risk;
use crate::store::Store;

pub fn recommendation(score: i64) -> &'static str {
    if score >= 40 {
        "Frequent absences detected; counselling recommended."
    } else {
        "Attendance and leave pattern within acceptable range."
    }
}

/// Scores every student and buckets the cohort by risk label. The student
/// list comes back sorted descending by score; the sort is stable, so equal
/// scores keep the store's iteration order.
pub async fn analyze(store: &dyn Store, today: NaiveDate) -> Result<CohortReport, CoreError> {
    let students = store.students().await?;
    let mut rows = Vec::with_capacity(students.len());

    for student in &students {
        let attendance = metrics::attendance_percent(store, student.id).await?;
        let recent =
            metrics::approved_leaves_in_window(store, student.id, today, risk::RECENT_LEAVE_WINDOW_DAYS)
                .await?;
        let monthly = metrics::leaves_this_month(store, student.id, today).await?;
        let score = risk::risk_score(attendance, recent.len() as i64);

        rows.push(StudentRisk {
            student_id: student.id,
            full_name: student.full_name.clone(),
            roll_number: student.roll_number.clone(),
            branch: student.branch.clone(),
            semester: student.semester,
            attendance_percent: attendance,
            leaves_last_60_days: recent.len() as i64,
            leaves_this_month: monthly,
            risk_score: score,
            risk_label: risk::risk_label(score),
            prediction: recommendation(score).to_string(),
        });
    }

    rows.sort_by(|a, b| b.risk_score.cmp(&a.risk_score));

    let bucket = |label: RiskLabel| rows.iter().filter(|r| r.risk_label == label).count();
    Ok(CohortReport {
        analyzed_at: Utc::now(),
        total_students: rows.len(),
        critical: bucket(RiskLabel::Critical),
        at_risk: bucket(RiskLabel::AtRisk),
        monitor: bucket(RiskLabel::Monitor),
        safe: bucket(RiskLabel::Safe),
        students: rows,
    })
}
