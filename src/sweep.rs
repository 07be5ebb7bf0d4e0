use chrono::{NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{CoreError, StoreError};
use crate::models::AbsenceAlert;
use crate::store::Store;

pub const ALERT_UNINFORMED: &str = "uninformed";

/// Daily batch over today's absentees. The scheduler owns the "when"; this
/// is the "what". A student whose absence is covered by an approved leave is
/// excused; everyone else gets one uninformed alert per day at most, so the
/// sweep can be re-run safely. A failure on one student is logged and does
/// not stop the rest of the batch.
pub async fn run_daily_absence_sweep(
    store: &dyn Store,
    today: NaiveDate,
) -> Result<u32, CoreError> {
    let absent = store.absent_students_on(today).await?;
    let mut created = 0u32;
    for student_id in absent {
        match sweep_student(store, student_id, today).await {
            Ok(true) => created += 1,
            Ok(false) => {}
            Err(err) => {
                warn!(student = %student_id, date = %today, error = %err, "absence sweep: skipping student");
            }
        }
    }
    info!(date = %today, created, "absence sweep finished");
    Ok(created)
}

async fn sweep_student(
    store: &dyn Store,
    student_id: Uuid,
    today: NaiveDate,
) -> Result<bool, StoreError> {
    if store.approved_leave_covers(student_id, today).await? {
        return Ok(false);
    }
    if store.alert_exists(student_id, today).await? {
        return Ok(false);
    }
    // The store-level uniqueness on (student, date) makes a concurrent
    // duplicate insert a no-op rather than a second row.
    store
        .insert_alert_if_new(AbsenceAlert {
            id: Uuid::new_v4(),
            student_id,
            date: today,
            alert_type: ALERT_UNINFORMED.to_string(),
            resolved: false,
            created_at: Utc::now(),
        })
        .await
}
