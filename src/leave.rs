use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::CoreError;
use crate::metrics;
use crate::models::{LeaveReceipt, LeaveRequest, LeaveStatus};
use crate::store::Store;

pub const MONTHLY_LEAVE_LIMIT: i64 = 4;
pub const ATTENDANCE_FLOOR: i64 = 75;

/// A leave application as it arrives from the outer layer, before any
/// validation has run.
#[derive(Debug, Clone, Default)]
pub struct LeaveApplication {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub reason: Option<String>,
    pub leave_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

/// The eligibility gate. Checks run in policy order: field presence, then
/// attendance floor, then the monthly quota, then the date range. Only a
/// request that clears all four is inserted, as pending.
pub async fn apply(
    store: &dyn Store,
    student_id: Uuid,
    application: LeaveApplication,
    today: NaiveDate,
) -> Result<LeaveReceipt, CoreError> {
    let mut missing = Vec::new();
    if application.from_date.is_none() {
        missing.push("from_date");
    }
    if application.to_date.is_none() {
        missing.push("to_date");
    }
    if application
        .reason
        .as_deref()
        .map_or(true, |r| r.trim().is_empty())
    {
        missing.push("reason");
    }
    if !missing.is_empty() {
        return Err(CoreError::MissingFields {
            fields: missing.join(", "),
        });
    }
    let (Some(from_date), Some(to_date), Some(reason)) = (
        application.from_date,
        application.to_date,
        application.reason,
    ) else {
        return Err(CoreError::MissingFields {
            fields: "from_date, to_date, reason".to_string(),
        });
    };

    let student = store
        .student(student_id)
        .await?
        .ok_or(CoreError::NotFound { entity: "student" })?;

    let percent = metrics::attendance_percent(store, student.id).await?;
    if percent < ATTENDANCE_FLOOR {
        return Err(CoreError::AttendanceTooLow {
            percent,
            floor: ATTENDANCE_FLOOR,
        });
    }

    let used = metrics::leaves_this_month(store, student.id, today).await?;
    if used >= MONTHLY_LEAVE_LIMIT {
        return Err(CoreError::MonthlyLimitExceeded {
            count: used,
            limit: MONTHLY_LEAVE_LIMIT,
        });
    }

    if from_date > to_date {
        return Err(CoreError::InvalidDateRange);
    }

    let request = LeaveRequest {
        id: Uuid::new_v4(),
        student_id: student.id,
        from_date,
        to_date,
        reason,
        leave_type: application
            .leave_type
            .unwrap_or_else(|| "personal".to_string()),
        status: LeaveStatus::Pending,
        mentor_note: None,
        applied_at: Utc::now(),
        reviewed_at: None,
    };
    let request_id = request.id;
    store.insert_leave_request(request).await?;

    Ok(LeaveReceipt {
        request_id,
        leaves_remaining: MONTHLY_LEAVE_LIMIT - (used + 1),
    })
}

/// Mentor verdict on a pending request. The request must belong to one of
/// the mentor's students and is decided at most once.
pub async fn decide(
    store: &dyn Store,
    mentor_id: Uuid,
    request_id: Uuid,
    decision: Decision,
    note: Option<String>,
    now: DateTime<Utc>,
) -> Result<LeaveRequest, CoreError> {
    let request = store.leave_request(request_id).await?.ok_or(CoreError::NotFound {
        entity: "leave request",
    })?;
    let student = store
        .student(request.student_id)
        .await?
        .ok_or(CoreError::NotFound { entity: "student" })?;
    if student.mentor_id != Some(mentor_id) {
        // Another mentor's mentee looks the same as a missing request.
        return Err(CoreError::NotFound {
            entity: "leave request",
        });
    }
    if request.status != LeaveStatus::Pending {
        return Err(CoreError::AlreadyDecided {
            status: request.status,
        });
    }

    let status = match decision {
        Decision::Approve => LeaveStatus::Approved,
        Decision::Reject => LeaveStatus::Rejected,
    };
    store
        .record_leave_decision(request_id, status, note.clone(), now)
        .await?;

    Ok(LeaveRequest {
        status,
        mentor_note: note,
        reviewed_at: Some(now),
        ..request
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttendanceStatus;
    use crate::store::mem::MemStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn application(from: NaiveDate, to: NaiveDate) -> LeaveApplication {
        LeaveApplication {
            from_date: Some(from),
            to_date: Some(to),
            reason: Some("family function".to_string()),
            leave_type: None,
        }
    }

    fn seed_attendance(store: &MemStore, student: Uuid, present: u32, absent: u32) {
        let mut day = date(2026, 1, 1);
        for i in 0..(present + absent) {
            let status = if i < present {
                AttendanceStatus::Present
            } else {
                AttendanceStatus::Absent
            };
            store.add_attendance(student, day, status);
            day = day.succ_opt().unwrap();
        }
    }

    #[tokio::test]
    async fn rejects_with_missing_field_names() {
        let store = MemStore::new();
        let student = store.add_student("Arjun Reddy", "22CS001", None);
        let today = date(2026, 2, 25);

        let incomplete = LeaveApplication {
            from_date: Some(date(2026, 2, 26)),
            ..LeaveApplication::default()
        };
        let err = apply(&store, student, incomplete, today).await.unwrap_err();
        match err {
            CoreError::MissingFields { fields } => assert_eq!(fields, "to_date, reason"),
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn low_attendance_fires_before_date_range() {
        let store = MemStore::new();
        let student = store.add_student("Rahul Banerjee", "22EC002", None);
        seed_attendance(&store, student, 25, 25); // 50%
        let today = date(2026, 2, 25);

        // from > to, yet the gate must report attendance first
        let err = apply(
            &store,
            student,
            application(date(2026, 3, 5), date(2026, 3, 1)),
            today,
        )
        .await
        .unwrap_err();
        match err {
            CoreError::AttendanceTooLow { percent, .. } => assert_eq!(percent, 50),
            other => panic!("expected AttendanceTooLow, got {other:?}"),
        }
        assert_eq!(err.code(), "ATTENDANCE_LOW");
    }

    #[tokio::test]
    async fn fifth_request_in_a_month_is_rejected_even_when_all_pending() {
        let store = MemStore::new();
        let student = store.add_student("Priya Patel", "22CS002", None);
        let today = date(2026, 2, 25);

        for day in 1..=4 {
            store.add_leave(
                student,
                date(2026, 2, day),
                date(2026, 2, day),
                LeaveStatus::Pending,
            );
        }

        let err = apply(
            &store,
            student,
            application(date(2026, 2, 26), date(2026, 2, 27)),
            today,
        )
        .await
        .unwrap_err();
        match err {
            CoreError::MonthlyLimitExceeded { count, limit } => {
                assert_eq!(count, 4);
                assert_eq!(limit, MONTHLY_LEAVE_LIMIT);
            }
            other => panic!("expected MonthlyLimitExceeded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn bad_date_range_is_rejected_for_eligible_students() {
        let store = MemStore::new();
        let student = store.add_student("Arjun Reddy", "22CS001", None);
        let today = date(2026, 2, 25);

        let err = apply(
            &store,
            student,
            application(date(2026, 3, 5), date(2026, 3, 1)),
            today,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidDateRange));
    }

    #[tokio::test]
    async fn accepted_request_is_pending_with_quota_hint() {
        let store = MemStore::new();
        let student = store.add_student("Arjun Reddy", "22CS001", None);
        let today = date(2026, 2, 25);
        store.add_leave(student, date(2026, 2, 3), date(2026, 2, 3), LeaveStatus::Approved);

        let receipt = apply(
            &store,
            student,
            application(date(2026, 2, 26), date(2026, 2, 27)),
            today,
        )
        .await
        .unwrap();
        assert_eq!(receipt.leaves_remaining, 2);

        let leaves = store.leaves_snapshot();
        let inserted = leaves.iter().find(|l| l.id == receipt.request_id).unwrap();
        assert_eq!(inserted.status, LeaveStatus::Pending);
        assert_eq!(inserted.leave_type, "personal");
    }

    #[tokio::test]
    async fn unknown_student_is_not_found() {
        let store = MemStore::new();
        let today = date(2026, 2, 25);
        let err = apply(
            &store,
            Uuid::new_v4(),
            application(date(2026, 2, 26), date(2026, 2, 27)),
            today,
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn decision_is_terminal() {
        let store = MemStore::new();
        let mentor = store.add_mentor("Dr. Ramesh Kumar");
        let student = store.add_student("Sneha Verma", "22CS003", Some(mentor));
        let request = store.add_leave(
            student,
            date(2026, 2, 26),
            date(2026, 2, 27),
            LeaveStatus::Pending,
        );

        let decided = decide(
            &store,
            mentor,
            request,
            Decision::Approve,
            Some("get well soon".to_string()),
            Utc::now(),
        )
        .await
        .unwrap();
        assert_eq!(decided.status, LeaveStatus::Approved);
        assert!(decided.reviewed_at.is_some());

        let err = decide(&store, mentor, request, Decision::Reject, None, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::AlreadyDecided {
                status: LeaveStatus::Approved
            }
        ));
    }

    #[tokio::test]
    async fn mentors_cannot_decide_for_other_mentees() {
        let store = MemStore::new();
        let mentor = store.add_mentor("Dr. Ramesh Kumar");
        let other = store.add_mentor("Prof. Anitha Sharma");
        let student = store.add_student("Kiran Naidu", "22EC001", Some(mentor));
        let request = store.add_leave(
            student,
            date(2026, 2, 26),
            date(2026, 2, 26),
            LeaveStatus::Pending,
        );

        let err = decide(&store, other, request, Decision::Approve, None, Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }
}
