use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    AbsenceAlert, AttendanceStatus, LeaveRequest, LeaveStatus, Mentor, OpenAlert, Overview,
    ReviewableLeave, Student,
};

pub mod pg;

#[cfg(test)]
pub mod mem;

/// Read/write primitives over the four core tables. Every mutation is a
/// single statement; conditional inserts report whether a row was written so
/// callers can stay idempotent.
#[async_trait]
pub trait Store: Send + Sync {
    async fn students(&self) -> Result<Vec<Student>, StoreError>;
    async fn student(&self, id: Uuid) -> Result<Option<Student>, StoreError>;
    async fn student_by_roll(&self, roll_number: &str) -> Result<Option<Student>, StoreError>;
    async fn students_of_mentor(&self, mentor_id: Uuid) -> Result<Vec<Student>, StoreError>;
    async fn mentor(&self, id: Uuid) -> Result<Option<Mentor>, StoreError>;

    async fn attendance_statuses(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<AttendanceStatus>, StoreError>;
    /// Returns false when an attendance record already exists for the day.
    async fn upsert_attendance(
        &self,
        student_id: Uuid,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<bool, StoreError>;
    async fn absent_students_on(&self, date: NaiveDate) -> Result<Vec<Uuid>, StoreError>;

    async fn insert_leave_request(&self, request: LeaveRequest) -> Result<(), StoreError>;
    async fn leave_request(&self, id: Uuid) -> Result<Option<LeaveRequest>, StoreError>;
    async fn leave_history(&self, student_id: Uuid) -> Result<Vec<LeaveRequest>, StoreError>;
    /// Pending or approved requests whose from_date falls in [start, end).
    async fn countable_leaves_between(
        &self,
        student_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64, StoreError>;
    async fn approved_leaves_since(
        &self,
        student_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<LeaveRequest>, StoreError>;
    async fn approved_leave_covers(
        &self,
        student_id: Uuid,
        date: NaiveDate,
    ) -> Result<bool, StoreError>;
    async fn leaves_for_mentor(
        &self,
        mentor_id: Uuid,
        only_pending: bool,
    ) -> Result<Vec<ReviewableLeave>, StoreError>;
    async fn record_leave_decision(
        &self,
        request_id: Uuid,
        status: LeaveStatus,
        note: Option<String>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Returns false when an alert already exists for (student, date).
    async fn insert_alert_if_new(&self, alert: AbsenceAlert) -> Result<bool, StoreError>;
    async fn alert_exists(&self, student_id: Uuid, date: NaiveDate) -> Result<bool, StoreError>;
    async fn alert(&self, id: Uuid) -> Result<Option<AbsenceAlert>, StoreError>;
    async fn open_alerts_for_mentor(&self, mentor_id: Uuid) -> Result<Vec<OpenAlert>, StoreError>;
    /// Returns false when the alert does not exist or was already resolved.
    async fn mark_alert_resolved(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn overview(&self) -> Result<Overview, StoreError>;
}
