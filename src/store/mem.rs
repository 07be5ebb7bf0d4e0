use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    AbsenceAlert, AttendanceStatus, LeaveRequest, LeaveStatus, Mentor, OpenAlert, Overview,
    ReviewableLeave, Student,
};
use crate::store::Store;

/// In-memory stand-in for the relational store. Insertion order is the
/// iteration order, which keeps the cohort sort's tie-break deterministic in
/// tests.
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<MemInner>,
}

#[derive(Default)]
struct MemInner {
    mentors: Vec<Mentor>,
    students: Vec<Student>,
    attendance: Vec<(Uuid, NaiveDate, AttendanceStatus)>,
    leaves: Vec<LeaveRequest>,
    alerts: Vec<AbsenceAlert>,
    broken_students: HashSet<Uuid>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mentor(&self, full_name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.inner.lock().unwrap().mentors.push(Mentor {
            id,
            full_name: full_name.to_string(),
            department: "CSE".to_string(),
            email: format!("{}@college.edu", id.simple()),
        });
        id
    }

    pub fn add_student(&self, full_name: &str, roll_number: &str, mentor_id: Option<Uuid>) -> Uuid {
        let id = Uuid::new_v4();
        self.inner.lock().unwrap().students.push(Student {
            id,
            full_name: full_name.to_string(),
            roll_number: roll_number.to_string(),
            branch: "CSE".to_string(),
            semester: 4,
            mentor_id,
            parent_name: format!("Parent of {full_name}"),
            parent_phone: "+91-9000000000".to_string(),
        });
        id
    }

    pub fn add_attendance(&self, student_id: Uuid, date: NaiveDate, status: AttendanceStatus) {
        self.inner
            .lock()
            .unwrap()
            .attendance
            .push((student_id, date, status));
    }

    pub fn add_leave(
        &self,
        student_id: Uuid,
        from_date: NaiveDate,
        to_date: NaiveDate,
        status: LeaveStatus,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.inner.lock().unwrap().leaves.push(LeaveRequest {
            id,
            student_id,
            from_date,
            to_date,
            reason: "seeded".to_string(),
            leave_type: "personal".to_string(),
            status,
            mentor_note: None,
            applied_at: Utc::now(),
            reviewed_at: None,
        });
        id
    }

    /// Makes every leave-coverage lookup for this student fail, for testing
    /// the sweep's per-student resilience.
    pub fn break_student(&self, student_id: Uuid) {
        self.inner
            .lock()
            .unwrap()
            .broken_students
            .insert(student_id);
    }

    pub fn leaves_snapshot(&self) -> Vec<LeaveRequest> {
        self.inner.lock().unwrap().leaves.clone()
    }

    pub fn alerts_snapshot(&self) -> Vec<AbsenceAlert> {
        self.inner.lock().unwrap().alerts.clone()
    }
}

#[async_trait]
impl Store for MemStore {
    async fn students(&self) -> Result<Vec<Student>, StoreError> {
        Ok(self.inner.lock().unwrap().students.clone())
    }

    async fn student(&self, id: Uuid) -> Result<Option<Student>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .students
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn student_by_roll(&self, roll_number: &str) -> Result<Option<Student>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .students
            .iter()
            .find(|s| s.roll_number == roll_number)
            .cloned())
    }

    async fn students_of_mentor(&self, mentor_id: Uuid) -> Result<Vec<Student>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .students
            .iter()
            .filter(|s| s.mentor_id == Some(mentor_id))
            .cloned()
            .collect())
    }

    async fn mentor(&self, id: Uuid) -> Result<Option<Mentor>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .mentors
            .iter()
            .find(|m| m.id == id)
            .cloned())
    }

    async fn attendance_statuses(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<AttendanceStatus>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .attendance
            .iter()
            .filter(|(id, _, _)| *id == student_id)
            .map(|(_, _, status)| *status)
            .collect())
    }

    async fn upsert_attendance(
        &self,
        student_id: Uuid,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .attendance
            .iter()
            .any(|(id, d, _)| *id == student_id && *d == date)
        {
            return Ok(false);
        }
        inner.attendance.push((student_id, date, status));
        Ok(true)
    }

    async fn absent_students_on(&self, date: NaiveDate) -> Result<Vec<Uuid>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .attendance
            .iter()
            .filter(|(_, d, status)| *d == date && *status == AttendanceStatus::Absent)
            .map(|(id, _, _)| *id)
            .collect())
    }

    async fn insert_leave_request(&self, request: LeaveRequest) -> Result<(), StoreError> {
        self.inner.lock().unwrap().leaves.push(request);
        Ok(())
    }

    async fn leave_request(&self, id: Uuid) -> Result<Option<LeaveRequest>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .leaves
            .iter()
            .find(|l| l.id == id)
            .cloned())
    }

    async fn leave_history(&self, student_id: Uuid) -> Result<Vec<LeaveRequest>, StoreError> {
        let mut history: Vec<LeaveRequest> = self
            .inner
            .lock()
            .unwrap()
            .leaves
            .iter()
            .filter(|l| l.student_id == student_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
        Ok(history)
    }

    async fn countable_leaves_between(
        &self,
        student_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .leaves
            .iter()
            .filter(|l| {
                l.student_id == student_id
                    && l.from_date >= start
                    && l.from_date < end
                    && matches!(l.status, LeaveStatus::Pending | LeaveStatus::Approved)
            })
            .count() as i64)
    }

    async fn approved_leaves_since(
        &self,
        student_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .leaves
            .iter()
            .filter(|l| {
                l.student_id == student_id
                    && l.status == LeaveStatus::Approved
                    && l.from_date >= since
            })
            .cloned()
            .collect())
    }

    async fn approved_leave_covers(
        &self,
        student_id: Uuid,
        date: NaiveDate,
    ) -> Result<bool, StoreError> {
        let inner = self.inner.lock().unwrap();
        if inner.broken_students.contains(&student_id) {
            return Err(StoreError::Decode("injected store failure".to_string()));
        }
        Ok(inner.leaves.iter().any(|l| {
            l.student_id == student_id
                && l.status == LeaveStatus::Approved
                && l.from_date <= date
                && l.to_date >= date
        }))
    }

    async fn leaves_for_mentor(
        &self,
        mentor_id: Uuid,
        only_pending: bool,
    ) -> Result<Vec<ReviewableLeave>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut leaves: Vec<ReviewableLeave> = inner
            .leaves
            .iter()
            .filter_map(|l| {
                let student = inner
                    .students
                    .iter()
                    .find(|s| s.id == l.student_id && s.mentor_id == Some(mentor_id))?;
                if only_pending && l.status != LeaveStatus::Pending {
                    return None;
                }
                Some(ReviewableLeave {
                    request: l.clone(),
                    student_name: student.full_name.clone(),
                    roll_number: student.roll_number.clone(),
                    branch: student.branch.clone(),
                })
            })
            .collect();
        leaves.sort_by(|a, b| b.request.applied_at.cmp(&a.request.applied_at));
        Ok(leaves)
    }

    async fn record_leave_decision(
        &self,
        request_id: Uuid,
        status: LeaveStatus,
        note: Option<String>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(leave) = inner.leaves.iter_mut().find(|l| l.id == request_id) {
            leave.status = status;
            leave.mentor_note = note;
            leave.reviewed_at = Some(reviewed_at);
        }
        Ok(())
    }

    async fn insert_alert_if_new(&self, alert: AbsenceAlert) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .alerts
            .iter()
            .any(|a| a.student_id == alert.student_id && a.date == alert.date)
        {
            return Ok(false);
        }
        inner.alerts.push(alert);
        Ok(true)
    }

    async fn alert_exists(&self, student_id: Uuid, date: NaiveDate) -> Result<bool, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .alerts
            .iter()
            .any(|a| a.student_id == student_id && a.date == date))
    }

    async fn alert(&self, id: Uuid) -> Result<Option<AbsenceAlert>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .alerts
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn open_alerts_for_mentor(&self, mentor_id: Uuid) -> Result<Vec<OpenAlert>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .alerts
            .iter()
            .filter(|a| !a.resolved)
            .filter_map(|a| {
                let student = inner
                    .students
                    .iter()
                    .find(|s| s.id == a.student_id && s.mentor_id == Some(mentor_id))?;
                Some(OpenAlert {
                    alert: a.clone(),
                    student_name: student.full_name.clone(),
                    roll_number: student.roll_number.clone(),
                })
            })
            .collect())
    }

    async fn mark_alert_resolved(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.alerts.iter_mut().find(|a| a.id == id && !a.resolved) {
            Some(alert) => {
                alert.resolved = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn overview(&self) -> Result<Overview, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(Overview {
            total_students: inner.students.len() as i64,
            total_mentors: inner.mentors.len() as i64,
            pending_leaves: inner
                .leaves
                .iter()
                .filter(|l| l.status == LeaveStatus::Pending)
                .count() as i64,
            approved_leaves: inner
                .leaves
                .iter()
                .filter(|l| l.status == LeaveStatus::Approved)
                .count() as i64,
            open_alerts: inner.alerts.iter().filter(|a| !a.resolved).count() as i64,
        })
    }
}
