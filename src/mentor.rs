use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::error::CoreError;
use crate::leave::{self, Decision};
use crate::metrics;
use crate::models::{LeaveRequest, MenteeSummary, OpenAlert, ParentContact, ReviewableLeave};
use crate::store::Store;

/// Mentor-facing operations, scoped to the mentor's own students.
pub struct MentorOps<'a> {
    store: &'a dyn Store,
}

impl<'a> MentorOps<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    async fn require_mentor(&self, mentor_id: Uuid) -> Result<(), CoreError> {
        self.store
            .mentor(mentor_id)
            .await?
            .ok_or(CoreError::NotFound { entity: "mentor" })?;
        Ok(())
    }

    pub async fn mentees(
        &self,
        mentor_id: Uuid,
        today: NaiveDate,
    ) -> Result<Vec<MenteeSummary>, CoreError> {
        self.require_mentor(mentor_id).await?;
        let students = self.store.students_of_mentor(mentor_id).await?;
        let mut summaries = Vec::with_capacity(students.len());
        for student in students {
            let attendance_percent = metrics::attendance_percent(self.store, student.id).await?;
            let leaves_this_month =
                metrics::leaves_this_month(self.store, student.id, today).await?;
            summaries.push(MenteeSummary {
                id: student.id,
                full_name: student.full_name,
                roll_number: student.roll_number,
                branch: student.branch,
                semester: student.semester,
                attendance_percent,
                leaves_this_month,
            });
        }
        Ok(summaries)
    }

    pub async fn pending_leaves(
        &self,
        mentor_id: Uuid,
    ) -> Result<Vec<ReviewableLeave>, CoreError> {
        self.require_mentor(mentor_id).await?;
        Ok(self.store.leaves_for_mentor(mentor_id, true).await?)
    }

    pub async fn all_leaves(&self, mentor_id: Uuid) -> Result<Vec<ReviewableLeave>, CoreError> {
        self.require_mentor(mentor_id).await?;
        Ok(self.store.leaves_for_mentor(mentor_id, false).await?)
    }

    pub async fn decide_leave(
        &self,
        mentor_id: Uuid,
        request_id: Uuid,
        decision: Decision,
        note: Option<String>,
    ) -> Result<LeaveRequest, CoreError> {
        self.require_mentor(mentor_id).await?;
        leave::decide(self.store, mentor_id, request_id, decision, note, Utc::now()).await
    }

    pub async fn student_contact(
        &self,
        mentor_id: Uuid,
        student_id: Uuid,
    ) -> Result<ParentContact, CoreError> {
        self.require_mentor(mentor_id).await?;
        let student = self
            .store
            .student(student_id)
            .await?
            .ok_or(CoreError::NotFound { entity: "student" })?;
        if student.mentor_id != Some(mentor_id) {
            return Err(CoreError::NotFound { entity: "student" });
        }
        Ok(ParentContact {
            student_name: student.full_name,
            parent_name: student.parent_name,
            parent_phone: student.parent_phone,
        })
    }

    pub async fn open_alerts(&self, mentor_id: Uuid) -> Result<Vec<OpenAlert>, CoreError> {
        self.require_mentor(mentor_id).await?;
        Ok(self.store.open_alerts_for_mentor(mentor_id).await?)
    }

    /// One-way transition. Resolving an already-resolved alert is a no-op.
    pub async fn resolve_alert(&self, alert_id: Uuid) -> Result<(), CoreError> {
        if self.store.mark_alert_resolved(alert_id).await? {
            return Ok(());
        }
        match self.store.alert(alert_id).await? {
            Some(_) => Ok(()),
            None => Err(CoreError::NotFound { entity: "alert" }),
        }
    }
}
