use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::CoreError;
use crate::leave::{self, LeaveApplication};
use crate::metrics;
use crate::models::{LeaveReceipt, LeaveRequest, StudentProfile};
use crate::store::Store;

/// Student-facing operations. Parent contact details never cross this
/// surface.
pub struct StudentOps<'a> {
    store: &'a dyn Store,
}

impl<'a> StudentOps<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    pub async fn profile(
        &self,
        student_id: Uuid,
        today: NaiveDate,
    ) -> Result<StudentProfile, CoreError> {
        let student = self
            .store
            .student(student_id)
            .await?
            .ok_or(CoreError::NotFound { entity: "student" })?;

        let mentor_name = match student.mentor_id {
            Some(mentor_id) => self.store.mentor(mentor_id).await?.map(|m| m.full_name),
            None => None,
        };
        let attendance_percent = metrics::attendance_percent(self.store, student.id).await?;
        let leaves_this_month = metrics::leaves_this_month(self.store, student.id, today).await?;

        Ok(StudentProfile {
            id: student.id,
            full_name: student.full_name,
            roll_number: student.roll_number,
            branch: student.branch,
            semester: student.semester,
            mentor_name,
            attendance_percent,
            leaves_this_month,
        })
    }

    pub async fn leave_history(&self, student_id: Uuid) -> Result<Vec<LeaveRequest>, CoreError> {
        self.store
            .student(student_id)
            .await?
            .ok_or(CoreError::NotFound { entity: "student" })?;
        Ok(self.store.leave_history(student_id).await?)
    }

    pub async fn apply_leave(
        &self,
        student_id: Uuid,
        application: LeaveApplication,
        today: NaiveDate,
    ) -> Result<LeaveReceipt, CoreError> {
        leave::apply(self.store, student_id, application, today).await
    }
}
