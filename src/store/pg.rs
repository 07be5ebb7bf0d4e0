use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    AbsenceAlert, AttendanceStatus, LeaveRequest, LeaveStatus, Mentor, OpenAlert, Overview,
    ReviewableLeave, Student,
};
use crate::store::Store;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn init_db(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn student_from_row(row: &PgRow) -> Student {
    Student {
        id: row.get("id"),
        full_name: row.get("full_name"),
        roll_number: row.get("roll_number"),
        branch: row.get("branch"),
        semester: row.get("semester"),
        mentor_id: row.get("mentor_id"),
        parent_name: row.get("parent_name"),
        parent_phone: row.get("parent_phone"),
    }
}

fn leave_from_row(row: &PgRow) -> Result<LeaveRequest, StoreError> {
    let status: String = row.get("status");
    Ok(LeaveRequest {
        id: row.get("id"),
        student_id: row.get("student_id"),
        from_date: row.get("from_date"),
        to_date: row.get("to_date"),
        reason: row.get("reason"),
        leave_type: row.get("leave_type"),
        status: status.parse().map_err(StoreError::Decode)?,
        mentor_note: row.get("mentor_note"),
        applied_at: row.get("applied_at"),
        reviewed_at: row.get("reviewed_at"),
    })
}

fn alert_from_row(row: &PgRow) -> AbsenceAlert {
    AbsenceAlert {
        id: row.get("id"),
        student_id: row.get("student_id"),
        date: row.get("date"),
        alert_type: row.get("alert_type"),
        resolved: row.get("resolved"),
        created_at: row.get("created_at"),
    }
}

const STUDENT_COLUMNS: &str =
    "id, full_name, roll_number, branch, semester, mentor_id, parent_name, parent_phone";

const LEAVE_COLUMNS: &str = "id, student_id, from_date, to_date, reason, leave_type, status, \
     mentor_note, applied_at, reviewed_at";

#[async_trait]
impl Store for PgStore {
    async fn students(&self) -> Result<Vec<Student>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {STUDENT_COLUMNS} FROM slms.students ORDER BY roll_number"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(student_from_row).collect())
    }

    async fn student(&self, id: Uuid) -> Result<Option<Student>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {STUDENT_COLUMNS} FROM slms.students WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(student_from_row))
    }

    async fn student_by_roll(&self, roll_number: &str) -> Result<Option<Student>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {STUDENT_COLUMNS} FROM slms.students WHERE roll_number = $1"
        ))
        .bind(roll_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(student_from_row))
    }

    async fn students_of_mentor(&self, mentor_id: Uuid) -> Result<Vec<Student>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {STUDENT_COLUMNS} FROM slms.students WHERE mentor_id = $1 ORDER BY roll_number"
        ))
        .bind(mentor_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(student_from_row).collect())
    }

    async fn mentor(&self, id: Uuid) -> Result<Option<Mentor>, StoreError> {
        let row = sqlx::query(
            "SELECT id, full_name, department, email FROM slms.mentors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| Mentor {
            id: row.get("id"),
            full_name: row.get("full_name"),
            department: row.get("department"),
            email: row.get("email"),
        }))
    }

    async fn attendance_statuses(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<AttendanceStatus>, StoreError> {
        let rows = sqlx::query("SELECT status FROM slms.attendance WHERE student_id = $1")
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?;
        let mut statuses = Vec::with_capacity(rows.len());
        for row in rows {
            let status: String = row.get("status");
            statuses.push(status.parse().map_err(StoreError::Decode)?);
        }
        Ok(statuses)
    }

    async fn upsert_attendance(
        &self,
        student_id: Uuid,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "INSERT INTO slms.attendance (id, student_id, date, status)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (student_id, date) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(date)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn absent_students_on(&self, date: NaiveDate) -> Result<Vec<Uuid>, StoreError> {
        let rows = sqlx::query(
            "SELECT student_id FROM slms.attendance WHERE date = $1 AND status = 'absent'",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(|row| row.get("student_id")).collect())
    }

    async fn insert_leave_request(&self, request: LeaveRequest) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO slms.leave_requests
             (id, student_id, from_date, to_date, reason, leave_type, status, applied_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(request.id)
        .bind(request.student_id)
        .bind(request.from_date)
        .bind(request.to_date)
        .bind(&request.reason)
        .bind(&request.leave_type)
        .bind(request.status.as_str())
        .bind(request.applied_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn leave_request(&self, id: Uuid) -> Result<Option<LeaveRequest>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {LEAVE_COLUMNS} FROM slms.leave_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(leave_from_row).transpose()
    }

    async fn leave_history(&self, student_id: Uuid) -> Result<Vec<LeaveRequest>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {LEAVE_COLUMNS} FROM slms.leave_requests
             WHERE student_id = $1 ORDER BY applied_at DESC"
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(leave_from_row).collect()
    }

    async fn countable_leaves_between(
        &self,
        student_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64, StoreError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS cnt FROM slms.leave_requests
             WHERE student_id = $1
               AND from_date >= $2 AND from_date < $3
               AND status IN ('pending', 'approved')",
        )
        .bind(student_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("cnt"))
    }

    async fn approved_leaves_since(
        &self,
        student_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {LEAVE_COLUMNS} FROM slms.leave_requests
             WHERE student_id = $1 AND status = 'approved' AND from_date >= $2
             ORDER BY from_date"
        ))
        .bind(student_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(leave_from_row).collect()
    }

    async fn approved_leave_covers(
        &self,
        student_id: Uuid,
        date: NaiveDate,
    ) -> Result<bool, StoreError> {
        let row = sqlx::query(
            "SELECT id FROM slms.leave_requests
             WHERE student_id = $1 AND status = 'approved'
               AND from_date <= $2 AND to_date >= $2
             LIMIT 1",
        )
        .bind(student_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    async fn leaves_for_mentor(
        &self,
        mentor_id: Uuid,
        only_pending: bool,
    ) -> Result<Vec<ReviewableLeave>, StoreError> {
        let mut query = format!(
            "SELECT lr.id, lr.student_id, lr.from_date, lr.to_date, lr.reason, lr.leave_type, \
             lr.status, lr.mentor_note, lr.applied_at, lr.reviewed_at, \
             s.full_name, s.roll_number, s.branch \
             FROM slms.leave_requests lr \
             JOIN slms.students s ON s.id = lr.student_id \
             WHERE s.mentor_id = $1"
        );
        if only_pending {
            query.push_str(" AND lr.status = 'pending'");
        }
        query.push_str(" ORDER BY lr.applied_at DESC");

        let rows = sqlx::query(&query).bind(mentor_id).fetch_all(&self.pool).await?;
        let mut leaves = Vec::with_capacity(rows.len());
        for row in &rows {
            leaves.push(ReviewableLeave {
                request: leave_from_row(row)?,
                student_name: row.get("full_name"),
                roll_number: row.get("roll_number"),
                branch: row.get("branch"),
            });
        }
        Ok(leaves)
    }

    async fn record_leave_decision(
        &self,
        request_id: Uuid,
        status: LeaveStatus,
        note: Option<String>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE slms.leave_requests
             SET status = $2, mentor_note = $3, reviewed_at = $4
             WHERE id = $1",
        )
        .bind(request_id)
        .bind(status.as_str())
        .bind(note)
        .bind(reviewed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_alert_if_new(&self, alert: AbsenceAlert) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "INSERT INTO slms.absence_alerts
             (id, student_id, date, alert_type, resolved, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (student_id, date) DO NOTHING",
        )
        .bind(alert.id)
        .bind(alert.student_id)
        .bind(alert.date)
        .bind(&alert.alert_type)
        .bind(alert.resolved)
        .bind(alert.created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn alert_exists(&self, student_id: Uuid, date: NaiveDate) -> Result<bool, StoreError> {
        let row = sqlx::query(
            "SELECT id FROM slms.absence_alerts WHERE student_id = $1 AND date = $2",
        )
        .bind(student_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    async fn alert(&self, id: Uuid) -> Result<Option<AbsenceAlert>, StoreError> {
        let row = sqlx::query(
            "SELECT id, student_id, date, alert_type, resolved, created_at
             FROM slms.absence_alerts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(alert_from_row))
    }

    async fn open_alerts_for_mentor(&self, mentor_id: Uuid) -> Result<Vec<OpenAlert>, StoreError> {
        let rows = sqlx::query(
            "SELECT aa.id, aa.student_id, aa.date, aa.alert_type, aa.resolved, aa.created_at,
                    s.full_name, s.roll_number
             FROM slms.absence_alerts aa
             JOIN slms.students s ON s.id = aa.student_id
             WHERE s.mentor_id = $1 AND aa.resolved = FALSE
             ORDER BY aa.created_at DESC",
        )
        .bind(mentor_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(|row| OpenAlert {
                alert: alert_from_row(row),
                student_name: row.get("full_name"),
                roll_number: row.get("roll_number"),
            })
            .collect())
    }

    async fn mark_alert_resolved(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE slms.absence_alerts SET resolved = TRUE WHERE id = $1 AND resolved = FALSE",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn overview(&self) -> Result<Overview, StoreError> {
        let total_students: i64 = sqlx::query("SELECT COUNT(*) AS n FROM slms.students")
            .fetch_one(&self.pool)
            .await?
            .get("n");
        let total_mentors: i64 = sqlx::query("SELECT COUNT(*) AS n FROM slms.mentors")
            .fetch_one(&self.pool)
            .await?
            .get("n");
        let pending_leaves: i64 =
            sqlx::query("SELECT COUNT(*) AS n FROM slms.leave_requests WHERE status = 'pending'")
                .fetch_one(&self.pool)
                .await?
                .get("n");
        let approved_leaves: i64 =
            sqlx::query("SELECT COUNT(*) AS n FROM slms.leave_requests WHERE status = 'approved'")
                .fetch_one(&self.pool)
                .await?
                .get("n");
        let open_alerts: i64 =
            sqlx::query("SELECT COUNT(*) AS n FROM slms.absence_alerts WHERE resolved = FALSE")
                .fetch_one(&self.pool)
                .await?
                .get("n");
        Ok(Overview {
            total_students,
            total_mentors,
            pending_leaves,
            approved_leaves,
            open_alerts,
        })
    }
}
