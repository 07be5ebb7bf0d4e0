use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Mentor {
    pub id: Uuid,
    pub full_name: String,
    pub department: String,
    pub email: String,
}

// Deliberately not Serialize: parent_phone is only exposed through the
// mentor contact surface.
#[derive(Debug, Clone)]
pub struct Student {
    pub id: Uuid,
    pub full_name: String,
    pub roll_number: String,
    pub branch: String,
    pub semester: i32,
    pub mentor_id: Option<Uuid>,
    pub parent_name: String,
    pub parent_phone: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Leave,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Leave => "leave",
        }
    }
}

impl FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            "leave" => Ok(Self::Leave),
            other => Err(format!("unknown attendance status {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl FromStr for LeaveStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown leave status {other:?}")),
        }
    }
}

impl fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaveRequest {
    pub id: Uuid,
    pub student_id: Uuid,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub reason: String,
    pub leave_type: String,
    pub status: LeaveStatus,
    pub mentor_note: Option<String>,
    pub applied_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AbsenceAlert {
    pub id: Uuid,
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub alert_type: String,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLabel {
    Safe,
    Monitor,
    #[serde(rename = "At Risk")]
    AtRisk,
    Critical,
}

impl RiskLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "Safe",
            Self::Monitor => "Monitor",
            Self::AtRisk => "At Risk",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentRisk {
    pub student_id: Uuid,
    pub full_name: String,
    pub roll_number: String,
    pub branch: String,
    pub semester: i32,
    pub attendance_percent: i64,
    pub leaves_last_60_days: i64,
    pub leaves_this_month: i64,
    pub risk_score: i64,
    pub risk_label: RiskLabel,
    pub prediction: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CohortReport {
    pub analyzed_at: DateTime<Utc>,
    pub total_students: usize,
    pub critical: usize,
    pub at_risk: usize,
    pub monitor: usize,
    pub safe: usize,
    pub students: Vec<StudentRisk>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentProfile {
    pub id: Uuid,
    pub full_name: String,
    pub roll_number: String,
    pub branch: String,
    pub semester: i32,
    pub mentor_name: Option<String>,
    pub attendance_percent: i64,
    pub leaves_this_month: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MenteeSummary {
    pub id: Uuid,
    pub full_name: String,
    pub roll_number: String,
    pub branch: String,
    pub semester: i32,
    pub attendance_percent: i64,
    pub leaves_this_month: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewableLeave {
    pub request: LeaveRequest,
    pub student_name: String,
    pub roll_number: String,
    pub branch: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpenAlert {
    pub alert: AbsenceAlert,
    pub student_name: String,
    pub roll_number: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParentContact {
    pub student_name: String,
    pub parent_name: String,
    pub parent_phone: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub total_students: i64,
    pub total_mentors: i64,
    pub pending_leaves: i64,
    pub approved_leaves: i64,
    pub open_alerts: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaveReceipt {
    pub request_id: Uuid,
    pub leaves_remaining: i64,
}
