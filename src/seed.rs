use anyhow::Context;
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use sqlx::PgPool;
use uuid::Uuid;

use crate::metrics;
use crate::models::AttendanceStatus;
use crate::sweep::ALERT_UNINFORMED;

/// Deterministic demo dataset: two mentors, five students with distinct
/// attendance cadences, leave usage at, below, and over the policy
/// boundaries, and open alerts for the chronic absentees. Safe to re-run;
/// every insert is an upsert or conflict-ignored.
pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();
    let month_start = metrics::month_bounds(today).0;

    let mentors = [
        (
            "6a1c2f40-5b77-4a94-9a34-1d20cf6b8a01",
            "Dr. Ramesh Kumar",
            "Computer Science",
            "ramesh.kumar@college.edu",
        ),
        (
            "b4f09c6d-8e2a-47d1-bb56-9f31ce70d902",
            "Prof. Anitha Sharma",
            "Electronics",
            "anitha.sharma@college.edu",
        ),
    ];
    for (id, full_name, department, email) in mentors {
        sqlx::query(
            r#"
            INSERT INTO slms.mentors (id, full_name, department, email)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name, department = EXCLUDED.department
            "#,
        )
        .bind(Uuid::parse_str(id)?)
        .bind(full_name)
        .bind(department)
        .bind(email)
        .execute(pool)
        .await?;
    }
    let mentor_cse = Uuid::parse_str(mentors[0].0)?;
    let mentor_ece = Uuid::parse_str(mentors[1].0)?;

    // (id, name, roll, branch, mentor, parent, phone, absent cadence)
    let students = [
        (
            "11e3a7c2-62d4-4f7b-8a01-c5b9a4f2d310",
            "Arjun Reddy",
            "22CS001",
            "CSE",
            mentor_cse,
            "Suresh Reddy",
            "+91-9848012345",
            9u32,
        ),
        (
            "2297bd4e-0f5a-4f03-9c2d-7e8a1b6c4d21",
            "Priya Patel",
            "22CS002",
            "CSE",
            mentor_cse,
            "Ramesh Patel",
            "+91-9848023456",
            6,
        ),
        (
            "33c1e8f5-9a2b-4d67-b3e4-0f5d6a7b8c32",
            "Kiran Naidu",
            "22EC001",
            "ECE",
            mentor_ece,
            "Venkat Naidu",
            "+91-9848034567",
            3,
        ),
        (
            "44d2f906-ab3c-4e78-c4f5-1a6e7b8c9d43",
            "Sneha Verma",
            "22CS003",
            "CSE",
            mentor_cse,
            "Raj Verma",
            "+91-9848045678",
            5,
        ),
        (
            "55e30a17-bc4d-4f89-d506-2b7f8c9d0e54",
            "Rahul Banerjee",
            "22EC002",
            "ECE",
            mentor_ece,
            "Gopal Banerjee",
            "+91-9848056789",
            2,
        ),
    ];

    let mut seeded = Vec::new();
    for (id, name, roll, branch, mentor_id, parent, phone, cadence) in students {
        let student_id = Uuid::parse_str(id)?;
        sqlx::query(
            r#"
            INSERT INTO slms.students
            (id, full_name, roll_number, branch, semester, mentor_id, parent_name, parent_phone)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (roll_number) DO UPDATE
            SET full_name = EXCLUDED.full_name, branch = EXCLUDED.branch,
                semester = EXCLUDED.semester, mentor_id = EXCLUDED.mentor_id,
                parent_name = EXCLUDED.parent_name, parent_phone = EXCLUDED.parent_phone
            "#,
        )
        .bind(student_id)
        .bind(name)
        .bind(roll)
        .bind(branch)
        .bind(4i32)
        .bind(mentor_id)
        .bind(parent)
        .bind(phone)
        .execute(pool)
        .await?;

        let last_absent = seed_attendance(pool, student_id, cadence, today).await?;
        seeded.push((roll, student_id, last_absent));
    }

    let arjun = seeded[0].1;
    let priya = seeded[1].1;
    let kiran = seeded[2].1;
    let sneha = seeded[3].1;

    // This month: Arjun well inside the quota, Priya at the limit, Sneha with
    // one pending request. Prior month: history feeding the 60-day window.
    let leaves: [(&str, Uuid, NaiveDate, i64, &str, &str, &str); 12] = [
        ("c1000001-0000-4000-8000-000000000001", arjun, month_start + Duration::days(2), 0, "Medical appointment", "medical", "approved"),
        ("c1000001-0000-4000-8000-000000000002", arjun, month_start + Duration::days(9), 1, "Family function", "personal", "approved"),
        ("c1000001-0000-4000-8000-000000000003", priya, month_start, 0, "Fever", "medical", "approved"),
        ("c1000001-0000-4000-8000-000000000004", priya, month_start + Duration::days(6), 0, "Personal work", "personal", "approved"),
        ("c1000001-0000-4000-8000-000000000005", priya, month_start + Duration::days(13), 0, "Dental checkup", "medical", "approved"),
        ("c1000001-0000-4000-8000-000000000006", priya, month_start + Duration::days(19), 1, "Out of town", "personal", "approved"),
        ("c1000001-0000-4000-8000-000000000007", sneha, month_start + Duration::days(25), 1, "Sister's wedding", "personal", "pending"),
        ("c1000001-0000-4000-8000-000000000008", priya, month_start - Duration::days(23), 0, "Headache", "medical", "approved"),
        ("c1000001-0000-4000-8000-000000000009", priya, month_start - Duration::days(16), 1, "Family trip", "personal", "approved"),
        ("c1000001-0000-4000-8000-00000000000a", priya, month_start - Duration::days(9), 0, "Exam prep", "personal", "approved"),
        ("c1000001-0000-4000-8000-00000000000b", kiran, month_start - Duration::days(20), 0, "Doctor visit", "medical", "approved"),
        ("c1000001-0000-4000-8000-00000000000c", kiran, month_start - Duration::days(12), 1, "Personal", "personal", "approved"),
    ];
    for (id, student_id, from, span, reason, leave_type, status) in leaves {
        seed_leave(pool, id, student_id, from, span, reason, leave_type, status).await?;
    }

    // Rahul's 60-day history
    seed_leave(
        pool,
        "c1000001-0000-4000-8000-00000000000d",
        seeded[4].1,
        month_start - Duration::days(18),
        1,
        "Sick",
        "medical",
        "approved",
    )
    .await?;
    seed_leave(
        pool,
        "c1000001-0000-4000-8000-00000000000e",
        seeded[4].1,
        month_start - Duration::days(11),
        1,
        "Travel",
        "personal",
        "approved",
    )
    .await?;

    // Open alerts on the chronic absentees' most recent uncovered absences
    for (roll, student_id, last_absent) in &seeded {
        if !matches!(*roll, "22EC001" | "22EC002") {
            continue;
        }
        if let Some(date) = last_absent {
            sqlx::query(
                r#"
                INSERT INTO slms.absence_alerts
                (id, student_id, date, alert_type, resolved, created_at)
                VALUES ($1, $2, $3, $4, FALSE, $5)
                ON CONFLICT (student_id, date) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(student_id)
            .bind(date)
            .bind(ALERT_UNINFORMED)
            .bind(Utc::now())
            .execute(pool)
            .await?;
        }
    }

    Ok(())
}

/// Weekday attendance over the past twelve weeks, absent every `cadence`th
/// school day. Returns the most recent absent date.
async fn seed_attendance(
    pool: &PgPool,
    student_id: Uuid,
    cadence: u32,
    today: NaiveDate,
) -> anyhow::Result<Option<NaiveDate>> {
    let mut school_day = 0u32;
    let mut last_absent = None;
    for offset in (1..=84).rev() {
        let day = today - Duration::days(offset);
        if matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }
        school_day += 1;
        let status = if school_day % cadence == 0 {
            AttendanceStatus::Absent
        } else {
            AttendanceStatus::Present
        };
        if status == AttendanceStatus::Absent {
            last_absent = Some(day);
        }
        sqlx::query(
            r#"
            INSERT INTO slms.attendance (id, student_id, date, status)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (student_id, date) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(day)
        .bind(status.as_str())
        .execute(pool)
        .await?;
    }
    Ok(last_absent)
}

async fn seed_leave(
    pool: &PgPool,
    id: &str,
    student_id: Uuid,
    from: NaiveDate,
    span_days: i64,
    reason: &str,
    leave_type: &str,
    status: &str,
) -> anyhow::Result<()> {
    let applied_at = (from - Duration::days(1))
        .and_hms_opt(9, 0, 0)
        .context("invalid applied_at time")?
        .and_utc();
    let reviewed_at = (status != "pending").then(|| applied_at + Duration::hours(4));

    sqlx::query(
        r#"
        INSERT INTO slms.leave_requests
        (id, student_id, from_date, to_date, reason, leave_type, status, applied_at, reviewed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(Uuid::parse_str(id)?)
    .bind(student_id)
    .bind(from)
    .bind(from + Duration::days(span_days))
    .bind(reason)
    .bind(leave_type)
    .bind(status)
    .bind(applied_at)
    .bind(reviewed_at)
    .execute(pool)
    .await?;
    Ok(())
}
