use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod admin;
mod cohort;
mod error;
mod import;
mod leave;
mod mentor;
mod metrics;
mod models;
mod report;
mod risk;
mod seed;
mod store;
mod student;
mod sweep;

use admin::AdminOps;
use error::CoreError;
use leave::{Decision, LeaveApplication};
use mentor::MentorOps;
use store::pg::PgStore;
use student::StudentOps;

#[derive(Parser)]
#[command(name = "slms")]
#[command(about = "Student leave management and absence risk tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a deterministic demo dataset
    Seed,
    /// Import attendance records from a CSV file (roll_number,date,status)
    ImportAttendance {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Run the daily uninformed-absence sweep
    Sweep {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Print the cohort risk report as JSON
    Analyze,
    /// Write the cohort risk report as markdown
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Print the top students by risk score
    Score {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Student-facing operations
    Student {
        #[command(subcommand)]
        action: StudentAction,
    },
    /// Mentor-facing operations
    Mentor {
        #[command(subcommand)]
        action: MentorAction,
    },
    /// Admin-facing operations
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum StudentAction {
    /// Show a student's profile with attendance and quota usage
    Profile {
        #[arg(long)]
        id: Uuid,
    },
    /// List a student's leave requests, newest first
    History {
        #[arg(long)]
        id: Uuid,
    },
    /// Apply for leave
    Apply {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long = "type")]
        leave_type: Option<String>,
    },
}

#[derive(Subcommand)]
enum MentorAction {
    /// List the mentor's students with attendance and quota usage
    Students {
        #[arg(long)]
        id: Uuid,
    },
    /// List pending leave requests awaiting this mentor
    Pending {
        #[arg(long)]
        id: Uuid,
    },
    /// List every leave request from this mentor's students
    Leaves {
        #[arg(long)]
        id: Uuid,
    },
    /// Approve or reject a pending leave request
    #[command(group(
        ArgGroup::new("verdict")
            .args(["approve", "reject"])
            .required(true)
            .multiple(false)
    ))]
    Decide {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        request: Uuid,
        #[arg(long)]
        approve: bool,
        #[arg(long)]
        reject: bool,
        #[arg(long)]
        note: Option<String>,
    },
    /// Show parent contact details for one of the mentor's students
    Contact {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        student: Uuid,
    },
    /// List unresolved absence alerts for this mentor's students
    Alerts {
        #[arg(long)]
        id: Uuid,
    },
    /// Mark an absence alert as resolved
    Resolve {
        #[arg(long)]
        alert: Uuid,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Show headline counts across the system
    Overview,
}

/// Validation and policy rejections go to the user with their code; store
/// failures abort the command.
fn explain(err: CoreError) -> anyhow::Result<()> {
    match err {
        CoreError::Store(inner) => Err(inner.into()),
        other => {
            println!("Rejected [{}]: {other}", other.code());
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;
    let store = PgStore::new(pool);

    match cli.command {
        Commands::InitDb => {
            store.init_db().await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            seed::seed(store.pool()).await?;
            println!("Seed data inserted.");
        }
        Commands::ImportAttendance { csv } => {
            let inserted = import::import_attendance_csv(&store, &csv).await?;
            println!("Inserted {inserted} attendance records from {}.", csv.display());
        }
        Commands::Sweep { date } => {
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            let created = sweep::run_daily_absence_sweep(&store, date).await?;
            println!("{created} uninformed-absence alerts created for {date}.");
        }
        Commands::Analyze => {
            let report = AdminOps::new(&store)
                .cohort_report(Utc::now().date_naive())
                .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Report { out } => {
            let report = AdminOps::new(&store)
                .cohort_report(Utc::now().date_naive())
                .await?;
            std::fs::write(&out, report::build_report(&report))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Score { limit } => {
            let report = AdminOps::new(&store)
                .cohort_report(Utc::now().date_naive())
                .await?;
            if report.students.is_empty() {
                println!("No students on record.");
                return Ok(());
            }
            println!("Top students by risk score:");
            for row in report.students.iter().take(limit) {
                println!(
                    "- {} ({}, {}) score {} [{}], attendance {}%, {} leaves in 60 days",
                    row.full_name,
                    row.roll_number,
                    row.branch,
                    row.risk_score,
                    row.risk_label,
                    row.attendance_percent,
                    row.leaves_last_60_days
                );
            }
        }
        Commands::Student { action } => {
            let ops = StudentOps::new(&store);
            let today = Utc::now().date_naive();
            match action {
                StudentAction::Profile { id } => match ops.profile(id, today).await {
                    Ok(profile) => {
                        println!(
                            "{} ({}) {} semester {}",
                            profile.full_name, profile.roll_number, profile.branch, profile.semester
                        );
                        println!(
                            "Mentor: {}",
                            profile.mentor_name.as_deref().unwrap_or("unassigned")
                        );
                        println!("Attendance: {}%", profile.attendance_percent);
                        println!(
                            "Leaves this month: {} of {}",
                            profile.leaves_this_month,
                            leave::MONTHLY_LEAVE_LIMIT
                        );
                    }
                    Err(err) => explain(err)?,
                },
                StudentAction::History { id } => match ops.leave_history(id).await {
                    Ok(history) => {
                        if history.is_empty() {
                            println!("No leave requests on record.");
                        }
                        for leave in history {
                            println!(
                                "- {} to {} [{}] {} ({})",
                                leave.from_date,
                                leave.to_date,
                                leave.status,
                                leave.reason,
                                leave.leave_type
                            );
                            if let Some(note) = leave.mentor_note {
                                println!("  note: {note}");
                            }
                        }
                    }
                    Err(err) => explain(err)?,
                },
                StudentAction::Apply {
                    id,
                    from,
                    to,
                    reason,
                    leave_type,
                } => {
                    let application = LeaveApplication {
                        from_date: from,
                        to_date: to,
                        reason,
                        leave_type,
                    };
                    match ops.apply_leave(id, application, today).await {
                        Ok(receipt) => println!(
                            "Leave request {} submitted, {} left this month.",
                            receipt.request_id, receipt.leaves_remaining
                        ),
                        Err(err) => explain(err)?,
                    }
                }
            }
        }
        Commands::Mentor { action } => {
            let ops = MentorOps::new(&store);
            match action {
                MentorAction::Students { id } => {
                    match ops.mentees(id, Utc::now().date_naive()).await {
                        Ok(mentees) => {
                            for m in mentees {
                                println!(
                                    "- {} ({}, {} sem {}) attendance {}%, {} leaves this month",
                                    m.full_name,
                                    m.roll_number,
                                    m.branch,
                                    m.semester,
                                    m.attendance_percent,
                                    m.leaves_this_month
                                );
                            }
                        }
                        Err(err) => explain(err)?,
                    }
                }
                MentorAction::Pending { id } => match ops.pending_leaves(id).await {
                    Ok(leaves) => print_leaves(&leaves),
                    Err(err) => explain(err)?,
                },
                MentorAction::Leaves { id } => match ops.all_leaves(id).await {
                    Ok(leaves) => print_leaves(&leaves),
                    Err(err) => explain(err)?,
                },
                MentorAction::Decide {
                    id,
                    request,
                    approve,
                    reject: _,
                    note,
                } => {
                    let decision = if approve {
                        Decision::Approve
                    } else {
                        Decision::Reject
                    };
                    match ops.decide_leave(id, request, decision, note).await {
                        Ok(updated) => println!("Leave {} {}.", updated.id, updated.status),
                        Err(err) => explain(err)?,
                    }
                }
                MentorAction::Contact { id, student } => {
                    match ops.student_contact(id, student).await {
                        Ok(contact) => {
                            println!("{}", contact.student_name);
                            println!("Parent: {} ({})", contact.parent_name, contact.parent_phone);
                        }
                        Err(err) => explain(err)?,
                    }
                }
                MentorAction::Alerts { id } => match ops.open_alerts(id).await {
                    Ok(alerts) => {
                        if alerts.is_empty() {
                            println!("No open alerts.");
                        }
                        for a in alerts {
                            println!(
                                "- {} {} ({}) absent {} [{}]",
                                a.alert.id,
                                a.student_name,
                                a.roll_number,
                                a.alert.date,
                                a.alert.alert_type
                            );
                        }
                    }
                    Err(err) => explain(err)?,
                },
                MentorAction::Resolve { alert } => match ops.resolve_alert(alert).await {
                    Ok(()) => println!("Alert resolved."),
                    Err(err) => explain(err)?,
                },
            }
        }
        Commands::Admin { action } => match action {
            AdminAction::Overview => {
                let overview = AdminOps::new(&store).overview().await?;
                println!("Students: {}", overview.total_students);
                println!("Mentors: {}", overview.total_mentors);
                println!("Pending leaves: {}", overview.pending_leaves);
                println!("Approved leaves: {}", overview.approved_leaves);
                println!("Open alerts: {}", overview.open_alerts);
            }
        },
    }

    Ok(())
}

fn print_leaves(leaves: &[models::ReviewableLeave]) {
    if leaves.is_empty() {
        println!("No leave requests on record.");
    }
    for l in leaves {
        println!(
            "- {} {} ({}) {} to {} [{}] {}",
            l.request.id,
            l.student_name,
            l.roll_number,
            l.request.from_date,
            l.request.to_date,
            l.request.status,
            l.request.reason
        );
    }
}
