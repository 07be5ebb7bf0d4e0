use std::fmt::Write;

use crate::models::CohortReport;

pub fn build_report(report: &CohortReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Student Absence Risk Report");
    let _ = writeln!(
        output,
        "Generated {} across {} students",
        report.analyzed_at.format("%Y-%m-%d %H:%M UTC"),
        report.total_students
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Risk Mix");

    if report.total_students == 0 {
        let _ = writeln!(output, "No students on record.");
    } else {
        let _ = writeln!(output, "- Critical: {}", report.critical);
        let _ = writeln!(output, "- At Risk: {}", report.at_risk);
        let _ = writeln!(output, "- Monitor: {}", report.monitor);
        let _ = writeln!(output, "- Safe: {}", report.safe);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Highest Risk Students");

    if report.students.is_empty() {
        let _ = writeln!(output, "No students on record.");
    } else {
        for row in report.students.iter().take(10) {
            let _ = writeln!(
                output,
                "- {} ({}, {} sem {}) score {} [{}], attendance {}%, {} leaves in 60 days",
                row.full_name,
                row.roll_number,
                row.branch,
                row.semester,
                row.risk_score,
                row.risk_label,
                row.attendance_percent,
                row.leaves_last_60_days
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Counselling Recommended");

    let flagged: Vec<_> = report.students.iter().filter(|r| r.risk_score >= 40).collect();
    if flagged.is_empty() {
        let _ = writeln!(output, "No students currently need counselling follow-up.");
    } else {
        for row in flagged {
            let _ = writeln!(
                output,
                "- {} ({}): {} leaves this month, attendance {}%",
                row.full_name, row.roll_number, row.leaves_this_month, row.attendance_percent
            );
        }
    }

    output
}
