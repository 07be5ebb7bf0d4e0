use std::io::Read;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use tracing::warn;

use crate::models::AttendanceStatus;
use crate::store::Store;

#[derive(serde::Deserialize)]
struct CsvRow {
    roll_number: String,
    date: NaiveDate,
    status: AttendanceStatus,
}

/// Ingest attendance rows captured outside the system. Rows for unknown
/// roll numbers are logged and skipped; days already on record are left
/// untouched. Returns the number of rows actually inserted.
pub async fn import_attendance_csv(store: &dyn Store, csv_path: &Path) -> anyhow::Result<usize> {
    let reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    import_attendance(store, reader).await
}

async fn import_attendance<R: Read>(
    store: &dyn Store,
    mut reader: csv::Reader<R>,
) -> anyhow::Result<usize> {
    let mut inserted = 0usize;
    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let Some(student) = store.student_by_roll(&row.roll_number).await? else {
            warn!(roll = %row.roll_number, "attendance import: unknown roll number, skipping");
            continue;
        };
        if store
            .upsert_attendance(student.id, row.date, row.status)
            .await?
        {
            inserted += 1;
        }
    }
    Ok(inserted)
}
