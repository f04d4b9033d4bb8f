use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::model::attendance::{AttendancePatch, AttendanceRecord};

const HEADER: &str = "employee_id,date,in_time,out_time,present,leave,leave_reason";
const DATE_FMT: &str = "%Y-%m-%d";

/// CSV-backed attendance records, one row per (employee, date).
///
/// Every upsert is a full read-modify-write of the file; the mutex
/// serializes those cycles so concurrent webhook calls and scheduler
/// ticks cannot lose each other's updates. Writes go to a sibling temp
/// file and are renamed into place, so readers never observe a partial
/// file.
pub struct AttendanceStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl AttendanceStore {
    /// Opens the store, creating the file with its header row if absent.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            fs::write(&path, format!("{HEADER}\n"))
                .with_context(|| format!("failed to create {}", path.display()))?;
            log::info!("Created attendance file at {}", path.display());
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    /// Insert-or-update the row for (employee_id, date). Only non-empty
    /// patch fields overwrite; everything else keeps its stored value.
    pub fn upsert(&self, employee_id: &str, date: NaiveDate, patch: &AttendancePatch) -> Result<()> {
        let _guard = self.lock.lock().expect("store lock poisoned");

        let mut rows = read_rows(&self.path)?;
        match rows
            .iter_mut()
            .find(|r| r.employee_id == employee_id && r.date == date)
        {
            Some(row) => patch.apply_to(row),
            None => {
                let mut row = AttendanceRecord::new(employee_id, date);
                patch.apply_to(&mut row);
                rows.push(row);
            }
        }
        write_rows(&self.path, &rows)
    }

    /// All rows in file (insertion) order.
    pub fn list_all(&self) -> Result<Vec<AttendanceRecord>> {
        let _guard = self.lock.lock().expect("store lock poisoned");
        read_rows(&self.path)
    }
}

fn read_rows(path: &Path) -> Result<Vec<AttendanceRecord>> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", path.display()));
        }
    };

    let mut rows = Vec::new();
    for line in content.lines().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        match parse_row(line) {
            Some(row) => rows.push(row),
            None => tracing::warn!(line, "skipping malformed attendance row"),
        }
    }
    Ok(rows)
}

fn write_rows(path: &Path, rows: &[AttendanceRecord]) -> Result<()> {
    let mut out = String::with_capacity(64 * (rows.len() + 1));
    out.push_str(HEADER);
    out.push('\n');
    for row in rows {
        out.push_str(&format_row(row));
        out.push('\n');
    }

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, out).with_context(|| format!("failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("failed to replace {}", path.display()))
}

fn parse_row(line: &str) -> Option<AttendanceRecord> {
    let fields = split_line(line);
    if fields.len() != 7 {
        return None;
    }
    let date = NaiveDate::parse_from_str(&fields[1], DATE_FMT).ok()?;
    Some(AttendanceRecord {
        employee_id: fields[0].clone(),
        date,
        in_time: fields[2].clone(),
        out_time: fields[3].clone(),
        present: fields[4].clone(),
        leave: fields[5].clone(),
        leave_reason: fields[6].clone(),
    })
}

fn format_row(row: &AttendanceRecord) -> String {
    [
        quote_field(&row.employee_id),
        row.date.format(DATE_FMT).to_string(),
        quote_field(&row.in_time),
        quote_field(&row.out_time),
        quote_field(&row.present),
        quote_field(&row.leave),
        quote_field(&row.leave_reason),
    ]
    .join(",")
}

/// Splits one CSV line, honoring double-quoted fields with "" escapes.
fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                buf.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut buf));
            }
            _ => buf.push(ch),
        }
    }
    fields.push(buf);
    fields
}

fn quote_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
    }

    fn temp_store(dir: &tempfile::TempDir) -> AttendanceStore {
        AttendanceStore::new(dir.path().join("attendance.csv")).unwrap()
    }

    #[test]
    fn new_store_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attendance.csv");
        AttendanceStore::new(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, format!("{HEADER}\n"));
    }

    #[test]
    fn upsert_inserts_then_updates_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);

        store
            .upsert("E1", day(6), &AttendancePatch::checked_in("9:05 AM"))
            .unwrap();
        store
            .upsert("E1", day(6), &AttendancePatch::checked_out("6:15 PM"))
            .unwrap();

        let rows = store.list_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].in_time, "9:05 AM");
        assert_eq!(rows[0].present, "Yes");
        assert_eq!(rows[0].out_time, "6:15 PM");
    }

    #[test]
    fn same_employee_different_date_gets_new_row() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);

        store
            .upsert("E1", day(5), &AttendancePatch::checked_in("9:00 AM"))
            .unwrap();
        store
            .upsert("E1", day(6), &AttendancePatch::checked_in("9:30 AM"))
            .unwrap();

        let rows = store.list_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, day(5));
        assert_eq!(rows[1].date, day(6));
    }

    #[test]
    fn empty_patch_fields_keep_stored_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);

        store
            .upsert("E2", day(6), &AttendancePatch::on_leave("I am sick"))
            .unwrap();
        store
            .upsert("E2", day(6), &AttendancePatch::default())
            .unwrap();

        let rows = store.list_all().unwrap();
        assert_eq!(rows[0].leave, "Yes");
        assert_eq!(rows[0].leave_reason, "I am sick");
    }

    #[test]
    fn list_all_preserves_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);

        for id in ["E3", "E1", "E2"] {
            store
                .upsert(id, day(6), &AttendancePatch::checked_in("9:00 AM"))
                .unwrap();
        }
        let ids: Vec<_> = store
            .list_all()
            .unwrap()
            .into_iter()
            .map(|r| r.employee_id)
            .collect();
        assert_eq!(ids, vec!["E3", "E1", "E2"]);
    }

    #[test]
    fn reasons_with_commas_and_quotes_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = temp_store(&dir);

        let reason = "fever, \"doctor\" visit";
        store
            .upsert("E1", day(6), &AttendancePatch::on_leave(reason))
            .unwrap();

        let rows = store.list_all().unwrap();
        assert_eq!(rows[0].leave_reason, reason);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attendance.csv");
        fs::write(
            &path,
            format!("{HEADER}\nE1,not-a-date,,,,,\nE2,2026-08-06,9:00 AM,,Yes,,\n"),
        )
        .unwrap();

        let store = AttendanceStore::new(&path).unwrap();
        let rows = store.list_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].employee_id, "E2");
    }
}
