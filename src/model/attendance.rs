use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One flat-file row, keyed by (employee_id, date).
///
/// Empty string means "not recorded yet" — the file representation leaks
/// into the type on purpose so partial upserts stay field-wise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = "whatsapp:+8801712345678")]
    pub employee_id: String,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "9:00 AM")]
    pub in_time: String,
    #[schema(example = "6:00 PM")]
    pub out_time: String,
    #[schema(example = "Yes")]
    pub present: String,
    #[schema(example = "Yes")]
    pub leave: String,
    #[schema(example = "I am sick")]
    pub leave_reason: String,
}

impl AttendanceRecord {
    pub fn new(employee_id: &str, date: NaiveDate) -> Self {
        Self {
            employee_id: employee_id.to_string(),
            date,
            in_time: String::new(),
            out_time: String::new(),
            present: String::new(),
            leave: String::new(),
            leave_reason: String::new(),
        }
    }
}

/// Field-wise partial update. `None` and `Some("")` both leave the stored
/// value untouched; only a non-empty value overwrites.
#[derive(Debug, Clone, Default)]
pub struct AttendancePatch {
    pub in_time: Option<String>,
    pub out_time: Option<String>,
    pub present: Option<String>,
    pub leave: Option<String>,
    pub leave_reason: Option<String>,
}

impl AttendancePatch {
    /// Present: in-time plus the literal "Yes" marker.
    pub fn checked_in(in_time: &str) -> Self {
        Self {
            in_time: Some(in_time.to_string()),
            present: Some("Yes".to_string()),
            ..Self::default()
        }
    }

    /// Leave: "Yes" marker plus the free-text reason.
    pub fn on_leave(reason: &str) -> Self {
        Self {
            leave: Some("Yes".to_string()),
            leave_reason: Some(reason.to_string()),
            ..Self::default()
        }
    }

    /// Out-time only; attendance fields untouched.
    pub fn checked_out(out_time: &str) -> Self {
        Self {
            out_time: Some(out_time.to_string()),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, row: &mut AttendanceRecord) {
        overwrite(&mut row.in_time, &self.in_time);
        overwrite(&mut row.out_time, &self.out_time);
        overwrite(&mut row.present, &self.present);
        overwrite(&mut row.leave, &self.leave);
        overwrite(&mut row.leave_reason, &self.leave_reason);
    }
}

fn overwrite(dst: &mut String, src: &Option<String>) {
    if let Some(value) = src {
        if !value.is_empty() {
            *dst = value.clone();
        }
    }
}
