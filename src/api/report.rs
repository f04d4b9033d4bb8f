use actix_web::{HttpResponse, Responder, web};
use tracing::error;

use crate::model::attendance::AttendanceRecord;
use crate::store::AttendanceStore;

const COLUMNS: [&str; 7] = [
    "employee_id",
    "date",
    "in_time",
    "out_time",
    "present",
    "leave",
    "leave_reason",
];

/// Read-only attendance table
#[utoipa::path(
    get,
    path = "/attendance",
    responses(
        (status = 200, description = "HTML table of all attendance records", body = String, content_type = "text/html"),
        (status = 503, description = "Service closed on Sundays"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn attendance_report(
    store: web::Data<AttendanceStore>,
) -> actix_web::Result<impl Responder> {
    let records = store.list_all().map_err(|e| {
        error!(error = %e, "failed to load attendance records");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(render_table(&records)))
}

fn render_table(records: &[AttendanceRecord]) -> String {
    let mut html = String::from(
        "<!DOCTYPE html><html><head><title>Employee Attendance</title></head><body>\
         <h1>Employee Attendance</h1><table border=\"1\"><tr>",
    );
    for col in COLUMNS {
        html.push_str(&format!("<th>{col}</th>"));
    }
    html.push_str("</tr>");

    for r in records {
        let date = r.date.format("%Y-%m-%d").to_string();
        html.push_str("<tr>");
        for cell in [
            r.employee_id.as_str(),
            date.as_str(),
            r.in_time.as_str(),
            r.out_time.as_str(),
            r.present.as_str(),
            r.leave.as_str(),
            r.leave_reason.as_str(),
        ] {
            html.push_str(&format!("<td>{}</td>", escape_html(cell)));
        }
        html.push_str("</tr>");
    }

    html.push_str("</table></body></html>");
    html
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
