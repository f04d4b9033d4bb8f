use crate::api::webhook::WhatsAppForm;
use crate::model::attendance::AttendanceRecord;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Bot API",
        version = "1.0.0",
        description = r#"
## WhatsApp Employee Attendance Bot

Receives WhatsApp messages through a Twilio webhook and keeps a daily
attendance sheet.

### 🔹 Commands
- **P `<time>`** — mark presence with the in-time (e.g. `P 9:00 AM`)
- **L `<reason>`** — mark leave with a reason (e.g. `L I am sick`)
- **out_time `<time>`** — record the out-time (e.g. `out_time 6:00 PM`)

### ⏰ Reminders
Scheduled attendance and out-time reminders go out at fixed times of day
to every employee who has not answered yet.

### 📋 Report
`GET /attendance` renders the stored records as an HTML table.

The whole service is closed on Sundays (HTTP 503).

---
Built with **Rust**, **Actix Web** and **Utoipa**.
"#,
    ),
    paths(
        crate::api::webhook::whatsapp_reply,
        crate::api::report::attendance_report,
    ),
    components(schemas(WhatsAppForm, AttendanceRecord)),
    tags(
        (name = "Attendance", description = "Attendance webhook and report"),
    )
)]
pub struct ApiDoc;
