use actix_web::{HttpResponse, Responder, web};
use chrono::Local;
use serde::Deserialize;
use tracing::error;
use utoipa::ToSchema;

use crate::command::{self, Command};
use crate::config::Config;
use crate::model::attendance::AttendancePatch;
use crate::state::ResponseTracker;
use crate::store::AttendanceStore;

pub const EXPIRED_REMINDER_REPLY: &str =
    "❌ Your reminder has expired. Please wait for the next reminder.";
const MISSING_FIELDS: &str = "Missing 'Body' or 'From' in the request.";

/// Twilio webhook form. Both fields optional so an absent one is our
/// 400, not a deserializer error.
#[derive(Debug, Deserialize, ToSchema)]
pub struct WhatsAppForm {
    #[serde(rename = "Body", default)]
    #[schema(example = "P 9:00 AM")]
    pub body: Option<String>,
    #[serde(rename = "From", default)]
    #[schema(example = "whatsapp:+8801712345678")]
    pub from: Option<String>,
}

/// Inbound WhatsApp message webhook
#[utoipa::path(
    post,
    path = "/whatsapp",
    request_body(
        content = WhatsAppForm,
        description = "Twilio inbound-message callback",
        content_type = "application/x-www-form-urlencoded"
    ),
    responses(
        (status = 200, description = "TwiML reply message", body = String, content_type = "application/xml"),
        (status = 400, description = "Missing 'Body' or 'From'", body = String),
        (status = 503, description = "Service closed on Sundays"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn whatsapp_reply(
    form: web::Form<WhatsAppForm>,
    store: web::Data<AttendanceStore>,
    tracker: web::Data<ResponseTracker>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let (Some(body), Some(employee)) = (form.body.as_deref(), form.from.as_deref()) else {
        error!("{MISSING_FIELDS}");
        return Ok(HttpResponse::BadRequest().body(MISSING_FIELDS));
    };

    let text = body.trim();
    let today = Local::now().date_naive();

    // Expiry wins over classification: once the last reminder is older
    // than the window, nothing else is processed.
    if tracker.reminder_expired(employee, Local::now(), config.reminder_expiry_hours) {
        return Ok(twiml(EXPIRED_REMINDER_REPLY));
    }

    // Ordered guard chain: present and leave are gated on not having
    // responded yet; out-time is not. A gated message keeps falling
    // through and ends at the help text.
    let responded = tracker.has_responded(employee);
    let matched = if responded {
        None
    } else {
        command::match_present(text).or_else(|| command::match_leave(text))
    }
    .or_else(|| command::match_out_time(text));

    let reply = match matched {
        Some(Ok(Command::Present { in_time })) => {
            tracker.mark_responded(employee);
            persist(&store, employee, today, &AttendancePatch::checked_in(&in_time))?;
            format!("✅ Your presence is marked successfully at {in_time}. Have a great day!")
        }
        Some(Ok(Command::Leave { reason })) => {
            tracker.mark_responded(employee);
            persist(&store, employee, today, &AttendancePatch::on_leave(&reason))?;
            format!("✅ Your leave has been marked successfully. Reason: {reason}")
        }
        Some(Ok(Command::OutTime { out_time })) => {
            persist(&store, employee, today, &AttendancePatch::checked_out(&out_time))?;
            tracker.mark_out_time(employee);
            format!("✅ Thanks for marking your out time: {out_time}. Have a good evening!")
        }
        Some(Err(e)) => e.to_string(),
        None => command::HELP_TEXT.to_string(),
    };

    Ok(twiml(&reply))
}

fn persist(
    store: &AttendanceStore,
    employee: &str,
    date: chrono::NaiveDate,
    patch: &AttendancePatch,
) -> actix_web::Result<()> {
    store.upsert(employee, date, patch).map_err(|e| {
        error!(error = %e, employee, "failed to persist attendance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })
}

/// Wraps one reply message in the TwiML envelope Twilio expects back.
fn twiml(message: &str) -> HttpResponse {
    let xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
        escape_xml(message)
    );
    HttpResponse::Ok()
        .content_type("application/xml")
        .body(xml)
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test};
    use chrono::{Duration, NaiveTime};

    fn test_config() -> Config {
        Config {
            server_addr: "127.0.0.1:0".to_string(),
            twilio_account_sid: "ACtest".to_string(),
            twilio_auth_token: "token".to_string(),
            twilio_whatsapp_from: "whatsapp:+10000000000".to_string(),
            employees: vec!["E1".to_string(), "E2".to_string()],
            attendance_file: String::new(),
            attendance_reminder_times: vec![NaiveTime::from_hms_opt(17, 0, 0).unwrap()],
            out_time_reminder_times: vec![NaiveTime::from_hms_opt(18, 50, 0).unwrap()],
            reminder_expiry_hours: 24,
            rate_webhook_per_min: 60,
            rate_report_per_min: 30,
        }
    }

    struct Ctx {
        _dir: tempfile::TempDir,
        store: web::Data<AttendanceStore>,
        tracker: web::Data<ResponseTracker>,
        config: web::Data<Config>,
    }

    fn ctx() -> Ctx {
        let dir = tempfile::tempdir().unwrap();
        let store = web::Data::new(
            AttendanceStore::new(dir.path().join("attendance.csv")).unwrap(),
        );
        Ctx {
            _dir: dir,
            store,
            tracker: web::Data::new(ResponseTracker::new()),
            config: web::Data::new(test_config()),
        }
    }

    macro_rules! init_app {
        ($ctx:expr) => {
            test::init_service(
                App::new()
                    .app_data($ctx.store.clone())
                    .app_data($ctx.tracker.clone())
                    .app_data($ctx.config.clone())
                    .route("/whatsapp", web::post().to(whatsapp_reply)),
            )
            .await
        };
    }

    macro_rules! send {
        ($app:expr, $body:expr, $from:expr) => {{
            let req = test::TestRequest::post()
                .uri("/whatsapp")
                .set_form([("Body", $body), ("From", $from)])
                .to_request();
            let bytes = test::call_and_read_body(&$app, req).await;
            String::from_utf8(bytes.to_vec()).unwrap()
        }};
    }

    #[actix_web::test]
    async fn present_marks_record_and_confirms() {
        let ctx = ctx();
        let app = init_app!(ctx);

        let reply = send!(app, "P 9:05 AM", "E1");
        assert!(reply.contains("9:05 AM"), "reply was: {reply}");
        assert!(reply.contains("presence is marked"));

        let rows = ctx.store.list_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].employee_id, "E1");
        assert_eq!(rows[0].in_time, "9:05 AM");
        assert_eq!(rows[0].present, "Yes");
        assert!(ctx.tracker.has_responded("E1"));
    }

    #[actix_web::test]
    async fn leave_marks_record_with_reason() {
        let ctx = ctx();
        let app = init_app!(ctx);

        let reply = send!(app, "L I am sick", "E2");
        assert!(reply.contains("leave has been marked"));
        assert!(reply.contains("I am sick"));

        let rows = ctx.store.list_all().unwrap();
        assert_eq!(rows[0].leave, "Yes");
        assert_eq!(rows[0].leave_reason, "I am sick");
    }

    #[actix_web::test]
    async fn out_time_keeps_earlier_fields_and_skips_responded_gate() {
        let ctx = ctx();
        let app = init_app!(ctx);

        send!(app, "P 9:05 AM", "E1");
        let reply = send!(app, "out_time 6:15 PM", "E1");
        assert!(reply.contains("6:15 PM"));

        let rows = ctx.store.list_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].in_time, "9:05 AM");
        assert_eq!(rows[0].present, "Yes");
        assert_eq!(rows[0].out_time, "6:15 PM");
        assert!(ctx.tracker.has_out_time("E1"));
    }

    #[actix_web::test]
    async fn second_present_never_reconfirms() {
        let ctx = ctx();
        let app = init_app!(ctx);

        send!(app, "P 9:05 AM", "E1");
        let reply = send!(app, "P 10:00 AM", "E1");

        // falls past the gated present/leave checks and ends at help
        assert!(!reply.contains("presence is marked"), "reply was: {reply}");
        assert!(reply.contains("didn't understand"));

        let rows = ctx.store.list_all().unwrap();
        assert_eq!(rows[0].in_time, "9:05 AM");
    }

    #[actix_web::test]
    async fn invalid_present_format_leaves_state_untouched() {
        let ctx = ctx();
        let app = init_app!(ctx);

        let reply = send!(app, "P nine thirty", "E1");
        assert!(reply.contains("Invalid format"));
        assert!(ctx.store.list_all().unwrap().is_empty());
        assert!(!ctx.tracker.has_responded("E1"));

        // employee can still mark attendance afterwards
        let reply = send!(app, "P 9:30 AM", "E1");
        assert!(reply.contains("presence is marked"));
    }

    #[actix_web::test]
    async fn unrecognized_text_gets_help_and_no_record() {
        let ctx = ctx();
        let app = init_app!(ctx);

        let reply = send!(app, "xyz", "E1");
        assert!(reply.contains("didn't understand"));
        assert!(ctx.store.list_all().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn missing_fields_rejected_with_400() {
        let ctx = ctx();
        let app = init_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/whatsapp")
            .set_form([("Body", "P 9:00 AM")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn expired_reminder_blocks_all_processing() {
        let ctx = ctx();
        ctx.tracker
            .record_reminder("E1", Local::now() - Duration::hours(25));
        let app = init_app!(ctx);

        let reply = send!(app, "P 9:05 AM", "E1");
        assert!(reply.contains("reminder has expired"), "reply was: {reply}");
        assert!(ctx.store.list_all().unwrap().is_empty());
        assert!(!ctx.tracker.has_responded("E1"));
    }

    #[actix_web::test]
    async fn fresh_reminder_does_not_block() {
        let ctx = ctx();
        ctx.tracker
            .record_reminder("E1", Local::now() - Duration::hours(2));
        let app = init_app!(ctx);

        let reply = send!(app, "P 9:05 AM", "E1");
        assert!(reply.contains("presence is marked"));
    }

    #[::core::prelude::v1::test]
    fn twiml_escapes_reply_text() {
        let resp = twiml("a<b> & \"c\"");
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            "application/xml"
        );
        // body is consumed via the escape helper; check the helper directly
        assert_eq!(escape_xml("a<b> & 'c'"), "a&lt;b&gt; &amp; &apos;c&apos;");
    }
}
