use std::env;
use chrono::NaiveTime;
use dotenvy::dotenv;

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,

    // Twilio credentials + fixed WhatsApp sender id
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_whatsapp_from: String,

    /// Ordered roster of reminder recipients (whatsapp:+... ids)
    pub employees: Vec<String>,

    pub attendance_file: String,

    pub attendance_reminder_times: Vec<NaiveTime>,
    pub out_time_reminder_times: Vec<NaiveTime>,
    pub reminder_expiry_hours: i64,

    // Rate limiting
    pub rate_webhook_per_min: u32,
    pub rate_report_per_min: u32,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            twilio_account_sid: env::var("TWILIO_ACCOUNT_SID")
                .expect("TWILIO_ACCOUNT_SID must be set"),
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN")
                .expect("TWILIO_AUTH_TOKEN must be set"),
            twilio_whatsapp_from: env::var("TWILIO_WHATSAPP_FROM")
                .unwrap_or_else(|_| "whatsapp:+14155238886".to_string()),

            employees: parse_roster(
                &env::var("EMPLOYEES").expect("EMPLOYEES must be set (comma-separated)"),
            ),

            attendance_file: env::var("ATTENDANCE_FILE")
                .unwrap_or_else(|_| "employee_attendance.csv".to_string()),

            attendance_reminder_times: parse_times(
                &env::var("ATTENDANCE_REMINDER_TIMES")
                    .unwrap_or_else(|_| "17:00,18:00".to_string()),
            ),
            out_time_reminder_times: parse_times(
                &env::var("OUT_TIME_REMINDER_TIMES")
                    .unwrap_or_else(|_| "18:50,22:30".to_string()),
            ),
            reminder_expiry_hours: env::var("REMINDER_EXPIRY_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .unwrap(),

            rate_webhook_per_min: env::var("RATE_WEBHOOK_PER_MIN")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap(),
            rate_report_per_min: env::var("RATE_REPORT_PER_MIN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap(),
        }
    }
}

fn parse_roster(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_times(raw: &str) -> Vec<NaiveTime> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            NaiveTime::parse_from_str(s, "%H:%M")
                .unwrap_or_else(|_| panic!("invalid reminder time '{s}', expected HH:MM"))
        })
        .collect()
}
