use std::sync::Arc;

use chrono::{Local, NaiveDateTime, NaiveTime};
use tracing::{error, info};

use crate::config::Config;
use crate::messenger::Messenger;
use crate::state::ResponseTracker;

pub const ATTENDANCE_REMINDER: &str = "Reminder: Please mark your attendance. Type 'P' for present with time (e.g. 9:00 AM) or 'L' for leave with a reason (e.g. 'I'm sick').";
pub const OUT_TIME_REMINDER: &str = "Reminder: Please mark your out time (e.g. 6:00 PM).";

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ReminderKind {
    Attendance,
    OutTime,
}

impl ReminderKind {
    fn body(self) -> &'static str {
        match self {
            ReminderKind::Attendance => ATTENDANCE_REMINDER,
            ReminderKind::OutTime => OUT_TIME_REMINDER,
        }
    }
}

/// One daily firing at a fixed wall-clock time.
#[derive(Debug, Clone, Copy)]
pub struct ReminderJob {
    pub kind: ReminderKind,
    pub at: NaiveTime,
}

pub fn jobs_from(config: &Config) -> Vec<ReminderJob> {
    let attendance = config.attendance_reminder_times.iter().map(|&at| ReminderJob {
        kind: ReminderKind::Attendance,
        at,
    });
    let out_time = config.out_time_reminder_times.iter().map(|&at| ReminderJob {
        kind: ReminderKind::OutTime,
        at,
    });
    attendance.chain(out_time).collect()
}

/// Spawns one independent timer task per job on the actix runtime.
pub fn spawn_all<M>(
    jobs: Vec<ReminderJob>,
    roster: Vec<String>,
    tracker: Arc<ResponseTracker>,
    messenger: Arc<M>,
) where
    M: Messenger + 'static,
{
    for job in jobs {
        info!(kind = %job.kind, at = %job.at, "scheduling reminder job");
        let roster = roster.clone();
        let tracker = tracker.clone();
        let messenger = messenger.clone();
        actix_web::rt::spawn(async move {
            loop {
                let wait = until_next(Local::now().naive_local(), job.at);
                actix_web::rt::time::sleep(wait).await;
                send_reminders(job.kind, &roster, &tracker, messenger.as_ref()).await;
            }
        });
    }
}

/// Duration until the next occurrence of `at`, today or tomorrow.
fn until_next(now: NaiveDateTime, at: NaiveTime) -> std::time::Duration {
    let today = now.date().and_time(at);
    let next = if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    };
    (next - now).to_std().unwrap_or_default()
}

/// One firing: sweep the roster, skip employees who already answered,
/// send to the rest. A failed send is logged and must not stop the
/// remaining recipients.
pub async fn send_reminders<M: Messenger>(
    kind: ReminderKind,
    roster: &[String],
    tracker: &ResponseTracker,
    messenger: &M,
) {
    for employee in roster {
        let answered = match kind {
            ReminderKind::Attendance => tracker.has_responded(employee),
            ReminderKind::OutTime => tracker.has_out_time(employee),
        };
        if answered {
            continue;
        }

        match messenger.send_message(employee, kind.body()).await {
            Ok(sid) => {
                tracker.record_reminder(employee, Local::now());
                info!(kind = %kind, %employee, %sid, "reminder sent");
            }
            Err(e) => {
                error!(error = %e, kind = %kind, %employee, "failed to send reminder");
            }
        }
    }
}
