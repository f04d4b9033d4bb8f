use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use chrono::{DateTime, Duration, Local};

/// Volatile per-process response tracking shared by the webhook handler
/// and the reminder scheduler. Constructed once at startup and injected;
/// lost on restart, which is accepted behavior.
///
/// TODO: none of these sets are cleared at day rollover, so an employee
/// who responded yesterday is skipped by attendance reminders until the
/// process restarts. Needs a product decision before adding a reset.
pub struct ResponseTracker {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    responded: HashSet<String>,
    out_time_marked: HashSet<String>,
    last_reminder: HashMap<String, DateTime<Local>>,
}

impl ResponseTracker {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Employee sent a valid Present or Leave.
    pub fn mark_responded(&self, employee_id: &str) {
        self.inner
            .write()
            .expect("tracker poisoned")
            .responded
            .insert(employee_id.to_string());
    }

    pub fn has_responded(&self, employee_id: &str) -> bool {
        self.inner
            .read()
            .expect("tracker poisoned")
            .responded
            .contains(employee_id)
    }

    /// Employee sent a valid out-time message.
    pub fn mark_out_time(&self, employee_id: &str) {
        self.inner
            .write()
            .expect("tracker poisoned")
            .out_time_marked
            .insert(employee_id.to_string());
    }

    pub fn has_out_time(&self, employee_id: &str) -> bool {
        self.inner
            .read()
            .expect("tracker poisoned")
            .out_time_marked
            .contains(employee_id)
    }

    pub fn record_reminder(&self, employee_id: &str, at: DateTime<Local>) {
        self.inner
            .write()
            .expect("tracker poisoned")
            .last_reminder
            .insert(employee_id.to_string(), at);
    }

    /// True once the last reminder sent to this employee is older than
    /// `expiry_hours`. Employees with no reminder on record are never
    /// expired.
    pub fn reminder_expired(
        &self,
        employee_id: &str,
        now: DateTime<Local>,
        expiry_hours: i64,
    ) -> bool {
        self.inner
            .read()
            .expect("tracker poisoned")
            .last_reminder
            .get(employee_id)
            .is_some_and(|sent| now - *sent > Duration::hours(expiry_hours))
    }
}

impl Default for ResponseTracker {
    fn default() -> Self {
        Self::new()
    }
}
