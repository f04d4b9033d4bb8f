use derive_more::Display;
use once_cell::sync::Lazy;
use regex::Regex;

/// In-time / out-time payloads: `H:MM` or `HH:MM`, meridiem required,
/// the space before it optional ("9:00 AM", "10:30pm").
static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}:\d{2}\s?(?i:am|pm)$").expect("time pattern"));

pub const HELP_TEXT: &str = "❓ Sorry, I didn't understand that. Use:\n- 'P <time>' for present (e.g., 'P 9:00 AM')\n- 'L <reason>' for leave (e.g., 'L I am sick')\n- 'out_time <time>' to mark out time (e.g., 'out_time 6:00 PM').";

/// A recognized, validated inbound command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Present { in_time: String },
    Leave { reason: String },
    OutTime { out_time: String },
}

/// Validation failure for a command whose prefix matched. The display
/// text is the full corrective reply sent back to the employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CommandError {
    #[display(
        fmt = "⚠️ Invalid format. Please type 'P' followed by your in-time, e.g., 'P 9:00 AM'."
    )]
    BadInTime,
    #[display(fmt = "⚠️ Please provide a reason for leave, e.g., 'L I am sick'.")]
    MissingReason,
    #[display(
        fmt = "⚠️ Invalid format. Please type 'out_time' followed by the time, e.g., 'out_time 6:00 PM'."
    )]
    BadOutTime,
}

pub fn is_valid_time(payload: &str) -> bool {
    TIME_RE.is_match(payload)
}

/// "P <time>". `None` unless the text starts with p/P; the payload is
/// whatever follows the command letter and its separator.
pub fn match_present(text: &str) -> Option<Result<Command, CommandError>> {
    if !text.starts_with(['p', 'P']) {
        return None;
    }
    let payload = text.get(2..).unwrap_or("").trim();
    Some(if is_valid_time(payload) {
        Ok(Command::Present {
            in_time: payload.to_string(),
        })
    } else {
        Err(CommandError::BadInTime)
    })
}

/// "L <reason>". Free-text reason, must be non-empty after trimming.
pub fn match_leave(text: &str) -> Option<Result<Command, CommandError>> {
    if !text.starts_with(['l', 'L']) {
        return None;
    }
    let reason = text.get(2..).unwrap_or("").trim();
    Some(if reason.is_empty() {
        Err(CommandError::MissingReason)
    } else {
        Ok(Command::Leave {
            reason: reason.to_string(),
        })
    })
}

/// "out_time <time>", prefix matched case-insensitively.
pub fn match_out_time(text: &str) -> Option<Result<Command, CommandError>> {
    let prefix = text.get(..8)?;
    if !prefix.eq_ignore_ascii_case("out_time") {
        return None;
    }
    let payload = text.get(8..).unwrap_or("").trim();
    Some(if is_valid_time(payload) {
        Ok(Command::OutTime {
            out_time: payload.to_string(),
        })
    } else {
        Err(CommandError::BadOutTime)
    })
}
