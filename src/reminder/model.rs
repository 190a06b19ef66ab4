use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::notification::model::parse_timestamp;

const PREFERRED_LINE_PREFIX: &str = "preferred date & time";

/// Layouts the request form has produced over time, all in en-US.
const LEGACY_LAYOUTS: &[&str] = &[
    "%A, %B %d, %Y at %I:%M %p",
    "%A, %B %d, %Y, %I:%M %p",
    "%m/%d/%Y, %I:%M:%S %p",
    "%m/%d/%Y, %I:%M %p",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingState {
    Pending,
    Accepted,
    Rejected,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingParty {
    pub id: String,
    #[serde(default)]
    pub full_name: String,
}

/// A meeting as listed by the backend, reduced to what reminders need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: String,
    pub status: MeetingState,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_date_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizer: Option<MeetingParty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester: Option<MeetingParty>,
}

impl Meeting {
    /// Structured start time, falling back to the line embedded in the message.
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.preferred_date_time
            .or_else(|| parse_preferred_line(&self.message))
    }

    pub fn counterpart_name(&self) -> Option<&str> {
        self.requester
            .as_ref()
            .or(self.organizer.as_ref())
            .map(|party| party.full_name.as_str())
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingReminder {
    pub meeting_id: String,
    pub counterpart: Option<String>,
    pub starts_at: DateTime<Utc>,
}

impl MeetingReminder {
    pub fn message(&self) -> String {
        match &self.counterpart {
            Some(name) => format!("Reminder: Meeting with {} at {}", name, self.starts_at.format("%Y-%m-%d %H:%M UTC")),
            None => format!("Reminder: Meeting at {}", self.starts_at.format("%Y-%m-%d %H:%M UTC")),
        }
    }
}

/// Extracts the `Preferred Date & Time: ...` line of a free-text meeting message.
///
/// Times without an offset are read as UTC.
pub fn parse_preferred_line(message: &str) -> Option<DateTime<Utc>> {
    let line = message
        .lines()
        .map(str::trim)
        .find(|line| line.to_lowercase().starts_with(PREFERRED_LINE_PREFIX))?;
    let (_, value) = line.split_once(':')?;
    let value = value.trim();

    if let Some(parsed) = parse_timestamp(value) {
        return Some(parsed);
    }
    LEGACY_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(value, layout).ok())
        .map(|naive| naive.and_utc())
}
