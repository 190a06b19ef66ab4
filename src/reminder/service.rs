use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info};

use super::model::{Meeting, MeetingReminder, MeetingState};

pub const DEFAULT_REMINDER_LEAD: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_REMINDER_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Raises one reminder per accepted meeting shortly before it starts.
#[derive(Debug)]
pub struct ReminderService {
    lead: chrono::Duration,
    notified: HashSet<String>,
}

impl ReminderService {
    pub fn new(lead: Duration) -> Self {
        Self {
            lead: chrono::Duration::from_std(lead).unwrap_or_else(|_| chrono::Duration::minutes(10)),
            notified: HashSet::new(),
        }
    }

    /// Reminders for accepted meetings starting within the lead window after `now`.
    ///
    /// Each meeting is reminded at most once until [`reset`](Self::reset).
    pub fn due(&mut self, meetings: &[Meeting], now: DateTime<Utc>) -> Vec<MeetingReminder> {
        let mut reminders = Vec::new();

        for meeting in meetings.iter().filter(|m| m.status == MeetingState::Accepted) {
            let starts_at = match meeting.start_time() {
                Some(starts_at) => starts_at,
                None => {
                    debug!("Meeting {} has no usable start time", meeting.id);
                    continue;
                }
            };

            let until = starts_at - now;
            if until <= chrono::Duration::zero() || until >= self.lead {
                continue;
            }
            if !self.notified.insert(meeting.id.clone()) {
                continue;
            }

            info!("Meeting {} starts at {}, raising reminder", meeting.id, starts_at);
            reminders.push(MeetingReminder {
                meeting_id: meeting.id.clone(),
                counterpart: meeting.counterpart_name().map(str::to_string),
                starts_at,
            });
        }

        reminders
    }

    /// Forget which meetings were reminded, e.g. on logout.
    pub fn reset(&mut self) {
        self.notified.clear();
    }
}

impl Default for ReminderService {
    fn default() -> Self {
        Self::new(DEFAULT_REMINDER_LEAD)
    }
}
