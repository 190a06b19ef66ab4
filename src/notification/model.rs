use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::remote::RemoteError;

/// Kind of a notification as assigned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Warning,
    Success,
    Error,
    VideoCall,
    Message,
    MeetingRequest,
    /// Any type this client does not know; listed like `Info`.
    #[serde(other)]
    Other,
}

impl NotificationKind {
    pub fn as_str(&self) -> &str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Warning => "warning",
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
            NotificationKind::VideoCall => "video_call",
            NotificationKind::Message => "message",
            NotificationKind::MeetingRequest => "meeting_request",
            NotificationKind::Other => "other",
        }
    }
}

/// Explicit meeting-flow tag set by the backend at creation time.
///
/// Older events do not carry it; see `classifier::category_of` for the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    MeetingRequest,
    MeetingAccepted,
    MeetingDeclined,
    General,
}

/// One event delivered to the current user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default, deserialize_with = "nullable_string")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "message", default)]
    pub body: String,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
    #[serde(rename = "sender_id", default, skip_serializing_if = "Option::is_none")]
    pub originator_user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_room: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<NotificationCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_date_time: Option<DateTime<Utc>>,
}

impl Notification {
    /// Build a notification with only the required fields set.
    pub fn new(
        id: impl Into<String>,
        kind: NotificationKind,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            body: body.into(),
            timestamp: Utc::now(),
            read: false,
            originator_user_id: None,
            meeting_id: None,
            call_room: None,
            message_content: None,
            from_user: None,
            category: None,
            preferred_date_time: None,
        }
    }

    pub fn has_valid_id(&self) -> bool {
        is_valid_id(&self.id)
    }
}

/// Ids that are empty, whitespace-only, the literals `"undefined"` or
/// `"null"`, or a bare dot segment never reach the backend.
pub fn is_valid_id(id: &str) -> bool {
    let trimmed = id.trim();
    !trimmed.is_empty() && !matches!(trimmed, "undefined" | "null" | "." | "..")
}

/// User action offered on a banner or dropdown entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationAction {
    Accept,
    Decline,
    Reply,
}

/// Answer sent back for an incoming video call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoCallAnswer {
    Accept,
    Decline,
}

impl VideoCallAnswer {
    pub fn as_str(&self) -> &str {
        match self {
            VideoCallAnswer::Accept => "accept",
            VideoCallAnswer::Decline => "decline",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoCallResponse {
    #[serde(default)]
    pub room_name: Option<String>,
}

/// Target status of a meeting request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    Accepted,
    Rejected,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &str {
        match self {
            MeetingStatus::Accepted => "accepted",
            MeetingStatus::Rejected => "rejected",
        }
    }
}

/// Client-side placeholder used to open a reply chat. Never persisted or sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTarget {
    pub user_id: String,
    pub display_name: String,
}

/// What `handle_action` ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    CallAccepted { room_name: Option<String> },
    CallDeclined,
    MeetingUpdated { meeting_id: String, status: MeetingStatus },
    ChatOpened(ChatTarget),
    Ignored,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Invalid notification id: {0:?}")]
    InvalidId(String),

    #[error("Notification {0} has no meeting id")]
    MissingMeetingId(String),

    #[error("Notification {0} has no sender to reply to")]
    MissingSender(String),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts RFC 3339 as well as naive ISO-8601 (which the backend emits for UTC).
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_backend_payload_deserialization() {
        let json = r#"{
            "id": "65f1c0ffee",
            "user_id": "u-1",
            "type": "video_call",
            "title": "Incoming Video Call",
            "message": "Dr. X is calling you",
            "timestamp": "2024-03-01T09:30:15.123456",
            "read": false,
            "is_read": false,
            "sender_id": "u-2",
            "call_room": "room-42",
            "action_url": null
        }"#;

        let notification: Notification = serde_json::from_str(json).unwrap();
        assert_eq!(notification.id, "65f1c0ffee");
        assert_eq!(notification.kind, NotificationKind::VideoCall);
        assert_eq!(notification.body, "Dr. X is calling you");
        assert_eq!(notification.originator_user_id.as_deref(), Some("u-2"));
        assert_eq!(notification.call_room.as_deref(), Some("room-42"));
        assert_eq!(notification.timestamp.year(), 2024);
        assert_eq!(notification.timestamp.minute(), 30);
        assert!(notification.category.is_none());
    }

    #[test]
    fn test_null_id_decodes_as_invalid() {
        let json = r#"{"id": null, "type": "info", "title": "t", "message": "m",
                       "timestamp": "2024-03-01T09:30:15Z"}"#;
        let notification: Notification = serde_json::from_str(json).unwrap();
        assert_eq!(notification.id, "");
        assert!(!notification.has_valid_id());
        assert!(!notification.read);
    }

    #[test]
    fn test_structured_fields() {
        let json = r#"{"id": "n1", "type": "info", "title": "New Request", "message": "m",
                       "timestamp": "2024-03-01T09:30:15+02:00",
                       "category": "meeting_request",
                       "preferred_date_time": "2024-03-05T14:00:00Z"}"#;
        let notification: Notification = serde_json::from_str(json).unwrap();
        assert_eq!(notification.category, Some(NotificationCategory::MeetingRequest));
        assert_eq!(notification.timestamp.hour(), 7);
        assert_eq!(notification.preferred_date_time.unwrap().day(), 5);
    }

    #[test]
    fn test_invalid_timestamp_is_rejected() {
        let json = r#"{"id": "n1", "type": "info", "timestamp": "yesterday"}"#;
        assert!(serde_json::from_str::<Notification>(json).is_err());
    }

    #[test]
    fn test_unknown_and_meeting_request_kinds() {
        let json = r#"{"id": "m1", "type": "meeting_request", "title": "Meeting Request",
                       "message": "m", "timestamp": "2024-03-01T09:30:15"}"#;
        let notification: Notification = serde_json::from_str(json).unwrap();
        assert_eq!(notification.kind, NotificationKind::MeetingRequest);

        let json = r#"{"id": "x1", "type": "system_broadcast", "title": "t",
                       "message": "m", "timestamp": "2024-03-01T09:30:15"}"#;
        let notification: Notification = serde_json::from_str(json).unwrap();
        assert_eq!(notification.kind, NotificationKind::Other);
    }

    #[test]
    fn test_id_validation() {
        assert!(is_valid_id("abc"));
        assert!(is_valid_id("a/b"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("   "));
        assert!(!is_valid_id("undefined"));
        assert!(!is_valid_id("null"));
        assert!(!is_valid_id(".."));
        assert!(!is_valid_id("."));
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(NotificationKind::VideoCall.as_str(), "video_call");
        assert_eq!(VideoCallAnswer::Decline.as_str(), "decline");
        assert_eq!(MeetingStatus::Rejected.as_str(), "rejected");
        assert_eq!(
            serde_json::to_string(&MeetingStatus::Accepted).unwrap(),
            r#""accepted""#
        );
    }
}
