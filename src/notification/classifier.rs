//! Decides what an arriving notification means for the client.

use super::model::{Notification, NotificationAction, NotificationCategory, NotificationKind};

const CALL_ACCEPTED_TITLE: &str = "Call Accepted";

/// How a newly arrived notification is surfaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arrival {
    /// An accepted outgoing call: join the room, never show a banner.
    AutoJoin { room_name: String },
    /// Becomes the active banner.
    Banner,
    /// Only listed in the dropdown.
    Silent,
}

pub fn classify_arrival(notification: &Notification) -> Arrival {
    if notification.kind == NotificationKind::VideoCall && notification.title == CALL_ACCEPTED_TITLE {
        if let Some(room) = notification.call_room.as_ref().filter(|r| !r.is_empty()) {
            return Arrival::AutoJoin {
                room_name: room.clone(),
            };
        }
    }

    match notification.kind {
        NotificationKind::VideoCall | NotificationKind::Message => Arrival::Banner,
        _ if is_meeting_request(notification) => Arrival::Banner,
        _ => Arrival::Silent,
    }
}

/// The meeting-flow category, preferring the backend's explicit tag.
pub fn category_of(notification: &Notification) -> NotificationCategory {
    match (notification.category, notification.kind) {
        (Some(category), _) => category,
        (None, NotificationKind::MeetingRequest) => NotificationCategory::MeetingRequest,
        (None, _) => legacy::sniff_category(notification),
    }
}

pub fn is_meeting_request(notification: &Notification) -> bool {
    category_of(notification) == NotificationCategory::MeetingRequest
}

/// Actions a host should offer for this notification.
pub fn available_actions(notification: &Notification) -> Vec<NotificationAction> {
    match notification.kind {
        NotificationKind::VideoCall => vec![NotificationAction::Accept, NotificationAction::Decline],
        NotificationKind::Message => vec![NotificationAction::Reply],
        _ if is_meeting_request(notification) => {
            vec![NotificationAction::Accept, NotificationAction::Decline]
        }
        _ => Vec::new(),
    }
}

/// Display name for the counterpart of a message, used by reply chats.
pub fn sender_display_name(notification: &Notification) -> String {
    notification
        .body
        .split_once(" from ")
        .map(|(_, name)| name.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .or_else(|| notification.from_user.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Text matching for events created before the backend tagged categories.
mod legacy {
    use super::{Notification, NotificationCategory};

    pub(super) fn sniff_category(notification: &Notification) -> NotificationCategory {
        let body = notification.body.as_str();

        if body.contains("meeting request")
            || body.contains("Meeting Request")
            || notification.title.contains("Meeting Request")
        {
            return NotificationCategory::MeetingRequest;
        }

        let lower = body.to_lowercase();
        if lower.contains("meeting") {
            if lower.contains("accepted") {
                return NotificationCategory::MeetingAccepted;
            }
            if lower.contains("rejected") || lower.contains("declined") {
                return NotificationCategory::MeetingDeclined;
            }
        }

        NotificationCategory::General
    }
}
