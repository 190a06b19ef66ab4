//! View helpers for the banner and the dropdown list.

use chrono::{DateTime, Utc};

use super::classifier::{available_actions, category_of};
use super::model::{Notification, NotificationAction, NotificationCategory, NotificationKind};
use super::store::StoreSnapshot;

/// Visual treatment of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationStyle {
    VideoCall,
    Message,
    MeetingRequest,
    MeetingAccepted,
    MeetingDeclined,
    General,
}

pub fn style_of(notification: &Notification) -> NotificationStyle {
    match notification.kind {
        NotificationKind::VideoCall => NotificationStyle::VideoCall,
        NotificationKind::Message => NotificationStyle::Message,
        _ => match category_of(notification) {
            NotificationCategory::MeetingRequest => NotificationStyle::MeetingRequest,
            NotificationCategory::MeetingAccepted => NotificationStyle::MeetingAccepted,
            NotificationCategory::MeetingDeclined => NotificationStyle::MeetingDeclined,
            NotificationCategory::General => NotificationStyle::General,
        },
    }
}

/// "Just now", "5m ago", "3h ago", "2d ago".
pub fn relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - timestamp).num_minutes();
    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / 1440)
    }
}

/// Unread badge text; `None` hides the badge.
pub fn badge_label(unread_count: usize) -> Option<String> {
    match unread_count {
        0 => None,
        1..=9 => Some(unread_count.to_string()),
        _ => Some("9+".to_string()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropdownItem {
    pub id: String,
    pub title: String,
    pub body: String,
    pub style: NotificationStyle,
    pub age: String,
    pub unread: bool,
    pub actions: Vec<NotificationAction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropdownView {
    pub badge: Option<String>,
    pub show_mark_all: bool,
    pub items: Vec<DropdownItem>,
}

/// The dropdown lists the store exactly in its current order.
pub fn dropdown_view(snapshot: &StoreSnapshot, now: DateTime<Utc>) -> DropdownView {
    let items = snapshot
        .notifications
        .iter()
        .map(|n| DropdownItem {
            id: n.id.clone(),
            title: n.title.clone(),
            body: n.body.clone(),
            style: style_of(n),
            age: relative_time(n.timestamp, now),
            unread: !n.read,
            actions: available_actions(n),
        })
        .collect();

    DropdownView {
        badge: badge_label(snapshot.unread_count),
        show_mark_all: snapshot.unread_count > 0,
        items,
    }
}
