use std::collections::HashSet;
use tracing::{debug, warn};

use super::model::{is_valid_id, Notification};

/// Point-in-time copy of the store handed to observers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
    pub active_banner: Option<Notification>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BannerSlot {
    notification_id: String,
    generation: u64,
}

/// Local cache of the current user's notifications, most recent first.
///
/// The active banner always points at an entry of the list; removing that
/// entry clears the banner.
#[derive(Debug, Default)]
pub struct NotificationStore {
    notifications: Vec<Notification>,
    banner: Option<BannerSlot>,
    banner_generation: u64,
    last_applied_seq: u64,
    primed: bool,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn get(&self, id: &str) -> Option<&Notification> {
        self.notifications.iter().find(|n| n.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    pub fn is_primed(&self) -> bool {
        self.primed
    }

    pub fn active_banner(&self) -> Option<&Notification> {
        self.banner
            .as_ref()
            .and_then(|slot| self.get(&slot.notification_id))
    }

    /// Replace the list with a fetched one and return the arrivals, oldest first.
    ///
    /// Returns `None` when a newer fetch has already been applied. The first
    /// applied fetch only establishes the baseline and reports no arrivals.
    pub fn apply_snapshot(&mut self, seq: u64, fetched: Vec<Notification>) -> Option<Vec<Notification>> {
        if seq <= self.last_applied_seq {
            debug!(
                "Dropping stale fetch {} (already applied {})",
                seq, self.last_applied_seq
            );
            return None;
        }
        self.last_applied_seq = seq;

        let mut seen = HashSet::new();
        let mut next = Vec::with_capacity(fetched.len());
        for notification in fetched {
            if !notification.has_valid_id() {
                warn!("Fetched notification without a usable id: {:?}", notification.title);
                next.push(notification);
            } else if seen.insert(notification.id.clone()) {
                next.push(notification);
            } else {
                debug!("Skipping duplicate notification {}", notification.id);
            }
        }

        let arrivals = if self.primed {
            let known: HashSet<&str> = self.notifications.iter().map(|n| n.id.as_str()).collect();
            next.iter()
                .rev()
                .filter(|n| n.has_valid_id() && !known.contains(n.id.as_str()))
                .cloned()
                .collect()
        } else {
            self.primed = true;
            Vec::new()
        };

        self.notifications = next;
        let banner_gone = self
            .banner
            .as_ref()
            .map(|slot| !self.contains(&slot.notification_id))
            .unwrap_or(false);
        if banner_gone {
            self.banner = None;
        }

        Some(arrivals)
    }

    /// Make `id` the active banner, replacing any other. Returns its generation.
    pub fn show_banner(&mut self, id: &str) -> Option<u64> {
        if !is_valid_id(id) || !self.contains(id) {
            return None;
        }
        self.banner_generation += 1;
        self.banner = Some(BannerSlot {
            notification_id: id.to_string(),
            generation: self.banner_generation,
        });
        Some(self.banner_generation)
    }

    /// Clear the banner only if it is still the one shown as `generation`.
    pub fn expire_banner(&mut self, generation: u64) -> bool {
        match &self.banner {
            Some(slot) if slot.generation == generation => {
                self.banner = None;
                true
            }
            _ => false,
        }
    }

    pub fn dismiss_banner(&mut self) -> bool {
        self.banner.take().is_some()
    }

    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.notifications.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for notification in self.notifications.iter_mut() {
            notification.read = true;
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Notification> {
        let index = self.notifications.iter().position(|n| n.id == id)?;
        if self
            .banner
            .as_ref()
            .map(|slot| slot.notification_id == id)
            .unwrap_or(false)
        {
            self.banner = None;
        }
        Some(self.notifications.remove(index))
    }

    /// Drop everything. The next applied fetch becomes a fresh baseline.
    pub fn clear(&mut self) {
        self.notifications.clear();
        self.banner = None;
        self.primed = false;
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            notifications: self.notifications.clone(),
            unread_count: self.unread_count(),
            active_banner: self.active_banner().cloned(),
        }
    }
}
