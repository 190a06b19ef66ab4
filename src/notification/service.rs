use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::classifier::{classify_arrival, is_meeting_request, sender_display_name, Arrival};
use super::model::{
    is_valid_id, ActionOutcome, ChatTarget, MeetingStatus, Notification, NotificationAction,
    NotificationError, NotificationKind, VideoCallAnswer,
};
use super::store::{NotificationStore, StoreSnapshot};
use crate::auth::{CredentialError, CredentialStore};
use crate::reminder::Meeting;
use crate::remote::{RemoteError, RemoteSource};

pub const DEFAULT_BANNER_TTL: Duration = Duration::from_secs(10);

/// Callbacks into the hosting UI. Every method defaults to doing nothing.
pub trait NotificationHost: Send + Sync {
    /// Join the given video call room.
    fn on_call_accepted(&self, _room_name: &str) {}

    /// Open a chat with the sender of a message notification.
    fn on_chat_requested(&self, _target: &ChatTarget) {}

    /// A meeting request was answered; the host refreshes its meeting list.
    fn on_meeting_status_changed(&self, _meeting_id: &str, _status: MeetingStatus) {}

    /// The backend rejected the credential; send the user to the login entry point.
    fn on_session_expired(&self) {}
}

#[derive(Debug, Default)]
pub struct NoopHost;

impl NotificationHost for NoopHost {}

/// Client-side notification delivery: store, banner presenter and action dispatch.
///
/// All store mutations go through one mutex; remote calls are made without
/// holding it. Cloning is cheap and clones share state.
#[derive(Clone)]
pub struct NotificationService {
    remote: Arc<dyn RemoteSource>,
    credentials: Arc<CredentialStore>,
    host: Arc<dyn NotificationHost>,
    store: Arc<Mutex<NotificationStore>>,
    updates: Arc<watch::Sender<StoreSnapshot>>,
    fetch_seq: Arc<AtomicU64>,
    banner_ttl: Duration,
}

impl NotificationService {
    pub fn new(
        remote: Arc<dyn RemoteSource>,
        credentials: Arc<CredentialStore>,
        host: Arc<dyn NotificationHost>,
        banner_ttl: Duration,
    ) -> Self {
        let (updates, _) = watch::channel(StoreSnapshot::default());
        Self {
            remote,
            credentials,
            host,
            store: Arc::new(Mutex::new(NotificationStore::new())),
            updates: Arc::new(updates),
            fetch_seq: Arc::new(AtomicU64::new(0)),
            banner_ttl,
        }
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    /// Receive a fresh snapshot after every store change.
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.updates.subscribe()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.with_store(|store| store.snapshot())
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.with_store(|store| store.notifications().to_vec())
    }

    pub fn unread_count(&self) -> usize {
        self.with_store(|store| store.unread_count())
    }

    pub fn active_banner(&self) -> Option<Notification> {
        self.with_store(|store| store.active_banner().cloned())
    }

    /// Start a session with a new credential.
    pub fn login(&self, token: impl Into<String>) {
        self.credentials.set(token);
        self.reset_store();
    }

    /// End the session: drop the credential and everything cached for it.
    pub fn logout(&self) {
        self.credentials.clear();
        self.reset_store();
        info!("Notification session ended");
    }

    /// Fetch the authoritative list, apply it, and surface new arrivals.
    ///
    /// Returns the number of arrivals handled.
    pub async fn sync(&self) -> Result<usize, NotificationError> {
        match self.credentials.current() {
            Ok(_) => {}
            Err(CredentialError::Missing) => {
                debug!("No credential, skipping notification fetch");
                self.reset_store();
                return Ok(0);
            }
            Err(CredentialError::Expired) => {
                warn!("Credential expired, not fetching notifications");
                self.handle_auth_rejected();
                return Err(NotificationError::Remote(RemoteError::AuthRejected));
            }
        }

        let generation = self.credentials.generation();
        let seq = self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;

        let fetched = self.remote.list().await.map_err(|e| self.remote_failure("fetch notifications", e))?;

        if self.credentials.generation() != generation || !self.credentials.is_present() {
            info!("Credential changed during fetch {}, discarding result", seq);
            self.reset_store();
            return Ok(0);
        }

        let arrivals = match self.with_store(|store| store.apply_snapshot(seq, fetched)) {
            Some(arrivals) => arrivals,
            None => return Ok(0),
        };
        self.publish();

        let count = arrivals.len();
        if count > 0 {
            info!("{} new notification(s) arrived", count);
        }
        for notification in arrivals {
            self.handle_arrival(notification).await;
        }

        Ok(count)
    }

    async fn handle_arrival(&self, notification: Notification) {
        match classify_arrival(&notification) {
            Arrival::AutoJoin { room_name } => {
                info!(
                    "Call accepted via notification {}, joining room {}",
                    notification.id, room_name
                );
                self.host.on_call_accepted(&room_name);
                if let Err(e) = self.mark_as_read(&notification.id).await {
                    warn!("Failed to mark call notification {} as read: {}", notification.id, e);
                }
            }
            Arrival::Banner => self.show_banner(&notification.id),
            Arrival::Silent => debug!("Notification {} listed without banner", notification.id),
        }
    }

    fn show_banner(&self, id: &str) {
        let generation = match self.with_store(|store| store.show_banner(id)) {
            Some(generation) => generation,
            None => return,
        };
        self.publish();
        debug!("Showing banner for notification {}", id);

        let service = self.clone();
        let ttl = self.banner_ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if service.with_store(|store| store.expire_banner(generation)) {
                debug!("Banner {} expired", generation);
                service.publish();
            }
        });
    }

    /// Hide the banner without touching the read state of its notification.
    pub fn dismiss_banner(&self) {
        if self.with_store(|store| store.dismiss_banner()) {
            self.publish();
        }
    }

    /// Mark one notification read once the backend confirms it.
    pub async fn mark_as_read(&self, id: &str) -> Result<(), NotificationError> {
        validate_id(id, "mark as read")?;

        self.remote
            .mark_read(id)
            .await
            .map_err(|e| self.remote_failure("mark notification as read", e))?;

        if self.with_store(|store| store.mark_read(id)) {
            self.publish();
        }
        Ok(())
    }

    pub async fn mark_all_as_read(&self) -> Result<(), NotificationError> {
        self.remote
            .mark_all_read()
            .await
            .map_err(|e| self.remote_failure("mark all notifications as read", e))?;

        self.with_store(|store| store.mark_all_read());
        self.publish();
        Ok(())
    }

    /// Delete one notification once the backend confirms it.
    pub async fn delete_notification(&self, id: &str) -> Result<(), NotificationError> {
        validate_id(id, "delete")?;

        self.remote
            .delete(id)
            .await
            .map_err(|e| self.remote_failure("delete notification", e))?;

        if self.with_store(|store| store.remove(id)).is_some() {
            self.publish();
        }
        Ok(())
    }

    /// Dispatch a banner or dropdown action for the notification `id`.
    ///
    /// Combinations that make no sense for the notification are ignored.
    pub async fn handle_action(
        &self,
        action: NotificationAction,
        id: &str,
    ) -> Result<ActionOutcome, NotificationError> {
        validate_id(id, "handle action")?;

        let notification = match self.with_store(|store| store.get(id).cloned()) {
            Some(notification) => notification,
            None => {
                warn!("Action {:?} for unknown notification {}", action, id);
                return Ok(ActionOutcome::Ignored);
            }
        };

        match (action, notification.kind) {
            (NotificationAction::Accept, NotificationKind::VideoCall) => {
                self.answer_call(&notification, VideoCallAnswer::Accept).await
            }
            (NotificationAction::Decline, NotificationKind::VideoCall) => {
                self.answer_call(&notification, VideoCallAnswer::Decline).await
            }
            (NotificationAction::Accept, _) if is_meeting_request(&notification) => {
                self.answer_meeting(&notification, MeetingStatus::Accepted).await
            }
            (NotificationAction::Decline, _) if is_meeting_request(&notification) => {
                self.answer_meeting(&notification, MeetingStatus::Rejected).await
            }
            (NotificationAction::Reply, NotificationKind::Message) => self.open_reply(&notification).await,
            _ => {
                debug!(
                    "Ignoring action {:?} for {} notification {}",
                    action,
                    notification.kind.as_str(),
                    id
                );
                Ok(ActionOutcome::Ignored)
            }
        }
    }

    async fn answer_call(
        &self,
        notification: &Notification,
        answer: VideoCallAnswer,
    ) -> Result<ActionOutcome, NotificationError> {
        let response = self
            .remote
            .respond_to_video_call(&notification.id, answer)
            .await
            .map_err(|e| self.remote_failure("respond to video call", e))?;

        let outcome = match answer {
            VideoCallAnswer::Accept => {
                match &response.room_name {
                    Some(room) => self.host.on_call_accepted(room),
                    None => warn!("Call {} accepted but no room was returned", notification.id),
                }
                ActionOutcome::CallAccepted {
                    room_name: response.room_name,
                }
            }
            VideoCallAnswer::Decline => ActionOutcome::CallDeclined,
        };

        self.finish_action(&notification.id).await;
        self.dismiss_banner();
        Ok(outcome)
    }

    async fn answer_meeting(
        &self,
        notification: &Notification,
        status: MeetingStatus,
    ) -> Result<ActionOutcome, NotificationError> {
        let meeting_id = notification
            .meeting_id
            .clone()
            .filter(|m| is_valid_id(m))
            .ok_or_else(|| {
                error!("Meeting request {} carries no meeting id", notification.id);
                NotificationError::MissingMeetingId(notification.id.clone())
            })?;

        self.remote
            .update_meeting_status(&meeting_id, status)
            .await
            .map_err(|e| self.remote_failure("update meeting status", e))?;

        info!("Meeting {} marked {}", meeting_id, status.as_str());
        self.finish_action(&notification.id).await;
        self.dismiss_banner();
        self.host.on_meeting_status_changed(&meeting_id, status);

        Ok(ActionOutcome::MeetingUpdated { meeting_id, status })
    }

    async fn open_reply(&self, notification: &Notification) -> Result<ActionOutcome, NotificationError> {
        let user_id = notification
            .originator_user_id
            .clone()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| NotificationError::MissingSender(notification.id.clone()))?;

        let target = ChatTarget {
            user_id,
            display_name: sender_display_name(notification),
        };

        self.finish_action(&notification.id).await;
        self.host.on_chat_requested(&target);
        Ok(ActionOutcome::ChatOpened(target))
    }

    /// Meetings for reminder checks. An auth rejection ends the session like any other call.
    pub async fn meetings(&self) -> Result<Vec<Meeting>, NotificationError> {
        self.remote
            .list_meetings()
            .await
            .map_err(|e| self.remote_failure("fetch meetings", e))
    }

    /// Marks the handled notification read; a failure here does not undo the action.
    async fn finish_action(&self, id: &str) {
        if let Err(e) = self.mark_as_read(id).await {
            warn!("Action on {} succeeded but marking it read failed: {}", id, e);
        }
    }

    /// Log a failed remote call and apply the session reset on auth rejection.
    fn remote_failure(&self, operation: &str, err: RemoteError) -> NotificationError {
        if err.is_auth_rejected() {
            warn!("Failed to {}: credential rejected", operation);
            self.handle_auth_rejected();
        } else {
            error!("Failed to {}: {}", operation, err);
        }
        NotificationError::Remote(err)
    }

    fn handle_auth_rejected(&self) {
        self.reset_store();
        if self.credentials.take().is_some() {
            info!("Session expired, redirecting to login");
            self.host.on_session_expired();
        }
    }

    fn reset_store(&self) {
        let changed = self.with_store(|store| {
            let had_state = store.is_primed() || !store.notifications().is_empty();
            store.clear();
            had_state
        });
        if changed {
            self.publish();
        }
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        self.updates.send_replace(snapshot);
    }

    fn with_store<T>(&self, f: impl FnOnce(&mut NotificationStore) -> T) -> T {
        let mut store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut store)
    }
}

fn validate_id(id: &str, operation: &str) -> Result<(), NotificationError> {
    if is_valid_id(id) {
        Ok(())
    } else {
        error!("Cannot {}: invalid notification id {:?}", operation, id);
        Err(NotificationError::InvalidId(id.to_string()))
    }
}
