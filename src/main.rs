use chrono::Utc;
use dotenv::dotenv;
use std::sync::Arc;
use tokio::time;
use tracing::{error, info, warn};

use curalink_notify::notification::presenter::badge_label;
use curalink_notify::notification::{ChatTarget, MeetingStatus};
use curalink_notify::reminder::ReminderService;
use curalink_notify::{
    ClientConfig, CredentialStore, HttpRemoteSource, NotificationHost, NotificationService,
    PollScheduler,
};

/// Host that only reports what a UI would do.
struct LoggingHost;

impl NotificationHost for LoggingHost {
    fn on_call_accepted(&self, room_name: &str) {
        info!("Would join video call room {}", room_name);
    }

    fn on_chat_requested(&self, target: &ChatTarget) {
        info!("Would open chat with {} ({})", target.display_name, target.user_id);
    }

    fn on_meeting_status_changed(&self, meeting_id: &str, status: MeetingStatus) {
        info!("Meeting {} is now {}", meeting_id, status.as_str());
    }

    fn on_session_expired(&self) {
        warn!("Your session has expired. Please log in again.");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    tracing_subscriber::fmt::init();

    // Load .env file if it exists
    dotenv().ok();

    let config = ClientConfig::from_env()?;

    let credentials = Arc::new(CredentialStore::new(config.token.clone()));
    if !credentials.is_present() {
        warn!("CURALINK_TOKEN is not set or expired, polling stays idle");
    }

    let remote = Arc::new(HttpRemoteSource::new(config.api_url.clone(), credentials.clone()));
    let service = NotificationService::new(
        remote,
        credentials.clone(),
        Arc::new(LoggingHost),
        config.banner_ttl,
    );

    let scheduler = PollScheduler::start(service.clone(), config.poll_interval);
    println!("🔔 Watching notifications at {}", config.api_url);

    let mut updates = service.subscribe();
    let mut reminders = ReminderService::new(config.reminder_lead);
    let mut reminder_tick = time::interval(config.reminder_check_interval);
    let mut last_banner: Option<String> = None;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                let banner_id = snapshot.active_banner.as_ref().map(|n| n.id.clone());
                if banner_id != last_banner {
                    if let Some(banner) = &snapshot.active_banner {
                        println!("📣 {}: {}", banner.title, banner.body);
                    }
                    last_banner = banner_id;
                }
                if let Some(badge) = badge_label(snapshot.unread_count) {
                    info!("{} unread notification(s)", badge);
                }
            }
            _ = reminder_tick.tick() => {
                if !credentials.is_present() {
                    reminders.reset();
                    continue;
                }
                match service.meetings().await {
                    Ok(meetings) => {
                        for reminder in reminders.due(&meetings, Utc::now()) {
                            println!("⏰ {}", reminder.message());
                        }
                    }
                    Err(e) => error!("Failed to load meetings for reminders: {}", e),
                }
            }
            _ = &mut shutdown => {
                info!("Shutting down");
                break;
            }
        }
    }

    scheduler.stop();
    Ok(())
}
