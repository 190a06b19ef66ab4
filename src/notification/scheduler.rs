use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use super::service::NotificationService;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Drives [`NotificationService::sync`] on a fixed period.
///
/// One fetch per tick feeds both the state refresh and arrival detection.
/// Ticks never overlap; a slow fetch delays the next tick instead.
#[derive(Debug)]
pub struct PollScheduler {
    task: JoinHandle<()>,
}

impl PollScheduler {
    pub fn start(service: NotificationService, period: Duration) -> Self {
        info!("Starting notification polling every {:?}", period);

        let task = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                // failures are logged by the service; the next tick retries
                if let Err(e) = service.sync().await {
                    debug!("Notification poll failed: {}", e);
                }
            }
        });

        Self { task }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(&self) {
        if !self.task.is_finished() {
            info!("Stopping notification polling");
            self.task.abort();
        }
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CredentialStore;
    use crate::notification::service::{NoopHost, DEFAULT_BANNER_TTL};
    use crate::remote::{MockRemoteSource, RemoteError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_remote(calls: Arc<AtomicUsize>, result: Result<(), RemoteError>) -> MockRemoteSource {
        let mut remote = MockRemoteSource::new();
        remote.expect_list().returning(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            result.clone().map(|_| Vec::new())
        });
        remote
    }

    fn service_for(remote: MockRemoteSource, token: Option<&str>) -> NotificationService {
        NotificationService::new(
            Arc::new(remote),
            Arc::new(CredentialStore::new(token.map(str::to_string))),
            Arc::new(NoopHost),
            DEFAULT_BANNER_TTL,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_on_fixed_period() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = service_for(counting_remote(calls.clone(), Ok(())), Some("token"));

        let scheduler = PollScheduler::start(service, DEFAULT_POLL_INTERVAL);
        time::sleep(Duration::from_millis(7_000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(scheduler.is_running());

        scheduler.stop();
        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(!scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_fetch_without_credential() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = service_for(counting_remote(calls.clone(), Ok(())), None);

        let _scheduler = PollScheduler::start(service.clone(), DEFAULT_POLL_INTERVAL);
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        service.login("token");
        time::sleep(Duration::from_secs(3)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_rejection_stops_fetching() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = service_for(
            counting_remote(calls.clone(), Err(RemoteError::AuthRejected)),
            Some("token"),
        );

        let _scheduler = PollScheduler::start(service.clone(), DEFAULT_POLL_INTERVAL);
        time::sleep(Duration::from_secs(20)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!service.credentials().is_present());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_are_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = service_for(
            counting_remote(calls.clone(), Err(RemoteError::Transport("timeout".to_string()))),
            Some("token"),
        );

        let _scheduler = PollScheduler::start(service.clone(), DEFAULT_POLL_INTERVAL);
        time::sleep(Duration::from_millis(9_500)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(service.credentials().is_present());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_polling() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = service_for(counting_remote(calls.clone(), Ok(())), Some("token"));

        let scheduler = PollScheduler::start(service, DEFAULT_POLL_INTERVAL);
        time::sleep(Duration::from_millis(100)).await;
        drop(scheduler);
        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
