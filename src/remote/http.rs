use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, warn};
use url::Url;

use super::{RemoteError, RemoteSource};
use crate::auth::CredentialStore;
use crate::notification::model::{MeetingStatus, Notification, VideoCallAnswer, VideoCallResponse};
use crate::reminder::Meeting;

const NOTIFICATIONS: &[&str] = &["api", "notifications"];
const MEETINGS: &[&str] = &["api", "meetings"];

/// REST implementation of [`RemoteSource`] against the CuraLink backend.
#[derive(Debug, Clone)]
pub struct HttpRemoteSource {
    client: Client,
    base_url: Url,
    credentials: Arc<CredentialStore>,
}

impl HttpRemoteSource {
    pub fn new(base_url: Url, credentials: Arc<CredentialStore>) -> Self {
        Self::with_client(Client::new(), base_url, credentials)
    }

    pub fn with_client(client: Client, mut base_url: Url, credentials: Arc<CredentialStore>) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            client,
            base_url,
            credentials,
        }
    }

    /// Resolve `prefix` followed by `segments` below the base URL.
    ///
    /// Every segment is pushed as one percent-encoded path segment, so ids
    /// containing `/`, `?` or `#` never leave the resource they name.
    fn endpoint(&self, prefix: &[&str], segments: &[&str]) -> Result<Url, RemoteError> {
        if let Some(bad) = segments.iter().find(|s| matches!(**s, "." | "..")) {
            return Err(RemoteError::InvalidUrl(format!("path segment {:?}", bad)));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(prefix)
            .extend(segments);
        Ok(url)
    }

    /// Build an authenticated request. Nothing is sent without a credential.
    fn request(&self, method: Method, url: Result<Url, RemoteError>) -> Result<RequestBuilder, RemoteError> {
        let url = url?;
        let token = self.credentials.current().map_err(|e| {
            debug!("Refusing {} {}: {}", method, url, e);
            RemoteError::AuthRejected
        })?;
        Ok(self.client.request(method, url).bearer_auth(token))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = request.send().await.map_err(|e| {
            error!("Request to notification backend failed: {}", e);
            RemoteError::Transport(e.to_string())
        })?;

        match response.status() {
            StatusCode::UNAUTHORIZED => {
                warn!("Notification backend rejected the credential");
                Err(RemoteError::AuthRejected)
            }
            status if status.is_success() => Ok(response),
            status => {
                let message = response.text().await.unwrap_or_default();
                error!("Notification backend returned {}: {}", status, message);
                Err(RemoteError::Status {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteError> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RemoteSource for HttpRemoteSource {
    async fn list(&self) -> Result<Vec<Notification>, RemoteError> {
        let request = self.request(Method::GET, self.endpoint(NOTIFICATIONS, &[""]))?;
        let records: Vec<Value> = self.send_json(request).await?;

        let total = records.len();
        let notifications: Vec<Notification> = records
            .into_iter()
            .filter_map(|record| match serde_json::from_value::<Notification>(record.clone()) {
                Ok(notification) => Some(notification),
                Err(e) => {
                    warn!("Skipping undecodable notification {}: {}", record, e);
                    None
                }
            })
            .collect();
        if notifications.len() < total {
            warn!("Decoded {} of {} notifications", notifications.len(), total);
        }
        Ok(notifications)
    }

    async fn mark_read(&self, id: &str) -> Result<(), RemoteError> {
        let request = self.request(Method::PUT, self.endpoint(NOTIFICATIONS, &[id, "read"]))?;
        self.send(request).await.map(|_| ())
    }

    async fn mark_all_read(&self) -> Result<(), RemoteError> {
        let request = self.request(Method::PUT, self.endpoint(NOTIFICATIONS, &["mark-all-read"]))?;
        self.send(request).await.map(|_| ())
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        let request = self.request(Method::DELETE, self.endpoint(NOTIFICATIONS, &[id]))?;
        self.send(request).await.map(|_| ())
    }

    async fn respond_to_video_call(
        &self,
        id: &str,
        answer: VideoCallAnswer,
    ) -> Result<VideoCallResponse, RemoteError> {
        let url = self.endpoint(NOTIFICATIONS, &["video-call", id, "respond"]);
        let request = self
            .request(Method::PUT, url)?
            .json(&json!({ "action": answer.as_str() }));
        self.send_json(request).await
    }

    async fn update_meeting_status(
        &self,
        meeting_id: &str,
        status: MeetingStatus,
    ) -> Result<(), RemoteError> {
        let url = self.endpoint(MEETINGS, &[meeting_id, "status"]);
        let request = self
            .request(Method::PUT, url)?
            .json(&json!({ "status": status.as_str() }));
        self.send(request).await.map(|_| ())
    }

    async fn list_meetings(&self) -> Result<Vec<Meeting>, RemoteError> {
        let request = self.request(Method::GET, self.endpoint(MEETINGS, &[""]))?;
        self.send_json(request).await
    }
}
