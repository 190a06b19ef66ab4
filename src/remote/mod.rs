pub mod http;

use async_trait::async_trait;

use crate::notification::model::{MeetingStatus, Notification, VideoCallAnswer, VideoCallResponse};
use crate::reminder::Meeting;

pub use http::HttpRemoteSource;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("Authentication rejected")]
    AuthRejected,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl RemoteError {
    pub fn is_auth_rejected(&self) -> bool {
        matches!(self, RemoteError::AuthRejected)
    }
}

/// The backend the notification client polls and reports actions to.
///
/// Every call fails with [`RemoteError::AuthRejected`] when the bearer
/// credential is missing or no longer accepted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Full current list, most recent first.
    async fn list(&self) -> Result<Vec<Notification>, RemoteError>;

    async fn mark_read(&self, id: &str) -> Result<(), RemoteError>;

    async fn mark_all_read(&self) -> Result<(), RemoteError>;

    async fn delete(&self, id: &str) -> Result<(), RemoteError>;

    async fn respond_to_video_call(
        &self,
        id: &str,
        answer: VideoCallAnswer,
    ) -> Result<VideoCallResponse, RemoteError>;

    async fn update_meeting_status(
        &self,
        meeting_id: &str,
        status: MeetingStatus,
    ) -> Result<(), RemoteError>;

    /// Meetings the current user organizes or takes part in.
    async fn list_meetings(&self) -> Result<Vec<Meeting>, RemoteError>;
}
