//! Client-side notification delivery for the CuraLink web client.
//!
//! Polls the backend for the current user's notifications, keeps a
//! deduplicated local copy with read state, surfaces at most one transient
//! banner at a time and dispatches accept/decline/reply actions.

pub mod auth;
pub mod config;
pub mod notification;
pub mod remote;
pub mod reminder;

pub use auth::CredentialStore;
pub use config::ClientConfig;
pub use notification::{NotificationHost, NotificationService, PollScheduler, StoreSnapshot};
pub use remote::{HttpRemoteSource, RemoteError, RemoteSource};
