pub mod classifier;
pub mod model;
pub mod presenter;
pub mod scheduler;
pub mod service;
pub mod store;

pub use model::{
    ActionOutcome, ChatTarget, MeetingStatus, Notification, NotificationAction, NotificationCategory,
    NotificationError, NotificationKind,
};
pub use scheduler::PollScheduler;
pub use service::{NoopHost, NotificationHost, NotificationService};
pub use store::StoreSnapshot;
