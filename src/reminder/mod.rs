pub mod model;
pub mod service;

pub use model::{Meeting, MeetingReminder, MeetingState};
pub use service::ReminderService;
