pub mod service;
pub mod spec;

pub use service::NotificationService;
pub use spec::{FanoutOutcome, NotificationSpec};
