//! # memberhub-service
//!
//! Business logic for MemberHub's notification fan-out and conversational
//! messaging. Each service orchestrates the persistence gateway and the
//! realtime broadcaster to implement application-level use cases.
//!
//! Services follow constructor injection — all dependencies are provided
//! at construction time via `Arc` references. Persistence is the source of
//! truth everywhere: rows are written first, events broadcast after, and a
//! failed broadcast never rolls anything back.

pub mod background;
pub mod conversation;
pub mod mention;
pub mod notification;

pub use background::BackgroundTasks;
pub use conversation::{ConversationService, ParticipantRoomPolicy};
pub use mention::MentionResolver;
pub use notification::{FanoutOutcome, NotificationService, NotificationSpec};
