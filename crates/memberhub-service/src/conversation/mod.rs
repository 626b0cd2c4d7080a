pub mod policy;
pub mod service;

pub use policy::ParticipantRoomPolicy;
pub use service::ConversationService;
