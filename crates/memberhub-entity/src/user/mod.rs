//! User directory projection.

pub mod model;
pub mod role;
pub mod status;

pub use model::User;
pub use role::UserRole;
pub use status::UserStatus;
