pub mod key;
pub mod registry;
pub mod room;
