//! Realtime delivery layer for MemberHub.
//!
//! Every browser tab holds one WebSocket channel. Channels join rooms
//! (`user:<id>`, `conversation:<id>`, or a bare topic name) and the
//! [`Broadcaster`] pushes serialized [`ServerEvent`]s into whichever
//! channels a room currently has. Delivery is best effort: a slow or
//! closed channel is pruned, never surfaced to the caller.

pub mod broadcaster;
pub mod connection;
pub mod event;
pub mod policy;
pub mod room;
pub mod server;
pub mod session;
pub mod ws;

pub use broadcaster::Broadcaster;
pub use connection::authenticator::{ChannelAuthenticator, ChannelIdentity};
pub use connection::handle::{ChannelHandle, ChannelId};
pub use connection::pool::ChannelPool;
pub use event::{ClientMessage, ServerEvent};
pub use policy::{OpenRoomPolicy, RoomPolicy};
pub use room::key::RoomKey;
pub use room::registry::RoomRegistry;
pub use server::RealtimeEngine;
pub use session::SessionRegistry;
