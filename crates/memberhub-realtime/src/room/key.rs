use std::fmt;

use uuid::Uuid;

/// Identifies a room a channel can join.
///
/// The wire form is a plain string: `user:<uuid>` and `conversation:<uuid>`
/// are reserved shapes, anything else is a free-form topic such as
/// `announcements` or `forum:general`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoomKey {
    /// Private room for one member. Joinable only by that member; every
    /// channel is placed here on registration.
    User(Uuid),
    /// Room for one conversation. Joinable only by its participants.
    Conversation(Uuid),
    /// Open broadcast topic, no membership checks.
    Topic(String),
}

impl RoomKey {
    pub fn user(id: Uuid) -> Self {
        RoomKey::User(id)
    }

    pub fn conversation(id: Uuid) -> Self {
        RoomKey::Conversation(id)
    }

    pub fn topic(name: impl Into<String>) -> Self {
        RoomKey::Topic(name.into())
    }

    /// Parses a wire room name. Returns `None` when a reserved prefix
    /// carries a malformed id or the name is empty or oversized; topics
    /// are limited to printable ASCII without whitespace.
    pub fn parse(raw: &str) -> Option<RoomKey> {
        if raw.is_empty() || raw.len() > 128 {
            return None;
        }

        let parts: Vec<&str> = raw.splitn(2, ':').collect();
        match parts.as_slice() {
            ["user", id] => Uuid::parse_str(id).ok().map(RoomKey::User),
            ["conversation", id] => Uuid::parse_str(id).ok().map(RoomKey::Conversation),
            _ => {
                if raw.chars().all(|c| c.is_ascii_graphic()) {
                    Some(RoomKey::Topic(raw.to_string()))
                } else {
                    None
                }
            }
        }
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomKey::User(id) => write!(f, "user:{id}"),
            RoomKey::Conversation(id) => write!(f, "conversation:{id}"),
            RoomKey::Topic(name) => write!(f, "{name}"),
        }
    }
}
