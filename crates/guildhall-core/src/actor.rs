//! The authenticated identity behind a command.

use serde::{Deserialize, Serialize};

/// An authenticated user issuing commands.
///
/// `user_id` is the user's Discord id; `display_name` is the name the auth
/// provider reported for this request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Stable user identifier (Discord id).
    pub user_id: String,
    /// Display name at the time of the request.
    pub display_name: String,
    /// Whether the user may act on behalf of the guild.
    pub is_guild_leader: bool,
}

impl Actor {
    /// Creates a regular member actor.
    pub fn member(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            is_guild_leader: false,
        }
    }

    /// Creates a guild leader actor.
    pub fn guild_leader(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            is_guild_leader: true,
        }
    }

    /// Returns `true` if this actor is the given user.
    #[must_use]
    pub fn is(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}
