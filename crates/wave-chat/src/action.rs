use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wave_types::models::User;

/// Every mutation of the chat state, as data. Clients can drive the store
/// through [`crate::ChatStore::apply`] with these, or call the equivalent
/// methods directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ChatAction {
    SelectChat {
        chat_id: Uuid,
    },
    SendMessage {
        chat_id: Uuid,
        sender: Uuid,
        content: String,
    },
    EditMessage {
        chat_id: Uuid,
        message_id: Uuid,
        content: String,
    },
    DeleteMessage {
        chat_id: Uuid,
        message_id: Uuid,
    },
    ToggleReaction {
        chat_id: Uuid,
        message_id: Uuid,
        emoji: String,
        user_id: Uuid,
    },
    TogglePin {
        chat_id: Uuid,
        message_id: Uuid,
    },
    AddContact {
        user: User,
    },
    AddGroup {
        name: String,
    },
    SetChatAvatar {
        chat_id: Uuid,
        avatar: String,
    },
    BlockUser {
        user_id: Uuid,
    },
}

/// What happened when an action was applied. Actions never fail — stale or
/// unknown ids come back as `Ignored` so a UI holding old references keeps
/// working — but a send into a blocked conversation is surfaced explicitly
/// rather than dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// Send accepted; carries the new message id.
    Sent(Uuid),
    /// Send refused because a chat participant is blocked.
    Blocked,
    /// Unknown chat/message/user id; state unchanged.
    Ignored,
}
