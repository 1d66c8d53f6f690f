use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub phone_number: String,
    pub avatar: String,
    pub online: bool,
    pub last_seen: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Direct,
    Group,
}

/// Reactions are keyed by emoji, so a message can never hold two entries
/// for the same glyph and an entry whose user-set empties is removed
/// rather than kept hollow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender: Uuid,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub reactions: BTreeMap<String, BTreeSet<Uuid>>,
}

impl Message {
    pub fn new(sender: Uuid, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            content: content.into(),
            timestamp: Utc::now(),
            reactions: BTreeMap::new(),
        }
    }

    /// Display-oriented projection of the reaction map.
    pub fn reaction_groups(&self) -> Vec<ReactionGroup> {
        self.reactions
            .iter()
            .map(|(emoji, users)| ReactionGroup {
                emoji: emoji.clone(),
                count: users.len(),
                user_ids: users.iter().copied().collect(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: Uuid,
    pub kind: ChatKind,
    pub name: String,
    pub avatar: Option<String>,
    /// Direct chats only; empty for groups.
    #[serde(default)]
    pub participants: Vec<Uuid>,
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Starts at an explicit 0 so consumers never need to null-coalesce.
    #[serde(default)]
    pub unread: u32,
    #[serde(default)]
    pub pinned: BTreeSet<Uuid>,
}

impl Chat {
    pub fn direct(name: impl Into<String>, avatar: Option<String>, participants: Vec<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ChatKind::Direct,
            name: name.into(),
            avatar,
            participants,
            messages: Vec::new(),
            unread: 0,
            pinned: BTreeSet::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ChatKind::Group,
            name: name.into(),
            avatar: None,
            participants: Vec::new(),
            messages: Vec::new(),
            unread: 0,
            pinned: BTreeSet::new(),
        }
    }

    pub fn message(&self, id: Uuid) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn message_mut(&mut self, id: Uuid) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionGroup {
    pub emoji: String,
    pub count: usize,
    pub user_ids: Vec<Uuid>,
}
