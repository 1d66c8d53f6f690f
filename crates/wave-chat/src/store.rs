use std::collections::{HashMap, HashSet};

use tracing::debug;
use uuid::Uuid;

use wave_types::models::{Chat, ChatKind, Message, User};

use crate::action::{ChatAction, Outcome};

/// In-memory chat state for one authenticated user, owned by the
/// application shell and passed by reference to consumers. One logical
/// writer applies actions one at a time, so there is no interior locking;
/// each action is atomic with respect to the next.
pub struct ChatStore {
    /// The authenticated user whose view this is. Every action still names
    /// its acting user explicitly; `owner` only decides whose sends count
    /// as "own" for unread bookkeeping.
    owner: Uuid,
    users: HashMap<Uuid, User>,
    chats: Vec<Chat>,
    selected: Option<Uuid>,
    contacts: Vec<Uuid>,
    blocked: HashSet<Uuid>,
}

impl ChatStore {
    pub fn new(owner: User, roster: Vec<User>, chats: Vec<Chat>) -> Self {
        let owner_id = owner.id;
        let mut users: HashMap<Uuid, User> = roster.into_iter().map(|u| (u.id, u)).collect();
        users.insert(owner_id, owner);
        Self {
            owner: owner_id,
            users,
            chats,
            selected: None,
            contacts: Vec::new(),
            blocked: HashSet::new(),
        }
    }

    // -- Accessors --

    pub fn owner(&self) -> Uuid {
        self.owner
    }

    pub fn chats(&self) -> &[Chat] {
        &self.chats
    }

    pub fn chat(&self, id: Uuid) -> Option<&Chat> {
        self.chats.iter().find(|c| c.id == id)
    }

    pub fn selected_chat(&self) -> Option<&Chat> {
        self.selected.and_then(|id| self.chat(id))
    }

    pub fn user(&self, id: Uuid) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn contacts(&self) -> &[Uuid] {
        &self.contacts
    }

    pub fn is_blocked(&self, user_id: Uuid) -> bool {
        self.blocked.contains(&user_id)
    }

    fn chat_mut(&mut self, id: Uuid) -> Option<&mut Chat> {
        self.chats.iter_mut().find(|c| c.id == id)
    }

    // -- Actions --

    /// Apply an action. Total over all well-formed inputs: nothing here
    /// panics or errors, stale ids are ignored.
    pub fn apply(&mut self, action: ChatAction) -> Outcome {
        match action {
            ChatAction::SelectChat { chat_id } => self.select_chat(chat_id),
            ChatAction::SendMessage { chat_id, sender, content } => {
                self.send_message(chat_id, sender, content)
            }
            ChatAction::EditMessage { chat_id, message_id, content } => {
                self.edit_message(chat_id, message_id, content)
            }
            ChatAction::DeleteMessage { chat_id, message_id } => {
                self.delete_message(chat_id, message_id)
            }
            ChatAction::ToggleReaction { chat_id, message_id, emoji, user_id } => {
                self.toggle_reaction(chat_id, message_id, &emoji, user_id)
            }
            ChatAction::TogglePin { chat_id, message_id } => self.toggle_pin(chat_id, message_id),
            ChatAction::AddContact { user } => self.add_contact(user),
            ChatAction::AddGroup { name } => self.add_group(&name),
            ChatAction::SetChatAvatar { chat_id, avatar } => self.set_chat_avatar(chat_id, avatar),
            ChatAction::BlockUser { user_id } => self.block_user(user_id),
        }
    }

    /// Selecting a chat is the read-receipt proxy: its unread counter drops
    /// to zero regardless of prior value.
    pub fn select_chat(&mut self, chat_id: Uuid) -> Outcome {
        match self.chat_mut(chat_id) {
            Some(chat) => {
                chat.unread = 0;
                self.selected = Some(chat_id);
                Outcome::Applied
            }
            None => Outcome::Ignored,
        }
    }

    pub fn send_message(&mut self, chat_id: Uuid, sender: Uuid, content: String) -> Outcome {
        if !self.users.contains_key(&sender) {
            debug!(%sender, "send from unknown user ignored");
            return Outcome::Ignored;
        }

        let selected = self.selected;
        let owner = self.owner;
        let blocked = &self.blocked;

        let Some(chat) = self.chats.iter_mut().find(|c| c.id == chat_id) else {
            return Outcome::Ignored;
        };

        // Reject at the boundary: the caller sees an explicit blocked state,
        // not a silently dropped message.
        if chat.participants.iter().any(|p| blocked.contains(p)) {
            return Outcome::Blocked;
        }

        let message = Message::new(sender, content);
        let message_id = message.id;
        chat.messages.push(message);

        // Your own sends never bump your unread counter; messages arriving
        // in a chat you are not looking at do.
        if sender != owner && selected != Some(chat_id) {
            chat.unread += 1;
        }

        Outcome::Sent(message_id)
    }

    pub fn edit_message(&mut self, chat_id: Uuid, message_id: Uuid, content: String) -> Outcome {
        let Some(chat) = self.chat_mut(chat_id) else {
            return Outcome::Ignored;
        };
        match chat.message_mut(message_id) {
            Some(message) => {
                message.content = content;
                Outcome::Applied
            }
            None => Outcome::Ignored,
        }
    }

    /// Deleting a message also drops it from the chat's pinned set, so the
    /// pinned set only ever references messages that are present.
    pub fn delete_message(&mut self, chat_id: Uuid, message_id: Uuid) -> Outcome {
        let Some(chat) = self.chat_mut(chat_id) else {
            return Outcome::Ignored;
        };
        let before = chat.messages.len();
        chat.messages.retain(|m| m.id != message_id);
        if chat.messages.len() == before {
            return Outcome::Ignored;
        }
        chat.pinned.remove(&message_id);
        Outcome::Applied
    }

    /// Toggle semantics: a user is either in the emoji's user-set or not.
    /// The entry is created on the first user and removed with the last one.
    pub fn toggle_reaction(
        &mut self,
        chat_id: Uuid,
        message_id: Uuid,
        emoji: &str,
        user_id: Uuid,
    ) -> Outcome {
        if !self.users.contains_key(&user_id) {
            return Outcome::Ignored;
        }
        let Some(message) = self
            .chat_mut(chat_id)
            .and_then(|c| c.message_mut(message_id))
        else {
            return Outcome::Ignored;
        };

        let users = message.reactions.entry(emoji.to_string()).or_default();
        if !users.insert(user_id) {
            users.remove(&user_id);
            if users.is_empty() {
                message.reactions.remove(emoji);
            }
        }
        Outcome::Applied
    }

    pub fn toggle_pin(&mut self, chat_id: Uuid, message_id: Uuid) -> Outcome {
        let Some(chat) = self.chat_mut(chat_id) else {
            return Outcome::Ignored;
        };
        // Only messages actually in the chat can be pinned.
        if chat.message(message_id).is_none() {
            return Outcome::Ignored;
        }
        if !chat.pinned.insert(message_id) {
            chat.pinned.remove(&message_id);
        }
        Outcome::Applied
    }

    /// Adding a contact opens (or re-selects) a direct chat with them.
    pub fn add_contact(&mut self, user: User) -> Outcome {
        let user_id = user.id;

        if let Some(existing) = self
            .chats
            .iter()
            .find(|c| c.kind == ChatKind::Direct && c.participants.contains(&user_id))
            .map(|c| c.id)
        {
            return self.select_chat(existing);
        }

        let chat = Chat::direct(
            user.name.clone(),
            Some(user.avatar.clone()).filter(|a| !a.is_empty()),
            vec![self.owner, user_id],
        );
        let chat_id = chat.id;

        self.users.insert(user_id, user);
        if !self.contacts.contains(&user_id) {
            self.contacts.push(user_id);
        }
        self.chats.push(chat);
        self.select_chat(chat_id)
    }

    /// Group names are normalized to a leading `#`.
    pub fn add_group(&mut self, name: &str) -> Outcome {
        let name = if name.starts_with('#') {
            name.to_string()
        } else {
            format!("#{}", name)
        };
        let chat = Chat::group(name);
        let chat_id = chat.id;
        self.chats.push(chat);
        self.select_chat(chat_id)
    }

    pub fn set_chat_avatar(&mut self, chat_id: Uuid, avatar: String) -> Outcome {
        match self.chat_mut(chat_id) {
            Some(chat) => {
                chat.avatar = Some(avatar);
                Outcome::Applied
            }
            None => Outcome::Ignored,
        }
    }

    pub fn block_user(&mut self, user_id: Uuid) -> Outcome {
        self.blocked.insert(user_id);
        Outcome::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wave_types::models::{Chat, User};

    fn user(name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            phone_number: format!("+1555{:07}", name.len()),
            avatar: String::new(),
            online: true,
            last_seen: Utc::now(),
        }
    }

    /// Owner "you", contacts Alice and Bob, one group chat and one direct
    /// chat with Alice. Returns (store, you, alice, bob, group_chat_id).
    fn fixture() -> (ChatStore, Uuid, Uuid, Uuid, Uuid) {
        let you = user("You");
        let alice = user("Alice");
        let bob = user("Bob");
        let (you_id, alice_id, bob_id) = (you.id, alice.id, bob.id);

        let group = Chat::group("#general");
        let direct = Chat::direct("Alice", None, vec![you_id, alice_id]);
        let group_id = group.id;

        let store = ChatStore::new(you, vec![alice, bob], vec![group, direct]);
        (store, you_id, alice_id, bob_id, group_id)
    }

    fn direct_chat_id(store: &ChatStore) -> Uuid {
        store
            .chats()
            .iter()
            .find(|c| c.kind == ChatKind::Direct)
            .unwrap()
            .id
    }

    #[test]
    fn send_appends_message_with_empty_reactions() {
        let (mut store, you, _alice, _bob, group) = fixture();

        let before = store.chat(group).unwrap().messages.len();
        let outcome = store.send_message(group, you, "hi".to_string());

        let chat = store.chat(group).unwrap();
        assert_eq!(chat.messages.len(), before + 1);
        let msg = chat.messages.last().unwrap();
        assert_eq!(msg.sender, you);
        assert_eq!(msg.content, "hi");
        assert!(msg.reactions.is_empty());
        assert_eq!(outcome, Outcome::Sent(msg.id));
    }

    #[test]
    fn own_sends_never_bump_unread_foreign_sends_do() {
        let (mut store, you, alice, _bob, group) = fixture();

        store.send_message(group, you, "mine".into());
        assert_eq!(store.chat(group).unwrap().unread, 0);

        // group is not selected, so Alice's message counts as unread
        store.send_message(group, alice, "hers".into());
        assert_eq!(store.chat(group).unwrap().unread, 1);

        // once selected, further messages are read immediately
        store.select_chat(group);
        store.send_message(group, alice, "more".into());
        assert_eq!(store.chat(group).unwrap().unread, 0);
    }

    #[test]
    fn select_zeroes_unread_regardless_of_prior_value() {
        let (mut store, _you, alice, _bob, group) = fixture();

        store.send_message(group, alice, "one".into());
        store.send_message(group, alice, "two".into());
        assert_eq!(store.chat(group).unwrap().unread, 2);

        store.select_chat(group);
        assert_eq!(store.chat(group).unwrap().unread, 0);

        // selecting an already-read chat is still fine
        store.select_chat(group);
        assert_eq!(store.chat(group).unwrap().unread, 0);
    }

    #[test]
    fn edit_replaces_content_and_ignores_unknown_ids() {
        let (mut store, you, _alice, _bob, group) = fixture();

        let Outcome::Sent(msg_id) = store.send_message(group, you, "tpyo".into()) else {
            panic!("send failed");
        };

        assert_eq!(store.edit_message(group, msg_id, "typo".into()), Outcome::Applied);
        assert_eq!(store.chat(group).unwrap().message(msg_id).unwrap().content, "typo");

        assert_eq!(
            store.edit_message(group, Uuid::new_v4(), "x".into()),
            Outcome::Ignored
        );
        assert_eq!(
            store.edit_message(Uuid::new_v4(), msg_id, "x".into()),
            Outcome::Ignored
        );
    }

    #[test]
    fn delete_removes_message_and_pin() {
        let (mut store, you, _alice, _bob, group) = fixture();

        let Outcome::Sent(msg_id) = store.send_message(group, you, "pin me".into()) else {
            panic!("send failed");
        };
        store.toggle_pin(group, msg_id);
        assert!(store.chat(group).unwrap().pinned.contains(&msg_id));

        assert_eq!(store.delete_message(group, msg_id), Outcome::Applied);
        let chat = store.chat(group).unwrap();
        assert!(chat.message(msg_id).is_none());
        assert!(!chat.pinned.contains(&msg_id));
    }

    #[test]
    fn reaction_toggle_round_trips() {
        let (mut store, you, _alice, bob, group) = fixture();

        let Outcome::Sent(msg_id) = store.send_message(group, you, "react to me".into()) else {
            panic!("send failed");
        };

        // first toggle creates the entry with exactly this user
        store.toggle_reaction(group, msg_id, "👍", bob);
        let msg = store.chat(group).unwrap().message(msg_id).unwrap();
        assert_eq!(msg.reactions.len(), 1);
        let users = msg.reactions.get("👍").unwrap();
        assert_eq!(users.len(), 1);
        assert!(users.contains(&bob));

        // second toggle by the same user removes the entry entirely
        store.toggle_reaction(group, msg_id, "👍", bob);
        let msg = store.chat(group).unwrap().message(msg_id).unwrap();
        assert!(msg.reactions.is_empty());
    }

    #[test]
    fn reaction_entry_never_observed_empty() {
        let (mut store, you, alice, bob, group) = fixture();

        let Outcome::Sent(msg_id) = store.send_message(group, you, "hello".into()) else {
            panic!("send failed");
        };

        store.toggle_reaction(group, msg_id, "❤️", alice);
        store.toggle_reaction(group, msg_id, "❤️", bob);
        store.toggle_reaction(group, msg_id, "❤️", alice);

        let msg = store.chat(group).unwrap().message(msg_id).unwrap();
        let users = msg.reactions.get("❤️").unwrap();
        assert_eq!(users.len(), 1);
        assert!(users.contains(&bob));

        store.toggle_reaction(group, msg_id, "❤️", bob);
        let msg = store.chat(group).unwrap().message(msg_id).unwrap();
        assert!(!msg.reactions.contains_key("❤️"));
        // no entry in the projection either
        assert!(msg.reaction_groups().is_empty());
    }

    #[test]
    fn one_entry_per_emoji() {
        let (mut store, you, alice, bob, group) = fixture();

        let Outcome::Sent(msg_id) = store.send_message(group, you, "hey".into()) else {
            panic!("send failed");
        };

        store.toggle_reaction(group, msg_id, "👋", alice);
        store.toggle_reaction(group, msg_id, "👋", bob);

        let msg = store.chat(group).unwrap().message(msg_id).unwrap();
        assert_eq!(msg.reactions.len(), 1);
        assert_eq!(msg.reactions.get("👋").unwrap().len(), 2);
    }

    #[test]
    fn pin_toggle_and_unknown_message() {
        let (mut store, you, _alice, _bob, group) = fixture();

        let Outcome::Sent(msg_id) = store.send_message(group, you, "important".into()) else {
            panic!("send failed");
        };

        assert_eq!(store.toggle_pin(group, msg_id), Outcome::Applied);
        assert!(store.chat(group).unwrap().pinned.contains(&msg_id));
        assert_eq!(store.toggle_pin(group, msg_id), Outcome::Applied);
        assert!(store.chat(group).unwrap().pinned.is_empty());

        // a message id not present in the chat cannot enter the pinned set
        assert_eq!(store.toggle_pin(group, Uuid::new_v4()), Outcome::Ignored);
    }

    #[test]
    fn blocked_participant_rejects_send() {
        let (mut store, you, alice, _bob, _group) = fixture();
        let direct = direct_chat_id(&store);

        store.block_user(alice);
        assert_eq!(
            store.send_message(direct, you, "anyone there?".into()),
            Outcome::Blocked
        );
        assert!(store.chat(direct).unwrap().messages.is_empty());
    }

    #[test]
    fn add_contact_creates_and_selects_direct_chat() {
        let (mut store, you, _alice, _bob, _group) = fixture();

        let dana = user("Dana");
        let dana_id = dana.id;
        store.add_contact(dana.clone());

        let chat = store.selected_chat().unwrap();
        let chat_id = chat.id;
        assert_eq!(chat.kind, ChatKind::Direct);
        assert_eq!(chat.name, "Dana");
        assert!(chat.participants.contains(&you));
        assert!(chat.participants.contains(&dana_id));
        assert!(chat.messages.is_empty());
        assert!(store.contacts().contains(&dana_id));

        // adding the same contact again reuses the existing chat
        let count = store.chats().len();
        store.add_contact(dana);
        assert_eq!(store.chats().len(), count);
        assert_eq!(store.selected_chat().unwrap().id, chat_id);
    }

    #[test]
    fn add_group_prefixes_hash() {
        let (mut store, _you, _alice, _bob, _group) = fixture();

        store.add_group("design");
        assert_eq!(store.selected_chat().unwrap().name, "#design");
        assert!(store.selected_chat().unwrap().messages.is_empty());

        store.add_group("#ops");
        assert_eq!(store.selected_chat().unwrap().name, "#ops");
    }

    #[test]
    fn set_chat_avatar_replaces_reference() {
        let (mut store, _you, _alice, _bob, group) = fixture();

        store.set_chat_avatar(group, "https://example.com/g.png".into());
        assert_eq!(
            store.chat(group).unwrap().avatar.as_deref(),
            Some("https://example.com/g.png")
        );
    }

    #[test]
    fn unknown_sender_is_ignored() {
        let (mut store, _you, _alice, _bob, group) = fixture();

        assert_eq!(
            store.send_message(group, Uuid::new_v4(), "ghost".into()),
            Outcome::Ignored
        );
        assert!(store.chat(group).unwrap().messages.is_empty());
    }

    #[test]
    fn apply_dispatches_actions() {
        let (mut store, you, _alice, _bob, group) = fixture();

        let outcome = store.apply(ChatAction::SendMessage {
            chat_id: group,
            sender: you,
            content: "via action".into(),
        });
        let Outcome::Sent(msg_id) = outcome else {
            panic!("expected send");
        };

        store.apply(ChatAction::ToggleReaction {
            chat_id: group,
            message_id: msg_id,
            emoji: "🎉".into(),
            user_id: you,
        });
        assert!(store
            .chat(group)
            .unwrap()
            .message(msg_id)
            .unwrap()
            .reactions
            .contains_key("🎉"));

        store.apply(ChatAction::DeleteMessage { chat_id: group, message_id: msg_id });
        assert!(store.chat(group).unwrap().message(msg_id).is_none());
    }

    #[test]
    fn actions_round_trip_through_serde() {
        let action = ChatAction::AddGroup { name: "design".into() };
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("\"add_group\""));
        let back: ChatAction = serde_json::from_str(&json).unwrap();
        match back {
            ChatAction::AddGroup { name } => assert_eq!(name, "design"),
            other => panic!("unexpected action: {:?}", other),
        }
    }
}
