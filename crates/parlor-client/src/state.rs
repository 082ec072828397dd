//! Session state owned by the coordinator.
//!
//! [`SessionState`] holds everything the client knows about the current
//! session. Only the coordinator mutates it; frontends receive a shared
//! reference when asked to render.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use uuid::Uuid;

use parlor_shared::constants::UNKNOWN_NAME;
use parlor_shared::{
    ActiveConversation, ConversationTarget, RoomId, RoomSummary, UserId, UserSummary,
};

use crate::unread::UnreadCounters;
use crate::view::ConversationView;

/// Identity of the signed-in actor, fixed once the server confirms it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub username: String,
}

/// An upload whose REST call has not completed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub file_name: String,
    pub target: ConversationTarget,
}

/// One line of the user sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEntry<'a> {
    pub user: &'a UserSummary,
    pub unread: u32,
    pub active: bool,
}

/// Details shown in the room info panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub name: String,
    pub created_at: Option<NaiveDateTime>,
    pub kind: &'static str,
    pub created_by: String,
}

/// Central client state.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// `None` until the realtime channel confirms the caller's identity.
    pub session: Option<Session>,

    /// Display name of the signed-in user, known before the session exists.
    pub username: String,

    /// Whether the realtime channel is currently up.
    pub connected: bool,

    /// The open conversation.
    pub active: ActiveConversation,

    /// Cached room list, replaced wholesale on refresh.
    pub rooms: Vec<RoomSummary>,

    /// Cached user directory, replaced wholesale on refresh.
    pub users: Vec<UserSummary>,

    pub unread: UnreadCounters,

    /// In-flight uploads keyed by their temporary id.
    pub pending_uploads: HashMap<Uuid, PendingUpload>,

    pub view: ConversationView,

    /// Message input buffer.
    pub draft: String,

    /// Whether the attachment menu is shown.
    pub upload_menu_open: bool,
}

impl SessionState {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            session: None,
            username: username.into(),
            connected: false,
            active: ActiveConversation::None,
            rooms: Vec::new(),
            users: Vec::new(),
            unread: UnreadCounters::new(),
            pending_uploads: HashMap::new(),
            view: ConversationView::default(),
            draft: String::new(),
            upload_menu_open: false,
        }
    }

    pub fn room(&self, id: &RoomId) -> Option<&RoomSummary> {
        self.rooms.iter().find(|r| &r.id == id)
    }

    pub fn user(&self, id: &UserId) -> Option<&UserSummary> {
        self.users.iter().find(|u| &u.id == id)
    }

    pub fn user_by_name(&self, username: &str) -> Option<&UserSummary> {
        self.users.iter().find(|u| u.username == username)
    }

    /// Room name, or `"Unknown"` while the room list is not loaded.
    pub fn room_name(&self, id: &RoomId) -> &str {
        self.room(id).map_or(UNKNOWN_NAME, |r| r.name.as_str())
    }

    /// Username, or `"Unknown"` while the directory is not loaded.
    pub fn username_of(&self, id: &UserId) -> &str {
        self.user(id).map_or(UNKNOWN_NAME, |u| u.username.as_str())
    }

    /// Name used to recognise own messages: the session's resolved name once
    /// connected, the configured one before that.
    pub fn own_username(&self) -> &str {
        self.session
            .as_ref()
            .map_or(self.username.as_str(), |s| s.username.as_str())
    }

    pub fn own_user_id(&self) -> Option<&UserId> {
        self.session.as_ref().map(|s| &s.user_id)
    }

    /// Rooms whose name contains `query`, case-insensitively.
    pub fn filter_rooms(&self, query: &str) -> Vec<&RoomSummary> {
        let needle = query.trim().to_lowercase();
        self.rooms
            .iter()
            .filter(|r| needle.is_empty() || r.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Other users whose name contains `query`, with their unread badge.
    pub fn filter_users(&self, query: &str) -> Vec<UserEntry<'_>> {
        let needle = query.trim().to_lowercase();
        let own = self.own_user_id();
        self.users
            .iter()
            .filter(|u| Some(&u.id) != own)
            .filter(|u| needle.is_empty() || u.username.to_lowercase().contains(&needle))
            .map(|user| UserEntry {
                user,
                unread: self.unread.get(&user.id, &self.active),
                active: self.active.is_peer(&user.id),
            })
            .collect()
    }

    pub fn room_info(&self, id: &RoomId) -> Option<RoomInfo> {
        let room = self.room(id)?;
        Some(RoomInfo {
            name: room.name.clone(),
            created_at: room.created_at,
            kind: room.kind_label(),
            created_by: room
                .created_by
                .as_ref()
                .map_or(UNKNOWN_NAME, |creator| self.username_of(creator))
                .to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: &str, name: &str) -> RoomSummary {
        RoomSummary {
            id: RoomId::new(id),
            name: name.into(),
            is_private: false,
            created_at: None,
            created_by: None,
        }
    }

    fn user(id: &str, name: &str) -> UserSummary {
        UserSummary {
            id: UserId::new(id),
            username: name.into(),
        }
    }

    #[test]
    fn test_lookups_degrade_to_unknown() {
        let state = SessionState::new("alice");
        assert_eq!(state.room_name(&RoomId::new("r1")), "Unknown");
        assert_eq!(state.username_of(&UserId::new("u1")), "Unknown");
    }

    #[test]
    fn test_filter_rooms_case_insensitive() {
        let mut state = SessionState::new("alice");
        state.rooms = vec![room("1", "General"), room("2", "Random"), room("3", "gentoo")];

        let names: Vec<_> = state.filter_rooms("GEN").iter().map(|r| r.name.clone()).collect();
        assert_eq!(names, vec!["General", "gentoo"]);
        assert_eq!(state.filter_rooms("").len(), 3);
    }

    #[test]
    fn test_filter_users_excludes_self_and_carries_unread() {
        let mut state = SessionState::new("alice");
        state.session = Some(Session {
            user_id: UserId::new("u-alice"),
            username: "alice".into(),
        });
        state.users = vec![user("u-alice", "alice"), user("u-bob", "bob"), user("u-bea", "bea")];
        state.unread.increment(&UserId::new("u-bob"));
        state.active = ActiveConversation::DirectPeer(UserId::new("u-bea"));

        let entries = state.filter_users("b");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].user.username, "bob");
        assert_eq!(entries[0].unread, 1);
        assert!(entries[1].active);
    }

    #[test]
    fn test_room_info_unknown_creator() {
        let mut state = SessionState::new("alice");
        let mut private = room("1", "Ops");
        private.is_private = true;
        private.created_by = Some(UserId::new("u-zed"));
        state.rooms = vec![private];

        let info = state.room_info(&RoomId::new("1")).unwrap();
        assert_eq!(info.kind, "Private");
        assert_eq!(info.created_by, "Unknown");

        state.users = vec![user("u-zed", "zed")];
        assert_eq!(state.room_info(&RoomId::new("1")).unwrap().created_by, "zed");
        assert!(state.room_info(&RoomId::new("nope")).is_none());
    }
}
