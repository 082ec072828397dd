//! Conversation session coordinator.
//!
//! A synchronous state machine over [`SessionState`]. Every input (realtime
//! event, user action, REST completion) runs to completion and returns the
//! [`Effect`]s the driver must carry out. The coordinator performs no I/O of
//! its own, so every transition is deterministic and testable in isolation.

use tracing::{debug, info, warn};
use uuid::Uuid;

use parlor_shared::constants::DIRECT_MESSAGE_SUBTITLE;
use parlor_shared::{
    ActiveConversation, ClientEvent, ConversationTarget, DirectMessagePayload, MessageRecord,
    RoomId, RoomMessagePayload, ServerEvent, UserId, ValidationError,
};

use crate::backend::{BackendRequest, BackendResponse, LocalFile, NewRoom};
use crate::config::ClientConfig;
use crate::notify::Notification;
use crate::state::{PendingUpload, Session, SessionState};

/// Work requested by the coordinator.
#[derive(Debug)]
pub enum Effect {
    /// Send a frame on the realtime channel.
    Emit(ClientEvent),
    /// Start a REST call; its [`BackendResponse`] must be fed back via
    /// [`Coordinator::apply`].
    Request(BackendRequest),
    /// Surface a notification.
    Notify(Notification),
    /// State visible to the frontend changed.
    Render,
}

/// Local checks applied before an upload reaches the network.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_size: usize,
    pub allowed_extensions: Vec<String>,
}

impl UploadPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            max_size: config.max_upload_size,
            allowed_extensions: config.allowed_extensions.clone(),
        }
    }

    pub fn check(&self, file: &LocalFile) -> Result<(), ValidationError> {
        if file.name.trim().is_empty() {
            return Err(ValidationError::NoFileSelected);
        }
        if file.bytes.len() > self.max_size {
            return Err(ValidationError::FileTooLarge {
                size: file.bytes.len(),
                max: self.max_size,
            });
        }
        match file.extension() {
            Some(ext) if self.allowed_extensions.iter().any(|a| *a == ext) => Ok(()),
            _ => Err(ValidationError::FileTypeNotAllowed(file.name.clone())),
        }
    }
}

pub struct Coordinator {
    state: SessionState,
    uploads: UploadPolicy,
}

impl Coordinator {
    pub fn new(config: &ClientConfig) -> Self {
        if config.username.is_empty() {
            warn!(
                "No username configured, own messages are recognised once the user directory loads"
            );
        }
        Self {
            state: SessionState::new(config.username.clone()),
            uploads: UploadPolicy::from_config(config),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    // -----------------------------------------------------------------------
    // Realtime events
    // -----------------------------------------------------------------------

    /// Single entry point for everything the realtime channel delivers.
    pub fn handle(&mut self, event: ServerEvent) -> Vec<Effect> {
        debug!(event = event.name(), "Realtime event");
        match event {
            ServerEvent::Connect => self.connect(),
            ServerEvent::Connected { user_id } => self.on_connected(user_id),
            ServerEvent::Message(payload) => self.handle_room_message(payload),
            ServerEvent::DirectMessage(payload) => self.handle_direct_message(payload),
            ServerEvent::ChatHistory { messages } => self.handle_chat_history(messages),
            ServerEvent::Error { message } => self.on_server_error(message),
            ServerEvent::Disconnect => self.on_disconnect(),
        }
    }

    /// The realtime channel is up: refresh rooms, users and unread counts.
    ///
    /// The three refreshes complete in any order. If a room was open when the
    /// channel dropped, membership is re-established.
    pub fn connect(&mut self) -> Vec<Effect> {
        self.state.connected = true;
        info!("Realtime channel connected");

        let mut effects = vec![
            Effect::Request(BackendRequest::ListRooms),
            Effect::Request(BackendRequest::ListUsers),
            Effect::Request(BackendRequest::UnreadCounts),
        ];
        if let Some(room_id) = self.state.active.room() {
            info!(room = %room_id, "Rejoining room after reconnect");
            effects.push(Effect::Emit(ClientEvent::Join {
                room_id: room_id.clone(),
            }));
        }
        effects.push(Effect::Render);
        effects
    }

    fn on_connected(&mut self, user_id: UserId) -> Vec<Effect> {
        match &self.state.session {
            Some(session) if session.user_id != user_id => {
                warn!(
                    current = %session.user_id,
                    received = %user_id,
                    "Server reported a different identity, keeping the first one"
                );
                Vec::new()
            }
            Some(_) => Vec::new(),
            None => {
                let username = self.resolve_own_username(&user_id);
                info!(user = %user_id, username = %username, "Session established");
                self.state.session = Some(Session { user_id, username });
                vec![Effect::Render]
            }
        }
    }

    /// Name the server knows us by. The directory entry for our id wins over
    /// the configured name.
    fn resolve_own_username(&self, user_id: &UserId) -> String {
        let configured = self.state.username.as_str();
        match self.state.user(user_id) {
            Some(entry) if configured.is_empty() => entry.username.clone(),
            Some(entry) if entry.username != configured => {
                warn!(
                    configured = %configured,
                    directory = %entry.username,
                    "Configured username differs from the directory, using the directory"
                );
                entry.username.clone()
            }
            Some(_) => configured.to_string(),
            None => {
                debug!(user = %user_id, "Own user not in the directory yet");
                configured.to_string()
            }
        }
    }

    pub fn handle_room_message(&mut self, payload: RoomMessagePayload) -> Vec<Effect> {
        if !self.state.connected {
            debug!("Dropping room message received while disconnected");
            return Vec::new();
        }

        let Some(active_room) = self.state.active.room() else {
            warn!(
                author = %payload.username,
                "Room message delivered with no room open, dropping"
            );
            return Vec::new();
        };
        if let Some(room_id) = payload.room_id.as_ref().filter(|id| *id != active_room) {
            warn!(
                room = %room_id,
                active = %active_room,
                "Room message for a room we are not in, dropping"
            );
            return Vec::new();
        }

        let record = MessageRecord::from(payload);
        let own = self.state.own_username().to_string();
        self.state.view.push_message(record, &own);
        vec![Effect::Render]
    }

    fn handle_chat_history(&mut self, messages: Vec<RoomMessagePayload>) -> Vec<Effect> {
        if self.state.active.room().is_none() {
            warn!(count = messages.len(), "Chat history with no room open, dropping");
            return Vec::new();
        }

        let records = messages.into_iter().map(MessageRecord::from).collect();
        let own = self.state.own_username().to_string();
        self.state.view.replace_messages(records, &own);
        vec![Effect::Render]
    }

    pub fn handle_direct_message(&mut self, payload: DirectMessagePayload) -> Vec<Effect> {
        if !self.state.connected {
            debug!("Dropping direct message received while disconnected");
            return Vec::new();
        }

        let outgoing = self.is_own_direct_message(&payload);
        let peer = if outgoing {
            payload
                .recipient_id
                .clone()
                .or_else(|| self.user_id_by_name(&payload.recipient_username))
        } else {
            payload
                .sender_id
                .clone()
                .or_else(|| self.user_id_by_name(&payload.sender_username))
        };

        let Some(peer) = peer else {
            // Directory not loaded yet; let the server recount for us.
            warn!(
                sender = %payload.sender_username,
                recipient = %payload.recipient_username,
                "Could not resolve direct message peer, refreshing unread counts"
            );
            return vec![Effect::Request(BackendRequest::UnreadCounts)];
        };

        if self.state.active.is_peer(&peer) {
            let record = MessageRecord::from(payload);
            let own = self.state.own_username().to_string();
            self.state.view.push_message(record, &own);
            return vec![Effect::Render];
        }

        if outgoing {
            debug!(peer = %peer, "Own direct message for a closed conversation");
            return Vec::new();
        }

        let count = self.state.unread.increment(&peer);
        debug!(peer = %peer.short(), unread = count, "Direct message for a closed conversation");
        vec![Effect::Render]
    }

    fn on_server_error(&mut self, message: String) -> Vec<Effect> {
        warn!(message = %message, "Realtime channel reported an error");
        vec![Effect::Notify(Notification::error(message))]
    }

    fn on_disconnect(&mut self) -> Vec<Effect> {
        self.state.connected = false;
        warn!("Realtime channel disconnected");
        vec![Effect::Render]
    }

    // -----------------------------------------------------------------------
    // User actions
    // -----------------------------------------------------------------------

    /// Open a listed room. Room membership is exclusive, so a different open
    /// room is left first. Opening the room that is already open does nothing.
    pub fn open_room(&mut self, room_id: &RoomId) -> Vec<Effect> {
        let Some(title) = self.state.room(room_id).map(|r| r.name.clone()) else {
            warn!(room = %room_id, "Tried to open a room that is not listed");
            return vec![Effect::Notify(Notification::error(
                ValidationError::UnknownRoom.to_string(),
            ))];
        };

        if self.state.active.room() == Some(room_id) {
            debug!(room = %room_id, "Room already open");
            return Vec::new();
        }

        let mut effects = Vec::new();
        if let ActiveConversation::Room(previous) = &self.state.active {
            info!(room = %previous, "Leaving room");
            effects.push(Effect::Emit(ClientEvent::Leave));
        }

        info!(room = %room_id, name = %title, "Joining room");
        effects.push(Effect::Emit(ClientEvent::Join {
            room_id: room_id.clone(),
        }));
        self.state.active = ActiveConversation::Room(room_id.clone());
        self.state.view.open(title, None);
        effects.push(Effect::Render);
        effects
    }

    /// Open a direct conversation: marks it read and loads its history.
    pub fn open_direct_peer(&mut self, user_id: &UserId) -> Vec<Effect> {
        let Some(title) = self.state.user(user_id).map(|u| u.username.clone()) else {
            warn!(user = %user_id, "Tried to open a user that is not listed");
            return vec![Effect::Notify(Notification::error(
                ValidationError::UnknownUser.to_string(),
            ))];
        };

        let mut effects = Vec::new();
        if let ActiveConversation::Room(previous) = &self.state.active {
            info!(room = %previous, "Leaving room for direct conversation");
            effects.push(Effect::Emit(ClientEvent::Leave));
        }

        info!(peer = %user_id, name = %title, "Opening direct conversation");
        self.state.active = ActiveConversation::DirectPeer(user_id.clone());
        self.state.unread.reset(user_id);
        self.state
            .view
            .open(title, Some(DIRECT_MESSAGE_SUBTITLE.to_string()));

        effects.push(Effect::Request(BackendRequest::MarkDirectRead {
            peer: user_id.clone(),
        }));
        effects.push(Effect::Request(BackendRequest::DirectHistory {
            peer: user_id.clone(),
        }));
        effects.push(Effect::Render);
        effects
    }

    /// Close whatever is open and go back to the welcome view.
    pub fn leave_active(&mut self) -> Vec<Effect> {
        match std::mem::take(&mut self.state.active) {
            ActiveConversation::None => Vec::new(),
            ActiveConversation::Room(room_id) => {
                info!(room = %room_id, "Leaving room");
                self.state.view.reset_idle();
                vec![Effect::Emit(ClientEvent::Leave), Effect::Render]
            }
            ActiveConversation::DirectPeer(peer) => {
                debug!(peer = %peer, "Closing direct conversation");
                self.state.view.reset_idle();
                vec![Effect::Render]
            }
        }
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.state.draft = text.into();
    }

    pub fn send_draft(&mut self) -> Vec<Effect> {
        let text = self.state.draft.clone();
        self.send_message(&text)
    }

    /// Send a message to the open conversation.
    ///
    /// Blank text is ignored. The message is not rendered here: it shows up
    /// when the server echoes it back, in server order.
    pub fn send_message(&mut self, text: &str) -> Vec<Effect> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        let event = match &self.state.active {
            ActiveConversation::None => {
                return vec![Effect::Notify(Notification::warning(
                    ValidationError::NoActiveConversation.to_string(),
                ))];
            }
            ActiveConversation::Room(_) => ClientEvent::Message {
                text: text.to_string(),
            },
            ActiveConversation::DirectPeer(peer) => ClientEvent::DirectMessage {
                recipient_id: peer.clone(),
                text: text.to_string(),
            },
        };

        self.state.draft.clear();
        vec![Effect::Emit(event), Effect::Render]
    }

    /// Upload a file to `target`, showing a placeholder until the REST call
    /// completes. The resulting message arrives later as a normal realtime
    /// event and is not correlated with the placeholder.
    pub fn upload_file(&mut self, file: LocalFile, target: ConversationTarget) -> Vec<Effect> {
        if self.state.active.target().as_ref() != Some(&target) {
            warn!(file = %file.name, target = ?target, "Upload target is not the open conversation");
            return vec![Effect::Notify(Notification::error(
                ValidationError::TargetNotOpen.to_string(),
            ))];
        }
        if let Err(e) = self.uploads.check(&file) {
            warn!(file = %file.name, error = %e, "Upload rejected");
            return vec![Effect::Notify(Notification::error(e.to_string()))];
        }

        let temp_id = Uuid::new_v4();
        info!(
            temp_id = %temp_id,
            file = %file.name,
            size = file.bytes.len(),
            "Upload started"
        );
        self.state.pending_uploads.insert(
            temp_id,
            PendingUpload {
                file_name: file.name.clone(),
                target: target.clone(),
            },
        );
        self.state.view.add_placeholder(temp_id, file.name.clone());

        vec![
            Effect::Request(BackendRequest::Upload {
                temp_id,
                file,
                target,
            }),
            Effect::Render,
        ]
    }

    /// Upload to whatever conversation is open.
    pub fn upload_to_active(&mut self, file: LocalFile) -> Vec<Effect> {
        match self.state.active.target() {
            Some(target) => self.upload_file(file, target),
            None => vec![Effect::Notify(Notification::error(
                ValidationError::NoActiveConversation.to_string(),
            ))],
        }
    }

    pub fn create_room(&mut self, name: &str, is_private: bool) -> Vec<Effect> {
        let name = name.trim();
        if name.is_empty() {
            return vec![Effect::Notify(Notification::error(
                ValidationError::EmptyRoomName.to_string(),
            ))];
        }

        info!(name = %name, is_private, "Creating room");
        vec![Effect::Request(BackendRequest::CreateRoom(NewRoom {
            room_name: name.to_string(),
            is_private,
        }))]
    }

    pub fn refresh_rooms(&mut self) -> Vec<Effect> {
        vec![Effect::Request(BackendRequest::ListRooms)]
    }

    pub fn set_upload_menu(&mut self, open: bool) -> Vec<Effect> {
        if self.state.upload_menu_open == open {
            return Vec::new();
        }
        self.state.upload_menu_open = open;
        vec![Effect::Render]
    }

    // -----------------------------------------------------------------------
    // REST completions
    // -----------------------------------------------------------------------

    pub fn apply(&mut self, response: BackendResponse) -> Vec<Effect> {
        match response {
            BackendResponse::Rooms(Ok(rooms)) => {
                debug!(count = rooms.len(), "Rooms loaded");
                self.state.rooms = rooms;
                vec![Effect::Render]
            }
            BackendResponse::Rooms(Err(e)) => {
                warn!(error = %e, "Failed to load rooms");
                vec![Effect::Notify(Notification::error("Failed to load rooms"))]
            }

            BackendResponse::Users(Ok(users)) => {
                debug!(count = users.len(), "Users loaded");
                self.state.users = users;
                self.refresh_own_username();
                vec![Effect::Render]
            }
            BackendResponse::Users(Err(e)) => {
                warn!(error = %e, "Failed to load users");
                vec![Effect::Notify(Notification::error("Failed to load users"))]
            }

            BackendResponse::UnreadCounts(Ok(counts)) => {
                debug!(peers = counts.len(), "Unread counts loaded");
                self.state.unread.merge(counts, &self.state.active);
                vec![Effect::Render]
            }
            BackendResponse::UnreadCounts(Err(e)) => {
                warn!(error = %e, "Failed to load unread counts");
                Vec::new()
            }

            BackendResponse::DirectHistory { peer, result } => {
                if !self.state.active.is_peer(&peer) {
                    info!(peer = %peer, "Discarding direct history for a conversation no longer open");
                    return Vec::new();
                }
                match result {
                    Ok(payloads) => {
                        debug!(peer = %peer, count = payloads.len(), "Direct history loaded");
                        let records = payloads.into_iter().map(MessageRecord::from).collect();
                        let own = self.state.own_username().to_string();
                        self.state.view.replace_messages(records, &own);
                        vec![Effect::Render]
                    }
                    Err(e) => {
                        warn!(peer = %peer, error = %e, "Failed to load direct messages");
                        vec![Effect::Notify(Notification::error("Failed to load messages"))]
                    }
                }
            }

            BackendResponse::MarkedRead { peer, result } => {
                if let Err(e) = result {
                    warn!(peer = %peer, error = %e, "Failed to mark direct messages read");
                }
                Vec::new()
            }

            BackendResponse::RoomCreated(Ok(created)) => {
                info!(room = %created.room_id, "Room created");
                vec![
                    Effect::Notify(Notification::success("Room created successfully")),
                    Effect::Request(BackendRequest::ListRooms),
                ]
            }
            BackendResponse::RoomCreated(Err(e)) => {
                warn!(error = %e, "Failed to create room");
                vec![Effect::Notify(Notification::error("Failed to create room"))]
            }

            BackendResponse::Uploaded { temp_id, result } => {
                if self.state.pending_uploads.remove(&temp_id).is_none() {
                    warn!(temp_id = %temp_id, "Completion for an unknown upload");
                }
                self.state.view.remove_placeholder(temp_id);

                match result {
                    Ok(receipt) => {
                        info!(temp_id = %temp_id, path = %receipt.file_path, "Upload finished");
                        self.state.upload_menu_open = false;
                        vec![
                            Effect::Notify(Notification::success("File uploaded successfully")),
                            Effect::Render,
                        ]
                    }
                    Err(e) => {
                        warn!(temp_id = %temp_id, error = %e, "Upload failed");
                        vec![
                            Effect::Notify(Notification::error("Failed to upload file")),
                            Effect::Render,
                        ]
                    }
                }
            }
        }
    }

    fn refresh_own_username(&mut self) {
        let Some(user_id) = self.state.own_user_id().cloned() else {
            return;
        };
        let username = self.resolve_own_username(&user_id);
        if let Some(session) = self.state.session.as_mut() {
            if session.username != username {
                info!(user = %user_id, username = %username, "Own username resolved");
                session.username = username;
            }
        }
    }

    fn is_own_direct_message(&self, payload: &DirectMessagePayload) -> bool {
        match (payload.sender_id.as_ref(), self.state.own_user_id()) {
            (Some(sender), Some(own)) => sender == own,
            _ => payload.sender_username == self.state.own_username(),
        }
    }

    fn user_id_by_name(&self, username: &str) -> Option<UserId> {
        self.state.user_by_name(username).map(|u| u.id.clone())
    }
}
