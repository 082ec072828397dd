//! Realtime channel frames and the message payloads they carry.
//!
//! Every frame on the wire is a JSON object `{"event": <name>, "data": <payload>}`.
//! Unit events (`connect`, `leave`, ...) omit `data`.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::types::{MessageBody, MessageRecord, RoomId, UserId};

/// Events received from the realtime channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Transport-level connection established.
    Connect,

    /// Server confirmed the caller's identity.
    Connected { user_id: UserId },

    /// Room broadcast.
    Message(RoomMessagePayload),

    /// Direct message, delivered to both sender and recipient.
    DirectMessage(DirectMessagePayload),

    /// Recent room history, sent right after a join.
    ChatHistory { messages: Vec<RoomMessagePayload> },

    /// Server-side failure for the last request.
    Error { message: String },

    /// Transport-level connection lost.
    Disconnect,
}

/// Events sent on the realtime channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Become a member of a room (a session is in at most one room).
    Join { room_id: RoomId },

    /// Leave the current room.
    Leave,

    /// Message to the joined room; the server routes it by membership.
    Message { text: String },

    /// Message to a single user.
    DirectMessage { recipient_id: UserId, text: String },
}

/// A room message as serialized by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomMessagePayload {
    #[serde(default)]
    pub id: Option<String>,
    pub content: String,
    pub timestamp: String,
    #[serde(default)]
    pub date: Option<String>,
    pub username: String,
    #[serde(default)]
    pub is_file: bool,
    #[serde(default)]
    pub file_path: Option<String>,
    /// Not sent by every server; membership normally implies the room.
    #[serde(default)]
    pub room_id: Option<RoomId>,
}

/// A direct message as serialized by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectMessagePayload {
    #[serde(default)]
    pub id: Option<String>,
    pub content: String,
    pub timestamp: String,
    #[serde(default)]
    pub date: Option<String>,
    pub sender_username: String,
    pub recipient_username: String,
    #[serde(default)]
    pub sender_id: Option<UserId>,
    #[serde(default)]
    pub recipient_id: Option<UserId>,
    #[serde(default)]
    pub is_file: bool,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub is_read: bool,
}

impl From<RoomMessagePayload> for MessageRecord {
    fn from(p: RoomMessagePayload) -> Self {
        Self {
            id: p.id,
            author: p.username,
            timestamp: p.timestamp,
            body: MessageBody::from_parts(p.content, p.is_file, p.file_path),
        }
    }
}

impl From<DirectMessagePayload> for MessageRecord {
    fn from(p: DirectMessagePayload) -> Self {
        Self {
            id: p.id,
            author: p.sender_username,
            timestamp: p.timestamp,
            body: MessageBody::from_parts(p.content, p.is_file, p.file_path),
        }
    }
}

impl ServerEvent {
    /// Parse one JSON frame.
    pub fn from_json(frame: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(frame).map_err(ProtocolError::Decode)
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Connected { .. } => "connected",
            Self::Message(_) => "message",
            Self::DirectMessage(_) => "direct_message",
            Self::ChatHistory { .. } => "chat_history",
            Self::Error { .. } => "error",
            Self::Disconnect => "disconnect",
        }
    }
}

impl ClientEvent {
    pub fn from_json(frame: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(frame).map_err(ProtocolError::Decode)
    }

    /// Serialize to one JSON frame.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Leave => "leave",
            Self::Message { .. } => "message",
            Self::DirectMessage { .. } => "direct_message",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_connected() {
        let ev = ServerEvent::from_json(r#"{"event":"connected","data":{"user_id":"abc"}}"#)
            .unwrap();
        assert_eq!(
            ev,
            ServerEvent::Connected {
                user_id: UserId::new("abc")
            }
        );
    }

    #[test]
    fn test_decode_unit_events() {
        assert_eq!(
            ServerEvent::from_json(r#"{"event":"connect"}"#).unwrap(),
            ServerEvent::Connect
        );
        assert_eq!(
            ServerEvent::from_json(r#"{"event":"disconnect"}"#).unwrap(),
            ServerEvent::Disconnect
        );
    }

    #[test]
    fn test_decode_system_room_message_without_id() {
        // The server's join/leave notices carry only these three fields.
        let frame = r#"{"event":"message","data":{"username":"System","content":"bob has left the room.","timestamp":"10:00:00"}}"#;
        let ServerEvent::Message(payload) = ServerEvent::from_json(frame).unwrap() else {
            panic!("expected a room message");
        };
        assert!(payload.id.is_none());
        assert!(!payload.is_file);

        let record = MessageRecord::from(payload);
        assert_eq!(record.author, "System");
        assert_eq!(record.body, MessageBody::Text("bob has left the room.".into()));
    }

    #[test]
    fn test_decode_direct_file_message() {
        let frame = r#"{"event":"direct_message","data":{
            "id":"m1","content":"Shared file: cat.png","timestamp":"09:15:02","date":"2024-03-01",
            "sender_username":"alice","recipient_username":"bob",
            "is_file":true,"file_path":"cat_0011aabb.png","is_read":false}}"#;
        let ServerEvent::DirectMessage(payload) = ServerEvent::from_json(frame).unwrap() else {
            panic!("expected a direct message");
        };
        let record = MessageRecord::from(payload);
        assert_eq!(record.author, "alice");
        assert!(record.body.is_file());
    }

    #[test]
    fn test_decode_chat_history() {
        let frame = r#"{"event":"chat_history","data":{"messages":[
            {"content":"a","timestamp":"1","username":"x"},
            {"content":"b","timestamp":"2","username":"y"}]}}"#;
        match ServerEvent::from_json(frame).unwrap() {
            ServerEvent::ChatHistory { messages } => assert_eq!(messages.len(), 2),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let err = ServerEvent::from_json(r#"{"event":"typing","data":{}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn test_encode_client_events() {
        let join = ClientEvent::Join {
            room_id: RoomId::new("r7"),
        };
        let json: serde_json::Value = serde_json::from_str(&join.to_json().unwrap()).unwrap();
        assert_eq!(json["event"], "join");
        assert_eq!(json["data"]["room_id"], "r7");

        let leave: serde_json::Value =
            serde_json::from_str(&ClientEvent::Leave.to_json().unwrap()).unwrap();
        assert_eq!(leave["event"], "leave");

        let dm = ClientEvent::DirectMessage {
            recipient_id: UserId::new("u2"),
            text: "hi".into(),
        };
        let json: serde_json::Value = serde_json::from_str(&dm.to_json().unwrap()).unwrap();
        assert_eq!(json["data"]["recipient_id"], "u2");
        assert_eq!(dm.name(), "direct_message");
    }
}
