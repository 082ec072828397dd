use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::constants::{IMAGE_EXTENSIONS, SHARED_FILE_PREFIX, UPLOADS_PATH};

// User identity = opaque server-assigned id (a UUID string in practice)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> &str {
        let end = self.0.char_indices().nth(8).map_or(self.0.len(), |(i, _)| i);
        &self.0[..end]
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The conversation currently open in the client.
///
/// A room and a direct peer are mutually exclusive; only explicit user
/// selection (or leaving) changes this value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ActiveConversation {
    #[default]
    None,
    Room(RoomId),
    DirectPeer(UserId),
}

impl ActiveConversation {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn room(&self) -> Option<&RoomId> {
        match self {
            Self::Room(id) => Some(id),
            _ => None,
        }
    }

    pub fn peer(&self) -> Option<&UserId> {
        match self {
            Self::DirectPeer(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_peer(&self, user_id: &UserId) -> bool {
        self.peer() == Some(user_id)
    }

    /// Where an upload or message for this conversation should be addressed.
    pub fn target(&self) -> Option<ConversationTarget> {
        match self {
            Self::None => None,
            Self::Room(id) => Some(ConversationTarget::Room(id.clone())),
            Self::DirectPeer(id) => Some(ConversationTarget::Recipient(id.clone())),
        }
    }
}

/// Destination of an upload: a room or a direct recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversationTarget {
    Room(RoomId),
    Recipient(UserId),
}

/// Server-side room, as listed by `GET /api/rooms`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomSummary {
    pub id: RoomId,
    pub name: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default, with = "server_datetime")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub created_by: Option<UserId>,
}

impl RoomSummary {
    pub fn kind_label(&self) -> &'static str {
        if self.is_private {
            "Private"
        } else {
            "Public"
        }
    }
}

/// Entry of the user directory (`GET /api/users`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
}

/// Display content of a message, room or direct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageBody {
    Text(String),
    File {
        /// Server-side stored file name, resolved under `/uploads/`.
        path: String,
        /// Human-readable file name.
        label: String,
    },
}

impl MessageBody {
    pub fn from_parts(content: String, is_file: bool, file_path: Option<String>) -> Self {
        match (is_file, file_path) {
            (true, Some(path)) => {
                let label = content
                    .strip_prefix(SHARED_FILE_PREFIX)
                    .map(str::to_string)
                    .unwrap_or(content);
                Self::File { path, label }
            }
            (_, _) => Self::Text(content),
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }
}

/// Normalized message used by every conversation view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: Option<String>,
    pub author: String,
    pub timestamp: String,
    pub body: MessageBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachmentKind {
    /// Rendered inline.
    Image,
    /// Rendered as a download link.
    Download,
}

impl AttachmentKind {
    pub fn for_path(path: &str) -> Self {
        let ext = path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Self::Image
        } else {
            Self::Download
        }
    }
}

/// Static retrieval URL of an uploaded file.
pub fn file_url(server_url: &str, path: &str) -> String {
    format!("{}{}/{}", server_url.trim_end_matches('/'), UPLOADS_PATH, path)
}

/// `%Y-%m-%d %H:%M:%S`, as the server formats room timestamps.
mod server_datetime {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&dt.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            Some(s) => NaiveDateTime::parse_from_str(&s, FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_summary_from_server_json() {
        let json = r#"{"id":"r1","name":"General","is_private":false,"created_at":"2024-03-01 12:30:00"}"#;
        let room: RoomSummary = serde_json::from_str(json).unwrap();
        assert_eq!(room.id, RoomId::new("r1"));
        assert_eq!(room.kind_label(), "Public");
        assert_eq!(
            room.created_at.unwrap().format("%Y-%m-%d").to_string(),
            "2024-03-01"
        );
        assert!(room.created_by.is_none());
    }

    #[test]
    fn test_file_body_strips_shared_prefix() {
        let body = MessageBody::from_parts(
            "Shared file: report.pdf".into(),
            true,
            Some("report_1a2b3c4d.pdf".into()),
        );
        assert_eq!(
            body,
            MessageBody::File {
                path: "report_1a2b3c4d.pdf".into(),
                label: "report.pdf".into(),
            }
        );
    }

    #[test]
    fn test_file_flag_without_path_is_text() {
        let body = MessageBody::from_parts("hello".into(), true, None);
        assert_eq!(body, MessageBody::Text("hello".into()));
    }

    #[test]
    fn test_attachment_kind_by_extension() {
        assert_eq!(AttachmentKind::for_path("cat.JPG"), AttachmentKind::Image);
        assert_eq!(AttachmentKind::for_path("a.b.gif"), AttachmentKind::Image);
        assert_eq!(AttachmentKind::for_path("notes.pdf"), AttachmentKind::Download);
        assert_eq!(AttachmentKind::for_path("noext"), AttachmentKind::Download);
    }

    #[test]
    fn test_file_url() {
        assert_eq!(
            file_url("http://chat.local/", "x.png"),
            "http://chat.local/uploads/x.png"
        );
    }

    #[test]
    fn test_active_conversation_target() {
        let active = ActiveConversation::DirectPeer(UserId::new("u1"));
        assert_eq!(
            active.target(),
            Some(ConversationTarget::Recipient(UserId::new("u1")))
        );
        assert!(active.is_peer(&UserId::new("u1")));
        assert!(ActiveConversation::None.target().is_none());
    }
}
