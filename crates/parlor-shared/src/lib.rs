// Wire protocol and domain types shared by Parlor clients.

pub mod constants;
pub mod error;
pub mod protocol;
pub mod types;

pub use error::{ProtocolError, ValidationError};
pub use protocol::{ClientEvent, DirectMessagePayload, RoomMessagePayload, ServerEvent};
pub use types::{
    file_url, ActiveConversation, AttachmentKind, ConversationTarget, MessageBody, MessageRecord,
    RoomId, RoomSummary, UserId, UserSummary,
};
