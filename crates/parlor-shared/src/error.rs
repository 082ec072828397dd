use thiserror::Error;

/// Input rejected locally, before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Room name is required")]
    EmptyRoomName,

    #[error("Select a room or user first")]
    NoActiveConversation,

    #[error("Room not found")]
    UnknownRoom,

    #[error("User not found")]
    UnknownUser,

    #[error("Upload target is not the open conversation")]
    TargetNotOpen,

    #[error("No file selected")]
    NoFileSelected,

    #[error("File too large: {size} bytes (max {max})")]
    FileTooLarge { size: usize, max: usize },

    #[error("File type not allowed: {0}")]
    FileTypeNotAllowed(String),
}

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Failed to decode frame: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),
}
