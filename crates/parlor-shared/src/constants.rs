/// Application name
pub const APP_NAME: &str = "Parlor";

/// Placeholder shown for a room or user id that is not cached (yet)
pub const UNKNOWN_NAME: &str = "Unknown";

/// Subtitle of a direct conversation header
pub const DIRECT_MESSAGE_SUBTITLE: &str = "Direct Message";

/// Prefix the server puts in front of the original name of a shared file
pub const SHARED_FILE_PREFIX: &str = "Shared file: ";

/// Static path under which uploaded files are served
pub const UPLOADS_PATH: &str = "/uploads";

/// Attachments with these extensions are shown inline
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// Extensions the server accepts for upload
pub const ALLOWED_EXTENSIONS: &[&str] = &["txt", "pdf", "png", "jpg", "jpeg", "gif", "doc", "docx"];

/// Maximum upload size in bytes (16 MiB)
pub const MAX_UPLOAD_SIZE: usize = 16 * 1024 * 1024;

/// How long a notification stays fully visible, in milliseconds
pub const NOTIFICATION_DISPLAY_MS: u64 = 3_000;

/// Fade-out transition after the display interval, in milliseconds
pub const NOTIFICATION_FADE_MS: u64 = 300;

/// Default REST/realtime server
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
