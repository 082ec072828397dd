//! Client configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the client can start with zero
//! configuration against a local development server.

use std::time::Duration;

use parlor_shared::constants::{ALLOWED_EXTENSIONS, DEFAULT_SERVER_URL, MAX_UPLOAD_SIZE};

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST API and of the `/uploads` file store.
    /// Env: `PARLOR_SERVER_URL`
    /// Default: `http://127.0.0.1:5000`
    pub server_url: String,

    /// Display name of the signed-in user; used to recognise own messages.
    /// Env: `PARLOR_USERNAME`
    /// Default: empty
    pub username: String,

    /// Timeout applied to every REST request.
    /// Env: `PARLOR_REQUEST_TIMEOUT_SECS`
    /// Default: 30 s
    pub request_timeout: Duration,

    /// Largest file accepted for upload, checked before the request is sent.
    /// Env: `PARLOR_MAX_UPLOAD_BYTES`
    /// Default: 16 MiB
    pub max_upload_size: usize,

    /// Lower-case file extensions accepted for upload.
    /// Env: `PARLOR_ALLOWED_EXTENSIONS` (comma separated)
    pub allowed_extensions: Vec<String>,

    /// Capacity of the realtime and completion queues.
    /// Env: `PARLOR_EVENT_BUFFER`
    /// Default: `256`
    pub event_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            username: String::new(),
            request_timeout: Duration::from_secs(30),
            max_upload_size: MAX_UPLOAD_SIZE,
            allowed_extensions: ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            event_buffer: 256,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("PARLOR_SERVER_URL") {
            let url = url.trim().trim_end_matches('/').to_string();
            if url.starts_with("http://") || url.starts_with("https://") {
                config.server_url = url;
            } else {
                tracing::warn!(value = %url, "Invalid PARLOR_SERVER_URL, using default");
            }
        }

        if let Some(name) = lookup("PARLOR_USERNAME") {
            config.username = name.trim().to_string();
        }

        if let Some(val) = lookup("PARLOR_REQUEST_TIMEOUT_SECS") {
            match val.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(
                    value = %val,
                    "Invalid PARLOR_REQUEST_TIMEOUT_SECS, using default"
                ),
            }
        }

        if let Some(val) = lookup("PARLOR_MAX_UPLOAD_BYTES") {
            if let Ok(n) = val.trim().parse::<usize>() {
                config.max_upload_size = n;
            } else {
                tracing::warn!(value = %val, "Invalid PARLOR_MAX_UPLOAD_BYTES, using default");
            }
        }

        if let Some(val) = lookup("PARLOR_ALLOWED_EXTENSIONS") {
            let exts = parse_extension_list(&val);
            if exts.is_empty() {
                tracing::warn!(value = %val, "Empty PARLOR_ALLOWED_EXTENSIONS, using default");
            } else {
                config.allowed_extensions = exts;
            }
        }

        if let Some(val) = lookup("PARLOR_EVENT_BUFFER") {
            match val.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.event_buffer = n,
                _ => tracing::warn!(value = %val, "Invalid PARLOR_EVENT_BUFFER, using default"),
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

/// Parse `"png, .JPG,pdf"` into `["png", "jpg", "pdf"]`.
fn parse_extension_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.server_url, "http://127.0.0.1:5000");
        assert_eq!(config.max_upload_size, 16 * 1024 * 1024);
        assert!(config.allowed_extensions.contains(&"docx".to_string()));
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("PARLOR_SERVER_URL", "https://chat.example.org/"),
            ("PARLOR_USERNAME", " alice "),
            ("PARLOR_REQUEST_TIMEOUT_SECS", "5"),
            ("PARLOR_ALLOWED_EXTENSIONS", "png, .JPG"),
        ]));
        assert_eq!(config.server_url, "https://chat.example.org");
        assert_eq!(config.username, "alice");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.allowed_extensions, vec!["png", "jpg"]);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("PARLOR_SERVER_URL", "chat.example.org"),
            ("PARLOR_REQUEST_TIMEOUT_SECS", "0"),
            ("PARLOR_MAX_UPLOAD_BYTES", "lots"),
            ("PARLOR_EVENT_BUFFER", "-1"),
        ]));
        let defaults = ClientConfig::default();
        assert_eq!(config.server_url, defaults.server_url);
        assert_eq!(config.request_timeout, defaults.request_timeout);
        assert_eq!(config.max_upload_size, defaults.max_upload_size);
        assert_eq!(config.event_buffer, defaults.event_buffer);
    }

    #[test]
    fn test_parse_extension_list() {
        assert_eq!(parse_extension_list(" ,TXT,,.pdf "), vec!["txt", "pdf"]);
        assert!(parse_extension_list(",,").is_empty());
    }
}
