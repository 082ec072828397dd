//! reqwest implementation of [`Backend`].

use std::collections::HashMap;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use parlor_shared::{ConversationTarget, DirectMessagePayload, RoomSummary, UserId, UserSummary};

use crate::backend::{Backend, CreatedRoom, LocalFile, NewRoom, UploadReceipt};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Error body returned by the server on failure.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.server_url)
            .map_err(|e| ClientError::Config(format!("server URL {}: {e}", config.server_url)))?;
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::Config(format!("bad request path {path}: {e}")))
    }

    fn direct_url(&self, peer: &UserId, suffix: &str) -> Result<Url> {
        let mut url = self.url("/api/direct-messages")?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Config("server URL cannot be a base".into()))?
            .push(peer.as_str())
            .extend(suffix.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(url = %url, "GET");
        let resp = self.client.get(url).send().await?;
        Ok(check_status(resp).await?.json().await?)
    }
}

/// Turn a non-2xx response into [`ClientError::Status`], keeping the
/// server's error text when it sent one.
async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}

impl Backend for HttpBackend {
    async fn list_rooms(&self) -> Result<Vec<RoomSummary>> {
        self.get_json(self.url("/api/rooms")?).await
    }

    async fn list_users(&self) -> Result<Vec<UserSummary>> {
        self.get_json(self.url("/api/users")?).await
    }

    async fn unread_counts(&self) -> Result<HashMap<UserId, u32>> {
        self.get_json(self.url("/api/direct-messages/unread")?).await
    }

    async fn direct_history(&self, peer: &UserId) -> Result<Vec<DirectMessagePayload>> {
        self.get_json(self.direct_url(peer, "")?).await
    }

    async fn mark_direct_read(&self, peer: &UserId) -> Result<()> {
        let url = self.direct_url(peer, "read")?;
        debug!(url = %url, "POST");
        let resp = self.client.post(url).send().await?;
        check_status(resp).await?;
        Ok(())
    }

    async fn create_room(&self, room: &NewRoom) -> Result<CreatedRoom> {
        let url = self.url("/api/rooms")?;
        debug!(url = %url, name = %room.room_name, "POST");
        let resp = self.client.post(url).json(room).send().await?;
        Ok(check_status(resp).await?.json().await?)
    }

    async fn upload_file(
        &self,
        file: &LocalFile,
        target: &ConversationTarget,
    ) -> Result<UploadReceipt> {
        let url = self.url("/api/upload")?;
        debug!(url = %url, file = %file.name, size = file.bytes.len(), "POST multipart");

        let part = Part::bytes(file.bytes.clone()).file_name(file.name.clone());
        let form = Form::new().part("file", part);
        let form = match target {
            ConversationTarget::Room(room_id) => form.text("room_id", room_id.to_string()),
            ConversationTarget::Recipient(user_id) => {
                form.text("recipient_id", user_id.to_string())
            }
        };

        let resp = self.client.post(url).multipart(form).send().await?;
        Ok(check_status(resp).await?.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Multipart, Path, State};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;
    use parlor_shared::RoomId;

    #[derive(Clone, Default)]
    struct Recorded {
        marked: Arc<Mutex<Vec<String>>>,
        uploads: Arc<Mutex<Vec<(String, String, usize)>>>,
    }

    async fn rooms() -> Json<Value> {
        Json(json!([
            {"id": "r1", "name": "General", "is_private": false, "created_at": "2024-03-01 10:00:00", "created_by": "u1"},
            {"id": "r2", "name": "Ops"}
        ]))
    }

    async fn users() -> Json<Value> {
        Json(json!([{"id": "u1", "username": "alice"}, {"id": "u2", "username": "bob"}]))
    }

    async fn unread() -> Json<Value> {
        Json(json!({"u2": 3}))
    }

    async fn history(Path(peer): Path<String>) -> (StatusCode, Json<Value>) {
        if peer != "u2" {
            return (StatusCode::NOT_FOUND, Json(json!({"error": "User not found"})));
        }
        (
            StatusCode::OK,
            Json(json!([{
                "id": "m1",
                "content": "hi",
                "timestamp": "10:00:00",
                "sender_username": "bob",
                "recipient_username": "alice",
                "is_file": false,
                "is_read": true
            }])),
        )
    }

    async fn mark_read(State(rec): State<Recorded>, Path(peer): Path<String>) -> Json<Value> {
        rec.marked.lock().unwrap().push(peer);
        Json(json!({"message": "ok"}))
    }

    async fn create(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if body["room_name"] == "General" {
            return (StatusCode::CONFLICT, Json(json!({"error": "Room already exists"})));
        }
        (
            StatusCode::CREATED,
            Json(json!({"message": "Room created successfully", "room_id": "r9"})),
        )
    }

    async fn upload(State(rec): State<Recorded>, mut form: Multipart) -> Json<Value> {
        let mut target = String::new();
        let mut name = String::new();
        let mut size = 0;
        while let Some(field) = form.next_field().await.unwrap() {
            let key = field.name().unwrap_or_default().to_string();
            match key.as_str() {
                "file" => {
                    name = field.file_name().unwrap_or_default().to_string();
                    size = field.bytes().await.unwrap().len();
                }
                _ => target = format!("{key}={}", field.text().await.unwrap()),
            }
        }
        rec.uploads.lock().unwrap().push((target, name.clone(), size));
        Json(json!({"message": "File uploaded successfully", "file_path": format!("stored_{name}")}))
    }

    async fn spawn_server() -> (HttpBackend, Recorded) {
        let rec = Recorded::default();
        let app = Router::new()
            .route("/api/rooms", get(rooms).post(create))
            .route("/api/users", get(users))
            .route("/api/direct-messages/unread", get(unread))
            .route("/api/direct-messages/:peer", get(history))
            .route("/api/direct-messages/:peer/read", post(mark_read))
            .route("/api/upload", post(upload))
            .with_state(rec.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = ClientConfig {
            server_url: format!("http://{addr}"),
            ..ClientConfig::default()
        };
        (HttpBackend::new(&config).unwrap(), rec)
    }

    #[tokio::test]
    async fn test_lists_and_unread() {
        let (backend, _) = spawn_server().await;

        let rooms = backend.list_rooms().await.unwrap();
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0].id, RoomId::new("r1"));
        assert!(rooms[0].created_at.is_some());
        assert_eq!(rooms[1].kind_label(), "Public");

        let users = backend.list_users().await.unwrap();
        assert_eq!(users[1].username, "bob");

        let counts = backend.unread_counts().await.unwrap();
        assert_eq!(counts.get(&UserId::new("u2")), Some(&3));
    }

    #[tokio::test]
    async fn test_direct_history_and_mark_read() {
        let (backend, rec) = spawn_server().await;

        let history = backend.direct_history(&UserId::new("u2")).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].sender_username, "bob");

        backend.mark_direct_read(&UserId::new("u2")).await.unwrap();
        assert_eq!(*rec.marked.lock().unwrap(), vec!["u2".to_string()]);
    }

    #[tokio::test]
    async fn test_error_body_becomes_status() {
        let (backend, _) = spawn_server().await;

        let err = backend.direct_history(&UserId::new("ghost")).await.unwrap_err();
        match err {
            ClientError::Status { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "User not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_room() {
        let (backend, _) = spawn_server().await;

        let created = backend
            .create_room(&NewRoom {
                room_name: "Lounge".into(),
                is_private: true,
            })
            .await
            .unwrap();
        assert_eq!(created.room_id, "r9");

        let err = backend
            .create_room(&NewRoom {
                room_name: "General".into(),
                is_private: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 409, .. }));
    }

    #[tokio::test]
    async fn test_upload_multipart_fields() {
        let (backend, rec) = spawn_server().await;

        let receipt = backend
            .upload_file(
                &LocalFile::new("cat.png", vec![7; 64]),
                &ConversationTarget::Room(RoomId::new("7")),
            )
            .await
            .unwrap();
        assert_eq!(receipt.file_path, "stored_cat.png");

        backend
            .upload_file(
                &LocalFile::new("notes.txt", b"hi".to_vec()),
                &ConversationTarget::Recipient(UserId::new("u2")),
            )
            .await
            .unwrap();

        let uploads = rec.uploads.lock().unwrap().clone();
        assert_eq!(
            uploads,
            vec![
                ("room_id=7".to_string(), "cat.png".to_string(), 64),
                ("recipient_id=u2".to_string(), "notes.txt".to_string(), 2),
            ]
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_http_error() {
        let config = ClientConfig {
            server_url: "http://127.0.0.1:1".into(),
            ..ClientConfig::default()
        };
        let backend = HttpBackend::new(&config).unwrap();
        assert!(matches!(
            backend.list_rooms().await.unwrap_err(),
            ClientError::Http(_)
        ));
    }

    #[test]
    fn test_invalid_server_url() {
        let config = ClientConfig {
            server_url: "not a url".into(),
            ..ClientConfig::default()
        };
        assert!(matches!(
            HttpBackend::new(&config).unwrap_err(),
            ClientError::Config(_)
        ));
    }
}
