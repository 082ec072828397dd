//! REST backend seam.
//!
//! The coordinator never performs I/O: it asks for a [`BackendRequest`] and
//! later receives the matching [`BackendResponse`]. Anything implementing
//! [`Backend`] can serve those requests; [`crate::http::HttpBackend`] is the
//! reqwest implementation.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;

use serde::Deserialize;
use uuid::Uuid;

use parlor_shared::{ConversationTarget, DirectMessagePayload, RoomSummary, UserId, UserSummary};

use crate::error::Result;

/// A file picked for upload, read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk; the upload name is the path's file name.
    pub async fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self { name, bytes })
    }

    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }
}

/// Body of `POST /api/rooms`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct NewRoom {
    pub room_name: String,
    pub is_private: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedRoom {
    #[serde(default)]
    pub message: String,
    pub room_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub message: String,
    pub file_path: String,
    #[serde(default)]
    pub file_hash: Option<String>,
}

/// REST operations the coordinator relies on.
pub trait Backend: Send + Sync + 'static {
    fn list_rooms(&self) -> impl Future<Output = Result<Vec<RoomSummary>>> + Send;

    fn list_users(&self) -> impl Future<Output = Result<Vec<UserSummary>>> + Send;

    fn unread_counts(&self) -> impl Future<Output = Result<HashMap<UserId, u32>>> + Send;

    fn direct_history(
        &self,
        peer: &UserId,
    ) -> impl Future<Output = Result<Vec<DirectMessagePayload>>> + Send;

    fn mark_direct_read(&self, peer: &UserId) -> impl Future<Output = Result<()>> + Send;

    fn create_room(&self, room: &NewRoom) -> impl Future<Output = Result<CreatedRoom>> + Send;

    fn upload_file(
        &self,
        file: &LocalFile,
        target: &ConversationTarget,
    ) -> impl Future<Output = Result<UploadReceipt>> + Send;
}

/// A REST call requested by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendRequest {
    ListRooms,
    ListUsers,
    UnreadCounts,
    /// Tagged with the peer so a late answer can be matched against the
    /// conversation that is open when it arrives.
    DirectHistory { peer: UserId },
    MarkDirectRead { peer: UserId },
    CreateRoom(NewRoom),
    Upload {
        temp_id: Uuid,
        file: LocalFile,
        target: ConversationTarget,
    },
}

/// Outcome of a [`BackendRequest`], fed back into the coordinator.
#[derive(Debug)]
pub enum BackendResponse {
    Rooms(Result<Vec<RoomSummary>>),
    Users(Result<Vec<UserSummary>>),
    UnreadCounts(Result<HashMap<UserId, u32>>),
    DirectHistory {
        peer: UserId,
        result: Result<Vec<DirectMessagePayload>>,
    },
    MarkedRead {
        peer: UserId,
        result: Result<()>,
    },
    RoomCreated(Result<CreatedRoom>),
    Uploaded {
        temp_id: Uuid,
        result: Result<UploadReceipt>,
    },
}

impl BackendRequest {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ListRooms => "list_rooms",
            Self::ListUsers => "list_users",
            Self::UnreadCounts => "unread_counts",
            Self::DirectHistory { .. } => "direct_history",
            Self::MarkDirectRead { .. } => "mark_direct_read",
            Self::CreateRoom(_) => "create_room",
            Self::Upload { .. } => "upload",
        }
    }

    /// Run the request against `backend`. Never fails: errors travel inside
    /// the response.
    pub async fn execute<B: Backend>(self, backend: &B) -> BackendResponse {
        match self {
            Self::ListRooms => BackendResponse::Rooms(backend.list_rooms().await),
            Self::ListUsers => BackendResponse::Users(backend.list_users().await),
            Self::UnreadCounts => BackendResponse::UnreadCounts(backend.unread_counts().await),
            Self::DirectHistory { peer } => {
                let result = backend.direct_history(&peer).await;
                BackendResponse::DirectHistory { peer, result }
            }
            Self::MarkDirectRead { peer } => {
                let result = backend.mark_direct_read(&peer).await;
                BackendResponse::MarkedRead { peer, result }
            }
            Self::CreateRoom(room) => BackendResponse::RoomCreated(backend.create_room(&room).await),
            Self::Upload {
                temp_id,
                file,
                target,
            } => {
                let result = backend.upload_file(&file, &target).await;
                BackendResponse::Uploaded { temp_id, result }
            }
        }
    }
}
