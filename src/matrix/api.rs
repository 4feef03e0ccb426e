use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

use super::content::MessageContent;
use super::models::SyncResponse;
use crate::config::Presence;

/// Parameters for one `/sync` long-poll.
#[derive(Debug, Clone, Default)]
pub struct SyncRequest {
    pub since: Option<String>,
    pub timeout: Duration,
    pub set_presence: Option<Presence>,
    pub filter: Option<String>,
}

/// The subset of the Matrix Client-Server API the bot needs.
///
/// Implemented over HTTP by [`super::MatrixClient`]; tests substitute a
/// recording fake.
#[async_trait]
pub trait MatrixApi: Send + Sync {
    /// Fully-qualified user id of the account behind the access token.
    async fn whoami(&self) -> anyhow::Result<String>;

    async fn joined_rooms(&self) -> anyhow::Result<Vec<String>>;

    async fn join_room(&self, room_id: &str) -> anyhow::Result<()>;

    async fn sync(&self, request: &SyncRequest) -> anyhow::Result<SyncResponse>;

    /// Upload raw bytes to the media repository, returning the `mxc://` URI.
    async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> anyhow::Result<String>;

    /// Send an `m.room.message`, returning the new event id.
    async fn send_message(
        &self,
        room_id: &str,
        content: &MessageContent,
    ) -> anyhow::Result<String>;

    async fn redact(&self, room_id: &str, event_id: &str, reason: &str) -> anyhow::Result<()>;

    async fn set_typing(
        &self,
        room_id: &str,
        typing: bool,
        timeout: Duration,
    ) -> anyhow::Result<()>;
}
