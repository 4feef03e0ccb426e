use async_trait::async_trait;
use std::sync::Arc;

use super::api::MatrixApi;
use super::content::MessageContent;
use super::models::SyncResponse;
use super::sync::SyncHandler;

pub const GREETING: &str = "Hello! I'm UrlPreviewBot!";

/// Accepts every room invite and greets the room once joined.
pub struct InviteHandler {
    api: Arc<dyn MatrixApi>,
}

impl InviteHandler {
    pub fn new(api: Arc<dyn MatrixApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl SyncHandler for InviteHandler {
    fn name(&self) -> &str {
        "invites"
    }

    async fn handle(&self, batch: &SyncResponse) -> anyhow::Result<()> {
        for room_id in batch.rooms.invite.keys() {
            if let Err(e) = self.api.join_room(room_id).await {
                tracing::warn!(room_id = %room_id, error = %e, "failed to accept invite");
                continue;
            }
            tracing::info!(room_id = %room_id, "joined room after invite");

            if let Err(e) = self
                .api
                .send_message(room_id, &MessageContent::notice(GREETING))
                .await
            {
                tracing::warn!(room_id = %room_id, error = %e, "failed to send greeting");
            }
        }
        Ok(())
    }
}
