use async_trait::async_trait;
use tokio::sync::mpsc;

use super::detector::{extract_links, strip_reply_fallback};
use super::types::LinkMessage;
use crate::matrix::{SyncHandler, SyncResponse, TimelineEvent};

const ROOM_MESSAGE: &str = "m.room.message";

/// Turns joined-room timeline events into [`LinkMessage`]s.
///
/// Events older than `startup_ms` are replayed history and skipped, as are
/// the bot's own messages.
pub struct LinkListener {
    own_user_id: String,
    startup_ms: i64,
    tx: mpsc::Sender<LinkMessage>,
}

impl LinkListener {
    pub fn new(own_user_id: impl Into<String>, startup_ms: i64, tx: mpsc::Sender<LinkMessage>) -> Self {
        Self {
            own_user_id: own_user_id.into(),
            startup_ms,
            tx,
        }
    }

    fn links_in(&self, room_id: &str, event: &TimelineEvent) -> Option<LinkMessage> {
        if event.origin_server_ts < self.startup_ms
            || event.event_type != ROOM_MESSAGE
            || event.sender == self.own_user_id
        {
            return None;
        }
        let event_id = event.event_id.as_deref()?;
        let body = event.content.body.as_deref()?;

        let links = extract_links(strip_reply_fallback(body));
        if links.is_empty() {
            return None;
        }
        for url in &links.urls {
            tracing::info!(room_id, sender = %event.sender, url = %url, "new link");
        }

        Some(LinkMessage {
            room_id: room_id.to_string(),
            event_id: event_id.to_string(),
            sender: event.sender.clone(),
            origin_server_ts: event.origin_server_ts,
            links,
        })
    }
}

#[async_trait]
impl SyncHandler for LinkListener {
    fn name(&self) -> &str {
        "links"
    }

    async fn handle(&self, batch: &SyncResponse) -> anyhow::Result<()> {
        for (room_id, room) in &batch.rooms.join {
            for event in &room.timeline.events {
                let Some(message) = self.links_in(room_id, event) else {
                    continue;
                };
                if self.tx.send(message).await.is_err() {
                    anyhow::bail!("link dispatcher is gone");
                }
            }
        }
        Ok(())
    }
}
