#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use preview_bot::matrix::{MatrixApi, MessageContent, SyncRequest, SyncResponse};

pub const BOT_USER: &str = "@previewbot:example.org";

/// One call made against [`RecordingHomeserver`], in arrival order.
#[derive(Debug, Clone)]
pub enum Call {
    Join(String),
    Upload { file_name: String, content_type: String, size: usize },
    Send { room_id: String, event_id: String, content: MessageContent },
    Redact { room_id: String, event_id: String, reason: String },
    Typing { room_id: String, typing: bool },
}

/// In-memory homeserver that records every call in order.
#[derive(Default)]
pub struct RecordingHomeserver {
    calls: Mutex<Vec<Call>>,
    joined: Mutex<Vec<String>>,
    next_id: AtomicUsize,
}

impl RecordingHomeserver {
    pub fn with_rooms(rooms: &[&str]) -> Self {
        let server = Self::default();
        server
            .joined
            .lock()
            .unwrap()
            .extend(rooms.iter().map(ToString::to_string));
        server
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls without typing notifications, whose count depends on timing.
    pub fn timeline(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::Typing { .. }))
            .collect()
    }

    pub fn uploads(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Upload { .. }))
            .count()
    }

    pub fn sent(&self) -> Vec<MessageContent> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send { content, .. } => Some(content),
                _ => None,
            })
            .collect()
    }

    pub fn redactions(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Redact { event_id, reason, .. } => Some((event_id, reason)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl MatrixApi for RecordingHomeserver {
    async fn whoami(&self) -> anyhow::Result<String> {
        Ok(BOT_USER.into())
    }

    async fn joined_rooms(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.joined.lock().unwrap().clone())
    }

    async fn join_room(&self, room_id: &str) -> anyhow::Result<()> {
        self.joined.lock().unwrap().push(room_id.to_string());
        self.record(Call::Join(room_id.to_string()));
        Ok(())
    }

    async fn sync(&self, _request: &SyncRequest) -> anyhow::Result<SyncResponse> {
        // Long-poll that never returns; tests cancel the loop instead.
        std::future::pending().await
    }

    async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> anyhow::Result<String> {
        self.record(Call::Upload {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            size: data.len(),
        });
        Ok(self.next("mxc://example.org/media"))
    }

    async fn send_message(
        &self,
        room_id: &str,
        content: &MessageContent,
    ) -> anyhow::Result<String> {
        let event_id = self.next("$event");
        self.record(Call::Send {
            room_id: room_id.to_string(),
            event_id: event_id.clone(),
            content: content.clone(),
        });
        Ok(event_id)
    }

    async fn redact(&self, room_id: &str, event_id: &str, reason: &str) -> anyhow::Result<()> {
        self.record(Call::Redact {
            room_id: room_id.to_string(),
            event_id: event_id.to_string(),
            reason: reason.to_string(),
        });
        Ok(())
    }

    async fn set_typing(&self, room_id: &str, typing: bool, _timeout: Duration) -> anyhow::Result<()> {
        self.record(Call::Typing {
            room_id: room_id.to_string(),
            typing,
        });
        Ok(())
    }
}

/// Sync batch with one text message in `room_id`.
pub fn message_batch(room_id: &str, event_id: &str, sender: &str, ts: i64, body: &str) -> SyncResponse {
    serde_json::from_value(serde_json::json!({
        "next_batch": "s1",
        "rooms": {
            "join": {
                room_id: {
                    "timeline": {
                        "events": [{
                            "type": "m.room.message",
                            "sender": sender,
                            "event_id": event_id,
                            "origin_server_ts": ts,
                            "content": { "msgtype": "m.text", "body": body }
                        }]
                    }
                }
            }
        }
    }))
    .unwrap()
}

/// Sync batch carrying one invite.
pub fn invite_batch(room_id: &str) -> SyncResponse {
    serde_json::from_value(serde_json::json!({
        "next_batch": "s2",
        "rooms": { "invite": { room_id: { "invite_state": { "events": [] } } } }
    }))
    .unwrap()
}

/// Smallest valid PNG, for serving as image bytes.
pub const PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];
