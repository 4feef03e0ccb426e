use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use super::api::{MatrixApi, SyncRequest};
use super::content::MessageContent;
use super::models::SyncResponse;

/// In-memory homeserver that records every call.
#[derive(Default)]
pub(crate) struct RecordingApi {
    pub(crate) uploads: Mutex<Vec<String>>,
    pub(crate) sent: Mutex<Vec<(String, MessageContent)>>,
    pub(crate) redactions: Mutex<Vec<(String, String, String)>>,
    pub(crate) typing: Mutex<Vec<(String, bool)>>,
    pub(crate) joined: Mutex<Vec<String>>,
    pub(crate) fail_sends: AtomicBool,
    next_id: AtomicUsize,
}

impl RecordingApi {
    pub(crate) fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub(crate) fn sent(&self) -> Vec<(String, MessageContent)> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn redactions(&self) -> Vec<(String, String, String)> {
        self.redactions.lock().unwrap().clone()
    }

    fn next(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl MatrixApi for RecordingApi {
    async fn whoami(&self) -> anyhow::Result<String> {
        Ok("@bot:example.org".into())
    }

    async fn joined_rooms(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.joined.lock().unwrap().clone())
    }

    async fn join_room(&self, room_id: &str) -> anyhow::Result<()> {
        self.joined.lock().unwrap().push(room_id.to_string());
        Ok(())
    }

    async fn sync(&self, _request: &SyncRequest) -> anyhow::Result<SyncResponse> {
        anyhow::bail!("sync is not scripted")
    }

    async fn upload(&self, file_name: &str, _: &str, _: Bytes) -> anyhow::Result<String> {
        self.uploads.lock().unwrap().push(file_name.to_string());
        Ok(self.next("mxc://example.org/m"))
    }

    async fn send_message(
        &self,
        room_id: &str,
        content: &MessageContent,
    ) -> anyhow::Result<String> {
        if self.fail_sends.load(Ordering::SeqCst) {
            anyhow::bail!("send rejected");
        }
        self.sent
            .lock()
            .unwrap()
            .push((room_id.to_string(), content.clone()));
        Ok(self.next("$sent"))
    }

    async fn redact(&self, room_id: &str, event_id: &str, reason: &str) -> anyhow::Result<()> {
        self.redactions.lock().unwrap().push((
            room_id.to_string(),
            event_id.to_string(),
            reason.to_string(),
        ));
        Ok(())
    }

    async fn set_typing(&self, room_id: &str, typing: bool, _: Duration) -> anyhow::Result<()> {
        self.typing
            .lock()
            .unwrap()
            .push((room_id.to_string(), typing));
        Ok(())
    }
}
