use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tokio::sync::OnceCell;
use urlencoding::encode;

use super::api::{MatrixApi, SyncRequest};
use super::content::MessageContent;
use super::models::{
    EventIdResponse, JoinedRoomsResponse, SyncResponse, UploadResponse, WhoAmIResponse,
};
use crate::error::MatrixError;

/// Slack added on top of the long-poll timeout before the HTTP request
/// itself is abandoned.
const SYNC_GRACE: Duration = Duration::from_secs(30);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Matrix Client-Server API over plain HTTP (no SDK needed).
#[derive(Clone)]
pub struct MatrixClient {
    homeserver: String,
    access_token: String,
    client: Client,
    user_id: std::sync::Arc<OnceCell<String>>,
}

impl MatrixClient {
    pub fn new(homeserver: &str, access_token: &str) -> Self {
        Self {
            homeserver: homeserver.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            client: Client::new(),
            user_id: std::sync::Arc::new(OnceCell::new()),
        }
    }

    #[must_use]
    pub fn homeserver(&self) -> &str {
        &self.homeserver
    }

    fn client_url(&self, path: &str) -> String {
        format!("{}/_matrix/client/v3{path}", self.homeserver)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("Authorization", format!("Bearer {}", self.access_token))
            .timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    fn txn_id() -> String {
        format!("pb_{}", uuid::Uuid::new_v4().simple())
    }

    async fn user_id(&self) -> anyhow::Result<&str> {
        self.user_id
            .get_or_try_init(|| self.fetch_user_id())
            .await
            .map(String::as_str)
    }

    async fn fetch_user_id(&self) -> anyhow::Result<String> {
        let resp = self
            .authorized(self.client.get(self.client_url("/account/whoami")))
            .send()
            .await
            .context("send Matrix whoami request")?;
        let who: WhoAmIResponse = ensure_success(resp, "whoami")
            .await?
            .json()
            .await
            .context("parse Matrix whoami response")?;
        Ok(who.user_id)
    }
}

async fn ensure_success(resp: Response, endpoint: &'static str) -> anyhow::Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(MatrixError::Status {
        endpoint,
        status: status.as_u16(),
        body,
    }
    .into())
}

#[async_trait]
impl MatrixApi for MatrixClient {
    async fn whoami(&self) -> anyhow::Result<String> {
        self.user_id().await.map(str::to_string)
    }

    async fn joined_rooms(&self) -> anyhow::Result<Vec<String>> {
        let resp = self
            .authorized(self.client.get(self.client_url("/joined_rooms")))
            .send()
            .await
            .context("send Matrix joined_rooms request")?;
        let rooms: JoinedRoomsResponse = ensure_success(resp, "joined_rooms")
            .await?
            .json()
            .await
            .context("parse Matrix joined_rooms response")?;
        Ok(rooms.joined_rooms)
    }

    async fn join_room(&self, room_id: &str) -> anyhow::Result<()> {
        let url = self.client_url(&format!("/join/{}", encode(room_id)));
        let resp = self
            .authorized(self.client.post(&url))
            .json(&serde_json::json!({}))
            .send()
            .await
            .context("send Matrix join request")?;
        ensure_success(resp, "join").await?;
        Ok(())
    }

    async fn sync(&self, request: &SyncRequest) -> anyhow::Result<SyncResponse> {
        let mut query: Vec<(&str, String)> =
            vec![("timeout", request.timeout.as_millis().to_string())];
        if let Some(since) = &request.since {
            query.push(("since", since.clone()));
        }
        if let Some(presence) = request.set_presence {
            query.push(("set_presence", presence.to_string()));
        }
        if let Some(filter) = &request.filter {
            query.push(("filter", filter.clone()));
        }

        let resp = self
            .authorized(self.client.get(self.client_url("/sync")))
            .timeout(request.timeout + SYNC_GRACE)
            .query(&query)
            .send()
            .await
            .context("send Matrix sync request")?;
        ensure_success(resp, "sync")
            .await?
            .json()
            .await
            .context("parse Matrix sync response")
    }

    async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> anyhow::Result<String> {
        let url = format!("{}/_matrix/media/v3/upload", self.homeserver);
        let resp = self
            .authorized(self.client.post(&url))
            .header("Content-Type", content_type)
            .query(&[("filename", file_name)])
            .body(data)
            .send()
            .await
            .context("send Matrix upload request")?;
        let upload: UploadResponse = ensure_success(resp, "upload")
            .await?
            .json()
            .await
            .context("parse Matrix upload response")?;
        upload.content_uri.ok_or_else(|| {
            MatrixError::MissingField {
                endpoint: "upload",
                field: "content_uri",
            }
            .into()
        })
    }

    async fn send_message(
        &self,
        room_id: &str,
        content: &MessageContent,
    ) -> anyhow::Result<String> {
        let url = self.client_url(&format!(
            "/rooms/{}/send/m.room.message/{}",
            encode(room_id),
            Self::txn_id()
        ));
        let resp = self
            .authorized(self.client.put(&url))
            .json(&content.to_event_content())
            .send()
            .await
            .context("send Matrix room message")?;
        let sent: EventIdResponse = ensure_success(resp, "send")
            .await?
            .json()
            .await
            .context("parse Matrix send response")?;
        sent.event_id.ok_or_else(|| {
            MatrixError::MissingField {
                endpoint: "send",
                field: "event_id",
            }
            .into()
        })
    }

    async fn redact(&self, room_id: &str, event_id: &str, reason: &str) -> anyhow::Result<()> {
        let url = self.client_url(&format!(
            "/rooms/{}/redact/{}/{}",
            encode(room_id),
            encode(event_id),
            Self::txn_id()
        ));
        let resp = self
            .authorized(self.client.put(&url))
            .json(&serde_json::json!({ "reason": reason }))
            .send()
            .await
            .context("send Matrix redact request")?;
        ensure_success(resp, "redact").await?;
        Ok(())
    }

    async fn set_typing(
        &self,
        room_id: &str,
        typing: bool,
        timeout: Duration,
    ) -> anyhow::Result<()> {
        let user_id = self.user_id().await?;
        let url = self.client_url(&format!(
            "/rooms/{}/typing/{}",
            encode(room_id),
            encode(user_id)
        ));
        let body = if typing {
            let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
            serde_json::json!({ "typing": true, "timeout": millis })
        } else {
            serde_json::json!({ "typing": false })
        };
        let resp = self
            .authorized(self.client.put(&url))
            .json(&body)
            .send()
            .await
            .context("send Matrix typing request")?;
        ensure_success(resp, "typing").await?;
        Ok(())
    }
}
