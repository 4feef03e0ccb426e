use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
pub struct SyncResponse {
    pub next_batch: String,
    #[serde(default)]
    pub rooms: Rooms,
}

#[derive(Debug, Deserialize, Default)]
pub struct Rooms {
    #[serde(default)]
    pub join: HashMap<String, JoinedRoom>,
    #[serde(default)]
    pub invite: HashMap<String, InvitedRoom>,
}

#[derive(Debug, Deserialize, Default)]
pub struct JoinedRoom {
    #[serde(default)]
    pub timeline: Timeline,
}

#[derive(Debug, Deserialize, Default)]
pub struct InvitedRoom {}

#[derive(Debug, Deserialize, Default)]
pub struct Timeline {
    /// Events that parsed. A malformed event is logged and dropped on its
    /// own.
    #[serde(default, deserialize_with = "lenient_events")]
    pub events: Vec<TimelineEvent>,
}

fn lenient_events<'de, D>(deserializer: D) -> Result<Vec<TimelineEvent>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|value| {
            let event_id = value
                .get("event_id")
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned);
            match serde_json::from_value::<TimelineEvent>(value) {
                Ok(event) => Some(event),
                Err(e) => {
                    tracing::warn!(event_id = ?event_id, error = %e, "skipping malformed timeline event");
                    None
                }
            }
        })
        .collect())
}

#[derive(Debug, Deserialize)]
pub struct TimelineEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub sender: String,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub origin_server_ts: i64,
    #[serde(default)]
    pub content: EventContent,
}

#[derive(Debug, Deserialize, Default)]
pub struct EventContent {
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub msgtype: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct WhoAmIResponse {
    pub(super) user_id: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct JoinedRoomsResponse {
    #[serde(default)]
    pub(super) joined_rooms: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UploadResponse {
    pub(super) content_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct EventIdResponse {
    pub(super) event_id: Option<String>,
}
