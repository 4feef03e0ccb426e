use url::Url;

/// Links found in one message body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedLinks {
    /// Matches that parsed as absolute URIs, in order of appearance
    pub urls: Vec<Url>,
    /// Non-whitespace characters left after removing every matched span
    pub residual_len: usize,
}

impl ExtractedLinks {
    #[must_use]
    pub fn contains_other_text(&self) -> bool {
        self.residual_len > 0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// A room message that contained at least one link, handed from the
/// listener to the dispatcher.
#[derive(Debug, Clone)]
pub struct LinkMessage {
    pub room_id: String,
    pub event_id: String,
    pub sender: String,
    /// Origin server timestamp in milliseconds
    pub origin_server_ts: i64,
    pub links: ExtractedLinks,
}
