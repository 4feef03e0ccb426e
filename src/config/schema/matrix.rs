use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixConfig {
    /// Homeserver base URL, e.g. `https://matrix.example.org`
    pub homeserver: String,
    pub access_token: String,
    /// Secondary endpoint used for typing notifications and redactions when
    /// the primary connection sits behind an end-to-end encryption proxy
    #[serde(default)]
    pub decrypted_homeserver: Option<String>,
}

impl MatrixConfig {
    /// Endpoint for typing + redaction calls.
    #[must_use]
    pub fn control_homeserver(&self) -> &str {
        self.decrypted_homeserver
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(&self.homeserver)
    }
}
