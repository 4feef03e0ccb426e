use std::path::PathBuf;
use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for the preview bot.
///
/// Each subsystem defines its own error variant. Callers match on these to
/// decide whether a failure is fatal (configuration) or isolated to a single
/// message or URL (fetch, protocol). Glue code continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum PreviewBotError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Matrix protocol ─────────────────────────────────────────────────
    #[error("matrix: {0}")]
    Matrix(#[from] MatrixError),

    // ── Remote fetches (pages, media) ───────────────────────────────────
    #[error("fetch: {0}")]
    Fetch(#[from] FetchError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("missing required section [{0}]")]
    MissingSection(&'static str),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid site replacement pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ─── Matrix protocol errors ─────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("{endpoint} response missing field {field}")]
    MissingField {
        endpoint: &'static str,
        field: &'static str,
    },
}

// ─── Fetch errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{url} returned {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, PreviewBotError>;
