pub mod detector;
pub mod listener;
pub mod types;

pub use detector::{extract_links, strip_reply_fallback};
pub use listener::LinkListener;
pub use types::{ExtractedLinks, LinkMessage};
