pub mod cache;
pub mod detection;
pub mod fetch;
pub mod types;

pub use cache::PreviewCache;
pub use fetch::{HeadInfo, HttpFetcher, Page, is_html_type};
pub use types::{MediaKind, ProcessedPreview, UploadedMedia};
