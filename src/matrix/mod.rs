//! Matrix Client-Server API plumbing: the [`MatrixApi`] seam, its HTTP
//! implementation, outgoing message payloads and the `/sync` loop.

mod api;
mod client;
mod content;
mod invite;
mod models;
mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{MatrixApi, SyncRequest};
pub use client::MatrixClient;
pub use content::{FileInfo, HTML_FORMAT, MessageContent, MessageType, ThumbnailInfo};
pub use invite::{GREETING, InviteHandler};
pub use models::{EventContent, JoinedRoom, Rooms, SyncResponse, Timeline, TimelineEvent};
pub use sync::{SyncHandler, SyncLoop};
