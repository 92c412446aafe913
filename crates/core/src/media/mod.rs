//! Media module: locating stock assets and measuring media files.
//!
//! [`AssetResolver`] maps logical asset names onto files in the configured
//! stock directories. [`MediaProber`] measures files through a
//! [`Transcoder`](crate::engine::Transcoder) and caches the result.

mod error;
mod prober;
mod resolver;
mod types;

pub use error::MediaError;
pub use prober::MediaProber;
pub use resolver::AssetResolver;
pub use types::{MediaAsset, MediaInfo, MediaKind};
