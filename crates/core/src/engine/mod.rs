//! Engine module for driving the external transcoder.
//!
//! This module provides the `Transcoder` trait and an FFmpeg implementation
//! that turns planned jobs into ffmpeg invocations.
//!
//! # Features
//!
//! - Duration and stream probing through ffprobe
//! - Loop-then-trim via `-stream_loop` plus an output duration cap
//! - Stream copy of the background video when no join is needed
//! - Structured filter graphs for delays, mixes and the intro join
//! - Per-job timeout with the process killed on expiry
//!
//! # Example
//!
//! ```ignore
//! use narrate_core::engine::{FfmpegTranscoder, Transcoder};
//!
//! let transcoder = FfmpegTranscoder::with_defaults();
//! transcoder.validate().await?;
//!
//! let info = transcoder.probe(Path::new("/stock/city.mp4")).await?;
//! println!("Duration: {} seconds", info.duration_secs);
//!
//! for job in plan.jobs() {
//!     transcoder.run(job).await?;
//! }
//! ```

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::TranscoderConfig;
pub use error::TranscoderError;
pub use ffmpeg::FfmpegTranscoder;
pub use traits::Transcoder;
pub use types::PitchShift;
