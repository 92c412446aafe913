//! Pipeline module: runs a job plan against the transcoding engine.
//!
//! Jobs run strictly one after another. The executor owns a fixed temp
//! namespace for the duration of a run, so only one run may hold a
//! [`RunPermit`] at a time.
//!
//! # Example
//!
//! ```ignore
//! use narrate_core::pipeline::{CancelHandle, PipelineExecutor};
//!
//! let executor = PipelineExecutor::new(transcoder, config.pipeline.clone());
//! let permit = executor.try_acquire()?;
//!
//! let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel(16);
//! let output = executor
//!     .run(&permit, &plan, Some(progress_tx), &CancelHandle::new())
//!     .await?;
//! ```

mod error;
mod executor;
mod types;

pub use error::{PipelineError, StageError};
pub use executor::{CancelHandle, PipelineExecutor, RunPermit};
pub use types::{
    progress_weight, PipelineProgress, PipelineState, ProgressPhase, ProgressTable,
};
