//! Composition planning.
//!
//! Everything here is pure: probed assets go in, an ordered [`JobPlan`] comes
//! out. Looping is expressed as a flag plus a duration cap so the engine can
//! repeat a clip without re-encoding it, and audio mixes and filter graphs are
//! typed values rather than strings.

mod builder;
mod error;
pub mod filter;
mod job;
mod loop_spec;
mod mix;

pub use builder::{CompositionAssets, JobBuilder, MIXED_AUDIO_FILE, PROBE_RECORD_FILE};
pub use error::PlanError;
pub use job::{ConcatJob, Job, JobKind, JobPlan, MixJob, ProbeJob, SegmentJob};
pub use loop_spec::{plan_loop, LoopSpec};
pub use mix::{DurationPolicy, MixSpec};
