//! Composition module: the single entry point for front ends.
//!
//! A [`Composer`] validates a [`CompositionRequest`], resolves and probes
//! its assets, builds the job plan and runs it. Failures come back as one
//! [`CompositionError`] whose [`ErrorKind`] is stable for scripting.

mod composer;
mod error;
mod request;

pub use composer::Composer;
pub use error::{CompositionError, ErrorKind, ErrorReport};
pub use request::CompositionRequest;
