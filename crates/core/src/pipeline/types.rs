//! Types for the pipeline module.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::plan::JobKind;

/// Relative share of the run's progress bar given to each job kind.
///
/// Preparation steps are cheap and report early; the final encode carries
/// most of the weight.
pub fn progress_weight(kind: JobKind) -> f64 {
    match kind {
        JobKind::ProbeDuration => 0.05,
        JobKind::MixAudio => 0.25,
        JobKind::AssembleSegment => 0.70,
        JobKind::ConcatenateWithIntro => 0.70,
    }
}

/// Cumulative progress checkpoints for one job plan, normalized to [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressTable {
    ends: Vec<f64>,
}

impl ProgressTable {
    pub fn for_kinds(kinds: &[JobKind]) -> Self {
        let total: f64 = kinds.iter().copied().map(progress_weight).sum();
        let mut acc = 0.0;
        let mut ends: Vec<f64> = kinds
            .iter()
            .map(|kind| {
                acc += progress_weight(*kind);
                (acc / total).min(1.0)
            })
            .collect();
        // Float accumulation must not leave the last checkpoint short of 1.
        if let Some(last) = ends.last_mut() {
            *last = 1.0;
        }
        Self { ends }
    }

    /// Fraction reported when job `index` starts.
    pub fn start(&self, index: usize) -> f64 {
        match index {
            0 => 0.0,
            i => self.ends.get(i - 1).copied().unwrap_or(1.0),
        }
    }

    /// Fraction reported when job `index` finishes.
    pub fn end(&self, index: usize) -> f64 {
        self.ends.get(index).copied().unwrap_or(1.0)
    }
}

/// Checkpoint within a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressPhase {
    Started,
    Finished,
}

/// Progress update sent from the executor to its caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineProgress {
    pub job_index: usize,
    pub job_count: usize,
    pub kind: JobKind,
    pub phase: ProgressPhase,
    /// Overall run progress in [0, 1]; never decreases within a run.
    pub fraction: f64,
    pub status: String,
}

/// Mutable bookkeeping of one composition run.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    created_temp_paths: BTreeSet<PathBuf>,
    progress: f64,
    last_error: Option<String>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an intermediate before the job that writes it starts.
    pub fn track(&mut self, path: &Path) {
        self.created_temp_paths.insert(path.to_path_buf());
    }

    pub fn created_temp_paths(&self) -> &BTreeSet<PathBuf> {
        &self.created_temp_paths
    }

    /// Moves progress forward; smaller values are ignored.
    pub fn advance(&mut self, fraction: f64) -> f64 {
        self.progress = self.progress.max(fraction.clamp(0.0, 1.0));
        self.progress
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
