//! Declarative transcoding jobs.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use super::error::PlanError;
use super::loop_spec::LoopSpec;
use super::mix::MixSpec;

/// Discriminant of a [`Job`], used in diagnostics and progress weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    ProbeDuration,
    MixAudio,
    AssembleSegment,
    ConcatenateWithIntro,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::ProbeDuration => "probe_duration",
            JobKind::MixAudio => "mix_audio",
            JobKind::AssembleSegment => "assemble_segment",
            JobKind::ConcatenateWithIntro => "concatenate_with_intro",
        }
    }

    /// Human-readable status shown while the job runs.
    pub fn status(&self) -> &'static str {
        match self {
            JobKind::ProbeDuration => "Measuring intro...",
            JobKind::MixAudio => "Mixing narration and music...",
            JobKind::AssembleSegment => "Rendering video...",
            JobKind::ConcatenateWithIntro => "Rendering video with intro...",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Re-measures a clip whose duration later jobs depend on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeJob {
    pub input: PathBuf,
    /// Duration the rest of the plan was built against.
    pub expected_duration_secs: f64,
    /// Probe record written on success.
    pub output: PathBuf,
}

/// Mixes narration over a looped music bed into a standalone audio track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixJob {
    /// Narration first, music second.
    pub mix: MixSpec,
    pub music_loop: LoopSpec,
    /// Silence before the narration starts.
    pub narration_delay_secs: f64,
    pub duration_secs: f64,
    pub output: PathBuf,
}

/// Builds the main segment: looped/trimmed video under a narration+music mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentJob {
    pub video: PathBuf,
    pub video_loop: LoopSpec,
    /// Narration first, music second.
    pub mix: MixSpec,
    pub music_loop: LoopSpec,
    pub duration_secs: f64,
    pub output: PathBuf,
}

/// Joins the intro with the looped/trimmed main video over a pre-mixed track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcatJob {
    pub intro: PathBuf,
    pub intro_duration_secs: f64,
    /// Whether the intro's own audio is laid over the mixed track.
    pub intro_has_audio: bool,
    pub video: PathBuf,
    pub video_loop: LoopSpec,
    /// Mixed track covering the whole timeline, intro included.
    pub audio: PathBuf,
    /// Hard cap on the output: intro plus narration.
    pub duration_secs: f64,
    pub output: PathBuf,
}

/// One unit of work for the transcoding engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Job {
    ProbeDuration(ProbeJob),
    MixAudio(MixJob),
    AssembleSegment(SegmentJob),
    ConcatenateWithIntro(ConcatJob),
}

impl Job {
    pub fn kind(&self) -> JobKind {
        match self {
            Job::ProbeDuration(_) => JobKind::ProbeDuration,
            Job::MixAudio(_) => JobKind::MixAudio,
            Job::AssembleSegment(_) => JobKind::AssembleSegment,
            Job::ConcatenateWithIntro(_) => JobKind::ConcatenateWithIntro,
        }
    }

    /// Files the job reads, in engine input order.
    pub fn inputs(&self) -> Vec<&Path> {
        match self {
            Job::ProbeDuration(job) => vec![job.input.as_path()],
            Job::MixAudio(job) => job.mix.inputs().iter().map(|a| a.path()).collect(),
            Job::AssembleSegment(job) => {
                let mut inputs = vec![job.video.as_path()];
                inputs.extend(job.mix.inputs().iter().map(|a| a.path()));
                inputs
            }
            Job::ConcatenateWithIntro(job) => vec![
                job.intro.as_path(),
                job.video.as_path(),
                job.audio.as_path(),
            ],
        }
    }

    /// File the job writes.
    pub fn output(&self) -> &Path {
        match self {
            Job::ProbeDuration(job) => &job.output,
            Job::MixAudio(job) => &job.output,
            Job::AssembleSegment(job) => &job.output,
            Job::ConcatenateWithIntro(job) => &job.output,
        }
    }
}

/// An ordered job chain plus the file it ultimately produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPlan {
    jobs: Vec<Job>,
    output: PathBuf,
    /// Single-use input owned by the run, removed once it succeeds.
    #[serde(default)]
    scratch_input: Option<PathBuf>,
}

impl JobPlan {
    pub(crate) fn new(jobs: Vec<Job>, output: PathBuf) -> Self {
        Self {
            jobs,
            output,
            scratch_input: None,
        }
    }

    pub(crate) fn with_scratch_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.scratch_input = Some(path.into());
        self
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Final output file.
    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn scratch_input(&self) -> Option<&Path> {
        self.scratch_input.as_deref()
    }

    /// Outputs of every job except the last: the run's intermediates.
    pub fn temp_outputs(&self) -> Vec<&Path> {
        let n = self.jobs.len().saturating_sub(1);
        self.jobs[..n].iter().map(Job::output).collect()
    }

    pub fn kinds(&self) -> Vec<JobKind> {
        self.jobs.iter().map(Job::kind).collect()
    }

    /// Checks that every input is either an original asset or an earlier
    /// job's output, and that the last job writes the plan output.
    pub fn check(&self, assets: &[&Path]) -> Result<(), PlanError> {
        let mut available: HashSet<&Path> = assets.iter().copied().collect();
        let produced: HashSet<&Path> = self.jobs.iter().map(Job::output).collect();

        for (job_index, job) in self.jobs.iter().enumerate() {
            for input in job.inputs() {
                if !available.contains(input) && produced.contains(input) {
                    return Err(PlanError::ForwardReference {
                        job_index,
                        path: input.to_path_buf(),
                    });
                }
                if !available.contains(input) {
                    return Err(PlanError::missing(job.kind().as_str(), input));
                }
            }
            available.insert(job.output());
        }

        match self.jobs.last() {
            Some(last) if last.output() == self.output => Ok(()),
            Some(last) => Err(PlanError::missing(
                "final output",
                last.output().to_path_buf(),
            )),
            None => Err(PlanError::missing("final output", self.output.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::loop_spec::plan_loop;

    fn probe(input: &str, output: &str) -> Job {
        Job::ProbeDuration(ProbeJob {
            input: PathBuf::from(input),
            expected_duration_secs: 8.0,
            output: PathBuf::from(output),
        })
    }

    fn concat(audio: &str, output: &str) -> Job {
        Job::ConcatenateWithIntro(ConcatJob {
            intro: PathBuf::from("/intro.mp4"),
            intro_duration_secs: 8.0,
            intro_has_audio: true,
            video: PathBuf::from("/bg.mp4"),
            video_loop: plan_loop(15.0, 20.0),
            audio: PathBuf::from(audio),
            duration_secs: 28.0,
            output: PathBuf::from(output),
        })
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(JobKind::MixAudio.to_string(), "mix_audio");
        assert_eq!(
            serde_json::to_string(&JobKind::ConcatenateWithIntro).unwrap(),
            "\"concatenate_with_intro\""
        );
    }

    #[test]
    fn test_concat_inputs_in_engine_order() {
        let job = concat("/tmp/mix.m4a", "/out/final.mp4");
        assert_eq!(
            job.inputs(),
            vec![
                Path::new("/intro.mp4"),
                Path::new("/bg.mp4"),
                Path::new("/tmp/mix.m4a")
            ]
        );
        assert_eq!(job.kind(), JobKind::ConcatenateWithIntro);
    }

    #[test]
    fn test_check_accepts_chain() {
        let plan = JobPlan::new(
            vec![
                probe("/intro.mp4", "/tmp/probe.json"),
                concat("/tmp/probe.json", "/out/final.mp4"),
            ],
            PathBuf::from("/out/final.mp4"),
        );
        let assets = [Path::new("/intro.mp4"), Path::new("/bg.mp4")];
        assert!(plan.check(&assets).is_ok());
        assert_eq!(plan.temp_outputs(), vec![Path::new("/tmp/probe.json")]);
    }

    #[test]
    fn test_check_rejects_forward_reference() {
        let plan = JobPlan::new(
            vec![
                concat("/tmp/probe.json", "/out/final.mp4"),
                probe("/intro.mp4", "/tmp/probe.json"),
            ],
            PathBuf::from("/tmp/probe.json"),
        );
        let assets = [Path::new("/intro.mp4"), Path::new("/bg.mp4")];
        let err = plan.check(&assets).unwrap_err();
        assert!(matches!(err, PlanError::ForwardReference { job_index: 0, .. }));
    }

    #[test]
    fn test_check_rejects_wrong_final_output() {
        let plan = JobPlan::new(
            vec![probe("/intro.mp4", "/tmp/probe.json")],
            PathBuf::from("/out/final.mp4"),
        );
        assert!(plan.check(&[Path::new("/intro.mp4")]).is_err());
    }

    #[test]
    fn test_job_serializes_with_kind_tag() {
        let json = serde_json::to_value(probe("/intro.mp4", "/tmp/probe.json")).unwrap();
        assert_eq!(json["kind"], "probe_duration");
        assert_eq!(json["expected_duration_secs"], 8.0);
    }
}
