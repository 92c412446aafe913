//! FFmpeg-based transcoder implementation.

use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, info};

use super::config::TranscoderConfig;
use super::error::TranscoderError;
use super::traits::Transcoder;
use super::types::PitchShift;
use crate::media::MediaInfo;
use crate::plan::filter::{
    format_secs, secs_to_ms, Filter, FilterChain, FilterGraph, Label, MixEnd, StreamRef,
};
use crate::plan::{ConcatJob, Job, LoopSpec, MixJob, SegmentJob};

/// FFmpeg-based transcoder implementation.
pub struct FfmpegTranscoder {
    config: TranscoderConfig,
}

impl FfmpegTranscoder {
    /// Creates a new FFmpeg transcoder with the given configuration.
    pub fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    /// Creates a transcoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TranscoderConfig::default())
    }

    /// Serializes a job into an ffmpeg argument list.
    pub fn build_args(&self, job: &Job) -> Result<Vec<OsString>, TranscoderError> {
        match job {
            Job::AssembleSegment(segment) => Ok(self.build_segment_args(segment)),
            Job::MixAudio(mix) => Ok(self.build_mix_args(mix)),
            Job::ConcatenateWithIntro(concat) => Ok(self.build_concat_args(concat)),
            Job::ProbeDuration(_) => Err(TranscoderError::UnsupportedJob {
                kind: job.kind().to_string(),
            }),
        }
    }

    /// Builds ffmpeg arguments for the single-pass main segment.
    ///
    /// The video stream is copied; only the audio is mixed and encoded.
    fn build_segment_args(&self, job: &SegmentJob) -> Vec<OsString> {
        let mut args = Self::preamble();

        Self::push_input(&mut args, &job.video, Some(&job.video_loop));
        let inputs = job.mix.inputs();
        Self::push_input(&mut args, &inputs[0].path, None);
        Self::push_input(&mut args, &inputs[1].path, Some(&job.music_loop));

        let graph = FilterGraph::new().chain(
            FilterChain::new()
                .input(StreamRef::audio(1))
                .input(StreamRef::audio(2))
                .filter(Filter::Amix {
                    inputs: 2,
                    end: MixEnd::First,
                })
                .output(Label::new("aout")),
        );

        extend_args(&mut args, [
            "-filter_complex".to_string(),
            graph.to_string(),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "[aout]".to_string(),
            "-c:v".to_string(),
            "copy".to_string(),
        ]);
        self.push_audio_codec(&mut args);
        self.push_tail(&mut args, job.duration_secs, &job.output);
        args
    }

    /// Builds ffmpeg arguments for the delayed narration + music pre-mix.
    fn build_mix_args(&self, job: &MixJob) -> Vec<OsString> {
        let mut args = Self::preamble();

        let inputs = job.mix.inputs();
        Self::push_input(&mut args, &inputs[0].path, None);
        Self::push_input(&mut args, &inputs[1].path, Some(&job.music_loop));

        let mut graph = FilterGraph::new();
        let narration: StreamRef = if job.narration_delay_secs > 0.0 {
            graph.push(
                FilterChain::new()
                    .input(StreamRef::audio(0))
                    .filter(Filter::Adelay {
                        delay_ms: secs_to_ms(job.narration_delay_secs),
                    })
                    .output(Label::new("narr")),
            );
            Label::new("narr").into()
        } else {
            StreamRef::audio(0)
        };
        graph.push(
            FilterChain::new()
                .input(narration)
                .input(StreamRef::audio(1))
                .filter(Filter::Amix {
                    inputs: 2,
                    end: MixEnd::First,
                })
                .output(Label::new("aout")),
        );

        extend_args(&mut args, [
            "-filter_complex".to_string(),
            graph.to_string(),
            "-map".to_string(),
            "[aout]".to_string(),
            "-vn".to_string(),
        ]);
        self.push_audio_codec(&mut args);
        self.push_tail(&mut args, job.duration_secs, &job.output);
        args
    }

    /// Builds ffmpeg arguments joining the intro with the main segment.
    ///
    /// Joining two different clips needs a re-encode, so both sides are
    /// normalized to the configured frame before the concat filter.
    fn build_concat_args(&self, job: &ConcatJob) -> Vec<OsString> {
        let mut args = Self::preamble();

        Self::push_input(&mut args, &job.intro, None);
        Self::push_input(&mut args, &job.video, Some(&job.video_loop));
        Self::push_input(&mut args, &job.audio, None);

        let main_secs = job.video_loop.target_duration_secs;
        let mut graph = FilterGraph::new()
            .chain(self.normalize(FilterChain::new().input(StreamRef::video(0))).output(Label::new("iv")))
            .chain(
                self.normalize(
                    FilterChain::new()
                        .input(StreamRef::video(1))
                        .filter(Filter::Trim {
                            duration_secs: main_secs,
                        })
                        .filter(Filter::SetPts),
                )
                .output(Label::new("mv")),
            )
            .chain(
                FilterChain::new()
                    .input(Label::new("iv"))
                    .input(Label::new("mv"))
                    .filter(Filter::Concat {
                        segments: 2,
                        video: true,
                        audio: false,
                    })
                    .output(Label::new("vout")),
            );

        let audio_map = if job.intro_has_audio {
            graph.push(
                FilterChain::new()
                    .input(StreamRef::audio(0))
                    .input(StreamRef::audio(2))
                    .filter(Filter::Amix {
                        inputs: 2,
                        end: MixEnd::Longest,
                    })
                    .output(Label::new("aout")),
            );
            "[aout]".to_string()
        } else {
            "2:a:0".to_string()
        };

        extend_args(&mut args, [
            "-filter_complex".to_string(),
            graph.to_string(),
            "-map".to_string(),
            "[vout]".to_string(),
            "-map".to_string(),
            audio_map,
            "-c:v".to_string(),
            self.config.video_codec.clone(),
            "-crf".to_string(),
            self.config.crf.to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
        ]);
        self.push_audio_codec(&mut args);
        self.push_tail(&mut args, job.duration_secs, &job.output);
        args
    }

    /// Builds ffmpeg arguments for a narration pitch shift.
    fn build_pitch_args(&self, shift: &PitchShift) -> Vec<OsString> {
        let mut args = Self::preamble();
        Self::push_input(&mut args, &shift.input, None);

        let chain = FilterChain::new()
            .filter(Filter::Asetrate {
                hz: shift.shifted_rate_hz(),
            })
            .filter(Filter::Aresample {
                hz: shift.sample_rate_hz,
            });

        extend_args(&mut args, ["-af".to_string(), chain.to_string()]);
        extend_args(&mut args, [
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
        ]);
        args.push(shift.output.as_os_str().to_owned());
        args
    }

    fn normalize(&self, chain: FilterChain) -> FilterChain {
        let (width, height) = (self.config.frame_width, self.config.frame_height);
        chain
            .filter(Filter::Scale { width, height })
            .filter(Filter::Pad { width, height })
            .filter(Filter::SetSar)
            .filter(Filter::Fps {
                rate: self.config.frame_rate,
            })
    }

    fn preamble() -> Vec<OsString> {
        vec![
            "-y".into(), // Overwrite output
            "-hide_banner".into(),
            "-nostdin".into(),
        ]
    }

    fn push_input(args: &mut Vec<OsString>, path: &Path, looping: Option<&LoopSpec>) {
        if looping.is_some_and(|l| l.loop_needed) {
            extend_args(args, ["-stream_loop", "-1"]);
        }
        args.push("-i".into());
        args.push(path.as_os_str().to_owned());
    }

    fn push_audio_codec(&self, args: &mut Vec<OsString>) {
        extend_args(args, [
            "-c:a".to_string(),
            self.config.audio_codec.clone(),
            "-b:a".to_string(),
            format!("{}k", self.config.audio_bitrate_kbps),
        ]);
    }

    /// Duration cap, log level, extra args and the output path.
    fn push_tail(&self, args: &mut Vec<OsString>, duration_secs: f64, output: &Path) {
        extend_args(args, ["-t".to_string(), format_secs(duration_secs)]);
        extend_args(args, [
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
        ]);
        extend_args(args, &self.config.extra_ffmpeg_args);
        args.push(output.as_os_str().to_owned());
    }

    /// Parses ffprobe JSON output into MediaInfo.
    fn parse_probe_output(path: &Path, output: &str) -> Result<MediaInfo, TranscoderError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
            #[serde(default)]
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            format_name: Option<String>,
            duration: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: String,
        }

        if output.trim().is_empty() {
            return Err(TranscoderError::probe_failed("ffprobe produced no output"));
        }

        let probe: ProbeOutput =
            serde_json::from_str(output).map_err(|e| TranscoderError::ParseError {
                reason: format!("Failed to parse ffprobe output: {}", e),
            })?;

        let raw = probe.format.duration.unwrap_or_default();
        let duration_secs = raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d >= 0.0)
            .ok_or_else(|| {
                TranscoderError::probe_failed(format!("non-numeric duration {:?}", raw))
            })?;

        let format = probe
            .format
            .format_name
            .as_deref()
            .and_then(|name| name.split(',').next())
            .unwrap_or("unknown")
            .to_string();

        Ok(MediaInfo {
            path: path.to_path_buf(),
            duration_secs,
            format,
            has_audio: probe.streams.iter().any(|s| s.codec_type == "audio"),
            has_video: probe.streams.iter().any(|s| s.codec_type == "video"),
        })
    }

    /// Runs ffmpeg with `args` and checks that `output` was written.
    async fn execute(&self, args: Vec<OsString>, output: &Path) -> Result<(), TranscoderError> {
        let start = Instant::now();
        debug!(args = ?args, "Running ffmpeg");

        let child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscoderError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    TranscoderError::Io(e)
                }
            })?;

        // Dropping the future on timeout drops the child, which kills it.
        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, child.wait_with_output())
            .await
            .map_err(|_| TranscoderError::Timeout {
                timeout_secs: self.config.timeout_secs,
            })??;

        if !result.status.success() {
            return Err(TranscoderError::tool_failed(
                format!("FFmpeg exited with code: {:?}", result.status.code()),
                String::from_utf8_lossy(&result.stderr).trim().to_string(),
            ));
        }

        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(TranscoderError::OutputMissing {
                path: output.to_path_buf(),
            });
        }

        info!(
            output = %output.display(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "FFmpeg job finished"
        );
        Ok(())
    }

    async fn check_binary(path: &Path) -> Result<(), std::io::Error> {
        Command::new(path)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, TranscoderError> {
        if !path.exists() {
            return Err(TranscoderError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let output = Command::new(&self.config.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscoderError::FfprobeNotFound {
                        path: self.config.ffprobe_path.clone(),
                    }
                } else {
                    TranscoderError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(TranscoderError::probe_failed(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_probe_output(path, &stdout)
    }

    async fn run(&self, job: &Job) -> Result<(), TranscoderError> {
        let args = self.build_args(job)?;
        self.execute(args, job.output()).await
    }

    async fn shift_pitch(&self, shift: &PitchShift) -> Result<(), TranscoderError> {
        if !shift.input.exists() {
            return Err(TranscoderError::InputNotFound {
                path: shift.input.clone(),
            });
        }
        let args = self.build_pitch_args(shift);
        self.execute(args, &shift.output).await
    }

    async fn validate(&self) -> Result<(), TranscoderError> {
        if let Err(e) = Self::check_binary(&self.config.ffmpeg_path).await {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(TranscoderError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                });
            }
            return Err(TranscoderError::Io(e));
        }

        if let Err(e) = Self::check_binary(&self.config.ffprobe_path).await {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(TranscoderError::FfprobeNotFound {
                    path: self.config.ffprobe_path.clone(),
                });
            }
            return Err(TranscoderError::Io(e));
        }

        Ok(())
    }
}

/// Appends plain arguments to an ffmpeg argument list.
fn extend_args<I>(args: &mut Vec<OsString>, items: I)
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    args.extend(items.into_iter().map(Into::into));
}
