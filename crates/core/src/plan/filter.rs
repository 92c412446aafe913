//! Structured filter graphs and their serialization.
//!
//! Graphs are assembled from typed values and rendered in one place, so no
//! caller ever splices file names or free text into a filter expression.
//! File paths travel as separate engine arguments and never appear here.

use std::fmt;

/// Which elementary stream of an input a filter consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamType {
    Audio,
    Video,
}

/// Name of an intermediate pad inside a graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label(&'static str);

impl Label {
    /// Creates a label. Names are restricted to `[A-Za-z0-9_]`.
    pub fn new(name: &'static str) -> Self {
        debug_assert!(Self::is_valid_name(name), "invalid filter label {name:?}");
        Self(name)
    }

    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    pub fn as_str(&self) -> &str {
        self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

/// A pad feeding a filter chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamRef {
    /// Stream of the n-th engine input.
    Input { index: usize, stream: StreamType },
    /// Output of an earlier chain.
    Label(Label),
}

impl StreamRef {
    pub fn audio(index: usize) -> Self {
        Self::Input {
            index,
            stream: StreamType::Audio,
        }
    }

    pub fn video(index: usize) -> Self {
        Self::Input {
            index,
            stream: StreamType::Video,
        }
    }
}

impl From<Label> for StreamRef {
    fn from(label: Label) -> Self {
        Self::Label(label)
    }
}

impl fmt::Display for StreamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamRef::Input { index, stream } => {
                let kind = match stream {
                    StreamType::Audio => "a",
                    StreamType::Video => "v",
                };
                write!(f, "[{index}:{kind}]")
            }
            StreamRef::Label(label) => label.fmt(f),
        }
    }
}

/// When an `amix` ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixEnd {
    First,
    Longest,
}

/// One filter with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Delays every channel by the same amount.
    Adelay { delay_ms: u64 },
    Amix { inputs: usize, end: MixEnd },
    Trim { duration_secs: f64 },
    SetPts,
    /// Fits inside the frame, keeping aspect ratio.
    Scale { width: u32, height: u32 },
    /// Centers on a frame of the given size.
    Pad { width: u32, height: u32 },
    SetSar,
    Fps { rate: u32 },
    Concat { segments: usize, video: bool, audio: bool },
    Asetrate { hz: u32 },
    Aresample { hz: u32 },
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Adelay { delay_ms } => write!(f, "adelay=delays={delay_ms}:all=1"),
            Filter::Amix { inputs, end } => {
                let end = match end {
                    MixEnd::First => "first",
                    MixEnd::Longest => "longest",
                };
                write!(
                    f,
                    "amix=inputs={inputs}:duration={end}:dropout_transition=0"
                )
            }
            Filter::Trim { duration_secs } => {
                write!(f, "trim=duration={}", format_secs(*duration_secs))
            }
            Filter::SetPts => write!(f, "setpts=PTS-STARTPTS"),
            Filter::Scale { width, height } => write!(
                f,
                "scale={width}:{height}:force_original_aspect_ratio=decrease"
            ),
            Filter::Pad { width, height } => {
                write!(f, "pad={width}:{height}:(ow-iw)/2:(oh-ih)/2")
            }
            Filter::SetSar => write!(f, "setsar=1"),
            Filter::Fps { rate } => write!(f, "fps={rate}"),
            Filter::Concat {
                segments,
                video,
                audio,
            } => write!(
                f,
                "concat=n={segments}:v={}:a={}",
                u8::from(*video),
                u8::from(*audio)
            ),
            Filter::Asetrate { hz } => write!(f, "asetrate={hz}"),
            Filter::Aresample { hz } => write!(f, "aresample={hz}"),
        }
    }
}

/// Filters applied in sequence between labelled inputs and outputs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChain {
    inputs: Vec<StreamRef>,
    filters: Vec<Filter>,
    outputs: Vec<Label>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(mut self, stream: impl Into<StreamRef>) -> Self {
        self.inputs.push(stream.into());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn output(mut self, label: Label) -> Self {
        self.outputs.push(label);
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }
}

impl fmt::Display for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for input in &self.inputs {
            input.fmt(f)?;
        }
        for (i, filter) in self.filters.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            filter.fmt(f)?;
        }
        for output in &self.outputs {
            output.fmt(f)?;
        }
        Ok(())
    }
}

/// A complete graph, rendered as one engine argument.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterGraph {
    chains: Vec<FilterChain>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chain(mut self, chain: FilterChain) -> Self {
        self.chains.push(chain);
        self
    }

    pub fn push(&mut self, chain: FilterChain) {
        self.chains.push(chain);
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chain) in self.chains.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            chain.fmt(f)?;
        }
        Ok(())
    }
}

/// Renders seconds with millisecond precision.
pub fn format_secs(secs: f64) -> String {
    format!("{secs:.3}")
}

/// Converts seconds to whole milliseconds, rounding to nearest.
pub fn secs_to_ms(secs: f64) -> u64 {
    (secs.max(0.0) * 1000.0).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mix_chain_renders() {
        let chain = FilterChain::new()
            .input(StreamRef::audio(1))
            .input(StreamRef::audio(2))
            .filter(Filter::Amix {
                inputs: 2,
                end: MixEnd::First,
            })
            .output(Label::new("aout"));
        assert_eq!(
            chain.to_string(),
            "[1:a][2:a]amix=inputs=2:duration=first:dropout_transition=0[aout]"
        );
    }

    #[test]
    fn test_graph_joins_chains() {
        let graph = FilterGraph::new()
            .chain(
                FilterChain::new()
                    .input(StreamRef::audio(0))
                    .filter(Filter::Adelay { delay_ms: 8000 })
                    .output(Label::new("narr")),
            )
            .chain(
                FilterChain::new()
                    .input(Label::new("narr"))
                    .input(StreamRef::audio(1))
                    .filter(Filter::Amix {
                        inputs: 2,
                        end: MixEnd::First,
                    })
                    .output(Label::new("aout")),
            );
        assert_eq!(
            graph.to_string(),
            "[0:a]adelay=delays=8000:all=1[narr];\
             [narr][1:a]amix=inputs=2:duration=first:dropout_transition=0[aout]"
        );
    }

    #[test]
    fn test_video_normalization_chain() {
        let chain = FilterChain::new()
            .input(StreamRef::video(1))
            .filter(Filter::Trim { duration_secs: 20.0 })
            .filter(Filter::SetPts)
            .filter(Filter::Scale {
                width: 1280,
                height: 720,
            })
            .filter(Filter::Pad {
                width: 1280,
                height: 720,
            })
            .filter(Filter::SetSar)
            .filter(Filter::Fps { rate: 30 })
            .output(Label::new("mv"));
        assert_eq!(
            chain.to_string(),
            "[1:v]trim=duration=20.000,setpts=PTS-STARTPTS,\
             scale=1280:720:force_original_aspect_ratio=decrease,\
             pad=1280:720:(ow-iw)/2:(oh-ih)/2,setsar=1,fps=30[mv]"
        );
    }

    #[test]
    fn test_concat_flags() {
        let filter = Filter::Concat {
            segments: 2,
            video: true,
            audio: false,
        };
        assert_eq!(filter.to_string(), "concat=n=2:v=1:a=0");
    }

    #[test]
    fn test_label_validation() {
        assert!(Label::is_valid_name("aout"));
        assert!(Label::is_valid_name("main_v2"));
        assert!(!Label::is_valid_name(""));
        assert!(!Label::is_valid_name("a out"));
        assert!(!Label::is_valid_name("x];[y"));
    }

    #[test]
    fn test_seconds_formatting() {
        assert_eq!(format_secs(28.0), "28.000");
        assert_eq!(format_secs(4.0004), "4.000");
        assert_eq!(secs_to_ms(8.0), 8000);
        assert_eq!(secs_to_ms(0.0126), 13);
        assert_eq!(secs_to_ms(-1.0), 0);
    }
}
