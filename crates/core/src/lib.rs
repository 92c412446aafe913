pub mod compose;
pub mod config;
pub mod engine;
pub mod media;
pub mod narration;
pub mod pipeline;
pub mod plan;
pub mod testing;

pub use compose::{Composer, CompositionError, CompositionRequest, ErrorKind, ErrorReport};
pub use config::{
    load_config, load_config_from_str, save_config, save_last_output_path, validate_config, Config,
    ConfigError,
};
pub use engine::{FfmpegTranscoder, Transcoder, TranscoderConfig, TranscoderError};
pub use media::{AssetResolver, MediaAsset, MediaError, MediaKind, MediaProber};
pub use narration::{CommandSynthesizer, NarrationRequest, SpeechSynthesizer};
pub use pipeline::{CancelHandle, PipelineError, PipelineExecutor, PipelineProgress};
pub use plan::{plan_loop, Job, JobBuilder, JobKind, JobPlan, LoopSpec, MixSpec};
