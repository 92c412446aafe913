use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use narrate_core::{
    load_config, save_last_output_path, validate_config, CancelHandle, CommandSynthesizer, Composer,
    CompositionError, CompositionRequest, Config, FfmpegTranscoder, MediaKind, NarrationRequest,
    PipelineProgress, Transcoder,
};

/// Default config file, overridable with NARRATE_CONFIG or --config.
const DEFAULT_CONFIG: &str = "narrate.toml";

/// Buffer size for progress updates
const PROGRESS_BUFFER_SIZE: usize = 32;

#[derive(Parser, Debug)]
#[command(name = "narrate", version, about = "Compose narrated videos from stock footage")]
struct Cli {
    /// Configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose a narrated video.
    Compose(ComposeArgs),
    /// List selectable stock assets.
    Assets {
        #[arg(value_enum)]
        kind: KindArg,
    },
    /// Check that ffmpeg and ffprobe are usable.
    Check,
}

#[derive(Parser, Debug)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(["narration", "script", "script_file"])
))]
struct ComposeArgs {
    /// Existing narration audio. Deleted after a successful run.
    #[arg(long)]
    narration: Option<PathBuf>,

    /// Narration script, synthesized with the configured voice.
    #[arg(long)]
    script: Option<String>,

    /// File holding the narration script.
    #[arg(long)]
    script_file: Option<PathBuf>,

    /// Stock video name (defaults to assets.default_video).
    #[arg(long)]
    video: Option<String>,

    /// Stock music name (defaults to assets.default_music).
    #[arg(long)]
    music: Option<String>,

    /// Output directory (defaults to the last one used).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Prepend the configured intro clip.
    #[arg(long, default_value_t = false)]
    intro: bool,

    /// Print the result as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    Video,
    Audio,
}

impl From<KindArg> for MediaKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Video => MediaKind::Video,
            KindArg::Audio => MediaKind::Audio,
        }
    }
}

#[derive(Serialize)]
struct Success<'a> {
    output: &'a Path,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config_path = cli
        .config
        .or_else(|| std::env::var("NARRATE_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    match cli.cmd {
        Command::Compose(args) => cmd_compose(config, &config_path, args).await,
        Command::Assets { kind } => cmd_assets(config, kind.into()).await,
        Command::Check => cmd_check(config).await,
    }
}

async fn cmd_compose(config: Config, config_path: &Path, args: ComposeArgs) -> Result<ExitCode> {
    let output_directory = match args.output.clone() {
        Some(dir) => dir,
        None if !config.settings.last_output_path.is_empty() => {
            PathBuf::from(&config.settings.last_output_path)
        }
        None => bail!("No --output given and no previous output directory saved"),
    };

    let script = match (&args.script, &args.script_file) {
        (Some(text), _) => Some(text.clone()),
        (None, Some(path)) => Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read script {:?}", path))?,
        ),
        (None, None) => None,
    };

    let mut request = CompositionRequest::new(
        args.narration.clone().unwrap_or_default(),
        &output_directory,
    )
    .with_intro(args.intro);
    request.video_name = args.video.clone();
    request.audio_name = args.music.clone();

    let transcoder = Arc::new(FfmpegTranscoder::new(config.transcoder.clone()));
    let synthesizer = CommandSynthesizer::new(config.synthesizer.clone());
    let narration = script
        .as_deref()
        .map(|text| NarrationRequest::from_settings(text, &config.settings));
    let composer = Composer::new(config, transcoder)?;

    let cancel = CancelHandle::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping after the current job");
                cancel.cancel();
            }
        });
    }

    let (progress_tx, progress_rx) = mpsc::channel(PROGRESS_BUFFER_SIZE);
    let printer = tokio::spawn(print_progress(progress_rx, args.json));

    let result = match &narration {
        Some(narration) => {
            composer
                .compose_script(&synthesizer, narration, request, Some(progress_tx), &cancel)
                .await
        }
        None => composer.compose(&request, Some(progress_tx), &cancel).await,
    };
    // The sender is gone once the run returns, so the printer finishes.
    let _ = printer.await;

    match result {
        Ok(output) => {
            remember_output_dir(config_path, &output_directory);
            if args.json {
                println!("{}", serde_json::to_string(&Success { output: &output })?);
            } else {
                println!("{}", output.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            report_failure(&e, args.json)?;
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn print_progress(mut rx: mpsc::Receiver<PipelineProgress>, quiet: bool) {
    while let Some(progress) = rx.recv().await {
        if !quiet {
            eprintln!("[{:>3.0}%] {}", progress.fraction * 100.0, progress.status);
        }
    }
}

/// Saves the output directory for next time. Failure only warns; the
/// composition itself already succeeded.
fn remember_output_dir(config_path: &Path, output_directory: &Path) {
    let dir = output_directory.to_string_lossy();
    if let Err(e) = save_last_output_path(config_path, &dir) {
        warn!("Failed to save settings to {:?}: {}", config_path, e);
    }
}

fn report_failure(err: &CompositionError, json: bool) -> Result<()> {
    let report = err.report();
    if json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        eprintln!("error [{}]: {}", report.kind, report.message);
        if let Some(diagnostic) = &report.diagnostic {
            eprintln!("{}", diagnostic);
        }
    }
    Ok(())
}

async fn cmd_assets(config: Config, kind: MediaKind) -> Result<ExitCode> {
    let transcoder = Arc::new(FfmpegTranscoder::new(config.transcoder.clone()));
    let composer = Composer::new(config, transcoder)?;
    let names = composer
        .resolver()
        .list(kind)
        .await
        .with_context(|| format!("Failed to list {} assets", kind))?;

    for name in names {
        println!("{}", name);
    }
    Ok(ExitCode::SUCCESS)
}

async fn cmd_check(config: Config) -> Result<ExitCode> {
    let transcoder = FfmpegTranscoder::new(config.transcoder);
    match transcoder.validate().await {
        Ok(()) => {
            println!("{}: ok", transcoder.name());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{}: {}", transcoder.name(), e);
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_requires_one_source() {
        let err = Cli::try_parse_from(["narrate", "compose", "--output", "/out"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let err = Cli::try_parse_from([
            "narrate",
            "compose",
            "--narration",
            "a.wav",
            "--script",
            "hello",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_parse_compose() {
        let cli = Cli::try_parse_from([
            "narrate",
            "--config",
            "custom.toml",
            "compose",
            "--script",
            "Hello world",
            "--video",
            "city",
            "--output",
            "/out",
            "--intro",
            "--json",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        let Command::Compose(args) = cli.cmd else {
            panic!("expected compose");
        };
        assert_eq!(args.script.as_deref(), Some("Hello world"));
        assert_eq!(args.video.as_deref(), Some("city"));
        assert!(args.music.is_none());
        assert!(args.intro);
        assert!(args.json);
    }

    #[test]
    fn test_parse_assets_kind() {
        let cli = Cli::try_parse_from(["narrate", "assets", "audio"]).unwrap();
        assert!(matches!(
            cli.cmd,
            Command::Assets {
                kind: KindArg::Audio
            }
        ));
    }

    #[test]
    fn test_remember_output_dir_writes_settings() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("narrate.toml");

        remember_output_dir(&path, Path::new("/videos/out"));

        let saved = load_config(&path).unwrap();
        assert_eq!(saved.settings.last_output_path, "/videos/out");
    }

    #[test]
    fn test_remember_output_dir_leaves_other_settings_alone() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("narrate.toml");
        std::fs::write(&path, "[transcoder]\nffmpeg_path = \"/opt/ffmpeg\"\n").unwrap();

        remember_output_dir(&path, Path::new("/videos/out"));

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("/opt/ffmpeg"));
        assert!(text.contains("last_output_path"));
        assert!(!text.contains("narration_rate"));
        assert!(!text.contains("[assets]"));
    }
}
