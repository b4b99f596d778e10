use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "vidsum", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a summary of an annotated video (requires `ffmpeg` on PATH).
    Summary(SummaryArgs),
    /// List the subjects that survive filtering, without touching the video.
    Subjects(SubjectsArgs),
    /// Print the stream properties `ffprobe` reports for a video.
    Probe(ProbeArgs),
}

#[derive(Parser, Debug)]
struct SummaryArgs {
    /// Annotation JSON, named `<video>.json` next to the video it describes.
    #[arg(long = "annotations")]
    annotation_path: PathBuf,

    /// Mirror outputs under this directory instead of writing them next to the video.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Summary kind; overrides the config file.
    #[arg(long, value_enum)]
    mode: Option<ModeChoice>,

    /// JSON config file (missing keys take their defaults).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Caption font; overrides the config file.
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct SubjectsArgs {
    /// Annotation JSON.
    #[arg(long = "annotations")]
    annotation_path: PathBuf,

    /// JSON config file providing the filter thresholds.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ProbeArgs {
    /// Video file.
    #[arg(long)]
    video: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeChoice {
    StillGrid,
    Animations,
    AnimatedGrid,
}

impl From<ModeChoice> for vidsum::RenderMode {
    fn from(choice: ModeChoice) -> Self {
        match choice {
            ModeChoice::StillGrid => vidsum::RenderMode::StillGrid,
            ModeChoice::Animations => vidsum::RenderMode::Animations,
            ModeChoice::AnimatedGrid => vidsum::RenderMode::AnimatedGrid,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Summary(args) => cmd_summary(args),
        Command::Subjects(args) => cmd_subjects(args),
        Command::Probe(args) => cmd_probe(args),
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<vidsum::SummaryConfig> {
    match path {
        Some(path) => vidsum::SummaryConfig::from_json_file(path)
            .with_context(|| format!("load config '{}'", path.display())),
        None => Ok(vidsum::SummaryConfig::default()),
    }
}

fn cmd_summary(args: SummaryArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_ref())?;
    if let Some(mode) = args.mode {
        config.mode = mode.into();
    }
    if let Some(font) = args.font {
        config.overlay.font_path = Some(font);
    }

    let store = match &args.out_dir {
        Some(dir) => vidsum::LocalStore::with_output_root(dir),
        None => vidsum::LocalStore::new(),
    };
    let annotation_uri = args
        .annotation_path
        .to_str()
        .with_context(|| format!("non-UTF-8 path '{}'", args.annotation_path.display()))?;

    let outcome = vidsum::summarize(
        annotation_uri,
        &store,
        &vidsum::FfmpegOpener,
        &vidsum::StandardCodec,
        &config,
    )
    .with_context(|| format!("summarize '{}'", args.annotation_path.display()))?;

    match outcome {
        vidsum::SummaryOutcome::NoRenderableContent => {
            eprintln!("nothing to render");
        }
        vidsum::SummaryOutcome::Written(report) => {
            for written in &report.written {
                let path = store.resolve_output(&written.destination)?;
                eprintln!("wrote {} ({} bytes)", path.display(), written.byte_len);
            }
            for (label, failure) in &report.failures {
                eprintln!("failed {label:?} as {}: {}", failure.format, failure.error);
            }
        }
    }
    Ok(())
}

fn cmd_subjects(args: SubjectsArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_ref())?;
    let bytes = std::fs::read(&args.annotation_path)
        .with_context(|| format!("read annotations '{}'", args.annotation_path.display()))?;
    let annotations = vidsum::parse_annotations(&bytes)?;
    let subjects = vidsum::filter(&annotations.subjects, &config.filter);

    eprintln!("{} of {} subjects kept", subjects.len(), annotations.len());
    for (index, subject) in subjects.iter().enumerate() {
        match subject {
            vidsum::Subject::Shot(shot) => println!(
                "{index:03} shot {:.3}s..{:.3}s",
                shot.start_ns as f64 / 1e9,
                shot.end_ns as f64 / 1e9
            ),
            vidsum::Subject::Object(obj) => println!(
                "{index:03} {} {}% {} fr.",
                obj.label,
                obj.confidence_percent(),
                obj.frame_count()
            ),
        }
    }
    Ok(())
}

fn cmd_probe(args: ProbeArgs) -> anyhow::Result<()> {
    if !vidsum::is_ffmpeg_on_path() {
        anyhow::bail!("ffmpeg and ffprobe must be on PATH");
    }
    let grabber = vidsum::FfmpegGrabber::open(&args.video)?;
    let info = grabber.source();
    println!(
        "{}x{} @ {:.3} fps, {:.3}s",
        info.frame_size.w,
        info.frame_size.h,
        info.fps,
        info.duration_sec
    );
    Ok(())
}
