use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use giftbeat::{
    AspectRatio, CancelToken, EditorSession, EngineConfig, FfmpegSink, FfmpegSinkOpts, FitMode,
    IncomingFile, ProjectSnapshot, Resolution, SessionEvent, TransitionKind,
};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "GIFTBEAT_LOG";

#[derive(Parser, Debug)]
#[command(name = "giftbeat", version)]
struct Cli {
    /// Optional engine config JSON (camelCase keys). Environment overrides apply on top.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the preview frame at a timestamp as a PNG.
    Frame(FrameArgs),
    /// Export a saved project to MP4 (requires `ffmpeg` on PATH).
    Export(ExportArgs),
    /// Build a slideshow from images and export it to MP4 (requires `ffmpeg` on PATH).
    Slideshow(SlideshowArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Saved project JSON (`libraryItems` / `timelineItems`).
    #[arg(long)]
    project: PathBuf,

    /// Timeline time in seconds.
    #[arg(long, default_value_t = 0.0)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Scaling mode: contain or cover.
    #[arg(long)]
    fit: Option<FitMode>,
}

#[derive(Parser, Debug)]
struct OutputArgs {
    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Export frame rate.
    #[arg(long)]
    fps: Option<u32>,

    /// Resolution preset: 480p, 720p or 1080p.
    #[arg(long)]
    resolution: Option<Resolution>,

    /// Aspect ratio: 16:9, 9:16 or 1:1.
    #[arg(long)]
    aspect: Option<AspectRatio>,

    /// Scaling mode: contain or cover.
    #[arg(long)]
    fit: Option<FitMode>,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Saved project JSON (`libraryItems` / `timelineItems`).
    #[arg(long)]
    project: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Parser, Debug)]
struct SlideshowArgs {
    #[command(flatten)]
    output: OutputArgs,

    /// Transition between consecutive images.
    #[arg(long, default_value_t = TransitionKind::Fade)]
    transition: TransitionKind,

    /// Seconds each image stays on screen.
    #[arg(long, default_value_t = giftbeat::session::SLIDESHOW_IMAGE_SECS)]
    secs: f64,

    /// Input images, in order.
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    match cli.cmd {
        Command::Frame(args) => cmd_frame(config, args),
        Command::Export(args) => cmd_export(config, args),
        Command::Slideshow(args) => cmd_slideshow(config, args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let config = match path {
        Some(p) => EngineConfig::from_json_path(p)
            .with_context(|| format!("load config '{}'", p.display()))?,
        None => EngineConfig::default(),
    };
    Ok(config.with_env_overrides())
}

fn apply_output(mut config: EngineConfig, out: &OutputArgs) -> EngineConfig {
    if out.resolution.is_some() || out.aspect.is_some() {
        let resolution = out.resolution.unwrap_or(config.resolution);
        let aspect = out.aspect.unwrap_or(config.aspect_ratio);
        config = config.with_export(resolution, aspect);
    }
    if let Some(fps) = out.fps {
        config = config.with_export_fps(fps);
    }
    if let Some(fit) = out.fit {
        config = config.with_fit(fit);
    }
    config
}

fn open_project(config: EngineConfig, project: &Path) -> anyhow::Result<EditorSession> {
    let snapshot = ProjectSnapshot::from_path(project)
        .with_context(|| format!("read project '{}'", project.display()))?;
    let root = project.parent().unwrap_or_else(|| Path::new("."));

    let mut session = EditorSession::new(config)?;
    if !session.hydrate(&snapshot, root)? {
        anyhow::bail!("project '{}' is empty", project.display());
    }
    session.probe_video_durations();
    report_advisories(&mut session);
    Ok(session)
}

fn report_advisories(session: &mut EditorSession) {
    for event in session.take_events() {
        if let SessionEvent::Advisory(msg) = event {
            eprintln!("warning: {msg}");
        }
    }
}

fn cmd_frame(config: EngineConfig, args: FrameArgs) -> anyhow::Result<()> {
    let config = match args.fit {
        Some(fit) => config.with_fit(fit),
        None => config,
    };
    let mut session = open_project(config, &args.project)?;
    let t = session.seek(args.time, 0.0);

    let frame = session.current_frame();
    let (width, height) = (frame.width, frame.height);
    let data = frame.to_straight_rgba8();
    report_advisories(&mut session);

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &data,
        width,
        height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {} (t={t:.3}s)", args.out.display());
    Ok(())
}

fn cmd_export(config: EngineConfig, args: ExportArgs) -> anyhow::Result<()> {
    let config = apply_output(config, &args.output);
    let mut session = open_project(config, &args.project)?;
    export_to(&mut session, &args.output.out)
}

fn cmd_slideshow(config: EngineConfig, args: SlideshowArgs) -> anyhow::Result<()> {
    let config = apply_output(config, &args.output);
    let mut session = EditorSession::new(config)?;

    let mut files = Vec::with_capacity(args.images.len());
    for path in &args.images {
        files.push(
            IncomingFile::from_path(path)
                .with_context(|| format!("read image '{}'", path.display()))?,
        );
    }
    let report = session.add_files(files);
    for rejected in &report.rejected {
        eprintln!("skipped {}: {}", rejected.file_name, rejected.reason);
    }

    let clips = session
        .build_slideshow(args.transition, args.secs)
        .context("build slideshow")?;
    eprintln!(
        "slideshow: {clips} clips, {:.2}s",
        session.timeline().total_duration()
    );
    export_to(&mut session, &args.output.out)
}

fn export_to(session: &mut EditorSession, out: &Path) -> anyhow::Result<()> {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::to_file(out));
    let mut last_pct = u32::MAX;
    let artifact = session
        .export(&mut sink, CancelToken::new(), |p| {
            let pct = (p * 100.0).round() as u32;
            if pct != last_pct && pct.is_multiple_of(10) {
                eprintln!("export: {pct}%");
                last_pct = pct;
            }
        })
        .with_context(|| format!("export '{}'", out.display()))?;
    report_advisories(session);

    let Some(artifact) = artifact else {
        anyhow::bail!("export canceled");
    };
    eprintln!("wrote {} ({} frames)", out.display(), artifact.frames);
    Ok(())
}
