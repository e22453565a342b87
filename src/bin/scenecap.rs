use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use scenecap::{
    CaptureOptions, CaptureReport, FfmpegLogLevel, ProgressCallback, ProgressInfo,
    ReferenceUpdate, SceneFormat, VideoSource, capture_scenes,
};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  scenecap capture ad.mp4 --out screenshots --progress\n  scenecap capture a.mp4 b.mp4 --out shots --threshold 1500000 --duration 6 --json\n  scenecap probe ad.mp4 --json\n  scenecap completions zsh > _scenecap";

#[derive(Debug, Parser)]
#[command(
    name = "scenecap",
    version,
    about = "Extract scene-change still frames from the opening seconds of short videos",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long)]
    verbose: bool,

    /// Show a progress bar while analysing.
    #[arg(long)]
    progress: bool,

    /// Emit results as machine-readable JSON.
    #[arg(long)]
    json: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Capture scene-change screenshots from one or more videos.
    #[command(
        about = "Capture scene-change screenshots",
        after_help = "Examples:\n  scenecap capture ad.mp4 --out screenshots\n  scenecap capture *.mp4 --out shots --threshold 1500000 --duration 6 --ext png\n\nSensitivity: higher --threshold means less sensitive. Useful range for\n8-bit video is roughly 100000 to 10000000."
    )]
    Capture {
        /// Input video path(s). Each input is processed independently; a
        /// failing input is reported and skipped.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory for scene images. With several inputs, each
        /// video gets its own subdirectory named after the file stem.
        #[arg(long)]
        out: PathBuf,

        /// Detection threshold (higher = less sensitive).
        #[arg(long, default_value_t = scenecap::DEFAULT_THRESHOLD)]
        threshold: u64,

        /// Seconds of video to analyse from the start.
        #[arg(long, default_value_t = 4.0)]
        duration: f64,

        /// Evaluate every Nth decoded frame.
        #[arg(long, default_value_t = 2)]
        stride: u64,

        /// Reference update policy: every-frame | on-detection.
        #[arg(long, default_value = "every-frame")]
        reference: String,

        /// Output image extension (jpg, png, bmp).
        #[arg(long, default_value = "jpg")]
        ext: String,
    },

    /// Print stream metadata for a video (alias: metadata).
    #[command(
        about = "Print video stream metadata",
        visible_alias = "metadata",
        after_help = "Examples:\n  scenecap probe ad.mp4\n  scenecap probe ad.mp4 --json"
    )]
    Probe {
        /// Input video path.
        input: PathBuf,
    },

    /// Generate shell completions.
    #[command(about = "Generate shell completions")]
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

fn parse_log_level(value: &str) -> Option<FfmpegLogLevel> {
    match value.to_ascii_lowercase().as_str() {
        "quiet" => Some(FfmpegLogLevel::Quiet),
        "panic" => Some(FfmpegLogLevel::Panic),
        "fatal" => Some(FfmpegLogLevel::Fatal),
        "error" => Some(FfmpegLogLevel::Error),
        "warning" | "warn" => Some(FfmpegLogLevel::Warning),
        "info" => Some(FfmpegLogLevel::Info),
        "verbose" => Some(FfmpegLogLevel::Verbose),
        "debug" => Some(FfmpegLogLevel::Debug),
        "trace" => Some(FfmpegLogLevel::Trace),
        _ => None,
    }
}

fn parse_reference_policy(value: &str) -> Option<ReferenceUpdate> {
    match value.to_ascii_lowercase().as_str() {
        "every-frame" | "always" => Some(ReferenceUpdate::EveryFrame),
        "on-detection" | "detection" => Some(ReferenceUpdate::OnDetection),
        _ => None,
    }
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = &global.log_level {
        let parsed = parse_log_level(level).ok_or(format!("unsupported --log-level: {level}"))?;
        scenecap::set_ffmpeg_log_level(parsed);
    }

    Ok(())
}

/// Progress callback rendering an indicatif bar.
struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::no_length();
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_with_message("done");
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(total) = info.total
            && self.bar.length().is_none()
        {
            self.bar.set_length(total);
        }
        self.bar.set_position(info.current);
        self.bar.set_message(info.status.clone());
    }
}

/// Per-video output directory: the stem subdirectory when processing a
/// batch, the output directory itself for a single input.
fn scene_dir_for(out: &Path, input: &Path, batch: bool) -> PathBuf {
    if !batch {
        return out.to_path_buf();
    }

    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    out.join(stem)
}

fn report_json(input: &Path, dir: &Path, report: &CaptureReport) -> serde_json::Value {
    json!({
        "input": input.display().to_string(),
        "output_dir": dir.display().to_string(),
        "saved_count": report.scene_count(),
        "frames_decoded": report.frames_decoded,
        "frames_evaluated": report.frames_evaluated,
        "elapsed_seconds": report.elapsed.as_secs_f64(),
        "scenes": report.scenes.iter().map(|scene| json!({
            "index": scene.index,
            "caption": scene.caption(),
            "path": scene.path.display().to_string(),
        })).collect::<Vec<_>>(),
    })
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Capture {
            inputs,
            out,
            threshold,
            duration,
            stride,
            reference,
            ext,
        } => {
            let format = SceneFormat::from_extension(ext.trim_start_matches('.'))
                .ok_or(format!("unsupported --ext: {ext}"))?;
            let policy = parse_reference_policy(&reference)
                .ok_or(format!("unsupported --reference policy: {reference}"))?;
            if duration <= 0.0 {
                return Err("--duration must be greater than 0".into());
            }

            let batch = inputs.len() > 1;
            let mut json_reports = Vec::new();
            let mut failures = 0_usize;

            for input in &inputs {
                let scene_dir = scene_dir_for(&out, input, batch);

                let mut options = CaptureOptions::new()
                    .with_threshold(threshold)
                    .with_cutoff(Duration::from_secs_f64(duration))
                    .with_stride(stride)
                    .with_reference_update(policy)
                    .with_format(format);

                let terminal_progress = if cli.global.progress && !cli.global.json {
                    let progress = Arc::new(TerminalProgress::new()?);
                    options = options
                        .with_progress(progress.clone())
                        .with_batch_size(10);
                    Some(progress)
                } else {
                    None
                };

                if !cli.global.json {
                    eprintln!(
                        "{} {}",
                        "analysing:".cyan().bold(),
                        input.display().to_string().cyan()
                    );
                }

                // A failing input is reported and skipped, never fatal for
                // the rest of the batch.
                match capture_scenes(input, &scene_dir, &options) {
                    Ok(report) => {
                        if let Some(progress) = &terminal_progress {
                            progress.finish();
                        }

                        if cli.global.json {
                            json_reports.push(report_json(input, &scene_dir, &report));
                        } else {
                            println!(
                                "{} {}",
                                "success:".green().bold(),
                                format!(
                                    "Saved {} scene-change screenshot(s) for {} to {}",
                                    report.scene_count(),
                                    input.display(),
                                    scene_dir.display(),
                                )
                                .green()
                            );

                            if report.scene_count() == 0 {
                                println!(
                                    "  (no significant scene changes at threshold {threshold})"
                                );
                            }

                            if cli.global.verbose {
                                for scene in &report.scenes {
                                    println!("  {}: {}", scene.caption(), scene.path.display());
                                }
                                eprintln!(
                                    "  {} frames decoded, {} evaluated in {:.2?}",
                                    report.frames_decoded,
                                    report.frames_evaluated,
                                    report.elapsed,
                                );
                            }
                        }
                    }
                    Err(error) => {
                        failures += 1;
                        if cli.global.json {
                            json_reports.push(json!({
                                "input": input.display().to_string(),
                                "error": error.to_string(),
                            }));
                        } else {
                            eprintln!(
                                "{} {}",
                                "error:".red().bold(),
                                format!("{}: {error}", input.display()).red()
                            );
                        }
                    }
                }
            }

            if cli.global.json {
                println!("{}", serde_json::to_string_pretty(&json!(json_reports))?);
            }

            if failures > 0 {
                return Err(format!("{failures} of {} input(s) failed", inputs.len()).into());
            }
        }
        Commands::Probe { input } => {
            let source = VideoSource::open(&input)?;
            let metadata = source.metadata();

            if cli.global.json {
                let payload = json!({
                    "container": metadata.container,
                    "duration_seconds": metadata.duration.as_secs_f64(),
                    "width": metadata.width,
                    "height": metadata.height,
                    "fps": metadata.frames_per_second,
                    "frame_count": metadata.frame_count,
                    "codec": metadata.codec,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Container: {}", metadata.container);
                println!("Duration: {:?}", metadata.duration);
                println!(
                    "Video: {}x{} @ {:.2} fps [{}], ~{} frames",
                    metadata.width,
                    metadata.height,
                    metadata.frames_per_second,
                    metadata.codec,
                    metadata.frame_count,
                );
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            let name = command.get_name().to_string();
            clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
