use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use scan_reticle::core::Size;
use scan_reticle::overlay::{reticle_box, size_progress, OverlayParams};
use scan_reticle::replay::{run_replay_with, ReplayConfig, ReplayReport};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "scan-reticle", version, about = "Barcode reticle overlay tools")]
struct Cli {
    /// Log level (error, warn, info, debug, trace, off).
    #[arg(long, global = true, default_value = "warn")]
    log_level: LevelFilter,

    /// Emit tracing spans as JSON (with the `tracing` feature).
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the reticle box for an overlay size.
    Reticle {
        #[arg(long)]
        width: f32,
        #[arg(long)]
        height: f32,
        /// Optional overlay params JSON.
        #[arg(long)]
        params: Option<PathBuf>,
    },
    /// Print the size-sufficiency progress of a barcode width.
    Progress {
        #[arg(long)]
        width: f32,
        #[arg(long)]
        height: f32,
        #[arg(long)]
        box_width: f32,
        #[arg(long)]
        params: Option<PathBuf>,
    },
    /// Replay scripted decoder output and write a report.
    Replay {
        config: PathBuf,
        /// Write the report here instead of `output_path` / stdout.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Render one PNG per step into this directory.
        #[arg(long)]
        frames_dir: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct ReticleOutput {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
    required_width: f32,
}

#[derive(Serialize)]
struct ProgressOutput {
    box_width: f32,
    progress: f32,
    confident: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    match cli.command {
        Command::Reticle {
            width,
            height,
            params,
        } => {
            let params = load_params(params.as_deref())?;
            let r = reticle_box(Size::new(width, height), &params);
            print_json(&ReticleOutput {
                left: r.left,
                top: r.top,
                right: r.right,
                bottom: r.bottom,
                required_width: r.width() * params.required_width_frac,
            })
        }
        Command::Progress {
            width,
            height,
            box_width,
            params,
        } => {
            let params = load_params(params.as_deref())?;
            let progress = size_progress(&params, Size::new(width, height), box_width);
            print_json(&ProgressOutput {
                box_width,
                progress,
                confident: progress >= 1.0,
            })
        }
        Command::Replay {
            config,
            output,
            frames_dir,
        } => replay(&config, output, frames_dir),
    }
}

fn init_logging(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "tracing")]
    {
        scan_reticle::core::init_tracing(cli.json_logs, cli.log_level);
        let _ = tracing_log::LogTracer::init();
    }
    #[cfg(not(feature = "tracing"))]
    {
        let _ = cli.json_logs;
        scan_reticle::core::init_with_level(cli.log_level)?;
    }
    Ok(())
}

fn load_params(path: Option<&Path>) -> Result<OverlayParams, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(serde_json::from_str(&fs::read_to_string(path)?)?),
        None => Ok(OverlayParams::default()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg_attr(feature = "tracing", tracing::instrument(level = "info", skip_all))]
fn replay(
    config_path: &Path,
    output: Option<PathBuf>,
    frames_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = ReplayConfig::load_json(config_path)?;
    info!(
        "replaying {} frames from {}",
        cfg.frames.len(),
        config_path.display()
    );

    let frames_dir = frames_dir.or_else(|| cfg.frames_dir.as_ref().map(PathBuf::from));
    let report = match frames_dir {
        Some(dir) => replay_with_frames(&cfg, &dir)?,
        None => run_replay_with(&cfg, |_, _| {})?,
    };

    let json = serde_json::to_string_pretty(&report)?;
    match output.or_else(|| cfg.output_path()) {
        Some(path) => {
            fs::write(&path, json)?;
            info!("report written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[cfg(feature = "raster")]
fn replay_with_frames(
    cfg: &ReplayConfig,
    dir: &Path,
) -> Result<ReplayReport, Box<dyn std::error::Error>> {
    use scan_reticle::render::{load_preview, save_png, RasterRenderer, RenderError};
    use std::time::Duration;

    fs::create_dir_all(dir)?;
    let preview = cfg.preview_path.as_ref().map(load_preview).transpose()?;
    let renderer = RasterRenderer::default();
    let mut render_error: Option<RenderError> = None;
    let mut index = 0usize;

    let report = run_replay_with(cfg, |step, overlay| {
        if render_error.is_some() {
            return;
        }
        let now = Duration::from_millis(step.t_ms);
        let rendered = match &preview {
            Some(img) => renderer.render_over(overlay, now, img),
            None => renderer.render(overlay, now),
        };
        let path = dir.join(format!("frame_{index:04}.png"));
        index += 1;
        if let Err(err) = rendered.and_then(|pixmap| save_png(&pixmap, &path)) {
            render_error = Some(err);
        }
    })?;

    if let Some(err) = render_error {
        return Err(err.into());
    }
    info!("rendered {} frames into {}", index, dir.display());
    Ok(report)
}

#[cfg(not(feature = "raster"))]
fn replay_with_frames(
    _cfg: &ReplayConfig,
    _dir: &Path,
) -> Result<ReplayReport, Box<dyn std::error::Error>> {
    Err("frame rendering requires the `raster` feature".into())
}
