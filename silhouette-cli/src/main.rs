use anyhow::{Context, Result};
use clap::Parser;
use silhouette_core::surface::RasterSurface;
use silhouette_core::AnimatedCanvas;
use std::path::{Path, PathBuf};

mod config;
mod scene;

/// Silhouette - render segment-list scenes to PNG frames
#[derive(Parser, Debug)]
#[command(name = "silhouette")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scene description (JSON)
    #[arg(long)]
    scene: PathBuf,

    /// Output directory for frame_NNNN.png files
    #[arg(long, default_value = "frames")]
    out: PathBuf,

    /// Engine configuration override (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Render at most this many frames
    #[arg(long)]
    frames: Option<usize>,

    /// Render only the base shapes, ignoring animations
    #[arg(long = "static")]
    static_only: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let engine = config::load(args.config.as_deref())?;

    let scene = scene::Scene::load(&args.scene)?;
    let base_dir = args.scene.parent().unwrap_or(Path::new("."));
    let mut canvas = scene.build(base_dir, &engine)?;
    log::info!(
        "Loaded scene {} ({}x{}, {} shapes)",
        args.scene.display(),
        scene.width,
        scene.height,
        canvas.len()
    );

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("creating output directory {}", args.out.display()))?;

    if args.static_only {
        render_static(&mut canvas, &args.out)?;
        return Ok(());
    }

    let animated = canvas.animate_all();
    let mut frame_count = canvas.frame_count();
    if let Some(limit) = args.frames {
        frame_count = frame_count.min(limit);
    }
    log::info!("{} animated shapes, {} frames", animated, frame_count);

    if frame_count == 0 {
        render_static(&mut canvas, &args.out)?;
        return Ok(());
    }

    let mut surface = RasterSurface::new(scene.width, scene.height);
    for frame in 0..frame_count {
        canvas.render(&mut surface, Some(frame), None)?;
        save_frame(&surface, &args.out, frame)?;
    }
    log::info!("Wrote {} frames to {}", frame_count, args.out.display());
    Ok(())
}

fn render_static(canvas: &mut AnimatedCanvas, out: &Path) -> Result<()> {
    let canvas_ref = canvas.canvas();
    let mut surface = RasterSurface::new(canvas_ref.width(), canvas_ref.height());
    canvas.render(&mut surface, None, None)?;
    save_frame(&surface, out, 0)?;
    log::info!("Wrote base frame to {}", out.display());
    Ok(())
}

fn save_frame(surface: &RasterSurface, out: &Path, frame: usize) -> Result<()> {
    let path = out.join(format!("frame_{:04}.png", frame));
    surface
        .save_png(&path)
        .with_context(|| format!("writing {}", path.display()))?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}
