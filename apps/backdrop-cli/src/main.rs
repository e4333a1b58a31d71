use anyhow::{Context, bail};
use backdrop_scene::{GridLayout, MaterialKind, SceneConfig, cover_fit, plane_scale};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "backdrop-cli", about = "CLI tool for backdrop layouts and configs")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Describe the squares grid a config produces
    Layout {
        /// Scene config file; defaults apply without one
        #[arg(long)]
        config: Option<PathBuf>,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Compute the cover-fit factors for a viewport and a video
    Fit {
        /// Viewport size, e.g. 1920x1080
        #[arg(long, value_parser = parse_size)]
        viewport: (u32, u32),
        /// Video natural size, e.g. 1280x720
        #[arg(long, value_parser = parse_size)]
        video: (u32, u32),
    },
    /// Validate a scene config and print what it resolves to
    CheckConfig {
        path: PathBuf,
    },
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let w: u32 = w.trim().parse().map_err(|e| format!("bad width: {e}"))?;
    let h: u32 = h.trim().parse().map_err(|e| format!("bad height: {e}"))?;
    Ok((w, h))
}

#[derive(Debug, Serialize)]
struct LayoutReport {
    size: usize,
    cell_size: f32,
    instances: usize,
    first_center: [f32; 3],
    last_center: [f32; 3],
    half_span: f32,
    line_segments: usize,
    variant: String,
    virtual_height: f32,
    settled_fov: f32,
}

impl LayoutReport {
    fn new(config: &SceneConfig) -> Self {
        let layout: GridLayout = config.layout();
        let last = layout.size() - 1;
        Self {
            size: layout.size(),
            cell_size: layout.cell_size(),
            instances: layout.instance_count(),
            first_center: layout.cell_center(0, 0).to_array(),
            last_center: layout.cell_center(last, last).to_array(),
            half_span: layout.half_span(),
            line_segments: layout.line_segments().len(),
            variant: format!("{:?}", config.variant),
            virtual_height: config.virtual_height(),
            settled_fov: config.settled_fov(),
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SceneConfig> {
    match path {
        Some(path) => {
            let config = SceneConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?;
            tracing::info!(path = %path.display(), variant = ?config.variant, "loaded scene config");
            Ok(config)
        }
        None => {
            tracing::debug!("no config given, using defaults");
            Ok(SceneConfig::default())
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("backdrop-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("panel: {}", backdrop_panel::crate_info());
            println!("media: {}", backdrop_media::crate_info());
            println!("scene: {}", backdrop_scene::crate_info());
            println!("render: {}", backdrop_render_wgpu::crate_info());
            let registry = backdrop_render_wgpu::builtin_registry();
            let kinds: Vec<&str> = registry.kinds().map(|k| k.name()).collect();
            println!("materials: {}", kinds.join(", "));
            for kind in MaterialKind::ALL {
                let uniforms: Vec<&str> = kind.schema().iter().map(|d| d.name).collect();
                println!("  {kind}: {}", uniforms.join(", "));
            }
        }
        Commands::Layout { config, json } => {
            let config = load_config(config.as_ref())?;
            let report = LayoutReport::new(&config);
            tracing::debug!(
                instances = report.instances,
                line_segments = report.line_segments,
                "grid layout resolved"
            );
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "Grid: {}x{} cells of {}, {} instances",
                    report.size, report.size, report.cell_size, report.instances
                );
                println!(
                    "First center: ({:.3}, {:.3})  Last center: ({:.3}, {:.3})",
                    report.first_center[0],
                    report.first_center[1],
                    report.last_center[0],
                    report.last_center[1]
                );
                println!("Line segments: {}", report.line_segments);
                println!(
                    "Variant: {}  virtual height {}  settled fov {:.2}°",
                    report.variant, report.virtual_height, report.settled_fov
                );
            }
        }
        Commands::Fit { viewport, video } => {
            let (vw, vh) = viewport;
            let (iw, ih) = video;
            let Some(fit) = cover_fit(vw, vh, iw, ih) else {
                bail!("viewport and video sizes must be non-zero");
            };
            let scale = plane_scale(vw as f32 / vh as f32);
            tracing::info!(viewport = ?viewport, video = ?video, a1 = fit.a1, a2 = fit.a2, "cover fit");
            println!("a1={:.6} a2={:.6}", fit.a1, fit.a2);
            println!("plane scale=({:.4}, {:.4})", scale.x, scale.y);
        }
        Commands::CheckConfig { path } => {
            let config = load_config(Some(&path))?;
            println!("{}: OK", path.display());
            println!("variant: {:?}", config.variant);
            println!(
                "grid: {} x {} @ {}",
                config.grid.size, config.grid.size, config.grid.cell_size
            );
            println!(
                "camera: distance {:.3}, settled fov {:.2}°",
                config.camera_distance(),
                config.settled_fov()
            );
            match &config.video.path {
                Some(dir) => println!("video: {} @ {} fps", dir.display(), config.video.fps),
                None => println!("video: test pattern"),
            }
            for (key, setting) in config.settings().iter() {
                println!("setting {key} = {:?}", setting.value);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sizes() {
        assert_eq!(parse_size("1920x1080"), Ok((1920, 1080)));
        assert_eq!(parse_size("640X360"), Ok((640, 360)));
        assert!(parse_size("1920").is_err());
        assert!(parse_size("axb").is_err());
    }

    #[test]
    fn default_layout_report() {
        let report = LayoutReport::new(&SceneConfig::default());
        assert_eq!(report.instances, 1600);
        assert_eq!(report.line_segments, 80);
        assert!((report.first_center[0] + 1.56).abs() < 1e-5);
        assert!((report.first_center[1] - 1.56).abs() < 1e-5);
        assert!((report.last_center[0] - 1.56).abs() < 1e-5);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"instances\":1600"));
    }

    #[test]
    fn load_config_reads_files_and_reports_bad_ones() {
        assert_eq!(load_config(None).unwrap().grid.size, 40);

        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("scene.yaml");
        std::fs::write(&good, "variant: minimal\ngrid:\n  size: 10\n").unwrap();
        let config = load_config(Some(&good)).unwrap();
        assert_eq!(config.grid.size, 10);

        let bad = dir.path().join("bad.yaml");
        std::fs::write(&bad, "grid:\n  size: 0\n").unwrap();
        let err = load_config(Some(&bad)).unwrap_err();
        assert!(format!("{err:#}").contains("bad.yaml"));
    }

    #[test]
    fn cli_accepts_fit_arguments() {
        let cli = Cli::parse_from([
            "backdrop-cli",
            "fit",
            "--viewport",
            "1000x1000",
            "--video",
            "1280x720",
        ]);
        match cli.command {
            Commands::Fit { viewport, video } => {
                assert_eq!(viewport, (1000, 1000));
                assert_eq!(video, (1280, 720));
            }
            _ => panic!("expected fit"),
        }
    }
}
