//! mapsketch: offline CLI for the sketch normalization pipeline.
//!
//! Works on recorded stroke files (JSON arrays of
//! `{"x", "y", "is_continuation"}` points) so the pipeline and the
//! session can be exercised without a browser or a matcher:
//!
//! - `normalize` prints the match request body for a sketch
//! - `replay` runs a session against a recorded matcher response and
//!   prints the drawn path as GeoJSON
//! - `snap-sample` prints the road-snap path parameter for that path
//!
//! # Usage
//!
//! ```text
//! cargo run --bin mapsketch -- normalize strokes.json --bounds 30,29,-95,-96
//! cargo run --bin mapsketch -- replay strokes.json response.json --result 2
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod replay;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry};
use log::info;
use mapsketch_client::{MatchRequest, MatchResponse, Session};
use mapsketch_pipeline::{Dimensions, GeoBounds, RasterizerKind, SketchConfig, StrokePoint};
use serde::de::DeserializeOwned;

use crate::replay::ReplayService;

/// Offline tools for the map sketch pipeline.
#[derive(Parser)]
#[command(name = "mapsketch", version)]
struct Cli {
    #[command(flatten)]
    sketch: SketchArgs,

    #[command(subcommand)]
    command: Command,
}

/// Pipeline parameters shared by every subcommand.
#[derive(Args)]
struct SketchArgs {
    /// Drawing surface width in pixels.
    #[arg(long, global = true, default_value_t = SketchConfig::DEFAULT_SURFACE_WIDTH)]
    width: u32,

    /// Drawing surface height in pixels.
    #[arg(long, global = true, default_value_t = SketchConfig::DEFAULT_SURFACE_HEIGHT)]
    height: u32,

    /// Pen width in pixels.
    #[arg(long, global = true, default_value_t = SketchConfig::DEFAULT_LINE_WIDTH)]
    line_width: f32,

    /// Rasterization strategy.
    #[arg(long, global = true, value_enum, default_value_t = Rasterizer::Stroked)]
    rasterizer: Rasterizer,

    /// Maximum points sent to the road snapper.
    #[arg(long, global = true, default_value_t = SketchConfig::DEFAULT_SNAP_POINT_LIMIT)]
    snap_point_limit: usize,

    /// Full sketch config as a JSON string.
    ///
    /// When provided, all other sketch parameter flags are ignored.
    #[arg(long, global = true)]
    config_json: Option<String>,
}

/// Rasterizer selection.
#[derive(Clone, Copy, ValueEnum)]
enum Rasterizer {
    /// Anti-aliased round-capped strokes, as a canvas draws them.
    Stroked,
    /// Exact square-brush cells along Bresenham lines.
    Bresenham,
}

#[derive(Subcommand)]
enum Command {
    /// Rasterize and normalize a sketch and print the match request body.
    Normalize {
        /// Recorded strokes (JSON).
        strokes: PathBuf,

        /// Search area as `north,south,east,west`.
        #[arg(long, value_parser = parse_bounds, allow_hyphen_values = true)]
        bounds: GeoBounds,

        /// Also write the canonical shape as a PNG.
        #[arg(long)]
        shape_png: Option<PathBuf>,
    },

    /// Replay a recorded matcher response and print the drawn path as
    /// GeoJSON.
    Replay {
        #[command(flatten)]
        replay: ReplayArgs,

        /// Location key to pan to before submitting.
        #[arg(long, default_value = "replay")]
        location: String,
    },

    /// Print the road-snap path parameter for a replayed match.
    SnapSample {
        #[command(flatten)]
        replay: ReplayArgs,
    },
}

#[derive(Args)]
struct ReplayArgs {
    /// Recorded strokes (JSON).
    strokes: PathBuf,

    /// Recorded matcher response (JSON `{"best": [...], "scale": [...]}`).
    response: PathBuf,

    /// Candidate to draw (0 is the best match).
    #[arg(long, default_value_t = 0)]
    result: usize,

    /// Search area as `north,south,east,west`.
    #[arg(long, value_parser = parse_bounds, allow_hyphen_values = true, default_value = "90,-90,180,-180")]
    bounds: GeoBounds,
}

/// Parse `north,south,east,west` into [`GeoBounds`].
fn parse_bounds(s: &str) -> Result<GeoBounds, String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid bounds {s:?}: {e}"))?;
    let &[north, south, east, west] = values.as_slice() else {
        return Err(format!(
            "invalid bounds {s:?}: expected 4 values, got {}",
            values.len()
        ));
    };
    if north < south {
        return Err(format!("invalid bounds {s:?}: north is below south"));
    }
    Ok(GeoBounds {
        north,
        south,
        east,
        west,
    })
}

/// Build a [`SketchConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.
fn config_from_cli(args: &SketchArgs) -> Result<SketchConfig, String> {
    let config = if let Some(ref json) = args.config_json {
        serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else {
        SketchConfig {
            surface: Dimensions::new(args.width, args.height),
            line_width: args.line_width,
            rasterizer: match args.rasterizer {
                Rasterizer::Stroked => RasterizerKind::Stroked,
                Rasterizer::Bresenham => RasterizerKind::Bresenham,
            },
            snap_point_limit: args.snap_point_limit,
        }
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("Error parsing {}: {e}", path.display()))
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("Error serializing output: {e}"))
}

fn run_normalize(
    config: &SketchConfig,
    strokes: &Path,
    bounds: GeoBounds,
    shape_png: Option<&Path>,
) -> Result<(), String> {
    let points: Vec<StrokePoint> = read_json(strokes)?;
    let prepared = mapsketch_pipeline::prepare(&points, config).map_err(|e| e.to_string())?;
    let offset = prepared.normalized.offset;
    let shape = prepared.normalized.shape;
    eprintln!(
        "Shape: {}x{} at offset ({}, {}), {} traced cells",
        shape.cols(),
        shape.rows(),
        offset.row,
        offset.col,
        shape.grid().traced_count(),
    );

    if let Some(path) = shape_png {
        shape
            .grid()
            .as_image()
            .save(path)
            .map_err(|e| format!("Error writing {}: {e}", path.display()))?;
        eprintln!("Shape written to {}", path.display());
    }

    println!("{}", to_pretty_json(&MatchRequest { shape, bounds })?);
    Ok(())
}

/// Run a session against the recorded response and draw candidate
/// `args.result`.
async fn replay_session(
    config: &SketchConfig,
    args: &ReplayArgs,
    location: &str,
) -> Result<Session, String> {
    let points: Vec<StrokePoint> = read_json(&args.strokes)?;
    let response: MatchResponse = read_json(&args.response)?;
    let service = ReplayService::new(args.bounds, response);

    let mut session = Session::with_config(config.clone());
    session
        .pan_to_location(&service, location)
        .await
        .map_err(|e| e.to_string())?;

    let recorder = session.recorder_mut();
    for p in &points {
        recorder.record_point(p.x, p.y, p.is_continuation);
    }

    session
        .submit(&service)
        .await
        .map_err(|e| format!("Match error: {e}"))?;
    info!("replayed {} match request(s)", service.calls());

    if args.result != 0 {
        session.clear_paths();
        let drawn = session
            .select_result(args.result)
            .map_err(|e| e.to_string())?
            .is_some();
        if !drawn {
            return Err(format!("Result {} out of range", args.result));
        }
    }
    Ok(session)
}

fn paths_geojson(session: &Session, result: usize) -> GeoJson {
    let collection: FeatureCollection = session
        .paths()
        .iter()
        .map(|path| {
            let mut feature = Feature::from(Geometry::from(path));
            feature.set_property("result", result);
            if let Some(anchor) = session
                .results()
                .and_then(|r| r.anchors().get(result).copied())
            {
                feature.set_property("anchor", vec![anchor.lat, anchor.lon]);
            }
            feature
        })
        .collect();
    GeoJson::from(collection)
}

async fn run_replay(config: &SketchConfig, args: &ReplayArgs, location: &str) -> Result<(), String> {
    let session = replay_session(config, args, location).await?;
    println!("{}", to_pretty_json(&paths_geojson(&session, args.result))?);
    Ok(())
}

async fn run_snap_sample(config: &SketchConfig, args: &ReplayArgs) -> Result<(), String> {
    let session = replay_session(config, args, "replay").await?;
    let pending = session
        .begin_snap()
        .ok_or_else(|| "No path to snap".to_string())?;
    eprintln!(
        "Sampled {} of {} points",
        pending.samples().len(),
        session.paths().last().map_or(0, |p| p.0.len()),
    );
    println!("{}", pending.path_param());
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match config_from_cli(&cli.sketch) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = match cli.command {
        Command::Normalize {
            ref strokes,
            bounds,
            ref shape_png,
        } => run_normalize(&config, strokes, bounds, shape_png.as_deref()),
        Command::Replay {
            ref replay,
            ref location,
        } => run_replay(&config, replay, location).await,
        Command::SnapSample { ref replay } => run_snap_sample(&config, replay).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}
