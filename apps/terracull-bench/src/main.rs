//! Terracull synthetic terrain walkthrough
//!
//! Builds a rolling heightmap terrain out of region occluders, then flies a
//! camera across it while an occlusion worker thread runs one pass per frame.
//! Visible regions feed the light texture and the cluster draw lists so the
//! whole pipeline runs end to end.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -p terracull-bench -- [OPTIONS]
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level (e.g., info, debug, trace)

mod scene;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use crossbeam::channel::{self, Receiver, Sender};
use glam::{DVec3, Vec3};
use terracull_occlusion::{
    save_raster_image, FrustumExchange, FrustumSnapshot, Occluder, OccluderConfig, TerrainCamera,
};
use terracull_region::{OcclusionPass, PassStats, RegionStorage};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::scene::{FrameOutput, SceneFeed};

/// Walkthrough parameters (from CLI or defaults).
#[derive(Debug, Clone)]
struct BenchConfig {
    /// Horizontal terrain radius in chunks.
    radius: i32,
    /// Occlusion view distance in chunks.
    view_distance: i32,
    frames: u32,
    /// Blocks the camera moves per frame.
    speed: f64,
    light_capacity: usize,
    raster_dir: Option<PathBuf>,
    /// Final raster written synchronously after the last frame.
    dump_raster: Option<PathBuf>,
    trace: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            radius: 24,
            view_distance: 16,
            frames: 60,
            speed: 4.0,
            light_capacity: 512,
            raster_dir: None,
            dump_raster: None,
            trace: false,
        }
    }
}

impl BenchConfig {
    /// Parse parameters from command line arguments.
    fn from_args() -> Self {
        let mut config = Self::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            let value = args.get(i + 1);
            match args[i].as_str() {
                "--radius" => {
                    if let Some(v) = value.and_then(|v| v.parse().ok()) {
                        config.radius = v;
                        i += 1;
                    }
                }
                "--view-distance" => {
                    if let Some(v) = value.and_then(|v| v.parse().ok()) {
                        config.view_distance = v;
                        i += 1;
                    }
                }
                "--frames" => {
                    if let Some(v) = value.and_then(|v| v.parse().ok()) {
                        config.frames = v;
                        i += 1;
                    }
                }
                "--speed" => {
                    if let Some(v) = value.and_then(|v| v.parse().ok()) {
                        config.speed = v;
                        i += 1;
                    }
                }
                "--light-capacity" => {
                    if let Some(v) = value.and_then(|v| v.parse().ok()) {
                        config.light_capacity = v;
                        i += 1;
                    }
                }
                "--raster-dir" => {
                    if let Some(v) = value {
                        config.raster_dir = Some(PathBuf::from(v));
                        i += 1;
                    }
                }
                "--dump-raster" => {
                    if let Some(v) = value {
                        config.dump_raster = Some(PathBuf::from(v));
                        i += 1;
                    }
                }
                "--trace" => config.trace = true,
                other => warn!("Ignoring unknown argument {other}"),
            }
            i += 1;
        }

        config
    }
}

struct FrameReport {
    frame: u32,
    stats: PassStats,
    elapsed: Duration,
    output: FrameOutput,
}

fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "-h" || arg == "--help") {
        print_help();
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = BenchConfig::from_args();
    info!("Terracull walkthrough: {config:?}");

    let build_start = Instant::now();
    let storage = scene::build_terrain(config.radius);
    info!(
        "Built terrain with {} regions in {:.2?}",
        storage.len(),
        build_start.elapsed()
    );

    let mut occluder_config = OccluderConfig::new().with_trace_outcomes(config.trace);
    if let Some(dir) = &config.raster_dir {
        occluder_config = occluder_config.with_raster_output_dir(dir.clone());
    }

    let exchange = FrustumExchange::new();
    let (frame_tx, frame_rx) = channel::bounded::<u32>(1);
    let (report_tx, report_rx) = channel::unbounded::<FrameReport>();

    let mut camera = TerrainCamera::new(
        DVec3::new(-f64::from(config.radius) * 8.0, scene::surface_height(0, 0) + 24.0, 0.0),
        Vec3::X,
    );

    let occluder = Occluder::new(occluder_config);
    let (config_ref, exchange_ref) = (&config, &exchange);

    std::thread::scope(|s| -> anyhow::Result<()> {
        let worker = std::thread::Builder::new()
            .name("occlusion".to_string())
            .spawn_scoped(s, move || {
                occlusion_worker(config_ref, storage, occluder, exchange_ref, &frame_rx, &report_tx);
            })?;

        let mut totals = PassStats::default();
        let mut total_time = Duration::ZERO;

        for frame in 0..config.frames {
            move_camera(&mut camera, frame, config.speed);
            exchange.publish(FrustumSnapshot::capture(&camera));
            frame_tx.send(frame)?;

            let report = report_rx.recv()?;
            log_report(&report);

            totals.visited += report.stats.visited;
            totals.visible += report.stats.visible;
            totals.occluded += report.stats.occluded;
            totals.reused += report.stats.reused;
            totals.drawn += report.stats.drawn;
            total_time += report.elapsed;
        }

        drop(frame_tx);
        worker.join().map_err(|_| anyhow!("occlusion worker panicked"))?;

        let frames = config.frames.max(1);
        info!(
            "{} frames: avg pass {:.2?}, avg visited {}, avg visible {}, avg occluded {}, reused {}, drawn {}",
            config.frames,
            total_time / frames,
            totals.visited / frames,
            totals.visible / frames,
            totals.occluded / frames,
            totals.reused,
            totals.drawn
        );
        Ok(())
    })
}

/// Glide forward with a slow sway so both position and view change.
fn move_camera(camera: &mut TerrainCamera, frame: u32, speed: f64) {
    let t = f64::from(frame);
    let mut pos = camera.position();
    pos.x += speed;
    pos.z = (t * 0.05).sin() * 32.0;
    let target_y = scene::surface_height(pos.x as i32, pos.z as i32) + 8.0;
    pos.y += (target_y - pos.y) * 0.5;
    camera.set_position(pos);

    let yaw = (t * 0.03).sin() as f32 * 0.6;
    camera.set_direction(Vec3::new(yaw.cos(), -0.15, yaw.sin()));
}

fn occlusion_worker(
    config: &BenchConfig,
    mut storage: RegionStorage,
    mut occluder: Occluder,
    exchange: &FrustumExchange,
    frames: &Receiver<u32>,
    reports: &Sender<FrameReport>,
) {
    let mut pass = OcclusionPass::new(config.view_distance);
    let mut feed = SceneFeed::new(config.light_capacity);

    while let Ok(frame) = frames.recv() {
        if let Some(snapshot) = exchange.take() {
            occluder.update_frustum(&snapshot);
        }

        let start = Instant::now();
        let stats = pass.run(&mut storage, &mut occluder);
        let elapsed = start.elapsed();

        let output = feed.process(&storage, pass.visible_regions(), pass.backface_flags());

        if reports
            .send(FrameReport {
                frame,
                stats,
                elapsed,
                output,
            })
            .is_err()
        {
            break;
        }
    }

    if let Some(path) = &config.dump_raster {
        if let Err(e) = save_raster_image(occluder.raster(), path) {
            warn!("Couldn't write occlusion raster to {}: {e}", path.display());
        }
    }

    if config.raster_dir.is_some() {
        occluder.output_raster(true);
        info!("Requested raster image at {}", occluder.config().raster_output_path().display());
    }
}

fn log_report(report: &FrameReport) {
    let stats = &report.stats;
    info!(
        "frame {:>3}: {:>8.2?} redrawn:{} visited:{} visible:{} occluded:{} reused:{} drawn:{} | light uploads:{} | solid specs:{} translucent specs:{} index slabs:{}",
        report.frame,
        report.elapsed,
        stats.redrawn,
        stats.visited,
        stats.visible,
        stats.occluded,
        stats.reused,
        stats.drawn,
        report.output.light_uploads,
        report.output.solid_specs,
        report.output.translucent_specs,
        report.output.index_slabs
    );
}

fn print_help() {
    eprintln!(
        "Terracull synthetic terrain walkthrough

USAGE:
    cargo run --release -p terracull-bench -- [OPTIONS]

OPTIONS:
    --radius <N>            Horizontal terrain radius in chunks (default: 24)
    --view-distance <N>     Occlusion view distance in chunks (default: 16)
    --frames <N>            Frames to simulate (default: 60)
    --speed <BLOCKS>        Camera movement per frame (default: 4.0)
    --light-capacity <N>    Light texture capacity in regions (default: 512)
    --raster-dir <DIR>      Write the final occlusion raster as a PNG into DIR
                            in the background
    --dump-raster <PATH>    Write the final occlusion raster to PATH before exiting
    --trace                 Log occlusion redraw causes and pass progression
    -h, --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG                Set log level (e.g., info, debug, trace)"
    );
}
