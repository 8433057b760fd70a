use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use mapsync_app::{
    app_dir, ControllerConfig, ControllerSignal, MapController, Replayer, SessionScript,
    SimulatedEngine,
};
use mapsync_search::{ChannelTransport, InMemoryIndex};

/// Surface size of the simulated map, in pixels.
const SURFACE_WIDTH: u32 = 1280;
const SURFACE_HEIGHT: u32 = 720;
/// Demo grid: entities per side and spacing in degrees.
const DEMO_GRID_SIDE: u32 = 21;
const DEMO_GRID_SPACING: f64 = 0.01;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replays a map session against the viewport-synchronized search controller.", long_about = None)]
struct Cli {
    /// Controller settings file. Defaults to mapsync.json next to the executable.
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON array of entities to index. Defaults to a generated grid.
    #[arg(long)]
    entities: Option<PathBuf>,

    /// Session script to replay. Defaults to the built-in demo session.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Sleep through waits instead of advancing a virtual clock.
    #[arg(long)]
    realtime: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting MapSync session replay");

    if let Err(e) = run(Cli::parse()) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> mapsync_app::Result<()> {
    let config_path = cli.config.unwrap_or_else(app_dir::config_path);
    let config = ControllerConfig::load(&config_path);

    let index = match &cli.entities {
        Some(path) => InMemoryIndex::from_json(&fs::read_to_string(path)?)?,
        None => InMemoryIndex::demo_grid(
            config.initial_viewport.center(),
            DEMO_GRID_SIDE,
            DEMO_GRID_SIDE,
            DEMO_GRID_SPACING,
        ),
    };
    info!(entities = index.len(), "Search index ready");

    let script = match &cli.script {
        Some(path) => SessionScript::load(path)?,
        None => SessionScript::demo(),
    };

    let engine = SimulatedEngine::new(SURFACE_WIDTH, SURFACE_HEIGHT).with_tile_size(config.tile_size_px);
    let transport = ChannelTransport::spawn(index);
    let mut controller = MapController::new(engine, transport, &config);
    controller.attach();

    let mut replayer = Replayer::new(cli.realtime);
    let signals = replayer.run(&mut controller, &script)?;
    for signal in &signals {
        log_signal(signal);
    }

    let vp = controller.viewport();
    info!(
        steps = script.steps.len(),
        signals = signals.len(),
        results = controller.results().len(),
        lat = vp.latitude,
        lng = vp.longitude,
        zoom = vp.zoom,
        "Session finished"
    );
    controller.teardown();
    Ok(())
}

fn log_signal(signal: &ControllerSignal) {
    match signal {
        ControllerSignal::ResultsPublished { sequence, count } => {
            info!(sequence, count, "Results published")
        }
        ControllerSignal::PanelOpened(id) => info!(%id, "Panel opened"),
        ControllerSignal::PanelClosed => info!("Panel closed"),
        ControllerSignal::ScrollListTo(id) => info!(%id, "Scroll list to entity"),
        ControllerSignal::MapDegraded => info!("Map degraded"),
        ControllerSignal::MapRecovered => info!("Map recovered"),
    }
}
