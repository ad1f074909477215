use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing_subscriber::filter::LevelFilter;
use weld_trainer::config::{self, Config, PoseSourceKind};
use weld_trainer::driver::{self, Driver};
use weld_trainer::engine::Engine;
use weld_trainer::feedback::LogSink;
use weld_trainer::frames::synthetic::SyntheticFrameSource;
use weld_trainer::pose::PoseSource;
use weld_trainer::pose::detect::MarkerDetector;
use weld_trainer::pose::simulated::SimulatedSource;
use weld_trainer::pose::tilt::DeviceTiltSource;
use weld_trainer::pose::vision::VisionMarkerSource;
use weld_trainer::{api, state};

fn init_tracing(level: &str) {
    let level = level.parse::<LevelFilter>().unwrap_or(LevelFilter::INFO);
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn build_pose_source(config: &Config) -> Box<dyn PoseSource> {
    match config.pose_source() {
        PoseSourceKind::Vision => Box::new(VisionMarkerSource::new(
            MarkerDetector::new(config.detector_config()),
            config.distance_calibration(),
            config.angle_smoothing(),
        )),
        PoseSourceKind::Tilt => Box::new(DeviceTiltSource::new()),
        PoseSourceKind::Simulated => Box::new(SimulatedSource::default()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_default()?;
    init_tracing(config.log_level());
    tracing::info!(
        config_path = config::DEFAULT_CONFIG_PATH,
        app = %config.app.name,
        "weld-trainer starting"
    );

    let state = Arc::new(RwLock::new(state::AppState::new()));
    let (commands, command_rx) = driver::command_channel();
    match state.write() {
        Ok(mut guard) => guard.set_commands(commands),
        Err(_) => tracing::warn!("State lock poisoned while installing command channel"),
    }

    let source = build_pose_source(&config);
    let engine_config = config.engine_config();
    tracing::info!(
        source = ?config.pose_source(),
        process = %engine_config.process,
        material = %engine_config.material,
        "Engine configured"
    );
    let engine = Engine::new(source, Box::new(LogSink), engine_config);
    let frames = Box::new(SyntheticFrameSource::default());
    let driver = Driver::new(engine, frames, command_rx, Arc::clone(&state));

    let stop_flag = Arc::new(AtomicBool::new(false));
    let tick_handle =
        driver::spawn_tick_thread(driver, config.tick_interval(), Arc::clone(&stop_flag));

    let app = api::router(Arc::clone(&state));
    let port = config.server_port();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;

    stop_flag.store(true, Ordering::Relaxed);
    if tick_handle.join().is_err() {
        tracing::warn!("Tick thread panicked");
    }

    Ok(())
}
