use std::sync::{Arc, RwLock};
use time::OffsetDateTime;
use weld_trainer::driver::{self, Driver, EngineCommand};
use weld_trainer::engine::{Engine, EngineConfig};
use weld_trainer::error::AppError;
use weld_trainer::feedback::FeedbackEvent;
use weld_trainer::feedback::mock::RecordingSink;
use weld_trainer::frames::FrameSource;
use weld_trainer::frames::mock::{MockFrame, MockFrameSource};
use weld_trainer::frames::synthetic::SyntheticFrameSource;
use weld_trainer::pose::PoseStatus;
use weld_trainer::pose::tilt::DeviceTiltSource;
use weld_trainer::pose::vision::VisionMarkerSource;
use weld_trainer::profile::ProcessKind;
use weld_trainer::report;
use weld_trainer::scoring::{MetricKind, ResultsStatus};
use weld_trainer::state::AppState;

#[test]
fn synthetic_pass_is_tracked_and_scored() -> Result<(), Box<dyn std::error::Error>> {
    let sink = RecordingSink::new();
    let mut engine = Engine::new(
        Box::new(VisionMarkerSource::with_defaults()),
        Box::new(sink.clone()),
        EngineConfig::default(),
    );
    let mut frames = SyntheticFrameSource::default();

    engine.begin_welding(0);
    for ts in (0..=900).step_by(30) {
        let input = frames.next_frame(ts)?;
        let tick = engine.tick(&input);
        assert_eq!(tick.estimate.status, PoseStatus::Tracking);
        assert!(tick.recorded);
    }
    let results = engine.stop(1000).ok_or("no results")?;

    assert_eq!(results.status, ResultsStatus::Scored);
    for metric in MetricKind::PRIORITY {
        assert!(results.metrics.get(metric).is_some(), "{metric:?} missing");
    }
    let speed = results
        .metrics
        .speed
        .and_then(|m| m.average)
        .ok_or("no speed")?;
    assert!((6.0..10.0).contains(&speed), "speed {speed}");
    let straightness = results.metrics.straightness.ok_or("no straightness")?;
    assert!(straightness.score > 90.0);
    let final_score = results.final_score.ok_or("no final score")?;
    assert!((0.0..=100.0).contains(&final_score));
    assert_eq!(sink.count(FeedbackEvent::ArcStarted), 2);

    let text = report::render(&results, engine.material(), OffsetDateTime::UNIX_EPOCH);
    assert!(text.contains("Straightness:"));
    Ok(())
}

#[test]
fn mig_stability_scenario_through_driver() -> Result<(), Box<dyn std::error::Error>> {
    let angles = [20.0, 20.0, 20.0, 22.0, 18.0, 20.0, 20.0, 20.0, 20.0, 20.0];
    let script = angles.iter().map(|a| MockFrame::Tilt(*a)).collect();
    let engine = Engine::new(
        Box::new(DeviceTiltSource::new()),
        Box::new(RecordingSink::new()),
        EngineConfig::default(),
    );
    let (commands, command_rx) = driver::command_channel();
    let state = Arc::new(RwLock::new(AppState::new()));
    let results_rx = {
        let guard = state.read().map_err(|_| AppError::StateLock)?;
        guard.subscribe_results()
    };
    let mut driver = Driver::new(
        engine,
        Box::new(MockFrameSource::new(script)),
        command_rx,
        Arc::clone(&state),
    );

    commands.send(EngineCommand::BeginWelding)?;
    for step in 0..angles.len() as u64 {
        driver.step(step * 33)?;
    }
    commands.send(EngineCommand::Stop)?;
    driver.step(2000)?;

    let results = results_rx.borrow().clone().ok_or("no results")?;
    let stability = 100.0 - 10.0 * 0.8f64.sqrt();
    assert_eq!(results.sample_count, 10);
    assert_eq!(results.metrics.angle.map(|m| m.score), Some(100.0));
    let recorded = results.metrics.stability.ok_or("no stability")?.score;
    assert!((recorded - stability).abs() < 1e-9);
    assert!(results.metrics.speed.is_none());
    assert!(results.metrics.distance.is_none());

    let expected = (100.0 * 0.25 + stability * 0.2) / 0.45;
    let final_score = results.final_score.ok_or("no final score")?;
    assert!((final_score - expected).abs() < 1e-9);
    Ok(())
}

#[test]
fn paused_ticks_and_process_switch() -> Result<(), Box<dyn std::error::Error>> {
    let mut script = vec![MockFrame::Tilt(8.0); 3];
    script.extend(vec![MockFrame::Tilt(40.0); 3]);
    script.push(MockFrame::Tilt(8.0));
    let engine = Engine::new(
        Box::new(DeviceTiltSource::new()),
        Box::new(RecordingSink::new()),
        EngineConfig::default(),
    );
    let (commands, command_rx) = driver::command_channel();
    let state = Arc::new(RwLock::new(AppState::new()));
    let mut driver = Driver::new(
        engine,
        Box::new(MockFrameSource::new(script)),
        command_rx,
        Arc::clone(&state),
    );

    commands.send(EngineCommand::BeginWelding)?;
    for ts in [0, 100, 200] {
        driver.step(ts)?;
    }
    commands.send(EngineCommand::PauseWelding)?;
    for ts in [300, 400, 500] {
        driver.step(ts)?;
    }
    commands.send(EngineCommand::UpdateSettings(
        weld_trainer::engine::SettingsUpdate {
            process: Some(ProcessKind::Stick),
            ..Default::default()
        },
    ))?;
    commands.send(EngineCommand::BeginWelding)?;
    driver.step(600)?;
    commands.send(EngineCommand::Stop)?;
    driver.step(700)?;

    let guard = state.read().map_err(|_| AppError::StateLock)?;
    let results = guard.results().ok_or("no results")?;
    assert_eq!(results.sample_count, 4);
    assert_eq!(results.process, ProcessKind::Stick);
    // Three MIG samples 7 deg low, one stick sample in band.
    let angle = results.metrics.angle.ok_or("no angle")?.score;
    assert!((angle - 25.0).abs() < 1e-9);
    assert_eq!(results.angle_in_band_percent, Some(25.0));
    Ok(())
}
