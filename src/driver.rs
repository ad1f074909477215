//! Fixed-rate tick loop owning the engine.
//!
//! Other threads reach the engine only through [`EngineCommand`]s. After each
//! tick the loop publishes a snapshot into the shared [`AppState`].

use crate::engine::{Engine, SettingsUpdate};
use crate::error::AppError;
use crate::frames::{FrameInput, FrameSource};
use crate::report;
use crate::state::AppState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(33);
const ELAPSED_PUBLISH_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Start,
    BeginWelding,
    PauseWelding,
    Stop,
    Calibrate,
    UpdateSettings(SettingsUpdate),
}

#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<EngineCommand>,
}

impl CommandSender {
    pub fn send(&self, command: EngineCommand) -> Result<(), AppError> {
        self.tx.send(command).map_err(|_| AppError::CommandChannel)
    }
}

pub fn command_channel() -> (CommandSender, Receiver<EngineCommand>) {
    let (tx, rx) = mpsc::channel();
    (CommandSender { tx }, rx)
}

pub struct Driver {
    engine: Engine,
    frames: Box<dyn FrameSource + Send>,
    commands: Receiver<EngineCommand>,
    state: Arc<RwLock<AppState>>,
    last_elapsed_publish_ms: Option<u64>,
}

impl Driver {
    pub fn new(
        engine: Engine,
        frames: Box<dyn FrameSource + Send>,
        commands: Receiver<EngineCommand>,
        state: Arc<RwLock<AppState>>,
    ) -> Self {
        Self {
            engine,
            frames,
            commands,
            state,
            last_elapsed_publish_ms: None,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Drain pending commands, run one tick and publish the outcome.
    pub fn step(&mut self, now_ms: u64) -> Result<(), AppError> {
        self.drain_commands(now_ms)?;

        let input = match self.frames.next_frame(now_ms) {
            Ok(input) => input,
            Err(err) => {
                warn!(error = %err, "Frame source failed, ticking without a frame");
                FrameInput::empty(now_ms)
            }
        };
        let tick = self.engine.tick(&input);

        let mut guard = self.state.write().map_err(|_| AppError::StateLock)?;
        publish(guard.set_snapshot(self.engine.snapshot(now_ms)))?;
        guard.set_overlay(tick.overlay);

        let due = self
            .last_elapsed_publish_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= ELAPSED_PUBLISH_INTERVAL_MS);
        if due {
            let elapsed = self.engine.session().elapsed_ms(now_ms).unwrap_or(0);
            publish(guard.set_elapsed(report::format_elapsed(elapsed)))?;
            self.last_elapsed_publish_ms = Some(now_ms);
        }
        Ok(())
    }

    fn drain_commands(&mut self, now_ms: u64) -> Result<(), AppError> {
        loop {
            match self.commands.try_recv() {
                Ok(command) => self.apply(command, now_ms)?,
                Err(TryRecvError::Empty) => return Ok(()),
                // Every sender gone: keep ticking, nothing more will arrive.
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }
    }

    fn apply(&mut self, command: EngineCommand, now_ms: u64) -> Result<(), AppError> {
        debug!(command = ?command, now_ms, "Applying engine command");
        match command {
            EngineCommand::Start => {
                self.engine.start(now_ms);
            }
            EngineCommand::BeginWelding => {
                self.engine.begin_welding(now_ms);
            }
            EngineCommand::PauseWelding => {
                self.engine.pause_welding();
            }
            EngineCommand::Stop => {
                if let Some(results) = self.engine.stop(now_ms) {
                    let mut guard = self.state.write().map_err(|_| AppError::StateLock)?;
                    publish(guard.set_results(results))?;
                }
            }
            EngineCommand::Calibrate => {
                self.engine.calibrate_zero(now_ms);
            }
            EngineCommand::UpdateSettings(update) => {
                self.engine.apply_settings(update);
            }
        }
        Ok(())
    }
}

/// The stored value is updated even when nobody is subscribed.
fn publish(result: Result<(), AppError>) -> Result<(), AppError> {
    match result {
        Err(AppError::WatchSend) => Ok(()),
        other => other,
    }
}

pub fn spawn_tick_thread(
    mut driver: Driver,
    interval: Duration,
    stop: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let origin = Instant::now();
        info!(
            interval_ms = interval.as_millis(),
            source = ?driver.engine().snapshot(0).source,
            "Tick thread started"
        );

        while !stop.load(Ordering::Relaxed) {
            let tick_start = Instant::now();
            let now_ms = origin.elapsed().as_millis() as u64;

            if let Err(err) = driver.step(now_ms) {
                warn!(error = %err, "Tick failed");
            }

            sleep_until_next_tick(interval, tick_start);
        }
        info!("Tick thread stopped");
    })
}

fn sleep_until_next_tick(interval: Duration, start: Instant) {
    let elapsed = start.elapsed();
    if elapsed < interval {
        std::thread::sleep(interval - elapsed);
    }
}
