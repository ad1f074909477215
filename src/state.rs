use crate::display::Overlay;
use crate::driver::CommandSender;
use crate::engine::EngineSnapshot;
use crate::error::AppError;
use crate::scoring::Results;
use tokio::sync::watch;

/// Latest published view of the engine, shared with the HTTP layer.
///
/// Only the tick thread writes here. Readers get cloned values or subscribe
/// to the watch channels.
#[derive(Debug)]
pub struct AppState {
    snapshot: Option<EngineSnapshot>,
    snapshot_tx: watch::Sender<Option<EngineSnapshot>>,
    overlay: Option<Overlay>,
    results: Option<Results>,
    results_tx: watch::Sender<Option<Results>>,
    elapsed: Option<String>,
    elapsed_tx: watch::Sender<Option<String>>,
    commands: Option<CommandSender>,
}

impl AppState {
    pub fn new() -> Self {
        let (snapshot_tx, _snapshot_rx) = watch::channel(None);
        let (results_tx, _results_rx) = watch::channel(None);
        let (elapsed_tx, _elapsed_rx) = watch::channel(None);
        Self {
            snapshot: None,
            snapshot_tx,
            overlay: None,
            results: None,
            results_tx,
            elapsed: None,
            elapsed_tx,
            commands: None,
        }
    }

    pub fn snapshot(&self) -> Option<&EngineSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn subscribe_snapshot(&self) -> watch::Receiver<Option<EngineSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    pub fn set_snapshot(&mut self, snapshot: EngineSnapshot) -> Result<(), AppError> {
        self.snapshot = Some(snapshot.clone());
        self.snapshot_tx
            .send(Some(snapshot))
            .map_err(|_| AppError::WatchSend)
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn set_overlay(&mut self, overlay: Overlay) {
        self.overlay = Some(overlay);
    }

    pub fn results(&self) -> Option<&Results> {
        self.results.as_ref()
    }

    pub fn subscribe_results(&self) -> watch::Receiver<Option<Results>> {
        self.results_tx.subscribe()
    }

    pub fn set_results(&mut self, results: Results) -> Result<(), AppError> {
        self.results = Some(results.clone());
        self.results_tx
            .send(Some(results))
            .map_err(|_| AppError::WatchSend)
    }

    pub fn elapsed(&self) -> Option<&str> {
        self.elapsed.as_deref()
    }

    pub fn subscribe_elapsed(&self) -> watch::Receiver<Option<String>> {
        self.elapsed_tx.subscribe()
    }

    pub fn set_elapsed(&mut self, elapsed: String) -> Result<(), AppError> {
        self.elapsed = Some(elapsed.clone());
        self.elapsed_tx
            .send(Some(elapsed))
            .map_err(|_| AppError::WatchSend)
    }

    pub fn commands(&self) -> Option<&CommandSender> {
        self.commands.as_ref()
    }

    pub fn set_commands(&mut self, commands: CommandSender) {
        self.commands = Some(commands);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
