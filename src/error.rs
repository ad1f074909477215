use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("frame source error: {0}")]
    FrameSource(String),
    #[error("feedback sink error: {0}")]
    Feedback(String),
    #[error("engine command channel closed")]
    CommandChannel,
    #[error("watch channel send failed")]
    WatchSend,
    #[error("state lock poisoned")]
    StateLock,
}
