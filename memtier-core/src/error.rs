use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClockError {
    #[error("Virtual clock is already running")]
    AlreadyRunning,

    #[error("Virtual clock was stopped and cannot be restarted")]
    Stopped,

    #[error("Failed to spawn ticker thread: {0}")]
    Spawn(#[from] std::io::Error),
}
