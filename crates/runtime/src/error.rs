//! Unified error types surfaced by the runtime API.
//!
//! Transport failures carry their own taxonomy so callers can tell a dead
//! connection (recovered by background reconnect) from a mid-cycle I/O
//! hiccup (recovered by reusing the last snapshot). Nothing here is fatal
//! to the process; the control loop degrades instead of exiting.

use thiserror::Error;
use tokio::sync::oneshot;

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Failures of the socket transport to the game engine.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No live connection to the engine. The connection worker keeps
    /// retrying with backoff; callers proceed with stale data.
    #[error("engine connection is down")]
    ConnectionLost,

    /// I/O failure mid-request. The connection is dropped and rebuilt.
    #[error("transport i/o failure")]
    Io(#[from] std::io::Error),

    /// The engine did not answer within the request timeout.
    #[error("engine response timed out")]
    Timeout,

    /// The engine answered with something that does not decode, or with
    /// an explicit error status.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Failures of runtime orchestration.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("controller command channel closed")]
    CommandChannelClosed,

    #[error("controller reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),
}
