//! Background tasks owned by the [`crate::controller::Controller`].
//!
//! Three workers run concurrently: the connection worker keeps the
//! socket alive with backoff, the refresh worker polls entity state and
//! publishes snapshots, and the control worker runs the tactical cycle
//! and dispatches commands.

mod connection;
mod control;
mod refresh;

pub use connection::{BackoffConfig, ConnectionWorker};
pub use control::{Command, ControlWorker, StatusReport};
pub use refresh::RefreshWorker;
