//! Async runtime for the tactical engine.
//!
//! This crate hosts everything that touches the outside world: the TCP
//! transport speaking the game bridge protocol, the entity manager that
//! turns actor queries into immutable snapshots, and the worker loop
//! architecture that drives the pure engine in `vanguard-core` at a
//! fixed cadence.
//!
//! The [`Controller`] is the composition root. It spawns three workers:
//!
//! - connection: keeps the transport connected, exponential backoff
//! - refresh: polls actor state and publishes snapshots over a watch
//!   channel
//! - control: runs the tactical cycle each tick and dispatches orders
//!
//! Only the control worker mutates the assignment set; everyone else
//! reads snapshots. Shutdown is cooperative via a watch flag and the
//! transport outlives every worker.

pub mod controller;
pub mod error;
pub mod manager;
pub mod transport;
pub mod workers;

pub use controller::{Controller, ControllerBuilder, ControllerConfig, ControllerHandle};
pub use error::{Result, RuntimeError, TransportError};
pub use manager::{EntityManager, ManagerConfig};
pub use transport::{TcpTransport, Transport, TransportConfig};
pub use workers::{BackoffConfig, Command, StatusReport};
