//! Socket transport to the game engine.
//!
//! [`Transport`] is the seam between the control loops and the engine:
//! production code uses [`TcpTransport`], tests inject a scripted
//! implementation. Queries are request/response with a timeout; attack
//! and move commands are fire-and-forget: the engine may drop them, and
//! the next refresh observes whatever actually happened.

mod tcp;
pub mod wire;

use async_trait::async_trait;

use vanguard_core::{EntityId, Faction, MoveOrder, ObservedActor};

pub use crate::error::TransportError;
pub use tcp::{TcpTransport, TransportConfig};

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// One connection attempt. Called by the connection worker on its
    /// backoff schedule; implementations must not sleep internally.
    async fn ensure_connected(&self) -> Result<(), TransportError>;

    /// True when a live connection exists right now.
    fn is_connected(&self) -> bool;

    /// Full visible unit list for one faction.
    async fn query_actors(&self, faction: Faction) -> Result<Vec<ObservedActor>, TransportError>;

    /// Fire-and-forget attack command.
    async fn attack(&self, attacker: EntityId, target: EntityId) -> Result<(), TransportError>;

    /// Fire-and-forget movement command.
    async fn move_actor(&self, order: &MoveOrder) -> Result<(), TransportError>;
}
