//! Authoritative entity state, refreshed from the engine and published as
//! immutable snapshots.
//!
//! The manager is the only writer of entity state. Each successful
//! `refresh()` builds a fresh [`Snapshot`] and publishes it over a watch
//! channel: readers always see either the previous complete snapshot or
//! the new complete one, never a half-built state. A failed refresh
//! leaves the previous snapshot current.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use vanguard_core::{
    EntityId, Faction, Snapshot, SnapshotBuilder, ThreatConfig, UnitCatalog,
};

use crate::error::TransportError;
use crate::transport::Transport;

/// Entity-manager tuning.
#[derive(Clone, Copy, Debug)]
pub struct ManagerConfig {
    /// Consecutive refreshes an entity may be absent before eviction.
    /// Bridges single-frame sensor flicker without keeping ghosts around.
    pub eviction_misses: u32,
    pub threat: ThreatConfig,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            eviction_misses: 3,
            threat: ThreatConfig::default(),
        }
    }
}

pub struct EntityManager<T: Transport> {
    transport: Arc<T>,
    catalog: Arc<UnitCatalog>,
    config: ManagerConfig,
    version: u64,
    /// Refreshes each currently-tracked entity has been absent for.
    misses: HashMap<EntityId, u32>,
    publisher: watch::Sender<Arc<Snapshot>>,
}

impl<T: Transport> EntityManager<T> {
    pub fn new(
        transport: Arc<T>,
        catalog: Arc<UnitCatalog>,
        config: ManagerConfig,
    ) -> (Self, watch::Receiver<Arc<Snapshot>>) {
        let (publisher, subscriber) = watch::channel(Arc::new(Snapshot::default()));
        (
            Self {
                transport,
                catalog,
                config,
                version: 0,
                misses: HashMap::new(),
                publisher,
            },
            subscriber,
        )
    }

    /// Query both factions, rebuild the snapshot, and publish it.
    ///
    /// Either query failing aborts the whole refresh: a snapshot with one
    /// side current and the other stale would invent or hide contacts.
    pub async fn refresh(&mut self) -> Result<Arc<Snapshot>, TransportError> {
        let allies = self.transport.query_actors(Faction::Ally).await?;
        let enemies = self.transport.query_actors(Faction::Enemy).await?;

        let previous = self.publisher.borrow().clone();
        self.version += 1;

        let mut builder =
            SnapshotBuilder::new(self.catalog.clone(), self.config.threat, self.version);
        let mut seen: Vec<EntityId> = Vec::with_capacity(allies.len() + enemies.len());
        for observed in allies.into_iter().chain(enemies) {
            seen.push(observed.id);
            builder.observe(observed);
        }

        // Carry entities still inside their eviction grace window.
        for id in &seen {
            self.misses.remove(id);
        }
        for entity in previous.iter() {
            if seen.contains(&entity.id) {
                continue;
            }
            let missed = self.misses.entry(entity.id).or_insert(0);
            *missed += 1;
            if *missed < self.config.eviction_misses {
                builder.carry(entity.clone());
            } else {
                debug!(target: "vanguard::manager", id = %entity.id, "entity evicted");
            }
        }
        self.misses
            .retain(|_, missed| *missed < self.config.eviction_misses);

        let snapshot = Arc::new(builder.build());
        self.publisher.send_replace(snapshot.clone());
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use vanguard_core::{MoveOrder, ObservedActor, Position};

    /// Serves a scripted sequence of query results.
    struct ScriptedTransport {
        frames: Mutex<Vec<Vec<ObservedActor>>>,
    }

    impl ScriptedTransport {
        fn new(mut frames: Vec<Vec<ObservedActor>>) -> Self {
            frames.reverse();
            Self {
                frames: Mutex::new(frames),
            }
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn ensure_connected(&self) -> Result<(), TransportError> {
            Ok(())
        }

        fn is_connected(&self) -> bool {
            true
        }

        async fn query_actors(
            &self,
            faction: Faction,
        ) -> Result<Vec<ObservedActor>, TransportError> {
            let mut frames = self.frames.lock().unwrap();
            let frame = match faction {
                // Each scripted frame covers one full refresh; the ally
                // query pops it, the enemy query sees the same frame.
                Faction::Ally => {
                    if frames.is_empty() {
                        return Err(TransportError::ConnectionLost);
                    }
                    frames.last().cloned().unwrap()
                }
                _ => frames.pop().unwrap_or_default(),
            };
            Ok(frame.into_iter().filter(|a| a.faction == faction).collect())
        }

        async fn attack(&self, _: EntityId, _: EntityId) -> Result<(), TransportError> {
            Ok(())
        }

        async fn move_actor(&self, _: &MoveOrder) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn actor(id: u32, name: &str, faction: Faction, x: i32) -> ObservedActor {
        ObservedActor {
            id: EntityId(id),
            type_name: name.to_string(),
            faction,
            position: Position::new(x, 0),
            hp: Some(100),
            max_hp: Some(100),
        }
    }

    fn manager(
        frames: Vec<Vec<ObservedActor>>,
        eviction_misses: u32,
    ) -> (
        EntityManager<ScriptedTransport>,
        watch::Receiver<Arc<Snapshot>>,
    ) {
        EntityManager::new(
            Arc::new(ScriptedTransport::new(frames)),
            Arc::new(UnitCatalog::standard()),
            ManagerConfig {
                eviction_misses,
                threat: ThreatConfig::default(),
            },
        )
    }

    #[tokio::test]
    async fn refresh_publishes_versioned_snapshots() {
        let frame = vec![
            actor(1, "3tnk", Faction::Ally, 0),
            actor(2, "e1", Faction::Enemy, 5),
        ];
        let (mut mgr, rx) = manager(vec![frame.clone(), frame], 3);

        let first = mgr.refresh().await.unwrap();
        assert_eq!(first.version, 1);
        assert_eq!(first.count(Faction::Ally), 1);
        assert_eq!(first.count(Faction::Enemy), 1);

        let second = mgr.refresh().await.unwrap();
        assert_eq!(second.version, 2);
        // Same engine state: entity sets compare equal across refreshes.
        assert!(first.iter().eq(second.iter()));
        assert!(Arc::ptr_eq(&*rx.borrow(), &second));
    }

    #[tokio::test]
    async fn missing_entity_survives_grace_then_evicts() {
        let full = vec![
            actor(1, "3tnk", Faction::Ally, 0),
            actor(2, "e1", Faction::Enemy, 5),
        ];
        let without_enemy = vec![actor(1, "3tnk", Faction::Ally, 0)];
        let (mut mgr, _rx) = manager(
            vec![full, without_enemy.clone(), without_enemy.clone(), without_enemy],
            2,
        );

        mgr.refresh().await.unwrap();
        // First miss: still carried.
        let snap = mgr.refresh().await.unwrap();
        assert!(snap.contains(EntityId(2)));
        // Second miss: evicted.
        let snap = mgr.refresh().await.unwrap();
        assert!(!snap.contains(EntityId(2)));
        let snap = mgr.refresh().await.unwrap();
        assert!(!snap.contains(EntityId(2)));
    }

    #[tokio::test]
    async fn reappearing_entity_resets_its_miss_count() {
        let full = vec![actor(2, "e1", Faction::Enemy, 5)];
        let empty: Vec<ObservedActor> = vec![];
        let (mut mgr, _rx) = manager(
            vec![full.clone(), empty.clone(), full, empty.clone(), empty],
            3,
        );

        mgr.refresh().await.unwrap();
        mgr.refresh().await.unwrap(); // miss 1
        mgr.refresh().await.unwrap(); // reappears, count resets
        mgr.refresh().await.unwrap(); // miss 1 again
        let snap = mgr.refresh().await.unwrap(); // miss 2, still carried
        assert!(snap.contains(EntityId(2)));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot_published() {
        let frame = vec![actor(1, "3tnk", Faction::Ally, 0)];
        let (mut mgr, rx) = manager(vec![frame], 3);

        let first = mgr.refresh().await.unwrap();
        let err = mgr.refresh().await;
        assert!(matches!(err, Err(TransportError::ConnectionLost)));
        assert!(Arc::ptr_eq(&*rx.borrow(), &first));
    }
}
