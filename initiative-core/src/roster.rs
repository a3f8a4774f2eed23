//! The roster store: the single writer of entity state.
//!
//! Entities keep insertion order until [`RosterStore::recalculate_order`] is
//! called. A store built with [`RosterStore::with_events`] queues a
//! [`RosterEvent`] for every mutation that changes state; those events
//! describe the authoritative model only and are kept apart from view-level
//! notifications.

use crate::entity::{Entity, EntityId, EntityPatch};
use std::collections::HashSet;
use tracing::debug;

/// A change to the authoritative roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterEvent {
    /// An entity was appended.
    Created { id: EntityId },

    /// An entity was merged with a patch; carries the post-merge record.
    Patched { entity: Entity },

    /// An entity was deleted.
    Removed { id: EntityId },

    /// The roster was emptied; carries every id that was dropped.
    Cleared { ids: Vec<EntityId> },

    /// The roster was re-sorted by initiative.
    Reordered,
}

/// Ordered collection of entities for the current encounter.
#[derive(Debug, Clone, Default)]
pub struct RosterStore {
    entities: Vec<Entity>,
    /// `None` unless event recording was requested.
    events: Option<Vec<RosterEvent>>,
}

impl RosterStore {
    /// Create an empty roster that records no events.
    ///
    /// Use [`RosterStore::with_events`] to have mutations queued as
    /// [`RosterEvent`]s. A recording store keeps every event until
    /// [`RosterStore::drain_events`] is called, so its owner must drain it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn on event recording. Events already queued are kept.
    pub fn with_events(mut self) -> Self {
        self.events.get_or_insert_with(Vec::new);
        self
    }

    /// Whether mutations are being queued as events.
    pub fn records_events(&self) -> bool {
        self.events.is_some()
    }

    /// Rebuild a roster from stored records, normalising each one.
    ///
    /// Order is preserved as given. Callers are expected to have checked id
    /// uniqueness; see [`crate::persist`].
    pub fn from_entities(entities: Vec<Entity>) -> Self {
        let entities = entities
            .into_iter()
            .map(|mut entity| {
                entity.normalize();
                entity
            })
            .collect();

        Self {
            entities,
            events: None,
        }
    }

    /// Append a blank entity with a fresh id and return a copy of it.
    pub fn create(&mut self) -> Entity {
        let id = self.fresh_id();
        let entity = Entity::new(id);
        self.entities.push(entity.clone());
        self.record(RosterEvent::Created { id });
        debug!(%id, "entity created");
        entity
    }

    /// Merge `patch` into the entity with `id`.
    ///
    /// Unknown ids are ignored: UI events can arrive for an entity that has
    /// already been removed.
    pub fn patch(&mut self, id: EntityId, patch: EntityPatch) {
        let Some(entity) = self.entities.iter_mut().find(|e| e.id == id) else {
            debug!(%id, "patch for unknown entity ignored");
            return;
        };

        entity.apply(&patch);
        if let Some(events) = self.events.as_mut() {
            events.push(RosterEvent::Patched {
                entity: entity.clone(),
            });
        }
    }

    /// Delete the entity with `id`, if present.
    pub fn remove(&mut self, id: EntityId) {
        let before = self.entities.len();
        self.entities.retain(|e| e.id != id);

        if self.entities.len() != before {
            self.record(RosterEvent::Removed { id });
            debug!(%id, "entity removed");
        }
    }

    /// Remove every entity.
    pub fn clear(&mut self) {
        let ids = self.entities.drain(..).map(|e| e.id).collect::<Vec<_>>();
        debug!(count = ids.len(), "roster cleared");
        self.record(RosterEvent::Cleared { ids });
    }

    /// Sort by initiative, highest first. Ties keep their current order.
    pub fn recalculate_order(&mut self) {
        // `sort_by` is stable
        self.entities.sort_by(|a, b| b.initiative.cmp(&a.initiative));
        self.record(RosterEvent::Reordered);
        debug!(count = self.entities.len(), "roster reordered by initiative");
    }

    /// The roster in its current order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Zero-based position of `id` in the current order.
    pub fn position(&self, id: EntityId) -> Option<usize> {
        self.entities.iter().position(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Take every queued event, oldest first. Empty when not recording.
    pub fn drain_events(&mut self) -> Vec<RosterEvent> {
        self.events.as_mut().map(std::mem::take).unwrap_or_default()
    }

    fn record(&mut self, event: RosterEvent) {
        if let Some(events) = self.events.as_mut() {
            events.push(event);
        }
    }

    /// Generate an id not already present in the roster.
    fn fresh_id(&self) -> EntityId {
        let taken: HashSet<EntityId> = self.entities.iter().map(|e| e.id).collect();
        loop {
            let id = EntityId::new();
            if !taken.contains(&id) {
                return id;
            }
        }
    }
}
