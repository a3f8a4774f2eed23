//! Testing utilities for the tracker.
//!
//! This module provides tools for integration testing:
//! - `RecordingHooks` for checking slide hook ordering
//! - `EncounterHarness` for scripted roster scenarios
//! - Assertion helpers for verifying roster state

use crate::config::TrackerConfig;
use crate::drag::SlideHooks;
use crate::encounter::Encounter;
use crate::entity::{EntityId, EntityPatch};
use crate::roster::RosterStore;
use std::time::{Duration, Instant};

/// A recorded slide hook call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookCall {
    Start(EntityId),
    End(EntityId),
}

/// Slide hooks that remember every call in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingHooks {
    calls: Vec<HookCall>,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[HookCall] {
        &self.calls
    }
}

impl SlideHooks for RecordingHooks {
    fn on_slide_start(&mut self, id: EntityId) {
        self.calls.push(HookCall::Start(id));
    }

    fn on_slide_end(&mut self, id: EntityId) {
        self.calls.push(HookCall::End(id));
    }
}

/// Test harness for running encounter scenarios on a manual clock.
pub struct EncounterHarness {
    /// The encounter under test.
    pub encounter: Encounter,
    /// Current time of the manual clock.
    pub now: Instant,
}

impl EncounterHarness {
    /// Harness that renders every drag move.
    pub fn new() -> Self {
        Self::with_config(TrackerConfig::default().with_drag_render_interval(Duration::ZERO))
    }

    pub fn with_config(config: TrackerConfig) -> Self {
        Self {
            encounter: Encounter::new(config),
            now: Instant::now(),
        }
    }

    /// Add a named entity with the given stats.
    pub fn spawn(&mut self, name: &str, initiative: i32, hp: i32, max_hp: i32) -> EntityId {
        let id = self.encounter.add_entity();
        self.encounter.patch(
            id,
            EntityPatch::new()
                .name(name)
                .initiative(initiative)
                .max_hp(max_hp)
                .hp(hp),
        );
        id
    }

    /// Advance the manual clock.
    pub fn advance(&mut self, by: Duration) -> &mut Self {
        self.now += by;
        self
    }

    /// Start a drag, move through `values`, and release. Returns the hp the
    /// store holds afterwards.
    pub fn scrub(&mut self, id: EntityId, values: &[i32]) -> Option<i32> {
        self.encounter.drag_start_at(id, self.now);
        for &value in values {
            self.encounter.drag_move_at(id, value, self.now);
        }
        self.encounter.drag_end(id);
        self.hp(id)
    }

    pub fn hp(&self, id: EntityId) -> Option<i32> {
        self.encounter.entity(id).map(|e| e.hp)
    }

    /// Names in display order.
    pub fn names(&self) -> Vec<String> {
        self.encounter
            .entities()
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }
}

impl Default for EncounterHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert an entity's HP is at expected values.
#[track_caller]
pub fn assert_hp(store: &RosterStore, id: EntityId, hp: i32, max_hp: i32) {
    let entity = store
        .get(id)
        .unwrap_or_else(|| panic!("Expected entity {id} to exist"));
    assert_eq!(
        (entity.hp, entity.max_hp),
        (hp, max_hp),
        "Expected HP {hp}/{max_hp}, got {}/{}",
        entity.hp,
        entity.max_hp
    );
}

/// Assert the roster is in exactly this order.
#[track_caller]
pub fn assert_order(store: &RosterStore, expected: &[EntityId]) {
    let actual: Vec<EntityId> = store.entities().iter().map(|e| e.id).collect();
    assert_eq!(actual, expected, "Roster order mismatch");
}

/// Assert every entity satisfies the clamp invariant.
#[track_caller]
pub fn assert_clamped(store: &RosterStore) {
    for entity in store.entities() {
        assert!(
            0 <= entity.hp && entity.hp <= entity.max_hp,
            "Entity {} has hp {} outside 0..={}",
            entity.id,
            entity.hp,
            entity.max_hp
        );
        assert!(
            (0..=crate::entity::MAX_AC).contains(&entity.ac),
            "Entity {} has ac {} out of range",
            entity.id,
            entity.ac
        );
    }
}
