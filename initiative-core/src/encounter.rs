//! Encounter - the roster screen's state, without the screen.
//!
//! An [`Encounter`] wires one [`HpDragController`] per entity to the
//! [`RosterStore`], keeps the outer list's scroll gesture suspended while any
//! slider is being dragged, and turns raw text entry into patches. It emits
//! two separate streams:
//!
//! - [`RosterEvent`]s: changes to the authoritative model.
//! - [`ViewEvent`]s: view-only updates (drag redraws, scroll locking) that
//!   never correspond to a store mutation.
//!
//! Both streams hold at most [`EVENT_QUEUE_LIMIT`] entries each; a renderer
//! that falls behind loses the oldest ones.

use crate::config::TrackerConfig;
use crate::drag::{DragEnd, HpDragController, MoveOutcome, SlideHooks};
use crate::entity::{parse_numeric, Entity, EntityId, EntityPatch, MAX_AC};
use crate::persist::{PersistError, SavedEncounter};
use crate::roster::{RosterEvent, RosterStore};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, trace};

/// Maximum number of undrained events held per stream.
pub const EVENT_QUEUE_LIMIT: usize = 1024;

/// A view-model update that does not change the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// A slider grabbed the pointer.
    DragStarted { id: EntityId },

    /// The slider should redraw with this value and delta.
    DragRendered { id: EntityId, value: i32, delta: i32 },

    /// A drag finished, committed or discarded.
    DragEnded { id: EntityId, outcome: DragEnd },

    /// An idle slider picked up a new value from the store.
    DisplayChanged { id: EntityId, value: i32 },

    /// Outer list scrolling was suspended or resumed.
    ScrollChanged { enabled: bool },

    /// The list should scroll back to its first entry.
    ScrollToTop,
}

/// Tracks which sliders currently own the pointer.
#[derive(Debug, Clone, Default)]
pub struct ScrollGate {
    sliding: HashSet<EntityId>,
}

impl ScrollGate {
    /// Outer scrolling is allowed only when no slider is active.
    pub fn scroll_enabled(&self) -> bool {
        self.sliding.is_empty()
    }

    pub fn is_sliding(&self, id: EntityId) -> bool {
        self.sliding.contains(&id)
    }
}

impl SlideHooks for ScrollGate {
    fn on_slide_start(&mut self, id: EntityId) {
        self.sliding.insert(id);
    }

    fn on_slide_end(&mut self, id: EntityId) {
        self.sliding.remove(&id);
    }
}

/// FIFO holding at most [`EVENT_QUEUE_LIMIT`] entries.
#[derive(Debug)]
struct EventQueue<T> {
    items: VecDeque<T>,
}

impl<T> EventQueue<T> {
    fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    fn push(&mut self, item: T) {
        if self.items.len() == EVENT_QUEUE_LIMIT {
            self.items.pop_front();
            trace!("event queue full, oldest event dropped");
        }
        self.items.push_back(item);
    }

    fn drain(&mut self) -> Vec<T> {
        self.items.drain(..).collect()
    }
}

/// A live encounter: roster, drag controllers and view state.
#[derive(Debug)]
pub struct Encounter {
    config: TrackerConfig,
    store: RosterStore,
    controllers: HashMap<EntityId, HpDragController>,
    /// AC actually added by each raised shield.
    shields: HashMap<EntityId, i32>,
    gate: ScrollGate,
    roster_events: EventQueue<RosterEvent>,
    view_events: EventQueue<ViewEvent>,
}

impl Encounter {
    /// Create an empty encounter.
    pub fn new(config: TrackerConfig) -> Self {
        Self::with_store(config, RosterStore::new())
    }

    /// Create an encounter over an existing roster. The encounter turns on
    /// the store's event recording and drains it after every operation.
    pub fn with_store(config: TrackerConfig, store: RosterStore) -> Self {
        let store = store.with_events();
        let controllers = store
            .entities()
            .iter()
            .map(|e| (e.id, HpDragController::new(e, config.drag_render_interval)))
            .collect();

        Self {
            config,
            store,
            controllers,
            shields: HashMap::new(),
            gate: ScrollGate::default(),
            roster_events: EventQueue::new(),
            view_events: EventQueue::new(),
        }
    }

    /// Load an encounter from a save file.
    pub async fn load(
        path: impl AsRef<Path>,
        config: TrackerConfig,
    ) -> Result<Self, PersistError> {
        let path = path.as_ref();
        let saved = SavedEncounter::load_json(path).await?;
        info!(path = %path.display(), entities = saved.entities.len(), "encounter loaded");

        let config = config.with_encounter_name(saved.name.clone());
        Ok(Self::with_store(config, saved.into_store()?))
    }

    /// Save the roster. Drag sessions in progress are not saved.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let path = path.as_ref();
        SavedEncounter::new(&self.config.encounter_name, self.store.entities())
            .save_json(path)
            .await?;
        info!(path = %path.display(), entities = self.store.len(), "encounter saved");
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn store(&self) -> &RosterStore {
        &self.store
    }

    /// Entities in display order.
    pub fn entities(&self) -> &[Entity] {
        self.store.entities()
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.store.get(id)
    }

    pub fn controller(&self, id: EntityId) -> Option<&HpDragController> {
        self.controllers.get(&id)
    }

    pub fn is_dragging(&self, id: EntityId) -> bool {
        self.controllers
            .get(&id)
            .map(HpDragController::is_dragging)
            .unwrap_or(false)
    }

    /// Value the entity's slider is showing.
    pub fn display_value(&self, id: EntityId) -> Option<i32> {
        self.controllers.get(&id).map(HpDragController::display_value)
    }

    pub fn delta(&self, id: EntityId) -> Option<i32> {
        self.controllers.get(&id).map(HpDragController::delta)
    }

    pub fn scroll_enabled(&self) -> bool {
        self.gate.scroll_enabled()
    }

    pub fn is_shielded(&self, id: EntityId) -> bool {
        self.shields.contains_key(&id)
    }

    /// Take queued roster events, oldest first.
    ///
    /// At most [`EVENT_QUEUE_LIMIT`] are kept between drains.
    pub fn drain_roster_events(&mut self) -> Vec<RosterEvent> {
        self.roster_events.drain()
    }

    /// Take queued view events, oldest first.
    ///
    /// At most [`EVENT_QUEUE_LIMIT`] are kept between drains.
    pub fn drain_view_events(&mut self) -> Vec<ViewEvent> {
        self.view_events.drain()
    }

    // ========================================================================
    // Roster operations
    // ========================================================================

    /// Append a blank entity.
    pub fn add_entity(&mut self) -> EntityId {
        let id = self.store.create().id;
        self.route_store_events();
        id
    }

    pub fn patch(&mut self, id: EntityId, patch: EntityPatch) {
        self.store.patch(id, patch);
        self.route_store_events();
    }

    /// Remove an entity, discarding any drag in progress on it.
    pub fn remove(&mut self, id: EntityId) {
        self.store.remove(id);
        self.route_store_events();
    }

    /// Remove every entity, discarding all drags.
    pub fn clear(&mut self) {
        self.store.clear();
        self.route_store_events();
    }

    /// Sort by initiative and scroll the list back to the top.
    pub fn recalculate_order(&mut self) {
        self.store.recalculate_order();
        self.route_store_events();
    }

    // ========================================================================
    // Typed entry
    // ========================================================================

    pub fn enter_name(&mut self, id: EntityId, text: &str) {
        self.patch(id, EntityPatch::new().name(text));
    }

    pub fn enter_initiative(&mut self, id: EntityId, text: &str) {
        self.patch(id, EntityPatch::new().initiative(parse_numeric(text)));
    }

    pub fn enter_ac(&mut self, id: EntityId, text: &str) {
        self.patch(id, EntityPatch::new().ac(parse_numeric(text).min(MAX_AC)));
    }

    /// Typed HP, capped at the entity's current maximum. Bypasses any drag.
    pub fn enter_hp(&mut self, id: EntityId, text: &str) {
        let Some(max_hp) = self.store.get(id).map(|e| e.max_hp) else {
            return;
        };
        self.patch(id, EntityPatch::new().hp(parse_numeric(text).min(max_hp)));
    }

    /// Typed maximum HP, applied as-is; the store re-clamps `hp`.
    pub fn enter_max_hp(&mut self, id: EntityId, text: &str) {
        self.patch(id, EntityPatch::new().max_hp(parse_numeric(text)));
    }

    /// Raise or lower the entity's shield, adjusting AC by the configured
    /// bonus. Returns the new shield state, or `None` for an unknown id.
    ///
    /// Lowering takes off only what raising added, so a bonus cut short by
    /// the AC cap does not cost AC on the way down.
    pub fn toggle_shield(&mut self, id: EntityId) -> Option<bool> {
        let ac = self.store.get(id)?.ac;

        let (new_ac, raised) = match self.shields.remove(&id) {
            Some(applied) => (ac.saturating_sub(applied).max(0), false),
            None => {
                let raised_ac = ac.saturating_add(self.config.shield_bonus).clamp(0, MAX_AC);
                self.shields.insert(id, raised_ac - ac);
                (raised_ac, true)
            }
        };

        self.patch(id, EntityPatch::new().ac(new_ac));
        Some(raised)
    }

    // ========================================================================
    // Drag input
    // ========================================================================

    pub fn drag_start(&mut self, id: EntityId) -> bool {
        self.drag_start_at(id, Instant::now())
    }

    pub fn drag_start_at(&mut self, id: EntityId, now: Instant) -> bool {
        let Some(controller) = self.controllers.get_mut(&id) else {
            return false;
        };

        let scroll_was_enabled = self.gate.scroll_enabled();
        let started = controller.drag_start(&self.store, &mut self.gate, now);
        if started {
            self.view_events.push(ViewEvent::DragStarted { id });
            self.view_events.push(ViewEvent::DragRendered {
                id,
                value: controller.display_value(),
                delta: 0,
            });
        }
        self.note_scroll_change(scroll_was_enabled);
        started
    }

    pub fn drag_move(&mut self, id: EntityId, value: i32) -> MoveOutcome {
        self.drag_move_at(id, value, Instant::now())
    }

    pub fn drag_move_at(&mut self, id: EntityId, value: i32, now: Instant) -> MoveOutcome {
        let Some(controller) = self.controllers.get_mut(&id) else {
            return MoveOutcome::Ignored;
        };

        let outcome = controller.drag_move(&self.store, value, now);
        if outcome == MoveOutcome::Render {
            self.view_events.push(ViewEvent::DragRendered {
                id,
                value: controller.display_value(),
                delta: controller.delta(),
            });
        }
        outcome
    }

    /// Finish a drag and commit its latest value.
    pub fn drag_end(&mut self, id: EntityId) -> DragEnd {
        let Some(controller) = self.controllers.get_mut(&id) else {
            return DragEnd::NotDragging;
        };

        let scroll_was_enabled = self.gate.scroll_enabled();
        let outcome = controller.drag_end(&mut self.store, &mut self.gate);
        if outcome != DragEnd::NotDragging {
            self.view_events.push(ViewEvent::DragEnded { id, outcome });
        }
        self.note_scroll_change(scroll_was_enabled);
        self.route_store_events();
        outcome
    }

    /// Redraw throttled drags whose render interval has elapsed.
    pub fn flush_at(&mut self, now: Instant) {
        for controller in self.controllers.values_mut() {
            if controller.flush(now) {
                self.view_events.push(ViewEvent::DragRendered {
                    id: controller.id(),
                    value: controller.display_value(),
                    delta: controller.delta(),
                });
            }
        }
    }

    // ========================================================================
    // Event routing
    // ========================================================================

    /// Apply store changes to the controllers and forward them.
    fn route_store_events(&mut self) {
        for event in self.store.drain_events() {
            match &event {
                RosterEvent::Created { id } => {
                    if let Some(entity) = self.store.get(*id) {
                        self.controllers.insert(
                            *id,
                            HpDragController::new(entity, self.config.drag_render_interval),
                        );
                    }
                }
                RosterEvent::Patched { entity } => self.sync_controller(entity),
                RosterEvent::Removed { id } => self.teardown(*id),
                RosterEvent::Cleared { ids } => {
                    for id in ids {
                        self.teardown(*id);
                    }
                }
                RosterEvent::Reordered => self.view_events.push(ViewEvent::ScrollToTop),
            }
            self.roster_events.push(event);
        }
    }

    fn sync_controller(&mut self, entity: &Entity) {
        let Some(controller) = self.controllers.get_mut(&entity.id) else {
            return;
        };

        if controller.sync(entity) {
            self.view_events.push(ViewEvent::DisplayChanged {
                id: entity.id,
                value: controller.display_value(),
            });
        }
    }

    /// Drop an entity's controller. An unfinished drag is cancelled, never
    /// committed.
    fn teardown(&mut self, id: EntityId) {
        self.shields.remove(&id);
        let Some(mut controller) = self.controllers.remove(&id) else {
            return;
        };

        let scroll_was_enabled = self.gate.scroll_enabled();
        if controller.cancel(&mut self.gate) {
            debug!(%id, "drag cancelled by entity removal");
            self.view_events.push(ViewEvent::DragEnded {
                id,
                outcome: DragEnd::Discarded,
            });
        }
        self.note_scroll_change(scroll_was_enabled);
    }

    fn note_scroll_change(&mut self, was_enabled: bool) {
        let enabled = self.gate.scroll_enabled();
        if enabled != was_enabled {
            self.view_events.push(ViewEvent::ScrollChanged { enabled });
        }
    }
}

impl Default for Encounter {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn encounter() -> Encounter {
        Encounter::new(TrackerConfig::default().with_drag_render_interval(Duration::ZERO))
    }

    fn spawn(encounter: &mut Encounter, hp: i32, max_hp: i32) -> EntityId {
        let id = encounter.add_entity();
        encounter.patch(id, EntityPatch::new().max_hp(max_hp).hp(hp));
        id
    }

    #[test]
    fn test_add_entity_creates_controller() {
        let mut encounter = encounter();
        let id = encounter.add_entity();
        assert!(encounter.controller(id).is_some());
        assert_eq!(encounter.display_value(id), Some(0));
    }

    #[test]
    fn test_scroll_locked_during_drag() {
        let mut encounter = encounter();
        let id = spawn(&mut encounter, 10, 10);
        encounter.drain_view_events();

        assert!(encounter.drag_start(id));
        assert!(!encounter.scroll_enabled());
        encounter.drag_move(id, 4);
        encounter.drag_end(id);
        assert!(encounter.scroll_enabled());

        let events = encounter.drain_view_events();
        assert_eq!(events[0], ViewEvent::DragStarted { id });
        assert!(events.contains(&ViewEvent::ScrollChanged { enabled: false }));
        assert!(events.contains(&ViewEvent::DragRendered { id, value: 4, delta: -6 }));
        assert!(events.contains(&ViewEvent::DragEnded {
            id,
            outcome: DragEnd::Committed { hp: 4, delta: -6 }
        }));
        assert_eq!(
            events.last(),
            Some(&ViewEvent::ScrollChanged { enabled: true })
        );
    }

    #[test]
    fn test_remove_during_drag_releases_scroll() {
        let mut encounter = encounter();
        let id = spawn(&mut encounter, 10, 10);

        encounter.drag_start(id);
        encounter.drag_move(id, 2);
        encounter.remove(id);

        assert!(encounter.scroll_enabled());
        assert_eq!(encounter.drag_end(id), DragEnd::NotDragging);
        assert!(encounter.entity(id).is_none());
        assert!(encounter.store().is_empty());
    }

    #[test]
    fn test_idle_display_follows_typed_hp() {
        let mut encounter = encounter();
        let id = spawn(&mut encounter, 10, 10);
        encounter.drain_view_events();

        encounter.enter_hp(id, "6");
        assert_eq!(encounter.display_value(id), Some(6));
        assert!(encounter
            .drain_view_events()
            .contains(&ViewEvent::DisplayChanged { id, value: 6 }));
    }

    #[test]
    fn test_typed_hp_capped_at_max() {
        let mut encounter = encounter();
        let id = spawn(&mut encounter, 5, 12);

        encounter.enter_hp(id, "40");
        assert_eq!(encounter.entity(id).unwrap().hp, 12);

        encounter.enter_hp(id, "lots");
        assert_eq!(encounter.entity(id).unwrap().hp, 0);
    }

    #[test]
    fn test_typed_max_hp_reclamps() {
        let mut encounter = encounter();
        let id = spawn(&mut encounter, 30, 30);

        encounter.enter_max_hp(id, "18");
        let entity = encounter.entity(id).unwrap();
        assert_eq!((entity.hp, entity.max_hp), (18, 18));

        encounter.enter_max_hp(id, "-2");
        let entity = encounter.entity(id).unwrap();
        assert_eq!((entity.hp, entity.max_hp), (0, 0));
    }

    #[test]
    fn test_typed_fields() {
        let mut encounter = encounter();
        let id = encounter.add_entity();

        encounter.enter_name(id, "Owlbear");
        encounter.enter_initiative(id, "17");
        encounter.enter_ac(id, "250");

        let entity = encounter.entity(id).unwrap();
        assert_eq!(entity.name, "Owlbear");
        assert_eq!(entity.initiative, 17);
        assert_eq!(entity.ac, MAX_AC);
    }

    #[test]
    fn test_toggle_shield() {
        let mut encounter = encounter();
        let id = encounter.add_entity();
        encounter.enter_ac(id, "15");

        assert_eq!(encounter.toggle_shield(id), Some(true));
        assert_eq!(encounter.entity(id).unwrap().ac, 17);
        assert!(encounter.is_shielded(id));

        assert_eq!(encounter.toggle_shield(id), Some(false));
        assert_eq!(encounter.entity(id).unwrap().ac, 15);

        encounter.enter_ac(id, "1");
        encounter.toggle_shield(id);
        encounter.enter_ac(id, "1");
        encounter.toggle_shield(id);
        assert_eq!(encounter.entity(id).unwrap().ac, 0);

        assert_eq!(encounter.toggle_shield(EntityId::new()), None);
    }

    #[test]
    fn test_shield_respects_ac_cap() {
        let mut encounter = encounter();
        let id = encounter.add_entity();
        encounter.enter_ac(id, "98");

        encounter.toggle_shield(id);
        assert_eq!(encounter.entity(id).unwrap().ac, MAX_AC);
    }

    #[test]
    fn test_shield_round_trip_near_cap() {
        let mut encounter = encounter();
        let id = encounter.add_entity();
        encounter.enter_ac(id, "98");

        assert_eq!(encounter.toggle_shield(id), Some(true));
        assert_eq!(encounter.entity(id).unwrap().ac, 99);
        assert_eq!(encounter.toggle_shield(id), Some(false));
        assert_eq!(encounter.entity(id).unwrap().ac, 98);

        encounter.enter_ac(id, "99");
        encounter.toggle_shield(id);
        encounter.toggle_shield(id);
        assert_eq!(encounter.entity(id).unwrap().ac, 99);
    }

    #[test]
    fn test_event_queues_are_bounded() {
        let mut encounter = encounter();
        let id = spawn(&mut encounter, 10, 10);
        for hp in 0..5_000 {
            encounter.enter_hp(id, &(hp % 10).to_string());
        }

        let roster = encounter.drain_roster_events();
        assert_eq!(roster.len(), EVENT_QUEUE_LIMIT);
        assert!(matches!(
            roster.last(),
            Some(RosterEvent::Patched { entity }) if entity.hp == 4_999 % 10
        ));
        assert!(encounter.drain_view_events().len() <= EVENT_QUEUE_LIMIT);
        assert!(encounter.drain_roster_events().is_empty());
        assert!(encounter.store().records_events());
    }

    #[test]
    fn test_recalculate_scrolls_to_top() {
        let mut encounter = encounter();
        let a = encounter.add_entity();
        let b = encounter.add_entity();
        encounter.enter_initiative(b, "9");
        encounter.drain_view_events();

        encounter.recalculate_order();
        assert_eq!(encounter.entities()[0].id, b);
        assert_eq!(encounter.entities()[1].id, a);
        assert_eq!(encounter.drain_view_events(), vec![ViewEvent::ScrollToTop]);
        assert_eq!(
            encounter.drain_roster_events().last(),
            Some(&RosterEvent::Reordered)
        );
    }

    #[test]
    fn test_clear_cancels_every_drag() {
        let mut encounter = encounter();
        let a = spawn(&mut encounter, 8, 8);
        let b = spawn(&mut encounter, 9, 9);

        encounter.drag_start(a);
        encounter.drag_start(b);
        assert!(!encounter.scroll_enabled());

        encounter.clear();
        assert!(encounter.scroll_enabled());
        assert!(encounter.controller(a).is_none());
        assert!(encounter.controller(b).is_none());
        assert_eq!(encounter.drag_end(a), DragEnd::NotDragging);
    }

    #[test]
    fn test_throttled_drag_flushes() {
        let mut encounter = Encounter::new(
            TrackerConfig::default().with_drag_render_interval(Duration::from_millis(50)),
        );
        let id = spawn(&mut encounter, 20, 20);
        let t0 = Instant::now();

        encounter.drag_start_at(id, t0);
        encounter.drain_view_events();

        assert_eq!(encounter.drag_move_at(id, 12, t0), MoveOutcome::Throttled);
        assert!(encounter.drain_view_events().is_empty());

        encounter.flush_at(t0 + Duration::from_millis(50));
        assert_eq!(
            encounter.drain_view_events(),
            vec![ViewEvent::DragRendered { id, value: 12, delta: -8 }]
        );
    }
}
