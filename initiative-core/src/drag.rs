//! Live HP scrubbing for a single entity.
//!
//! A [`HpDragController`] sits between a continuous input device (a slider
//! being dragged) and the discrete `hp` field held by the [`RosterStore`].
//! While a drag is in progress the controller owns a [`DragSession`] whose
//! `live_value` moves at full input rate without touching the store. Only
//! the drag-end commits, through a single [`RosterStore::patch`].
//!
//! ```text
//!            drag_start                      drag_move
//!   Idle ──────────────────▶ Dragging ◀──────────────────┐
//!    ▲                          │  └──────────────────────┘
//!    │   drag_end (commit)      │
//!    └──────────────────────────┤
//!    │   cancel (discard)       │
//!    └──────────────────────────┘
//! ```
//!
//! External HP changes are mirrored while idle and ignored while dragging;
//! the eventual commit overwrites them.

use crate::entity::{Entity, EntityId, EntityPatch};
use crate::roster::RosterStore;
use crate::view::{DeltaIndicator, HpTone};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Receives drag lifecycle notifications.
///
/// The list that contains the HP sliders uses these to suspend its own
/// scroll gesture while a slider owns the touch stream. For each session
/// `on_slide_start` and `on_slide_end` are each called exactly once, in
/// that order.
pub trait SlideHooks {
    fn on_slide_start(&mut self, id: EntityId);
    fn on_slide_end(&mut self, id: EntityId);
}

/// Hooks that ignore every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl SlideHooks for NoHooks {
    fn on_slide_start(&mut self, _id: EntityId) {}
    fn on_slide_end(&mut self, _id: EntityId) {}
}

/// State of an in-progress drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    /// Authoritative HP when the drag began.
    pub anchor_hp: i32,
    /// Latest input value, clamped to `[0, max_hp]`.
    pub live_value: i32,
}

impl DragSession {
    pub fn delta(&self) -> i32 {
        self.live_value - self.anchor_hp
    }
}

/// What a drag move did to the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// No session, or the entity is gone.
    Ignored,
    /// The live value changed and the view should redraw now.
    Render,
    /// The live value changed but the redraw is deferred.
    Throttled,
}

/// How a drag finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEnd {
    /// The live value was written to the store.
    Committed { hp: i32, delta: i32 },
    /// The session ended without writing anything.
    Discarded,
    /// There was no session to end.
    NotDragging,
}

/// Per-entity drag state machine.
#[derive(Debug, Clone)]
pub struct HpDragController {
    id: EntityId,
    session: Option<DragSession>,
    /// Mirror of the store's hp, shown while idle.
    authoritative_hp: i32,
    max_hp: i32,
    render_interval: Duration,
    last_render: Option<Instant>,
    render_pending: bool,
}

impl HpDragController {
    /// Create an idle controller mirroring `entity`.
    pub fn new(entity: &Entity, render_interval: Duration) -> Self {
        Self {
            id: entity.id,
            session: None,
            authoritative_hp: entity.hp,
            max_hp: entity.max_hp,
            render_interval,
            last_render: None,
            render_pending: false,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// HP anchoring the current drag, if any.
    pub fn anchor_hp(&self) -> Option<i32> {
        self.session.map(|s| s.anchor_hp)
    }

    /// The value the slider should show: the live drag value while dragging,
    /// otherwise the store's hp.
    pub fn display_value(&self) -> i32 {
        match self.session {
            Some(session) => session.live_value,
            None => self.authoritative_hp,
        }
    }

    /// `live_value - anchor_hp` while dragging, zero when idle.
    pub fn delta(&self) -> i32 {
        self.session.map(|s| s.delta()).unwrap_or(0)
    }

    /// Thumb label for the current drag; `None` when idle or unchanged.
    pub fn delta_indicator(&self) -> Option<DeltaIndicator> {
        self.session.and_then(|s| DeltaIndicator::new(s.delta()))
    }

    /// Bar color band for the displayed value.
    pub fn tone(&self) -> HpTone {
        HpTone::for_value(self.display_value(), self.max_hp)
    }

    /// True if throttled moves are waiting to be drawn.
    pub fn render_pending(&self) -> bool {
        self.render_pending
    }

    /// Mirror an external change to the entity.
    ///
    /// While idle the displayed hp follows the store. While dragging the
    /// hp is ignored so the gesture keeps visual precedence, but the live
    /// value is pulled back inside a lowered `max_hp`. Returns true if the
    /// displayed state changed.
    pub fn sync(&mut self, entity: &Entity) -> bool {
        let max_changed = self.max_hp != entity.max_hp;
        self.max_hp = entity.max_hp;

        if let Some(session) = self.session.as_mut() {
            if self.authoritative_hp != entity.hp {
                trace!(id = %self.id, hp = entity.hp, "external hp change during drag ignored");
            }
            self.authoritative_hp = entity.hp;

            let clamped = session.live_value.clamp(0, entity.max_hp.max(0));
            if clamped != session.live_value {
                trace!(
                    id = %self.id,
                    from = session.live_value,
                    to = clamped,
                    "live value clamped to new max"
                );
                session.live_value = clamped;
            }
            return max_changed;
        }

        let hp_changed = self.authoritative_hp != entity.hp;
        self.authoritative_hp = entity.hp;
        hp_changed || max_changed
    }

    /// Begin a drag anchored at the entity's current hp.
    ///
    /// Returns false, without firing any hook, if a drag is already running
    /// or the entity no longer exists.
    pub fn drag_start(
        &mut self,
        store: &RosterStore,
        hooks: &mut dyn SlideHooks,
        now: Instant,
    ) -> bool {
        if self.session.is_some() {
            return false;
        }
        let Some(entity) = store.get(self.id) else {
            return false;
        };

        hooks.on_slide_start(self.id);

        self.authoritative_hp = entity.hp;
        self.max_hp = entity.max_hp;
        self.session = Some(DragSession {
            anchor_hp: entity.hp,
            live_value: entity.hp,
        });
        self.last_render = Some(now);
        self.render_pending = false;

        debug!(id = %self.id, anchor_hp = entity.hp, "drag started");
        true
    }

    /// Record a new input value. Never writes to the store.
    pub fn drag_move(&mut self, store: &RosterStore, value: i32, now: Instant) -> MoveOutcome {
        if self.session.is_none() {
            return MoveOutcome::Ignored;
        }
        let Some(entity) = store.get(self.id) else {
            return MoveOutcome::Ignored;
        };

        let live_value = value.clamp(0, entity.max_hp.max(0));
        self.max_hp = entity.max_hp;
        if let Some(session) = self.session.as_mut() {
            session.live_value = live_value;
        }

        if self.render_due(now) {
            self.last_render = Some(now);
            self.render_pending = false;
            MoveOutcome::Render
        } else {
            trace!(id = %self.id, live_value, "drag render throttled");
            self.render_pending = true;
            MoveOutcome::Throttled
        }
    }

    /// Draw a deferred move once the render interval has passed.
    ///
    /// Returns true if the view should redraw.
    pub fn flush(&mut self, now: Instant) -> bool {
        if self.session.is_none() || !self.render_pending || !self.render_due(now) {
            return false;
        }

        self.last_render = Some(now);
        self.render_pending = false;
        true
    }

    /// Finish the drag, committing the latest live value.
    pub fn drag_end(&mut self, store: &mut RosterStore, hooks: &mut dyn SlideHooks) -> DragEnd {
        let Some(session) = self.finish() else {
            return DragEnd::NotDragging;
        };

        let outcome = if store.contains(self.id) {
            store.patch(self.id, EntityPatch::new().hp(session.live_value));
            if let Some(entity) = store.get(self.id) {
                self.authoritative_hp = entity.hp;
                self.max_hp = entity.max_hp;
            }
            debug!(
                id = %self.id,
                hp = self.authoritative_hp,
                delta = session.delta(),
                "drag committed"
            );
            DragEnd::Committed {
                hp: self.authoritative_hp,
                delta: self.authoritative_hp - session.anchor_hp,
            }
        } else {
            warn!(id = %self.id, "drag ended after entity was removed; nothing committed");
            DragEnd::Discarded
        };

        hooks.on_slide_end(self.id);
        outcome
    }

    /// Tear down an unfinished drag without committing it.
    ///
    /// Returns true if a session was discarded.
    pub fn cancel(&mut self, hooks: &mut dyn SlideHooks) -> bool {
        let Some(session) = self.finish() else {
            return false;
        };

        debug!(id = %self.id, live_value = session.live_value, "drag discarded");
        hooks.on_slide_end(self.id);
        true
    }

    fn finish(&mut self) -> Option<DragSession> {
        let session = self.session.take()?;
        self.last_render = None;
        self.render_pending = false;
        Some(session)
    }

    fn render_due(&self, now: Instant) -> bool {
        match self.last_render {
            Some(last) => now.saturating_duration_since(last) >= self.render_interval,
            None => true,
        }
    }
}
