//! Initiative and hit point tracker for tabletop combat.
//!
//! This crate provides:
//! - A roster store with initiative ordering and clamped HP/AC invariants
//! - Live HP scrubbing: per-entity drag controllers that hold an in-progress
//!   value apart from the roster until release
//! - An `Encounter` that wires the two together for a rendering layer
//! - Roster persistence
//!
//! # Quick Start
//!
//! ```
//! use initiative_core::{Encounter, EntityPatch, TrackerConfig};
//!
//! let mut encounter = Encounter::new(TrackerConfig::new("Goblin Ambush"));
//! let goblin = encounter.add_entity();
//! encounter.patch(goblin, EntityPatch::new().name("Goblin").max_hp(7).hp(7));
//!
//! encounter.drag_start(goblin);
//! encounter.drag_move(goblin, 3);
//! assert_eq!(encounter.delta(goblin), Some(-4));
//! assert_eq!(encounter.entity(goblin).unwrap().hp, 7);
//!
//! encounter.drag_end(goblin);
//! assert_eq!(encounter.entity(goblin).unwrap().hp, 3);
//! ```

pub mod config;
pub mod drag;
pub mod encounter;
pub mod entity;
pub mod persist;
pub mod roster;
pub mod testing;
pub mod view;

// Primary public API
pub use config::TrackerConfig;
pub use drag::{DragEnd, DragSession, HpDragController, MoveOutcome, NoHooks, SlideHooks};
pub use encounter::{Encounter, ScrollGate, ViewEvent, EVENT_QUEUE_LIMIT};
pub use entity::{parse_numeric, Entity, EntityId, EntityPatch, MAX_AC};
pub use persist::{PersistError, SavedEncounter};
pub use roster::{RosterEvent, RosterStore};
pub use view::{AcTier, DeltaIndicator, DeltaKind, HpBadge, HpTone};
