//! Presentation derivations for the roster.
//!
//! Nothing here is state. Each value is recomputed from an entity (or a
//! drag controller) whenever the view layer asks for it.

use crate::entity::{hp_ratio, Entity};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

// ============================================================================
// HP Tone
// ============================================================================

/// Health band used to color an HP bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HpTone {
    Critical,
    Warning,
    Healthy,
}

impl HpTone {
    /// Band for `value` out of `max_hp`. A zero maximum reads as critical.
    pub fn for_value(value: i32, max_hp: i32) -> Self {
        Self::from_ratio(hp_ratio(value, max_hp))
    }

    pub fn from_ratio(ratio: f32) -> Self {
        if ratio <= 0.25 {
            HpTone::Critical
        } else if ratio <= 0.5 {
            HpTone::Warning
        } else {
            HpTone::Healthy
        }
    }

    pub fn for_entity(entity: &Entity) -> Self {
        Self::for_value(entity.hp, entity.max_hp)
    }

    pub fn name(&self) -> &'static str {
        match self {
            HpTone::Critical => "Critical",
            HpTone::Warning => "Warning",
            HpTone::Healthy => "Healthy",
        }
    }
}

impl fmt::Display for HpTone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Drag Delta
// ============================================================================

/// Direction of an in-progress HP change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeltaKind {
    Healing,
    Damage,
}

/// Signed HP change shown next to the slider thumb while dragging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaIndicator {
    pub amount: i32,
}

impl DeltaIndicator {
    /// `None` for a zero delta, which is never displayed.
    pub fn new(amount: i32) -> Option<Self> {
        (amount != 0).then_some(Self { amount })
    }

    pub fn kind(&self) -> DeltaKind {
        if self.amount > 0 {
            DeltaKind::Healing
        } else {
            DeltaKind::Damage
        }
    }
}

impl fmt::Display for DeltaIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}", self.amount)
    }
}

// ============================================================================
// Missing HP Badge
// ============================================================================

/// Header badge: how far below maximum an entity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HpBadge {
    Full,
    Missing(i32),
}

impl HpBadge {
    pub fn for_entity(entity: &Entity) -> Self {
        match entity.missing_hp() {
            Some(missing) => HpBadge::Missing(missing),
            None => HpBadge::Full,
        }
    }
}

impl fmt::Display for HpBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HpBadge::Full => write!(f, "✓"),
            HpBadge::Missing(missing) => write!(f, "-{missing}"),
        }
    }
}

// ============================================================================
// Armor Class Tier
// ============================================================================

/// Armor class bands used to tint the shield icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AcTier {
    Flimsy,
    Light,
    Medium,
    Sturdy,
    Heavy,
    Fortified,
    Legendary,
}

impl AcTier {
    pub fn for_ac(ac: i32) -> Self {
        match ac {
            i32::MIN..=5 => AcTier::Flimsy,
            6..=10 => AcTier::Light,
            11..=15 => AcTier::Medium,
            16..=20 => AcTier::Sturdy,
            21..=25 => AcTier::Heavy,
            26..=29 => AcTier::Fortified,
            _ => AcTier::Legendary,
        }
    }
}

// ============================================================================
// Slider
// ============================================================================

/// Range of the HP slider. Collapses to `0..=0` without a positive maximum.
pub fn slider_range(max_hp: i32) -> RangeInclusive<i32> {
    0..=max_hp.max(0)
}
