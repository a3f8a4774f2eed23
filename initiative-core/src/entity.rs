//! Combatant records and the typed merge-patch applied to them.
//!
//! An [`Entity`] is a plain value: the roster store owns every instance and
//! is the only place where an [`EntityPatch`] gets merged. The clamp rules
//! live here so that every path into an entity (patching, loading a save)
//! normalises it the same way.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Highest armor class a combatant can carry.
pub const MAX_AC: i32 = 99;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for roster entities.
///
/// Backed by a UUIDv7, so ids carry their creation timestamp in the high
/// bits and random bits below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Entity
// ============================================================================

/// A tracked combatant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub initiative: i32,
    pub ac: i32,
    pub hp: i32,
    pub max_hp: i32,
}

impl Entity {
    /// A blank combatant with every stat at zero.
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            name: String::new(),
            initiative: 0,
            ac: 0,
            hp: 0,
            max_hp: 0,
        }
    }

    /// Merge every present field of `patch`, then re-establish the clamp
    /// invariant. The id is never touched.
    pub fn apply(&mut self, patch: &EntityPatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(initiative) = patch.initiative {
            self.initiative = initiative;
        }
        if let Some(ac) = patch.ac {
            self.ac = ac;
        }
        if let Some(max_hp) = patch.max_hp {
            self.max_hp = max_hp;
        }
        if let Some(hp) = patch.hp {
            self.hp = hp;
        }
        self.normalize();
    }

    /// Clamp stats into their legal ranges.
    ///
    /// `max_hp` is settled first so that `hp` is bounded by the new maximum.
    pub fn normalize(&mut self) {
        self.max_hp = self.max_hp.max(0);
        self.hp = self.hp.clamp(0, self.max_hp);
        self.ac = self.ac.clamp(0, MAX_AC);
    }

    /// Hit points missing from full, if any.
    pub fn missing_hp(&self) -> Option<i32> {
        (self.hp < self.max_hp).then(|| self.max_hp - self.hp)
    }

    /// Fraction of maximum HP remaining for the given value.
    pub fn hp_ratio(&self) -> f32 {
        hp_ratio(self.hp, self.max_hp)
    }
}

/// `value / max_hp`, or zero when there is no maximum to measure against.
pub fn hp_ratio(value: i32, max_hp: i32) -> f32 {
    if max_hp > 0 {
        value as f32 / max_hp as f32
    } else {
        0.0
    }
}

// ============================================================================
// Patch
// ============================================================================

/// A partial update for an [`Entity`].
///
/// Each `Some` field overwrites the entity's value; `None` leaves it alone.
/// A patch is always applied whole by the store, never read-modify-written
/// by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiative: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ac: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hp: Option<i32>,
}

impl EntityPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn initiative(mut self, initiative: i32) -> Self {
        self.initiative = Some(initiative);
        self
    }

    pub fn ac(mut self, ac: i32) -> Self {
        self.ac = Some(ac);
        self
    }

    pub fn hp(mut self, hp: i32) -> Self {
        self.hp = Some(hp);
        self
    }

    pub fn max_hp(mut self, max_hp: i32) -> Self {
        self.max_hp = Some(max_hp);
        self
    }

    /// True if the patch would not change any field.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.initiative.is_none()
            && self.ac.is_none()
            && self.hp.is_none()
            && self.max_hp.is_none()
    }

    /// True if the patch touches `hp` or `max_hp`.
    pub fn touches_hp(&self) -> bool {
        self.hp.is_some() || self.max_hp.is_some()
    }
}

// ============================================================================
// Numeric Entry
// ============================================================================

/// Parse free-form numeric text the way the entry fields expect.
///
/// Surrounding whitespace is ignored, blank text is zero, decimals are
/// truncated toward zero and saturate at the `i32` bounds. Unsigned `0x`,
/// `0o` and `0b` literals are read in their radix. Anything that is not a
/// finite number resolves to zero.
pub fn parse_numeric(text: &str) -> i32 {
    let text = text.trim();
    if text.is_empty() {
        return 0;
    }

    if let Some(value) = parse_radix_literal(text) {
        return value;
    }

    if let Ok(value) = text.parse::<i64>() {
        return value.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
    }

    match text.parse::<f64>() {
        // `as` saturates for out-of-range floats
        Ok(value) if value.is_finite() => value.trunc() as i32,
        _ => 0,
    }
}

/// `0x1F`, `0o17`, `0b101`. Signs and empty digit runs are not literals and
/// read as zero.
fn parse_radix_literal(text: &str) -> Option<i32> {
    let prefix = text.get(..2)?;
    let radix = match prefix.to_ascii_lowercase().as_str() {
        "0x" => 16,
        "0o" => 8,
        "0b" => 2,
        _ => return None,
    };

    let digits = &text[2..];
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Some(0);
    }
    let value = u64::from_str_radix(digits, radix).unwrap_or(u64::MAX);
    Some(i32::try_from(value).unwrap_or(i32::MAX))
}
