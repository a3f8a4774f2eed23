//! Encounter persistence for save/load functionality.
//!
//! Saves are pretty-printed JSON so they can be edited by hand between
//! sessions. Only the roster is stored; drag sessions are transient.

use crate::entity::{Entity, EntityId};
use crate::roster::RosterStore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::fs;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("Duplicate entity id in save: {0}")]
    DuplicateId(EntityId),
}

/// Current save file version.
const SAVE_VERSION: u32 = 1;

/// A saved roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedEncounter {
    /// Save format version for compatibility checking.
    pub version: u32,

    /// Seconds since the Unix epoch when the save was created.
    pub saved_at: u64,

    /// Encounter name.
    pub name: String,

    /// Entities in display order.
    pub entities: Vec<Entity>,
}

impl SavedEncounter {
    pub fn new(name: impl Into<String>, entities: &[Entity]) -> Self {
        Self {
            version: SAVE_VERSION,
            saved_at: unix_now(),
            name: name.into(),
            entities: entities.to_vec(),
        }
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Load from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path).await?;
        Self::from_json(&content)
    }

    /// Parse a save from JSON text, checking the version.
    pub fn from_json(content: &str) -> Result<Self, PersistError> {
        let saved: Self = serde_json::from_str(content)?;

        if saved.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: saved.version,
            });
        }

        Ok(saved)
    }

    /// Build a roster from the saved entities.
    ///
    /// Fails if two entities share an id. Out-of-range stats are clamped.
    pub fn into_store(self) -> Result<RosterStore, PersistError> {
        let mut seen = HashSet::with_capacity(self.entities.len());
        for entity in &self.entities {
            if !seen.insert(entity.id) {
                return Err(PersistError::DuplicateId(entity.id));
            }
        }

        Ok(RosterStore::from_entities(self.entities))
    }
}

/// Create an auto-save file name for an encounter.
pub fn auto_save_path(base_dir: impl AsRef<Path>, encounter_name: &str) -> PathBuf {
    let sanitized = encounter_name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>();
    base_dir.as_ref().join(format!("{sanitized}_autosave.json"))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityPatch;

    fn sample_entities() -> Vec<Entity> {
        let mut store = RosterStore::new();
        let a = store.create().id;
        let b = store.create().id;
        store.patch(a, EntityPatch::new().name("Hobgoblin").max_hp(11).hp(7));
        store.patch(b, EntityPatch::new().name("Cleric").initiative(15).ac(18));
        store.entities().to_vec()
    }

    #[test]
    fn test_json_restores_entities() {
        let entities = sample_entities();
        let saved = SavedEncounter::new("Ambush", &entities);
        let json = serde_json::to_string(&saved).unwrap();

        let loaded = SavedEncounter::from_json(&json).unwrap();
        assert_eq!(loaded.name, "Ambush");
        assert_eq!(loaded.entities, entities);
    }

    #[test]
    fn test_version_mismatch() {
        let mut saved = SavedEncounter::new("Old", &[]);
        saved.version = 99;
        let json = serde_json::to_string(&saved).unwrap();

        let err = SavedEncounter::from_json(&json).unwrap_err();
        assert!(matches!(
            err,
            PersistError::VersionMismatch {
                expected: 1,
                found: 99
            }
        ));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let entities = sample_entities();
        let doubled = vec![entities[0].clone(), entities[0].clone()];

        let err = SavedEncounter::new("Twins", &doubled)
            .into_store()
            .unwrap_err();
        assert!(matches!(err, PersistError::DuplicateId(id) if id == entities[0].id));
    }

    #[test]
    fn test_into_store_clamps() {
        let mut entities = sample_entities();
        entities[0].hp = 500;

        let store = SavedEncounter::new("Edited", &entities).into_store().unwrap();
        assert_eq!(store.entities()[0].hp, 11);
    }

    #[test]
    fn test_auto_save_path() {
        let path = auto_save_path("/tmp/saves", "Goblin Cave #2");
        assert_eq!(path, PathBuf::from("/tmp/saves/Goblin_Cave__2_autosave.json"));
    }
}
