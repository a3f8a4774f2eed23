//! QA tests for saving and loading encounters.
//!
//! Run with: `cargo test -p initiative-core --test qa_persistence`

use initiative_core::persist::auto_save_path;
use initiative_core::testing::{assert_hp, EncounterHarness};
use initiative_core::{Encounter, PersistError, SavedEncounter, TrackerConfig};
use tempfile::TempDir;

#[tokio::test]
async fn test_save_and_load_preserves_roster() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let save_path = temp_dir.path().join("ambush.json");

    let mut harness = EncounterHarness::with_config(TrackerConfig::new("Ambush"));
    let goblin = harness.spawn("Goblin", 12, 4, 7);
    let cleric = harness.spawn("Cleric", 15, 18, 24);
    harness.encounter.enter_ac(cleric, "18");
    harness.encounter.recalculate_order();

    harness
        .encounter
        .save(&save_path)
        .await
        .expect("Failed to save encounter");
    assert!(save_path.exists(), "Save file should exist after saving");

    let loaded = Encounter::load(&save_path, TrackerConfig::default())
        .await
        .expect("Failed to load encounter");

    assert_eq!(loaded.config().encounter_name, "Ambush");
    assert_eq!(loaded.entities(), harness.encounter.entities());
    assert_hp(loaded.store(), goblin, 4, 7);
    assert_eq!(loaded.entity(cleric).map(|e| e.ac), Some(18));
    assert_eq!(loaded.display_value(goblin), Some(4));
}

#[tokio::test]
async fn test_save_during_drag_stores_authoritative_hp() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let save_path = auto_save_path(temp_dir.path(), "Mid Drag");

    let mut harness = EncounterHarness::new();
    let id = harness.spawn("Ogre", 7, 59, 59);
    let now = harness.now;
    harness.encounter.drag_start_at(id, now);
    harness.encounter.drag_move_at(id, 20, now);

    harness
        .encounter
        .save(&save_path)
        .await
        .expect("Failed to save encounter");

    let saved = SavedEncounter::load_json(&save_path)
        .await
        .expect("Failed to read save");
    assert_eq!(saved.entities[0].hp, 59);

    let loaded = Encounter::load(&save_path, TrackerConfig::default())
        .await
        .expect("Failed to load encounter");
    assert!(!loaded.is_dragging(id));
}

#[tokio::test]
async fn test_load_missing_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let result = Encounter::load(temp_dir.path().join("nope.json"), TrackerConfig::default()).await;
    assert!(matches!(result, Err(PersistError::Io(_))));
}

#[tokio::test]
async fn test_load_rejects_garbage() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("broken.json");
    tokio::fs::write(&path, "{ not json").await.unwrap();

    let result = Encounter::load(&path, TrackerConfig::default()).await;
    assert!(matches!(result, Err(PersistError::Json(_))));
}
