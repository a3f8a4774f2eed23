//! Tracker configuration.

use std::time::Duration;

/// Environment variable overriding the drag render interval, in milliseconds.
pub const RENDER_INTERVAL_ENV: &str = "INITIATIVE_RENDER_INTERVAL_MS";

/// Environment variable overriding the shield AC bonus.
pub const SHIELD_BONUS_ENV: &str = "INITIATIVE_SHIELD_BONUS";

/// Configuration for an [`Encounter`](crate::Encounter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Encounter name, written into save files.
    pub encounter_name: String,

    /// Minimum spacing between drag re-render notifications.
    ///
    /// Only affects how often the view is told to redraw. Commits always use
    /// the latest drag value.
    pub drag_render_interval: Duration,

    /// AC added while an entity's shield is raised.
    pub shield_bonus: i32,
}

impl TrackerConfig {
    /// Create a config with the given encounter name and default settings.
    pub fn new(encounter_name: impl Into<String>) -> Self {
        Self {
            encounter_name: encounter_name.into(),
            ..Self::default()
        }
    }

    /// Build a config from the environment, falling back to defaults for
    /// missing or unparsable values.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ms) = env_number::<u64>(RENDER_INTERVAL_ENV) {
            config.drag_render_interval = Duration::from_millis(ms);
        }
        if let Some(bonus) = env_number::<i32>(SHIELD_BONUS_ENV) {
            config.shield_bonus = bonus;
        }

        config
    }

    /// Set the encounter name.
    pub fn with_encounter_name(mut self, name: impl Into<String>) -> Self {
        self.encounter_name = name.into();
        self
    }

    /// Set the drag render interval. `Duration::ZERO` renders every move.
    pub fn with_drag_render_interval(mut self, interval: Duration) -> Self {
        self.drag_render_interval = interval;
        self
    }

    /// Set the shield AC bonus.
    pub fn with_shield_bonus(mut self, bonus: i32) -> Self {
        self.shield_bonus = bonus;
        self
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            encounter_name: "Encounter".to_string(),
            drag_render_interval: Duration::from_millis(50),
            shield_bonus: 2,
        }
    }
}

fn env_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse().ok()
}
