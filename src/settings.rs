//! Game settings
//!
//! Loaded once at startup. Any missing field takes its built-in default and
//! any failure to read or parse falls back to `Settings::default()`.

use serde::{Deserialize, Serialize};

use crate::consts::{
    FLIP_DURATION_MS, RESULT_PAUSE_MS, REVERSE_IMAGE, TIMER_INTERVAL_MS, WIN_PRESENT_DELAY_MS,
};

/// Card look and flip timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardSettings {
    /// Full flip duration (both halves)
    pub duration_ms: u64,
    /// Linger at the rib before the second half
    pub dwell_at_rib_ms: u64,
    /// Cooldown after a flip settles
    pub post_flip_pause_ms: u64,
    pub mirror_back: bool,
    pub face_bg: String,
    pub back_bg: String,
    pub back_image: String,
    /// Corner radius passed through to the renderer
    pub radius: String,
    /// Cards time their own half-rotations instead of waiting for the renderer
    pub auto_segments: bool,
}

impl Default for CardSettings {
    fn default() -> Self {
        Self {
            duration_ms: FLIP_DURATION_MS,
            dwell_at_rib_ms: 0,
            post_flip_pause_ms: 0,
            mirror_back: true,
            face_bg: "#000000".to_string(),
            back_bg: "#000000".to_string(),
            back_image: REVERSE_IMAGE.to_string(),
            radius: "0.3rem".to_string(),
            auto_segments: false,
        }
    }
}

/// Status line templates per category
///
/// Placeholders: `{name}`, `{found}`, `{total}`. An empty list uses the
/// built-in default line for that category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageTemplates {
    pub start: Vec<String>,
    pub progress: Vec<String>,
    pub mismatch: Vec<String>,
    pub win: Vec<String>,
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Display title
    pub game_name: String,

    // === Cards ===
    pub card: CardSettings,

    // === Pacing ===
    /// Both faces of an evaluated pair stay visible this long on a mismatch
    pub result_pause_ms: u64,
    /// Score/timer refresh interval
    pub timer_interval_ms: u64,
    /// Delay before presenting the win screen in hide-matched mode
    pub win_delay_ms: u64,

    // === Text ===
    pub messages: MessageTemplates,

    // === Accessibility ===
    /// Settle flips instantly
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            game_name: "Flip to Match".to_string(),
            card: CardSettings::default(),
            result_pause_ms: RESULT_PAUSE_MS,
            timer_interval_ms: TIMER_INTERVAL_MS,
            win_delay_ms: WIN_PRESENT_DELAY_MS,
            messages: MessageTemplates::default(),
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "flip_match_settings";

    /// Default config file looked up by the native build
    pub const CONFIG_FILE: &'static str = "flip-match.json";

    /// Parse settings JSON, falling back to defaults on any error
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Invalid settings ({e}), using defaults");
                Self::default()
            }
        }
    }

    /// Timer interval, never zero
    pub fn effective_timer_interval(&self) -> u64 {
        self.timer_interval_ms.max(1)
    }

    /// Win presentation delay for the given mode
    pub fn effective_win_delay(&self, hide_matched: bool) -> u64 {
        if hide_matched { self.win_delay_ms } else { 0 }
    }

    /// Load settings from a JSON file (native only)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => {
                log::info!("Loaded settings from {}", path.display());
                Self::from_json(&json)
            }
            Err(e) => {
                log::info!("No settings at {} ({e}), using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Load settings from `flip-match.json` in the working directory (native)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::load_from(Self::CONFIG_FILE)
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                log::info!("Loaded settings from LocalStorage");
                return Self::from_json(&json);
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json(
            r#"{ "gameName": "H2 Game", "card": { "durationMs": 900, "dwellAtRibMs": 140 } }"#,
        );
        assert_eq!(settings.game_name, "H2 Game");
        assert_eq!(settings.card.duration_ms, 900);
        assert_eq!(settings.card.dwell_at_rib_ms, 140);
        assert!(settings.card.mirror_back);
        assert_eq!(settings.result_pause_ms, RESULT_PAUSE_MS);
    }

    #[test]
    fn test_invalid_json_falls_back() {
        assert_eq!(Settings::from_json("{ not json"), Settings::default());
        assert_eq!(Settings::from_json(r#"{ "card": 5 }"#), Settings::default());
    }

    #[test]
    fn test_message_templates() {
        let settings = Settings::from_json(
            r#"{ "messages": { "win": ["Well done {name}!", "All {total} found"] } }"#,
        );
        assert_eq!(settings.messages.win.len(), 2);
        assert!(settings.messages.start.is_empty());
    }

    #[test]
    fn test_win_delay_only_when_hiding() {
        let settings = Settings::default();
        assert_eq!(settings.effective_win_delay(false), 0);
        assert_eq!(settings.effective_win_delay(true), WIN_PRESENT_DELAY_MS);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_missing_file_uses_defaults() {
        let settings = Settings::load_from("/nonexistent/flip-match.json");
        assert_eq!(settings, Settings::default());
    }
}
