//! Game settings and preferences
//!
//! Persisted in LocalStorage. The page address can override a few of them
//! (`?ledger=...&name=...&rules=...`), and overrides are saved.

use serde::{Deserialize, Serialize};

use crate::storage;
use crate::tuning::RuleTable;

/// Ledger gateway compiled into the web build, if any
/// (`FEAST_FAMINE_LEDGER_ENDPOINT` at build time)
pub const DEFAULT_LEDGER_ENDPOINT: Option<&str> = option_env!("FEAST_FAMINE_LEDGER_ENDPOINT");

/// Which balance table a session plays with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RulesPreset {
    /// Any strictly larger blob eats
    #[default]
    Classic,
    /// Eating needs a 20% size margin
    Strict,
    /// Classic until 500 points, strict after
    Milestone,
}

impl RulesPreset {
    pub const ALL: [RulesPreset; 3] = [RulesPreset::Classic, RulesPreset::Strict, RulesPreset::Milestone];

    pub fn as_str(&self) -> &'static str {
        match self {
            RulesPreset::Classic => "Classic",
            RulesPreset::Strict => "Strict",
            RulesPreset::Milestone => "Milestone",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" => Some(RulesPreset::Classic),
            "strict" => Some(RulesPreset::Strict),
            "milestone" => Some(RulesPreset::Milestone),
            _ => None,
        }
    }

    pub fn rules(&self) -> RuleTable {
        match self {
            RulesPreset::Classic => RuleTable::classic(),
            RulesPreset::Strict => RuleTable::strict(),
            RulesPreset::Milestone => RuleTable::milestone(),
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Balance table for new sessions
    pub preset: RulesPreset,

    // === HUD ===
    /// Scrolling background grid
    pub show_grid: bool,
    /// Show FPS counter
    pub show_fps: bool,

    // === Ledger ===
    /// Name submitted alongside scores
    pub display_name: Option<String>,
    /// Score service endpoint; overrides [`DEFAULT_LEDGER_ENDPOINT`]
    pub ledger_endpoint: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            preset: RulesPreset::Classic,
            show_grid: true,
            show_fps: false,
            display_name: None,
            ledger_endpoint: None,
        }
    }
}

impl Settings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "feast_famine_settings";

    /// Rule table for the selected preset
    pub fn rules(&self) -> RuleTable {
        self.preset.rules()
    }

    /// Display name with surrounding whitespace removed; blank means none
    pub fn display_name(&self) -> Option<&str> {
        non_blank(self.display_name.as_deref())
    }

    /// Endpoint in force: the stored one, else the one baked in at build time
    pub fn ledger_endpoint(&self) -> Option<&str> {
        non_blank(self.ledger_endpoint.as_deref()).or(non_blank(DEFAULT_LEDGER_ENDPOINT))
    }

    /// Apply `key=value` overrides from the page address: `ledger` sets the
    /// endpoint, `name` the display name, `rules` the preset. Unknown keys
    /// and unknown presets are ignored. Returns whether anything changed.
    pub fn apply_overrides<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>) -> bool
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut changed = false;
        for (key, value) in pairs {
            let value = value.as_ref().trim();
            match key.as_ref() {
                "ledger" => {
                    let endpoint = (!value.is_empty()).then(|| value.to_owned());
                    changed |= self.ledger_endpoint != endpoint;
                    self.ledger_endpoint = endpoint;
                }
                "name" => {
                    let name = (!value.is_empty()).then(|| value.to_owned());
                    changed |= self.display_name != name;
                    self.display_name = name;
                }
                "rules" => match RulesPreset::from_str(value) {
                    Some(preset) => {
                        changed |= self.preset != preset;
                        self.preset = preset;
                    }
                    None => log::warn!("Unknown rules preset {:?}", value),
                },
                _ => {}
            }
        }
        changed
    }

    pub fn load() -> Self {
        storage::load(Self::STORAGE_KEY)
    }

    pub fn save(&self) {
        storage::save(Self::STORAGE_KEY, self);
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::EatPolicy;

    #[test]
    fn test_preset_names_round_trip() {
        for preset in RulesPreset::ALL {
            assert_eq!(RulesPreset::from_str(preset.as_str()), Some(preset));
        }
        assert_eq!(RulesPreset::from_str("STRICT"), Some(RulesPreset::Strict));
        assert_eq!(RulesPreset::from_str("hard"), None);
    }

    #[test]
    fn test_preset_selects_eat_policy() {
        let settings = Settings {
            preset: RulesPreset::Strict,
            ..Default::default()
        };
        assert_eq!(settings.rules().eat_policy, EatPolicy::Ratio { ratio: 1.2 });
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: Settings = serde_json::from_str(r#"{ "preset": "Milestone" }"#).unwrap();
        assert_eq!(settings.preset, RulesPreset::Milestone);
        assert!(settings.show_grid);
        assert_eq!(settings.display_name(), None);
    }

    #[test]
    fn test_page_overrides_are_applied() {
        let mut settings = Settings::default();
        let changed = settings.apply_overrides([
            ("ledger", " https://ledger.example/api "),
            ("name", "blobby"),
            ("rules", "strict"),
            ("utm_source", "feed"),
        ]);
        assert!(changed);
        assert_eq!(settings.ledger_endpoint(), Some("https://ledger.example/api"));
        assert_eq!(settings.display_name(), Some("blobby"));
        assert_eq!(settings.preset, RulesPreset::Strict);

        // Same values again: nothing to save
        assert!(!settings.apply_overrides([("rules", "Strict"), ("name", "blobby")]));
        // Unknown preset keeps the current one
        assert!(!settings.apply_overrides([("rules", "hard")]));
        assert_eq!(settings.preset, RulesPreset::Strict);
    }

    #[test]
    fn test_empty_ledger_override_falls_back_to_build_default() {
        let mut settings = Settings {
            ledger_endpoint: Some("https://ledger.example/api".into()),
            ..Default::default()
        };
        assert!(settings.apply_overrides([("ledger", "")]));
        assert_eq!(settings.ledger_endpoint, None);
        assert_eq!(settings.ledger_endpoint(), DEFAULT_LEDGER_ENDPOINT.map(str::trim).filter(|e| !e.is_empty()));
    }

    #[test]
    fn test_stored_endpoint_wins() {
        let settings: Settings = serde_json::from_str(r#"{ "ledger_endpoint": "https://l.example" }"#).unwrap();
        assert_eq!(settings.ledger_endpoint(), Some("https://l.example"));
    }

    #[test]
    fn test_blank_display_name_is_none() {
        let mut settings = Settings::default();
        settings.display_name = Some("   ".into());
        assert_eq!(settings.display_name(), None);
        settings.display_name = Some(" blobby ".into());
        assert_eq!(settings.display_name(), Some("blobby"));
    }
}
