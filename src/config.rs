// ⚙️ Tracker Configuration
// Endpoints, store path, rebuild policy and the exclusion set are all
// supplied by the caller rather than baked into pipeline logic, so the
// standard-character list can change without touching the filter code.

use crate::error::{Result, TrackerError};
use crate::schema::RebuildPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Default primary character source (genshin-db API)
pub const DEFAULT_CHARACTER_URL: &str =
    "https://genshin-db-api.vercel.app/api/v5/characters?query=names&matchCategories=true&verboseCategories=true";

/// Default secondary banner-date source
pub const DEFAULT_BANNER_URL: &str =
    "https://raw.githubusercontent.com/Ehttri/genshin_banner_api/refs/heads/main/banners.json";

/// Default per-character detail source (icon enrichment)
pub const DEFAULT_DETAIL_URL: &str = "https://genshin-db-api.vercel.app/api/v5/characters";

/// Substring marking the generic player avatar; any character name
/// containing it is excluded from tracking.
pub const AVATAR_MARKER: &str = "Traveler";

/// Characters permanently available outside limited banners.
/// Known fragility: a renamed or newly added standard character must be
/// added here (or in the config file) or it will be mis-tracked.
pub const STANDARD_CHARACTERS: &[&str] = &[
    "Aloy", "Aether", "Lumine", "Diluc", "Jean",
    "Qiqi", "Keqing", "Mona", "Tighnari", "Dehya",
];

/// Full pipeline configuration, loadable from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Primary character source endpoint
    #[serde(default = "default_character_url")]
    pub character_url: String,

    /// Secondary banner-date source endpoint
    #[serde(default = "default_banner_url")]
    pub banner_url: String,

    /// Optional per-character detail endpoint (icon enrichment)
    #[serde(default = "default_detail_url")]
    pub detail_url: String,

    /// Whether to issue the per-character icon fetch for retained characters.
    /// Failures there degrade to an empty icon and never abort the run.
    #[serde(default)]
    pub fetch_icons: bool,

    /// Path of the SQLite store file
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// How the store is reset before repopulation
    #[serde(default)]
    pub rebuild_policy: RebuildPolicy,

    /// HTTP timeout in seconds; a timeout is treated as SourceUnavailable
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Names excluded from tracking (standard characters)
    #[serde(default = "default_excluded_names")]
    pub excluded_names: HashSet<String>,

    /// Substring marking the player avatar (excluded from tracking)
    #[serde(default = "default_avatar_marker")]
    pub avatar_marker: String,
}

fn default_character_url() -> String {
    DEFAULT_CHARACTER_URL.to_string()
}

fn default_banner_url() -> String {
    DEFAULT_BANNER_URL.to_string()
}

fn default_detail_url() -> String {
    DEFAULT_DETAIL_URL.to_string()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("banner_tracker.db")
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_excluded_names() -> HashSet<String> {
    STANDARD_CHARACTERS.iter().map(|s| s.to_string()).collect()
}

fn default_avatar_marker() -> String {
    AVATAR_MARKER.to_string()
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            character_url: default_character_url(),
            banner_url: default_banner_url(),
            detail_url: default_detail_url(),
            fetch_icons: false,
            db_path: default_db_path(),
            rebuild_policy: RebuildPolicy::default(),
            timeout_secs: default_timeout_secs(),
            excluded_names: default_excluded_names(),
            avatar_marker: default_avatar_marker(),
        }
    }
}

impl TrackerConfig {
    /// Load configuration from a JSON file; missing fields fall back to defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            TrackerError::Config(format!(
                "failed to read config file {:?}: {}",
                path.as_ref(),
                e
            ))
        })?;

        serde_json::from_str(&content)
            .map_err(|e| TrackerError::Config(format!("failed to parse config JSON: {}", e)))
    }

    /// Load from the given file if it exists, otherwise use defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_known_exclusions() {
        let config = TrackerConfig::default();

        assert!(config.excluded_names.contains("Aloy"));
        assert!(config.excluded_names.contains("Dehya"));
        assert_eq!(config.excluded_names.len(), STANDARD_CHARACTERS.len());
        assert_eq!(config.avatar_marker, "Traveler");
        assert!(!config.fetch_icons);
    }

    #[test]
    fn test_partial_config_file_fills_defaults() {
        let json = r#"{"db_path": "custom.db", "rebuild_policy": "file-reset"}"#;
        let config: TrackerConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.db_path, PathBuf::from("custom.db"));
        assert_eq!(config.rebuild_policy, RebuildPolicy::FileReset);
        assert_eq!(config.character_url, DEFAULT_CHARACTER_URL);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_load_or_default_without_file() {
        let config = TrackerConfig::load_or_default("no_such_config.json").unwrap();
        assert_eq!(config.banner_url, DEFAULT_BANNER_URL);
    }
}
