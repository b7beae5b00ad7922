// 🔎 Inclusion Filter - Rules as Data
// Pure filtering of the raw character records: only maximum-rarity,
// limited-banner characters are tracked. The exclusion set is caller
// configuration, never derived at runtime.

use crate::config::TrackerConfig;
use crate::source::RawCharacter;
use std::collections::HashSet;

/// Only the maximum rarity tier is tracked
pub const MAX_RARITY_TIER: &str = "5";

/// Sentinel release version; sorts entries without a version label last.
/// Version strings are compared lexicographically, matching the source's
/// own versioning scheme.
pub const VERSION_SENTINEL: &str = "9.9";

/// Name-based exclusion rules applied to the primary source
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Standard (permanently available) character names, excluded from tracking
    pub excluded_names: HashSet<String>,

    /// Any name containing this substring is the player avatar and is excluded
    pub avatar_marker: String,
}

impl From<&TrackerConfig> for FilterConfig {
    fn from(config: &TrackerConfig) -> Self {
        FilterConfig {
            excluded_names: config.excluded_names.clone(),
            avatar_marker: config.avatar_marker.clone(),
        }
    }
}

impl FilterConfig {
    /// True when the record survives both the rarity rule and the exclusion set
    pub fn retains(&self, character: &RawCharacter) -> bool {
        character.rarity_str() == MAX_RARITY_TIER
            && !character.name.contains(&self.avatar_marker)
            && !self.excluded_names.contains(&character.name)
    }
}

/// Apply the inclusion rules and stable-sort by release version ascending.
/// Pure function: no I/O, input order is preserved among equal versions.
pub fn filter_characters(raw: Vec<RawCharacter>, config: &FilterConfig) -> Vec<RawCharacter> {
    let mut kept: Vec<RawCharacter> = raw
        .into_iter()
        .filter(|character| config.retains(character))
        .collect();

    kept.sort_by(|a, b| version_key(a).cmp(version_key(b)));
    kept
}

fn version_key(character: &RawCharacter) -> &str {
    character.version.as_deref().unwrap_or(VERSION_SENTINEL)
}
