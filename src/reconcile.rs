// ⚖️ Reconciliation - join characters with their banner history
// The two sources are uncoordinated and share nothing but character names,
// so the join key is a normalized name (trim + lowercase) applied to both
// sides. Banner entries with no retained character are logged and dropped,
// never orphaned.

use crate::source::{BannerDateMap, RawCharacter};
use chrono::NaiveDate;
use std::collections::HashMap;

/// One Characters row, identifier assigned for the duration of this rebuild
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterRow {
    pub id: i64,
    pub name: String,
    pub element: String,
    pub version: String,
    pub icon_url: String,
}

/// One BannerHistory row, referencing a CharacterRow id from the same rebuild
#[derive(Debug, Clone, PartialEq)]
pub struct AppearanceRow {
    pub character_id: i64,
    pub start_date: String,
    pub end_date: String,
}

/// The reconciled output of one rebuild, ready for a transactional commit
#[derive(Debug, Clone, Default)]
pub struct Reconciled {
    pub characters: Vec<CharacterRow>,
    pub appearances: Vec<AppearanceRow>,
}

/// Join key normalization, applied identically to both sources.
/// Exact-match joins lost data silently when the sources disagreed on
/// spacing or casing; trimming and case-folding closes that gap.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Join the filtered character set with the banner date map.
///
/// Every filtered character gets a fresh sequential identifier and one row;
/// every banner entry whose normalized name matches a retained character
/// yields one appearance row per (start, end) pair. Unmatched banner names
/// are warned about and dropped - they usually belong to standard characters
/// the filter deliberately untracks.
pub fn reconcile(filtered: &[RawCharacter], banner_map: &BannerDateMap) -> Reconciled {
    let mut characters = Vec::with_capacity(filtered.len());
    let mut ids_by_name: HashMap<String, i64> = HashMap::with_capacity(filtered.len());

    for (index, character) in filtered.iter().enumerate() {
        let id = index as i64 + 1;

        let key = normalize_name(&character.name);
        if let Some(existing) = ids_by_name.insert(key, id) {
            tracing::warn!(
                name = %character.name,
                existing_id = existing,
                "two filtered characters normalize to the same join key"
            );
        }

        characters.push(CharacterRow {
            id,
            name: character.name.clone(),
            element: character.element().to_string(),
            version: character.version.clone().unwrap_or_default(),
            icon_url: String::new(),
        });
    }

    // Sorted iteration keeps appearance order (and any warnings) deterministic
    // across runs over unchanged source data.
    let mut banner_names: Vec<&String> = banner_map.keys().collect();
    banner_names.sort();

    let mut appearances = Vec::new();

    for name in banner_names {
        let Some(&character_id) = ids_by_name.get(&normalize_name(name)) else {
            tracing::warn!(
                name = %name,
                "banner entry has no retained character; dropping"
            );
            continue;
        };

        for (start, end) in &banner_map[name] {
            check_date_order(name, start, end);

            appearances.push(AppearanceRow {
                character_id,
                start_date: start.clone(),
                end_date: end.clone(),
            });
        }
    }

    Reconciled {
        characters,
        appearances,
    }
}

/// Warn when a banner window ends before it starts. The sources stay
/// authoritative, so the row is kept; the warning surfaces the quality issue.
fn check_date_order(name: &str, start: &str, end: &str) {
    let parsed = (
        NaiveDate::parse_from_str(start, "%Y-%m-%d"),
        NaiveDate::parse_from_str(end, "%Y-%m-%d"),
    );

    if let (Ok(start_date), Ok(end_date)) = parsed {
        if end_date < start_date {
            tracing::warn!(
                name = %name,
                start = %start,
                end = %end,
                "banner window ends before it starts"
            );
        }
    }
}
