// 🔁 Rebuild Pipeline - fetch, filter, reconcile, commit
// One rebuild is one linear run-to-completion sequence. Both required
// sources are fetched before the store is touched at all, so a fetch
// failure leaves the previous store contents fully intact under either
// rebuild policy. Concurrent rebuilds are not supported; callers serialize.

use crate::config::TrackerConfig;
use crate::error::Result;
use crate::filter::{filter_characters, FilterConfig};
use crate::reconcile::reconcile;
use crate::schema::{open_store, RebuildPolicy};
use crate::source::{BannerDateMap, RawCharacter, SourceClient};
use crate::store::commit_rebuild;
use rusqlite::Connection;

/// Counts from one completed rebuild, for terminal reporting
#[derive(Debug, Clone, Copy)]
pub struct RebuildSummary {
    pub raw_characters: usize,
    pub tracked_characters: usize,
    pub appearances: usize,
    pub policy: RebuildPolicy,
}

/// Run one full rebuild against the configured external sources.
pub fn run_rebuild(config: &TrackerConfig) -> Result<RebuildSummary> {
    let client = SourceClient::new(config)?;

    // Both required fetches happen before any destructive store action.
    println!("📡 Fetching latest character data...");
    let raw = client.fetch_characters()?;
    println!("✓ Fetched {} raw character records", raw.len());

    println!("📡 Fetching historical banner dates...");
    let banner_map = client.fetch_banner_dates()?;
    println!("✓ Fetched banner history for {} names", banner_map.len());

    let raw_count = raw.len();
    let filtered = filter_characters(raw, &FilterConfig::from(config));
    println!(
        "✓ Retained {} limited max-rarity characters ({} excluded)",
        filtered.len(),
        raw_count - filtered.len()
    );

    let mut reconciled = reconcile(&filtered, &banner_map);

    // Optional enrichment: failures degrade to an empty icon, never abort.
    if config.fetch_icons {
        println!("🖼  Resolving character icons...");
        for character in &mut reconciled.characters {
            character.icon_url = client.fetch_icon(&character.name).unwrap_or_default();
        }
    }

    let mut conn = open_store(&config.db_path, config.rebuild_policy)?;
    let (characters, appearances) = commit_rebuild(&mut conn, &reconciled)?;

    Ok(RebuildSummary {
        raw_characters: raw_count,
        tracked_characters: characters,
        appearances,
        policy: config.rebuild_policy,
    })
}

/// Rebuild an already-open store from pre-fetched source data.
/// The offline composition of the pipeline: filter, reconcile, commit.
pub fn rebuild_into(
    conn: &mut Connection,
    raw: Vec<RawCharacter>,
    banner_map: &BannerDateMap,
    filter: &FilterConfig,
) -> Result<(usize, usize)> {
    let filtered = filter_characters(raw, filter);
    let reconciled = reconcile(&filtered, banner_map);

    commit_rebuild(conn, &reconciled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;
    use crate::source::{parse_banner_dates, parse_characters};
    use crate::store::verify_counts;
    use std::collections::HashSet;

    fn open_test_store() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        schema::configure_connection(&conn).unwrap();
        schema::ensure_schema(&conn).unwrap();
        conn
    }

    fn exclusions(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_end_to_end_scenario() {
        // Primary serves A (limited) and Aether (standard, excluded);
        // the banner source covers only A.
        let raw = parse_characters(
            r#"[
                {"name": "A", "rarity": "5", "element": "Fire", "version": "1.0"},
                {"name": "Aether", "rarity": "5", "element": "Anemo", "version": "1.0"}
            ]"#,
        )
        .unwrap();
        let banner_map =
            parse_banner_dates(r#"{"A": [["2023-01-01", "2023-01-21"]]}"#).unwrap();

        let filter = FilterConfig {
            excluded_names: exclusions(&["Aether"]),
            avatar_marker: "Traveler".to_string(),
        };

        let mut conn = open_test_store();
        let (characters, appearances) =
            rebuild_into(&mut conn, raw, &banner_map, &filter).unwrap();

        assert_eq!((characters, appearances), (1, 1));

        let (name, element): (String, String) = conn
            .query_row("SELECT Name, Element FROM Characters", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(name, "A");
        assert_eq!(element, "Fire");

        let referenced: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM BannerHistory b
                 JOIN Characters c ON c.CharacterID = b.CharacterID
                 WHERE c.Name = 'A'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(referenced, 1);
    }

    #[test]
    fn test_unmatched_banner_key_produces_no_rows_and_no_error() {
        let raw = parse_characters(
            r#"[{"name": "A", "rarity": "5", "element": "Fire", "version": "1.0"}]"#,
        )
        .unwrap();
        let banner_map =
            parse_banner_dates(r#"{"B": [["2023-01-01", "2023-01-21"]]}"#).unwrap();

        let filter = FilterConfig {
            excluded_names: HashSet::new(),
            avatar_marker: "Traveler".to_string(),
        };

        let mut conn = open_test_store();
        rebuild_into(&mut conn, raw, &banner_map, &filter).unwrap();

        assert_eq!(verify_counts(&conn).unwrap(), (1, 0));
    }

    #[test]
    fn test_rerun_over_unchanged_data_yields_same_contents() {
        let payload = r#"[
            {"name": "Venti", "rarity": "5", "element": "Anemo", "version": "1.0"},
            {"name": "Hu Tao", "rarity": "5", "element": "Pyro", "version": "1.3"}
        ]"#;
        let banners = r#"{
            "Venti": [["2020-09-28", "2020-10-18"]],
            "Hu Tao": [["2021-03-02", "2021-03-23"], ["2021-11-02", "2021-11-23"]]
        }"#;

        let filter = FilterConfig {
            excluded_names: HashSet::new(),
            avatar_marker: "Traveler".to_string(),
        };

        let mut conn = open_test_store();

        let snapshot = |conn: &Connection| -> Vec<(String, String, String, i64)> {
            let mut stmt = conn
                .prepare(
                    "SELECT c.Name, c.Element, c.ReleaseVersion, COUNT(b.BannerID)
                     FROM Characters c
                     LEFT JOIN BannerHistory b ON b.CharacterID = c.CharacterID
                     GROUP BY c.CharacterID
                     ORDER BY c.Name",
                )
                .unwrap();
            stmt.query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap()
        };

        rebuild_into(
            &mut conn,
            parse_characters(payload).unwrap(),
            &parse_banner_dates(banners).unwrap(),
            &filter,
        )
        .unwrap();
        let first = snapshot(&conn);

        rebuild_into(
            &mut conn,
            parse_characters(payload).unwrap(),
            &parse_banner_dates(banners).unwrap(),
            &filter,
        )
        .unwrap();
        let second = snapshot(&conn);

        assert_eq!(first, second);
        assert_eq!(verify_counts(&conn).unwrap(), (2, 3));
    }
}
