// 💾 Store Writer - transactional rebuild commit and the read-side query
// One rebuild is one transaction: drop, recreate, insert characters, insert
// appearances, commit. Any failure rolls the store back to its previous
// contents (under the in-place policy) before the error propagates.

use crate::error::{Result, TrackerError};
use crate::reconcile::Reconciled;
use crate::schema;
use chrono::NaiveDate;
use rusqlite::{params, Connection};

/// Replace the store contents with one reconciled batch.
///
/// Characters are inserted first so the foreign-key precondition holds for
/// the appearance rows; identifiers assigned during reconciliation are
/// written explicitly so the two row sets stay consistent. Returns the
/// (characters, appearances) insert counts.
pub fn commit_rebuild(conn: &mut Connection, reconciled: &Reconciled) -> Result<(usize, usize)> {
    let tx = conn.transaction()?;

    schema::reset_tables(&tx)?;
    schema::ensure_schema(&tx)?;

    for character in &reconciled.characters {
        let result = tx.execute(
            "INSERT INTO Characters (CharacterID, Name, Element, ReleaseVersion, IconUrl)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                character.id,
                character.name,
                character.element,
                character.version,
                character.icon_url,
            ],
        );

        match result {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                // Dropping the open transaction rolls everything back.
                return Err(TrackerError::DuplicateCharacter(character.name.clone()));
            }
            Err(e) => return Err(e.into()),
        }
    }

    for appearance in &reconciled.appearances {
        tx.execute(
            "INSERT INTO BannerHistory (CharacterID, StartDate, EndDate)
             VALUES (?1, ?2, ?3)",
            params![
                appearance.character_id,
                appearance.start_date,
                appearance.end_date,
            ],
        )?;
    }

    tx.commit()?;

    Ok((reconciled.characters.len(), reconciled.appearances.len()))
}

/// Row counts for both tables, for terminal reporting and verification
pub fn verify_counts(conn: &Connection) -> Result<(i64, i64)> {
    let characters: i64 =
        conn.query_row("SELECT COUNT(*) FROM Characters", [], |row| row.get(0))?;
    let appearances: i64 =
        conn.query_row("SELECT COUNT(*) FROM BannerHistory", [], |row| row.get(0))?;

    Ok((characters, appearances))
}

/// Per-character aggregate consumed by the display layer
#[derive(Debug, Clone)]
pub struct CharacterSummary {
    pub character_id: i64,
    pub name: String,
    pub element: String,
    pub version: String,
    pub icon_url: String,
    pub appearance_count: i64,
    pub start_dates: Vec<String>,
    pub last_end_date: Option<String>,
    pub days_since_last: Option<i64>,
}

/// The read layer's aggregation query: left-join Characters to BannerHistory,
/// grouped per character. Characters with no banner rows appear with a zero
/// count. Takes the caller's connection; the read layer owns its own session
/// and never shares the writer's transaction.
pub fn character_summaries(conn: &Connection) -> Result<Vec<CharacterSummary>> {
    character_summaries_at(conn, chrono::Utc::now().date_naive())
}

/// Same query with an explicit "today" for the days-elapsed column
pub fn character_summaries_at(
    conn: &Connection,
    today: NaiveDate,
) -> Result<Vec<CharacterSummary>> {
    let mut stmt = conn.prepare(
        "SELECT
            c.CharacterID,
            c.Name,
            c.Element,
            c.ReleaseVersion,
            c.IconUrl,
            COUNT(b.BannerID) as appearances,
            GROUP_CONCAT(b.StartDate) as start_dates,
            MAX(b.EndDate) as last_end
         FROM Characters c
         LEFT JOIN BannerHistory b ON b.CharacterID = c.CharacterID
         GROUP BY c.CharacterID
         ORDER BY c.ReleaseVersion, c.CharacterID",
    )?;

    let summaries = stmt
        .query_map([], |row| {
            let start_dates_concat: Option<String> = row.get(6)?;
            let last_end_date: Option<String> = row.get(7)?;

            Ok(CharacterSummary {
                character_id: row.get(0)?,
                name: row.get(1)?,
                element: row.get(2)?,
                version: row.get(3)?,
                icon_url: row.get(4)?,
                appearance_count: row.get(5)?,
                start_dates: start_dates_concat
                    .map(|joined| joined.split(',').map(str::to_string).collect())
                    .unwrap_or_default(),
                days_since_last: last_end_date.as_deref().and_then(|end| days_since(end, today)),
                last_end_date,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(summaries)
}

fn days_since(end_date: &str, today: NaiveDate) -> Option<i64> {
    let end = NaiveDate::parse_from_str(end_date, "%Y-%m-%d").ok()?;
    Some((today - end).num_days())
}
