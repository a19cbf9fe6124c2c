//! Database operations for study items
//!
//! Handles SQLite database initialization, create/read/update of study items keyed by
//! (user, content unit), due-for-review queries and the review history log.

use crate::error::{Result, StudyError};
use crate::models::scheduler::{MAX_QUALITY, MIN_QUALITY};
use crate::models::{ContentType, ReviewLogEntry, StudyItem};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

const SELECT_ITEM_COLUMNS: &str = "SELECT user_id, content_id, content_type, interval_days, consecutive_correct,
        next_review_date, last_reviewed_at
 FROM study_items";

/// Opens (or creates) the database file and makes sure the tables exist
pub fn init_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    // Writers on other connections wait for the IMMEDIATE lock instead of failing
    conn.busy_timeout(BUSY_TIMEOUT)?;
    create_tables(&conn)?;
    info!(path = %path.display(), "database ready");
    Ok(conn)
}

/// In-memory database with the same schema, used by tests
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    create_tables(&conn)?;
    Ok(conn)
}

fn create_tables(conn: &Connection) -> Result<()> {
    // One schedule per (user, content unit)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS study_items (
            user_id TEXT NOT NULL,
            content_id TEXT NOT NULL,
            content_type TEXT NOT NULL,
            interval_days INTEGER NOT NULL DEFAULT 0,
            consecutive_correct INTEGER NOT NULL DEFAULT 0,
            next_review_date INTEGER NOT NULL,
            last_reviewed_at INTEGER,
            PRIMARY KEY (user_id, content_id, content_type)
        )",
        (),
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS review_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            content_id TEXT NOT NULL,
            content_type TEXT NOT NULL,
            quality_level INTEGER NOT NULL,
            interval_days INTEGER NOT NULL,
            reviewed_at INTEGER NOT NULL,
            FOREIGN KEY (user_id, content_id, content_type)
                REFERENCES study_items(user_id, content_id, content_type)
        )",
        (),
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_study_items_due
         ON study_items (user_id, next_review_date)",
        (),
    )?;

    Ok(())
}

fn timestamp_to_datetime(secs: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or(StudyError::InvalidTimestamp(secs))
}

/// Column-level conversion errors are reported through rusqlite so they work inside row mappers
fn column_datetime(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let secs: i64 = row.get(idx)?;
    timestamp_to_datetime(secs)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

fn column_content_type(row: &Row, idx: usize) -> rusqlite::Result<ContentType> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_study_item(row: &Row) -> rusqlite::Result<StudyItem> {
    let last_reviewed_at = match row.get::<_, Option<i64>>(6)? {
        Some(_) => Some(column_datetime(row, 6)?),
        None => None,
    };

    Ok(StudyItem {
        user_id: row.get(0)?,
        content_id: row.get(1)?,
        content_type: column_content_type(row, 2)?,
        interval_days: row.get(3)?,
        consecutive_correct: row.get(4)?,
        next_review_date: column_datetime(row, 5)?,
        last_reviewed_at,
    })
}

/// Schedules a content unit for a user and returns the stored item.
///
/// If the unit is already scheduled the existing record is returned untouched.
pub fn schedule_item(
    user_id: &str,
    content_id: &str,
    content_type: ContentType,
    now: DateTime<Utc>,
    conn: &Connection,
) -> Result<StudyItem> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO study_items
            (user_id, content_id, content_type, interval_days, consecutive_correct, next_review_date)
         VALUES (?1, ?2, ?3, 0, 0, ?4)",
        params![user_id, content_id, content_type.as_str(), now.timestamp()],
    )?;

    if inserted > 0 {
        info!(user_id, content_id, %content_type, "scheduled new study item");
    } else {
        debug!(user_id, content_id, %content_type, "study item already scheduled");
    }

    get_study_item(user_id, content_id, content_type, conn)?.ok_or_else(|| {
        StudyError::NotScheduled {
            user_id: user_id.to_string(),
            content_id: content_id.to_string(),
            content_type,
        }
    })
}

/// Retrieves one study item, if the user has scheduled it
pub fn get_study_item(
    user_id: &str,
    content_id: &str,
    content_type: ContentType,
    conn: &Connection,
) -> Result<Option<StudyItem>> {
    let sql = format!(
        "{SELECT_ITEM_COLUMNS} WHERE user_id = ?1 AND content_id = ?2 AND content_type = ?3"
    );
    let item = conn
        .query_row(
            &sql,
            params![user_id, content_id, content_type.as_str()],
            row_to_study_item,
        )
        .optional()?;
    Ok(item)
}

/// Writes the scheduling fields of an existing study item back to the database
pub fn update_study_item(item: &StudyItem, conn: &Connection) -> Result<()> {
    let updated = conn.execute(
        "UPDATE study_items
         SET interval_days = ?1, consecutive_correct = ?2, next_review_date = ?3, last_reviewed_at = ?4
         WHERE user_id = ?5 AND content_id = ?6 AND content_type = ?7",
        params![
            item.interval_days,
            item.consecutive_correct,
            item.next_review_date.timestamp(),
            item.last_reviewed_at.map(|t| t.timestamp()),
            item.user_id,
            item.content_id,
            item.content_type.as_str()
        ],
    )?;

    if updated == 0 {
        return Err(StudyError::NotScheduled {
            user_id: item.user_id.clone(),
            content_id: item.content_id.clone(),
            content_type: item.content_type,
        });
    }
    Ok(())
}

/// Inserts the item or overwrites the stored schedule (used by import)
pub fn upsert_study_item(item: &StudyItem, conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT INTO study_items
            (user_id, content_id, content_type, interval_days, consecutive_correct,
             next_review_date, last_reviewed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT (user_id, content_id, content_type) DO UPDATE SET
            interval_days = excluded.interval_days,
            consecutive_correct = excluded.consecutive_correct,
            next_review_date = excluded.next_review_date,
            last_reviewed_at = excluded.last_reviewed_at",
        params![
            item.user_id,
            item.content_id,
            item.content_type.as_str(),
            item.interval_days,
            item.consecutive_correct,
            item.next_review_date.timestamp(),
            item.last_reviewed_at.map(|t| t.timestamp())
        ],
    )?;
    Ok(())
}

/// Retrieves a user's items due for review
///
/// Returns items where next_review_date <= now, ordered by next_review_date (oldest first).
pub fn get_items_due_for_review(
    user_id: &str,
    now: DateTime<Utc>,
    limit: Option<usize>,
    conn: &Connection,
) -> Result<Vec<StudyItem>> {
    // SQLite treats a negative LIMIT as "no limit"
    let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
    let sql = format!(
        "{SELECT_ITEM_COLUMNS}
         WHERE user_id = ?1 AND next_review_date <= ?2
         ORDER BY next_review_date ASC, content_id ASC
         LIMIT ?3"
    );

    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map(params![user_id, now.timestamp(), limit], row_to_study_item)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    debug!(user_id, count = items.len(), "loaded due study items");
    Ok(items)
}

/// Retrieves every item a user has scheduled
pub fn get_all_items(user_id: &str, conn: &Connection) -> Result<Vec<StudyItem>> {
    let sql = format!(
        "{SELECT_ITEM_COLUMNS} WHERE user_id = ?1 ORDER BY content_type ASC, content_id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map(params![user_id], row_to_study_item)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(items)
}

/// Applies a review to a scheduled item and appends it to the review log.
///
/// Read, schedule and write happen in one IMMEDIATE transaction so concurrent
/// reviews of the same item cannot lose updates.
pub fn submit_review<Tz: TimeZone>(
    user_id: &str,
    content_id: &str,
    content_type: ContentType,
    quality_level: i32,
    now: &DateTime<Tz>,
    conn: &mut Connection,
) -> Result<StudyItem> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut item = get_study_item(user_id, content_id, content_type, &tx)?.ok_or_else(|| {
        StudyError::NotScheduled {
            user_id: user_id.to_string(),
            content_id: content_id.to_string(),
            content_type,
        }
    })?;

    let result = item.apply_review(quality_level, now);
    update_study_item(&item, &tx)?;

    tx.execute(
        "INSERT INTO review_log
            (user_id, content_id, content_type, quality_level, interval_days, reviewed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user_id,
            content_id,
            content_type.as_str(),
            quality_level.clamp(MIN_QUALITY, MAX_QUALITY),
            result.next_interval_days,
            now.timestamp()
        ],
    )?;

    // Re-read so callers see the stored, second-precision timestamps
    let stored = get_study_item(user_id, content_id, content_type, &tx)?.unwrap_or(item);
    tx.commit()?;

    info!(
        user_id,
        content_id,
        %content_type,
        quality_level,
        interval_days = result.next_interval_days,
        streak = result.new_consecutive_correct,
        "review recorded"
    );
    Ok(stored)
}

/// Retrieves the review history of one item, oldest first
pub fn get_review_history(
    user_id: &str,
    content_id: &str,
    content_type: ContentType,
    conn: &Connection,
) -> Result<Vec<ReviewLogEntry>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, content_id, content_type, quality_level, interval_days, reviewed_at
         FROM review_log
         WHERE user_id = ?1 AND content_id = ?2 AND content_type = ?3
         ORDER BY reviewed_at ASC, id ASC",
    )?;

    let entries = stmt
        .query_map(params![user_id, content_id, content_type.as_str()], |row| {
            Ok(ReviewLogEntry {
                user_id: row.get(0)?,
                content_id: row.get(1)?,
                content_type: column_content_type(row, 2)?,
                quality_level: row.get(3)?,
                interval_days: row.get(4)?,
                reviewed_at: column_datetime(row, 5)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(entries)
}
