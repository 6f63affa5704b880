use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{Result, TrackerError};
use crate::domain::{BatchItem, Blogger, ExtractedMetrics, HistoryRecord, Platform};
use crate::store::{RefreshFilter, Store};

const BLOGGER_COLUMNS: &str = "id, nickname, xhs_link, xhs_likes, xhs_favorites, xhs_comments, \
                               xhs_shares, metrics_updated_at, created_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        migrations.to_latest(&mut conn)?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            TrackerError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    fn format_datetime(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn to_count(value: Option<i64>) -> Option<u64> {
        value.map(|v| u64::try_from(v).unwrap_or(0))
    }

    fn from_count(value: u64) -> i64 {
        i64::try_from(value).unwrap_or(i64::MAX)
    }

    fn blogger_from_row(row: &Row<'_>) -> rusqlite::Result<Blogger> {
        let counts = (
            Self::to_count(row.get(3)?),
            Self::to_count(row.get(4)?),
            Self::to_count(row.get(5)?),
            Self::to_count(row.get(6)?),
        );
        let metrics = match counts {
            (Some(likes), Some(favorites), Some(comments), Some(shares)) => {
                Some(ExtractedMetrics::new(likes, favorites, comments, shares))
            }
            _ => None,
        };

        Ok(Blogger {
            id: row.get(0)?,
            nickname: row.get(1)?,
            xhs_link: row.get(2)?,
            metrics,
            metrics_updated_at: row
                .get::<_, Option<String>>(7)?
                .and_then(|s| Self::parse_datetime(&s)),
            created_at: row
                .get::<_, String>(8)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
        })
    }
}

impl Store for SqliteStore {
    fn add_blogger(&self, blogger: &Blogger) -> Result<i64> {
        let conn = self.lock()?;
        let created_at = Self::format_datetime(&blogger.created_at);

        conn.execute(
            "INSERT INTO bloggers (nickname, xhs_link, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)",
            params![blogger.nickname, blogger.xhs_link, created_at],
        )?;

        Ok(conn.last_insert_rowid())
    }

    fn get_blogger(&self, id: i64) -> Result<Option<Blogger>> {
        let conn = self.lock()?;

        let result = conn
            .query_row(
                &format!("SELECT {BLOGGER_COLUMNS} FROM bloggers WHERE id = ?1"),
                params![id],
                Self::blogger_from_row,
            )
            .optional()?;

        Ok(result)
    }

    fn get_all_bloggers(&self) -> Result<Vec<Blogger>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {BLOGGER_COLUMNS} FROM bloggers ORDER BY id"
        ))?;

        let bloggers = stmt
            .query_map([], Self::blogger_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(bloggers)
    }

    fn delete_blogger(&self, id: i64) -> Result<()> {
        let conn = self.lock()?;
        let changed = conn.execute("DELETE FROM bloggers WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(TrackerError::BloggerNotFound(id));
        }
        Ok(())
    }

    fn list_refreshable(&self, filter: &RefreshFilter) -> Result<Vec<BatchItem>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare("SELECT id, nickname, xhs_link FROM bloggers ORDER BY id")?;

        let items = stmt
            .query_map([], |row| {
                Ok(BatchItem::new(
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .filter(|item| filter.matches(item.id))
            .collect();

        Ok(items)
    }

    fn record_refresh(&self, record: &HistoryRecord) -> Result<i64> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let metrics = &record.metrics;
        let recorded_at = Self::format_datetime(&record.recorded_at);

        let changed = tx.execute(
            "UPDATE bloggers
             SET xhs_likes = ?1, xhs_favorites = ?2, xhs_comments = ?3, xhs_shares = ?4,
                 metrics_updated_at = ?5, updated_at = ?5
             WHERE id = ?6",
            params![
                Self::from_count(metrics.likes),
                Self::from_count(metrics.favorites),
                Self::from_count(metrics.comments),
                Self::from_count(metrics.shares),
                recorded_at,
                record.item_id
            ],
        )?;

        if changed == 0 {
            return Err(TrackerError::BloggerNotFound(record.item_id));
        }

        tx.execute(
            "INSERT INTO interaction_history
             (blogger_id, platform, likes, favorites, comments, shares, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.item_id,
                record.platform.as_str(),
                Self::from_count(metrics.likes),
                Self::from_count(metrics.favorites),
                Self::from_count(metrics.comments),
                Self::from_count(metrics.shares),
                recorded_at
            ],
        )?;
        let history_id = tx.last_insert_rowid();

        tx.commit()?;
        Ok(history_id)
    }

    fn get_history(
        &self,
        blogger_id: i64,
        platform: Platform,
        since: DateTime<Utc>,
    ) -> Result<Vec<HistoryRecord>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT id, blogger_id, likes, favorites, comments, shares, recorded_at
             FROM interaction_history
             WHERE blogger_id = ?1 AND platform = ?2 AND recorded_at >= ?3
             ORDER BY recorded_at ASC, id ASC",
        )?;

        let records = stmt
            .query_map(
                params![blogger_id, platform.as_str(), Self::format_datetime(&since)],
                |row| {
                    Ok(HistoryRecord {
                        id: row.get(0)?,
                        item_id: row.get(1)?,
                        platform,
                        metrics: ExtractedMetrics::new(
                            Self::to_count(row.get(2)?).unwrap_or(0),
                            Self::to_count(row.get(3)?).unwrap_or(0),
                            Self::to_count(row.get(4)?).unwrap_or(0),
                            Self::to_count(row.get(5)?).unwrap_or(0),
                        ),
                        recorded_at: row
                            .get::<_, String>(6)
                            .ok()
                            .and_then(|s| Self::parse_datetime(&s))
                            .unwrap_or_else(Utc::now),
                    })
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }
}
