use std::collections::HashMap;

use anyhow::Result;
use rusqlite::{Connection, Row};

use super::OptionalExt;
use crate::Database;
use crate::models::{NewWork, WorkRow};

const WORK_COLUMNS: &str =
    "w.id, w.creator_id, w.title, w.description, w.image_path, w.is_public, w.created_at";

impl Database {
    // -- Works --

    pub fn insert_work(&self, work: &NewWork<'_>) -> Result<WorkRow> {
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO works (id, creator_id, title, description, image_path, is_public)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    work.id,
                    work.creator_id,
                    work.title,
                    work.description,
                    work.image_path,
                    work.is_public
                ],
            )?;
            for tag in work.tags {
                tx.execute(
                    "INSERT OR IGNORE INTO work_tags (work_id, tag) VALUES (?1, ?2)",
                    (work.id, tag),
                )?;
            }
            query_work(tx, work.id)?
                .ok_or_else(|| anyhow::anyhow!("work {} vanished after insert", work.id))
        })
    }

    pub fn get_work(&self, id: &str) -> Result<Option<WorkRow>> {
        self.with_conn(|conn| query_work(conn, id))
    }

    /// Works visible to `viewer`, newest first.
    ///
    /// Public works always; the viewer's own private works only when the
    /// listing is filtered to the viewer as creator.
    pub fn list_works(
        &self,
        viewer: &str,
        creator_id: Option<&str>,
        tag: Option<&str>,
    ) -> Result<Vec<WorkRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {WORK_COLUMNS}
                 FROM works w
                 WHERE (w.is_public = 1 OR (?2 IS NOT NULL AND ?2 = ?1 AND w.creator_id = ?1))
                   AND (?2 IS NULL OR w.creator_id = ?2)
                   AND (?3 IS NULL OR EXISTS (
                        SELECT 1 FROM work_tags t WHERE t.work_id = w.id AND t.tag = ?3))
                 ORDER BY w.created_at DESC, w.rowid DESC"
            ))?;
            let mut rows = stmt
                .query_map(rusqlite::params![viewer, creator_id, tag], work_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            attach_tags(conn, &mut rows)?;
            Ok(rows)
        })
    }

    /// Flip `is_public` and return the stored work.
    pub fn toggle_work_visibility(&self, id: &str) -> Result<Option<WorkRow>> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE works SET is_public = 1 - is_public WHERE id = ?1",
                [id],
            )?;
            query_work(conn, id)
        })
    }

    // -- Likes --

    /// Toggle a like: removes if it exists, inserts if not.
    /// Returns (liked, like_count) after the change.
    pub fn toggle_like(&self, work_id: &str, user_id: &str) -> Result<(bool, u64)> {
        self.with_tx(|tx| {
            let removed = tx.execute(
                "DELETE FROM likes WHERE work_id = ?1 AND user_id = ?2",
                (work_id, user_id),
            )?;
            if removed == 0 {
                tx.execute(
                    "INSERT INTO likes (work_id, user_id) VALUES (?1, ?2)",
                    (work_id, user_id),
                )?;
            }
            let count = query_like_count(tx, work_id)?;
            Ok((removed == 0, count))
        })
    }

    /// Returns (like_count, liked_by_user).
    pub fn like_summary(&self, work_id: &str, user_id: &str) -> Result<(u64, bool)> {
        self.with_conn(|conn| {
            let count = query_like_count(conn, work_id)?;
            let liked = conn
                .query_row(
                    "SELECT 1 FROM likes WHERE work_id = ?1 AND user_id = ?2",
                    (work_id, user_id),
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            Ok((count, liked))
        })
    }
}

fn query_work(conn: &Connection, id: &str) -> Result<Option<WorkRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {WORK_COLUMNS} FROM works w WHERE w.id = ?1"),
            [id],
            work_from_row,
        )
        .optional()?;

    match row {
        Some(row) => {
            let mut rows = vec![row];
            attach_tags(conn, &mut rows)?;
            Ok(rows.pop())
        }
        None => Ok(None),
    }
}

fn query_like_count(conn: &Connection, work_id: &str) -> Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM likes WHERE work_id = ?1",
        [work_id],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

/// Batch-fetch tags for a set of works.
fn attach_tags(conn: &Connection, works: &mut [WorkRow]) -> Result<()> {
    if works.is_empty() {
        return Ok(());
    }

    let placeholders: Vec<String> = (1..=works.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "SELECT work_id, tag FROM work_tags WHERE work_id IN ({}) ORDER BY tag",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::types::ToSql> = works
        .iter()
        .map(|w| &w.id as &dyn rusqlite::types::ToSql)
        .collect();

    let mut by_work: HashMap<String, Vec<String>> = HashMap::new();
    let pairs = stmt.query_map(params.as_slice(), |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    for pair in pairs {
        let (work_id, tag) = pair?;
        by_work.entry(work_id).or_default().push(tag);
    }

    for work in works.iter_mut() {
        work.tags = by_work.remove(&work.id).unwrap_or_default();
    }
    Ok(())
}

fn work_from_row(row: &Row<'_>) -> rusqlite::Result<WorkRow> {
    Ok(WorkRow {
        id: row.get(0)?,
        creator_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        image_path: row.get(4)?,
        tags: Vec::new(),
        is_public: row.get(5)?,
        created_at: row.get(6)?,
    })
}
