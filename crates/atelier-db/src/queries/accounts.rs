use anyhow::Result;
use rusqlite::{Connection, Row};

use super::OptionalExt;
use crate::Database;
use crate::models::{AccountRow, ProfileRow, ProfileUpdate};

const PROFILE_COLUMNS: &str = "id, role, display_name, bio, genre, area, link, created_at";

impl Database {
    // -- Accounts --

    /// Create the account and its profile together.
    pub fn create_account(
        &self,
        id: &str,
        email: &str,
        password_hash: &str,
        role: &str,
        display_name: &str,
    ) -> Result<()> {
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO accounts (id, email, password_hash) VALUES (?1, ?2, ?3)",
                (id, email, password_hash),
            )?;
            tx.execute(
                "INSERT INTO profiles (id, role, display_name) VALUES (?1, ?2, ?3)",
                (id, role, display_name),
            )?;
            Ok(())
        })
    }

    pub fn get_account_by_email(&self, email: &str) -> Result<Option<AccountRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT a.id, a.email, a.password_hash, p.role, a.created_at
                 FROM accounts a
                 JOIN profiles p ON p.id = a.id
                 WHERE a.email = ?1",
                [email],
                |row| {
                    Ok(AccountRow {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        password_hash: row.get(2)?,
                        role: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                },
            )
            .optional()
        })
    }

    // -- Profiles --

    pub fn get_profile(&self, id: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| query_profile(conn, id))
    }

    /// Apply the non-empty fields of `update` and return the stored profile.
    pub fn update_profile(&self, id: &str, update: &ProfileUpdate<'_>) -> Result<Option<ProfileRow>> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE profiles SET
                    display_name = COALESCE(?2, display_name),
                    bio = COALESCE(?3, bio),
                    genre = COALESCE(?4, genre),
                    area = COALESCE(?5, area),
                    link = COALESCE(?6, link)
                 WHERE id = ?1",
                rusqlite::params![
                    id,
                    update.display_name,
                    update.bio,
                    update.genre,
                    update.area,
                    update.link
                ],
            )?;
            query_profile(conn, id)
        })
    }

    // -- Sessions --

    pub fn revoke_token(&self, jti: &str, expires_at: i64) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO revoked_tokens (jti, expires_at) VALUES (?1, ?2)",
                rusqlite::params![jti, expires_at],
            )?;
            Ok(())
        })
    }

    pub fn is_token_revoked(&self, jti: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row("SELECT 1 FROM revoked_tokens WHERE jti = ?1", [jti], |_| Ok(()))
                .optional()?;
            Ok(found.is_some())
        })
    }

    /// Drop revocations whose token would have expired anyway.
    pub fn prune_revoked_tokens(&self, now: i64) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let n = conn.execute("DELETE FROM revoked_tokens WHERE expires_at < ?1", [now])?;
            Ok(n)
        })
    }
}

pub(crate) fn query_profile(conn: &Connection, id: &str) -> Result<Option<ProfileRow>> {
    conn.query_row(
        &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1"),
        [id],
        profile_from_row,
    )
    .optional()
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<ProfileRow> {
    Ok(ProfileRow {
        id: row.get(0)?,
        role: row.get(1)?,
        display_name: row.get(2)?,
        bio: row.get(3)?,
        genre: row.get(4)?,
        area: row.get(5)?,
        link: row.get(6)?,
        created_at: row.get(7)?,
    })
}
