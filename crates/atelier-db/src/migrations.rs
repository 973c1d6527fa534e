use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Millisecond-precision UTC timestamp, RFC 3339 shaped so it sorts as text.
pub const NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(&format!(
            "
            CREATE TABLE accounts (
                id              TEXT PRIMARY KEY,
                email           TEXT NOT NULL UNIQUE,
                password_hash   TEXT NOT NULL,
                created_at      TEXT NOT NULL DEFAULT ({NOW})
            );

            CREATE TABLE profiles (
                id              TEXT PRIMARY KEY REFERENCES accounts(id),
                role            TEXT NOT NULL CHECK (role IN ('creator', 'client')),
                display_name    TEXT NOT NULL,
                bio             TEXT,
                genre           TEXT,
                area            TEXT,
                link            TEXT,
                created_at      TEXT NOT NULL DEFAULT ({NOW})
            );

            CREATE TABLE works (
                id              TEXT PRIMARY KEY,
                creator_id      TEXT NOT NULL REFERENCES profiles(id),
                title           TEXT NOT NULL,
                description     TEXT,
                image_path      TEXT,
                is_public       INTEGER NOT NULL DEFAULT 1,
                created_at      TEXT NOT NULL DEFAULT ({NOW})
            );

            CREATE INDEX idx_works_creator ON works(creator_id, created_at);

            CREATE TABLE work_tags (
                work_id         TEXT NOT NULL REFERENCES works(id),
                tag             TEXT NOT NULL,
                PRIMARY KEY (work_id, tag)
            );

            CREATE INDEX idx_work_tags_tag ON work_tags(tag);

            CREATE TABLE likes (
                work_id         TEXT NOT NULL REFERENCES works(id),
                user_id         TEXT NOT NULL REFERENCES profiles(id),
                created_at      TEXT NOT NULL DEFAULT ({NOW}),
                PRIMARY KEY (work_id, user_id)
            );

            CREATE TABLE requests (
                id              TEXT PRIMARY KEY,
                creator_id      TEXT NOT NULL REFERENCES profiles(id),
                client_id       TEXT NOT NULL REFERENCES profiles(id),
                work_id         TEXT REFERENCES works(id),
                title           TEXT NOT NULL,
                message         TEXT NOT NULL,
                status          TEXT NOT NULL DEFAULT 'pending'
                                CHECK (status IN ('pending', 'accepted', 'rejected', 'closed')),
                created_at      TEXT NOT NULL DEFAULT ({NOW}),
                updated_at      TEXT NOT NULL DEFAULT ({NOW})
            );

            CREATE INDEX idx_requests_creator ON requests(creator_id);
            CREATE INDEX idx_requests_client ON requests(client_id);

            CREATE TABLE messages (
                id              TEXT PRIMARY KEY,
                request_id      TEXT NOT NULL REFERENCES requests(id),
                sender_id       TEXT NOT NULL REFERENCES profiles(id),
                body            TEXT NOT NULL,
                is_read         INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL DEFAULT ({NOW})
            );

            CREATE INDEX idx_messages_request ON messages(request_id, created_at);

            CREATE TABLE revoked_tokens (
                jti             TEXT PRIMARY KEY,
                expires_at      INTEGER NOT NULL
            );

            INSERT INTO schema_version (version) VALUES (1);
            "
        ))?;
    }

    info!("Database migrations complete");
    Ok(())
}
