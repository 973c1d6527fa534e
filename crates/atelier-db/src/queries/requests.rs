use anyhow::Result;
use rusqlite::{Connection, Row};

use super::OptionalExt;
use crate::Database;
use crate::migrations::NOW;
use crate::models::{MessageRow, NewRequest, RequestRow};

const REQUEST_COLUMNS: &str =
    "id, creator_id, client_id, work_id, title, message, status, created_at, updated_at";

const MESSAGE_COLUMNS: &str = "id, request_id, sender_id, body, is_read, created_at";

impl Database {
    // -- Requests --

    /// Insert a pending request and its first message (sent by the client)
    /// atomically.
    pub fn create_request_with_message(
        &self,
        req: &NewRequest<'_>,
    ) -> Result<(RequestRow, MessageRow)> {
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO requests (id, creator_id, client_id, work_id, title, message)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    req.id,
                    req.creator_id,
                    req.client_id,
                    req.work_id,
                    req.title,
                    req.message
                ],
            )?;
            let message =
                insert_message_row(tx, req.message_id, req.id, req.client_id, req.message)?;
            let request = query_request(tx, req.id)?
                .ok_or_else(|| anyhow::anyhow!("request {} vanished after insert", req.id))?;
            Ok((request, message))
        })
    }

    pub fn get_request(&self, id: &str) -> Result<Option<RequestRow>> {
        self.with_conn(|conn| query_request(conn, id))
    }

    /// Requests where `user_id` is either party, most recently updated first.
    pub fn list_requests_for(&self, user_id: &str) -> Result<Vec<RequestRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {REQUEST_COLUMNS} FROM requests
                 WHERE creator_id = ?1 OR client_id = ?1
                 ORDER BY updated_at DESC, rowid DESC"
            ))?;
            let rows = stmt
                .query_map([user_id], request_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Compare-and-set the status. Returns the stored row, or `None` when the
    /// request no longer has status `expected` (or no longer exists).
    pub fn update_request_status(
        &self,
        id: &str,
        expected: &str,
        next: &str,
    ) -> Result<Option<RequestRow>> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                &format!(
                    "UPDATE requests SET status = ?3, updated_at = {NOW}
                     WHERE id = ?1 AND status = ?2"
                ),
                (id, expected, next),
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_request(conn, id)
        })
    }

    // -- Messages --

    /// Append to a thread. The row is only written if, at insert time, the
    /// request still accepts messages and `sender_id` is one of its parties;
    /// otherwise returns `None` and nothing is stored.
    pub fn insert_message(
        &self,
        id: &str,
        request_id: &str,
        sender_id: &str,
        body: &str,
    ) -> Result<Option<MessageRow>> {
        self.with_tx(|tx| {
            let inserted = tx.execute(
                "INSERT INTO messages (id, request_id, sender_id, body)
                 SELECT ?1, ?2, ?3, ?4
                 WHERE EXISTS (
                     SELECT 1 FROM requests
                     WHERE id = ?2
                       AND status IN ('pending', 'accepted')
                       AND ?3 IN (creator_id, client_id)
                 )",
                (id, request_id, sender_id, body),
            )?;
            if inserted == 0 {
                return Ok(None);
            }
            query_message(tx, id).map(Some)
        })
    }

    /// The full thread, oldest first.
    pub fn get_messages(&self, request_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE request_id = ?1
                 ORDER BY created_at ASC, rowid ASC"
            ))?;
            let rows = stmt
                .query_map([request_id], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Mark everything the other party sent on this request as read.
    pub fn mark_messages_read(&self, request_id: &str, reader_id: &str) -> Result<u64> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "UPDATE messages SET is_read = 1
                 WHERE request_id = ?1 AND sender_id != ?2 AND is_read = 0",
                (request_id, reader_id),
            )?;
            Ok(n as u64)
        })
    }

    /// Unread messages addressed to `user_id` across all of their requests.
    pub fn unread_count(&self, user_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*)
                 FROM messages m
                 JOIN requests r ON r.id = m.request_id
                 WHERE (r.creator_id = ?1 OR r.client_id = ?1)
                   AND m.sender_id != ?1
                   AND m.is_read = 0",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
    }
}

fn insert_message_row(
    conn: &Connection,
    id: &str,
    request_id: &str,
    sender_id: &str,
    body: &str,
) -> Result<MessageRow> {
    conn.execute(
        "INSERT INTO messages (id, request_id, sender_id, body) VALUES (?1, ?2, ?3, ?4)",
        (id, request_id, sender_id, body),
    )?;
    query_message(conn, id)
}

fn query_message(conn: &Connection, id: &str) -> Result<MessageRow> {
    let row = conn.query_row(
        &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
        [id],
        message_from_row,
    )?;
    Ok(row)
}

fn query_request(conn: &Connection, id: &str) -> Result<Option<RequestRow>> {
    conn.query_row(
        &format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE id = ?1"),
        [id],
        request_from_row,
    )
    .optional()
}

fn request_from_row(row: &Row<'_>) -> rusqlite::Result<RequestRow> {
    Ok(RequestRow {
        id: row.get(0)?,
        creator_id: row.get(1)?,
        client_id: row.get(2)?,
        work_id: row.get(3)?,
        title: row.get(4)?,
        message: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        request_id: row.get(1)?,
        sender_id: row.get(2)?,
        body: row.get(3)?,
        is_read: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::queries::fixtures;

    use super::*;

    fn open_request(db: &Database) -> (String, String, RequestRow) {
        let creator = fixtures::account(db, "creator");
        let client = fixtures::account(db, "client");
        let (request, _) = db
            .create_request_with_message(&NewRequest {
                id: "r1",
                creator_id: &creator,
                client_id: &client,
                work_id: None,
                title: "Photo shoot",
                message: "Available Saturday?",
                message_id: "m1",
            })
            .unwrap();
        (creator, client, request)
    }

    #[test]
    fn request_starts_pending_with_initial_message() {
        let db = fixtures::db();
        let (creator, client, request) = open_request(&db);

        assert_eq!(request.status, "pending");
        assert_eq!(request.creator_id, creator);
        assert_eq!(request.client_id, client);

        let thread = db.get_messages("r1").unwrap();
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].sender_id, client);
        assert!(thread[0].body.contains("Available Saturday?"));
    }

    #[test]
    fn failed_message_insert_rolls_back_request() {
        let db = fixtures::db();
        let creator = fixtures::account(&db, "creator");

        // Unknown client violates the foreign key on both rows.
        let result = db.create_request_with_message(&NewRequest {
            id: "r1",
            creator_id: &creator,
            client_id: "ghost",
            work_id: None,
            title: "t",
            message: "m",
            message_id: "m1",
        });
        assert!(result.is_err());
        assert!(db.get_request("r1").unwrap().is_none());
    }

    #[test]
    fn status_update_is_compare_and_set() {
        let db = fixtures::db();
        let (_, _, request) = open_request(&db);

        let accepted = db
            .update_request_status("r1", "pending", "accepted")
            .unwrap()
            .unwrap();
        assert_eq!(accepted.status, "accepted");
        assert!(accepted.updated_at >= request.updated_at);

        // A second writer that still believes the request is pending loses.
        assert!(
            db.update_request_status("r1", "pending", "rejected")
                .unwrap()
                .is_none()
        );
        assert_eq!(db.get_request("r1").unwrap().unwrap().status, "accepted");
    }

    #[test]
    fn thread_is_ordered_oldest_first() {
        let db = fixtures::db();
        let (creator, client, _) = open_request(&db);
        db.insert_message("m2", "r1", &creator, "Yes, 10am works")
            .unwrap()
            .unwrap();
        db.insert_message("m3", "r1", &client, "Great").unwrap().unwrap();

        let thread = db.get_messages("r1").unwrap();
        let ids: Vec<&str> = thread.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
        assert!(thread.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }

    #[test]
    fn message_is_refused_once_request_is_no_longer_open() {
        let db = fixtures::db();
        let (creator, client, request) = open_request(&db);
        assert_eq!(request.status, "pending");

        // The creator rejects after the sender last saw the request.
        db.update_request_status("r1", "pending", "rejected")
            .unwrap()
            .unwrap();

        assert!(
            db.insert_message("m2", "r1", &client, "Still on?")
                .unwrap()
                .is_none()
        );
        assert!(
            db.insert_message("m3", "r1", &creator, "Sorry")
                .unwrap()
                .is_none()
        );
        assert_eq!(db.get_messages("r1").unwrap().len(), 1);
    }

    #[test]
    fn message_from_outsider_is_not_stored() {
        let db = fixtures::db();
        open_request(&db);
        let stranger = fixtures::account(&db, "client");

        assert!(
            db.insert_message("m2", "r1", &stranger, "Hello?")
                .unwrap()
                .is_none()
        );
        assert_eq!(db.get_messages("r1").unwrap().len(), 1);
    }

    #[test]
    fn unread_counts_only_messages_from_the_other_party() {
        let db = fixtures::db();
        let (creator, client, _) = open_request(&db);
        db.insert_message("m2", "r1", &creator, "Sure").unwrap().unwrap();

        assert_eq!(db.unread_count(&creator).unwrap(), 1);
        assert_eq!(db.unread_count(&client).unwrap(), 1);

        assert_eq!(db.mark_messages_read("r1", &creator).unwrap(), 1);
        assert_eq!(db.unread_count(&creator).unwrap(), 0);
        assert_eq!(db.unread_count(&client).unwrap(), 1);
    }

    #[test]
    fn requests_are_listed_for_both_parties_only() {
        let db = fixtures::db();
        let (creator, client, _) = open_request(&db);
        let stranger = fixtures::account(&db, "client");

        assert_eq!(db.list_requests_for(&creator).unwrap().len(), 1);
        assert_eq!(db.list_requests_for(&client).unwrap().len(), 1);
        assert!(db.list_requests_for(&stranger).unwrap().is_empty());
    }
}
