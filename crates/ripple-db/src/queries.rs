use crate::Database;
use crate::models::{PostReadRow, PostRow, UserHit, UserProfile, UserRow};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    /// Insert a new user. Returns false when the username is already taken
    /// (UNIQUE constraint), which callers surface as a validation failure
    /// rather than a store error.
    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        password_hash: &str,
        firstname: &str,
        surname: &str,
        email: &str,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, username, password, firstname, surname, email)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                (id, username, password_hash, firstname, surname, email),
            );
            match inserted {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    pub fn email_in_use(&self, email: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let used = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
                [email],
                |row| row.get(0),
            )?;
            Ok(used)
        })
    }

    /// A user row plus its friend-graph view, all under one lock
    /// acquisition so the three list reads are mutually consistent.
    pub fn load_profile(&self, id: &str) -> Result<Option<UserProfile>> {
        self.with_conn(|conn| {
            let Some(user) = query_user_by_id(conn, id)? else {
                return Ok(None);
            };

            Ok(Some(UserProfile {
                friends: friends_of(conn, id)?,
                sent: requests_sent_by(conn, id)?,
                received: requests_received_by(conn, id)?,
                user,
            }))
        })
    }

    /// Substring match on username, excluding the caller. Uses instr()
    /// rather than LIKE so the search text cannot smuggle wildcards.
    pub fn search_users(&self, text: &str, exclude_username: &str) -> Result<Vec<UserHit>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username FROM users
                 WHERE instr(username, ?1) > 0 AND username <> ?2
                 ORDER BY username",
            )?;

            let rows = stmt
                .query_map([text, exclude_username], |row| {
                    Ok(UserHit {
                        id: row.get(0)?,
                        username: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Posts --

    pub fn insert_post(
        &self,
        id: &str,
        author_id: &str,
        author_name: &str,
        body: &str,
        recipient_id: Option<&str>,
        recipient_name: &str,
        created_at: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO posts (id, author_id, author_name, body, recipient_id, recipient_name, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![id, author_id, author_name, body, recipient_id, recipient_name, created_at],
            )?;
            Ok(())
        })
    }

    /// All posts, newest first. The stored timestamp is a display snapshot
    /// and does not sort, so insertion order stands in for it.
    pub fn list_posts(&self) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, author_id, author_name, body, recipient_id, recipient_name, created_at
                 FROM posts ORDER BY rowid DESC",
            )?;

            let rows = stmt
                .query_map([], post_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn get_post(&self, id: &str) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, author_id, author_name, body, recipient_id, recipient_name, created_at
                 FROM posts WHERE id = ?1",
            )?;

            let row = stmt.query_row([id], post_from_row).optional()?;
            Ok(row)
        })
    }

    /// Batch-fetch read markers for a set of post ids.
    pub fn reads_for_posts(&self, post_ids: &[String]) -> Result<Vec<PostReadRow>> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=post_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT post_id, user_id FROM post_reads WHERE post_id IN ({})",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = post_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), |row| {
                    Ok(PostReadRow {
                        post_id: row.get(0)?,
                        user_id: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn reads_for_post(&self, post_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT user_id FROM post_reads WHERE post_id = ?1")?;

            let rows = stmt
                .query_map([post_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Mark or unmark a post as read by a viewer. Idempotent in both
    /// directions: marking read twice or unmarking an absent flag is a
    /// no-op.
    pub fn set_read_flag(&self, post_id: &str, user_id: &str, read: bool) -> Result<()> {
        self.with_conn_mut(|conn| {
            if read {
                conn.execute(
                    "INSERT OR IGNORE INTO post_reads (post_id, user_id) VALUES (?1, ?2)",
                    (post_id, user_id),
                )?;
            } else {
                conn.execute(
                    "DELETE FROM post_reads WHERE post_id = ?1 AND user_id = ?2",
                    (post_id, user_id),
                )?;
            }
            Ok(())
        })
    }
}

fn user_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<UserRow, rusqlite::Error> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        firstname: row.get(3)?,
        surname: row.get(4)?,
        email: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn post_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<PostRow, rusqlite::Error> {
    Ok(PostRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        author_name: row.get(2)?,
        body: row.get(3)?,
        recipient_id: row.get(4)?,
        recipient_name: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, password, firstname, surname, email, created_at
         FROM users WHERE username = ?1",
    )?;

    let row = stmt.query_row([username], user_from_row).optional()?;
    Ok(row)
}

fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, password, firstname, surname, email, created_at
         FROM users WHERE id = ?1",
    )?;

    let row = stmt.query_row([id], user_from_row).optional()?;
    Ok(row)
}

pub(crate) fn friends_of(conn: &Connection, id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT user_b FROM friendships WHERE user_a = ?1
         UNION ALL
         SELECT user_a FROM friendships WHERE user_b = ?1",
    )?;

    let rows = stmt
        .query_map([id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

pub(crate) fn requests_sent_by(conn: &Connection, id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT receiver FROM friend_requests WHERE sender = ?1")?;

    let rows = stmt
        .query_map([id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

pub(crate) fn requests_received_by(conn: &Connection, id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT sender FROM friend_requests WHERE receiver = ?1")?;

    let rows = stmt
        .query_map([id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
