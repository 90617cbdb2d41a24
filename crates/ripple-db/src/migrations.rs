use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            firstname   TEXT NOT NULL,
            surname     TEXT NOT NULL,
            email       TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- One row per unordered friend pair; symmetry holds by construction.
        CREATE TABLE IF NOT EXISTS friendships (
            user_a      TEXT NOT NULL REFERENCES users(id),
            user_b      TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (user_a, user_b),
            CHECK (user_a < user_b)
        );

        CREATE INDEX IF NOT EXISTS idx_friendships_b
            ON friendships(user_b);

        -- One row per pending ordered request.
        CREATE TABLE IF NOT EXISTS friend_requests (
            sender      TEXT NOT NULL REFERENCES users(id),
            receiver    TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (sender, receiver),
            CHECK (sender <> receiver)
        );

        CREATE INDEX IF NOT EXISTS idx_requests_receiver
            ON friend_requests(receiver);

        -- Author/recipient names are snapshots taken at post time; posts
        -- deliberately carry no foreign key into users.
        CREATE TABLE IF NOT EXISTS posts (
            id              TEXT PRIMARY KEY,
            author_id       TEXT NOT NULL,
            author_name     TEXT NOT NULL,
            body            TEXT NOT NULL,
            recipient_id    TEXT,
            recipient_name  TEXT NOT NULL DEFAULT '',
            created_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS post_reads (
            post_id     TEXT NOT NULL REFERENCES posts(id),
            user_id     TEXT NOT NULL,
            PRIMARY KEY (post_id, user_id)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
