use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Array-valued fields (skills, relations, likes, comments, tags, applicants)
/// are JSON text columns so each row reads back as a whole document.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);",
    )?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                email       TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                avatar      TEXT NOT NULL,
                headline    TEXT NOT NULL DEFAULT '',
                bio         TEXT NOT NULL DEFAULT '',
                skills      TEXT NOT NULL DEFAULT '[]',
                college     TEXT NOT NULL DEFAULT '',
                location    TEXT NOT NULL DEFAULT '',
                connections TEXT NOT NULL DEFAULT '[]',
                followers   TEXT NOT NULL DEFAULT '[]',
                following   TEXT NOT NULL DEFAULT '[]',
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE TABLE connections (
                id          TEXT PRIMARY KEY,
                requester   TEXT NOT NULL,
                recipient   TEXT NOT NULL,
                status      TEXT NOT NULL DEFAULT 'pending',
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            -- At most one row per unordered pair
            CREATE UNIQUE INDEX idx_connections_pair
                ON connections(min(requester, recipient), max(requester, recipient));

            CREATE INDEX idx_connections_recipient
                ON connections(recipient, status);

            CREATE TABLE posts (
                id          TEXT PRIMARY KEY,
                author      TEXT NOT NULL,
                content     TEXT NOT NULL,
                image       TEXT NOT NULL DEFAULT '',
                hashtags    TEXT NOT NULL DEFAULT '[]',
                likes       TEXT NOT NULL DEFAULT '[]',
                comments    TEXT NOT NULL DEFAULT '[]',
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX idx_posts_created ON posts(created_at);

            CREATE TABLE messages (
                id          TEXT PRIMARY KEY,
                sender      TEXT NOT NULL,
                recipient   TEXT NOT NULL,
                content     TEXT NOT NULL,
                read        INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_messages_sender ON messages(sender, created_at);
            CREATE INDEX idx_messages_recipient ON messages(recipient, created_at);

            CREATE TABLE opportunities (
                id          TEXT PRIMARY KEY,
                title       TEXT NOT NULL,
                description TEXT NOT NULL,
                kind        TEXT NOT NULL,
                company     TEXT NOT NULL,
                location    TEXT NOT NULL DEFAULT 'Remote',
                tags        TEXT NOT NULL DEFAULT '[]',
                deadline    TEXT,
                applicants  TEXT NOT NULL DEFAULT '[]',
                created_by  TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (user graduation year)");
        conn.execute_batch(
            "
            ALTER TABLE users ADD COLUMN year TEXT NOT NULL DEFAULT '';
            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version, 2);
    }

    #[test]
    fn pair_index_rejects_reversed_duplicate() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();

        let insert = "INSERT INTO connections (id, requester, recipient, created_at, updated_at)
                      VALUES (?1, ?2, ?3, 'now', 'now')";
        conn.execute(insert, ("c1", "a", "b")).unwrap();
        assert!(conn.execute(insert, ("c2", "b", "a")).is_err());
    }
}
