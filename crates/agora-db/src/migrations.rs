use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// `author` and `post` columns hold JSON snapshots, not foreign keys.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (users, posts, comments)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                name    TEXT NOT NULL,
                about   TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE posts (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                data            TEXT NOT NULL,
                author          TEXT NOT NULL,
                is_commentable  INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE comments (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                post            TEXT NOT NULL,
                author          TEXT NOT NULL,
                initial_comment INTEGER NOT NULL DEFAULT -1,
                answer_to       INTEGER NOT NULL DEFAULT -1,
                data            TEXT NOT NULL,
                has_replies     INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX idx_comments_answer_to ON comments(answer_to);

            INSERT INTO schema_version (version) VALUES (1);
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

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }
}
