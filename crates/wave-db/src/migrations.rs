use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id                    TEXT PRIMARY KEY,
            phone_number          TEXT NOT NULL UNIQUE,
            name                  TEXT NOT NULL,
            avatar                TEXT NOT NULL DEFAULT '',
            is_verified           INTEGER NOT NULL DEFAULT 0,
            verification_code     TEXT,
            verification_expires  TEXT,
            online                INTEGER NOT NULL DEFAULT 0,
            last_seen             TEXT NOT NULL DEFAULT (datetime('now')),
            created_at            TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at            TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_users_phone
            ON users(phone_number);

        CREATE INDEX IF NOT EXISTS idx_users_verified
            ON users(is_verified);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
