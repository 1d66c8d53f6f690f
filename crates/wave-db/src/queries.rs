use crate::Database;
use crate::models::UserRow;
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        phone_number: &str,
        name: &str,
        code: &str,
        expires: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, phone_number, name, verification_code, verification_expires)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, phone_number, name, code, expires],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_phone(&self, phone_number: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "phone_number", phone_number))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    // -- Verification --

    /// Overwrite the stored code/expiry pair. Used for both login resends and
    /// re-registration of an unverified number; the previous code becomes
    /// invalid the moment this commits, not when it would have expired.
    pub fn issue_code(&self, id: &str, code: &str, expires: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users
                 SET verification_code = ?2, verification_expires = ?3, updated_at = datetime('now')
                 WHERE id = ?1",
                rusqlite::params![id, code, expires],
            )?;
            Ok(())
        })
    }

    /// Re-registration of an existing unverified number also refreshes the name.
    pub fn update_registration(&self, id: &str, name: &str, code: &str, expires: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users
                 SET name = ?2, verification_code = ?3, verification_expires = ?4, updated_at = datetime('now')
                 WHERE id = ?1",
                rusqlite::params![id, name, code, expires],
            )?;
            Ok(())
        })
    }

    /// Consume the code: mark verified, bring the user online, null the
    /// code/expiry pair.
    pub fn mark_verified(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users
                 SET is_verified = 1, online = 1,
                     verification_code = NULL, verification_expires = NULL,
                     updated_at = datetime('now')
                 WHERE id = ?1",
                [id],
            )?;
            Ok(())
        })
    }

    // -- Profile --

    pub fn update_profile(&self, id: &str, name: Option<&str>, avatar: Option<&str>) -> Result<()> {
        self.with_conn(|conn| {
            if let Some(name) = name {
                conn.execute("UPDATE users SET name = ?2 WHERE id = ?1", rusqlite::params![id, name])?;
            }
            if let Some(avatar) = avatar {
                conn.execute("UPDATE users SET avatar = ?2 WHERE id = ?1", rusqlite::params![id, avatar])?;
            }
            conn.execute(
                "UPDATE users SET last_seen = datetime('now'), updated_at = datetime('now') WHERE id = ?1",
                [id],
            )?;
            Ok(())
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // column is one of two compile-time literals, never user input
    let sql = format!(
        "SELECT id, phone_number, name, avatar, is_verified,
                verification_code, verification_expires, online, last_seen, created_at
         FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                phone_number: row.get(1)?,
                name: row.get(2)?,
                avatar: row.get(3)?,
                is_verified: row.get(4)?,
                verification_code: row.get(5)?,
                verification_expires: row.get(6)?,
                online: row.get(7)?,
                last_seen: row.get(8)?,
                created_at: row.get(9)?,
            })
        })
        .optional()?;

    Ok(row)
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
