/// Database row types — these map directly to SQLite rows.
/// Distinct from wave-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub phone_number: String,
    pub name: String,
    pub avatar: String,
    pub is_verified: bool,
    pub verification_code: Option<String>,
    pub verification_expires: Option<String>,
    pub online: bool,
    pub last_seen: String,
    pub created_at: String,
}
