/// Database row types — these map directly to SQLite rows.
/// Distinct from ripple-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub firstname: String,
    pub surname: String,
    pub email: String,
    pub created_at: String,
}

/// A user row together with its friend-graph view, reconstructed from the
/// relation tables.
pub struct UserProfile {
    pub user: UserRow,
    pub friends: Vec<String>,
    pub sent: Vec<String>,
    pub received: Vec<String>,
}

pub struct UserHit {
    pub id: String,
    pub username: String,
}

pub struct PostRow {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub body: String,
    pub recipient_id: Option<String>,
    pub recipient_name: String,
    pub created_at: String,
}

pub struct PostReadRow {
    pub post_id: String,
    pub user_id: String,
}
