/// Database row types — these map directly to SQLite rows.
/// Distinct from tasklink-types API models to keep the DB layer independent.

pub struct TaskRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub filename: String,
    pub original_name: String,
    pub mimetype: String,
    pub uploaded_at: String,
}

/// Insert payload; `uploaded_at` is assigned by the store.
pub struct NewTask<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub filename: &'a str,
    pub original_name: &'a str,
    pub mimetype: &'a str,
}
