//! # Knowledge Store SQL
//!
//! SQL strings used by the SQLite knowledge store.

pub const CREATE_TRAINING_DATA_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS training_data (
        id TEXT PRIMARY KEY,
        kind TEXT NOT NULL,
        question TEXT,
        content TEXT NOT NULL,
        embedding BLOB
    );";

pub const CREATE_KIND_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_training_data_kind ON training_data (kind);";

pub const ALL_TABLE_CREATION_SQL: &[&str] = &[CREATE_TRAINING_DATA_TABLE, CREATE_KIND_INDEX];

/// Inserts an entry, replacing the content of an entry with the same id.
pub const UPSERT_ENTRY: &str = "
    INSERT INTO training_data (id, kind, question, content, embedding)
    VALUES (?, ?, ?, ?, ?)
    ON CONFLICT(id) DO UPDATE SET
        question = excluded.question,
        content = excluded.content,
        embedding = excluded.embedding;";

pub const LIST_ENTRIES: &str =
    "SELECT id, kind, question, content FROM training_data ORDER BY rowid;";

pub const DELETE_ENTRY: &str = "DELETE FROM training_data WHERE id = ?;";

pub const COUNT_ENTRY: &str = "SELECT COUNT(*) FROM training_data WHERE id = ?;";

/// Entries of one kind, most recent first. Expects the kind as `?1`.
pub fn recent_entries(limit: u32) -> String {
    format!(
        "SELECT question, content FROM training_data
         WHERE kind = ?1
         ORDER BY rowid DESC
         LIMIT {limit};"
    )
}

/// Keyword search over one kind. Expects the kind as `?1` and one `LIKE`
/// pattern per term starting at `?2`.
pub fn keyword_search(terms: usize, limit: u32) -> String {
    let conditions = (0..terms)
        .map(|i| {
            let n = i + 2;
            format!("LOWER(content) LIKE ?{n} OR LOWER(COALESCE(question, '')) LIKE ?{n}")
        })
        .collect::<Vec<_>>()
        .join(" OR ");
    format!(
        "SELECT question, content FROM training_data
         WHERE kind = ?1 AND ({conditions})
         ORDER BY rowid DESC
         LIMIT {limit};"
    )
}

/// Vector search over one kind. Turso's vector functions expect the query
/// vector as a literal; the kind is `?1`.
pub fn vector_search(query_vector: &[f32], limit: u32) -> String {
    let vector_str = format!(
        "vector32('[{}]')",
        query_vector
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    format!(
        "SELECT question, content, vector_distance_cos(embedding, {vector_str}) AS distance
         FROM training_data
         WHERE kind = ?1 AND embedding IS NOT NULL
         ORDER BY distance ASC
         LIMIT {limit};"
    )
}
