/// Database row types. These map directly to SQLite rows.
/// Distinct from parlor-types models: a row's value is whatever string was stored,
/// parsed or not.

pub struct KvRow {
    pub key: String,
    pub value: String,
    pub updated_at: String,
}
