use crate::infrastructure::error::InfraError;
use rusqlite::Connection;
use std::fs;
use std::path::Path;

const KV_SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

/// Opens (creating if needed) the key-value database and applies the schema.
/// Safe to call on every start.
pub fn initialize_database(path: &Path) -> Result<(), InfraError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let connection = Connection::open(path)?;
    connection.execute_batch(KV_SCHEMA_SQL)?;
    Ok(())
}
