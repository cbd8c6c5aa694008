use gemline_core::{MemoryEntry, MemoryLog, StoreError};
use gemline_entities::memory_logs;

pub fn encode_entries(entries: &[MemoryEntry]) -> Result<String, StoreError> {
    serde_json::to_string(entries).map_err(|e| StoreError::Write(e.into()))
}

pub fn memory_log_from_model(m: memory_logs::Model) -> Result<MemoryLog, StoreError> {
    let entries: Vec<MemoryEntry> = serde_json::from_str(&m.entries)
        .map_err(|e| StoreError::Corrupt(format!("memory log {}: {e}", m.scope)))?;
    Ok(MemoryLog::new(entries, m.revision))
}
