mod repository;
mod types;

pub use repository::{MemoryStore, ModeStore, StoreError, StoreResult};
pub use types::{MemoryEntry, MemoryLog, MemoryScope, SHARED_SCOPE_KEY, Speaker};
