//! Database entities for mode and memory records.

pub mod memory_logs;
pub mod users;
