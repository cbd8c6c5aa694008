#![warn(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Mode and conversation-memory persistence.
//!
//! [`MemoryManager`] keeps both records in a sea-orm database;
//! [`InMemoryStore`] keeps them in process for local runs and tests.

mod convert;
mod in_memory;
mod log;
mod manager;
mod mode;

pub use gemline_core::{MemoryStore, ModeStore};
pub use in_memory::InMemoryStore;
pub use manager::MemoryManager;
