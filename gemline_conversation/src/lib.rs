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

//! Assistant-mode exchanges backed by persisted conversation memory.
//!
//! The [`ConversationAssembler`] loads the caller's memory log, replays it
//! to the chat model together with a freshly stamped user turn, cleans the
//! reply, and appends the new user/assistant pair back to memory.

mod assembler;
mod assistant;
mod history;

pub use assembler::{
    AssemblerConfig, ConversationAssembler, MODEL_FALLBACK_REPLY, ReplySource, TurnResult,
};
pub use assistant::Assistant;
pub use history::{build_llm_messages, replay_turns};
