#![deny(
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

//! LINE Messaging API channel.
//!
//! Webhook deliveries are verified, decoded, and handed to the
//! [`Dispatcher`], which keeps each user in echo or assistant mode and
//! answers through a [`Messenger`].

mod bot;
mod client;
mod command;
mod console;
mod dispatcher;
mod error;
pub mod signature;
pub mod webhook;

pub use bot::{AppState, SIGNATURE_HEADER, router, serve};
pub use client::{LineClient, Messenger, Profile};
pub use command::Command;
pub use console::ConsoleMessenger;
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::{Error, Result};
