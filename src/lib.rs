//! promptshelf library crate
//!
//! An in-memory store of reusable prompts grouped into projects and tasks,
//! with a self-emptying trash, plus the HTTP API, client and CLI built on it.

pub mod api;
pub mod cli;
pub mod clock;
pub mod config;
pub mod handle;
pub mod models;
pub mod seed;
pub mod store;
pub mod sweeper;

pub use crate::handle::Core;
pub use crate::store::{StoreError, Workspace};
