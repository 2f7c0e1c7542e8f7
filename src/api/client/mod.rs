//! Client module
//!
//! This module provides client functionality to interact with the promptshelf store,
//! either through the HTTP API or in-process.

mod core;
mod http;
mod trait_def;

// Re-export the trait and types
pub use self::core::CoreClient;
pub use self::http::{ClientConfig, ClientError, HttpClient};
pub use trait_def::Client;
