//! API module
//!
//! This module provides the HTTP surface of the store: the axum server and
//! the clients that talk to it (or to a [`Core`](crate::Core) directly).

pub mod client;
pub mod server;

// Re-export commonly used types
pub use client::{Client, ClientConfig, ClientError, CoreClient, HttpClient};
pub use server::{router, serve, ApiResponse};
