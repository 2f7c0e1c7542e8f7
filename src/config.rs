//! Store and server configuration
//!
//! The retention window and sweep interval are fixed for the lifetime of a
//! store; nothing accepts them per call.

use std::net::SocketAddr;
use std::time::Duration;

/// How often the background sweep looks for expired trash
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// How long a soft-deleted entity stays restorable, in hours
pub const RETENTION_HOURS: i64 = 24;

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, Copy)]
pub struct StoreConfig {
    /// Age at which a soft-deleted entity becomes eligible for removal
    pub retention: chrono::Duration,
    pub sweep_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            retention: chrono::Duration::hours(RETENTION_HOURS),
            sweep_interval: SWEEP_INTERVAL,
        }
    }
}

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub address: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: ([127, 0, 0, 1], DEFAULT_PORT).into(),
        }
    }
}

impl ServerConfig {
    pub fn with_port(port: u16) -> Self {
        Self {
            address: ([127, 0, 0, 1], port).into(),
        }
    }
}
