//! Network reachability probes.

use std::net::{TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

/// Trait for checking and restoring network connectivity.
pub trait Connectivity: Send + Sync {
    /// Whether the network currently looks reachable.
    fn is_connected(&self) -> bool;

    /// Attempt to restore connectivity once. Returns the post-attempt state.
    fn reconnect(&self) -> bool;
}

/// Probe that assumes the network is up and lets request-level transport
/// errors surface instead. Suitable where the OS manages the link.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeOnline;

impl Connectivity for AssumeOnline {
    fn is_connected(&self) -> bool {
        true
    }

    fn reconnect(&self) -> bool {
        true
    }
}

/// Probe that opens a short-lived TCP connection to a well-known host.
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    /// Creates a probe against `host:port`.
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            timeout: Duration::from_secs(3),
        }
    }

    /// Override the per-probe connect timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Connectivity for TcpProbe {
    fn is_connected(&self) -> bool {
        let Ok(addrs) = (self.host.as_str(), self.port).to_socket_addrs() else {
            return false;
        };
        for addr in addrs {
            if TcpStream::connect_timeout(&addr, self.timeout).is_ok() {
                return true;
            }
        }
        false
    }

    fn reconnect(&self) -> bool {
        // No link management of our own; re-probing is the only lever.
        self.is_connected()
    }
}

/// Mock connectivity for testing.
pub struct MockConnectivity {
    online: AtomicBool,
    reconnect_restores: bool,
    reconnect_calls: AtomicU32,
}

impl MockConnectivity {
    /// Create a mock that reports online.
    pub fn online() -> Self {
        Self {
            online: AtomicBool::new(true),
            reconnect_restores: true,
            reconnect_calls: AtomicU32::new(0),
        }
    }

    /// Create a mock that reports offline.
    pub fn offline() -> Self {
        Self {
            online: AtomicBool::new(false),
            reconnect_restores: false,
            reconnect_calls: AtomicU32::new(0),
        }
    }

    /// Make `reconnect` bring the mock back online.
    pub fn with_reconnect_success(mut self) -> Self {
        self.reconnect_restores = true;
        self
    }

    /// Number of reconnect attempts observed.
    pub fn reconnect_calls(&self) -> u32 {
        self.reconnect_calls.load(Ordering::SeqCst)
    }
}

impl Connectivity for MockConnectivity {
    fn is_connected(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn reconnect(&self) -> bool {
        self.reconnect_calls.fetch_add(1, Ordering::SeqCst);
        if self.reconnect_restores {
            self.online.store(true, Ordering::SeqCst);
        }
        self.online.load(Ordering::SeqCst)
    }
}
