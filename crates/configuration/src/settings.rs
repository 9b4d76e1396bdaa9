use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: Server,
    pub database: Database,
}

/// Contains parameters for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    /// The interface the server binds to (e.g., "0.0.0.0").
    pub host: IpAddr,
    /// The port the server listens on.
    pub port: u16,
}

impl Server {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Contains parameters for the database connection pool. The connection URL
/// itself comes from the `DATABASE_URL` environment variable, not the file.
#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    /// Upper bound on pooled connections.
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection before reporting a retryable
    /// timeout to the caller.
    pub acquire_timeout_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_settings_form_a_socket_addr() {
        let server = Server {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
        };
        assert_eq!(server.addr().to_string(), "127.0.0.1:3000");
    }
}
