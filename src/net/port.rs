//! Free-port discovery.

use std::net::{IpAddr, SocketAddr, TcpListener};

/// Ports `start, start + 1, ..` up to `max_attempts` of them, stopping at 65535.
pub fn candidate_ports(start: u16, max_attempts: u16) -> impl Iterator<Item = u16> {
    let end = (u32::from(start) + u32::from(max_attempts)).min(u32::from(u16::MAX) + 1);
    (u32::from(start)..end).map(|port| port as u16)
}

/// Find the first port in the candidate range that can currently be bound on `host`.
///
/// Each probe binds and immediately releases a socket. The answer can be stale
/// by the time the caller binds for real.
pub fn find_free_port(host: IpAddr, start: u16, max_attempts: u16) -> Option<u16> {
    let port = candidate_ports(start, max_attempts).find(|&port| port_is_free(host, port));
    if port.is_none() {
        tracing::debug!(start, max_attempts, "No free port in range");
    }
    port
}

/// Transient bind-and-release probe.
pub fn port_is_free(host: IpAddr, port: u16) -> bool {
    match TcpListener::bind(SocketAddr::new(host, port)) {
        Ok(_probe) => {
            tracing::debug!(port, "Port is free");
            true
        }
        Err(e) => {
            tracing::debug!(port, error = %e, "Port unavailable");
            false
        }
    }
}
