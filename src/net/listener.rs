//! Listening socket with address/port reuse.
//!
//! # Responsibilities
//! - Set SO_REUSEADDR so a restart can rebind through TIME_WAIT
//! - Set SO_REUSEPORT where the platform has it (failure ignored)
//! - Report "address in use" separately from other bind failures

use std::net::SocketAddr;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;

use crate::error::BindError;

const LISTEN_BACKLOG: i32 = 128;

/// A bound, listening TCP socket configured for quick rebinding.
#[derive(Debug)]
pub struct ReusableListener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl ReusableListener {
    /// Bind and listen on `addr`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn bind(addr: SocketAddr) -> Result<Self, BindError> {
        let fail = |e| BindError::from_io(addr, e);

        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
            .map_err(fail)?;
        socket.set_reuse_address(true).map_err(fail)?;

        enable_reuse_port(&socket);

        socket.set_nonblocking(true).map_err(fail)?;
        socket.bind(&addr.into()).map_err(fail)?;
        socket.listen(LISTEN_BACKLOG).map_err(fail)?;

        let inner = TcpListener::from_std(socket.into()).map_err(fail)?;
        let local_addr = inner.local_addr().map_err(fail)?;

        tracing::info!(address = %local_addr, "Listener bound");

        Ok(Self { inner, local_addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn into_inner(self) -> TcpListener {
        self.inner
    }
}

#[cfg(all(unix, not(any(target_os = "solaris", target_os = "illumos"))))]
fn enable_reuse_port(socket: &Socket) {
    if let Err(e) = socket.set_reuse_port(true) {
        tracing::debug!(error = %e, "SO_REUSEPORT not supported, continuing without it");
    }
}

#[cfg(not(all(unix, not(any(target_os = "solaris", target_os = "illumos")))))]
fn enable_reuse_port(_socket: &Socket) {}
