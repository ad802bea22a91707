//! Server lifecycle: bind, accept loop, and idempotent shutdown.
//!
//! # Responsibilities
//! - Own the one listening socket
//! - Run the accept loop in the background or on the caller's task
//! - Dispatch each connection to the configured handler
//! - Tear down exactly once, whoever asks first

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::Router;
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::server::graceful::GracefulShutdown;
use hyper_util::service::TowerToHyperService;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::LifecycleError;
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::net::connection::ConnectionTracker;
use crate::net::ReusableListener;

/// Pause after a non-transient accept error (e.g. out of file descriptors).
const ACCEPT_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Bound,
    Serving,
    ShuttingDown,
    Closed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Created => "created",
            LifecycleState::Bound => "bound",
            LifecycleState::Serving => "serving",
            LifecycleState::ShuttingDown => "shutting down",
            LifecycleState::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[derive(Default)]
struct Slots {
    listener: Option<Arc<TcpListener>>,
    local_addr: Option<SocketAddr>,
    serve_task: Option<JoinHandle<()>>,
    in_flight: Option<GracefulShutdown>,
}

/// The live serving resource.
///
/// Share it as `Arc<ServerLifecycle>` between the main flow and the
/// [`SignalCoordinator`](crate::lifecycle::SignalCoordinator). Every path
/// that wants the server gone goes through [`shutdown`](Self::shutdown).
pub struct ServerLifecycle {
    handler: Router,
    drain_timeout: Duration,
    state: watch::Sender<LifecycleState>,
    /// Lock order: `slots` first, then `state`. Never held across an await.
    slots: Mutex<Slots>,
    stop: ShutdownSignal,
    loop_exited: ShutdownSignal,
    connections: ConnectionTracker,
    releases: AtomicUsize,
}

impl ServerLifecycle {
    /// Create an unbound server that dispatches every request to `handler`.
    pub fn new(handler: Router, drain_timeout: Duration) -> Self {
        let (state, _) = watch::channel(LifecycleState::Created);
        Self {
            handler,
            drain_timeout,
            state,
            slots: Mutex::new(Slots::default()),
            stop: ShutdownSignal::new(),
            loop_exited: ShutdownSignal::new(),
            connections: ConnectionTracker::new(),
            releases: AtomicUsize::new(0),
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Address of the listening socket, once bound. Kept after close for reporting.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.slots().local_addr
    }

    /// How many times the listening socket has been released (0 or 1).
    pub fn socket_releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Bind the listening socket. `Created -> Bound`.
    pub fn bind(&self, addr: SocketAddr) -> Result<SocketAddr, LifecycleError> {
        let current = self.state();
        if current != LifecycleState::Created {
            return Err(LifecycleError::InvalidState {
                operation: "bind",
                state: current,
            });
        }

        let listener = ReusableListener::bind(addr)?;
        let local_addr = listener.local_addr();

        let mut slots = self.slots();
        self.transition(&[LifecycleState::Created], LifecycleState::Bound)
            .map_err(|state| LifecycleError::InvalidState {
                operation: "bind",
                state,
            })?;
        slots.listener = Some(Arc::new(listener.into_inner()));
        slots.local_addr = Some(local_addr);

        Ok(local_addr)
    }

    /// Launch the accept loop on a background task. `Bound -> Serving`.
    ///
    /// Returns as soon as the loop is spawned. If a shutdown already got in
    /// first there is nothing to launch and this returns `Ok`.
    pub fn start(self: &Arc<Self>) -> Result<(), LifecycleError> {
        let Some(listener) = self.begin_serving("start")? else {
            return Ok(());
        };
        let lifecycle = Arc::clone(self);
        let task = tokio::spawn(async move { lifecycle.accept_loop(listener).await });
        self.slots().serve_task = Some(task);
        Ok(())
    }

    /// Run the accept loop on the calling task until the server is closed.
    pub async fn serve_blocking(&self) -> Result<(), LifecycleError> {
        if let Some(listener) = self.begin_serving("serve")? {
            self.accept_loop(listener).await;
        }
        // Whoever requested the stop finishes the teardown.
        self.wait_closed().await;
        Ok(())
    }

    /// Resolves once the state reaches `Closed`.
    pub async fn wait_closed(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|state| *state == LifecycleState::Closed).await;
    }

    /// Stop serving and release the socket.
    ///
    /// Idempotent. Only the first caller on a bound or serving server does
    /// the teardown. Every other call returns immediately, and so does a
    /// call on a server that was never bound.
    pub async fn shutdown(&self) {
        let (previous, serve_task) = {
            let mut slots = self.slots();
            match self.transition(
                &[LifecycleState::Bound, LifecycleState::Serving],
                LifecycleState::ShuttingDown,
            ) {
                Ok(previous) => (previous, slots.serve_task.take()),
                Err(state) => {
                    tracing::debug!(state = %state, "Shutdown requested, nothing to do");
                    return;
                }
            }
        };

        tracing::info!("Stop requested");
        self.stop.trigger();

        if previous == LifecycleState::Serving {
            self.loop_exited.triggered().await;
            if let Some(task) = serve_task {
                if let Err(e) = task.await {
                    tracing::warn!(error = %e, "Accept loop task ended abnormally");
                }
            }
        }

        if let Err(e) = self.release_listener() {
            tracing::warn!(error = %e, "Listening socket was not released cleanly");
        }

        self.drain().await;

        self.state.send_replace(LifecycleState::Closed);
        tracing::info!("Server closed");
    }

    fn slots(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move to `next` if the current state is one of `from`.
    ///
    /// Returns the previous state, or the current state on refusal.
    fn transition(
        &self,
        from: &[LifecycleState],
        next: LifecycleState,
    ) -> Result<LifecycleState, LifecycleState> {
        let mut outcome = Err(LifecycleState::Created);
        self.state.send_if_modified(|current| {
            if from.contains(current) {
                outcome = Ok(*current);
                *current = next;
                true
            } else {
                outcome = Err(*current);
                false
            }
        });
        outcome
    }

    /// `None` when a shutdown was requested before serving began.
    fn begin_serving(
        &self,
        operation: &'static str,
    ) -> Result<Option<Arc<TcpListener>>, LifecycleError> {
        let slots = self.slots();
        if matches!(
            self.state(),
            LifecycleState::ShuttingDown | LifecycleState::Closed
        ) {
            tracing::debug!(operation, "Shutdown already requested, not serving");
            return Ok(None);
        }
        let Some(listener) = slots.listener.clone() else {
            return Err(LifecycleError::InvalidState {
                operation,
                state: self.state(),
            });
        };
        self.transition(&[LifecycleState::Bound], LifecycleState::Serving)
            .map_err(|state| LifecycleError::InvalidState { operation, state })?;
        Ok(Some(listener))
    }

    async fn accept_loop(&self, listener: Arc<TcpListener>) {
        let _exited = TriggerOnDrop(&self.loop_exited);
        let in_flight = GracefulShutdown::new();
        let mut builder = http1::Builder::new();
        builder.timer(TokioTimer::new());

        tracing::debug!("Accept loop running");

        loop {
            let accepted = tokio::select! {
                biased;
                _ = self.stop.triggered() => break,
                accepted = listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer)) => self.dispatch(&builder, &in_flight, stream, peer),
                Err(e) if is_connection_error(&e) => {
                    tracing::trace!(error = %e, "Transient accept error");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Accept failed, backing off");
                    tokio::select! {
                        biased;
                        _ = self.stop.triggered() => break,
                        _ = tokio::time::sleep(ACCEPT_BACKOFF) => {}
                    }
                }
            }
        }

        // Our handle must be gone before shutdown tries to release the socket.
        drop(listener);
        self.slots().in_flight = Some(in_flight);
        tracing::debug!("Accept loop exited");
    }

    fn dispatch(
        &self,
        builder: &http1::Builder,
        in_flight: &GracefulShutdown,
        stream: TcpStream,
        peer: SocketAddr,
    ) {
        let guard = self.connections.track();
        tracing::debug!(connection_id = %guard.id(), peer = %peer, "Connection accepted");

        let service = TowerToHyperService::new(self.handler.clone());
        let connection = in_flight.watch(builder.serve_connection(TokioIo::new(stream), service));

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::debug!(connection_id = %guard.id(), error = %e, "Connection ended with error");
            }
            drop(guard);
        });
    }

    fn release_listener(&self) -> Result<(), LifecycleError> {
        let Some(listener) = self.slots().listener.take() else {
            return Ok(());
        };
        self.releases.fetch_add(1, Ordering::SeqCst);

        let result = match Arc::try_unwrap(listener) {
            Ok(listener) => listener
                .into_std()
                .map(drop)
                .map_err(LifecycleError::Teardown),
            Err(shared) => {
                drop(shared);
                Err(LifecycleError::Teardown(io::Error::other(
                    "listening socket still referenced elsewhere",
                )))
            }
        };

        tracing::info!(address = ?self.local_addr(), "Listening socket released");
        result
    }

    async fn drain(&self) {
        let Some(in_flight) = self.slots().in_flight.take() else {
            return;
        };

        let active = self.connections.active_count();
        if active > 0 {
            tracing::info!(
                connections = active,
                timeout_secs = self.drain_timeout.as_secs(),
                "Draining in-flight connections"
            );
        }

        match tokio::time::timeout(self.drain_timeout, in_flight.shutdown()).await {
            Ok(()) => tracing::debug!("In-flight connections drained"),
            Err(_) => tracing::warn!(
                remaining = self.connections.active_count(),
                "Drain timeout elapsed, abandoning open connections"
            ),
        }
    }
}

/// Sets the event when dropped, so shutdown never waits on a loop that panicked.
struct TriggerOnDrop<'a>(&'a ShutdownSignal);

impl Drop for TriggerOnDrop<'_> {
    fn drop(&mut self) {
        self.0.trigger();
    }
}

fn is_connection_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}
