//! Server Lifecycle Manager
//!
//! Owns at most one network listener. Applying a configuration publishes it
//! to every reader first, then restarts the listener only if its identity
//! (hostname, port, transport, certificate paths) changed.
//!
//! ```text
//! STOPPED -> STARTING -> RUNNING -> STOPPING -> STOPPED
//!                \-> STOPPED (construction failed)
//! ```

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_server::{tls_rustls::RustlsConfig, Handle};
use pear_remote_shared_config::{ListenerConfig, TransportMode};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, ConfigHandle};
use crate::error::ListenerError;

use super::router::ListenerShutdown;

/// How long a stopping listener may drain open connections
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Extra time granted after the drain before the server task is aborted
const ABORT_GRACE: Duration = Duration::from_secs(1);

/// Builds the router served by a new listener
pub type RouterFactory = Arc<dyn Fn(ListenerShutdown) -> Router + Send + Sync>;

/// Listener state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerStatus {
    Stopped,
    Starting,
    Running,
    Stopping,
}

/// What `apply` did with the listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Nothing was running; a listener was started
    Started,
    /// The running listener was replaced
    Restarted,
    /// The running listener matches and was kept
    Unchanged,
}

struct RunningListener {
    config: ListenerConfig,
    local_addr: SocketAddr,
    generation: u64,
    handle: Handle,
    shutdown: CancellationToken,
    task: JoinHandle<std::io::Result<()>>,
}

/// Owns the network listener and rebuilds it on identity changes
pub struct ServerLifecycle {
    config: ConfigHandle,
    router: RouterFactory,
    /// Held across whole transitions so applies and stops never interleave
    running: Mutex<Option<RunningListener>>,
    status: watch::Sender<ListenerStatus>,
    generation: AtomicU64,
    drain_timeout: Duration,
}

impl ServerLifecycle {
    /// Create a stopped lifecycle manager
    pub fn new<F>(config: ConfigHandle, router: F) -> Self
    where
        F: Fn(ListenerShutdown) -> Router + Send + Sync + 'static,
    {
        let (status, _rx) = watch::channel(ListenerStatus::Stopped);
        Self {
            config,
            router: Arc::new(router),
            running: Mutex::new(None),
            status,
            generation: AtomicU64::new(0),
            drain_timeout: DRAIN_TIMEOUT,
        }
    }

    /// Override the drain timeout
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Publish a configuration and reconcile the listener with it
    ///
    /// A construction failure leaves no listener running and is returned,
    /// never panicked on.
    pub async fn apply(&self, config: Config) -> Result<ApplyOutcome, ListenerError> {
        let mut running = self.running.lock().await;

        let target = config.listener().clone();
        self.config.replace(config);

        if let Some(current) = running.as_ref() {
            if current.config == target && !current.task.is_finished() {
                tracing::debug!(listener = %target, "Listener configuration unchanged");
                return Ok(ApplyOutcome::Unchanged);
            }
        }

        let restarted = match running.take() {
            Some(current) => {
                tracing::info!(
                    from = %current.config,
                    to = %target,
                    "Listener configuration changed, restarting"
                );
                self.shutdown_listener(current).await;
                true
            }
            None => false,
        };

        match self.start_listener(target).await {
            Ok(listener) => {
                tracing::info!(
                    address = %listener.local_addr,
                    transport = %listener.config.transport,
                    generation = listener.generation,
                    "Listener running"
                );
                *running = Some(listener);
                self.status.send_replace(ListenerStatus::Running);
                Ok(if restarted {
                    ApplyOutcome::Restarted
                } else {
                    ApplyOutcome::Started
                })
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to start listener");
                self.status.send_replace(ListenerStatus::Stopped);
                Err(e)
            }
        }
    }

    /// Stop the running listener; a no-op when already stopped
    pub async fn stop(&self) {
        let mut running = self.running.lock().await;
        if let Some(current) = running.take() {
            self.shutdown_listener(current).await;
        }
    }

    /// Current state
    pub fn status(&self) -> ListenerStatus {
        *self.status.borrow()
    }

    /// Subscribe to state transitions
    pub fn subscribe_status(&self) -> watch::Receiver<ListenerStatus> {
        self.status.subscribe()
    }

    /// Address the running listener is bound to
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|l| l.local_addr)
    }

    /// Number of listeners started so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Shared configuration handle
    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }

    async fn start_listener(&self, config: ListenerConfig) -> Result<RunningListener, ListenerError> {
        self.status.send_replace(ListenerStatus::Starting);

        // Load TLS material before taking the port
        let tls = match &config.transport {
            TransportMode::Plain => None,
            TransportMode::Tls {
                cert_path,
                key_path,
            } => Some(
                RustlsConfig::from_pem_file(cert_path, key_path)
                    .await
                    .map_err(|source| ListenerError::Tls {
                        cert_path: cert_path.clone(),
                        key_path: key_path.clone(),
                        source,
                    })?,
            ),
        };

        let address = config.bind_address();
        let listener = std::net::TcpListener::bind(&address)
            .map_err(|source| ListenerError::Bind { address, source })?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let shutdown = CancellationToken::new();
        let app = (self.router)(ListenerShutdown::new(shutdown.clone()));
        let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
        let handle = Handle::new();

        let task = match tls {
            Some(tls) => tokio::spawn(
                axum_server::from_tcp_rustls(listener, tls)
                    .handle(handle.clone())
                    .serve(make_service),
            ),
            None => tokio::spawn(
                axum_server::from_tcp(listener)
                    .handle(handle.clone())
                    .serve(make_service),
            ),
        };

        Ok(RunningListener {
            config,
            local_addr,
            generation,
            handle,
            shutdown,
            task,
        })
    }

    /// Close real-time connections, drain, and release the port
    async fn shutdown_listener(&self, listener: RunningListener) {
        self.status.send_replace(ListenerStatus::Stopping);
        tracing::info!(
            address = %listener.local_addr,
            generation = listener.generation,
            "Stopping listener"
        );

        listener.shutdown.cancel();
        listener.handle.graceful_shutdown(Some(self.drain_timeout));

        let mut task = listener.task;
        match tokio::time::timeout(self.drain_timeout + ABORT_GRACE, &mut task).await {
            Ok(Ok(Ok(()))) => {
                tracing::debug!(generation = listener.generation, "Listener drained");
            }
            Ok(Ok(Err(e))) => {
                tracing::warn!(error = %e, "Listener exited with error");
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Listener task failed");
            }
            Err(_) => {
                tracing::warn!(
                    generation = listener.generation,
                    "Listener did not drain in time, aborting"
                );
                task.abort();
                let _ = task.await;
            }
        }

        self.status.send_replace(ListenerStatus::Stopped);
    }
}

impl std::fmt::Debug for ServerLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerLifecycle")
            .field("status", &self.status())
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}
