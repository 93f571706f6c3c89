//! Server lifecycle management.

use crate::log;
use anyhow::Result;
use crossbeam::channel::{Receiver, RecvTimeoutError, Sender};
use std::{
    net::SocketAddr,
    sync::{
        Arc, OnceLock,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};
use tiny_http::Server;

use super::snapshot::Snapshots;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Shutdown signal sender for the reload thread
static SHUTDOWN_TX: OnceLock<Sender<()>> = OnceLock::new();

/// Bind to the specified interface and port, with automatic port retry.
pub fn bind_with_retry(
    interface: std::net::IpAddr,
    base_port: u16,
) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }
    Err(anyhow::anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

/// Install the Ctrl+C handler and register the server it stops.
///
/// On Ctrl+C the server is unblocked, which ends the request loop, and the
/// reload thread is told to exit.
pub fn register_shutdown(server: Arc<Server>, shutdown_tx: Sender<()>) -> Result<()> {
    let _ = SERVER.set(server);
    let _ = SHUTDOWN_TX.set(shutdown_tx);

    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);
        log!("serve"; "shutting down...");

        if let Some(tx) = SHUTDOWN_TX.get() {
            let _ = tx.send(());
        }
        if let Some(server) = SERVER.get() {
            server.unblock();
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

/// Poll the build record every `interval` until shutdown.
pub fn spawn_reloader(
    snapshots: Arc<Snapshots>,
    interval: Duration,
    shutdown_rx: Receiver<()>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        loop {
            match shutdown_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {
                    snapshots.reload_if_changed();
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    })
}

/// Wait for the reload thread to exit (max 2 seconds).
pub fn wait_for_shutdown(handle: Option<JoinHandle<()>>) {
    let Some(handle) = handle else { return };

    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
}
