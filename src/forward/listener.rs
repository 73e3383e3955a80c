//! Local listener: bind, poll for one connection, accept.

use crate::cancel::CancelFlag;
use crate::error::{RelayError, Result};
use crate::forward::progress::Progress;
use crate::forward::socket;
use std::io;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tracing::debug;

/// How long each wait-for-connection iteration may block. Cancellation is
/// re-checked between iterations, so this bounds cancellation latency while
/// waiting.
pub const ACCEPT_POLL: Duration = Duration::from_millis(200);

/// Bind a listening socket on all interfaces.
pub async fn open_listener(port: u16) -> Result<TcpListener> {
    TcpListener::bind(("0.0.0.0", port)).await.map_err(|e| {
        if e.kind() == io::ErrorKind::AddrInUse {
            RelayError::PortInUse(port)
        } else {
            RelayError::system("bind local listener", e)
        }
    })
}

/// Poll for a single inbound connection.
///
/// Each iteration checks the cancellation flag, renders the waiting line and
/// blocks for at most [`ACCEPT_POLL`]. Returns `None` when cancelled before
/// anyone connected; transient accept failures are retried.
pub async fn wait_for_connection(
    listener: &TcpListener,
    port: u16,
    cancel: &CancelFlag,
    progress: &mut Progress,
) -> Result<Option<TcpStream>> {
    loop {
        if cancel.is_cancelled() {
            debug!(port, "cancelled while waiting for a connection");
            return Ok(None);
        }

        progress.waiting(port);

        match tokio::time::timeout(ACCEPT_POLL, listener.accept()).await {
            Ok(Ok((stream, addr))) => {
                debug!(%addr, port, "accepted local connection");
                // Accepted sockets are already non-blocking under tokio.
                // NODELAY keeps small interactive writes moving.
                let _ = stream.set_nodelay(true);
                return Ok(Some(stream));
            }
            Ok(Err(ref e)) if socket::is_would_block(e) => continue,
            Ok(Err(e)) => return Err(RelayError::system("accept connection", e)),
            // Poll timeout elapsed with no client; loop to re-check cancellation.
            Err(_) => continue,
        }
    }
}
