//! The single-connection forwarding relay.
//!
//! Control flow: bind the local listener, poll for one inbound connection
//! with cooperative cancellation, open a direct-tcpip channel on the SSH
//! session, then pump bytes both ways until the peer closes, the channel
//! closes or the user interrupts. Every opened endpoint is released on every
//! exit path before any error is surfaced.

pub mod channel;
pub mod listener;
pub mod progress;
pub mod pump;
pub mod socket;

use crate::cancel::CancelFlag;
use crate::error::Result;
use crate::ssh::handler::ClientHandler;
use channel::{SshTunnelChannel, TunnelChannel};
use progress::Progress;
use russh::client::Handle;
use std::future::Future;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// What to forward. Immutable once the relay starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardSpec {
    /// Local TCP port to listen on.
    pub local_port: u16,
    /// Destination host, resolved from the remote side of the session.
    pub remote_host: String,
    /// Destination port.
    pub remote_port: u16,
}

/// Why the relay stopped. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The local peer closed its side of the connection.
    PeerClosed,
    /// The forwarding channel reported EOF or closed.
    ChannelClosed,
    /// Cancellation was observed at a checkpoint.
    Cancelled,
}

#[derive(Debug, Clone, Copy)]
pub struct TunnelOutcome {
    pub bytes_tunneled: u64,
    pub reason: CloseReason,
}

/// Run one relay invocation: accept a single connection on
/// `spec.local_port` and forward it to `spec.remote_host:spec.remote_port`
/// over the session.
///
/// Returns normally when the peer or the channel closes, or when cancelled
/// (including while still waiting for a connection). Fatal I/O failures
/// surface as errors, but only after both endpoints have been released.
pub async fn run_tunnel(
    handle: Arc<Handle<ClientHandler>>,
    spec: &ForwardSpec,
    cancel: CancelFlag,
) -> Result<TunnelOutcome> {
    let mut progress = Progress::new();
    run_tunnel_with(spec, cancel, &mut progress, move || async move {
        let raw = channel::open_forward_channel(&handle, spec).await?;
        Ok(SshTunnelChannel::new(raw))
    })
    .await
}

/// Run one relay invocation with a caller-supplied channel opener.
///
/// The opener is invoked once, after a connection has been accepted. If it
/// fails, the accepted connection is shut down before the error propagates;
/// once it succeeds, the channel is released (EOF, then close) on every exit
/// path, before any pump error is surfaced.
pub async fn run_tunnel_with<C, F, Fut>(
    spec: &ForwardSpec,
    cancel: CancelFlag,
    progress: &mut Progress,
    open_channel: F,
) -> Result<TunnelOutcome>
where
    C: TunnelChannel,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<C>>,
{
    let listener = listener::open_listener(spec.local_port).await?;

    let Some(mut local) =
        listener::wait_for_connection(&listener, spec.local_port, &cancel, progress).await?
    else {
        debug!("cancelled before a client connected");
        return Ok(TunnelOutcome {
            bytes_tunneled: 0,
            reason: CloseReason::Cancelled,
        });
    };
    println!("\rclient connected!                         ");

    // Exactly one connection per invocation.
    drop(listener);

    let mut tunnel = match open_channel().await {
        Ok(c) => c,
        Err(e) => {
            let _ = local.shutdown().await;
            return Err(e);
        }
    };
    info!(
        local_port = spec.local_port,
        remote = %format!("{}:{}", spec.remote_host, spec.remote_port),
        "forwarding channel open"
    );

    let mut diagnostics = std::io::stderr();
    let result = pump::run(&mut local, &mut tunnel, &cancel, progress, &mut diagnostics).await;

    // Cleanup runs on every exit path, before any error is surfaced.
    let _ = local.shutdown().await;
    release_channel(&mut tunnel).await;

    let reason = result?;
    println!("\ntunnel closed!");
    Ok(TunnelOutcome {
        bytes_tunneled: progress.total(),
        reason,
    })
}

/// Send EOF on the channel, then close it. Best effort on both: the channel
/// may already be gone, and cleanup must not mask the error that got us here.
pub async fn release_channel<C: TunnelChannel>(tunnel: &mut C) {
    let _ = tunnel.send_eof().await;
    let _ = tunnel.close().await;
}
