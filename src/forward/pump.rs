//! The bidirectional relay loop.

use crate::cancel::CancelFlag;
use crate::error::{RelayError, Result};
use crate::forward::channel::TunnelChannel;
use crate::forward::progress::Progress;
use crate::forward::socket;
use crate::forward::CloseReason;
use std::io::Write;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, trace};

/// Upper bound on one multiplexed wait. Bounds cancellation latency while
/// relaying.
pub const RELAY_TICK: Duration = Duration::from_millis(100);

/// Transfer chunk size. The relay holds no other buffering.
pub const CHUNK_SIZE: usize = 16 * 1024;

/// Pump bytes between the local connection and the forwarding channel until
/// the peer closes, the channel closes, or cancellation is observed.
///
/// Each iteration performs one bounded wait across both endpoints, then
/// fully drains local-to-channel, channel-primary-to-local, and
/// channel-auxiliary-to-diagnostics before waiting again. Peer EOF
/// terminates immediately: buffered channel data is not flushed first.
///
/// The caller owns cleanup; this function releases nothing.
pub async fn run<C, W>(
    local: &mut TcpStream,
    tunnel: &mut C,
    cancel: &CancelFlag,
    progress: &mut Progress,
    diagnostics: &mut W,
) -> Result<CloseReason>
where
    C: TunnelChannel,
    W: Write + Send,
{
    let mut buf = vec![0u8; CHUNK_SIZE];
    progress.reset();

    loop {
        if cancel.is_cancelled() {
            debug!("cancelled while relaying");
            return Ok(CloseReason::Cancelled);
        }
        if tunnel.is_closed() || tunnel.is_eof() {
            debug!("forwarding channel closed");
            return Ok(CloseReason::ChannelClosed);
        }

        // One bounded wait covering both endpoints, so data arriving on
        // either side is observed without starving the other.
        tokio::select! {
            _ = tokio::time::sleep(RELAY_TICK) => {}
            ready = local.readable() => {
                ready.map_err(|e| RelayError::system("poll local socket", e))?;
            }
            _ = tunnel.wait_activity() => {}
        }

        // Local peer -> channel. A zero-length read means the peer closed;
        // that wins immediately over anything still buffered on the channel.
        let peer_closed = loop {
            match local.try_read(&mut buf) {
                Ok(0) => break true,
                Ok(n) => {
                    tunnel.send_data(&buf[..n]).await?;
                    progress.add(n);
                }
                Err(ref e) if socket::is_would_block(e) => break false,
                Err(e) => return Err(RelayError::system("read from local peer", e)),
            }
        };
        if peer_closed {
            debug!("local peer closed the connection");
            return Ok(CloseReason::PeerClosed);
        }

        // Channel primary substream -> local peer.
        while let Some(data) = tunnel.take_data() {
            local
                .write_all(&data)
                .await
                .map_err(|e| RelayError::system("write to local peer", e))?;
            progress.add(data.len());
        }

        // Channel auxiliary substream -> diagnostics, never the tunnel payload.
        while let Some(data) = tunnel.take_aux_data() {
            trace!(len = data.len(), "auxiliary channel data");
            let _ = diagnostics.write_all(&data);
        }

        progress.tick();
    }
}
