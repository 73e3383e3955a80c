//! The forwarding channel abstraction and its russh implementation.
//!
//! A forwarding channel has two independent readable substreams (the primary
//! payload stream and an auxiliary stderr-like stream) and one writable
//! stream, plus EOF/closed queries. The pump works against the trait so it
//! can be exercised without a live SSH session.

use crate::error::{RelayError, Result};
use crate::forward::ForwardSpec;
use crate::ssh::handler::ClientHandler;
use async_trait::async_trait;
use russh::client::{Handle, Msg};
use russh::{Channel, ChannelMsg};
use std::collections::VecDeque;

/// SSH extended-data type code for the stderr-like substream.
const AUX_STREAM: u32 = 1;

/// One proxied connection carried inside the SSH session.
///
/// Once closed, a channel must not be read or written again; the pump checks
/// `is_closed`/`is_eof` before every wait.
#[async_trait]
pub trait TunnelChannel: Send {
    /// Wait until the channel has activity, buffering whatever arrives.
    /// Intended to be raced against socket readability with a bounded
    /// timeout; must not be called once `is_closed` returns true.
    async fn wait_activity(&mut self);

    /// Write payload bytes to the channel. The write is complete when this
    /// returns; partial delivery is not possible.
    async fn send_data(&mut self, buf: &[u8]) -> Result<()>;

    /// Signal end-of-stream to the remote side.
    async fn send_eof(&mut self) -> Result<()>;

    /// Close the channel.
    async fn close(&mut self) -> Result<()>;

    /// Take the next buffered chunk of the primary substream, if any.
    fn take_data(&mut self) -> Option<Vec<u8>>;

    /// Take the next buffered chunk of the auxiliary substream, if any.
    fn take_aux_data(&mut self) -> Option<Vec<u8>>;

    fn is_closed(&self) -> bool;

    fn is_eof(&self) -> bool;
}

/// Open a direct-tcpip channel for `spec` on an authenticated session.
///
/// The originator is reported as `localhost:local_port`, matching the local
/// listener. Not retried: a refusal aborts the whole invocation.
pub async fn open_forward_channel(
    handle: &Handle<ClientHandler>,
    spec: &ForwardSpec,
) -> Result<Channel<Msg>> {
    handle
        .channel_open_direct_tcpip(
            spec.remote_host.as_str(),
            spec.remote_port as u32,
            "localhost",
            spec.local_port as u32,
        )
        .await
        .map_err(|e| RelayError::ChannelOpen {
            host: spec.remote_host.clone(),
            port: spec.remote_port,
            message: e.to_string(),
        })
}

/// [`TunnelChannel`] over a russh channel.
///
/// russh delivers channel traffic as messages, so `wait_activity` receives
/// one message and sorts it into the per-substream buffers that `take_data`
/// and `take_aux_data` drain.
pub struct SshTunnelChannel {
    inner: Channel<Msg>,
    data: VecDeque<Vec<u8>>,
    aux: VecDeque<Vec<u8>>,
    eof: bool,
    closed: bool,
}

impl SshTunnelChannel {
    pub fn new(inner: Channel<Msg>) -> Self {
        Self {
            inner,
            data: VecDeque::new(),
            aux: VecDeque::new(),
            eof: false,
            closed: false,
        }
    }
}

#[async_trait]
impl TunnelChannel for SshTunnelChannel {
    async fn wait_activity(&mut self) {
        if self.closed {
            // The pump breaks on is_closed before waiting; if raced inside a
            // select, never resolve rather than spin.
            std::future::pending::<()>().await;
        }
        match self.inner.wait().await {
            Some(ChannelMsg::Data { data }) => self.data.push_back(data.to_vec()),
            Some(ChannelMsg::ExtendedData { data, ext }) if ext == AUX_STREAM => {
                self.aux.push_back(data.to_vec())
            }
            Some(ChannelMsg::Eof) => self.eof = true,
            Some(ChannelMsg::Close) | None => self.closed = true,
            Some(_) => {}
        }
    }

    async fn send_data(&mut self, buf: &[u8]) -> Result<()> {
        self.inner
            .data(buf)
            .await
            .map_err(|e| RelayError::Channel(format!("channel write failed: {}", e)))
    }

    async fn send_eof(&mut self) -> Result<()> {
        self.inner
            .eof()
            .await
            .map_err(|e| RelayError::Channel(format!("channel EOF failed: {}", e)))
    }

    async fn close(&mut self) -> Result<()> {
        let result = self
            .inner
            .close()
            .await
            .map_err(|e| RelayError::Channel(format!("channel close failed: {}", e)));
        self.closed = true;
        result
    }

    fn take_data(&mut self) -> Option<Vec<u8>> {
        self.data.pop_front()
    }

    fn take_aux_data(&mut self) -> Option<Vec<u8>> {
        self.aux.pop_front()
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn is_eof(&self) -> bool {
        self.eof
    }
}
