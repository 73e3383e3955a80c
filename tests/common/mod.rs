//! Common test utilities and helpers
#![allow(dead_code)]

use async_trait::async_trait;
use ssh_relay::error::{RelayError, Result};
use ssh_relay::forward::channel::TunnelChannel;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// Find an available TCP port for testing
pub fn find_available_port() -> u16 {
    let listener =
        std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind to random port");
    listener.local_addr().unwrap().port()
}

/// Connect to a local port, retrying briefly until the listener is up.
pub async fn connect_retry(port: u16) -> TcpStream {
    for _ in 0..100 {
        if let Ok(stream) = TcpStream::connect(("127.0.0.1", port)).await {
            return stream;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("no listener appeared on port {port}");
}

/// A connected local socket pair: the accepted (relay-side) stream and the
/// client-side stream.
pub async fn connected_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    let client = TcpStream::connect(addr).await.expect("connect failed");
    let (accepted, _) = listener.accept().await.expect("accept failed");
    (accepted, client)
}

/// Events injected into a [`FakeChannel`] from a test.
pub enum FakeEvent {
    /// Primary substream payload.
    Data(Vec<u8>),
    /// Auxiliary (stderr-like) substream payload.
    Aux(Vec<u8>),
    Eof,
    Close,
}

/// In-memory stand-in for an SSH forwarding channel.
///
/// Tests feed it [`FakeEvent`]s through the sender half and observe what the
/// pump wrote via `written`. Lifecycle calls (`send_eof`, `close`) are
/// recorded in order so cleanup ordering can be asserted.
pub struct FakeChannel {
    events: mpsc::UnboundedReceiver<FakeEvent>,
    pub written: Arc<Mutex<Vec<u8>>>,
    pub lifecycle: Arc<Mutex<Vec<&'static str>>>,
    data: VecDeque<Vec<u8>>,
    aux: VecDeque<Vec<u8>>,
    eof: bool,
    closed: bool,
    pub fail_writes: bool,
}

impl FakeChannel {
    pub fn new() -> (Self, mpsc::UnboundedSender<FakeEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let channel = Self {
            events: rx,
            written: Arc::new(Mutex::new(Vec::new())),
            lifecycle: Arc::new(Mutex::new(Vec::new())),
            data: VecDeque::new(),
            aux: VecDeque::new(),
            eof: false,
            closed: false,
            fail_writes: false,
        };
        (channel, tx)
    }
}

#[async_trait]
impl TunnelChannel for FakeChannel {
    async fn wait_activity(&mut self) {
        if self.closed {
            std::future::pending::<()>().await;
        }
        match self.events.recv().await {
            Some(FakeEvent::Data(d)) => self.data.push_back(d),
            Some(FakeEvent::Aux(d)) => self.aux.push_back(d),
            Some(FakeEvent::Eof) => self.eof = true,
            Some(FakeEvent::Close) | None => self.closed = true,
        }
    }

    async fn send_data(&mut self, buf: &[u8]) -> Result<()> {
        if self.fail_writes {
            return Err(RelayError::Channel(
                "simulated channel write failure".to_string(),
            ));
        }
        self.written.lock().unwrap().extend_from_slice(buf);
        Ok(())
    }

    async fn send_eof(&mut self) -> Result<()> {
        self.lifecycle.lock().unwrap().push("eof");
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.lifecycle.lock().unwrap().push("close");
        self.closed = true;
        Ok(())
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
