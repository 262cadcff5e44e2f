//! WebSocket transport session
//!
//! Manages one persistent duplex connection to the transcription service:
//! binary PCM frames out, JSON transcript messages in.
//!
//! # Lifecycle
//!
//! `Disconnected -> Connecting -> Connected -> Disconnected`, one way. A
//! dropped connection requires a fresh session; nothing here retries, and
//! frames offered while not `Connected` are dropped rather than queued
//! (at-most-once, no buffering).

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::{
    connect_async_with_config, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};

use super::protocol::{parse_message, TranscriptMessage};
use super::scheduler::FrameSink;
use crate::pcm::PcmFrame;

/// Timeout for the initial WebSocket handshake.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Capacity of the inbound message channel.
const INBOUND_CHANNEL_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Connectivity {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
}

impl Connectivity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Connectivity::Disconnected => "disconnected",
            Connectivity::Connecting => "connecting",
            Connectivity::Connected => "connected",
        }
    }
}

/// Lock-free connectivity state shared between the control side and the
/// receiver task.
#[derive(Debug)]
pub struct ConnectivityCell(AtomicU8);

impl ConnectivityCell {
    fn new(state: Connectivity) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub fn get(&self) -> Connectivity {
        match self.0.load(Ordering::SeqCst) {
            1 => Connectivity::Connecting,
            2 => Connectivity::Connected,
            _ => Connectivity::Disconnected,
        }
    }

    fn set(&self, state: Connectivity) {
        self.0.store(state as u8, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
pub enum TransportError {
    ConnectFailed(String),
    Closed(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::ConnectFailed(e) => {
                write!(f, "Failed to connect to transcription service: {}", e)
            }
            TransportError::Closed(e) => write!(f, "Transcription socket closed: {}", e),
        }
    }
}

impl std::error::Error for TransportError {}

/// Handle to one active connection.
///
/// Owns the write half; inbound messages are parsed by a background task
/// and surfaced through an mpsc channel that the session's pump takes over.
pub struct TransportSession {
    write: futures_util::stream::SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>,
    /// Wrapped in Option so the pump can take it for concurrent processing.
    incoming_rx: Option<mpsc::Receiver<TranscriptMessage>>,
    connectivity: Arc<ConnectivityCell>,
    receiver_task: tokio::task::JoinHandle<()>,
}

impl TransportSession {
    /// Open the connection and spawn the receiver task.
    pub async fn connect(endpoint: &str) -> Result<Self, TransportError> {
        let connectivity = Arc::new(ConnectivityCell::new(Connectivity::Connecting));

        log::info!("Connecting to transcription service at {}", endpoint);

        let (ws_stream, _response) = match timeout(
            CONNECT_TIMEOUT,
            connect_async_with_config(endpoint, None, true),
        )
        .await
        {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => {
                connectivity.set(Connectivity::Disconnected);
                return Err(TransportError::ConnectFailed(e.to_string()));
            }
            Err(_) => {
                connectivity.set(Connectivity::Disconnected);
                return Err(TransportError::ConnectFailed(
                    "connection timeout".to_string(),
                ));
            }
        };

        connectivity.set(Connectivity::Connected);
        log::info!("Transcription socket connected");

        let (write, mut read) = ws_stream.split();
        let (incoming_tx, incoming_rx) = mpsc::channel(INBOUND_CHANNEL_CAPACITY);

        let task_connectivity = connectivity.clone();
        let receiver_task = tokio::spawn(async move {
            while let Some(msg_result) = read.next().await {
                match msg_result {
                    Ok(Message::Text(text)) => match parse_message(&text) {
                        Ok(msg) => {
                            if incoming_tx.send(msg).await.is_err() {
                                log::debug!("Inbound channel closed, receiver exiting");
                                break;
                            }
                        }
                        Err(e) => {
                            // One malformed payload must not take the
                            // session down with it.
                            log::warn!("Ignoring malformed transcript message: {}", e);
                        }
                    },
                    Ok(Message::Close(_)) => {
                        log::info!("Transcription socket closed by server");
                        break;
                    }
                    Ok(_) => {} // ping/pong/binary from the server carry nothing
                    Err(e) => {
                        log::warn!("Transcription socket error: {}", e);
                        break;
                    }
                }
            }
            task_connectivity.set(Connectivity::Disconnected);
            log::debug!("Receiver task exiting");
        });

        Ok(Self {
            write,
            incoming_rx: Some(incoming_rx),
            connectivity,
            receiver_task,
        })
    }

    pub fn connectivity(&self) -> Connectivity {
        self.connectivity.get()
    }

    pub fn is_connected(&self) -> bool {
        self.connectivity.get() == Connectivity::Connected
    }

    /// Shared connectivity cell, readable after this session is consumed.
    pub fn connectivity_cell(&self) -> Arc<ConnectivityCell> {
        self.connectivity.clone()
    }

    /// Send one PCM frame.
    ///
    /// At-most-once: while not `Connected` the frame is dropped, not queued
    /// and not an error. A write failure flips the session to
    /// `Disconnected` instead of surfacing per-frame errors.
    pub async fn send(&mut self, frame: PcmFrame) {
        match self.connectivity.get() {
            Connectivity::Connected => {}
            state => {
                log::debug!(
                    "Dropping {}-sample frame while {}",
                    frame.len(),
                    state.as_str()
                );
                return;
            }
        }

        if let Err(e) = self.write.send(Message::Binary(frame.into_le_bytes())).await {
            log::warn!("Frame send failed: {}", e);
            self.connectivity.set(Connectivity::Disconnected);
        }
    }

    /// Take ownership of the inbound message receiver so the session pump
    /// can process transcripts concurrently with sending.
    ///
    /// After this, `recv()` returns `None`.
    pub fn take_incoming_receiver(&mut self) -> Option<mpsc::Receiver<TranscriptMessage>> {
        self.incoming_rx.take()
    }

    /// Receive the next inbound message. `None` once the connection closes
    /// or the receiver was taken.
    pub async fn recv(&mut self) -> Option<TranscriptMessage> {
        match self.incoming_rx.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    /// Scoped teardown: the state reads `Disconnected` afterwards even when
    /// the remote ended the connection first.
    pub async fn close(mut self) {
        log::info!("Closing transcription socket");
        self.receiver_task.abort();
        if let Err(e) = self.write.close().await {
            log::debug!("Error closing socket: {}", e);
        }
        self.connectivity.set(Connectivity::Disconnected);
    }
}

impl Drop for TransportSession {
    fn drop(&mut self) {
        self.receiver_task.abort();
        self.connectivity.set(Connectivity::Disconnected);
    }
}

#[async_trait]
impl FrameSink for TransportSession {
    async fn send_frame(&mut self, frame: PcmFrame) {
        self.send(frame).await;
    }
}
