//! Session coordination
//!
//! One [`Session`] owns the per-session state the whole pipeline shares:
//! connectivity, capture mode and the file-replay cancellation flag. It
//! enforces that the two capture modes never run concurrently, and it runs
//! the single inbound pump task that is the reconciler's only writer.
//!
//! Closing the socket cancels neither an in-progress capture nor an
//! in-progress replay; those are stopped through their own operations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::audio::{self, CaptureError, CaptureHandle, CaptureOptions, DecodeError};
use crate::config::SessionConfig;
use crate::pcm::PcmFrame;
use crate::streaming::scheduler::{self, FrameSink};
use crate::streaming::transport::{Connectivity, ConnectivityCell, TransportError, TransportSession};
use crate::transcript::{TranscriptEntry, TranscriptReconciler};

/// Capacity of the capture-to-scheduler channel (~8 s of audio at the
/// default block size).
const CAPTURE_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    Idle,
    LiveRecording,
    FileStreaming,
}

impl CaptureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureMode::Idle => "idle",
            CaptureMode::LiveRecording => "liveRecording",
            CaptureMode::FileStreaming => "fileStreaming",
        }
    }
}

/// Snapshot of the session's shared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    pub connectivity: Connectivity,
    pub capture_mode: CaptureMode,
    pub stream_cancelled: bool,
}

#[derive(Debug, Clone)]
pub enum SessionError {
    Capture(CaptureError),
    Decode(DecodeError),
    Transport(TransportError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Capture(e) => write!(f, "{}", e),
            SessionError::Decode(e) => write!(f, "{}", e),
            SessionError::Transport(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<CaptureError> for SessionError {
    fn from(e: CaptureError) -> Self {
        SessionError::Capture(e)
    }
}

impl From<DecodeError> for SessionError {
    fn from(e: DecodeError) -> Self {
        SessionError::Decode(e)
    }
}

impl From<TransportError> for SessionError {
    fn from(e: TransportError) -> Self {
        SessionError::Transport(e)
    }
}

/// Cloneable transport handle for the scheduler tasks. Frames offered while
/// no socket is active are dropped, matching the transport's own
/// at-most-once policy.
#[derive(Clone)]
pub struct SharedTransport {
    inner: Arc<AsyncMutex<Option<TransportSession>>>,
}

#[async_trait]
impl FrameSink for SharedTransport {
    async fn send_frame(&mut self, frame: PcmFrame) {
        let mut guard = self.inner.lock().await;
        match guard.as_mut() {
            Some(transport) => transport.send(frame).await,
            None => {
                log::debug!(
                    "Dropping {}-sample frame, no active session socket",
                    frame.len()
                );
            }
        }
    }
}

pub struct Session {
    id: Uuid,
    config: SessionConfig,
    transport: Arc<AsyncMutex<Option<TransportSession>>>,
    connectivity: Option<Arc<ConnectivityCell>>,
    mode: CaptureMode,
    capture_handle: Option<CaptureHandle>,
    replay_task: Option<JoinHandle<u64>>,
    replay_cancel: Arc<AtomicBool>,
    reconciler: Arc<Mutex<TranscriptReconciler>>,
    pump_task: Option<JoinHandle<()>>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let id = Uuid::new_v4();
        log::debug!("Session {} created", id);
        Self {
            id,
            config,
            transport: Arc::new(AsyncMutex::new(None)),
            connectivity: None,
            mode: CaptureMode::Idle,
            capture_handle: None,
            replay_task: None,
            replay_cancel: Arc::new(AtomicBool::new(false)),
            reconciler: Arc::new(Mutex::new(TranscriptReconciler::new())),
            pump_task: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
            .as_ref()
            .map(|cell| cell.get())
            .unwrap_or(Connectivity::Disconnected)
    }

    pub fn capture_mode(&self) -> CaptureMode {
        match self.mode {
            // Replay that ran to completion leaves the session idle.
            CaptureMode::FileStreaming => match &self.replay_task {
                Some(task) if !task.is_finished() => CaptureMode::FileStreaming,
                _ => CaptureMode::Idle,
            },
            mode => mode,
        }
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            connectivity: self.connectivity(),
            capture_mode: self.capture_mode(),
            stream_cancelled: self.replay_cancel.load(Ordering::SeqCst),
        }
    }

    /// Open the socket and start the inbound pump, the reconciler's single
    /// writer.
    pub async fn connect(&mut self) -> Result<(), TransportError> {
        if self.connectivity() != Connectivity::Disconnected {
            log::warn!("Session already connected, ignoring connect()");
            return Ok(());
        }

        let mut transport = TransportSession::connect(&self.config.endpoint).await?;
        self.connectivity = Some(transport.connectivity_cell());

        if let Some(mut incoming) = transport.take_incoming_receiver() {
            let reconciler = self.reconciler.clone();
            self.pump_task = Some(tokio::spawn(async move {
                while let Some(message) = incoming.recv().await {
                    reconciler.lock().unwrap().apply_message(message);
                }
                log::debug!("Inbound pump exiting");
            }));
        }

        *self.transport.lock().await = Some(transport);
        Ok(())
    }

    /// Tear down the socket. In-progress capture or replay keeps running
    /// and must be stopped through its own operation; frames it produces
    /// from here on are dropped.
    pub async fn close(&mut self) {
        // The pump drains on its own once the receiver task is gone.
        self.pump_task = None;

        let transport = self.transport.lock().await.take();
        if let Some(transport) = transport {
            transport.close().await;
        }
        self.connectivity = None;
        log::info!("Session {} closed", self.id);
    }

    /// Start live microphone capture, stopping any file replay first. The
    /// two capture modes never run concurrently.
    pub async fn start_recording(&mut self) -> Result<(), SessionError> {
        self.cancel_stream_inner().await;
        self.stop_recording();

        let (tx, rx) = mpsc::channel(CAPTURE_CHANNEL_CAPACITY);
        let opts = CaptureOptions {
            target_sample_rate: self.config.target_sample_rate,
            block_size: self.config.capture_block_size,
        };

        let handle = audio::start_capture(tx, opts)?;

        // The send loop runs detached; it drains and exits once the capture
        // handle (and with it the producer side of the channel) is dropped.
        let mut sink = self.frame_sink();
        tokio::spawn(async move { scheduler::run_live(rx, &mut sink).await });

        self.capture_handle = Some(handle);
        self.mode = CaptureMode::LiveRecording;
        log::info!("Live recording started");
        Ok(())
    }

    /// Release the device immediately and halt frame production. The send
    /// loop drains whatever was already captured and exits.
    pub fn stop_recording(&mut self) {
        if let Some(handle) = self.capture_handle.take() {
            handle.stop();
            log::info!("Live recording stopped");
        }
        if self.mode == CaptureMode::LiveRecording {
            self.mode = CaptureMode::Idle;
        }
    }

    /// Decode a picked file and replay it with real-time pacing. Decode
    /// failures surface here, before any frame is sent. Stops live capture
    /// first.
    pub async fn stream_file(&mut self, bytes: &[u8], mime: &str) -> Result<(), SessionError> {
        self.stop_recording();
        self.cancel_stream_inner().await;

        let samples = audio::decode_audio(bytes, mime, self.config.target_sample_rate)?;
        log::info!(
            "Decoded {} samples ({} chunks) for replay",
            samples.len(),
            samples.len().div_ceil(self.config.file_chunk_size)
        );

        self.replay_cancel.store(false, Ordering::SeqCst);
        let cancel = self.replay_cancel.clone();
        let chunk_size = self.config.file_chunk_size;
        let sample_rate = self.config.target_sample_rate;
        let interval = self.config.replay_interval();
        let mut sink = self.frame_sink();

        self.replay_task = Some(tokio::spawn(async move {
            let blocks = audio::chunk_blocks(&samples, chunk_size, sample_rate);
            scheduler::run_file_replay(blocks, &mut sink, &cancel, interval).await
        }));

        self.mode = CaptureMode::FileStreaming;
        Ok(())
    }

    /// Request cancellation of the in-flight replay and wait for it to stop.
    /// The flag is observed at the next chunk boundary; the wait already in
    /// progress runs to completion first.
    pub async fn cancel_stream(&mut self) {
        self.cancel_stream_inner().await;
    }

    async fn cancel_stream_inner(&mut self) {
        self.replay_cancel.store(true, Ordering::SeqCst);
        if let Some(task) = self.replay_task.take() {
            match task.await {
                Ok(sent) => log::info!("File replay stopped after {} frames", sent),
                Err(e) => log::warn!("Replay task failed: {}", e),
            }
        }
        if self.mode == CaptureMode::FileStreaming {
            self.mode = CaptureMode::Idle;
        }
    }

    /// Sink handle for the scheduler tasks.
    pub fn frame_sink(&self) -> SharedTransport {
        SharedTransport {
            inner: self.transport.clone(),
        }
    }

    /// Shared transcript handle for the rendering collaborator. Read-only
    /// by convention: the inbound pump is the single writer.
    pub fn transcript(&self) -> Arc<Mutex<TranscriptReconciler>> {
        self.reconciler.clone()
    }

    pub fn transcript_snapshot(&self) -> Vec<TranscriptEntry> {
        self.reconciler.lock().unwrap().snapshot()
    }

    /// Empty the transcript; speaker colors survive.
    pub fn clear_transcript(&self) {
        self.reconciler.lock().unwrap().clear();
    }

    /// Explicit session reset: transcript and color map both dropped.
    pub fn reset_transcript(&self) {
        self.reconciler.lock().unwrap().reset();
    }
}
