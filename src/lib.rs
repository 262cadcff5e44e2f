//! callstream: real-time call audio ingestion and transcript reconciliation
//!
//! Captures or replays audio, converts it to wire-ready 16-bit PCM, streams
//! it over one persistent WebSocket to a remote speech/diarization service,
//! and reconciles the streamed transcript fragments (including in-place
//! speaker corrections) into a stable, orderable transcript view.
//!
//! # Pipeline
//!
//! ```text
//! mic (cpal) ──┐
//!              ├──▶ SampleBlock ──▶ PCM encode ──▶ scheduler ──▶ socket
//! file (WAV) ──┘                                                  │
//!                                                 JSON messages ◀─┘
//!                                                      │
//!                                                      ▼
//!                                             TranscriptReconciler
//! ```
//!
//! The [`session::Session`] object ties the stages together and owns the
//! per-session state; the rendering layer consumes the reconciler's output
//! read-only.

pub mod audio;
pub mod config;
pub mod pcm;
pub mod session;
pub mod streaming;
pub mod transcript;

pub use audio::{SampleBlock, CAPTURE_BLOCK_SIZE, FILE_CHUNK_SIZE, TARGET_SAMPLE_RATE};
pub use config::SessionConfig;
pub use pcm::{encode, EncodePolicy, PcmFrame};
pub use session::{CaptureMode, Session, SessionError, SessionState};
pub use streaming::{Connectivity, TransportError, TransportSession};
pub use transcript::{
    speaker_turns, Sentiment, SpeakerColor, SpeakerColorMap, TranscriptEntry, TranscriptReconciler,
};
