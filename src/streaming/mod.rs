//! Streaming pipeline: wire schema, send pacing and the socket session
//!
//! ```text
//! SampleBlocks ──▶ scheduler (pace) ──▶ transport ──▶ service
//!                                          │
//!                                          ▼ (JSON text)
//!                                  TranscriptMessage ──▶ reconciler
//! ```
//!
//! Sends and receives are independent directions with no request/response
//! correlation; inbound messages are handled in receive order.

pub mod protocol;
pub mod scheduler;
pub mod transport;

pub use protocol::{parse_message, InboundEvent, SpeakerCorrection, TranscriptMessage};
pub use scheduler::{run_file_replay, run_live, FrameSink, REPLAY_INTERVAL};
pub use transport::{Connectivity, ConnectivityCell, TransportError, TransportSession};
