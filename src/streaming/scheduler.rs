//! Outbound frame pacing
//!
//! Decides when each PCM frame reaches the transport. Live capture sends as
//! blocks arrive; the audio callback cadence is the only backpressure. File
//! replay emulates real time with a fixed pause after every chunk, checking
//! for cancellation before each chunk rather than interrupting a wait
//! already in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::audio::SampleBlock;
use crate::pcm::{encode, EncodePolicy, PcmFrame};

/// Pause between file-replay chunks.
pub const REPLAY_INTERVAL: Duration = Duration::from_millis(200);

/// Seam between pacing and the transport. Sends never fail per-frame; a
/// dead transport swallows frames (see [`super::transport`]).
#[async_trait]
pub trait FrameSink: Send {
    async fn send_frame(&mut self, frame: PcmFrame);
}

/// Drive live-capture blocks to the sink until the channel closes
/// (explicit stop drops the producer). Returns the number of frames sent.
pub async fn run_live<S: FrameSink>(mut rx: mpsc::Receiver<SampleBlock>, sink: &mut S) -> u64 {
    let mut frames_sent = 0u64;

    while let Some(block) = rx.recv().await {
        sink.send_frame(encode(&block, EncodePolicy::LiveCapture)).await;
        frames_sent += 1;

        if frames_sent % 50 == 0 {
            log::debug!("Live send loop: {} frames sent", frames_sent);
        }
    }

    log::info!("Live send loop finished, {} frames sent", frames_sent);
    frames_sent
}

/// Replay pre-chunked file audio with real-time pacing.
///
/// The cancellation flag is observed once per chunk, before encoding it;
/// the inter-chunk wait always runs to completion first. Returns the number
/// of frames sent.
pub async fn run_file_replay<S, I>(
    blocks: I,
    sink: &mut S,
    cancel: &AtomicBool,
    interval: Duration,
) -> u64
where
    S: FrameSink,
    I: IntoIterator<Item = SampleBlock>,
{
    let mut frames_sent = 0u64;

    for block in blocks {
        if cancel.load(Ordering::SeqCst) {
            log::info!("File replay cancelled after {} frames", frames_sent);
            return frames_sent;
        }

        sink.send_frame(encode(&block, EncodePolicy::FileReplay)).await;
        frames_sent += 1;

        tokio::time::sleep(interval).await;
    }

    log::info!("File replay complete, {} frames sent", frames_sent);
    frames_sent
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Records every frame; optionally raises a cancellation flag once a
    /// frame count is reached.
    struct RecordingSink {
        frames: Vec<PcmFrame>,
        cancel_after: Option<(usize, Arc<AtomicBool>)>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                frames: Vec::new(),
                cancel_after: None,
            }
        }
    }

    #[async_trait]
    impl FrameSink for RecordingSink {
        async fn send_frame(&mut self, frame: PcmFrame) {
            self.frames.push(frame);
            if let Some((count, flag)) = &self.cancel_after {
                if self.frames.len() >= *count {
                    flag.store(true, Ordering::SeqCst);
                }
            }
        }
    }

    fn blocks_of(sizes: &[usize]) -> Vec<SampleBlock> {
        sizes
            .iter()
            .map(|&n| SampleBlock::new(vec![0.1; n], 16_000))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_sends_every_chunk() {
        let cancel = AtomicBool::new(false);
        let mut sink = RecordingSink::new();

        let sent = run_file_replay(
            blocks_of(&[8000, 8000, 1]),
            &mut sink,
            &cancel,
            REPLAY_INTERVAL,
        )
        .await;

        assert_eq!(sent, 3);
        assert_eq!(sink.frames.len(), 3);
        assert_eq!(sink.frames[2].len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_stops_at_chunk_boundary_on_cancel() {
        let cancel = Arc::new(AtomicBool::new(false));
        let mut sink = RecordingSink::new();
        sink.cancel_after = Some((1, cancel.clone()));

        let sent = run_file_replay(
            blocks_of(&[8000, 8000, 1]),
            &mut sink,
            &cancel,
            REPLAY_INTERVAL,
        )
        .await;

        assert_eq!(sent, 1);
        assert_eq!(sink.frames.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_cancelled_before_start_sends_nothing() {
        let cancel = AtomicBool::new(true);
        let mut sink = RecordingSink::new();

        let sent = run_file_replay(blocks_of(&[8000]), &mut sink, &cancel, REPLAY_INTERVAL).await;

        assert_eq!(sent, 0);
        assert!(sink.frames.is_empty());
    }

    #[tokio::test]
    async fn test_live_loop_ends_when_producer_drops() {
        let (tx, rx) = mpsc::channel(8);
        let mut sink = RecordingSink::new();

        tx.send(SampleBlock::new(vec![0.5; 4096], 16_000))
            .await
            .unwrap();
        tx.send(SampleBlock::new(vec![-0.5; 4096], 16_000))
            .await
            .unwrap();
        drop(tx);

        let sent = run_live(rx, &mut sink).await;

        assert_eq!(sent, 2);
        assert_eq!(sink.frames.len(), 2);
        assert_eq!(sink.frames[0].len(), 4096);
    }
}
