//! Live microphone capture using CPAL
//!
//! The cpal input stream is not `Send`, so a dedicated audio thread owns it
//! and the returned [`CaptureHandle`] stays freely movable. The cpal callback
//! downmixes and resamples device audio to the wire rate, accumulates
//! fixed-size blocks and forwards them over a bounded channel without ever
//! blocking the audio thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, StreamConfig};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::resample::{downmix_to_mono, resample};
use super::SampleBlock;

/// Errors that can occur while acquiring the microphone.
#[derive(Debug, Clone)]
pub enum CaptureError {
    /// No input device exists, or access to it was denied.
    DeviceUnavailable,
    /// The device offers no sample format we can read.
    NoSupportedConfig,
    StreamFailed(String),
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureError::DeviceUnavailable => {
                write!(f, "No audio input device available or access denied")
            }
            CaptureError::NoSupportedConfig => {
                write!(f, "No supported audio input configuration")
            }
            CaptureError::StreamFailed(e) => write!(f, "Audio stream failed: {}", e),
        }
    }
}

impl std::error::Error for CaptureError {}

#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// Rate the emitted blocks are resampled to.
    pub target_sample_rate: u32,
    /// Samples per emitted block.
    pub block_size: usize,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            target_sample_rate: super::TARGET_SAMPLE_RATE,
            block_size: super::CAPTURE_BLOCK_SIZE,
        }
    }
}

/// Handle to an active capture. Stopping (or dropping) it halts the stream,
/// joins the audio thread and releases the input device.
pub struct CaptureHandle {
    active: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl CaptureHandle {
    /// Stop capturing and release the input device.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Audio capture thread panicked during shutdown");
            }
        }
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Start capturing from the default input device.
///
/// Blocks until the audio thread reports that the stream is running, so a
/// missing device or denied access surfaces here and leaves no state behind.
pub fn start_capture(
    tx: mpsc::Sender<SampleBlock>,
    opts: CaptureOptions,
) -> Result<CaptureHandle, CaptureError> {
    let active = Arc::new(AtomicBool::new(true));
    let thread_active = active.clone();
    let (ready_tx, ready_rx) = std::sync::mpsc::channel();

    let thread = std::thread::Builder::new()
        .name("callstream-capture".to_string())
        .spawn(move || run_capture_thread(tx, opts, thread_active, ready_tx))
        .map_err(|e| CaptureError::StreamFailed(e.to_string()))?;

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(CaptureHandle {
            active,
            thread: Some(thread),
        }),
        Ok(Err(e)) => {
            let _ = thread.join();
            Err(e)
        }
        Err(_) => {
            let _ = thread.join();
            Err(CaptureError::StreamFailed(
                "audio thread exited before the stream started".to_string(),
            ))
        }
    }
}

fn run_capture_thread(
    tx: mpsc::Sender<SampleBlock>,
    opts: CaptureOptions,
    active: Arc<AtomicBool>,
    ready: std::sync::mpsc::Sender<Result<(), CaptureError>>,
) {
    let stream = match build_stream(tx, &opts, active.clone()) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready.send(Err(CaptureError::StreamFailed(e.to_string())));
        return;
    }

    let _ = ready.send(Ok(()));
    log::info!("Live capture started");

    while active.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(50));
    }

    // Dropping the stream releases the device and any processing graph.
    drop(stream);
    log::info!("Live capture stopped, input device released");
}

fn build_stream(
    tx: mpsc::Sender<SampleBlock>,
    opts: &CaptureOptions,
    active: Arc<AtomicBool>,
) -> Result<cpal::Stream, CaptureError> {
    let host = cpal::default_host();

    let device = host
        .default_input_device()
        .ok_or(CaptureError::DeviceUnavailable)?;

    log::info!("Using audio input device: {:?}", device.name());

    let supported_config = device
        .default_input_config()
        .map_err(|_| CaptureError::DeviceUnavailable)?;

    log::info!(
        "Audio config: {} Hz, {} channels, {:?}",
        supported_config.sample_rate().0,
        supported_config.channels(),
        supported_config.sample_format()
    );

    let sample_format = supported_config.sample_format();
    let config: StreamConfig = supported_config.into();

    match sample_format {
        SampleFormat::I16 => build_stream_typed::<i16>(&device, &config, tx, opts, active),
        SampleFormat::U16 => build_stream_typed::<u16>(&device, &config, tx, opts, active),
        SampleFormat::F32 => build_stream_typed::<f32>(&device, &config, tx, opts, active),
        _ => Err(CaptureError::NoSupportedConfig),
    }
}

fn build_stream_typed<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    tx: mpsc::Sender<SampleBlock>,
    opts: &CaptureOptions,
    active: Arc<AtomicBool>,
) -> Result<cpal::Stream, CaptureError>
where
    T: SizedSample + Send + 'static,
    f32: FromSample<T>,
{
    let channels = config.channels;
    let source_rate = config.sample_rate.0;
    let target_rate = opts.target_sample_rate;
    let block_size = opts.block_size;
    let mut pending: Vec<f32> = Vec::with_capacity(block_size * 2);

    let err_fn = |err| log::error!("Audio stream error: {}", err);

    let stream = device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                if !active.load(Ordering::SeqCst) {
                    return;
                }

                let floats: Vec<f32> = data.iter().map(|s| (*s).to_sample::<f32>()).collect();
                let mono = downmix_to_mono(&floats, channels);
                pending.extend(resample(&mono, source_rate, target_rate));

                while pending.len() >= block_size {
                    let samples: Vec<f32> = pending.drain(..block_size).collect();
                    match tx.try_send(SampleBlock::new(samples, target_rate)) {
                        Ok(()) => {}
                        Err(TrySendError::Full(block)) => {
                            log::warn!(
                                "Capture channel full, dropping {}-sample block",
                                block.len()
                            );
                        }
                        Err(TrySendError::Closed(_)) => {
                            // Consumer is gone; stop() follows shortly.
                        }
                    }
                }
            },
            err_fn,
            None,
        )
        .map_err(|e| CaptureError::StreamFailed(e.to_string()))?;

    Ok(stream)
}
