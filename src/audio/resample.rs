//! Channel downmix and sample-rate conversion
//!
//! Integer-ratio decimation uses window averaging (48 kHz -> 16 kHz is 3:1).
//! Non-integer ratios (44.1 kHz -> 16 kHz) fall back to linear
//! interpolation, which is plenty for mono speech headed to a recognizer.

/// Downmix interleaved multi-channel samples to mono by averaging each
/// frame. Mono input is returned unchanged.
pub fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels as usize)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Convert mono samples from `source_rate` to `target_rate`.
///
/// Degenerate rates are logged and the input returned unchanged rather than
/// panicking inside an audio callback.
pub fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if source_rate == 0 || target_rate == 0 {
        log::warn!(
            "Invalid sample rate (source: {}, target: {}), returning original",
            source_rate,
            target_rate
        );
        return samples.to_vec();
    }

    if source_rate == target_rate {
        return samples.to_vec();
    }

    if source_rate % target_rate == 0 {
        let window = (source_rate / target_rate) as usize;
        return samples
            .chunks(window)
            .map(|w| w.iter().sum::<f32>() / w.len() as f32)
            .collect();
    }

    linear_resample(samples, source_rate, target_rate)
}

fn linear_resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }

    let ratio = source_rate as f64 / target_rate as f64;
    let out_len = (samples.len() as f64 / ratio).floor() as usize;
    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let pos = i as f64 * ratio;
        let idx = pos as usize;
        let frac = (pos - idx as f64) as f32;
        let a = samples[idx];
        let b = if idx + 1 < samples.len() {
            samples[idx + 1]
        } else {
            a
        };
        out.push(a + (b - a) * frac);
    }

    out
}
