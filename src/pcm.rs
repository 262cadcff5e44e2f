//! PCM encoding: normalized f32 blocks to wire-ready i16 frames
//!
//! Two encoding policies exist because the system this replaces treated the
//! two audio origins differently: file replay clamps before scaling, live
//! capture scales without clamping and wraps on overdriven input. The
//! difference is preserved as-is; see DESIGN.md.

use crate::audio::SampleBlock;

const FULL_SCALE: f32 = 32767.0;

/// Per-source encoding behavior for out-of-range samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodePolicy {
    /// Scale by 32767 without clamping. Input beyond [-1.0, 1.0] wraps
    /// around 16 bits, matching the legacy mic path.
    LiveCapture,
    /// Clamp to [-1.0, 1.0], then scale by 32767.
    FileReplay,
}

/// An ordered run of signed 16-bit samples, the byte-exact transport unit.
/// Lives only from encoding until the send that consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmFrame {
    samples: Vec<i16>,
}

impl PcmFrame {
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Serialize to little-endian bytes for the wire. No framing header;
    /// frame boundaries are transport-message boundaries.
    pub fn into_le_bytes(self) -> Vec<u8> {
        self.samples
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect()
    }
}

/// Convert a sample block to a PCM frame under the given policy. Pure; the
/// block is left untouched.
pub fn encode(block: &SampleBlock, policy: EncodePolicy) -> PcmFrame {
    let samples = block
        .samples()
        .iter()
        .map(|&s| match policy {
            // The i32 round-trip keeps the 16-bit wraparound a saturating
            // float-to-i16 cast would paper over.
            EncodePolicy::LiveCapture => (s * FULL_SCALE) as i32 as i16,
            EncodePolicy::FileReplay => (s.clamp(-1.0, 1.0) * FULL_SCALE) as i16,
        })
        .collect();

    PcmFrame { samples }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(samples: Vec<f32>) -> SampleBlock {
        SampleBlock::new(samples, 16_000)
    }

    #[test]
    fn test_encode_in_range_matches_across_policies() {
        let b = block(vec![0.0, 0.5, -0.5, 1.0, -1.0]);
        let live = encode(&b, EncodePolicy::LiveCapture);
        let file = encode(&b, EncodePolicy::FileReplay);

        assert_eq!(live.samples(), file.samples());
        assert_eq!(live.samples()[0], 0);
        assert_eq!(live.samples()[3], 32767);
        assert_eq!(live.samples()[4], -32767);
    }

    #[test]
    fn test_file_replay_clamps() {
        let b = block(vec![2.0, -2.0]);
        let frame = encode(&b, EncodePolicy::FileReplay);

        assert_eq!(frame.samples(), &[32767, -32767]);
    }

    #[test]
    fn test_live_capture_wraps_on_overdrive() {
        let b = block(vec![1.5]);
        let frame = encode(&b, EncodePolicy::LiveCapture);

        // 1.5 * 32767 = 49150 wraps to 49150 - 65536
        assert_eq!(frame.samples(), &[-16386]);
    }

    #[test]
    fn test_encode_is_monotonic_within_range() {
        let values: Vec<f32> = (-10..=10).map(|i| i as f32 / 10.0).collect();
        for policy in [EncodePolicy::LiveCapture, EncodePolicy::FileReplay] {
            let frame = encode(&block(values.clone()), policy);
            let encoded = frame.samples();
            for pair in encoded.windows(2) {
                assert!(pair[0] <= pair[1], "policy {:?} not monotonic", policy);
            }
        }
    }

    #[test]
    fn test_le_bytes_layout() {
        let frame = encode(&block(vec![0.0]), EncodePolicy::FileReplay);
        assert_eq!(frame.into_le_bytes(), vec![0x00, 0x00]);

        let b = block(vec![1.0]);
        let bytes = encode(&b, EncodePolicy::FileReplay).into_le_bytes();
        // 32767 = 0x7FFF little-endian
        assert_eq!(bytes, vec![0xFF, 0x7F]);
    }

    #[test]
    fn test_empty_block() {
        let frame = encode(&block(Vec::new()), EncodePolicy::LiveCapture);
        assert!(frame.is_empty());
        assert!(frame.into_le_bytes().is_empty());
    }
}
