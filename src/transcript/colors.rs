//! Speaker color assignment
//!
//! Each diarized speaker id gets a display color on first sight and keeps it
//! for the rest of the session, across transcript clears. Hue is random;
//! saturation and lightness are fixed so any assigned hue stays legible
//! against the transcript background.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

const SPEAKER_SATURATION: u8 = 70;
const SPEAKER_LIGHTNESS: u8 = 45;

/// An HSL display color for one speaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpeakerColor {
    /// Degrees, 0..360.
    pub hue: u16,
    /// Percent.
    pub saturation: u8,
    /// Percent.
    pub lightness: u8,
}

impl SpeakerColor {
    fn random() -> Self {
        Self {
            hue: random_hue(),
            saturation: SPEAKER_SATURATION,
            lightness: SPEAKER_LIGHTNESS,
        }
    }

    /// CSS color string for the rendering layer.
    pub fn to_css(&self) -> String {
        format!(
            "hsl({}, {}%, {}%)",
            self.hue, self.saturation, self.lightness
        )
    }
}

// uuid v4 random bytes, which the crate already carries for session ids.
fn random_hue() -> u16 {
    let bytes = Uuid::new_v4().into_bytes();
    u16::from_le_bytes([bytes[0], bytes[1]]) % 360
}

/// Maps diarized speaker ids to display colors. Grows monotonically during
/// a session; cleared only on explicit session reset, never on transcript
/// clear.
#[derive(Debug, Clone, Default)]
pub struct SpeakerColorMap {
    colors: HashMap<u32, SpeakerColor>,
}

impl SpeakerColorMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a color to `speaker_id` if it has none yet; returns the color
    /// either way. Assignment is idempotent: an already-assigned id keeps
    /// its color.
    pub fn assign(&mut self, speaker_id: u32) -> SpeakerColor {
        *self
            .colors
            .entry(speaker_id)
            .or_insert_with(SpeakerColor::random)
    }

    pub fn get(&self, speaker_id: u32) -> Option<SpeakerColor> {
        self.colors.get(&speaker_id).copied()
    }

    pub fn contains(&self, speaker_id: u32) -> bool {
        self.colors.contains_key(&speaker_id)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Drop every assignment. Session reset only.
    pub fn clear(&mut self) {
        self.colors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_is_idempotent() {
        let mut map = SpeakerColorMap::new();
        let first = map.assign(1);
        let second = map.assign(1);

        assert_eq!(first, second);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_distinct_ids_get_their_own_entry() {
        let mut map = SpeakerColorMap::new();
        map.assign(1);
        map.assign(2);
        map.assign(3);

        assert_eq!(map.len(), 3);
        assert!(map.contains(1));
        assert!(map.contains(2));
        assert!(map.contains(3));
        assert!(!map.contains(4));
    }

    #[test]
    fn test_hue_in_range() {
        let mut map = SpeakerColorMap::new();
        for id in 0..50 {
            let color = map.assign(id);
            assert!(color.hue < 360);
            assert_eq!(color.saturation, SPEAKER_SATURATION);
            assert_eq!(color.lightness, SPEAKER_LIGHTNESS);
        }
    }

    #[test]
    fn test_css_format() {
        let color = SpeakerColor {
            hue: 120,
            saturation: 70,
            lightness: 45,
        };
        assert_eq!(color.to_css(), "hsl(120, 70%, 45%)");
    }

    #[test]
    fn test_clear_empties_map() {
        let mut map = SpeakerColorMap::new();
        map.assign(1);
        map.clear();
        assert!(map.is_empty());
    }
}
