//! Grouping-for-display view
//!
//! A pure derivation over the stored sequence, recomputable at any time:
//! consecutive entries share one speaker header iff their ids are equal and
//! non-zero. A provisional entry (id 0) always renders its own header, even
//! next to another provisional entry.

use super::colors::{SpeakerColor, SpeakerColorMap};
use super::entry::TranscriptEntry;

/// One display group: a header (speaker + color) over one or more
/// consecutive entries.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerTurn<'a> {
    pub speaker_id: u32,
    /// Label of the group's first entry at derivation time.
    pub speaker_label: &'a str,
    /// None for provisional speakers and ids that never appeared on a new
    /// entry.
    pub color: Option<SpeakerColor>,
    pub entries: Vec<&'a TranscriptEntry>,
}

/// Derive the display grouping from the stored sequence.
pub fn speaker_turns<'a>(
    entries: &'a [TranscriptEntry],
    colors: &SpeakerColorMap,
) -> Vec<SpeakerTurn<'a>> {
    let mut turns: Vec<SpeakerTurn<'a>> = Vec::new();

    for entry in entries {
        let continues_turn = entry.speaker_id != 0
            && turns
                .last()
                .map_or(false, |turn| turn.speaker_id == entry.speaker_id);

        if continues_turn {
            if let Some(turn) = turns.last_mut() {
                turn.entries.push(entry);
            }
        } else {
            turns.push(SpeakerTurn {
                speaker_id: entry.speaker_id,
                speaker_label: &entry.speaker_label,
                color: if entry.speaker_id == 0 {
                    None
                } else {
                    colors.get(entry.speaker_id)
                },
                entries: vec![entry],
            });
        }
    }

    turns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::entry::Sentiment;

    fn entry(speaker: &str, speaker_id: u32, text: &str) -> TranscriptEntry {
        TranscriptEntry {
            speaker_label: speaker.to_string(),
            speaker_id,
            text: text.to_string(),
            sentiment: Sentiment::Neutral,
            profanity_detected: false,
            timestamp: text.to_string(),
        }
    }

    #[test]
    fn test_consecutive_same_speaker_collapse() {
        let entries = vec![
            entry("User", 1, "a"),
            entry("User", 1, "b"),
            entry("Agent", 2, "c"),
        ];
        let colors = SpeakerColorMap::new();

        let turns = speaker_turns(&entries, &colors);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].entries.len(), 2);
        assert_eq!(turns[1].entries.len(), 1);
        assert_eq!(turns[0].speaker_label, "User");
    }

    #[test]
    fn test_alternating_speakers_do_not_collapse() {
        let entries = vec![
            entry("User", 1, "a"),
            entry("Agent", 2, "b"),
            entry("User", 1, "c"),
        ];
        let colors = SpeakerColorMap::new();

        let turns = speaker_turns(&entries, &colors);
        assert_eq!(turns.len(), 3);
    }

    #[test]
    fn test_provisional_entries_never_collapse() {
        let entries = vec![
            entry("…", 0, "a"),
            entry("…", 0, "b"),
            entry("User", 1, "c"),
            entry("…", 0, "d"),
            entry("User", 1, "e"),
        ];
        let colors = SpeakerColorMap::new();

        let turns = speaker_turns(&entries, &colors);
        // 0 | 0 | 1 | 0 | 1: nothing groups across or into provisional
        assert_eq!(turns.len(), 5);
        assert!(turns[0].color.is_none());
        assert!(turns[1].color.is_none());
    }

    #[test]
    fn test_colors_surface_on_turns() {
        let entries = vec![entry("User", 1, "a")];
        let mut colors = SpeakerColorMap::new();
        let assigned = colors.assign(1);

        let turns = speaker_turns(&entries, &colors);
        assert_eq!(turns[0].color, Some(assigned));
    }

    #[test]
    fn test_derivation_is_idempotent() {
        let entries = vec![
            entry("User", 1, "a"),
            entry("User", 1, "b"),
            entry("Agent", 2, "c"),
        ];
        let colors = SpeakerColorMap::new();

        let first = speaker_turns(&entries, &colors);
        let second = speaker_turns(&entries, &colors);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_sequence() {
        let colors = SpeakerColorMap::new();
        assert!(speaker_turns(&[], &colors).is_empty());
    }
}
