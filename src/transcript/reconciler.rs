//! Transcript reconciliation state machine
//!
//! Ingests inbound events in receive order and maintains the single ordered
//! transcript collection. New fragments append; corrections re-attribute
//! speaker identity on already-delivered entries and never originate
//! content. Only the session's inbound pump writes here.

use crate::streaming::protocol::{InboundEvent, SpeakerCorrection, TranscriptMessage};

use super::colors::SpeakerColorMap;
use super::entry::TranscriptEntry;

#[derive(Debug, Clone, Default)]
pub struct TranscriptReconciler {
    entries: Vec<TranscriptEntry>,
    colors: SpeakerColorMap,
}

impl TranscriptReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one inbound event.
    pub fn apply(&mut self, event: InboundEvent) {
        match event {
            InboundEvent::New(entry) => self.append(entry),
            InboundEvent::Correction(correction) => self.reattribute(correction),
        }
    }

    /// Convenience for the inbound pump: decode-and-apply a wire message.
    pub fn apply_message(&mut self, message: TranscriptMessage) {
        self.apply(InboundEvent::from(message));
    }

    fn append(&mut self, entry: TranscriptEntry) {
        if entry.speaker_id != 0 && !self.colors.contains(entry.speaker_id) {
            let color = self.colors.assign(entry.speaker_id);
            log::debug!(
                "Assigned {} to speaker {} ({})",
                color.to_css(),
                entry.speaker_id,
                entry.speaker_label
            );
        }
        self.entries.push(entry);
    }

    /// Rewrite speaker fields on every entry whose (`text`, `timestamp`)
    /// matches the correction. The key is the only identity the protocol
    /// provides, so ties are resolved by blanket reassignment. An unmatched
    /// correction is dropped.
    fn reattribute(&mut self, correction: SpeakerCorrection) {
        let mut matched = 0usize;
        for entry in self
            .entries
            .iter_mut()
            .filter(|e| e.text == correction.text && e.timestamp == correction.timestamp)
        {
            entry.speaker_label = correction.speaker_label.clone();
            entry.speaker_id = correction.speaker_id;
            matched += 1;
        }

        if matched == 0 {
            log::debug!(
                "Correction for ({:?}, {:?}) matched no entry, dropped",
                correction.text,
                correction.timestamp
            );
        } else {
            log::debug!(
                "Re-attributed {} entries to speaker {} ({})",
                matched,
                correction.speaker_id,
                correction.speaker_label
            );
        }
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn colors(&self) -> &SpeakerColorMap {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Owned copy of the current sequence for cross-thread consumers.
    pub fn snapshot(&self) -> Vec<TranscriptEntry> {
        self.entries.clone()
    }

    /// Empty the transcript; color assignments survive so speaker colors
    /// stay stable across a clear within the same session.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Full reset: transcript and color map both dropped.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.colors.clear();
    }
}
