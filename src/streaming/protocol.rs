//! Wire schema for the transcription service
//!
//! Outbound traffic is raw binary PCM frames (see [`crate::pcm`]); only the
//! inbound direction carries JSON. Each text message is one object:
//!
//! ```json
//! {
//!   "speaker": "Agent",
//!   "speaker_id": 2,
//!   "text": "hello",
//!   "profanity_detected": false,
//!   "sentiment": "Neutral",
//!   "timestamp": "00:00:05",
//!   "update": false
//! }
//! ```
//!
//! `speaker_id` may be absent (provisional, treated as 0) and `update`
//! defaults to false. A message that fails this schema is logged and
//! dropped without touching the transcript.

use serde::Deserialize;

use crate::transcript::{Sentiment, TranscriptEntry};

/// One inbound message as it appears on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptMessage {
    pub speaker: String,
    #[serde(default)]
    pub speaker_id: u32,
    pub text: String,
    pub profanity_detected: bool,
    pub sentiment: Sentiment,
    pub timestamp: String,
    #[serde(default)]
    pub update: bool,
}

/// A correction retargets speaker identity on already-delivered entries; it
/// never introduces new text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerCorrection {
    pub speaker_label: String,
    pub speaker_id: u32,
    /// Match key, together with `timestamp`.
    pub text: String,
    pub timestamp: String,
}

/// Validated inbound event, tagged by the wire `update` flag.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    New(TranscriptEntry),
    Correction(SpeakerCorrection),
}

impl From<TranscriptMessage> for InboundEvent {
    fn from(msg: TranscriptMessage) -> Self {
        if msg.update {
            InboundEvent::Correction(SpeakerCorrection {
                speaker_label: msg.speaker,
                speaker_id: msg.speaker_id,
                text: msg.text,
                timestamp: msg.timestamp,
            })
        } else {
            InboundEvent::New(TranscriptEntry {
                speaker_label: msg.speaker,
                speaker_id: msg.speaker_id,
                text: msg.text,
                sentiment: msg.sentiment,
                profanity_detected: msg.profanity_detected,
                timestamp: msg.timestamp,
            })
        }
    }
}

/// Parse one inbound text payload against the strict schema.
pub fn parse_message(text: &str) -> Result<TranscriptMessage, serde_json::Error> {
    serde_json::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_message() {
        let json = r#"{
            "speaker": "User",
            "speaker_id": 1,
            "text": "hi there",
            "profanity_detected": false,
            "sentiment": "Positive",
            "timestamp": "00:00:05",
            "update": false
        }"#;

        let msg = parse_message(json).unwrap();
        assert_eq!(msg.speaker, "User");
        assert_eq!(msg.speaker_id, 1);
        assert_eq!(msg.text, "hi there");
        assert_eq!(msg.sentiment, Sentiment::Positive);
        assert_eq!(msg.timestamp, "00:00:05");
        assert!(!msg.update);
    }

    #[test]
    fn test_missing_speaker_id_and_update_default() {
        let json = r#"{
            "speaker": "…",
            "text": "partial",
            "profanity_detected": false,
            "sentiment": "Neutral",
            "timestamp": "00:00:07"
        }"#;

        let msg = parse_message(json).unwrap();
        assert_eq!(msg.speaker_id, 0);
        assert!(!msg.update);
    }

    #[test]
    fn test_new_message_becomes_new_event() {
        let json = r#"{
            "speaker": "Agent",
            "speaker_id": 2,
            "text": "hello",
            "profanity_detected": true,
            "sentiment": "Anger",
            "timestamp": "t1"
        }"#;

        match InboundEvent::from(parse_message(json).unwrap()) {
            InboundEvent::New(entry) => {
                assert_eq!(entry.speaker_label, "Agent");
                assert_eq!(entry.speaker_id, 2);
                assert_eq!(entry.sentiment, Sentiment::Anger);
                assert!(entry.profanity_detected);
            }
            other => panic!("Expected New, got {:?}", other),
        }
    }

    #[test]
    fn test_update_message_becomes_correction() {
        let json = r#"{
            "speaker": "Agent",
            "speaker_id": 2,
            "text": "hello",
            "profanity_detected": false,
            "sentiment": "Neutral",
            "timestamp": "t1",
            "update": true
        }"#;

        match InboundEvent::from(parse_message(json).unwrap()) {
            InboundEvent::Correction(c) => {
                assert_eq!(c.speaker_label, "Agent");
                assert_eq!(c.speaker_id, 2);
                assert_eq!(c.text, "hello");
                assert_eq!(c.timestamp, "t1");
            }
            other => panic!("Expected Correction, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        assert!(parse_message("not json").is_err());
        assert!(parse_message("{}").is_err());
        assert!(parse_message(r#"{"speaker": "User"}"#).is_err());
    }

    #[test]
    fn test_unknown_sentiment_fails_schema() {
        let json = r#"{
            "speaker": "User",
            "text": "hi",
            "profanity_detected": false,
            "sentiment": "Confused",
            "timestamp": "t1"
        }"#;

        assert!(parse_message(json).is_err());
    }
}
