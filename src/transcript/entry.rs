//! Transcript entry types

use serde::{Deserialize, Serialize};

/// Categorical sentiment tag attached to each utterance by the service.
/// The wire carries either the capitalized or the lowercase spelling;
/// anything outside this vocabulary fails schema validation and the
/// message is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    #[serde(alias = "positive")]
    Positive,
    #[serde(alias = "negative")]
    Negative,
    #[serde(alias = "neutral")]
    Neutral,
    #[serde(alias = "anger")]
    Anger,
    #[serde(alias = "sarcasm")]
    Sarcasm,
    /// Emitted by the service for silence-gap fragments.
    #[serde(alias = "pause")]
    Pause,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
            Sentiment::Anger => "Anger",
            Sentiment::Sarcasm => "Sarcasm",
            Sentiment::Pause => "Pause",
        }
    }
}

/// One recognized utterance segment.
///
/// Entries are append-only in position but mutable in content: a later
/// correction may rewrite the speaker fields. The (`text`, `timestamp`)
/// pair identifies an entry for correction matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptEntry {
    /// Display name; not guaranteed stable across the session.
    pub speaker_label: String,
    /// Identity key; 0 means provisional / unassigned.
    pub speaker_id: u32,
    pub text: String,
    pub sentiment: Sentiment,
    pub profanity_detected: bool,
    /// Opaque ordering/identity key assigned by the service.
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_parses_case_insensitively() {
        let s: Sentiment = serde_json::from_str("\"Neutral\"").unwrap();
        assert_eq!(s, Sentiment::Neutral);

        let s: Sentiment = serde_json::from_str("\"neutral\"").unwrap();
        assert_eq!(s, Sentiment::Neutral);

        let s: Sentiment = serde_json::from_str("\"pause\"").unwrap();
        assert_eq!(s, Sentiment::Pause);
    }

    #[test]
    fn test_unknown_sentiment_is_rejected() {
        let result: Result<Sentiment, _> = serde_json::from_str("\"Excited\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_entry_serializes_camel_case() {
        let entry = TranscriptEntry {
            speaker_label: "Agent".to_string(),
            speaker_id: 2,
            text: "hello".to_string(),
            sentiment: Sentiment::Positive,
            profanity_detected: false,
            timestamp: "00:00:05".to_string(),
        };

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"speakerLabel\":\"Agent\""));
        assert!(json.contains("\"speakerId\":2"));
        assert!(json.contains("\"profanityDetected\":false"));
        assert!(json.contains("\"sentiment\":\"Positive\""));
    }
}
