//! Transcript reconciliation
//!
//! Merges the service's stream of possibly-corrective messages into one
//! ordered, mutable transcript collection, plus the session-stable speaker
//! color map and the derived grouping-for-display view the rendering layer
//! consumes read-only.

pub mod colors;
pub mod entry;
pub mod reconciler;
pub mod view;

pub use colors::{SpeakerColor, SpeakerColorMap};
pub use entry::{Sentiment, TranscriptEntry};
pub use reconciler::TranscriptReconciler;
pub use view::{speaker_turns, SpeakerTurn};
