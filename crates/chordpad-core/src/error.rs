//! Error types for chordpad

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChordpadError {
    #[error("Voice slot {0} already occupied")]
    VoiceSlotConflict(usize),
    #[error("Key index out of range: {0}")]
    InvalidKey(usize),
}

pub type Result<T> = std::result::Result<T, ChordpadError>;
