use thiserror::Error;

use crate::session::{ChipColor, ParticipantId, SessionId};

/// Resource failures raised by the deck. Fatal to the hand being dealt, never
/// to the session or the process.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("Insufficient cards: requested {requested}, remaining {remaining}")]
    InsufficientCards { requested: usize, remaining: usize },
}

/// Validation failures for session commands. Returning one of these means the
/// command was declined and no session state changed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),
    #[error("Session {session_id} is full ({capacity} participants)")]
    Full {
        session_id: SessionId,
        capacity: usize,
    },
    #[error("At least {required} participants are needed to start, have {actual}")]
    NotEnoughParticipants { required: usize, actual: usize },
    #[error("Participant {0} is not seated in this session")]
    NotSeated(ParticipantId),
    #[error("Chip value {value} is outside 1..={max}")]
    InvalidChip { value: u32, max: u32 },
    #[error("Chip {value} for {color} is already held by another participant")]
    ChipTaken { color: ChipColor, value: u32 },
    #[error(transparent)]
    Game(#[from] GameError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseCardError {
    #[error("Malformed card: {0:?}")]
    Malformed(String),
    #[error("Unknown rank: {0:?}")]
    UnknownRank(String),
    #[error("Unknown suit: {0:?}")]
    UnknownSuit(String),
}
