use serde::{Deserialize, Serialize};

use crate::session::{ChipColor, SessionId};

/// Inbound commands, one per client message. The connection that sent the
/// message is the implicit caller and is not part of the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum Command {
    CreateSession {
        session_id: SessionId,
        participant_name: String,
    },
    JoinSession {
        session_id: SessionId,
        participant_name: String,
    },
    StartSession {
        session_id: SessionId,
    },
    PickChip {
        session_id: SessionId,
        round_key: ChipColor,
        value: u32,
    },
    AdvanceRound {
        session_id: SessionId,
    },
    Showdown {
        session_id: SessionId,
    },
    Disconnect,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateSession { .. } => "create_session",
            Command::JoinSession { .. } => "join_session",
            Command::StartSession { .. } => "start_session",
            Command::PickChip { .. } => "pick_chip",
            Command::AdvanceRound { .. } => "advance_round",
            Command::Showdown { .. } => "showdown",
            Command::Disconnect => "disconnect",
        }
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            Command::CreateSession { session_id, .. }
            | Command::JoinSession { session_id, .. }
            | Command::StartSession { session_id }
            | Command::PickChip { session_id, .. }
            | Command::AdvanceRound { session_id }
            | Command::Showdown { session_id } => Some(session_id),
            Command::Disconnect => None,
        }
    }
}
