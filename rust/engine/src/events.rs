use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::hand::Category;
use crate::session::{
    ChipColor, HeistProgress, HeistStatus, ParticipantId, SessionId, SessionStatus,
};
use crate::showdown::{ChipRange, Outcome};

/// Outbound events. The wire form is `{ "type": "<snake_case name>", ...fields }`
/// with camelCase field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum GameEvent {
    SessionCreated {
        session_id: SessionId,
    },
    RosterUpdated {
        session_id: SessionId,
        status: SessionStatus,
        participants: Vec<RosterEntry>,
    },
    /// Private to the participant who holds the cards
    HandDealt {
        session_id: SessionId,
        hand: Vec<Card>,
        round: u8,
    },
    RoundUpdated {
        session_id: SessionId,
        round: u8,
        community_cards: Vec<Card>,
    },
    ChipStateUpdated {
        session_id: SessionId,
        participants: Vec<ChipState>,
    },
    ShowdownResult {
        session_id: SessionId,
        results: Vec<ShowdownEntry>,
        outcome: Outcome,
        heist: HeistSnapshot,
    },
    HandAborted {
        session_id: SessionId,
        reason: String,
    },
    /// Sent only to the connection whose frame could not be understood
    CommandRejected {
        message: String,
    },
}

impl GameEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::SessionCreated { .. } => "session_created",
            GameEvent::RosterUpdated { .. } => "roster_updated",
            GameEvent::HandDealt { .. } => "hand_dealt",
            GameEvent::RoundUpdated { .. } => "round_updated",
            GameEvent::ChipStateUpdated { .. } => "chip_state_updated",
            GameEvent::ShowdownResult { .. } => "showdown_result",
            GameEvent::HandAborted { .. } => "hand_aborted",
            GameEvent::CommandRejected { .. } => "command_rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub id: ParticipantId,
    pub name: String,
    pub card_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChipState {
    pub id: ParticipantId,
    pub name: String,
    pub chips: BTreeMap<ChipColor, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowdownEntry {
    pub participant_id: ParticipantId,
    pub name: String,
    pub hand: Vec<Card>,
    pub category: Category,
    pub rank: u8,
    pub tiebreakers: Vec<u8>,
    pub description: String,
    pub chip_range: ChipRange,
    pub pick: Option<u32>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeistSnapshot {
    pub vaults: u32,
    pub alarms: u32,
    pub status: HeistStatus,
}

impl HeistSnapshot {
    pub fn new(progress: HeistProgress, status: HeistStatus) -> Self {
        Self {
            vaults: progress.vaults,
            alarms: progress.alarms,
            status,
        }
    }
}

/// Who an event is for. The transport maps rooms to every connection joined to
/// that session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Audience {
    Room(SessionId),
    Connection(ParticipantId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub audience: Audience,
    pub event: GameEvent,
}

impl Notification {
    pub fn room(session_id: &SessionId, event: GameEvent) -> Self {
        Self {
            audience: Audience::Room(session_id.clone()),
            event,
        }
    }

    pub fn to(connection: &ParticipantId, event: GameEvent) -> Self {
        Self {
            audience: Audience::Connection(connection.clone()),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Rank, Suit};

    #[test]
    fn events_use_snake_case_tags_and_camel_case_fields() {
        let event = GameEvent::RoundUpdated {
            session_id: "g1".into(),
            round: 1,
            community_cards: vec![Card::new(Rank::Jack, Suit::Clubs)],
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "round_updated");
        assert_eq!(json["sessionId"], "g1");
        assert_eq!(json["communityCards"][0]["value"], "J");
        assert_eq!(json["communityCards"][0]["suit"], "♣");
        assert_eq!(event.name(), "round_updated");
    }

    #[test]
    fn chip_maps_are_keyed_by_colour() {
        let mut chips = BTreeMap::new();
        chips.insert(ChipColor::Orange, 2);
        let event = GameEvent::ChipStateUpdated {
            session_id: "g1".into(),
            participants: vec![ChipState {
                id: "c1".into(),
                name: "Ada".into(),
                chips,
            }],
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["participants"][0]["chips"]["orange"], 2);
    }
}
