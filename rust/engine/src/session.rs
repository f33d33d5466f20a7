use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::config::GameConfig;
use crate::deck::Deck;
use crate::errors::{GameError, SessionError};
use crate::hand::evaluate_hand;
use crate::showdown::{resolve, Entry, Resolution};

pub type SessionId = String;
pub type ParticipantId = String;

/// Roster capacity of a session
pub const MAX_PARTICIPANTS: usize = 6;
/// Participants needed before a hand can be dealt
pub const MIN_PARTICIPANTS: usize = 2;
/// Last round of a hand (river revealed)
pub const FINAL_ROUND: u8 = 3;

/// Round key for chip picks. Each round of a hand has its own chip colour;
/// the positional keys `round0`..`round3` are accepted on input as well.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChipColor {
    #[serde(alias = "round0")]
    White,
    #[serde(alias = "round1")]
    Yellow,
    #[serde(alias = "round2")]
    Orange,
    #[serde(alias = "round3")]
    Red,
}

impl ChipColor {
    pub fn for_round(round: u8) -> ChipColor {
        match round {
            0 => ChipColor::White,
            1 => ChipColor::Yellow,
            2 => ChipColor::Orange,
            _ => ChipColor::Red,
        }
    }
}

impl fmt::Display for ChipColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChipColor::White => "white",
            ChipColor::Yellow => "yellow",
            ChipColor::Orange => "orange",
            ChipColor::Red => "red",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Waiting,
    InProgress,
}

/// One connected player. The id is the connection identifier, so identity lasts
/// exactly as long as the connection does.
#[derive(Debug, Clone)]
pub struct Participant {
    id: ParticipantId,
    name: String,
    hand: Vec<Card>,
    chips: BTreeMap<ChipColor, u32>,
}

impl Participant {
    fn new(id: ParticipantId, name: String) -> Self {
        Self {
            id,
            name,
            hand: Vec::with_capacity(2),
            chips: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &ParticipantId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hand(&self) -> &[Card] {
        &self.hand
    }

    pub fn chips(&self) -> &BTreeMap<ChipColor, u32> {
        &self.chips
    }

    pub fn chip(&self, color: ChipColor) -> Option<u32> {
        self.chips.get(&color).copied()
    }
}

/// Cooperative score across hands: a correct showdown cracks a vault, a wrong
/// one trips an alarm.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct HeistProgress {
    pub vaults: u32,
    pub alarms: u32,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeistStatus {
    Continue,
    Won,
    Lost,
}

impl HeistProgress {
    pub fn status(&self, config: &GameConfig) -> HeistStatus {
        if self.vaults >= config.vaults_to_win {
            HeistStatus::Won
        } else if self.alarms >= config.alarms_to_lose {
            HeistStatus::Lost
        } else {
            HeistStatus::Continue
        }
    }
}

/// Outcome of a showdown together with the heist tally after it.
#[derive(Debug, Clone)]
pub struct ShowdownReport {
    pub resolution: Resolution,
    pub heist: HeistProgress,
    /// Whether this showdown was the one that counted toward the tally
    pub settled: bool,
}

#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    participants: Vec<Participant>,
    community_cards: Vec<Card>,
    round: u8,
    deck: Deck,
    status: SessionStatus,
    heist: HeistProgress,
    hands_dealt: u64,
    settled_hand: Option<u64>,
}

impl Session {
    pub fn new(id: SessionId, mut deck: Deck) -> Self {
        deck.shuffle();
        Self {
            id,
            participants: Vec::with_capacity(MAX_PARTICIPANTS),
            community_cards: Vec::with_capacity(5),
            round: 0,
            deck,
            status: SessionStatus::Waiting,
            heist: HeistProgress::default(),
            hands_dealt: 0,
            settled_hand: None,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn is_seated(&self, id: &str) -> bool {
        self.participant(id).is_some()
    }

    pub fn community_cards(&self) -> &[Card] {
        &self.community_cards
    }

    pub fn round(&self) -> u8 {
        self.round
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn heist(&self) -> HeistProgress {
        self.heist
    }

    pub fn hands_dealt(&self) -> u64 {
        self.hands_dealt
    }

    pub fn deck_remaining(&self) -> usize {
        self.deck.remaining()
    }

    pub fn current_color(&self) -> ChipColor {
        ChipColor::for_round(self.round)
    }

    /// Seats a participant. Returns `Ok(false)` when the id is already seated.
    /// Joining a hand in progress deals the newcomer two cards from the deck.
    pub fn join(&mut self, id: ParticipantId, name: String) -> Result<bool, SessionError> {
        if self.is_seated(&id) {
            return Ok(false);
        }
        if self.participants.len() >= MAX_PARTICIPANTS {
            return Err(SessionError::Full {
                session_id: self.id.clone(),
                capacity: MAX_PARTICIPANTS,
            });
        }
        let mut participant = Participant::new(id, name);
        if self.status == SessionStatus::InProgress {
            participant.hand = self.deck.draw(2)?;
        }
        self.participants.push(participant);
        Ok(true)
    }

    /// Declines commands from connections that hold no seat here.
    pub fn ensure_seated(&self, id: &str) -> Result<(), SessionError> {
        if self.is_seated(id) {
            Ok(())
        } else {
            Err(SessionError::NotSeated(id.to_string()))
        }
    }

    /// Removes a participant; the hand in progress carries on without them.
    pub fn leave(&mut self, id: &str) -> bool {
        let before = self.participants.len();
        self.participants.retain(|p| p.id != id);
        self.participants.len() != before
    }

    /// Reshuffles and deals two private cards to every participant in join order.
    /// Valid while a hand is already in progress: the old hand is discarded.
    pub fn start_hand(&mut self, config: &GameConfig) -> Result<(), SessionError> {
        let seated = self.participants.len();
        if seated < MIN_PARTICIPANTS {
            return Err(SessionError::NotEnoughParticipants {
                required: MIN_PARTICIPANTS,
                actual: seated,
            });
        }

        let dealt = self.deck.reshuffle_and_draw(2 * seated)?;
        for (participant, hand) in self.participants.iter_mut().zip(dealt.chunks(2)) {
            participant.hand = hand.to_vec();
            participant.chips.clear();
        }
        self.community_cards.clear();
        self.round = 0;
        self.status = SessionStatus::InProgress;
        self.hands_dealt += 1;
        if self.heist.status(config) != HeistStatus::Continue {
            self.heist = HeistProgress::default();
        }
        Ok(())
    }

    /// Reveals the flop (round 0 -> 1) or one more card (turn, river).
    /// Returns `Ok(false)` once the river is out.
    pub fn advance_round(&mut self) -> Result<bool, GameError> {
        if self.round >= FINAL_ROUND {
            return Ok(false);
        }
        let count = if self.round == 0 { 3 } else { 1 };
        let revealed = self.deck.draw(count)?;
        self.community_cards.extend(revealed);
        self.round += 1;
        Ok(true)
    }

    /// Discards the hand after a dealing failure and returns to `Waiting`.
    pub fn abort_hand(&mut self) {
        for participant in &mut self.participants {
            participant.hand.clear();
            participant.chips.clear();
        }
        self.community_cards.clear();
        self.round = 0;
        self.status = SessionStatus::Waiting;
    }

    pub fn pick_chip(
        &mut self,
        participant_id: &str,
        color: ChipColor,
        value: u32,
        config: &GameConfig,
    ) -> Result<(), SessionError> {
        self.ensure_seated(participant_id)?;
        let max = self.participants.len() as u32;
        if value == 0 || value > max {
            return Err(SessionError::InvalidChip { value, max });
        }
        if config.unique_chip_picks
            && self
                .participants
                .iter()
                .any(|p| p.id != participant_id && p.chip(color) == Some(value))
        {
            return Err(SessionError::ChipTaken { color, value });
        }

        if let Some(p) = self.participants.iter_mut().find(|p| p.id == participant_id) {
            p.chips.insert(color, value);
        }
        Ok(())
    }

    /// Evaluates every participant against the current board and checks their
    /// pick for the current round. Round and board are left untouched; the
    /// heist tally counts only the first showdown of each dealt hand.
    pub fn showdown(&mut self, config: &GameConfig) -> ShowdownReport {
        let color = self.current_color();
        let entries = self
            .participants
            .iter()
            .map(|p| {
                let mut cards = Vec::with_capacity(p.hand.len() + self.community_cards.len());
                cards.extend_from_slice(&p.hand);
                cards.extend_from_slice(&self.community_cards);
                Entry {
                    participant_id: p.id.clone(),
                    strength: evaluate_hand(&cards),
                    pick: p.chip(color),
                }
            })
            .collect();
        let resolution = resolve(entries);

        let settled = self.status == SessionStatus::InProgress
            && self.settled_hand != Some(self.hands_dealt);
        if settled {
            if resolution.outcome.is_winner() {
                self.heist.vaults += 1;
            } else {
                self.heist.alarms += 1;
            }
            self.settled_hand = Some(self.hands_dealt);
        }

        ShowdownReport {
            resolution,
            heist: self.heist,
            settled,
        }
    }

    #[cfg(test)]
    pub(crate) fn deck_mut(&mut self) -> &mut Deck {
        &mut self.deck
    }
}
