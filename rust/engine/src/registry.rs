use std::collections::HashMap;

use crate::commands::Command;
use crate::config::GameConfig;
use crate::deck::Deck;
use crate::errors::SessionError;
use crate::events::{
    ChipState, GameEvent, HeistSnapshot, Notification, RosterEntry, ShowdownEntry,
};
use crate::session::{ParticipantId, Session, SessionId};

/// Owns every session of the process. Commands run one at a time against it
/// and return the notifications the transport should deliver.
///
/// An `Err` from any command means it was declined and nothing changed.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,
    config: GameConfig,
    created: u64,
}

pub type Outbox = Vec<Notification>;

impl SessionRegistry {
    pub fn new(config: GameConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            config,
            created: 0,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn session(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.sessions.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn is_seated(&self, session_id: &str, participant: &str) -> bool {
        self.sessions
            .get(session_id)
            .is_some_and(|s| s.is_seated(participant))
    }

    /// Routes a command from `caller` to the matching operation.
    pub fn apply(
        &mut self,
        caller: &ParticipantId,
        command: Command,
    ) -> Result<Outbox, SessionError> {
        match command {
            Command::CreateSession {
                session_id,
                participant_name,
            } => self.create_session(caller, session_id, participant_name),
            Command::JoinSession {
                session_id,
                participant_name,
            } => self.join_session(caller, &session_id, participant_name),
            Command::StartSession { session_id } => self.start_session(caller, &session_id),
            Command::PickChip {
                session_id,
                round_key,
                value,
            } => {
                let config = self.config.clone();
                let session = self.get_mut(&session_id)?;
                session.pick_chip(caller, round_key, value, &config)?;
                Ok(vec![chip_state(session)])
            }
            Command::AdvanceRound { session_id } => self.advance_round(caller, &session_id),
            Command::Showdown { session_id } => self.showdown(caller, &session_id),
            Command::Disconnect => Ok(self.disconnect(caller)),
        }
    }

    /// Creates the session if absent and seats the caller. Creating a session
    /// that exists is not an error; seating follows the join rules and a full
    /// roster simply leaves the caller unseated.
    pub fn create_session(
        &mut self,
        caller: &ParticipantId,
        session_id: SessionId,
        name: String,
    ) -> Result<Outbox, SessionError> {
        if !self.sessions.contains_key(&session_id) {
            let deck = match self.config.seed {
                Some(seed) => Deck::new_with_seed(seed.wrapping_add(self.created)),
                None => Deck::from_entropy(),
            };
            self.created += 1;
            self.sessions
                .insert(session_id.clone(), Session::new(session_id.clone(), deck));
        }

        let mut outbox = vec![Notification::to(
            caller,
            GameEvent::SessionCreated {
                session_id: session_id.clone(),
            },
        )];
        if let Ok(joined) = self.join_session(caller, &session_id, name) {
            outbox.extend(joined);
        }
        Ok(outbox)
    }

    pub fn join_session(
        &mut self,
        caller: &ParticipantId,
        session_id: &str,
        name: String,
    ) -> Result<Outbox, SessionError> {
        let session = self.get_mut(session_id)?;
        if !session.join(caller.clone(), name)? {
            return Ok(Vec::new());
        }

        let mut outbox = Vec::with_capacity(2);
        if let Some(joined) = session.participant(caller).filter(|p| !p.hand().is_empty()) {
            outbox.push(Notification::to(
                caller,
                GameEvent::HandDealt {
                    session_id: session.id().clone(),
                    hand: joined.hand().to_vec(),
                    round: session.round(),
                },
            ));
        }
        outbox.push(roster(session));
        Ok(outbox)
    }

    /// Deals a new hand. Only a seated participant may start it.
    pub fn start_session(
        &mut self,
        caller: &str,
        session_id: &str,
    ) -> Result<Outbox, SessionError> {
        let config = self.config.clone();
        let session = self.get_mut(session_id)?;
        session.ensure_seated(caller)?;
        session.start_hand(&config)?;

        let mut outbox: Outbox = session
            .participants()
            .iter()
            .map(|p| {
                Notification::to(
                    p.id(),
                    GameEvent::HandDealt {
                        session_id: session.id().clone(),
                        hand: p.hand().to_vec(),
                        round: session.round(),
                    },
                )
            })
            .collect();
        outbox.push(roster(session));
        outbox.push(round_update(session));
        Ok(outbox)
    }

    /// Reveals the next community cards. Past the river this is a no-op with no
    /// notifications; a dealing failure aborts the hand for the whole room.
    pub fn advance_round(
        &mut self,
        caller: &str,
        session_id: &str,
    ) -> Result<Outbox, SessionError> {
        let session = self.get_mut(session_id)?;
        session.ensure_seated(caller)?;
        match session.advance_round() {
            Ok(true) => Ok(vec![round_update(session)]),
            Ok(false) => Ok(Vec::new()),
            Err(err) => {
                session.abort_hand();
                Ok(vec![
                    Notification::room(
                        session.id(),
                        GameEvent::HandAborted {
                            session_id: session.id().clone(),
                            reason: err.to_string(),
                        },
                    ),
                    roster(session),
                ])
            }
        }
    }

    pub fn showdown(&mut self, caller: &str, session_id: &str) -> Result<Outbox, SessionError> {
        let config = self.config.clone();
        let session = self.get_mut(session_id)?;
        session.ensure_seated(caller)?;
        let report = session.showdown(&config);

        let results = report
            .resolution
            .ranked
            .iter()
            .map(|r| {
                let participant = session.participant(&r.result.participant_id);
                let strength = &r.result.strength;
                ShowdownEntry {
                    participant_id: r.result.participant_id.clone(),
                    name: participant.map(|p| p.name().to_string()).unwrap_or_default(),
                    hand: participant.map(|p| p.hand().to_vec()).unwrap_or_default(),
                    category: strength.category,
                    rank: strength.category.rank(),
                    tiebreakers: strength.tiebreakers.clone(),
                    description: strength.describe(),
                    chip_range: r.chip_range,
                    pick: r.pick,
                }
            })
            .collect();

        Ok(vec![Notification::room(
            session.id(),
            GameEvent::ShowdownResult {
                session_id: session.id().clone(),
                results,
                outcome: report.resolution.outcome,
                heist: HeistSnapshot::new(report.heist, report.heist.status(&config)),
            },
        )])
    }

    /// Removes the caller from every roster it sits in. Empty sessions stay.
    pub fn disconnect(&mut self, caller: &str) -> Outbox {
        let mut ids: Vec<SessionId> = self.sessions.keys().cloned().collect();
        ids.sort();

        let mut outbox = Vec::new();
        for id in ids {
            if let Some(session) = self.sessions.get_mut(&id) {
                if session.leave(caller) {
                    outbox.push(roster(session));
                }
            }
        }
        outbox
    }

    fn get_mut(&mut self, session_id: &str) -> Result<&mut Session, SessionError> {
        self.sessions
            .get_mut(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }

    #[cfg(test)]
    pub(crate) fn session_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }
}

pub fn roster(session: &Session) -> Notification {
    Notification::room(
        session.id(),
        GameEvent::RosterUpdated {
            session_id: session.id().clone(),
            status: session.status(),
            participants: session
                .participants()
                .iter()
                .map(|p| RosterEntry {
                    id: p.id().clone(),
                    name: p.name().to_string(),
                    card_count: p.hand().len(),
                })
                .collect(),
        },
    )
}

fn round_update(session: &Session) -> Notification {
    Notification::room(
        session.id(),
        GameEvent::RoundUpdated {
            session_id: session.id().clone(),
            round: session.round(),
            community_cards: session.community_cards().to_vec(),
        },
    )
}

fn chip_state(session: &Session) -> Notification {
    Notification::room(
        session.id(),
        GameEvent::ChipStateUpdated {
            session_id: session.id().clone(),
            participants: session
                .participants()
                .iter()
                .map(|p| ChipState {
                    id: p.id().clone(),
                    name: p.name().to_string(),
                    chips: p.chips().clone(),
                })
                .collect(),
        },
    )
}
