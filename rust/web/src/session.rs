use crate::errors::{ErrorSeverity, IntoErrorResponse};
use crate::events::EventBus;
use cardcrew_engine::cards::Card;
use cardcrew_engine::commands::Command;
use cardcrew_engine::config::GameConfig;
use cardcrew_engine::errors::{GameError, SessionError as Declined};
use cardcrew_engine::events::{HeistSnapshot, RosterEntry};
use cardcrew_engine::registry::SessionRegistry;
use cardcrew_engine::session::{Session, SessionId, SessionStatus};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use warp::http::StatusCode;

/// Public view of one session. Private hands are never part of it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub round: u8,
    pub community_cards: Vec<Card>,
    pub participants: Vec<RosterEntry>,
    pub heist: HeistSnapshot,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub participants: usize,
    pub status: SessionStatus,
}

/// Serialises every command against the shared registry and fans the
/// resulting notifications out over the event bus.
#[derive(Debug)]
pub struct SessionManager {
    registry: Mutex<SessionRegistry>,
    event_bus: Arc<EventBus>,
}

impl SessionManager {
    pub fn new(event_bus: Arc<EventBus>, config: GameConfig) -> Self {
        Self {
            registry: Mutex::new(SessionRegistry::new(config)),
            event_bus,
        }
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    /// Applies one command for `connection_id`.
    ///
    /// After a create or join the caller is added to the session's room
    /// before anything is sent, so it sees its own roster update. Events are
    /// dispatched while the registry is still locked, which keeps the order
    /// clients observe identical to the order commands were applied in.
    pub fn handle(&self, connection_id: &str, command: Command) -> Result<(), SessionError> {
        if command == Command::Disconnect {
            return self.disconnect(connection_id);
        }
        let name = command.name();
        let target = command.session_id().cloned();
        let caller = connection_id.to_string();

        let mut registry = self.lock()?;
        let outbox = match registry.apply(&caller, command) {
            Ok(outbox) => outbox,
            Err(err) => {
                tracing::debug!(
                    connection_id = %connection_id,
                    command = name,
                    session_id = target.as_deref().unwrap_or(""),
                    reason = %err,
                    "command declined"
                );
                return Err(err.into());
            }
        };

        if let Some(session_id) = &target {
            if registry.is_seated(session_id, connection_id) {
                self.event_bus.join_room(session_id, connection_id);
            }
        }

        tracing::debug!(
            connection_id = %connection_id,
            command = name,
            session_id = target.as_deref().unwrap_or(""),
            notifications = outbox.len(),
            "command applied"
        );

        for notification in outbox {
            self.event_bus.dispatch(notification);
        }
        Ok(())
    }

    /// Drops the connection from every roster and room it belongs to.
    pub fn disconnect(&self, connection_id: &str) -> Result<(), SessionError> {
        let mut registry = self.lock()?;
        self.event_bus.leave_all(connection_id);
        let outbox = registry.disconnect(connection_id);
        tracing::info!(
            connection_id = %connection_id,
            rosters = outbox.len(),
            "connection left"
        );
        for notification in outbox {
            self.event_bus.dispatch(notification);
        }
        Ok(())
    }

    pub fn snapshot(&self, session_id: &str) -> Result<SessionSnapshot, SessionError> {
        let registry = self.lock()?;
        let session = registry
            .session(session_id)
            .ok_or_else(|| Declined::NotFound(session_id.to_string()))?;
        Ok(snapshot_of(session, registry.config()))
    }

    pub fn list(&self) -> Result<Vec<SessionSummary>, SessionError> {
        let registry = self.lock()?;
        Ok(registry
            .session_ids()
            .into_iter()
            .filter_map(|id| registry.session(&id))
            .map(|session| SessionSummary {
                session_id: session.id().clone(),
                participants: session.participants().len(),
                status: session.status(),
            })
            .collect())
    }

    fn lock(&self) -> Result<MutexGuard<'_, SessionRegistry>, SessionError> {
        self.registry
            .lock()
            .map_err(|_| SessionError::StoragePoisoned)
    }
}

fn snapshot_of(session: &Session, config: &GameConfig) -> SessionSnapshot {
    let heist = session.heist();
    SessionSnapshot {
        session_id: session.id().clone(),
        status: session.status(),
        round: session.round(),
        community_cards: session.community_cards().to_vec(),
        participants: session
            .participants()
            .iter()
            .map(|p| RosterEntry {
                id: p.id().clone(),
                name: p.name().to_string(),
                card_count: p.hand().len(),
            })
            .collect(),
        heist: HeistSnapshot::new(heist, heist.status(config)),
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Declined(#[from] Declined),
    #[error("Session storage poisoned")]
    StoragePoisoned,
}

impl IntoErrorResponse for SessionError {
    fn status_code(&self) -> StatusCode {
        match self {
            SessionError::Declined(Declined::NotFound(_)) => StatusCode::NOT_FOUND,
            SessionError::Declined(Declined::NotSeated(_)) => StatusCode::FORBIDDEN,
            SessionError::Declined(Declined::InvalidChip { .. }) => StatusCode::BAD_REQUEST,
            SessionError::Declined(
                Declined::Full { .. }
                | Declined::NotEnoughParticipants { .. }
                | Declined::ChipTaken { .. },
            ) => StatusCode::CONFLICT,
            SessionError::Declined(Declined::Game(GameError::InsufficientCards { .. }))
            | SessionError::StoragePoisoned => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            SessionError::Declined(err) => match err {
                Declined::NotFound(_) => "session_not_found",
                Declined::Full { .. } => "session_full",
                Declined::NotEnoughParticipants { .. } => "not_enough_participants",
                Declined::NotSeated(_) => "not_seated",
                Declined::InvalidChip { .. } => "invalid_chip",
                Declined::ChipTaken { .. } => "chip_taken",
                Declined::Game(_) => "insufficient_cards",
            },
            SessionError::StoragePoisoned => "session_storage_error",
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            SessionError::Declined(Declined::NotFound(id)) => {
                Some(serde_json::json!({ "session_id": id }))
            }
            SessionError::Declined(Declined::Full {
                session_id,
                capacity,
            }) => Some(serde_json::json!({
                "session_id": session_id,
                "capacity": capacity
            })),
            _ => None,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            SessionError::StoragePoisoned => ErrorSeverity::Critical,
            SessionError::Declined(Declined::Game(_)) => ErrorSeverity::Server,
            SessionError::Declined(_) => ErrorSeverity::Client,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardcrew_engine::events::GameEvent;
    use cardcrew_engine::session::ChipColor;

    fn manager() -> (Arc<EventBus>, SessionManager) {
        let bus = Arc::new(EventBus::new());
        let config = GameConfig {
            seed: Some(3),
            ..GameConfig::default()
        };
        (Arc::clone(&bus), SessionManager::new(bus, config))
    }

    fn create(session_id: &str, name: &str) -> Command {
        Command::CreateSession {
            session_id: session_id.into(),
            participant_name: name.into(),
        }
    }

    fn join(session_id: &str, name: &str) -> Command {
        Command::JoinSession {
            session_id: session_id.into(),
            participant_name: name.into(),
        }
    }

    #[test]
    fn creator_sees_session_created_then_roster() {
        let (bus, sessions) = manager();
        let mut events = bus.register("c1".into());

        sessions.handle("c1", create("g1", "Ada")).expect("create");

        let first = events.receiver.try_recv().expect("created");
        assert!(matches!(first, GameEvent::SessionCreated { .. }));
        let second = events.receiver.try_recv().expect("roster");
        assert!(matches!(second, GameEvent::RosterUpdated { .. }));
        assert_eq!(bus.room_size("g1"), 1);
    }

    #[test]
    fn declined_command_sends_nothing() {
        let (bus, sessions) = manager();
        let mut events = bus.register("c1".into());

        let err = sessions
            .handle("c1", join("missing", "Ada"))
            .expect_err("unknown session");
        assert_eq!(err.error_code(), "session_not_found");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert!(events.receiver.try_recv().is_err());
        assert_eq!(bus.room_size("missing"), 0);
    }

    #[test]
    fn rejected_joiner_is_not_added_to_the_room() {
        let (bus, sessions) = manager();
        let _held: Vec<_> = (0..7).map(|i| bus.register(format!("c{i}"))).collect();
        sessions.handle("c0", create("g1", "P0")).expect("create");
        for i in 1..6 {
            sessions
                .handle(&format!("c{i}"), join("g1", "P"))
                .expect("seat");
        }

        let err = sessions.handle("c6", join("g1", "late")).expect_err("full");
        assert_eq!(err.error_code(), "session_full");
        assert_eq!(bus.room_size("g1"), 6);
    }

    #[test]
    fn hands_stay_private_across_the_room() {
        let (bus, sessions) = manager();
        let mut a = bus.register("a".into());
        let mut b = bus.register("b".into());
        sessions.handle("a", create("g1", "Ada")).expect("create");
        sessions.handle("b", join("g1", "Bo")).expect("join");
        while a.receiver.try_recv().is_ok() {}
        while b.receiver.try_recv().is_ok() {}

        sessions
            .handle("a", Command::StartSession { session_id: "g1".into() })
            .expect("start");

        let drain = |rx: &mut crate::events::EventReceiver| {
            let mut out = Vec::new();
            while let Ok(ev) = rx.try_recv() {
                out.push(ev);
            }
            out
        };
        let for_a = drain(&mut a.receiver);
        let for_b = drain(&mut b.receiver);
        let dealt = |evs: &[GameEvent]| {
            evs.iter()
                .filter(|e| matches!(e, GameEvent::HandDealt { .. }))
                .count()
        };
        assert_eq!(dealt(&for_a), 1);
        assert_eq!(dealt(&for_b), 1);
        assert_ne!(
            for_a.iter().find(|e| matches!(e, GameEvent::HandDealt { .. })),
            for_b.iter().find(|e| matches!(e, GameEvent::HandDealt { .. }))
        );
    }

    #[test]
    fn disconnect_updates_the_remaining_room() {
        let (bus, sessions) = manager();
        let mut a = bus.register("a".into());
        let _b = bus.register("b".into());
        sessions.handle("a", create("g1", "Ada")).expect("create");
        sessions.handle("b", join("g1", "Bo")).expect("join");
        while a.receiver.try_recv().is_ok() {}

        sessions.disconnect("b").expect("disconnect");

        match a.receiver.try_recv().expect("roster") {
            GameEvent::RosterUpdated { participants, .. } => {
                assert_eq!(participants.len(), 1);
                assert_eq!(participants[0].id, "a");
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(bus.room_size("g1"), 1);
    }

    #[test]
    fn snapshot_hides_hands_and_reports_heist() {
        let (_bus, sessions) = manager();
        sessions.handle("a", create("g1", "Ada")).expect("create");
        sessions.handle("b", join("g1", "Bo")).expect("join");
        sessions
            .handle("a", Command::StartSession { session_id: "g1".into() })
            .expect("start");
        sessions
            .handle(
                "a",
                Command::PickChip {
                    session_id: "g1".into(),
                    round_key: ChipColor::White,
                    value: 1,
                },
            )
            .expect("pick");

        let snapshot = sessions.snapshot("g1").expect("snapshot");
        assert_eq!(snapshot.status, SessionStatus::InProgress);
        assert!(snapshot.participants.iter().all(|p| p.card_count == 2));
        let json = serde_json::to_value(&snapshot).expect("serialize");
        assert!(json["participants"][0].get("hand").is_none());
        assert_eq!(json["heist"]["vaults"], 0);

        let summaries = sessions.list().expect("list");
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].participants, 2);
    }

    #[test]
    fn declined_commands_are_logged_with_context() {
        use crate::logging::TestLogSubscriber;
        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::Registry;

        let (_bus, sessions) = manager();
        let logs = TestLogSubscriber::new();
        let registry = Registry::default().with(logs.clone().into_layer::<Registry>());

        tracing::subscriber::with_default(registry, || {
            let _ = sessions.handle("c1", Command::StartSession { session_id: "g9".into() });
        });

        let declined = logs.with_message("command declined");
        assert_eq!(declined.len(), 1);
        assert_eq!(declined[0].field("command"), Some("start_session"));
        assert_eq!(declined[0].field("session_id"), Some("g9"));
        assert_eq!(declined[0].field("connection_id"), Some("c1"));
    }

    #[test]
    fn storage_poisoning_is_critical() {
        let err = SessionError::StoragePoisoned;
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
