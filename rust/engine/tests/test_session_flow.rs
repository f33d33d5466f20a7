use std::collections::HashSet;

use cardcrew_engine::cards::Card;
use cardcrew_engine::commands::Command;
use cardcrew_engine::config::GameConfig;
use cardcrew_engine::errors::SessionError;
use cardcrew_engine::events::{Audience, GameEvent, Notification};
use cardcrew_engine::hand::{compare_hands, evaluate_hand};
use cardcrew_engine::registry::SessionRegistry;
use cardcrew_engine::session::{ChipColor, SessionStatus, MAX_PARTICIPANTS};
use cardcrew_engine::showdown::Outcome;

fn registry() -> SessionRegistry {
    SessionRegistry::new(GameConfig {
        seed: Some(7),
        ..GameConfig::default()
    })
}

fn create(reg: &mut SessionRegistry, caller: &str, session: &str, name: &str) -> Vec<Notification> {
    reg.apply(
        &caller.to_string(),
        Command::CreateSession {
            session_id: session.into(),
            participant_name: name.into(),
        },
    )
    .expect("create")
}

fn join(
    reg: &mut SessionRegistry,
    caller: &str,
    session: &str,
    name: &str,
) -> Result<Vec<Notification>, SessionError> {
    reg.apply(
        &caller.to_string(),
        Command::JoinSession {
            session_id: session.into(),
            participant_name: name.into(),
        },
    )
}

fn run(reg: &mut SessionRegistry, caller: &str, cmd: Command) -> Vec<Notification> {
    reg.apply(&caller.to_string(), cmd).expect("command applies")
}

fn hand_of(outbox: &[Notification], who: &str) -> Vec<Card> {
    outbox
        .iter()
        .find_map(|n| match (&n.audience, &n.event) {
            (Audience::Connection(id), GameEvent::HandDealt { hand, .. }) if id == who => {
                Some(hand.clone())
            }
            _ => None,
        })
        .expect("hand dealt to participant")
}

#[test]
fn two_player_hand_end_to_end() {
    let mut reg = registry();
    create(&mut reg, "A", "g1", "Alice");
    join(&mut reg, "B", "g1", "Bob").expect("join");

    let dealt = run(&mut reg, "A", Command::StartSession { session_id: "g1".into() });
    let a_hand = hand_of(&dealt, "A");
    let b_hand = hand_of(&dealt, "B");
    assert_eq!(a_hand.len(), 2);
    assert_eq!(b_hand.len(), 2);
    let mut all: HashSet<Card> = a_hand.iter().copied().collect();
    all.extend(b_hand.iter().copied());
    assert_eq!(all.len(), 4, "private hands must be disjoint");
    assert_eq!(reg.session("g1").expect("session").deck_remaining(), 48);

    for _ in 0..3 {
        run(&mut reg, "A", Command::AdvanceRound { session_id: "g1".into() });
    }
    let session = reg.session("g1").expect("session");
    let board = session.community_cards().to_vec();
    assert_eq!(board.len(), 5);
    assert_eq!(session.round(), 3);
    for card in &board {
        assert!(all.insert(*card), "board card {card} was already dealt");
    }

    let strength = |hand: &[Card]| {
        let mut cards = hand.to_vec();
        cards.extend_from_slice(&board);
        evaluate_hand(&cards)
    };
    let order = compare_hands(&strength(&a_hand), &strength(&b_hand));
    let (a_pick, b_pick) = if order.is_ge() { (2, 1) } else { (1, 2) };
    for (who, value) in [("A", a_pick), ("B", b_pick)] {
        run(
            &mut reg,
            who,
            Command::PickChip {
                session_id: "g1".into(),
                round_key: ChipColor::Red,
                value,
            },
        );
    }

    let outbox = run(&mut reg, "A", Command::Showdown { session_id: "g1".into() });
    let GameEvent::ShowdownResult {
        outcome, results, ..
    } = &outbox[0].event
    else {
        panic!("expected showdown result, got {:?}", outbox[0].event);
    };
    // a tie puts both in {1,2}, so either pick is right
    assert_eq!(*outcome, Outcome::Winner);
    assert_eq!(results.len(), 2);
    assert_eq!(outbox[0].audience, Audience::Room("g1".into()));
}

#[test]
fn swapped_chips_lose_unless_tied() {
    let mut reg = registry();
    create(&mut reg, "A", "g1", "Alice");
    join(&mut reg, "B", "g1", "Bob").expect("join");
    let dealt = run(&mut reg, "A", Command::StartSession { session_id: "g1".into() });
    for _ in 0..3 {
        run(&mut reg, "A", Command::AdvanceRound { session_id: "g1".into() });
    }
    let board = reg.session("g1").expect("session").community_cards().to_vec();
    let strength = |who: &str| {
        let mut cards = hand_of(&dealt, who);
        cards.extend_from_slice(&board);
        evaluate_hand(&cards)
    };
    let order = compare_hands(&strength("A"), &strength("B"));
    let (a_pick, b_pick) = if order.is_ge() { (1, 2) } else { (2, 1) };
    for (who, value) in [("A", a_pick), ("B", b_pick)] {
        run(
            &mut reg,
            who,
            Command::PickChip {
                session_id: "g1".into(),
                round_key: ChipColor::Red,
                value,
            },
        );
    }

    let outbox = run(&mut reg, "A", Command::Showdown { session_id: "g1".into() });
    let GameEvent::ShowdownResult { outcome, .. } = &outbox[0].event else {
        panic!("expected showdown result");
    };
    let expected = if order.is_eq() {
        Outcome::Winner
    } else {
        Outcome::Loser
    };
    assert_eq!(*outcome, expected);
}

#[test]
fn seventh_participant_is_rejected() {
    let mut reg = registry();
    create(&mut reg, "p0", "full", "P0");
    for i in 1..MAX_PARTICIPANTS {
        join(&mut reg, &format!("p{i}"), "full", &format!("P{i}")).expect("seat");
    }
    assert_eq!(
        join(&mut reg, "p6", "full", "P6"),
        Err(SessionError::Full {
            session_id: "full".into(),
            capacity: 6
        })
    );
    assert_eq!(reg.session("full").expect("session").participants().len(), 6);
}

#[test]
fn create_on_a_full_session_still_answers_but_does_not_seat() {
    let mut reg = registry();
    create(&mut reg, "p0", "full", "P0");
    for i in 1..MAX_PARTICIPANTS {
        join(&mut reg, &format!("p{i}"), "full", &format!("P{i}")).expect("seat");
    }
    let outbox = create(&mut reg, "late", "full", "Late");
    assert_eq!(outbox.len(), 1);
    assert!(matches!(outbox[0].event, GameEvent::SessionCreated { .. }));
    assert!(!reg.is_seated("full", "late"));
}

#[test]
fn start_with_single_participant_is_declined() {
    let mut reg = registry();
    create(&mut reg, "A", "solo", "Alice");
    let result = reg.apply(&"A".to_string(), Command::StartSession { session_id: "solo".into() });
    assert!(matches!(
        result,
        Err(SessionError::NotEnoughParticipants { .. })
    ));
    let session = reg.session("solo").expect("session");
    assert_eq!(session.status(), SessionStatus::Waiting);
    assert_eq!(session.hands_dealt(), 0);
}

#[test]
fn restart_mid_hand_deals_fresh_cards() {
    let mut reg = registry();
    create(&mut reg, "A", "g1", "Alice");
    join(&mut reg, "B", "g1", "Bob").expect("join");
    run(&mut reg, "A", Command::StartSession { session_id: "g1".into() });
    run(&mut reg, "A", Command::AdvanceRound { session_id: "g1".into() });
    run(
        &mut reg,
        "B",
        Command::PickChip {
            session_id: "g1".into(),
            round_key: ChipColor::Yellow,
            value: 1,
        },
    );

    run(&mut reg, "B", Command::StartSession { session_id: "g1".into() });
    let session = reg.session("g1").expect("session");
    assert_eq!(session.status(), SessionStatus::InProgress);
    assert_eq!(session.round(), 0);
    assert!(session.community_cards().is_empty());
    assert_eq!(session.deck_remaining(), 48);
    assert!(session.participants().iter().all(|p| p.chips().is_empty()));
}

#[test]
fn departure_mid_hand_drops_participant_from_showdown() {
    let mut reg = registry();
    create(&mut reg, "A", "g1", "Alice");
    join(&mut reg, "B", "g1", "Bob").expect("join");
    join(&mut reg, "C", "g1", "Cy").expect("join");
    run(&mut reg, "A", Command::StartSession { session_id: "g1".into() });

    let left = run(&mut reg, "C", Command::Disconnect);
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].audience, Audience::Room("g1".into()));

    let outbox = run(&mut reg, "A", Command::Showdown { session_id: "g1".into() });
    let GameEvent::ShowdownResult { results, .. } = &outbox[0].event else {
        panic!("expected showdown result");
    };
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.participant_id != "C"));
}

#[test]
fn sessions_do_not_interfere() {
    let mut reg = registry();
    create(&mut reg, "A", "g1", "Alice");
    join(&mut reg, "B", "g1", "Bob").expect("join");
    create(&mut reg, "C", "g2", "Cy");
    join(&mut reg, "D", "g2", "Di").expect("join");

    run(&mut reg, "A", Command::StartSession { session_id: "g1".into() });
    run(&mut reg, "A", Command::AdvanceRound { session_id: "g1".into() });

    let g2 = reg.session("g2").expect("g2");
    assert_eq!(g2.status(), SessionStatus::Waiting);
    assert_eq!(g2.round(), 0);
    assert!(g2.participants().iter().all(|p| p.hand().is_empty()));
}

#[test]
fn heist_tally_follows_showdowns() {
    let mut reg = SessionRegistry::new(GameConfig {
        seed: Some(11),
        alarms_to_lose: 2,
        ..GameConfig::default()
    });
    create(&mut reg, "A", "g1", "Alice");
    join(&mut reg, "B", "g1", "Bob").expect("join");

    for hand in 1..=2u32 {
        run(&mut reg, "A", Command::StartSession { session_id: "g1".into() });
        // no picks at all, so every showdown trips an alarm
        run(&mut reg, "A", Command::Showdown { session_id: "g1".into() });
        let outbox = run(&mut reg, "A", Command::Showdown { session_id: "g1".into() });
        let GameEvent::ShowdownResult { heist, outcome, .. } = &outbox[0].event else {
            panic!("expected showdown result");
        };
        assert_eq!(*outcome, Outcome::Loser);
        assert_eq!(heist.alarms, hand);
    }
    let heist = reg.session("g1").expect("session").heist();
    assert_eq!(heist.alarms, 2);
}

#[test]
fn joining_mid_hand_deals_two_cards() {
    let mut reg = registry();
    create(&mut reg, "A", "g1", "Alice");
    join(&mut reg, "B", "g1", "Bob").expect("join");
    let dealt = run(&mut reg, "A", Command::StartSession { session_id: "g1".into() });
    let joined = join(&mut reg, "C", "g1", "Cy").expect("late join");

    let late = hand_of(&joined, "C");
    let mut cards: HashSet<Card> = late.iter().copied().collect();
    cards.extend(hand_of(&dealt, "A"));
    cards.extend(hand_of(&dealt, "B"));
    assert_eq!(cards.len(), 6);

    let session = reg.session("g1").expect("session");
    assert_eq!(session.status(), SessionStatus::InProgress);
    let sizes: Vec<usize> = session.participants().iter().map(|p| p.hand().len()).collect();
    assert_eq!(sizes, vec![2, 2, 2]);
    assert_eq!(session.deck_remaining(), 46);
}

#[test]
fn only_seated_participants_drive_a_session() {
    let mut reg = registry();
    create(&mut reg, "A", "g1", "Alice");
    join(&mut reg, "B", "g1", "Bob").expect("join");
    run(&mut reg, "A", Command::StartSession { session_id: "g1".into() });

    let outsider = "outsider".to_string();
    for cmd in [
        Command::AdvanceRound { session_id: "g1".into() },
        Command::StartSession { session_id: "g1".into() },
        Command::Showdown { session_id: "g1".into() },
    ] {
        assert_eq!(
            reg.apply(&outsider, cmd),
            Err(SessionError::NotSeated("outsider".into()))
        );
    }

    let session = reg.session("g1").expect("session");
    assert_eq!(session.round(), 0);
    assert_eq!(session.hands_dealt(), 1);
    assert_eq!(session.heist().alarms, 0);
    assert_eq!(session.heist().vaults, 0);
}
