//! # cardcrew-engine: Cooperative Card Session Engine
//!
//! Authoritative game logic for a cooperative hold'em style game played by 2-6
//! participants. Participants share a deck and community cards and, each
//! round, claim a chip ranking their own hand against everyone else's. The
//! showdown checks whether every claim matches the true order of the hands.
//!
//! The engine is transport-agnostic: every command returns the
//! [`events::Notification`]s a transport should deliver, addressed either to a
//! session's room or to a single connection.
//!
//! ## Core Modules
//!
//! - [`cards`] - Card representation (Suit, Rank, Card) and its wire form
//! - [`deck`] - Shuffled 52-card deck with draw-from-top
//! - [`hand`] - Best-of-five evaluation with lexicographic tie-breaks
//! - [`showdown`] - Tie groups, chip ranges and the WINNER/LOSER outcome
//! - [`session`] - One game: roster, rounds, chip picks, heist progress
//! - [`registry`] - All sessions of a process and the command entry points
//! - [`commands`] / [`events`] - Inbound commands and outbound events
//! - [`config`] - Rules shared by the sessions of a registry
//! - [`errors`] - Error types for declined commands and dealing failures
//!
//! ## Quick Start
//!
//! ```rust
//! use cardcrew_engine::cards::parse_cards;
//! use cardcrew_engine::hand::{evaluate_hand, Category};
//!
//! let cards = parse_cards("A♠ K♠ Q♠ J♠ 10♠ 2♣ 3♦").unwrap();
//! let strength = evaluate_hand(&cards);
//! assert_eq!(strength.category, Category::RoyalFlush);
//! ```
//!
//! ## Driving a Session
//!
//! ```rust
//! use cardcrew_engine::commands::Command;
//! use cardcrew_engine::config::GameConfig;
//! use cardcrew_engine::registry::SessionRegistry;
//!
//! let mut registry = SessionRegistry::new(GameConfig::default());
//! let ada = "conn-ada".to_string();
//! let bo = "conn-bo".to_string();
//!
//! registry
//!     .apply(&ada, Command::CreateSession {
//!         session_id: "g1".into(),
//!         participant_name: "Ada".into(),
//!     })
//!     .unwrap();
//! registry
//!     .apply(&bo, Command::JoinSession {
//!         session_id: "g1".into(),
//!         participant_name: "Bo".into(),
//!     })
//!     .unwrap();
//!
//! let outbox = registry
//!     .apply(&ada, Command::StartSession { session_id: "g1".into() })
//!     .unwrap();
//! assert!(!outbox.is_empty());
//! ```

pub mod cards;
pub mod commands;
pub mod config;
pub mod deck;
pub mod errors;
pub mod events;
pub mod hand;
pub mod registry;
pub mod session;
pub mod showdown;
