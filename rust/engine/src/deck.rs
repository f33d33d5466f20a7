use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::cards::{full_deck, Card};
use crate::errors::GameError;

/// Cards in a complete deck
pub const DECK_SIZE: usize = 52;

/// An ordered sequence of the cards not yet dealt, drawn from the top.
///
/// The RNG lives as long as the deck, so every [`Deck::shuffle`] continues the
/// stream instead of replaying a previous permutation.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
    rng: ChaCha20Rng,
}

impl Deck {
    pub fn new_with_seed(seed: u64) -> Self {
        Self::with_rng(ChaCha20Rng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::with_rng(ChaCha20Rng::from_rng(&mut rand::rng()))
    }

    fn with_rng(rng: ChaCha20Rng) -> Self {
        // Keep initial order until shuffle is called explicitly
        Self {
            cards: full_deck(),
            rng,
        }
    }

    /// Restores all 52 cards and applies an unbiased Fisher-Yates permutation.
    pub fn shuffle(&mut self) {
        self.cards = full_deck();
        self.cards.shuffle(&mut self.rng);
    }

    /// Removes and returns the top `n` cards, or fails without touching the deck.
    pub fn draw(&mut self, n: usize) -> Result<Vec<Card>, GameError> {
        if n > self.cards.len() {
            return Err(GameError::InsufficientCards {
                requested: n,
                remaining: self.cards.len(),
            });
        }
        Ok(self.cards.drain(..n).collect())
    }

    /// Reshuffles and draws `n` cards for a new hand. An oversized request is
    /// refused before the shuffle, so the deck is untouched on failure.
    pub fn reshuffle_and_draw(&mut self, n: usize) -> Result<Vec<Card>, GameError> {
        if n > DECK_SIZE {
            return Err(GameError::InsufficientCards {
                requested: n,
                remaining: DECK_SIZE,
            });
        }
        self.shuffle();
        self.draw(n)
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[cfg(test)]
    pub(crate) fn truncate(&mut self, len: usize) {
        self.cards.truncate(len);
    }
}
