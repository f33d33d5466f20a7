use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::cards::{Card, Rank};

/// The ten standard poker categories, weakest first. The discriminant is the
/// category rank reported to clients (High Card = 1 .. Royal Flush = 10).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    HighCard = 1,
    Pair = 2,
    TwoPair = 3,
    ThreeOfAKind = 4,
    Straight = 5,
    Flush = 6,
    FullHouse = 7,
    FourOfAKind = 8,
    StraightFlush = 9,
    RoyalFlush = 10,
}

impl Category {
    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Category::HighCard => "High Card",
            Category::Pair => "Pair",
            Category::TwoPair => "Two Pair",
            Category::ThreeOfAKind => "Three of a Kind",
            Category::Straight => "Straight",
            Category::Flush => "Flush",
            Category::FullHouse => "Full House",
            Category::FourOfAKind => "Four of a Kind",
            Category::StraightFlush => "Straight Flush",
            Category::RoyalFlush => "Royal Flush",
        }
    }
}

/// Category plus the tie-break vector used inside that category.
///
/// Field order matters: the derived `Ord` compares the category first and then
/// the tiebreakers lexicographically, which is exactly hand strength.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct HandStrength {
    pub category: Category,
    // ranks high -> low as defined per category; wheel straights use 1 for the ace
    pub tiebreakers: Vec<u8>,
}

impl Default for HandStrength {
    /// The result for fewer than five cards: High Card with no tiebreakers.
    fn default() -> Self {
        Self {
            category: Category::HighCard,
            tiebreakers: Vec::new(),
        }
    }
}

impl HandStrength {
    pub fn describe(&self) -> String {
        match (self.category, self.tiebreakers.first()) {
            (Category::HighCard, Some(&top)) => match Rank::from_u8(top) {
                Some(rank) => format!("High Card: {}", rank.token()),
                None => Category::HighCard.name().to_string(),
            },
            (category, _) => category.name().to_string(),
        }
    }
}

pub fn compare_hands(a: &HandStrength, b: &HandStrength) -> Ordering {
    match a.category.cmp(&b.category) {
        Ordering::Equal => a.tiebreakers.cmp(&b.tiebreakers),
        ord => ord,
    }
}

/// Best five-card hand among every 5-card subset of `cards`.
///
/// Fewer than five cards yield [`HandStrength::default`]. Within a category
/// the lexicographically larger tie-break vector wins, so the result does not
/// depend on the order the cards are supplied in.
pub fn evaluate_hand(cards: &[Card]) -> HandStrength {
    let n = cards.len();
    if n < 5 {
        return HandStrength::default();
    }

    let mut best: Option<HandStrength> = None;
    for a in 0..(n - 4) {
        for b in (a + 1)..(n - 3) {
            for c in (b + 1)..(n - 2) {
                for d in (c + 1)..(n - 1) {
                    for e in (d + 1)..n {
                        let five = [cards[a], cards[b], cards[c], cards[d], cards[e]];
                        let strength = evaluate_five(&five);
                        if best
                            .as_ref()
                            .is_none_or(|current| compare_hands(&strength, current).is_gt())
                        {
                            best = Some(strength);
                        }
                    }
                }
            }
        }
    }
    best.unwrap_or_default()
}

/// Classifies exactly five cards.
pub fn evaluate_five(cards: &[Card; 5]) -> HandStrength {
    let mut rank_counts = [0u8; 15]; // 2..14 used
    for c in cards {
        rank_counts[rank_val(c.rank) as usize] += 1;
    }

    let is_flush = cards.iter().all(|c| c.suit == cards[0].suit);
    let straight = straight_ranks(&rank_counts);
    let groups = rank_groups(&rank_counts);
    let grouped: Vec<u8> = groups.iter().map(|&(_, r)| r).collect();

    let (category, tiebreakers) = match (is_flush, straight) {
        (true, Some(run)) if run[0] == 14 => (Category::RoyalFlush, run.to_vec()),
        (true, Some(run)) => (Category::StraightFlush, run.to_vec()),
        (_, straight) => match (straight, groups[0].0, groups.get(1).map(|g| g.0)) {
            (_, 4, _) => (Category::FourOfAKind, grouped),
            (_, 3, Some(2)) => (Category::FullHouse, grouped),
            _ if is_flush => (Category::Flush, grouped),
            (Some(run), _, _) => (Category::Straight, run.to_vec()),
            (None, 3, _) => (Category::ThreeOfAKind, grouped),
            (None, 2, Some(2)) => (Category::TwoPair, grouped),
            (None, 2, _) => (Category::Pair, grouped),
            _ => (Category::HighCard, grouped),
        },
    };

    HandStrength {
        category,
        tiebreakers,
    }
}

fn rank_val(r: Rank) -> u8 {
    r as u8
}

/// `(count, rank)` pairs ordered by count, then rank, both descending. Reading
/// the ranks off in this order gives the tie-break vector for every
/// non-straight category.
fn rank_groups(rank_counts: &[u8; 15]) -> Vec<(u8, u8)> {
    let mut groups: Vec<(u8, u8)> = (2..=14u8)
        .filter(|&r| rank_counts[r as usize] > 0)
        .map(|r| (rank_counts[r as usize], r))
        .collect();
    groups.sort_unstable_by(|a, b| b.cmp(a));
    groups
}

/// Descending ranks of a five-card straight, with the ace written as 1 in the
/// wheel so that A-2-3-4-5 ranks below 2-3-4-5-6.
fn straight_ranks(rank_counts: &[u8; 15]) -> Option<[u8; 5]> {
    let distinct: Vec<u8> = (2..=14u8)
        .rev()
        .filter(|&r| rank_counts[r as usize] == 1)
        .collect();
    if distinct.len() != 5 {
        return None;
    }
    if distinct[0] - distinct[4] == 4 {
        return Some([distinct[0], distinct[1], distinct[2], distinct[3], distinct[4]]);
    }
    if distinct == [14, 5, 4, 3, 2] {
        return Some([5, 4, 3, 2, 1]);
    }
    None
}
