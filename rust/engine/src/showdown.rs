//! Showdown resolution: rank every hand, group exact ties, hand each group a
//! contiguous block of chip values and check every participant's pick.

use serde::{Deserialize, Serialize};

use crate::hand::{compare_hands, HandStrength};
use crate::session::ParticipantId;

/// Evaluator output for one participant together with their recorded pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub participant_id: ParticipantId,
    pub strength: HandStrength,
    pub pick: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandResult {
    pub participant_id: ParticipantId,
    #[serde(flatten)]
    pub strength: HandStrength,
}

/// Inclusive range of chip values a tie group may hold.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipRange {
    pub low: u32,
    pub high: u32,
}

impl ChipRange {
    pub fn contains(&self, value: u32) -> bool {
        (self.low..=self.high).contains(&value)
    }

    pub fn values(&self) -> impl Iterator<Item = u32> {
        self.low..=self.high
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TieGroup {
    pub members: Vec<ParticipantId>,
    pub strength: HandStrength,
    pub chip_range: ChipRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedResult {
    pub result: HandResult,
    pub chip_range: ChipRange,
    pub pick: Option<u32>,
    pub correct: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Winner,
    Loser,
}

impl Outcome {
    pub fn is_winner(self) -> bool {
        self == Outcome::Winner
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Strongest first; ties keep their input order
    pub ranked: Vec<RankedResult>,
    /// Strongest group first
    pub groups: Vec<TieGroup>,
    pub outcome: Outcome,
}

pub fn resolve(mut entries: Vec<Entry>) -> Resolution {
    // stable, so tied participants stay in join order
    entries.sort_by(|a, b| compare_hands(&b.strength, &a.strength));

    let mut groups: Vec<TieGroup> = Vec::new();
    for entry in &entries {
        match groups.last_mut() {
            Some(group) if group.strength == entry.strength => {
                group.members.push(entry.participant_id.clone());
            }
            _ => groups.push(TieGroup {
                members: vec![entry.participant_id.clone()],
                strength: entry.strength.clone(),
                chip_range: ChipRange { low: 0, high: 0 },
            }),
        }
    }

    // weakest group takes 1..=k, the next one the following block, and so on
    let mut next = 1u32;
    for group in groups.iter_mut().rev() {
        let size = group.members.len() as u32;
        group.chip_range = ChipRange {
            low: next,
            high: next + size - 1,
        };
        next += size;
    }

    let ranges: Vec<ChipRange> = groups
        .iter()
        .flat_map(|g| g.members.iter().map(move |_| g.chip_range))
        .collect();
    let mut ranked = Vec::with_capacity(entries.len());
    for (entry, chip_range) in entries.into_iter().zip(ranges) {
        let correct = entry.pick.is_some_and(|v| chip_range.contains(v));
        ranked.push(RankedResult {
            result: HandResult {
                participant_id: entry.participant_id,
                strength: entry.strength,
            },
            chip_range,
            pick: entry.pick,
            correct,
        });
    }

    let outcome = if ranked.iter().all(|r| r.correct) {
        Outcome::Winner
    } else {
        Outcome::Loser
    };

    Resolution {
        ranked,
        groups,
        outcome,
    }
}
