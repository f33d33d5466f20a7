use serde::{Deserialize, Serialize};

/// Rules shared by every session of a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Deterministic dealing when set; each new session offsets the seed by its
    /// creation order so sessions do not mirror each other.
    pub seed: Option<u64>,
    /// Reject a chip value another participant already holds for the same round
    pub unique_chip_picks: bool,
    pub vaults_to_win: u32,
    pub alarms_to_lose: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: None,
            unique_chip_picks: false,
            vaults_to_win: 3,
            alarms_to_lose: 3,
        }
    }
}
