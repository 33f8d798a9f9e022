use serde::{Deserialize, Serialize};

use crate::models::player::{GameRecord, Rating};

/// Ratings and results fetched from the rating provider for one account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub rapid: Rating,
    pub blitz: Rating,
    pub record: GameRecord,
    #[serde(default)]
    pub avatar: String,
}
