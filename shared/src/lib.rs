pub mod models {
    pub mod player;
    pub mod stats;
}

pub mod dto {
    pub mod update;
    pub mod slack;
}

pub mod error;

// Re-export commonly used items
pub use error::{SharedError, Result};

pub use models::{
    player::{PlayerRecord, DisplayName, Rating, GameRecord, HISTORY_DAYS},
    stats::PlayerStats,
};

pub use dto::{
    update::{UpdateOutcome, UpdateSummary},
    slack::{SlashCommandForm, DelayedResponse},
};
