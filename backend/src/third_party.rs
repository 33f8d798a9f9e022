use shared::{DisplayName, PlayerStats, Result};

pub mod chess_com {
    pub mod stats;
}

pub mod slack {
    pub mod users;
}

// Re-export commonly used services for convenience
pub use chess_com::stats::ChessComService;
pub use slack::users::SlackService;

/// Source of current ratings. Any provider-side failure surfaces as
/// `SharedError::ProviderUnavailable`, with the detail only logged.
#[async_trait::async_trait]
pub trait StatsProvider: Send + Sync {
    async fn fetch_stats(&self, player_id: &str) -> Result<PlayerStats>;
}

/// Resolves an external identity token (chat user id) to a person's name.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn profile_name(&self, user_id: &str) -> Result<DisplayName>;
}

/// Delivers a text message to the address a command asked to be answered on.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, response_url: &str, text: &str) -> Result<()>;
}
