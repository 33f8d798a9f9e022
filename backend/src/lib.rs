pub mod config;
pub mod error;
pub mod health;
pub mod metrics;
pub mod middleware;
pub mod third_party;

pub mod leaderboard {
    pub mod controller;
    pub mod gate;
    pub mod history;
    pub mod lifecycle;
    pub mod ranking;
    pub mod roster;
    pub mod scheduler;
    pub mod store;
    pub mod usecase;

    pub use controller::LeaderboardController;
    pub use gate::{GateRefusal, TimeWindowGate};
    pub use roster::RosterService;
    pub use scheduler::{LeaderboardScheduler, SchedulerConfig, SchedulerHandle, SchedulerMonitor, SchedulerStatus};
    pub use store::RecordStore;
    pub use usecase::{CycleReport, UpdateOrchestrator};
}

// Unit test modules only
#[cfg(test)]
mod test_support;




#[cfg(test)]
mod roster_tests;
