//! In-process fakes and fixtures shared by the unit test modules.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Weekday;
use shared::{DisplayName, GameRecord, PlayerRecord, PlayerStats, Rating, Result, SharedError};

use crate::leaderboard::gate::TimeWindowGate;
use crate::leaderboard::store::RecordStore;
use crate::leaderboard::usecase::UpdateOrchestrator;
use crate::third_party::{IdentityProvider, StatsProvider};

pub fn record(id: &str, rapid: i32) -> PlayerRecord {
    PlayerRecord {
        id: id.to_string(),
        display_name: DisplayName::default(),
        cohort_tag: String::new(),
        class_tag: String::new(),
        previous_rank: 0,
        rating_primary: Rating::new(rapid, rapid),
        rating_secondary: Rating::new(rapid - 100, rapid - 100),
        record: GameRecord::default(),
        history: Vec::new(),
        last_history_update: None,
        avatar: String::new(),
    }
}

pub fn named(id: &str, rapid: i32, first: &str, last: &str) -> PlayerRecord {
    PlayerRecord {
        display_name: DisplayName::new(first, last),
        ..record(id, rapid)
    }
}

pub fn stats(rapid: i32, best: i32, blitz: i32) -> PlayerStats {
    PlayerStats {
        rapid: Rating::new(rapid, best),
        blitz: Rating::new(blitz, blitz),
        record: GameRecord {
            wins: 10,
            losses: 5,
            draws: 2,
        },
        avatar: String::new(),
    }
}

/// Gate that accepts every instant.
pub fn open_gate() -> TimeWindowGate {
    TimeWindowGate::new(
        vec![
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ],
        0,
        chrono_tz::UTC,
    )
}

pub fn seeded_store(path: &Path, records: &[PlayerRecord]) -> Arc<RecordStore> {
    std::fs::write(path, serde_json::to_vec_pretty(records).unwrap()).unwrap();
    Arc::new(RecordStore::new(path))
}

pub fn orchestrator(store: Arc<RecordStore>, provider: Arc<FakeStatsProvider>) -> Arc<UpdateOrchestrator> {
    Arc::new(UpdateOrchestrator::new(store, provider, open_gate(), Duration::ZERO))
}

/// Serves canned stats; ids without an entry are unavailable.
#[derive(Default)]
pub struct FakeStatsProvider {
    responses: Mutex<HashMap<String, PlayerStats>>,
    calls: Mutex<Vec<String>>,
    delay: Duration,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl FakeStatsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn respond(self, id: &str, stats: PlayerStats) -> Self {
        self.responses.lock().unwrap().insert(id.to_string(), stats);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_concurrent_calls(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl StatsProvider for FakeStatsProvider {
    async fn fetch_stats(&self, player_id: &str) -> Result<PlayerStats> {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        self.calls.lock().unwrap().push(player_id.to_string());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let response = self.responses.lock().unwrap().get(player_id).cloned();
        self.active.fetch_sub(1, Ordering::SeqCst);
        response.ok_or_else(|| SharedError::ProviderUnavailable(player_id.to_string()))
    }
}

/// Maps chat user ids to names; unknown ids fail like a `user_not_found` answer.
#[derive(Default)]
pub struct FakeIdentityProvider {
    names: HashMap<String, DisplayName>,
    misconfigured: bool,
}

impl FakeIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn misconfigured() -> Self {
        Self {
            misconfigured: true,
            ..Self::default()
        }
    }

    pub fn knows(mut self, user_id: &str, first: &str, last: &str) -> Self {
        self.names.insert(user_id.to_string(), DisplayName::new(first, last));
        self
    }
}

#[async_trait::async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn profile_name(&self, user_id: &str) -> Result<DisplayName> {
        if self.misconfigured {
            return Err(SharedError::Configuration("SLACK_BOT_TOKEN is not configured".into()));
        }
        self.names
            .get(user_id)
            .cloned()
            .ok_or_else(|| SharedError::IdentityUnavailable("Slack API error: user_not_found".into()))
    }
}
