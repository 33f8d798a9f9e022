use chrono::{DateTime, Utc, Weekday};
use chrono_tz::Tz;
use log::{error, info, warn};
use serde::Serialize;
use shared::UpdateOutcome;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};

use super::usecase::{outcome_of, UpdateOrchestrator};
use crate::metrics::{self, Metrics};

/// Configuration for the leaderboard scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
    /// Minutes between two ticks
    pub interval_minutes: u64,
    /// Pause between two provider calls within a cycle
    pub rate_limit_delay_seconds: f64,
    pub working_days: Vec<Weekday>,
    /// First local hour at which a cycle may run
    pub start_hour: u32,
    pub timezone: Tz,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_minutes: 5,
            rate_limit_delay_seconds: 1.0,
            working_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            start_hour: 6,
            timezone: chrono_tz::Europe::Paris,
        }
    }
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }

    /// Falls back to no delay for values `Duration` cannot hold; `Config::validate` rejects them anyway.
    pub fn rate_limit_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.rate_limit_delay_seconds).unwrap_or(Duration::ZERO)
    }
}

/// Status information for the leaderboard scheduler
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub is_running: bool,
    pub interval_minutes: u64,
    pub last_run: Option<DateTime<Utc>>,
    pub last_outcome: Option<UpdateOutcome>,
    pub next_run: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct SchedulerState {
    last_run: Option<DateTime<Utc>>,
    last_outcome: Option<UpdateOutcome>,
    next_run: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Shared {
    running: AtomicBool,
    interval_minutes: u64,
    state: RwLock<SchedulerState>,
}

impl Shared {
    fn read(&self) -> RwLockReadGuard<'_, SchedulerState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SchedulerState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
        if let Some(m) = Metrics::global() {
            metrics::set_scheduler_running(&m, running);
        }
    }
}

/// Background scheduler that refreshes the leaderboard on a fixed interval
pub struct LeaderboardScheduler;

impl LeaderboardScheduler {
    /// Spawns the tick loop. A disabled configuration yields an idle handle.
    pub fn start(config: &SchedulerConfig, orchestrator: Arc<UpdateOrchestrator>) -> SchedulerHandle {
        if !config.enabled {
            info!("Leaderboard scheduler disabled");
            return SchedulerHandle::idle(config.interval_minutes);
        }

        info!("Starting leaderboard scheduler (every {} min)", config.interval_minutes);
        Self::start_every(config.interval(), config.interval_minutes, orchestrator)
    }

    pub(crate) fn start_every(
        period: Duration,
        interval_minutes: u64,
        orchestrator: Arc<UpdateOrchestrator>,
    ) -> SchedulerHandle {
        let shared = Arc::new(Shared {
            interval_minutes,
            ..Shared::default()
        });
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        shared.set_running(true);
        let task = tokio::spawn(Self::run_scheduler_loop(
            orchestrator,
            period,
            shared.clone(),
            shutdown_rx,
        ));

        SchedulerHandle {
            shared,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    /// Main scheduler loop. The shutdown signal is only observed between ticks, so a
    /// cycle that has started always runs to completion.
    async fn run_scheduler_loop(
        orchestrator: Arc<UpdateOrchestrator>,
        period: Duration,
        shared: Arc<Shared>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!("Leaderboard scheduler loop started");

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    shared.write().next_run = next_run_after(Utc::now(), period);

                    match orchestrator.try_run().await {
                        Some(result) => {
                            let outcome = outcome_of(&result);
                            if let Err(e) = &result {
                                error!("Scheduled leaderboard update failed: {}", e);
                            }
                            let mut state = shared.write();
                            state.last_run = Some(Utc::now());
                            state.last_outcome = Some(outcome);
                        }
                        None => {
                            warn!("Previous leaderboard update still running, dropping this tick");
                            if let Some(m) = Metrics::global() {
                                metrics::record_dropped_tick(&m);
                            }
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        shared.set_running(false);
        info!("Leaderboard scheduler loop stopped");
    }
}

fn next_run_after(now: DateTime<Utc>, period: Duration) -> Option<DateTime<Utc>> {
    chrono::Duration::from_std(period)
        .ok()
        .and_then(|step| now.checked_add_signed(step))
}

/// Owned scheduler lifecycle. Dropping it without [`SchedulerHandle::stop`] also ends
/// the loop after the current tick.
pub struct SchedulerHandle {
    shared: Arc<Shared>,
    shutdown: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    fn idle(interval_minutes: u64) -> Self {
        Self {
            shared: Arc::new(Shared {
                interval_minutes,
                ..Shared::default()
            }),
            shutdown: None,
            task: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Read-only view for the HTTP layer
    pub fn monitor(&self) -> SchedulerMonitor {
        SchedulerMonitor {
            shared: self.shared.clone(),
        }
    }

    pub fn status(&self) -> SchedulerStatus {
        self.monitor().status()
    }

    /// Signals shutdown and waits for the loop, including any cycle in flight.
    pub async fn stop(&mut self) {
        let Some(shutdown) = self.shutdown.take() else {
            return;
        };

        info!("Stopping leaderboard scheduler...");
        let _ = shutdown.send(true);

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Leaderboard scheduler task ended abnormally: {}", e);
            }
        }
        self.shared.set_running(false);
    }
}

/// Cloneable status reader shared with controllers and health checks.
#[derive(Clone)]
pub struct SchedulerMonitor {
    shared: Arc<Shared>,
}

impl SchedulerMonitor {
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        self.shared.read().last_run
    }

    pub fn status(&self) -> SchedulerStatus {
        let state = self.shared.read();
        SchedulerStatus {
            is_running: self.is_running(),
            interval_minutes: self.shared.interval_minutes,
            last_run: state.last_run,
            last_outcome: state.last_outcome.clone(),
            next_run: if self.is_running() { state.next_run } else { None },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert!(config.enabled);
        assert_eq!(config.interval(), Duration::from_secs(300));
        assert_eq!(config.rate_limit_delay(), Duration::from_secs(1));
        assert_eq!(config.working_days.len(), 5);
    }

    #[test]
    fn test_rate_limit_delay_fractional_and_invalid() {
        let mut config = SchedulerConfig::default();
        config.rate_limit_delay_seconds = 0.25;
        assert_eq!(config.rate_limit_delay(), Duration::from_millis(250));

        config.rate_limit_delay_seconds = -3.0;
        assert_eq!(config.rate_limit_delay(), Duration::ZERO);
    }

    #[test]
    fn test_next_run_after() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap();
        assert_eq!(
            next_run_after(now, Duration::from_secs(300)),
            Some(Utc.with_ymd_and_hms(2025, 3, 10, 8, 5, 0).unwrap())
        );
    }
}
