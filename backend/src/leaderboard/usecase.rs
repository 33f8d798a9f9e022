use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Datelike, Utc};
use log::{debug, error, info, warn};
use shared::{Result, UpdateOutcome, UpdateSummary};

use super::gate::{GateRefusal, TimeWindowGate};
use super::history::update_history;
use super::lifecycle::remove_expired;
use super::ranking::{rank, sort_by_primary};
use super::store::RecordStore;
use crate::metrics::{self, Metrics};
use crate::third_party::StatsProvider;

pub const OUTSIDE_WINDOW_MESSAGE: &str = "Outside working hours";

/// How a cycle that reached a decision ended. Store failures are the `Err` side of
/// [`UpdateOrchestrator::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleReport {
    Updated(UpdateSummary),
    Skipped(GateRefusal),
    NoSuccessfulUpdates(UpdateSummary),
}

impl CycleReport {
    pub fn is_success(&self) -> bool {
        matches!(self, CycleReport::Updated(_))
    }

    pub fn to_outcome(&self) -> UpdateOutcome {
        match self {
            CycleReport::Updated(summary) => UpdateOutcome::completed(*summary),
            CycleReport::Skipped(_) => UpdateOutcome::skipped(OUTSIDE_WINDOW_MESSAGE),
            CycleReport::NoSuccessfulUpdates(summary) => UpdateOutcome::no_updates(*summary),
        }
    }

    fn metric_label(&self) -> &'static str {
        match self {
            CycleReport::Updated(_) => "success",
            CycleReport::Skipped(_) => "skipped",
            CycleReport::NoSuccessfulUpdates(_) => "no_updates",
        }
    }
}

/// Wire outcome for a finished cycle, store failures included.
pub fn outcome_of(result: &Result<CycleReport>) -> UpdateOutcome {
    match result {
        Ok(report) => report.to_outcome(),
        Err(e) => UpdateOutcome::failed(e.to_string()),
    }
}

/// Sequences one refresh of the whole leaderboard under the store guard.
pub struct UpdateOrchestrator {
    store: Arc<RecordStore>,
    provider: Arc<dyn StatsProvider>,
    gate: TimeWindowGate,
    rate_limit_delay: Duration,
    in_flight: AtomicUsize,
}

/// Decrements the in-flight counter however the cycle exits.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl UpdateOrchestrator {
    pub fn new(
        store: Arc<RecordStore>,
        provider: Arc<dyn StatsProvider>,
        gate: TimeWindowGate,
        rate_limit_delay: Duration,
    ) -> Self {
        Self {
            store,
            provider,
            gate,
            rate_limit_delay,
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// On-demand entry point. Waits behind any cycle or roster command holding the guard.
    pub async fn run(&self) -> Result<CycleReport> {
        self.run_at(Utc::now()).await
    }

    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<CycleReport> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);
        self.execute(now).await
    }

    /// Scheduled entry point: returns `None` without doing anything when another cycle
    /// is already running.
    pub async fn try_run(&self) -> Option<Result<CycleReport>> {
        self.try_run_at(Utc::now()).await
    }

    pub async fn try_run_at(&self, now: DateTime<Utc>) -> Option<Result<CycleReport>> {
        if self
            .in_flight
            .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return None;
        }
        let _in_flight = InFlight(&self.in_flight);
        Some(self.execute(now).await)
    }

    async fn execute(&self, now: DateTime<Utc>) -> Result<CycleReport> {
        let started = Instant::now();
        let result = self.cycle(now).await;

        let label = match &result {
            Ok(report) => report.metric_label(),
            Err(_) => "failed",
        };
        if let Some(m) = Metrics::global() {
            metrics::record_update_cycle(&m, label, started.elapsed());
        }
        result
    }

    async fn cycle(&self, now: DateTime<Utc>) -> Result<CycleReport> {
        if let Err(refusal) = self.gate.check(now) {
            info!("Skipping leaderboard update: {:?}", refusal);
            return Ok(CycleReport::Skipped(refusal));
        }

        let local_now = now.with_timezone(&self.gate.timezone());
        let today = local_now.date_naive();

        let session = self.store.exclusive().await;
        let records = session.load().await.map_err(|e| {
            error!("Failed to load players: {}", e);
            e
        })?;

        let (records, removed) = remove_expired(records, local_now.year());
        let mut records = rank(records);

        info!("Updating {} players...", records.len());
        let mut updated = 0;
        let mut errors = 0;

        for (index, record) in records.iter_mut().enumerate() {
            if index > 0 && !self.rate_limit_delay.is_zero() {
                tokio::time::sleep(self.rate_limit_delay).await;
            }

            match self.provider.fetch_stats(&record.id).await {
                Ok(stats) => {
                    record.apply_stats(&stats);
                    let observed = record.rating_primary.current;
                    update_history(record, observed, today);
                    debug!(
                        "{}: rapid {} / blitz {}",
                        record.id, record.rating_primary.current, record.rating_secondary.current
                    );
                    updated += 1;
                    if let Some(m) = Metrics::global() {
                        metrics::record_provider_fetch(&m, "ok");
                    }
                }
                Err(e) => {
                    warn!("Keeping previous data for {}: {}", record.id, e);
                    errors += 1;
                    if let Some(m) = Metrics::global() {
                        metrics::record_provider_fetch(&m, "unavailable");
                    }
                }
            }
        }

        sort_by_primary(&mut records);

        let summary = UpdateSummary {
            updated,
            errors,
            removed: removed.len(),
            total: records.len(),
        };

        if updated == 0 {
            error!("No successful updates, not saving {}", session.path().display());
            return Ok(CycleReport::NoSuccessfulUpdates(summary));
        }

        session.save(&records).await?;
        info!(
            "Update complete: {} success, {} errors, {} removed",
            updated, errors, summary.removed
        );
        Ok(CycleReport::Updated(summary))
    }
}
