use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{error, info, warn};
use shared::{DisplayName, PlayerRecord, Result, SharedError};
use tokio::task::JoinHandle;
use validator::Validate;

use super::store::RecordStore;
use crate::third_party::{IdentityProvider, Notifier, StatsProvider};

/// Arguments of an add command: `<id> [cohort] [class]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddCommand {
    pub id: String,
    pub cohort_tag: String,
    pub class_tag: String,
}

impl AddCommand {
    /// Splits on whitespace; missing tokens are empty and the class tag is upper-cased.
    pub fn parse(text: &str) -> Self {
        let mut tokens = text.split_whitespace();
        let mut next = || tokens.next().unwrap_or_default().to_string();
        let id = next();
        let cohort_tag = next();
        let class_tag = next().to_uppercase();
        Self { id, cohort_tag, class_tag }
    }
}

/// Single-record roster changes. They share the store guard with the update cycle but
/// do all provider calls before taking it.
pub struct RosterService {
    store: Arc<RecordStore>,
    stats: Arc<dyn StatsProvider>,
    identity: Arc<dyn IdentityProvider>,
    notifier: Arc<dyn Notifier>,
    timezone: Tz,
}

impl RosterService {
    pub fn new(
        store: Arc<RecordStore>,
        stats: Arc<dyn StatsProvider>,
        identity: Arc<dyn IdentityProvider>,
        notifier: Arc<dyn Notifier>,
        timezone: Tz,
    ) -> Self {
        Self {
            store,
            stats,
            identity,
            notifier,
            timezone,
        }
    }

    pub async fn add_player(&self, text: &str, identity_token: Option<&str>) -> Result<PlayerRecord> {
        self.add_player_at(text, identity_token, Utc::now()).await
    }

    pub async fn add_player_at(
        &self,
        text: &str,
        identity_token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<PlayerRecord> {
        let command = AddCommand::parse(text);

        let display_name = match identity_token.filter(|token| !token.is_empty()) {
            Some(token) => self.lookup_name_lenient(token).await?,
            None => DisplayName::default(),
        };

        if command.id.is_empty() {
            return Err(SharedError::BadRequest("No username provided".into()));
        }

        let stats = self.stats.fetch_stats(&command.id).await?;
        let today = now.with_timezone(&self.timezone).date_naive();
        let record = PlayerRecord::from_stats(
            command.id,
            display_name,
            command.cohort_tag,
            command.class_tag,
            &stats,
            today,
        );

        let session = self.store.exclusive().await;
        let mut records = session.load_or_empty().await?;

        if records.iter().any(|existing| existing.same_id(&record.id)) {
            return Err(SharedError::DuplicateIdentity(format!(
                "username {} is already registered",
                record.id
            )));
        }

        if record.display_name.is_complete()
            && records
                .iter()
                .any(|existing| existing.display_name.matches(&record.display_name))
        {
            return Err(SharedError::DuplicateIdentity(format!(
                "an account already exists for {}",
                record.display_name
            )));
        }

        records.push(record.clone());
        session.save(&records).await?;

        info!(
            "Added account for {} - username: {}, rapid: {}, blitz: {}",
            record.display_name, record.id, record.rating_primary.current, record.rating_secondary.current
        );
        Ok(record)
    }

    /// Removes every record registered under the caller's name. Returns how many went.
    pub async fn remove_player(&self, identity_token: &str) -> Result<usize> {
        let display_name = self.identity.profile_name(identity_token).await?;
        if !display_name.is_complete() {
            return Err(SharedError::IdentityUnavailable(
                "could not resolve a first and last name".into(),
            ));
        }

        let session = self.store.exclusive().await;
        let records = session.load().await?;
        let before = records.len();

        let kept: Vec<PlayerRecord> = records
            .into_iter()
            .filter(|record| !record.display_name.matches(&display_name))
            .collect();

        let removed = before - kept.len();
        if removed == 0 {
            return Err(SharedError::NotFound(format!("no account found for {}", display_name)));
        }

        session.save(&kept).await?;
        info!("Deleted account for {} ({} removed)", display_name, removed);
        Ok(removed)
    }

    /// Replaces the whole store with a caller-supplied list.
    pub async fn replace_all(&self, records: Vec<PlayerRecord>) -> Result<usize> {
        let mut seen = HashSet::new();
        for record in &records {
            record.validate()?;
            if !seen.insert(record.id.to_lowercase()) {
                return Err(SharedError::DuplicateIdentity(format!(
                    "username {} appears more than once",
                    record.id
                )));
            }
        }

        let session = self.store.exclusive().await;
        session.save(&records).await?;
        info!("Replaced roster with {} players", records.len());
        Ok(records.len())
    }

    /// A lookup that fails only on a configuration problem; any other identity error
    /// registers the player without a name.
    async fn lookup_name_lenient(&self, token: &str) -> Result<DisplayName> {
        match self.identity.profile_name(token).await {
            Ok(name) => Ok(name),
            Err(e @ SharedError::Configuration(_)) => Err(e),
            Err(e) => {
                warn!("Registering without a display name: {}", e);
                Ok(DisplayName::default())
            }
        }
    }

    /// Runs an add in the background and always reports back to `response_url`.
    pub fn dispatch_add(
        self: &Arc<Self>,
        text: String,
        identity_token: Option<String>,
        response_url: String,
    ) -> JoinHandle<()> {
        let service = self.clone();
        let work = tokio::spawn(async move {
            service.add_player(&text, identity_token.as_deref()).await
        });

        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            let message = match work.await {
                Ok(result) => add_message(&result),
                Err(e) => {
                    error!("Add command task failed: {}", e);
                    "❌ Internal error while adding the account.".to_string()
                }
            };
            deliver(notifier.as_ref(), &response_url, &message).await;
        })
    }

    /// Runs a removal in the background and always reports back to `response_url`.
    pub fn dispatch_remove(self: &Arc<Self>, identity_token: String, response_url: String) -> JoinHandle<()> {
        let service = self.clone();
        let work = tokio::spawn(async move { service.remove_player(&identity_token).await });

        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            let message = match work.await {
                Ok(result) => remove_message(&result),
                Err(e) => {
                    error!("Remove command task failed: {}", e);
                    "❌ Internal error while removing the account.".to_string()
                }
            };
            deliver(notifier.as_ref(), &response_url, &message).await;
        })
    }
}

async fn deliver(notifier: &dyn Notifier, response_url: &str, message: &str) {
    if let Err(e) = notifier.notify(response_url, message).await {
        error!("Failed to send delayed response: {}", e);
    }
}

pub fn add_message(result: &Result<PlayerRecord>) -> String {
    match result {
        Ok(record) => format!(
            "✅ Your account was added to the leaderboard!\n🎮 Username: {}\n⚡ Rapid: {} | Blitz: {}",
            record.id, record.rating_primary.current, record.rating_secondary.current
        ),
        Err(SharedError::BadRequest(_)) => "❌ No username provided.".to_string(),
        Err(SharedError::ProviderUnavailable(id)) => {
            format!("❌ Could not fetch Chess.com stats for {}.", id)
        }
        Err(e) => format!("❌ {}", e),
    }
}

pub fn remove_message(result: &Result<usize>) -> String {
    match result {
        Ok(_) => "✅ Your account was removed from the leaderboard.".to_string(),
        Err(e) if e.is_store_failure() => "❌ Could not update the leaderboard data.".to_string(),
        Err(e) => format!("❌ {}", e),
    }
}
