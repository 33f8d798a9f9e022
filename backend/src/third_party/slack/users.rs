use anyhow::{anyhow, Result as AnyResult};
use serde::Deserialize;
use shared::{DelayedResponse, DisplayName, Result, SharedError};

use crate::config::SlackConfig;
use crate::third_party::{IdentityProvider, Notifier};

#[derive(Debug, Deserialize)]
struct SlackUserInfoResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    user: Option<SlackUser>,
}

#[derive(Debug, Deserialize)]
struct SlackUser {
    #[serde(default)]
    profile: SlackProfile,
}

#[derive(Debug, Default, Deserialize)]
struct SlackProfile {
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    real_name: String,
}

/// Prefers the explicit first/last fields; falls back to splitting the real name.
fn display_name_from_profile(profile: &SlackProfile) -> DisplayName {
    let name = DisplayName::new(profile.first_name.trim(), profile.last_name.trim());
    if name.is_empty() && !profile.real_name.trim().is_empty() {
        return DisplayName::from_full_name(&profile.real_name);
    }
    name
}

/// Slack Web API client: user lookup for slash commands and delayed responses.
#[derive(Clone)]
pub struct SlackService {
    api_url: String,
    bot_token: Option<String>,
    client: reqwest::Client,
}

impl SlackService {
    pub fn new_with_config(config: &SlackConfig) -> AnyResult<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            api_url: config.api_url.clone(),
            bot_token: config.bot_token.clone(),
            client,
        })
    }

    pub fn has_token(&self) -> bool {
        self.bot_token.is_some()
    }

    async fn users_info(&self, token: &str, user_id: &str) -> AnyResult<SlackUserInfoResponse> {
        let response = self
            .client
            .get(format!("{}/users.info", self.api_url))
            .query(&[("user", user_id)])
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Slack users.info request failed: {}", status));
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl IdentityProvider for SlackService {
    async fn profile_name(&self, user_id: &str) -> Result<DisplayName> {
        let token = self
            .bot_token
            .as_deref()
            .ok_or_else(|| SharedError::Configuration("SLACK_BOT_TOKEN is not configured".into()))?;

        let info = self.users_info(token, user_id).await.map_err(|e| {
            log::error!("Exception fetching Slack user info for {}: {}", user_id, e);
            SharedError::IdentityUnavailable(format!("could not fetch Slack user {}", user_id))
        })?;

        if !info.ok {
            let code = info.error.unwrap_or_else(|| "unknown".to_string());
            log::warn!("Slack users.info returned an error for {}: {}", user_id, code);
            return Err(SharedError::IdentityUnavailable(format!("Slack API error: {}", code)));
        }

        let profile = info.user.map(|user| user.profile).unwrap_or_default();
        Ok(display_name_from_profile(&profile))
    }
}

#[async_trait::async_trait]
impl Notifier for SlackService {
    async fn notify(&self, response_url: &str, text: &str) -> Result<()> {
        if response_url.is_empty() {
            return Err(SharedError::BadRequest("no response_url to deliver to".into()));
        }

        let response = self
            .client
            .post(response_url)
            .json(&DelayedResponse::ephemeral(text))
            .send()
            .await
            .map_err(|e| SharedError::Internal(format!("Failed to send delayed response: {}", e)))?;

        if !response.status().is_success() {
            return Err(SharedError::Internal(format!(
                "Delayed response rejected: {}",
                response.status()
            )));
        }
        Ok(())
    }
}
