use anyhow::{anyhow, Result as AnyResult};
use serde::{de::DeserializeOwned, Deserialize};
use shared::{GameRecord, PlayerStats, Rating, Result, SharedError};

use crate::config::ChessApiConfig;
use crate::third_party::StatsProvider;

#[derive(Debug, Default, Deserialize)]
struct ChessProfileResponse {
    #[serde(default)]
    avatar: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChessStatsResponse {
    #[serde(default)]
    chess_rapid: Option<ChessModeStats>,
    #[serde(default)]
    chess_blitz: Option<ChessModeStats>,
}

#[derive(Debug, Default, Deserialize)]
struct ChessModeStats {
    #[serde(default)]
    last: Option<ChessRatingPoint>,
    #[serde(default)]
    best: Option<ChessRatingPoint>,
    #[serde(default)]
    record: Option<ChessModeRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct ChessRatingPoint {
    #[serde(default)]
    rating: Option<i32>,
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
struct ChessModeRecord {
    #[serde(default)]
    win: u32,
    #[serde(default)]
    loss: u32,
    #[serde(default)]
    draw: u32,
}

impl ChessModeStats {
    fn rating(&self) -> Rating {
        let point = |p: &Option<ChessRatingPoint>| p.as_ref().and_then(|p| p.rating).unwrap_or(0);
        Rating::new(point(&self.last), point(&self.best))
    }
}

/// Maps the provider's stats payload onto our ratings. W/L/D comes from the rapid
/// mode when it has a record, else from blitz, else zeros.
fn stats_from_payload(payload: &ChessStatsResponse, avatar: String) -> PlayerStats {
    let rating_of = |mode: &Option<ChessModeStats>| mode.as_ref().map(ChessModeStats::rating).unwrap_or_default();
    let record = payload
        .chess_rapid
        .as_ref()
        .and_then(|mode| mode.record)
        .or_else(|| payload.chess_blitz.as_ref().and_then(|mode| mode.record))
        .unwrap_or_default();

    PlayerStats {
        rapid: rating_of(&payload.chess_rapid),
        blitz: rating_of(&payload.chess_blitz),
        record: GameRecord {
            wins: record.win,
            losses: record.loss,
            draws: record.draw,
        },
        avatar,
    }
}

/// Client for the chess.com public player API.
#[derive(Clone)]
pub struct ChessComService {
    base_url: String,
    client: reqwest::Client,
}

impl ChessComService {
    pub fn new_with_config(config: &ChessApiConfig) -> AnyResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            base_url: config.base_url.clone(),
            client,
        })
    }

    fn player_url(&self, player_id: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(player_id))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> AnyResult<T> {
        log::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("chess.com API request failed: {}", status));
        }

        Ok(response.json::<T>().await?)
    }

    async fn fetch_avatar(&self, player_id: &str) -> String {
        match self.get_json::<ChessProfileResponse>(&self.player_url(player_id)).await {
            Ok(profile) => profile.avatar.unwrap_or_default(),
            Err(e) => {
                log::warn!("Profile API failed for {}: {}", player_id, e);
                String::new()
            }
        }
    }
}

#[async_trait::async_trait]
impl StatsProvider for ChessComService {
    async fn fetch_stats(&self, player_id: &str) -> Result<PlayerStats> {
        // A missing profile only costs us the avatar
        let avatar = self.fetch_avatar(player_id).await;

        let url = format!("{}/stats", self.player_url(player_id));
        match self.get_json::<ChessStatsResponse>(&url).await {
            Ok(payload) => Ok(stats_from_payload(&payload, avatar)),
            Err(e) => {
                log::warn!("Stats API failed for {}: {}", player_id, e);
                Err(SharedError::ProviderUnavailable(player_id.to_string()))
            }
        }
    }
}
