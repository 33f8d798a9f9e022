use serde::{Deserialize, Serialize};
use validator::Validate;
use chrono::NaiveDate;
use std::fmt;

use crate::models::stats::PlayerStats;

/// Number of daily entries kept in a player's rolling history.
pub const HISTORY_DAYS: usize = 7;

/// Current and best rating for one rating mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    #[serde(default)]
    pub current: i32,
    #[serde(default)]
    pub best: i32,
}

impl Rating {
    pub fn new(current: i32, best: i32) -> Self {
        Self { current, best }
    }

    /// `best` is never below `current`; providers report 0 for an unknown best.
    pub fn normalized(self) -> Rating {
        Rating {
            current: self.current,
            best: self.best.max(self.current),
        }
    }

    /// Takes the freshly observed rating while never letting `best` go down.
    pub fn merge(self, observed: Rating) -> Rating {
        let observed = observed.normalized();
        Rating {
            current: observed.current,
            best: self.best.max(observed.best),
        }
    }
}

/// Win/loss/draw record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub draws: u32,
}

/// First and last name of the person behind an account. Either part may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayName {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl DisplayName {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// Splits a "real name" on its first space: "Anne Marie Dupont" -> ("Anne", "Marie Dupont").
    pub fn from_full_name(full_name: &str) -> Self {
        let mut parts = full_name.trim().splitn(2, ' ');
        let first = parts.next().unwrap_or_default();
        let last = parts.next().unwrap_or_default();
        Self::new(first.trim(), last.trim())
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.trim().is_empty() && self.last_name.trim().is_empty()
    }

    pub fn is_complete(&self) -> bool {
        !self.first_name.trim().is_empty() && !self.last_name.trim().is_empty()
    }

    /// Case-insensitive comparison on both parts.
    pub fn matches(&self, other: &DisplayName) -> bool {
        self.first_name.to_lowercase() == other.first_name.to_lowercase()
            && self.last_name.to_lowercase() == other.last_name.to_lowercase()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

/// One tracked player as persisted in the store file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    /// Account identifier on the rating provider
    #[serde(rename = "username")]
    #[validate(length(min = 1, max = 64))]
    pub id: String,

    #[serde(flatten)]
    pub display_name: DisplayName,

    /// Expected departure year (e.g. "2027") or an opaque non-expiring token
    #[serde(rename = "promo", default)]
    pub cohort_tag: String,

    #[serde(rename = "class", default)]
    pub class_tag: String,

    /// Position before the latest ranking pass, 0 when never ranked
    #[serde(default)]
    pub previous_rank: u32,

    #[serde(rename = "rapid", default)]
    pub rating_primary: Rating,

    #[serde(rename = "blitz", default)]
    pub rating_secondary: Rating,

    #[serde(rename = "stats", default)]
    pub record: GameRecord,

    /// One primary-mode score per day with a successful refresh, oldest first
    #[serde(rename = "history7days", default)]
    #[validate(length(max = 7))]
    pub history: Vec<i32>,

    #[serde(
        rename = "lastHistoryUpdate",
        default,
        with = "optional_iso_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_history_update: Option<NaiveDate>,

    #[serde(default)]
    pub avatar: String,
}

impl PlayerRecord {
    /// Builds the record for a freshly registered account. The history is seeded with
    /// the current primary score for every day so the trend chart starts flat.
    pub fn from_stats(
        id: String,
        display_name: DisplayName,
        cohort_tag: String,
        class_tag: String,
        stats: &PlayerStats,
        today: NaiveDate,
    ) -> Self {
        Self {
            id,
            display_name,
            cohort_tag,
            class_tag,
            previous_rank: 0,
            rating_primary: stats.rapid.normalized(),
            rating_secondary: stats.blitz.normalized(),
            record: stats.record,
            history: vec![stats.rapid.current; HISTORY_DAYS],
            last_history_update: Some(today),
            avatar: stats.avatar.clone(),
        }
    }

    /// Overwrites the provider-derived fields with a successful fetch. Best scores are
    /// monotonic, the avatar is only replaced by a non-empty value. History is left alone.
    pub fn apply_stats(&mut self, stats: &PlayerStats) {
        self.rating_primary = self.rating_primary.merge(stats.rapid);
        self.rating_secondary = self.rating_secondary.merge(stats.blitz);
        self.record = stats.record;
        if !stats.avatar.is_empty() {
            self.avatar = stats.avatar.clone();
        }
    }

    pub fn same_id(&self, id: &str) -> bool {
        self.id.eq_ignore_ascii_case(id)
    }
}

/// `lastHistoryUpdate` is an ISO date; older files carry "" or null for "never".
mod optional_iso_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => serializer.serialize_str(&date.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => NaiveDate::parse_from_str(value, FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
