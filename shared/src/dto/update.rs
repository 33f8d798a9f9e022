use serde::{Deserialize, Serialize};

/// Counters reported by one update cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSummary {
    pub updated: usize,
    pub errors: usize,
    pub removed: usize,
    pub total: usize,
}

/// Wire shape returned by the refresh endpoint and kept as the scheduler's last outcome.
/// Fields that do not apply to an outcome are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UpdateOutcome {
    pub fn completed(summary: UpdateSummary) -> Self {
        Self {
            success: true,
            updated: Some(summary.updated),
            errors: Some(summary.errors),
            removed: Some(summary.removed),
            total: Some(summary.total),
            ..Self::default()
        }
    }

    pub fn skipped(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn no_updates(summary: UpdateSummary) -> Self {
        Self {
            success: false,
            errors: Some(summary.errors),
            removed: Some(summary.removed),
            total: Some(summary.total),
            message: Some("No successful updates".to_string()),
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}
