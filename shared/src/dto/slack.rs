use serde::{Deserialize, Serialize};

/// Form body posted by a slash command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlashCommandForm {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub response_url: String,
}

/// Message posted back to a slash command's response URL once background work is done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayedResponse {
    pub text: String,
    pub response_type: String,
}

impl DelayedResponse {
    /// Only visible to the user who ran the command.
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            response_type: "ephemeral".to_string(),
        }
    }
}
