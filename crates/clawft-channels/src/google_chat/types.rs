//! Google Chat channel configuration types.

use serde::{Deserialize, Serialize};

/// Configuration for the Google Chat channel adapter.
///
/// Connects to Google Chat via the Chat API. Requires a
/// Google Cloud service account with the Chat API enabled.
///
/// OAuth2 integration (service account credentials) is deferred
/// to Workstream F6. This skeleton defines the configuration
/// shape and adapter structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoogleChatAdapterConfig {
    /// Google Cloud project ID.
    #[serde(default, alias = "projectId")]
    pub project_id: String,

    /// Path to the service account JSON key file.
    /// Should be set via environment variable in production.
    #[serde(default, alias = "serviceAccountKeyPath")]
    pub service_account_key_path: String,

    /// Spaces (rooms) to listen to. Empty = all spaces the bot is in.
    #[serde(default)]
    pub spaces: Vec<String>,

    /// Allowed user emails. Empty = allow all.
    #[serde(default, alias = "allowedUsers")]
    pub allowed_users: Vec<String>,
}
