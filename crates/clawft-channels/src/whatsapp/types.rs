//! WhatsApp channel configuration and message types.

use serde::{Deserialize, Serialize};

use clawft_types::secret::SecretString;

/// Configuration for the WhatsApp channel adapter.
///
/// All credential fields use [`SecretString`] to prevent accidental exposure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppAdapterConfig {
    /// WhatsApp Business phone number ID.
    #[serde(default, alias = "phoneNumberId")]
    pub phone_number_id: String,

    /// App access token (via SecretString).
    #[serde(default, alias = "accessToken")]
    pub access_token: SecretString,

    /// Webhook verify token (via SecretString -- not plaintext).
    #[serde(default, alias = "verifyToken")]
    pub verify_token: SecretString,

    /// Cloud API base URL.
    #[serde(default = "default_api_url", alias = "apiUrl")]
    pub api_url: String,

    /// API version.
    #[serde(default = "default_api_version", alias = "apiVersion")]
    pub api_version: String,

    /// Allowed phone numbers. Empty = allow all.
    #[serde(default, alias = "allowedNumbers")]
    pub allowed_numbers: Vec<String>,
}

fn default_api_url() -> String {
    "https://graph.facebook.com".into()
}
fn default_api_version() -> String {
    "v21.0".into()
}

impl Default for WhatsAppAdapterConfig {
    fn default() -> Self {
        Self {
            phone_number_id: String::new(),
            access_token: SecretString::default(),
            verify_token: SecretString::default(),
            api_url: default_api_url(),
            api_version: default_api_version(),
            allowed_numbers: Vec::new(),
        }
    }
}
