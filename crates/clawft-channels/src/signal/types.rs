//! Signal channel configuration types.

use serde::{Deserialize, Serialize};

/// Configuration for the Signal channel adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalAdapterConfig {
    /// Phone number registered with Signal (e.g. `"+1234567890"`).
    #[serde(default, alias = "phoneNumber")]
    pub phone_number: String,

    /// Path to the `signal-cli` binary.
    #[serde(default = "default_signal_cli_path", alias = "signalCliPath")]
    pub signal_cli_path: String,

    /// Subprocess timeout in seconds (default 30).
    #[serde(default = "default_timeout_secs", alias = "timeoutSecs")]
    pub timeout_secs: u64,

    /// Allowed phone numbers. Empty = allow all.
    #[serde(default, alias = "allowedNumbers")]
    pub allowed_numbers: Vec<String>,
}

fn default_signal_cli_path() -> String {
    "signal-cli".into()
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for SignalAdapterConfig {
    fn default() -> Self {
        Self {
            phone_number: String::new(),
            signal_cli_path: default_signal_cli_path(),
            timeout_secs: default_timeout_secs(),
            allowed_numbers: Vec::new(),
        }
    }
}

/// Sanitize a string argument for safe use as a subprocess argument.
///
/// Rejects arguments containing shell metacharacters that could
/// enable command injection. Returns `Err` with a description if
/// the argument is unsafe.
pub fn sanitize_argument(arg: &str) -> Result<&str, String> {
    // Reject empty arguments.
    if arg.is_empty() {
        return Err("empty argument".into());
    }

    // Reject shell metacharacters.
    const BANNED_CHARS: &[char] = &[
        ';', '|', '&', '$', '`', '(', ')', '{', '}', '<', '>', '!',
        '\n', '\r', '\0',
    ];

    for ch in BANNED_CHARS {
        if arg.contains(*ch) {
            return Err(format!(
                "argument contains forbidden character: {:?}",
                ch
            ));
        }
    }

    Ok(arg)
}
