//! Routing and permission configuration types.
//!
//! Defines the config schema for the TieredRouter (Level 1) and its
//! permission system. All types support both `snake_case` and `camelCase`
//! field names in JSON via `#[serde(alias)]`. Unknown fields are silently
//! ignored for forward compatibility.
//!
//! When the `routing` section is absent from config, `RoutingConfig::default()`
//! produces settings equivalent to the existing `StaticRouter` (Level 0).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ── TierSelectionStrategy ────────────────────────────────────────────────

/// Strategy for selecting a model within a tier.
///
/// Controls how the router picks among multiple models in a single tier.
/// Serializes/deserializes as snake_case strings (e.g., `"preference_order"`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TierSelectionStrategy {
    /// Use models in the order listed (first available wins).
    PreferenceOrder,
    /// Rotate through models in round-robin fashion.
    RoundRobin,
    /// Pick the cheapest model in the tier.
    LowestCost,
    /// Pick a random model from the tier.
    Random,
}

// ── RoutingConfig ────────────────────────────────────────────────────────

/// Top-level routing configuration.
///
/// Added to the root `Config` struct alongside `agents`, `channels`, etc.
/// When absent from JSON, defaults to `mode = "static"` (Level 0 StaticRouter).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Routing mode: `"static"` (default, Level 0) or `"tiered"` (Level 1).
    #[serde(default = "default_routing_mode")]
    pub mode: String,

    /// Model tier definitions, ordered cheapest to most expensive.
    /// Only used when `mode = "tiered"`.
    #[serde(default)]
    pub tiers: Vec<ModelTierConfig>,

    /// Model selection strategy within a tier.
    #[serde(default, alias = "selectionStrategy")]
    pub selection_strategy: Option<TierSelectionStrategy>,

    /// Fallback model when all tiers/budgets are exhausted.
    /// Format: `"provider/model"` (e.g., `"groq/llama-3.1-8b"`).
    #[serde(default, alias = "fallbackModel")]
    pub fallback_model: Option<String>,

    /// Permission level definitions and per-user/channel overrides.
    #[serde(default)]
    pub permissions: PermissionsConfig,

    /// Escalation behavior settings.
    #[serde(default)]
    pub escalation: EscalationConfig,

    /// Global cost budget settings.
    #[serde(default, alias = "costBudgets")]
    pub cost_budgets: CostBudgetConfig,

    /// Rate limiting settings.
    #[serde(default, alias = "rateLimiting")]
    pub rate_limiting: RateLimitConfig,
}

fn default_routing_mode() -> String {
    "static".into()
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            mode: default_routing_mode(),
            tiers: Vec::new(),
            selection_strategy: None,
            fallback_model: None,
            permissions: PermissionsConfig::default(),
            escalation: EscalationConfig::default(),
            cost_budgets: CostBudgetConfig::default(),
            rate_limiting: RateLimitConfig::default(),
        }
    }
}

// ── ModelTierConfig ──────────────────────────────────────────────────────

/// A named group of models at a similar cost/capability level.
///
/// Tiers are ordered from cheapest to most expensive in the `tiers` array.
/// Complexity ranges may overlap intentionally -- the router picks the
/// highest-quality tier the user is allowed and can afford.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelTierConfig {
    /// Tier name (e.g., `"free"`, `"standard"`, `"premium"`, `"elite"`).
    pub name: String,

    /// Models available in this tier, in preference order.
    /// Format: `"provider/model"` (e.g., `"anthropic/claude-haiku-3.5"`).
    #[serde(default)]
    pub models: Vec<String>,

    /// Complexity range this tier covers: `[min, max]` where each is 0.0-1.0.
    #[serde(default = "default_complexity_range", alias = "complexityRange")]
    pub complexity_range: [f32; 2],

    /// Approximate cost per 1K tokens (blended input/output) in USD.
    #[serde(default, alias = "costPer1kTokens")]
    pub cost_per_1k_tokens: f64,

    /// Maximum context tokens supported by models in this tier.
    #[serde(default = "default_tier_max_context", alias = "maxContextTokens")]
    pub max_context_tokens: usize,
}

fn default_complexity_range() -> [f32; 2] {
    [0.0, 1.0]
}

fn default_tier_max_context() -> usize {
    8192
}

impl Default for ModelTierConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            models: Vec::new(),
            complexity_range: default_complexity_range(),
            cost_per_1k_tokens: 0.0,
            max_context_tokens: default_tier_max_context(),
        }
    }
}

// ── PermissionsConfig ────────────────────────────────────────────────────

/// Container for permission level defaults and per-user/channel overrides.
///
/// The three built-in levels (`zero_trust`, `user`, `admin`) are named fields.
/// Per-user and per-channel overrides use HashMaps keyed by sender ID or
/// channel name.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PermissionsConfig {
    /// Level 0 (zero-trust) permission defaults.
    #[serde(default)]
    pub zero_trust: PermissionLevelConfig,

    /// Level 1 (user) permission defaults.
    #[serde(default)]
    pub user: PermissionLevelConfig,

    /// Level 2 (admin) permission defaults.
    #[serde(default)]
    pub admin: PermissionLevelConfig,

    /// Per-user permission overrides, keyed by sender ID.
    #[serde(default)]
    pub users: HashMap<String, PermissionLevelConfig>,

    /// Per-channel permission overrides, keyed by channel name.
    #[serde(default)]
    pub channels: HashMap<String, PermissionLevelConfig>,
}

// ── PermissionLevelConfig ────────────────────────────────────────────────

/// Configuration for a single permission level or override.
///
/// When used as a level default, all fields are meaningful. When used as
/// a per-user or per-channel override, only specified fields apply --
/// the rest inherit from the user's resolved level defaults.
///
/// All fields are `Option` to support partial overrides.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PermissionLevelConfig {
    /// Permission level (0 = zero_trust, 1 = user, 2 = admin).
    #[serde(default)]
    pub level: Option<u8>,

    /// Maximum model tier this user can access.
    #[serde(default, alias = "maxTier")]
    pub max_tier: Option<String>,

    /// Explicit model allowlist. Empty = all models in allowed tiers.
    #[serde(default, alias = "modelAccess")]
    pub model_access: Option<Vec<String>>,

    /// Explicit model denylist. Checked after allowlist.
    #[serde(default, alias = "modelDenylist")]
    pub model_denylist: Option<Vec<String>>,

    /// Tool names this user can invoke. `["*"]` = all tools.
    #[serde(default, alias = "toolAccess")]
    pub tool_access: Option<Vec<String>>,

    /// Tool names explicitly denied even if tool_access allows.
    #[serde(default, alias = "toolDenylist")]
    pub tool_denylist: Option<Vec<String>>,

    /// Maximum input context tokens.
    #[serde(default, alias = "maxContextTokens")]
    pub max_context_tokens: Option<usize>,

    /// Maximum output tokens per response.
    #[serde(default, alias = "maxOutputTokens")]
    pub max_output_tokens: Option<usize>,

    /// Rate limit in requests per minute. 0 = unlimited.
    #[serde(default, alias = "rateLimit")]
    pub rate_limit: Option<u32>,

    /// Whether SSE streaming responses are allowed.
    #[serde(default, alias = "streamingAllowed")]
    pub streaming_allowed: Option<bool>,

    /// Whether complexity-based escalation to a higher tier is allowed.
    #[serde(default, alias = "escalationAllowed")]
    pub escalation_allowed: Option<bool>,

    /// Complexity threshold (0.0-1.0) above which escalation triggers.
    #[serde(default, alias = "escalationThreshold")]
    pub escalation_threshold: Option<f32>,

    /// Whether the user can manually override model selection.
    #[serde(default, alias = "modelOverride")]
    pub model_override: Option<bool>,

    /// Daily cost budget in USD. 0.0 = unlimited.
    #[serde(default, alias = "costBudgetDailyUsd")]
    pub cost_budget_daily_usd: Option<f64>,

    /// Monthly cost budget in USD. 0.0 = unlimited.
    #[serde(default, alias = "costBudgetMonthlyUsd")]
    pub cost_budget_monthly_usd: Option<f64>,

    /// Extensible custom permission dimensions.
    #[serde(default, alias = "customPermissions")]
    pub custom_permissions: Option<HashMap<String, serde_json::Value>>,
}

// ── UserPermissions ──────────────────────────────────────────────────────

/// Resolved user permission capabilities.
///
/// This is the **runtime** permission object produced by layering:
/// built-in defaults + level config + workspace config + user override +
/// channel override. Unlike `PermissionLevelConfig` (which uses `Option`
/// for partial overrides), all fields here are concrete values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPermissions {
    /// Permission level (0 = zero_trust, 1 = user, 2 = admin).
    #[serde(default)]
    pub level: u8,

    /// Maximum model tier this user can access.
    #[serde(default, alias = "maxTier")]
    pub max_tier: String,

    /// Explicit model allowlist. Empty = all models in allowed tiers.
    #[serde(default, alias = "modelAccess")]
    pub model_access: Vec<String>,

    /// Explicit model denylist.
    #[serde(default, alias = "modelDenylist")]
    pub model_denylist: Vec<String>,

    /// Tool names this user can invoke. `["*"]` = all tools.
    #[serde(default, alias = "toolAccess")]
    pub tool_access: Vec<String>,

    /// Tool names explicitly denied.
    #[serde(default, alias = "toolDenylist")]
    pub tool_denylist: Vec<String>,

    /// Maximum input context tokens.
    #[serde(default = "default_max_context_tokens", alias = "maxContextTokens")]
    pub max_context_tokens: usize,

    /// Maximum output tokens per response.
    #[serde(default = "default_max_output_tokens", alias = "maxOutputTokens")]
    pub max_output_tokens: usize,

    /// Rate limit in requests per minute. 0 = unlimited.
    #[serde(default = "default_rate_limit", alias = "rateLimit")]
    pub rate_limit: u32,

    /// Whether SSE streaming responses are allowed.
    #[serde(default, alias = "streamingAllowed")]
    pub streaming_allowed: bool,

    /// Whether complexity-based escalation is allowed.
    #[serde(default, alias = "escalationAllowed")]
    pub escalation_allowed: bool,

    /// Complexity threshold (0.0-1.0) above which escalation triggers.
    #[serde(default = "default_escalation_threshold", alias = "escalationThreshold")]
    pub escalation_threshold: f32,

    /// Whether the user can manually override model selection.
    #[serde(default, alias = "modelOverride")]
    pub model_override: bool,

    /// Daily cost budget in USD. 0.0 = unlimited.
    /// Zero-trust default: $0.10/day (see design doc Section 2.2).
    #[serde(default = "default_cost_budget_daily_usd", alias = "costBudgetDailyUsd")]
    pub cost_budget_daily_usd: f64,

    /// Monthly cost budget in USD. 0.0 = unlimited.
    /// Zero-trust default: $2.00/month (see design doc Section 2.2).
    #[serde(default = "default_cost_budget_monthly_usd", alias = "costBudgetMonthlyUsd")]
    pub cost_budget_monthly_usd: f64,

    /// Extensible custom permission dimensions.
    #[serde(default, alias = "customPermissions")]
    pub custom_permissions: HashMap<String, serde_json::Value>,
}

fn default_cost_budget_daily_usd() -> f64 {
    0.10
}

fn default_cost_budget_monthly_usd() -> f64 {
    2.00
}

fn default_max_context_tokens() -> usize {
    4096
}

fn default_max_output_tokens() -> usize {
    1024
}

fn default_rate_limit() -> u32 {
    10
}

fn default_escalation_threshold() -> f32 {
    1.0
}

impl Default for UserPermissions {
    /// Returns zero-trust defaults. All values are restrictive.
    /// `cost_budget_daily_usd` = $0.10, `cost_budget_monthly_usd` = $2.00
    /// per design doc Section 2.2 (NOT 0.0, which would mean unlimited).
    fn default() -> Self {
        Self {
            level: 0,
            max_tier: "free".into(),
            model_access: Vec::new(),
            model_denylist: Vec::new(),
            tool_access: Vec::new(),
            tool_denylist: Vec::new(),
            max_context_tokens: default_max_context_tokens(),
            max_output_tokens: default_max_output_tokens(),
            rate_limit: default_rate_limit(),
            streaming_allowed: false,
            escalation_allowed: false,
            escalation_threshold: default_escalation_threshold(),
            model_override: false,
            cost_budget_daily_usd: default_cost_budget_daily_usd(),
            cost_budget_monthly_usd: default_cost_budget_monthly_usd(),
            custom_permissions: HashMap::new(),
        }
    }
}

// ── AuthContext ───────────────────────────────────────────────────────────

/// Authentication context threaded through the request pipeline.
///
/// Attached to `ChatRequest` by the agent loop after resolving the sender's
/// identity from channel authentication. When absent, the router defaults
/// to zero-trust permissions.
///
/// `Default` returns zero-trust values (empty sender_id, empty channel,
/// zero-trust permissions). For CLI use, call `AuthContext::cli_default()`
/// which sets sender_id="local", channel="cli", and admin permissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Unique sender identifier (platform-specific).
    /// Telegram: user ID, Slack: user ID, Discord: user ID, CLI: `"local"`.
    #[serde(default, alias = "senderId")]
    pub sender_id: String,

    /// Channel name the request originated from.
    #[serde(default)]
    pub channel: String,

    /// Resolved permissions for this sender.
    #[serde(default)]
    pub permissions: UserPermissions,
}

impl Default for AuthContext {
    /// Returns zero-trust defaults: empty sender_id, empty channel,
    /// zero-trust permissions. Unauthenticated requests get minimal access.
    fn default() -> Self {
        Self {
            sender_id: String::new(),
            channel: String::new(),
            permissions: UserPermissions::default(),
        }
    }
}

impl AuthContext {
    /// Convenience constructor for CLI use. Sets `sender_id = "local"`,
    /// `channel = "cli"`, and admin-level permissions. Callers must
    /// explicitly opt into CLI privileges -- this is NOT the Default.
    pub fn cli_default() -> Self {
        Self {
            sender_id: "local".into(),
            channel: "cli".into(),
            permissions: UserPermissions {
                level: 2,
                max_tier: "elite".into(),
                tool_access: vec!["*".into()],
                max_context_tokens: 200_000,
                max_output_tokens: 16_384,
                rate_limit: 0,
                streaming_allowed: true,
                escalation_allowed: true,
                escalation_threshold: 0.0,
                model_override: true,
                cost_budget_daily_usd: 0.0,
                cost_budget_monthly_usd: 0.0,
                ..UserPermissions::default()
            },
        }
    }
}

// ── EscalationConfig ─────────────────────────────────────────────────────

/// Controls complexity-based escalation to higher model tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// Whether escalation is enabled globally.
    #[serde(default)]
    pub enabled: bool,

    /// Default complexity threshold for escalation (0.0-1.0).
    #[serde(default = "default_global_escalation_threshold")]
    pub threshold: f32,

    /// Maximum number of tiers a request can escalate beyond the user's `max_tier`.
    #[serde(default = "default_max_escalation_tiers", alias = "maxEscalationTiers")]
    pub max_escalation_tiers: u32,
}

fn default_global_escalation_threshold() -> f32 {
    0.6
}

fn default_max_escalation_tiers() -> u32 {
    1
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: default_global_escalation_threshold(),
            max_escalation_tiers: default_max_escalation_tiers(),
        }
    }
}

// ── CostBudgetConfig ─────────────────────────────────────────────────────

/// Global cost budget settings.
///
/// System-wide limits that apply regardless of individual user budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostBudgetConfig {
    /// Global daily spending limit in USD. 0.0 = unlimited.
    #[serde(default, alias = "globalDailyLimitUsd")]
    pub global_daily_limit_usd: f64,

    /// Global monthly spending limit in USD. 0.0 = unlimited.
    #[serde(default, alias = "globalMonthlyLimitUsd")]
    pub global_monthly_limit_usd: f64,

    /// Whether to persist cost tracking data to disk.
    #[serde(default, alias = "trackingPersistence")]
    pub tracking_persistence: bool,

    /// Hour (UTC) at which daily budgets reset. 0 = midnight UTC.
    #[serde(default, alias = "resetHourUtc")]
    pub reset_hour_utc: u8,
}

impl Default for CostBudgetConfig {
    fn default() -> Self {
        Self {
            global_daily_limit_usd: 0.0,
            global_monthly_limit_usd: 0.0,
            tracking_persistence: false,
            reset_hour_utc: 0,
        }
    }
}

// ── RateLimitConfig ──────────────────────────────────────────────────────

/// Rate limiting configuration.
///
/// Controls the sliding-window rate limiter that enforces per-user request
/// limits. The window size and strategy are global; per-user limits are
/// defined in `PermissionLevelConfig.rate_limit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Window size in seconds for rate limit calculations.
    #[serde(default = "default_window_seconds", alias = "windowSeconds")]
    pub window_seconds: u32,

    /// Rate limiting strategy: `"sliding_window"` (default) or `"fixed_window"`.
    #[serde(default = "default_rate_limit_strategy")]
    pub strategy: String,

    /// Global rate limit in requests per minute across ALL users.
    /// 0 = unlimited (no global cap). Checked before per-user limits.
    #[serde(default, alias = "globalRateLimitRpm")]
    pub global_rate_limit_rpm: u32,
}

fn default_window_seconds() -> u32 {
    60
}

fn default_rate_limit_strategy() -> String {
    "sliding_window".into()
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_seconds: default_window_seconds(),
            strategy: default_rate_limit_strategy(),
            global_rate_limit_rpm: 0,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
