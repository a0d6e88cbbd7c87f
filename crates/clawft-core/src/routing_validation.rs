//! Routing configuration validation.
//!
//! Post-deserialization validation for [`RoutingConfig`] and its nested types.
//! Serde handles structural correctness (JSON types, field names), but cannot
//! enforce semantic constraints like "tier names must be unique" or "complexity
//! min must be less than max." This module fills that gap.
//!
//! Validation runs after deserialization, before `TieredRouter` construction.
//! When `routing.mode` is `"static"`, validation is skipped entirely.

use std::collections::HashSet;

use clawft_types::routing::{ModelTierConfig, PermissionLevelConfig, RoutingConfig};

// ── ValidationSeverity ──────────────────────────────────────────────────

/// Severity level for a validation diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationSeverity {
    /// Fatal: the config is invalid and the system cannot start.
    Error,
    /// Non-fatal: the config is technically valid but may indicate a
    /// misconfiguration. Logged at WARN level during startup.
    Warning,
}

// ── ValidationError ─────────────────────────────────────────────────────

/// A single validation diagnostic for the routing config.
///
/// Collects a human-readable field path, a descriptive message, and a
/// severity level. All diagnostics are gathered before returning so
/// operators see every issue at once.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Dotted field path (e.g., `"routing.tiers[1].complexity_range"`).
    pub field: String,
    /// Human-readable description of the problem.
    pub message: String,
    /// Whether this is a fatal error or a non-fatal warning.
    pub severity: ValidationSeverity,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            ValidationSeverity::Error => "ERROR",
            ValidationSeverity::Warning => "WARN",
        };
        write!(f, "[{}] {}: {}", level, self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

// ── Main validation entry point ─────────────────────────────────────────

/// Validate a [`RoutingConfig`] and return all errors/warnings found.
///
/// When `mode` is `"static"`, validation is skipped entirely (static mode
/// ignores routing config). Validation only applies when `mode = "tiered"`.
///
/// All diagnostics are collected in a single pass -- the function does not
/// short-circuit on the first error.
pub fn validate_routing_config(config: &RoutingConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    // Static mode skips all routing validation (backward compatibility).
    if config.mode == "static" {
        return errors;
    }

    validate_mode(config, &mut errors);
    validate_tiers(config, &mut errors);
    validate_permissions(config, &mut errors);
    validate_escalation(config, &mut errors);
    validate_cost_budgets(config, &mut errors);
    validate_rate_limiting(config, &mut errors);
    validate_fallback_model(config, &mut errors);

    errors
}

// ── Mode validation ─────────────────────────────────────────────────────

/// Rule 1: `mode` must be `"static"` or `"tiered"`.
fn validate_mode(config: &RoutingConfig, errors: &mut Vec<ValidationError>) {
    if config.mode != "static" && config.mode != "tiered" {
        errors.push(ValidationError {
            field: "routing.mode".into(),
            message: format!(
                "unknown mode '{}', expected 'static' or 'tiered'",
                config.mode
            ),
            severity: ValidationSeverity::Error,
        });
    }
}

// ── Tier validation ─────────────────────────────────────────────────────

/// Rules 2-8: tier-level validations.
fn validate_tiers(config: &RoutingConfig, errors: &mut Vec<ValidationError>) {
    // Rule 2: if mode is "tiered", at least one tier must be defined.
    if config.mode == "tiered" && config.tiers.is_empty() {
        errors.push(ValidationError {
            field: "routing.tiers".into(),
            message: "tiered mode requires at least one tier definition".into(),
            severity: ValidationSeverity::Error,
        });
    }

    // Rule 3: no duplicate tier names.
    let mut seen_names: HashSet<&str> = HashSet::new();
    for (i, tier) in config.tiers.iter().enumerate() {
        if !seen_names.insert(&tier.name) {
            errors.push(ValidationError {
                field: format!("routing.tiers[{}].name", i),
                message: format!("duplicate tier name '{}'", tier.name),
                severity: ValidationSeverity::Error,
            });
        }

        validate_single_tier(i, tier, errors);
    }

    // Warning: overlapping complexity ranges (intentional by design but
    // worth logging for operator awareness).
    for i in 0..config.tiers.len() {
        for j in (i + 1)..config.tiers.len() {
            let a = &config.tiers[i];
            let b = &config.tiers[j];
            let overlap_min = a.complexity_range[0].max(b.complexity_range[0]);
            let overlap_max = a.complexity_range[1].min(b.complexity_range[1]);
            if overlap_min < overlap_max {
                errors.push(ValidationError {
                    field: format!("routing.tiers[{}]+[{}]", i, j),
                    message: format!(
                        "tiers '{}' and '{}' have overlapping complexity ranges \
                         [{:.2}, {:.2}]",
                        a.name, b.name, overlap_min, overlap_max
                    ),
                    severity: ValidationSeverity::Warning,
                });
            }
        }
    }
}

/// Validate a single tier's fields.
fn validate_single_tier(index: usize, tier: &ModelTierConfig, errors: &mut Vec<ValidationError>) {
    let prefix = format!("routing.tiers[{}]", index);

    // Rule 4: each tier must have at least one model (warning).
    if tier.models.is_empty() {
        errors.push(ValidationError {
            field: format!("{}.models", prefix),
            message: format!(
                "tier '{}' has no models -- it is defined but unusable",
                tier.name
            ),
            severity: ValidationSeverity::Warning,
        });
    }

    // Rule 5: complexity_range[0] <= complexity_range[1].
    let [min, max] = tier.complexity_range;
    if min > max {
        errors.push(ValidationError {
            field: format!("{}.complexity_range", prefix),
            message: format!(
                "complexity_range min ({}) > max ({}) for tier '{}'",
                min, max, tier.name
            ),
            severity: ValidationSeverity::Error,
        });
    }

    // Rule 6: complexity_range values in [0.0, 1.0].
    if !(0.0..=1.0).contains(&min) {
        errors.push(ValidationError {
            field: format!("{}.complexity_range[0]", prefix),
            message: format!(
                "complexity_range[0] = {} is outside [0.0, 1.0] for tier '{}'",
                min, tier.name
            ),
            severity: ValidationSeverity::Error,
        });
    }
    if !(0.0..=1.0).contains(&max) {
        errors.push(ValidationError {
            field: format!("{}.complexity_range[1]", prefix),
            message: format!(
                "complexity_range[1] = {} is outside [0.0, 1.0] for tier '{}'",
                max, tier.name
            ),
            severity: ValidationSeverity::Error,
        });
    }

    // Rule 7: cost_per_1k_tokens >= 0.0.
    if tier.cost_per_1k_tokens < 0.0 {
        errors.push(ValidationError {
            field: format!("{}.cost_per_1k_tokens", prefix),
            message: format!(
                "cost_per_1k_tokens = {} must be non-negative for tier '{}'",
                tier.cost_per_1k_tokens, tier.name
            ),
            severity: ValidationSeverity::Error,
        });
    }

    // Rule 8: max_context_tokens > 0.
    if tier.max_context_tokens == 0 {
        errors.push(ValidationError {
            field: format!("{}.max_context_tokens", prefix),
            message: format!("max_context_tokens must be > 0 for tier '{}'", tier.name),
            severity: ValidationSeverity::Error,
        });
    }

    // Warning: model format should contain '/' (provider/model).
    for (j, model) in tier.models.iter().enumerate() {
        if !model.contains('/') {
            errors.push(ValidationError {
                field: format!("{}.models[{}]", prefix, j),
                message: format!(
                    "model '{}' does not contain '/' (expected 'provider/model' format)",
                    model
                ),
                severity: ValidationSeverity::Warning,
            });
        }
    }
}

// ── Permission validation ───────────────────────────────────────────────

/// Rules 9-14: permission-level validations.
fn validate_permissions(config: &RoutingConfig, errors: &mut Vec<ValidationError>) {
    let valid_tier_names: HashSet<&str> = config.tiers.iter().map(|t| t.name.as_str()).collect();

    // Validate the three named permission levels.
    validate_permission_level(
        &config.permissions.zero_trust,
        "routing.permissions.zero_trust",
        &valid_tier_names,
        errors,
    );
    validate_permission_level(
        &config.permissions.user,
        "routing.permissions.user",
        &valid_tier_names,
        errors,
    );
    validate_permission_level(
        &config.permissions.admin,
        "routing.permissions.admin",
        &valid_tier_names,
        errors,
    );

    // Validate per-user overrides.
    for (user_id, plc) in &config.permissions.users {
        validate_permission_level(
            plc,
            &format!("routing.permissions.users.{}", user_id),
            &valid_tier_names,
            errors,
        );
    }

    // Validate per-channel overrides.
    for (channel, plc) in &config.permissions.channels {
        validate_permission_level(
            plc,
            &format!("routing.permissions.channels.{}", channel),
            &valid_tier_names,
            errors,
        );
    }
}

/// Validate a single [`PermissionLevelConfig`].
fn validate_permission_level(
    plc: &PermissionLevelConfig,
    field_prefix: &str,
    valid_tiers: &HashSet<&str>,
    errors: &mut Vec<ValidationError>,
) {
    // Rule 9: level values are 0, 1, or 2 (warn on others).
    if let Some(level) = plc.level
        && level > 2 {
            errors.push(ValidationError {
                field: format!("{}.level", field_prefix),
                message: format!(
                    "permission level {} is not recognized (expected 0, 1, or 2)",
                    level
                ),
                severity: ValidationSeverity::Warning,
            });
        }

    // Rule 10: escalation_threshold in [0.0, 1.0].
    if let Some(threshold) = plc.escalation_threshold
        && (!(0.0..=1.0).contains(&threshold)) {
            errors.push(ValidationError {
                field: format!("{}.escalation_threshold", field_prefix),
                message: format!("escalation_threshold {} must be in [0.0, 1.0]", threshold),
                severity: ValidationSeverity::Error,
            });
        }

    // Rule 11: cost_budget_daily_usd >= 0.0.
    if let Some(daily) = plc.cost_budget_daily_usd
        && daily < 0.0 {
            errors.push(ValidationError {
                field: format!("{}.cost_budget_daily_usd", field_prefix),
                message: format!("cost_budget_daily_usd {} must be non-negative", daily),
                severity: ValidationSeverity::Error,
            });
        }

    // Rule 12: cost_budget_monthly_usd >= 0.0.
    if let Some(monthly) = plc.cost_budget_monthly_usd
        && monthly < 0.0 {
            errors.push(ValidationError {
                field: format!("{}.cost_budget_monthly_usd", field_prefix),
                message: format!("cost_budget_monthly_usd {} must be non-negative", monthly),
                severity: ValidationSeverity::Error,
            });
        }

    // Rule 13: max_tier references an existing tier name (warning only).
    if let Some(ref max_tier) = plc.max_tier
        && !valid_tiers.is_empty() && !valid_tiers.contains(max_tier.as_str()) {
            errors.push(ValidationError {
                field: format!("{}.max_tier", field_prefix),
                message: format!(
                    "max_tier '{}' does not match any defined tier (available: {})",
                    max_tier,
                    valid_tiers.iter().copied().collect::<Vec<_>>().join(", ")
                ),
                severity: ValidationSeverity::Warning,
            });
        }

    // Rule 14: tool access patterns with `*` in middle generate warning.
    if let Some(ref tool_access) = plc.tool_access {
        for entry in tool_access {
            if entry.contains('*') && entry != "*" {
                errors.push(ValidationError {
                    field: format!("{}.tool_access", field_prefix),
                    message: format!(
                        "glob-like pattern '{}' detected; ensure pattern matching is intended",
                        entry
                    ),
                    severity: ValidationSeverity::Warning,
                });
            }
        }
    }
}

// ── Escalation validation ───────────────────────────────────────────────

/// Rules 15-16: escalation validations.
fn validate_escalation(config: &RoutingConfig, errors: &mut Vec<ValidationError>) {
    // Rule 15: max_escalation_tiers > 0 when escalation is enabled.
    if config.escalation.enabled && config.escalation.max_escalation_tiers == 0 {
        errors.push(ValidationError {
            field: "routing.escalation.max_escalation_tiers".into(),
            message: "max_escalation_tiers must be > 0 when escalation is enabled".into(),
            severity: ValidationSeverity::Error,
        });
    }

    // Rule 16: escalation threshold in [0.0, 1.0].
    if config.escalation.threshold < 0.0 || config.escalation.threshold > 1.0 {
        errors.push(ValidationError {
            field: "routing.escalation.threshold".into(),
            message: format!(
                "escalation threshold {} must be in [0.0, 1.0]",
                config.escalation.threshold
            ),
            severity: ValidationSeverity::Error,
        });
    }

    // Warning: max_escalation_tiers exceeds defined tier count.
    if config.escalation.max_escalation_tiers > config.tiers.len() as u32 {
        errors.push(ValidationError {
            field: "routing.escalation.max_escalation_tiers".into(),
            message: format!(
                "max_escalation_tiers ({}) exceeds the number of defined tiers ({})",
                config.escalation.max_escalation_tiers,
                config.tiers.len()
            ),
            severity: ValidationSeverity::Warning,
        });
    }
}

// ── Cost budget validation ──────────────────────────────────────────────

/// Cost budget validations.
fn validate_cost_budgets(config: &RoutingConfig, errors: &mut Vec<ValidationError>) {
    if config.cost_budgets.global_daily_limit_usd < 0.0 {
        errors.push(ValidationError {
            field: "routing.cost_budgets.global_daily_limit_usd".into(),
            message: format!(
                "global_daily_limit_usd {} must be non-negative",
                config.cost_budgets.global_daily_limit_usd
            ),
            severity: ValidationSeverity::Error,
        });
    }

    if config.cost_budgets.global_monthly_limit_usd < 0.0 {
        errors.push(ValidationError {
            field: "routing.cost_budgets.global_monthly_limit_usd".into(),
            message: format!(
                "global_monthly_limit_usd {} must be non-negative",
                config.cost_budgets.global_monthly_limit_usd
            ),
            severity: ValidationSeverity::Error,
        });
    }

    if config.cost_budgets.reset_hour_utc > 23 {
        errors.push(ValidationError {
            field: "routing.cost_budgets.reset_hour_utc".into(),
            message: format!(
                "reset_hour_utc {} must be 0-23",
                config.cost_budgets.reset_hour_utc
            ),
            severity: ValidationSeverity::Error,
        });
    }
}

// ── Rate limiting validation ────────────────────────────────────────────

/// Rate limiting validations.
fn validate_rate_limiting(config: &RoutingConfig, errors: &mut Vec<ValidationError>) {
    if config.rate_limiting.window_seconds == 0 {
        errors.push(ValidationError {
            field: "routing.rate_limiting.window_seconds".into(),
            message: "window_seconds must be > 0".into(),
            severity: ValidationSeverity::Error,
        });
    }

    let valid_strategies = ["sliding_window", "fixed_window"];
    if !valid_strategies.contains(&config.rate_limiting.strategy.as_str()) {
        errors.push(ValidationError {
            field: "routing.rate_limiting.strategy".into(),
            message: format!(
                "unknown strategy '{}', expected 'sliding_window' or 'fixed_window'",
                config.rate_limiting.strategy
            ),
            severity: ValidationSeverity::Error,
        });
    }
}

// ── Fallback model validation ───────────────────────────────────────────

/// Rule 17: fallback model format.
fn validate_fallback_model(config: &RoutingConfig, errors: &mut Vec<ValidationError>) {
    if let Some(ref model) = config.fallback_model
        && !model.contains('/') {
            errors.push(ValidationError {
                field: "routing.fallback_model".into(),
                message: format!(
                    "fallback_model '{}' should match 'provider/model' format",
                    model
                ),
                severity: ValidationSeverity::Warning,
            });
        }
}

// ── Workspace ceiling enforcement (FIX-04) ──────────────────────────────

/// Default maximum grantable permission level for workspace configs.
///
/// Until `max_grantable_level` is added to [`RoutingConfig`], this constant
/// provides the default ceiling. Workspaces cannot grant levels above this.
const DEFAULT_MAX_GRANTABLE_LEVEL: u8 = 1;

/// Validate that a workspace config does not exceed the global config ceiling.
///
/// Returns a [`Vec`] of validation errors for any ceiling violations found.
/// An empty [`Vec`] means the workspace is within bounds.
///
/// Security-sensitive ceiling fields:
/// - `level`: cannot exceed `DEFAULT_MAX_GRANTABLE_LEVEL` (1)
/// - `escalation_allowed`: cannot be true if global is false
/// - `tool_access`: cannot add tools not in global allowlist
/// - `rate_limit`: workspace cannot increase beyond global
/// - `cost_budget_daily_usd`: workspace cannot increase
/// - `cost_budget_monthly_usd`: workspace cannot increase
/// - `max_tier`: cannot upgrade beyond global's max_tier
pub fn validate_workspace_ceiling(
    global: &RoutingConfig,
    workspace: &RoutingConfig,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let max_grantable = DEFAULT_MAX_GRANTABLE_LEVEL;

    // Check the three named permission levels.
    check_level_ceiling(
        &workspace.permissions.zero_trust,
        "routing.permissions.zero_trust",
        &global.permissions.zero_trust,
        max_grantable,
        &mut errors,
    );
    check_level_ceiling(
        &workspace.permissions.user,
        "routing.permissions.user",
        &global.permissions.user,
        max_grantable,
        &mut errors,
    );
    check_level_ceiling(
        &workspace.permissions.admin,
        "routing.permissions.admin",
        &global.permissions.admin,
        max_grantable,
        &mut errors,
    );

    // Check per-user overrides.
    for (user_id, ws_plc) in &workspace.permissions.users {
        let global_plc = global
            .permissions
            .users
            .get(user_id)
            .unwrap_or(&global.permissions.user);
        check_level_ceiling(
            ws_plc,
            &format!("routing.permissions.users.{}", user_id),
            global_plc,
            max_grantable,
            &mut errors,
        );
    }

    // Check per-channel overrides.
    for (channel, ws_plc) in &workspace.permissions.channels {
        let global_plc = global
            .permissions
            .channels
            .get(channel)
            .unwrap_or(&global.permissions.user);
        check_level_ceiling(
            ws_plc,
            &format!("routing.permissions.channels.{}", channel),
            global_plc,
            max_grantable,
            &mut errors,
        );
    }

    errors
}

/// Check a single workspace permission level against the global ceiling.
fn check_level_ceiling(
    ws_plc: &PermissionLevelConfig,
    field_prefix: &str,
    global_plc: &PermissionLevelConfig,
    max_grantable: u8,
    errors: &mut Vec<ValidationError>,
) {
    // Level ceiling: workspace cannot grant level above max_grantable_level.
    if let Some(ws_level) = ws_plc.level
        && ws_level > max_grantable {
            errors.push(ValidationError {
                field: format!("{}.level", field_prefix),
                message: format!(
                    "workspace level {} exceeds max_grantable_level {}",
                    ws_level, max_grantable
                ),
                severity: ValidationSeverity::Error,
            });
        }

    // Escalation ceiling: workspace cannot enable escalation if global disables it.
    if let (Some(true), Some(false)) = (ws_plc.escalation_allowed, global_plc.escalation_allowed) {
        errors.push(ValidationError {
            field: format!("{}.escalation_allowed", field_prefix),
            message: "workspace cannot enable escalation when global disables it".into(),
            severity: ValidationSeverity::Error,
        });
    }

    // Tool access ceiling: workspace cannot add tools not in global allowlist.
    if let (Some(ws_tools), Some(global_tools)) =
        (&ws_plc.tool_access, &global_plc.tool_access)
    {
        // If global is ["*"], anything goes.
        if !global_tools.iter().any(|s| s == "*") {
            for ws_tool in ws_tools {
                if ws_tool == "*" {
                    errors.push(ValidationError {
                        field: format!("{}.tool_access", field_prefix),
                        message: "workspace cannot grant wildcard tool access \
                                  when global does not"
                            .into(),
                        severity: ValidationSeverity::Error,
                    });
                } else if !global_tools.contains(ws_tool) {
                    errors.push(ValidationError {
                        field: format!("{}.tool_access", field_prefix),
                        message: format!("workspace tool '{}' not in global tool_access", ws_tool),
                        severity: ValidationSeverity::Error,
                    });
                }
            }
        }
    }

    // Rate limit ceiling: workspace cannot increase beyond global.
    if let (Some(ws_rate), Some(global_rate)) = (ws_plc.rate_limit, global_plc.rate_limit)
        && global_rate > 0 && (ws_rate > global_rate || ws_rate == 0) {
            errors.push(ValidationError {
                field: format!("{}.rate_limit", field_prefix),
                message: format!(
                    "workspace rate_limit {} exceeds global ceiling {}",
                    ws_rate, global_rate
                ),
                severity: ValidationSeverity::Error,
            });
        }

    // Cost budget daily ceiling.
    if let (Some(ws_daily), Some(global_daily)) = (
        ws_plc.cost_budget_daily_usd,
        global_plc.cost_budget_daily_usd,
    )
        && global_daily > 0.0 && (ws_daily > global_daily || ws_daily == 0.0) {
            errors.push(ValidationError {
                field: format!("{}.cost_budget_daily_usd", field_prefix),
                message: format!(
                    "workspace daily budget {} exceeds global ceiling {}",
                    ws_daily, global_daily
                ),
                severity: ValidationSeverity::Error,
            });
        }

    // Cost budget monthly ceiling.
    if let (Some(ws_monthly), Some(global_monthly)) = (
        ws_plc.cost_budget_monthly_usd,
        global_plc.cost_budget_monthly_usd,
    )
        && global_monthly > 0.0 && (ws_monthly > global_monthly || ws_monthly == 0.0) {
            errors.push(ValidationError {
                field: format!("{}.cost_budget_monthly_usd", field_prefix),
                message: format!(
                    "workspace monthly budget {} exceeds global ceiling {}",
                    ws_monthly, global_monthly
                ),
                severity: ValidationSeverity::Error,
            });
        }
}

// ── Default tiers ───────────────────────────────────────────────────────

/// Generate a set of default tiers when mode is `"tiered"` but no tiers
/// are configured.
///
/// This enables the minimal config migration path:
/// ```json
/// { "routing": { "mode": "tiered" } }
/// ```
///
/// Returns three standard tiers: free, standard, and premium.
pub fn default_tiers() -> Vec<ModelTierConfig> {
    vec![
        ModelTierConfig {
            name: "free".into(),
            models: vec![
                "openrouter/meta-llama/llama-3.1-8b-instruct:free".into(),
                "groq/llama-3.1-8b".into(),
            ],
            complexity_range: [0.0, 0.3],
            cost_per_1k_tokens: 0.0,
            max_context_tokens: 8192,
        },
        ModelTierConfig {
            name: "standard".into(),
            models: vec![
                "anthropic/claude-haiku-3.5".into(),
                "openai/gpt-4o-mini".into(),
                "groq/llama-3.3-70b".into(),
            ],
            complexity_range: [0.0, 0.7],
            cost_per_1k_tokens: 0.001,
            max_context_tokens: 16384,
        },
        ModelTierConfig {
            name: "premium".into(),
            models: vec![
                "anthropic/claude-sonnet-4-20250514".into(),
                "openai/gpt-4o".into(),
            ],
            complexity_range: [0.3, 1.0],
            cost_per_1k_tokens: 0.01,
            max_context_tokens: 200_000,
        },
    ]
}

// ── Tests ───────────────────────────────────────────────────────────────
