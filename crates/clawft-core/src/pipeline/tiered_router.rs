//! Tiered router (Level 1 implementation).
//!
//! Selects models based on task complexity, user permissions, and cost
//! budgets. Implements the [`ModelRouter`] trait as a drop-in replacement
//! for `StaticRouter` when `routing.mode == "tiered"`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use clawft_types::routing::{
    AuthContext, EscalationConfig, RoutingConfig,
    TierSelectionStrategy, UserPermissions,
};

use super::traits::{
    BudgetResult, ChatRequest, CostTrackable, ModelRouter, RateLimitable,
    ResponseOutcome, RoutingDecision, TaskProfile,
};

// ── ModelTier runtime struct ────────────────────────────────────────────

/// Runtime representation of a model tier with routing state.
///
/// Built from [`ModelTierConfig`] during [`TieredRouter::new`].
/// The `ordinal` field tracks position in the cheapest-to-most-expensive
/// ordering for efficient comparison.
#[derive(Debug, Clone)]
pub struct ModelTier {
    /// Tier name (e.g., "free", "standard", "premium", "elite").
    pub name: String,
    /// Models available in this tier, in preference order.
    /// Format: "provider/model" (e.g., "anthropic/claude-haiku-3.5").
    pub models: Vec<String>,
    /// Complexity range this tier covers: [min, max] (both inclusive).
    pub complexity_range: [f32; 2],
    /// Approximate cost per 1K tokens (blended input/output) in USD.
    pub cost_per_1k_tokens: f64,
    /// Maximum context tokens supported by models in this tier.
    pub max_context_tokens: usize,
    /// Ordinal position in the tier list (0 = cheapest).
    pub ordinal: usize,
}

impl ModelTier {
    /// Returns true if the given complexity falls within this tier's range
    /// (inclusive on both ends).
    pub fn matches_complexity(&self, complexity: f32) -> bool {
        complexity >= self.complexity_range[0] && complexity <= self.complexity_range[1]
    }
}

// ── No-op implementations ───────────────────────────────────────────────

/// No-op cost tracker for when budget enforcement is disabled.
pub struct NoopCostTracker;

impl CostTrackable for NoopCostTracker {
    fn check_budget(
        &self,
        _sender_id: &str,
        _estimated_cost: f64,
        _daily_limit: f64,
        _monthly_limit: f64,
    ) -> BudgetResult {
        BudgetResult::Approved
    }

    fn record_estimated(&self, _sender_id: &str, _estimated_cost: f64) {}

    fn record_actual(&self, _sender_id: &str, _estimated_cost: f64, _actual_cost: f64) {}
}

/// No-op rate limiter for when rate limiting is disabled.
pub struct NoopRateLimiter;

impl RateLimitable for NoopRateLimiter {
    fn check(&self, _sender_id: &str, _limit: u32) -> bool {
        true
    }
}

// ── Internal helper types ───────────────────────────────────────────────

/// Internal result of tier selection.
struct TierSelection<'a> {
    tier: &'a ModelTier,
    escalated: bool,
}

/// Internal result of budget constraint evaluation.
struct TierBudgetResult<'a> {
    tier: &'a ModelTier,
    constrained: bool,
}

// ── TieredRouter ────────────────────────────────────────────────────────

/// Level 1 router that selects models based on task complexity,
/// user permissions, and cost budgets.
///
/// Implements [`ModelRouter`] as a drop-in replacement for `StaticRouter`
/// when `routing.mode == "tiered"`.
pub struct TieredRouter {
    /// Configured model tiers, ordered cheapest to most expensive.
    tiers: Vec<ModelTier>,
    /// Tier name -> ordinal index for O(1) lookup of max_tier boundaries.
    tier_index: HashMap<String, usize>,
    /// Model selection strategy within a tier.
    selection_strategy: TierSelectionStrategy,
    /// Round-robin counters per tier (tier ordinal -> atomic counter).
    round_robin_counters: Vec<AtomicUsize>,
    /// Escalation configuration from routing config.
    escalation_config: EscalationConfig,
    /// Fallback model when all tiers are exhausted or budget-blocked.
    /// Format: "provider/model".
    fallback_model: Option<String>,
    /// Cost tracker for budget enforcement.
    cost_tracker: Option<Arc<dyn CostTrackable>>,
    /// Rate limiter for per-user throttling.
    rate_limiter: Option<Arc<dyn RateLimitable>>,
}

impl TieredRouter {
    /// Create a TieredRouter from routing configuration.
    pub fn new(config: RoutingConfig) -> Self {
        let tiers: Vec<ModelTier> = config
            .tiers
            .iter()
            .enumerate()
            .map(|(i, t)| ModelTier {
                name: t.name.clone(),
                models: t.models.clone(),
                complexity_range: t.complexity_range,
                cost_per_1k_tokens: t.cost_per_1k_tokens,
                max_context_tokens: t.max_context_tokens,
                ordinal: i,
            })
            .collect();

        let tier_index: HashMap<String, usize> =
            tiers.iter().map(|t| (t.name.clone(), t.ordinal)).collect();

        let round_robin_counters: Vec<AtomicUsize> =
            (0..tiers.len()).map(|_| AtomicUsize::new(0)).collect();

        let selection_strategy = config
            .selection_strategy
            .unwrap_or(TierSelectionStrategy::PreferenceOrder);

        Self {
            tiers,
            tier_index,
            selection_strategy,
            round_robin_counters,
            escalation_config: config.escalation,
            fallback_model: config.fallback_model,
            cost_tracker: None,
            rate_limiter: None,
        }
    }

    /// Set a cost tracker for budget enforcement (builder pattern).
    pub fn with_cost_tracker(mut self, tracker: Arc<dyn CostTrackable>) -> Self {
        self.cost_tracker = Some(tracker);
        self
    }

    /// Set a rate limiter (builder pattern).
    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimitable>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    // ── Tier filtering ──────────────────────────────────────────────

    /// Filter tiers to only those the user is allowed to access.
    ///
    /// Returns tiers at or below the user's `max_tier`, preserving
    /// the cheapest-first ordering from config.
    fn filter_tiers_by_permissions<'a>(
        &'a self,
        permissions: &UserPermissions,
    ) -> Vec<&'a ModelTier> {
        let max_ordinal = self
            .tier_index
            .get(&permissions.max_tier)
            .copied()
            .unwrap_or(usize::MAX); // Unknown tier name -> allow all tiers

        self.tiers
            .iter()
            .filter(|t| t.ordinal <= max_ordinal)
            .collect()
    }

    // ── Tier selection ──────────────────────────────────────────────

    /// Select the best tier for the given complexity, respecting permissions.
    ///
    /// Algorithm:
    /// 1. Find all allowed tiers whose complexity_range covers the task
    ///    complexity.
    /// 2. Among matches, pick the highest-quality (highest ordinal) tier.
    /// 3. If no match, check escalation eligibility.
    /// 4. If escalation allowed, try tiers above max_tier (up to
    ///    max_escalation_tiers).
    /// 5. If still no match, fall back to the highest allowed tier.
    fn select_tier<'a>(
        &'a self,
        complexity: f32,
        allowed_tiers: &[&'a ModelTier],
        permissions: &UserPermissions,
    ) -> TierSelection<'a> {
        // Step 1: Find matching tiers within permission boundary
        let matching: Vec<&&ModelTier> = allowed_tiers
            .iter()
            .filter(|t| t.matches_complexity(complexity))
            .collect();

        // Step 2: Pick the highest-quality match
        if let Some(best) = matching.iter().max_by_key(|t| t.ordinal) {
            return TierSelection {
                tier: best,
                escalated: false,
            };
        }

        // Step 3: No allowed tier matches -- try escalation
        if permissions.escalation_allowed
            && self.escalation_config.enabled
            && complexity > permissions.escalation_threshold
        {
            let max_ordinal = self
                .tier_index
                .get(&permissions.max_tier)
                .copied()
                .unwrap_or(0);

            let max_escalation = self.escalation_config.max_escalation_tiers;

            // Look at tiers above the user's max_tier, up to max_escalation_tiers
            let escalation_candidates: Vec<&ModelTier> = self
                .tiers
                .iter()
                .filter(|t| {
                    t.ordinal > max_ordinal
                        && t.ordinal <= max_ordinal + max_escalation as usize
                        && t.matches_complexity(complexity)
                })
                .collect();

            if let Some(best) = escalation_candidates.iter().max_by_key(|t| t.ordinal) {
                tracing::info!(
                    user_max_tier = %permissions.max_tier,
                    escalated_to = %best.name,
                    complexity = %complexity,
                    "escalation applied: promoting beyond max_tier"
                );
                return TierSelection {
                    tier: best,
                    escalated: true,
                };
            }
        }

        // Step 4: No match even with escalation -- fall back to highest allowed tier
        if let Some(highest) = allowed_tiers.iter().max_by_key(|t| t.ordinal) {
            return TierSelection {
                tier: highest,
                escalated: false,
            };
        }

        // Should not reach here if tiers list is non-empty, but handle gracefully
        TierSelection {
            tier: &self.tiers[0],
            escalated: false,
        }
    }

    // ── Budget constraints ──────────────────────────────────────────

    /// Apply budget constraints to the selected tier.
    ///
    /// If the estimated cost of the selected tier would push the user over
    /// their daily budget, fall back to cheaper tiers until one fits or all
    /// tiers are exhausted.
    fn apply_budget_constraints<'a>(
        &'a self,
        selected: &'a ModelTier,
        allowed_tiers: &[&'a ModelTier],
        auth: &AuthContext,
        permissions: &UserPermissions,
    ) -> TierBudgetResult<'a> {
        let cost_tracker = match &self.cost_tracker {
            Some(ct) => ct,
            None => return TierBudgetResult { tier: selected, constrained: false },
        };

        // If budget is unlimited (0.0), skip checking
        if permissions.cost_budget_daily_usd <= 0.0
            && permissions.cost_budget_monthly_usd <= 0.0
        {
            return TierBudgetResult {
                tier: selected,
                constrained: false,
            };
        }

        let estimated_cost = selected.cost_per_1k_tokens;

        let budget_check = cost_tracker.check_budget(
            &auth.sender_id,
            estimated_cost,
            permissions.cost_budget_daily_usd,
            permissions.cost_budget_monthly_usd,
        );

        if budget_check == BudgetResult::Approved {
            return TierBudgetResult {
                tier: selected,
                constrained: false,
            };
        }

        tracing::info!(
            user = %auth.sender_id,
            selected_tier = %selected.name,
            estimated_cost = %estimated_cost,
            daily_limit = %permissions.cost_budget_daily_usd,
            monthly_limit = %permissions.cost_budget_monthly_usd,
            "budget constraint triggered: attempting tier downgrade"
        );

        // Budget would be exceeded -- fall back to cheaper tiers
        let mut candidates: Vec<&&ModelTier> = allowed_tiers
            .iter()
            .filter(|t| t.ordinal < selected.ordinal)
            .collect();
        candidates.sort_by(|a, b| b.ordinal.cmp(&a.ordinal)); // highest first

        for candidate in candidates {
            let candidate_cost = candidate.cost_per_1k_tokens;
            let candidate_check = cost_tracker.check_budget(
                &auth.sender_id,
                candidate_cost,
                permissions.cost_budget_daily_usd,
                permissions.cost_budget_monthly_usd,
            );
            if candidate_check == BudgetResult::Approved {
                return TierBudgetResult {
                    tier: candidate,
                    constrained: true,
                };
            }
        }

        // No tier fits -- use the cheapest tier anyway (overage is recorded)
        if let Some(cheapest) = allowed_tiers.iter().min_by_key(|t| t.ordinal) {
            return TierBudgetResult {
                tier: cheapest,
                constrained: true,
            };
        }

        TierBudgetResult {
            tier: selected,
            constrained: true,
        }
    }

    // ── Model selection ─────────────────────────────────────────────

    /// Select a specific model from the tier's model list.
    ///
    /// Applies the configured selection strategy and filters by the user's
    /// model_access allowlist and model_denylist.
    fn select_model(
        &self,
        tier: &ModelTier,
        permissions: &UserPermissions,
    ) -> Option<(String, String)> {
        let available = self.filter_models_by_permissions(&tier.models, permissions);
        if available.is_empty() {
            return None;
        }

        let selected = match &self.selection_strategy {
            TierSelectionStrategy::PreferenceOrder => available[0].clone(),
            TierSelectionStrategy::RoundRobin => {
                let counter = &self.round_robin_counters[tier.ordinal];
                let idx = counter.fetch_add(1, Ordering::Relaxed) % available.len();
                available[idx].clone()
            }
            TierSelectionStrategy::LowestCost => {
                // Within a tier all models share cost_per_1k_tokens;
                // just pick the first one.
                available[0].clone()
            }
            TierSelectionStrategy::Random => {
                // Use a simple hash-based selection to avoid needing the rand crate.
                let seed = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_nanos())
                    .unwrap_or(0);
                let idx = (seed as usize) % available.len();
                available[idx].clone()
            }
        };

        Some(split_provider_model(&selected))
    }

    /// Filter a tier's model list against user permission allowlist/denylist.
    fn filter_models_by_permissions(
        &self,
        models: &[String],
        permissions: &UserPermissions,
    ) -> Vec<String> {
        models
            .iter()
            .filter(|m| {
                // Allowlist check (empty = all allowed)
                let allowed = permissions.model_access.is_empty()
                    || permissions
                        .model_access
                        .iter()
                        .any(|p| model_matches_pattern(m, p));
                // Denylist check
                let denied = permissions
                    .model_denylist
                    .iter()
                    .any(|p| model_matches_pattern(m, p));
                allowed && !denied
            })
            .cloned()
            .collect()
    }

    // ── Fallback chain ──────────────────────────────────────────────

    /// Execute the fallback chain when the primary tier's models are all
    /// unavailable.
    ///
    /// Chain: lower tiers (descending quality) -> fallback_model -> None
    fn fallback_chain(
        &self,
        primary_tier: &ModelTier,
        allowed_tiers: &[&ModelTier],
        permissions: &UserPermissions,
    ) -> Option<(String, String, String)> {
        let max_ordinal = self
            .tier_index
            .get(&permissions.max_tier)
            .copied()
            .unwrap_or(0);

        // 1. Try lower tiers in descending quality order
        let mut lower_tiers: Vec<&&ModelTier> = allowed_tiers
            .iter()
            .filter(|t| t.ordinal < primary_tier.ordinal)
            .collect();
        lower_tiers.sort_by(|a, b| b.ordinal.cmp(&a.ordinal));

        for tier in lower_tiers {
            if tier.ordinal > max_ordinal {
                continue;
            }
            if let Some((provider, model)) = self.select_model(tier, permissions) {
                let reason = format!(
                    "fallback from tier '{}' to tier '{}'",
                    primary_tier.name, tier.name
                );
                return Some((provider, model, reason));
            }
        }

        // 2. Try the global fallback model -- but only if it belongs to a
        // permitted tier
        if let Some(ref fallback) = self.fallback_model {
            let fallback_tier_ordinal = self
                .tiers
                .iter()
                .find(|t| t.models.iter().any(|m| m == fallback))
                .map(|t| t.ordinal);

            match fallback_tier_ordinal {
                Some(ordinal) if ordinal > max_ordinal => {
                    // Fallback model is in a tier above user's permission level.
                    tracing::info!(
                        fallback_model = %fallback,
                        fallback_tier_ordinal = %ordinal,
                        user_max_ordinal = %max_ordinal,
                        "fallback chain: fallback_model denied -- tier above user max_tier"
                    );
                    // Do NOT return the fallback -- fall through to None
                }
                _ => {
                    let (provider, model) = split_provider_model(fallback);
                    let reason = format!(
                        "fallback to configured fallback_model '{}'",
                        fallback
                    );
                    return Some((provider, model, reason));
                }
            }
        }

        // 3. No models available
        None
    }

    // ── Decision helpers ────────────────────────────────────────────

    /// Build a RoutingDecision for rate-limited requests.
    fn rate_limited_decision(&self, permissions: &UserPermissions) -> RoutingDecision {
        let max_ordinal = self
            .tier_index
            .get(&permissions.max_tier)
            .copied()
            .unwrap_or(0);

        if let Some(ref fallback) = self.fallback_model {
            let fallback_tier_ordinal = self
                .tiers
                .iter()
                .find(|t| t.models.iter().any(|m| m == fallback))
                .map(|t| t.ordinal);

            if let Some(ordinal) = fallback_tier_ordinal
                && ordinal > max_ordinal {
                    return RoutingDecision {
                        provider: String::new(),
                        model: String::new(),
                        reason: "rate limited: fallback model not permitted for user tier"
                            .into(),
                        ..Default::default()
                    };
                }

            let (provider, model) = split_provider_model(fallback);
            RoutingDecision {
                provider,
                model,
                reason: "rate limited: using fallback model".into(),
                ..Default::default()
            }
        } else {
            RoutingDecision {
                provider: String::new(),
                model: String::new(),
                reason: "rate limited: no fallback model configured".into(),
                budget_constrained: true,
                ..Default::default()
            }
        }
    }

    /// Build a RoutingDecision when no tiers are available at all.
    fn no_tiers_available_decision(&self) -> RoutingDecision {
        if let Some(ref fallback) = self.fallback_model {
            let (provider, model) = split_provider_model(fallback);
            RoutingDecision {
                provider,
                model,
                reason: "no tiers available: using fallback model".into(),
                ..Default::default()
            }
        } else {
            RoutingDecision {
                provider: String::new(),
                model: String::new(),
                reason: "no tiers or fallback model available".into(),
                ..Default::default()
            }
        }
    }
}

// ── ModelRouter trait implementation ─────────────────────────────────────

#[async_trait]
impl ModelRouter for TieredRouter {
    async fn route(
        &self,
        request: &ChatRequest,
        profile: &TaskProfile,
    ) -> RoutingDecision {
        // Step 1: Extract auth context
        let auth = request
            .auth_context
            .as_ref()
            .cloned()
            .unwrap_or_default(); // zero-trust if absent

        // Step 2: Read pre-resolved permissions
        let default_permissions = UserPermissions::default();
        let permissions = request
            .auth_context
            .as_ref()
            .map(|a| &a.permissions)
            .unwrap_or(&default_permissions);

        tracing::info!(
            sender = %auth.sender_id,
            channel = %auth.channel,
            complexity = %profile.complexity,
            max_tier = %permissions.max_tier,
            level = %permissions.level,
            "route: starting tiered routing decision"
        );

        // Step 3: Check rate limit
        if let Some(ref limiter) = self.rate_limiter
            && permissions.rate_limit > 0
                && !limiter.check(&auth.sender_id, permissions.rate_limit)
            {
                tracing::info!(sender = %auth.sender_id, "route: rate limited");
                return self.rate_limited_decision(permissions);
            }

        // Step 4: Filter tiers by permission level
        let allowed_tiers = self.filter_tiers_by_permissions(permissions);
        if allowed_tiers.is_empty() {
            tracing::info!(sender = %auth.sender_id, "route: no tiers available");
            return self.no_tiers_available_decision();
        }

        // Step 5: Select tier by complexity (with escalation)
        let tier_selection =
            self.select_tier(profile.complexity, &allowed_tiers, permissions);

        // Step 6: Apply budget constraints
        let budget_result = self.apply_budget_constraints(
            tier_selection.tier,
            &allowed_tiers,
            &auth,
            permissions,
        );

        let final_tier = budget_result.tier;
        let escalated = tier_selection.escalated;
        let budget_constrained = budget_result.constrained;

        // Step 7: Select model from tier
        let (provider, model) = match self.select_model(final_tier, permissions) {
            Some(pm) => pm,
            None => {
                // No models available in selected tier -- try fallback chain
                match self.fallback_chain(final_tier, &allowed_tiers, permissions) {
                    Some((p, m, reason)) => {
                        return RoutingDecision {
                            provider: p,
                            model: m,
                            reason,
                            tier: Some(final_tier.name.clone()),
                            cost_estimate_usd: Some(final_tier.cost_per_1k_tokens),
                            escalated,
                            budget_constrained,
                            sender_id: Some(auth.sender_id.clone()),
                        };
                    }
                    None => return self.no_tiers_available_decision(),
                }
            }
        };

        // Step 8: Record estimated cost + build decision
        let cost_estimate = final_tier.cost_per_1k_tokens;
        if let Some(ref tracker) = self.cost_tracker {
            tracker.record_estimated(&auth.sender_id, cost_estimate);
        }

        tracing::info!(
            sender = %auth.sender_id,
            provider = %provider,
            model = %model,
            tier = %final_tier.name,
            cost_estimate_usd = %cost_estimate,
            escalated = %escalated,
            budget_constrained = %budget_constrained,
            "route: decision made"
        );

        RoutingDecision {
            provider,
            model,
            reason: format!(
                "tiered routing: complexity={:.2}, tier={}, level={}, user={}",
                profile.complexity, final_tier.name, permissions.level, auth.sender_id,
            ),
            tier: Some(final_tier.name.clone()),
            cost_estimate_usd: Some(cost_estimate),
            escalated,
            budget_constrained,
            sender_id: Some(auth.sender_id.clone()),
        }
    }

    fn update(&self, decision: &RoutingDecision, _outcome: &ResponseOutcome) {
        // Record actual cost after response is received.
        // For now, cost_estimate_usd is used as a proxy for actual cost.
        // A proper cost calculation from token usage will be added later.
        if let (Some(cost), Some(sender_id)) =
            (decision.cost_estimate_usd, &decision.sender_id)
            && let Some(ref tracker) = self.cost_tracker
        {
            // Reconcile: actual == estimated for now (no token-based cost yet)
            tracker.record_actual(sender_id, cost, cost);
        }
    }
}

// ── Debug implementation ────────────────────────────────────────────────

impl std::fmt::Debug for TieredRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredRouter")
            .field(
                "tiers",
                &self.tiers.iter().map(|t| &t.name).collect::<Vec<_>>(),
            )
            .field("selection_strategy", &self.selection_strategy)
            .field("escalation_config", &self.escalation_config)
            .field("fallback_model", &self.fallback_model)
            .finish()
    }
}

// ── Helper functions ────────────────────────────────────────────────────

/// Check if a model name matches a glob-style pattern.
/// Supports exact match, prefix wildcard ("anthropic/*"), full wildcard ("*").
fn model_matches_pattern(model: &str, pattern: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        return model.starts_with(prefix);
    }
    model == pattern
}

/// Split a "provider/model" string into (provider, model).
/// If no slash, defaults provider to "openai".
fn split_provider_model(s: &str) -> (String, String) {
    if let Some(idx) = s.find('/') {
        (s[..idx].to_string(), s[idx + 1..].to_string())
    } else {
        ("openai".to_string(), s.to_string())
    }
}

// ── Tests ───────────────────────────────────────────────────────────────
