//! # terr-core: Territory Assignment Domain Model
//!
//! Provides the fundamental data structures for the territory assignment optimizer:
//! accounts, reps, the validated `Configuration` snapshot, and the output `Proposal`
//! entity. This crate is pure data plus constructor-time validation: no solving logic
//! lives here (see `terr_algo`) and no I/O lives here (see `terr_cli`).
//!
//! ## Modules
//!
//! - [`diagnostics`]: non-fatal issue collection threaded through a solve.
//! - [`error`]: the `FatalError` taxonomy (§7): configuration and input-invariant errors.
//! - [`classify`]: domain constants and pure classifier functions (tier, ARR, region).
//!
//! ## ID System
//!
//! Account and rep ids are opaque strings from the caller's system of record. They are
//! wrapped in newtypes ([`AccountId`], [`RepId`]) so the compiler catches a transposed
//! argument at the call site rather than at runtime.

pub mod classify;
pub mod diagnostics;
pub mod error;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use error::{ConfigurationError, FatalError, FatalResult, InputInvariantError};

/// Opaque identifier for an [`Account`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(value: impl Into<String>) -> Self {
        AccountId(value.into())
    }
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        AccountId(s.to_string())
    }
}

/// Opaque identifier for a [`Rep`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepId(pub String);

impl RepId {
    pub fn new(value: impl Into<String>) -> Self {
        RepId(value.into())
    }
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RepId {
    fn from(s: &str) -> Self {
        RepId(s.to_string())
    }
}

/// Team tier classification, matched against account size (see [`classify::classify_team_tier`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamTier {
    Smb,
    Growth,
    Mm,
    Ent,
}

impl TeamTier {
    /// Distance index used by team-alignment scoring (§4.3.3): SMB=0 .. ENT=3.
    pub fn index(self) -> i32 {
        match self {
            TeamTier::Smb => 0,
            TeamTier::Growth => 1,
            TeamTier::Mm => 2,
            TeamTier::Ent => 3,
        }
    }
}

/// A company that needs to be assigned to exactly one rep (§3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub parent_id: Option<AccountId>,
    pub is_parent: bool,
    pub current_owner_id: Option<RepId>,
    pub owner_change_date: Option<chrono::NaiveDate>,
    pub owners_lifetime_count: u32,
    pub arr_primary: Option<f64>,
    pub arr_fallback: Option<f64>,
    pub arr_legacy: Option<f64>,
    pub atr: f64,
    pub pipeline_value: f64,
    pub employees: Option<u64>,
    pub tier_override: Option<String>,
    pub territory_raw: Option<String>,
    pub is_strategic: bool,
    pub exclude_from_reassignment: bool,
    pub cre_risk: bool,
    pub renewal_date: Option<chrono::NaiveDate>,
    pub pe_firm: Option<String>,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            id: AccountId::new(""),
            name: String::new(),
            parent_id: None,
            is_parent: false,
            current_owner_id: None,
            owner_change_date: None,
            owners_lifetime_count: 0,
            arr_primary: None,
            arr_fallback: None,
            arr_legacy: None,
            atr: 0.0,
            pipeline_value: 0.0,
            employees: None,
            tier_override: None,
            territory_raw: None,
            is_strategic: false,
            exclude_from_reassignment: false,
            cre_risk: false,
            renewal_date: None,
            pe_firm: None,
        }
    }
}

impl Account {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: AccountId::new(id),
            ..Default::default()
        }
    }
}

/// A sales representative who can be assigned accounts (§3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rep {
    pub id: RepId,
    pub name: String,
    pub region: Option<String>,
    pub team_tier: Option<TeamTier>,
    pub is_active: bool,
    pub include_in_assignments: bool,
    pub is_strategic_rep: bool,
    pub is_backfill_source: bool,
    pub backfill_target_rep_id: Option<RepId>,
    pub capacity_max_arr: Option<f64>,
    pub capacity_max_cre: Option<f64>,
    pub capacity_max_accounts: Option<u32>,
}

impl Default for Rep {
    fn default() -> Self {
        Self {
            id: RepId::new(""),
            name: String::new(),
            region: None,
            team_tier: None,
            is_active: true,
            include_in_assignments: true,
            is_strategic_rep: false,
            is_backfill_source: false,
            backfill_target_rep_id: None,
            capacity_max_arr: None,
            capacity_max_cre: None,
            capacity_max_accounts: None,
        }
    }
}

impl Rep {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: RepId::new(id),
            ..Default::default()
        }
    }

    /// A rep is visible to optimization only when active and opted in (§4.5).
    pub fn is_eligible_pool_member(&self) -> bool {
        self.is_active && self.include_in_assignments
    }
}

/// One objective-weight triple (continuity, geography, team_alignment), independently
/// enable-able per axis (§3.1, §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveWeights {
    pub continuity: f64,
    pub continuity_enabled: bool,
    pub geography: f64,
    pub geography_enabled: bool,
    pub team_alignment: f64,
    pub team_alignment_enabled: bool,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            continuity: 0.4,
            continuity_enabled: true,
            geography: 0.3,
            geography_enabled: true,
            team_alignment: 0.3,
            team_alignment_enabled: true,
        }
    }
}

/// Stability-lock feature flags and day-windows (§3.1, §4.4).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StabilityFlags {
    pub manual_lock: bool,
    pub backfill_migration: bool,
    pub cre_risk_lock: bool,
    pub renewal_soon_lock: bool,
    pub renewal_soon_window_days: i64,
    pub pe_firm_lock: bool,
    pub recent_change_lock: bool,
    pub recent_change_window_days: i64,
}

impl Default for StabilityFlags {
    fn default() -> Self {
        Self {
            manual_lock: true,
            backfill_migration: true,
            cre_risk_lock: true,
            renewal_soon_lock: true,
            renewal_soon_window_days: 90,
            pe_firm_lock: true,
            recent_change_lock: true,
            recent_change_window_days: 60,
        }
    }
}

/// Hard/structural constraint toggles (§3.1, §4.5, §4.6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConstraintFlags {
    pub strategic_pool: bool,
    pub locked_accounts: bool,
    pub parent_child_linking: bool,
    pub capacity_hard_cap: bool,
}

impl Default for ConstraintFlags {
    fn default() -> Self {
        Self {
            strategic_pool: true,
            locked_accounts: true,
            parent_child_linking: true,
            capacity_hard_cap: true,
        }
    }
}

/// Soft balance-penalty configuration for one metric (ARR, ATR, or pipeline) (§4.6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BalancePenalty {
    pub enabled: bool,
    pub weight: f64,
}

impl Default for BalancePenalty {
    fn default() -> Self {
        Self {
            enabled: false,
            weight: 0.0,
        }
    }
}

/// Balance penalties for the three metrics named in §4.6.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BalancePenalties {
    pub arr: BalancePenalty,
    pub atr: BalancePenalty,
    pub pipeline: BalancePenalty,
}

/// The numeric constants behind §4.3's scoring functions, defaulted but overridable and
/// validated at `Configuration` construction time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoringConstants {
    // Geography (§4.3.1)
    pub geo_unknown: f64,
    pub geo_exact: f64,
    pub geo_sibling: f64,
    pub geo_same_macro: f64,
    pub geo_cross_region: f64,

    // Continuity (§4.3.2)
    pub continuity_base: f64,
    pub continuity_w_tenure: f64,
    pub continuity_w_breadth: f64,
    pub continuity_w_value: f64,
    pub tenure_max_days: f64,
    pub max_owners: f64,
    pub value_threshold: f64,

    // Team alignment (§4.3.3)
    pub reaching_down_penalty: f64,

    // Thresholds reused by waterfall/rationale (§4.8, §4.11)
    pub sibling_threshold: f64,
    pub parent_continuity_threshold: f64,
    pub min_tier_match_pct: f64,
    pub low_score_threshold: f64,

    /// Cross-region cutoff for the metrics calculator's geography rate (§4.10): a
    /// distinct knob from [`Self::geo_cross_region`], which is a *score value*, not a
    /// rate threshold.
    pub cross_region_metric_threshold: f64,
}

impl Default for ScoringConstants {
    fn default() -> Self {
        Self {
            geo_unknown: 0.50,
            geo_exact: 1.00,
            geo_sibling: 0.65,
            geo_same_macro: 0.40,
            geo_cross_region: 0.20,
            continuity_base: 0.30,
            continuity_w_tenure: 0.30,
            continuity_w_breadth: 0.20,
            continuity_w_value: 0.20,
            tenure_max_days: 730.0,
            max_owners: 5.0,
            value_threshold: 500_000.0,
            reaching_down_penalty: 0.05,
            sibling_threshold: 0.65,
            parent_continuity_threshold: 0.65,
            min_tier_match_pct: 0.80,
            low_score_threshold: 0.30,
            cross_region_metric_threshold: 0.25,
        }
    }
}

/// Size-based routing and time budgets for the solver dispatcher (§4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverSettings {
    pub in_process_var_threshold: usize,
    pub in_process_time_budget_secs: u64,
    pub remote_time_budget_secs: u64,
    pub remote_large_time_budget_secs: u64,
    pub remote_large_var_threshold: usize,
    pub secondary_var_threshold: usize,
    pub secondary_time_budget_secs: u64,
    pub remote_endpoint: Option<String>,
    pub daily_remote_call_quota: u32,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            in_process_var_threshold: 5_000,
            in_process_time_budget_secs: 30,
            remote_time_budget_secs: 120,
            remote_large_time_budget_secs: 300,
            remote_large_var_threshold: 50_000,
            secondary_var_threshold: 50_000,
            secondary_time_budget_secs: 120,
            remote_endpoint: None,
            daily_remote_call_quota: 50,
        }
    }
}

/// Solution mode: priority cascade vs. a single weighted MIP (§1, §4.8, §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Waterfall,
    Relaxed,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Waterfall
    }
}

/// One stage of a waterfall `priority_config` (§3.1, §4.8). A closed enum, not a
/// string id: the compiler enforces coverage of every kind the waterfall engine
/// understands (§9, "dynamic dispatch through strings").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorityKind {
    ManualHoldover,
    StabilityAccounts,
    TeamAlignment,
    GeographyAndContinuity,
    ContinuityOnly,
    GeographyOnly,
    ResidualOptimization,
}

impl PriorityKind {
    pub fn as_label_prefix(self) -> &'static str {
        match self {
            PriorityKind::ManualHoldover => "P0",
            PriorityKind::ResidualOptimization => "RO",
            _ => "P",
        }
    }
}

/// One entry of the ordered waterfall priority list (§3.1).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriorityStep {
    pub kind: PriorityKind,
    pub enabled: bool,
    pub position: u32,
}

/// The immutable, validated snapshot passed into every solve (§3.1, §4.12).
///
/// Construct via [`Configuration::new`]; it validates every invariant in §3.2 that
/// does not depend on the account/rep set before returning. A `Configuration` that
/// type-checks is always safe to hand to a solve.
///
/// Every field carries `#[serde(default)]` so the CLI's TOML loader (§4.12, §4.15) can
/// accept a partial file that only overrides the handful of knobs an operator cares
/// about, mirroring the teacher's `GatConfig` loading convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub customer_weights: ObjectiveWeights,
    #[serde(default)]
    pub prospect_weights: ObjectiveWeights,
    #[serde(default)]
    pub stability_flags: StabilityFlags,
    #[serde(default)]
    pub constraint_flags: ConstraintFlags,
    #[serde(default)]
    pub balance_penalties: BalancePenalties,
    #[serde(default)]
    pub territory_mappings: HashMap<String, String>,
    #[serde(default)]
    pub priority_config: Vec<PriorityStep>,
    #[serde(default)]
    pub scoring_constants: ScoringConstants,
    #[serde(default)]
    pub solver_settings: SolverSettings,
    /// Open Question (§9): whether the team-alignment weight redistributes across the
    /// other axes when every account in the solve has unknown tier data. Default
    /// `false` matches source behavior (feed 0.5 as neutral, keep the weight active).
    #[serde(default)]
    pub unknown_team_alignment_redistributes_weight: bool,
}

impl Configuration {
    /// Build a `Configuration` from already-populated fields, validating every
    /// invariant in §3.2 that is checkable without an account/rep set.
    pub fn new(
        mode: Mode,
        customer_weights: ObjectiveWeights,
        prospect_weights: ObjectiveWeights,
        stability_flags: StabilityFlags,
        constraint_flags: ConstraintFlags,
        balance_penalties: BalancePenalties,
        territory_mappings: HashMap<String, String>,
        priority_config: Vec<PriorityStep>,
        scoring_constants: ScoringConstants,
        solver_settings: SolverSettings,
        unknown_team_alignment_redistributes_weight: bool,
    ) -> Result<Self, ConfigurationError> {
        let config = Self {
            mode,
            customer_weights,
            prospect_weights,
            stability_flags,
            constraint_flags,
            balance_penalties,
            territory_mappings,
            priority_config,
            scoring_constants,
            solver_settings,
            unknown_team_alignment_redistributes_weight,
        };
        config.validate()?;
        Ok(config)
    }

    /// Re-run the §3.2 checks against an already-built `Configuration`: the path a
    /// deserialized-from-TOML value must go through, since `Deserialize` itself does
    /// not call [`Configuration::new`] (§4.12).
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        validate_weights("customer", &self.customer_weights)?;
        validate_weights("prospect", &self.prospect_weights)?;

        if self.stability_flags.renewal_soon_window_days < 0 {
            return Err(ConfigurationError::NegativeThreshold {
                field: "stability_flags.renewal_soon_window_days".into(),
                value: self.stability_flags.renewal_soon_window_days as f64,
            });
        }
        if self.stability_flags.recent_change_window_days < 0 {
            return Err(ConfigurationError::NegativeThreshold {
                field: "stability_flags.recent_change_window_days".into(),
                value: self.stability_flags.recent_change_window_days as f64,
            });
        }

        let sc = &self.scoring_constants;
        for (field, value) in [
            ("sibling_threshold", sc.sibling_threshold),
            ("parent_continuity_threshold", sc.parent_continuity_threshold),
            ("min_tier_match_pct", sc.min_tier_match_pct),
            ("low_score_threshold", sc.low_score_threshold),
            ("cross_region_metric_threshold", sc.cross_region_metric_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigurationError::ScoringConstantOutOfRange {
                    field: field.to_string(),
                    value,
                });
            }
        }
        for (field, value) in [
            ("tenure_max_days", sc.tenure_max_days),
            ("max_owners", sc.max_owners),
            ("value_threshold", sc.value_threshold),
        ] {
            if value < 0.0 {
                return Err(ConfigurationError::NegativeThreshold {
                    field: field.to_string(),
                    value,
                });
            }
        }

        if self.mode == Mode::Waterfall {
            let mut seen_positions = std::collections::HashSet::new();
            for step in &self.priority_config {
                if !seen_positions.insert(step.position) {
                    return Err(ConfigurationError::UnknownPriorityId(format!(
                        "duplicate priority position {}",
                        step.position
                    )));
                }
            }
        }

        Ok(())
    }
}

fn validate_weights(segment: &str, weights: &ObjectiveWeights) -> Result<(), ConfigurationError> {
    let axes = [
        ("continuity", weights.continuity, weights.continuity_enabled),
        ("geography", weights.geography, weights.geography_enabled),
        (
            "team_alignment",
            weights.team_alignment,
            weights.team_alignment_enabled,
        ),
    ];
    for (axis, value, _) in axes {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigurationError::WeightOutOfRange {
                segment: segment.to_string(),
                axis: axis.to_string(),
                value,
            });
        }
    }
    let enabled_sum: f64 = axes
        .iter()
        .filter(|(_, _, enabled)| *enabled)
        .map(|(_, value, _)| value)
        .sum();
    let any_enabled = axes.iter().any(|(_, _, enabled)| *enabled);
    if any_enabled && (enabled_sum - 1.0).abs() > 1e-6 {
        return Err(ConfigurationError::WeightsDoNotSumToOne {
            segment: segment.to_string(),
            sum: enabled_sum,
        });
    }
    Ok(())
}

/// Per-proposal score breakdown, each axis in `[0, 1]` or `None` (§3.1, §4.3).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Scores {
    pub geography: Option<f64>,
    pub continuity: Option<f64>,
    pub team_alignment: Option<f64>,
}

/// The output entity for one account that was assigned a rep (§3.1, §6.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub account_id: AccountId,
    pub rep_id: RepId,
    pub rationale: String,
    pub scores: Scores,
    pub priority_label: String,
    pub confidence: f64,
}

/// Why an account could not be assigned (§6.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnassignedCause {
    NoEligibleRep,
    InfeasibleCapacity,
    SolverFailure,
}

impl std::fmt::Display for UnassignedCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UnassignedCause::NoEligibleRep => "no_eligible_rep",
            UnassignedCause::InfeasibleCapacity => "infeasible_capacity",
            UnassignedCause::SolverFailure => "solver_failure",
        };
        write!(f, "{}", s)
    }
}

/// The output entity for one account that could not be assigned (§3.1, §6.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unassigned {
    pub account_id: AccountId,
    pub cause: UnassignedCause,
    pub detail: String,
}
