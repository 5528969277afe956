//! Rationale builder (C11): turns a proposal's scores into a structured, human-readable
//! explanation (§4.11), and resolves the priority label every proposal carries.
//!
//! Every rationale is built as a [`Rationale`] value first and rendered through its one
//! `Display` impl: callers must not hand-assemble rationale strings inline.

use terr_core::{PriorityKind, PriorityStep, ScoringConstants};

use crate::locks::LockReason;
use crate::weights::{Axis, NormalizedWeights};

/// What dominated a proposal's score (§4.11 step 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DominantFactor {
    Single(Axis),
    /// Geography and continuity both cleared their thresholds (§4.11 step 3).
    GeographyAndContinuity,
    /// Total weighted score fell below `low_score_threshold` (§4.11 step 4): no axis
    /// dominates, this was whatever the residual optimization pass could do.
    Residual,
    /// Pinned by the stability lock cascade rather than scored (§4.4, §4.11).
    Locked(LockReason),
}

/// One axis's share of the total weighted score, used for the breakdown list.
#[derive(Debug, Clone, Copy)]
pub struct Contribution {
    pub axis: Axis,
    pub share: f64,
}

/// Structured rationale for one proposal (§4.11). `label` is the priority-cascade label
/// (`P0`, `P3`, `RO`, ...) resolved against the active `priority_config`; `dominant` and
/// `breakdown` describe *why* the proposal scored the way it did.
#[derive(Debug, Clone)]
pub struct Rationale {
    pub label: String,
    pub dominant: DominantFactor,
    pub breakdown: Vec<Contribution>,
}

impl std::fmt::Display for Rationale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let DominantFactor::Locked(reason) = self.dominant {
            return write!(f, "[{}] {}", self.label, reason.description());
        }
        write!(f, "[{}] {}", self.label, descriptor(self.dominant))?;
        if !self.breakdown.is_empty() {
            write!(f, " (")?;
            for (i, c) in self.breakdown.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: {:.0}%", axis_name(c.axis), c.share * 100.0)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

fn axis_name(axis: Axis) -> &'static str {
    match axis {
        Axis::Continuity => "continuity",
        Axis::Geography => "geography",
        Axis::TeamAlignment => "team alignment",
    }
}

fn descriptor(dominant: DominantFactor) -> &'static str {
    match dominant {
        DominantFactor::Single(Axis::Geography) => "matched on geography",
        DominantFactor::Single(Axis::Continuity) => "matched on existing relationship continuity",
        DominantFactor::Single(Axis::TeamAlignment) => "matched on team-tier alignment",
        DominantFactor::GeographyAndContinuity => "matched on geography and continuity together",
        DominantFactor::Residual => "placed by residual optimization across remaining capacity",
        DominantFactor::Locked(_) => unreachable!("Display handles Locked before calling descriptor()"),
    }
}

/// Priority-kind this axis maps to when resolving a dominance label against
/// `priority_config` (§4.9): "label = position-of(continuity)" means look up the step
/// configured for `ContinuityOnly` and render its position.
fn priority_kind_for(dominant: DominantFactor) -> PriorityKind {
    match dominant {
        DominantFactor::Single(Axis::Geography) => PriorityKind::GeographyOnly,
        DominantFactor::Single(Axis::Continuity) => PriorityKind::ContinuityOnly,
        DominantFactor::Single(Axis::TeamAlignment) => PriorityKind::TeamAlignment,
        DominantFactor::GeographyAndContinuity => PriorityKind::GeographyAndContinuity,
        DominantFactor::Residual => PriorityKind::ResidualOptimization,
        DominantFactor::Locked(reason) => match reason {
            LockReason::Manual => PriorityKind::ManualHoldover,
            _ => PriorityKind::StabilityAccounts,
        },
    }
}

/// The fixed default waterfall order (§4.8) used to fall back to a sensible position
/// when a kind has no matching entry in `priority_config` (e.g. relaxed mode, whose
/// `priority_config` exists only for label resolution and may be sparse or absent).
const DEFAULT_ORDER: [PriorityKind; 5] = [
    PriorityKind::StabilityAccounts,
    PriorityKind::TeamAlignment,
    PriorityKind::GeographyAndContinuity,
    PriorityKind::ContinuityOnly,
    PriorityKind::GeographyOnly,
];

/// Resolve a priority label for `kind` against `priority_config` (§4.9, §4.11).
/// `ManualHoldover` is always `P0`; `ResidualOptimization` is always `RO`; everything
/// else renders `P<position>`, preferring the configured position and falling back to
/// the fixed default order when the kind has no enabled entry.
pub fn resolve_priority_label(priority_config: &[PriorityStep], kind: PriorityKind) -> String {
    match kind {
        PriorityKind::ManualHoldover => return "P0".to_string(),
        PriorityKind::ResidualOptimization => return "RO".to_string(),
        _ => {}
    }
    if let Some(step) = priority_config.iter().find(|s| s.kind == kind && s.enabled) {
        return format!("P{}", step.position);
    }
    let position = DEFAULT_ORDER
        .iter()
        .position(|k| *k == kind)
        .map(|i| i + 1)
        .unwrap_or(0);
    format!("P{}", position)
}

/// Rationale for an account that was pinned by the stability lock cascade (§4.4, §4.11):
/// the label comes from the lock reason, not from a score breakdown.
pub fn locked_rationale(reason: LockReason, priority_config: &[PriorityStep]) -> Rationale {
    let kind = match reason {
        LockReason::Manual => PriorityKind::ManualHoldover,
        _ => PriorityKind::StabilityAccounts,
    };
    Rationale {
        label: resolve_priority_label(priority_config, kind),
        dominant: DominantFactor::Locked(reason),
        breakdown: Vec::new(),
    }
}

/// Build the rationale for a free (non-locked) account from its raw scores and the
/// normalized weights used to produce its cost coefficients (§4.11).
///
/// `scores` are the *raw* `[0, 1]` scores (not the cost-substituted `0.5` for a null
/// team-alignment): an axis with a `None` score is excluded from the weighted total
/// entirely, matching the null/neutral distinction scoring.rs preserves.
pub fn scored_rationale(
    geography: f64,
    continuity: f64,
    team_alignment: Option<f64>,
    weights: NormalizedWeights,
    constants: &ScoringConstants,
    priority_config: &[PriorityStep],
) -> Rationale {
    let mut weighted: Vec<(Axis, f64)> = vec![
        (Axis::Geography, weights.geography * geography),
        (Axis::Continuity, weights.continuity * continuity),
    ];
    if let Some(team) = team_alignment {
        weighted.push((Axis::TeamAlignment, weights.team_alignment * team));
    }

    let total: f64 = weighted.iter().map(|(_, w)| *w).sum();

    let dominant = if total <= 0.0 {
        DominantFactor::Residual
    } else if geography >= constants.sibling_threshold && continuity >= constants.parent_continuity_threshold {
        DominantFactor::GeographyAndContinuity
    } else {
        weighted
            .iter()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(axis, _)| DominantFactor::Single(*axis))
            .unwrap_or(DominantFactor::Residual)
    };

    // §4.11 step 4 overrides step 3: a low total score is always labeled residual,
    // regardless of which single axis happened to be largest.
    let dominant = if total < constants.low_score_threshold {
        DominantFactor::Residual
    } else {
        dominant
    };

    let mut breakdown: Vec<Contribution> = weighted
        .into_iter()
        .filter_map(|(axis, w)| {
            if total > 0.0 {
                let share = w / total;
                (share >= 0.10).then_some(Contribution { axis, share })
            } else {
                None
            }
        })
        .collect();
    breakdown.sort_by(|a, b| b.share.partial_cmp(&a.share).unwrap_or(std::cmp::Ordering::Equal));

    Rationale {
        label: resolve_priority_label(priority_config, priority_kind_for(dominant)),
        dominant,
        breakdown,
    }
}

/// Confidence value carried on the output `Proposal` (§3.1): the total weighted score
/// for an optimized placement, or `1.0` for a deterministic lock (§4.11).
pub fn scored_confidence(geography: f64, continuity: f64, team_alignment: Option<f64>, weights: NormalizedWeights) -> f64 {
    let mut total = weights.geography * geography + weights.continuity * continuity;
    if let Some(team) = team_alignment {
        total += weights.team_alignment * team;
    }
    total.clamp(0.0, 1.0)
}
