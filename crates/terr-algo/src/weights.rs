//! Weight normalizer (C2): keep enabled objective weights summing to 1.

use terr_core::ObjectiveWeights;

/// Three independently enable-able weights, each clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedWeights {
    pub continuity: f64,
    pub geography: f64,
    pub team_alignment: f64,
}

impl NormalizedWeights {
    pub fn zero() -> Self {
        Self {
            continuity: 0.0,
            geography: 0.0,
            team_alignment: 0.0,
        }
    }
}

/// Disabled axes read as 0; enabled axes are rescaled to sum to 1. If every axis is
/// disabled, returns the zero vector: the caller must short-circuit (no scoring axis
/// is meaningful with every weight disabled) (§4.2).
pub fn normalize(weights: &ObjectiveWeights) -> NormalizedWeights {
    let raw = [
        (weights.continuity, weights.continuity_enabled),
        (weights.geography, weights.geography_enabled),
        (weights.team_alignment, weights.team_alignment_enabled),
    ];
    let sum: f64 = raw
        .iter()
        .filter(|(_, enabled)| *enabled)
        .map(|(v, _)| v)
        .sum();
    if sum <= 0.0 {
        return NormalizedWeights::zero();
    }
    let scale = 1.0 / sum;
    NormalizedWeights {
        continuity: if weights.continuity_enabled {
            weights.continuity * scale
        } else {
            0.0
        },
        geography: if weights.geography_enabled {
            weights.geography * scale
        } else {
            0.0
        },
        team_alignment: if weights.team_alignment_enabled {
            weights.team_alignment * scale
        } else {
            0.0
        },
    }
}

/// Which axis changed, for `adjust_linked` (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Continuity,
    Geography,
    TeamAlignment,
}

const MIN_AXIS: f64 = 0.05;
const MAX_AXIS: f64 = 0.90;

/// Interactive-editing contract: clamp the changed axis into `[0.05, 0.90]`, distribute
/// its delta proportionally across the other enabled axes (also clamped), then
/// renormalize so the whole triple sums to 1 (§4.2).
pub fn adjust_linked(weights: &ObjectiveWeights, changed_axis: Axis, new_value: f64) -> ObjectiveWeights {
    let mut result = *weights;
    let clamped = new_value.clamp(MIN_AXIS, MAX_AXIS);

    let (old_value, enabled) = match changed_axis {
        Axis::Continuity => (weights.continuity, weights.continuity_enabled),
        Axis::Geography => (weights.geography, weights.geography_enabled),
        Axis::TeamAlignment => (weights.team_alignment, weights.team_alignment_enabled),
    };
    if !enabled {
        return result;
    }
    let delta = clamped - old_value;

    let others: Vec<Axis> = [Axis::Continuity, Axis::Geography, Axis::TeamAlignment]
        .into_iter()
        .filter(|a| *a != changed_axis)
        .filter(|a| match a {
            Axis::Continuity => weights.continuity_enabled,
            Axis::Geography => weights.geography_enabled,
            Axis::TeamAlignment => weights.team_alignment_enabled,
        })
        .collect();
    let others_sum: f64 = others
        .iter()
        .map(|a| match a {
            Axis::Continuity => weights.continuity,
            Axis::Geography => weights.geography,
            Axis::TeamAlignment => weights.team_alignment,
        })
        .sum();

    set_axis(&mut result, changed_axis, clamped);

    if others_sum > 0.0 {
        for axis in &others {
            let share = match axis {
                Axis::Continuity => weights.continuity,
                Axis::Geography => weights.geography,
                Axis::TeamAlignment => weights.team_alignment,
            };
            let proportion = share / others_sum;
            let adjusted = (share - delta * proportion).clamp(MIN_AXIS, MAX_AXIS);
            set_axis(&mut result, *axis, adjusted);
        }
    }

    let normalized = normalize(&result);
    result.continuity = normalized.continuity;
    result.geography = normalized.geography;
    result.team_alignment = normalized.team_alignment;
    result
}

fn set_axis(weights: &mut ObjectiveWeights, axis: Axis, value: f64) {
    match axis {
        Axis::Continuity => weights.continuity = value,
        Axis::Geography => weights.geography = value,
        Axis::TeamAlignment => weights.team_alignment = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_default_weights_unchanged_up_to_rounding() {
        let weights = ObjectiveWeights::default();
        let normalized = normalize(&weights);
        let sum = normalized.continuity + normalized.geography + normalized.team_alignment;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn normalize_excludes_disabled_axis() {
        let mut weights = ObjectiveWeights::default();
        weights.team_alignment_enabled = false;
        let normalized = normalize(&weights);
        assert_eq!(normalized.team_alignment, 0.0);
        assert!((normalized.continuity + normalized.geography - 1.0).abs() < 1e-9);
    }

    #[test]
    fn normalize_all_disabled_is_zero_vector() {
        let mut weights = ObjectiveWeights::default();
        weights.continuity_enabled = false;
        weights.geography_enabled = false;
        weights.team_alignment_enabled = false;
        let normalized = normalize(&weights);
        assert_eq!(normalized, NormalizedWeights::zero());
    }

    #[test]
    fn adjust_linked_redistributes_and_renormalizes() {
        let weights = ObjectiveWeights::default(); // 0.4 / 0.3 / 0.3
        let adjusted = adjust_linked(&weights, Axis::Continuity, 0.7);
        let sum = adjusted.continuity + adjusted.geography + adjusted.team_alignment;
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(adjusted.geography < weights.geography);
        assert!(adjusted.team_alignment < weights.team_alignment);
    }

    #[test]
    fn adjust_linked_clamps_changed_axis() {
        let weights = ObjectiveWeights::default();
        let adjusted = adjust_linked(&weights, Axis::Continuity, 0.99);
        assert!(adjusted.continuity <= MAX_AXIS + 1e-9);
    }
}
