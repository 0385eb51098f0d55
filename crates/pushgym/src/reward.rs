//! Reward shaping policies for the push task.

use serde::{Deserialize, Serialize};

/// Object-target distance at or below which the push counts as a success.
pub const TARGET_DIST_MIN: f64 = 0.03;

/// Bonus added to the reward on success.
pub const SUCCESS_BONUS: f64 = 1000.0;

/// Hand-object distance below which the staged policy adds the push term.
const REACH_THRESHOLD: f64 = 0.1;
const REACH_WEIGHT: f64 = 0.125;
const PUSH_WEIGHT: f64 = 0.25;

/// How reward is shaped across the reach-object and push-to-target
/// sub-goals.
///
/// Both policies share one contract: `compute(d1, d2, init_d1, max_d2)`,
/// where `d1` is the hand-object distance, `d2` the object-target distance,
/// and the last two are the distances recorded at reset, used as
/// normalizers. Callers must never reset into an episode where a
/// normalizer is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardPolicy {
    /// Plain negated distances plus the success bonus.
    SparseShaped,
    /// Distances normalized against their reset values, with the push term
    /// only paid out once the hand is near the object. The jump at the
    /// reach threshold is intentional and kept as-is.
    #[default]
    NormalizedStaged,
}

impl RewardPolicy {
    /// Compute the reward for the current distances.
    pub fn compute(&self, d1: f64, d2: f64, init_d1: f64, max_d2: f64) -> f64 {
        let mut reward = match self {
            RewardPolicy::SparseShaped => -d1 - d2,
            RewardPolicy::NormalizedStaged => {
                let reach = REACH_WEIGHT * (1.0 - d1 / init_d1);
                if d1 > REACH_THRESHOLD {
                    reach
                } else {
                    reach + PUSH_WEIGHT * (1.0 - d2 / max_d2)
                }
            }
        };
        if d2 <= TARGET_DIST_MIN {
            reward += SUCCESS_BONUS;
        }
        reward
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sparse_shaped() {
        let r = RewardPolicy::SparseShaped.compute(0.2, 0.4, 1.0, 1.0);
        assert_relative_eq!(r, -0.6);
    }

    #[test]
    fn test_sparse_shaped_success_bonus() {
        let r = RewardPolicy::SparseShaped.compute(0.05, 0.03, 1.0, 1.0);
        assert_relative_eq!(r, -0.08 + SUCCESS_BONUS);
    }

    #[test]
    fn test_staged_reach_phase_only() {
        // d1 > 0.1: only the reach term is paid.
        let r = RewardPolicy::NormalizedStaged.compute(0.5, 0.2, 1.0, 0.4);
        assert_relative_eq!(r, 0.0625);
    }

    #[test]
    fn test_staged_push_phase_adds_second_term() {
        let r = RewardPolicy::NormalizedStaged.compute(0.05, 0.2, 1.0, 0.4);
        assert_relative_eq!(r, 0.125 * 0.95 + 0.25 * 0.5);
    }

    #[test]
    fn test_staged_discontinuity_is_preserved() {
        // Crossing the reach threshold jumps by the full push term.
        let above = RewardPolicy::NormalizedStaged.compute(0.1001, 0.2, 1.0, 0.4);
        let below = RewardPolicy::NormalizedStaged.compute(0.1, 0.2, 1.0, 0.4);
        assert!(below - above > 0.12);
    }

    #[test]
    fn test_staged_success_bonus_in_both_branches() {
        let far = RewardPolicy::NormalizedStaged.compute(0.5, 0.01, 1.0, 0.4);
        let near = RewardPolicy::NormalizedStaged.compute(0.05, 0.01, 1.0, 0.4);
        assert!(far > SUCCESS_BONUS / 2.0);
        assert!(near > SUCCESS_BONUS / 2.0);
    }
}
