use super::engine::{BASE_ALLOWANCE, BRACKET_LIMIT, HouseholdModel};
use super::types::{Candidate, CandidateLabel};

pub const FRACTION_STEP: f64 = 0.01;
const FRACTION_SCALE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriticalPoint {
    pub x: f64,
    pub label: CandidateLabel,
}

// Always six points, clamped into [0, pool].
pub fn critical_points(threshold_a: f64, threshold_b: f64, pool: f64) -> Vec<CriticalPoint> {
    let pool = pool.max(0.0);
    [
        (0.0, CandidateLabel::Origin),
        (threshold_a - BRACKET_LIMIT, CandidateLabel::ParentABracket),
        (threshold_a, CandidateLabel::ParentAZeroed),
        (pool - threshold_b, CandidateLabel::ParentBZeroed),
        (
            pool - threshold_b + BRACKET_LIMIT,
            CandidateLabel::ParentBBracket,
        ),
        (pool, CandidateLabel::FullPool),
    ]
    .into_iter()
    .map(|(x, label)| CriticalPoint {
        x: x.clamp(0.0, pool),
        label,
    })
    .collect()
}

pub fn evaluate_candidates(model: &HouseholdModel) -> Vec<Candidate> {
    critical_points(model.threshold_a, model.threshold_b, model.pool)
        .into_iter()
        .map(|point| Candidate {
            x: point.x,
            label: point.label,
            cost: model.cost(point.x),
        })
        .collect()
}

// Earliest candidate wins a tie.
pub fn best_candidate(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates.iter().fold(None, |best, candidate| match best {
        Some(current) if current.cost <= candidate.cost => Some(current),
        _ => Some(candidate),
    })
}

fn round_fraction(value: f64) -> f64 {
    (value * FRACTION_SCALE).round() / FRACTION_SCALE
}

pub fn allocate(split_point: f64, coefficients: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..coefficients.len()).collect();
    order.sort_by(|&i, &j| coefficients[j].total_cmp(&coefficients[i]));

    let mut fractions = vec![0.0; coefficients.len()];
    let mut remaining = split_point.max(0.0);
    for index in order {
        let share = coefficients[index] * BASE_ALLOWANCE;
        if share <= 0.0 {
            continue;
        }
        let fraction = round_fraction((remaining / share).min(1.0));
        fractions[index] = fraction;
        remaining = (remaining - fraction * share).max(0.0);
    }

    fractions
}

/// One pass of single-coordinate nudges by one step against the input vector.
/// The cheapest strictly-improving trial is kept, so the result differs from
/// `fractions` in at most one position and never costs more.
pub fn correct<F>(fractions: &[f64], cost_of: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut best = fractions.to_vec();
    let mut best_cost = cost_of(fractions);
    let mut trial = fractions.to_vec();

    for index in 0..fractions.len() {
        for step in [-FRACTION_STEP, FRACTION_STEP] {
            let nudged = round_fraction(fractions[index] + step);
            if !(0.0..=1.0).contains(&nudged) {
                continue;
            }

            trial[index] = nudged;
            let cost = cost_of(&trial);
            if cost < best_cost {
                log::debug!(
                    "nudging fraction {index} to {nudged} lowers cost {best_cost} -> {cost}"
                );
                best_cost = cost;
                best.copy_from_slice(&trial);
            }
        }
        trial[index] = fractions[index];
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::allocated_amount;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn sample_model() -> HouseholdModel {
        HouseholdModel {
            threshold_a: 800.0,
            threshold_b: 1_600.0,
            pool: 8_640.0,
            lower_rate_a: 0.2,
            lower_rate_b: 0.2,
            higher_rate: 0.3,
        }
    }

    fn candidate(x: f64, label: CandidateLabel, cost: f64) -> Candidate {
        Candidate { x, label, cost }
    }

    #[test]
    fn critical_points_are_clamped_in_label_order() {
        let points = critical_points(16_800.0, 7_200.0, 15_840.0);
        let labels: Vec<CandidateLabel> = points.iter().map(|p| p.label).collect();
        assert_eq!(
            labels,
            vec![
                CandidateLabel::Origin,
                CandidateLabel::ParentABracket,
                CandidateLabel::ParentAZeroed,
                CandidateLabel::ParentBZeroed,
                CandidateLabel::ParentBBracket,
                CandidateLabel::FullPool,
            ]
        );
        let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 0.0, 15_840.0, 8_640.0, 15_840.0, 15_840.0]);
    }

    #[test]
    fn critical_points_collapse_to_origin_for_empty_pool() {
        let points = critical_points(50_000.0, 20_000.0, 0.0);
        assert_eq!(points.len(), 6);
        assert!(points.iter().all(|p| p.x == 0.0));
    }

    #[test]
    fn best_candidate_prefers_first_on_tie() {
        let candidates = [
            candidate(0.0, CandidateLabel::Origin, 160.0),
            candidate(800.0, CandidateLabel::ParentAZeroed, 0.0),
            candidate(7_040.0, CandidateLabel::ParentBZeroed, 0.0),
        ];
        let best = best_candidate(&candidates).expect("non-empty");
        assert_eq!(best.label, CandidateLabel::ParentAZeroed);
        assert!(best_candidate(&[]).is_none());
    }

    #[test]
    fn evaluate_candidates_prices_each_point() {
        let model = sample_model();
        let candidates = evaluate_candidates(&model);
        let costs: Vec<f64> = candidates.iter().map(|c| c.cost).collect();
        let expected = [160.0, 160.0, 0.0, 0.0, 320.0, 320.0];
        for (cost, want) in costs.iter().zip(expected) {
            assert_approx_tol(*cost, want, EPS);
        }
    }

    #[test]
    fn allocate_fills_largest_shares_first() {
        let fractions = allocate(8_640.0, &[0.5, 0.7, 1.0]);
        assert_eq!(fractions, vec![0.0, 0.29, 1.0]);

        let spent = allocated_amount(&fractions, &[0.5, 0.7, 1.0]);
        assert_approx_tol(spent, 8_640.0, 500.0);
    }

    #[test]
    fn allocate_keeps_original_order_on_equal_coefficients() {
        let fractions = allocate(3_600.0, &[0.5, 0.5]);
        assert_eq!(fractions, vec![1.0, 0.0]);
    }

    #[test]
    fn allocate_saturates_when_split_covers_pool() {
        let fractions = allocate(25_920.0, &[0.5, 0.7, 1.0, 1.4]);
        assert_eq!(fractions, vec![1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn correct_repairs_rounding_overshoot() {
        let coefficients = [0.5, 0.7];
        let model = sample_model();
        let cost_of = |f: &[f64]| model.cost(allocated_amount(f, &coefficients));

        let initial = allocate(7_040.0, &coefficients);
        assert_eq!(initial, vec![0.56, 1.0]);
        let corrected = correct(&initial, cost_of);

        assert_eq!(corrected, vec![0.55, 1.0]);
        assert!(cost_of(&corrected) < cost_of(&initial));
        assert_approx_tol(cost_of(&corrected), 0.0, EPS);
    }

    #[test]
    fn correct_leaves_optimal_vector_alone() {
        let coefficients = [0.5, 0.7];
        let model = sample_model();
        let cost_of = |f: &[f64]| model.cost(allocated_amount(f, &coefficients));

        let fractions = vec![0.0, 0.16];
        assert_eq!(correct(&fractions, cost_of), fractions);
    }

    #[test]
    fn correct_handles_empty_allocation() {
        let corrected = correct(&[], |_| 0.0);
        assert!(corrected.is_empty());
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_critical_points_stay_within_pool(
            threshold_a in 0u32..200_000,
            threshold_b in 0u32..200_000,
            pool in 0u32..150_000
        ) {
            let pool = pool as f64;
            for point in critical_points(threshold_a as f64, threshold_b as f64, pool) {
                prop_assert!(point.x >= 0.0 && point.x <= pool);
            }
        }

        #[test]
        fn prop_allocate_returns_unit_fractions(
            split_bp in 0u32..=10_000,
            coefficients in proptest::collection::vec(
                proptest::sample::select(vec![0.5, 0.7, 1.0, 1.4, 1.9, 2.5, 3.2, 4.0, 4.9]),
                0..8
            )
        ) {
            let total: f64 = coefficients.iter().map(|c| c * BASE_ALLOWANCE).sum();
            let fractions = allocate(total * split_bp as f64 / 10_000.0, &coefficients);
            prop_assert!(fractions.len() == coefficients.len());
            for fraction in fractions {
                prop_assert!((0.0..=1.0).contains(&fraction));
            }
        }

        #[test]
        fn prop_correct_never_raises_cost(
            threshold_a in 0u32..120_000,
            threshold_b in 0u32..120_000,
            split_bp in 0u32..=10_000,
            child_count in 1usize..6
        ) {
            let coefficients: Vec<f64> =
                [0.5, 0.7, 1.0, 1.4, 1.9][..child_count].to_vec();
            let pool: f64 = coefficients.iter().map(|c| c * BASE_ALLOWANCE).sum();
            let model = HouseholdModel {
                threshold_a: threshold_a as f64,
                threshold_b: threshold_b as f64,
                pool,
                lower_rate_a: 0.2,
                lower_rate_b: 0.1,
                higher_rate: 0.3,
            };
            let cost_of = |f: &[f64]| model.cost(allocated_amount(f, &coefficients));

            let initial = allocate(pool * split_bp as f64 / 10_000.0, &coefficients);
            let corrected = correct(&initial, cost_of);
            prop_assert!(cost_of(&corrected) <= cost_of(&initial));
            let changed = corrected
                .iter()
                .zip(&initial)
                .filter(|(after, before)| after != before)
                .count();
            prop_assert!(changed <= 1);
        }
    }
}
