use super::solver::{allocate, best_candidate, correct, evaluate_candidates};
use super::types::{AllocationEntry, Disability, Inputs, Parent, SplitReport};

pub const BASE_ALLOWANCE: f64 = 7_200.0;
pub const BRACKET_LIMIT: f64 = 60_000.0;
pub const DEFAULT_TAX_YEAR: i32 = 2025;

const CHILD_COEFFICIENTS: [f64; 9] = [0.5, 0.7, 1.0, 1.4, 1.9, 2.5, 3.2, 4.0, 4.9];
const DEPENDENT_COEFFICIENT: f64 = 0.5;
const PARTIAL_DISABILITY_SHARE: f64 = 0.3;

const FULL_RATE_MIN_AGE: i32 = 31;
const HALF_RATE_MIN_AGE: i32 = 26;

// Household tax as a function of the amount `x` of the pool allocated to parent A.
#[derive(Debug, Clone, Copy)]
pub struct HouseholdModel {
    pub threshold_a: f64,
    pub threshold_b: f64,
    pub pool: f64,
    pub lower_rate_a: f64,
    pub lower_rate_b: f64,
    pub higher_rate: f64,
}

impl HouseholdModel {
    pub fn exposure_a(&self, x: f64) -> f64 {
        (self.threshold_a - x).max(0.0)
    }

    pub fn exposure_b(&self, x: f64) -> f64 {
        (self.threshold_b - (self.pool - x)).max(0.0)
    }

    pub fn tax_a(&self, x: f64) -> f64 {
        tax(self.exposure_a(x), self.lower_rate_a, self.higher_rate)
    }

    pub fn tax_b(&self, x: f64) -> f64 {
        tax(self.exposure_b(x), self.lower_rate_b, self.higher_rate)
    }

    pub fn cost(&self, x: f64) -> f64 {
        self.tax_a(x) + self.tax_b(x)
    }
}

pub fn tax(taxable: f64, lower_rate: f64, higher_rate: f64) -> f64 {
    if taxable <= 0.0 {
        0.0
    } else if taxable <= BRACKET_LIMIT {
        taxable * lower_rate
    } else {
        BRACKET_LIMIT * lower_rate + (taxable - BRACKET_LIMIT) * higher_rate
    }
}

/// Weight of the `n`-th child (1-indexed).
///
/// Past the table the running total grows by `position * 0.1` for each further
/// position and the result is rounded to one decimal.
pub fn child_coefficient(n: u32) -> f64 {
    let table_len = CHILD_COEFFICIENTS.len() as u32;
    if n == 0 {
        return 0.0;
    }
    if n <= table_len {
        return CHILD_COEFFICIENTS[(n - 1) as usize];
    }

    let mut coefficient = CHILD_COEFFICIENTS[CHILD_COEFFICIENTS.len() - 1];
    for position in (table_len + 1)..=n {
        coefficient += f64::from(position) * 0.1;
    }
    (coefficient * 10.0).round() / 10.0
}

pub fn effective_lower_rate(birth_year: i32, nominal_rate: f64, tax_year: i32) -> f64 {
    let age = tax_year - birth_year;
    if age < HALF_RATE_MIN_AGE {
        0.0
    } else if age < FULL_RATE_MIN_AGE {
        nominal_rate * 0.5
    } else {
        nominal_rate
    }
}

pub fn coefficients(child_count: u32, dependent_count: u32) -> Vec<f64> {
    (1..=child_count)
        .map(child_coefficient)
        .chain((0..dependent_count).map(|_| DEPENDENT_COEFFICIENT))
        .collect()
}

pub fn pool(coefficients: &[f64]) -> f64 {
    coefficients.iter().map(|c| c * BASE_ALLOWANCE).sum()
}

pub fn allocated_amount(fractions: &[f64], coefficients: &[f64]) -> f64 {
    fractions
        .iter()
        .zip(coefficients)
        .map(|(fraction, coefficient)| fraction * coefficient * BASE_ALLOWANCE)
        .sum()
}

fn disability_bonus(disability: Disability) -> f64 {
    match disability {
        Disability::None => 0.0,
        Disability::Partial => PARTIAL_DISABILITY_SHARE * BASE_ALLOWANCE,
        Disability::Full => BASE_ALLOWANCE,
    }
}

pub fn exemption_floor(parent: &Parent) -> f64 {
    BASE_ALLOWANCE + disability_bonus(parent.disability)
}

fn threshold(parent: &Parent) -> f64 {
    (parent.income_annual - exemption_floor(parent)).max(0.0)
}

pub fn solve(inputs: &Inputs) -> SplitReport {
    let coefficients = coefficients(inputs.child_count, inputs.dependent_count);
    let model = HouseholdModel {
        threshold_a: threshold(&inputs.parent_a),
        threshold_b: threshold(&inputs.parent_b),
        pool: pool(&coefficients),
        lower_rate_a: effective_lower_rate(
            inputs.parent_a.birth_year,
            inputs.rates.lower,
            inputs.tax_year,
        ),
        lower_rate_b: effective_lower_rate(
            inputs.parent_b.birth_year,
            inputs.rates.lower,
            inputs.tax_year,
        ),
        higher_rate: inputs.rates.higher,
    };
    log::debug!(
        "pool {} over {} dependents, thresholds a={} b={}",
        model.pool,
        coefficients.len(),
        model.threshold_a,
        model.threshold_b
    );

    let candidates = evaluate_candidates(&model);
    let split_point = best_candidate(&candidates).map_or(0.0, |best| {
        log::debug!("best split {:?} at x={} cost {}", best.label, best.x, best.cost);
        best.x
    });

    let greedy = allocate(split_point, &coefficients);
    let fractions = correct(&greedy, |fractions| {
        model.cost(allocated_amount(fractions, &coefficients))
    });

    let allocated_to_a = allocated_amount(&fractions, &coefficients);
    let tax_a = model.tax_a(allocated_to_a);
    let tax_b = model.tax_b(allocated_to_a);

    SplitReport {
        split_point,
        pool: model.pool,
        threshold_a: model.threshold_a,
        threshold_b: model.threshold_b,
        lower_rate_a: model.lower_rate_a,
        lower_rate_b: model.lower_rate_b,
        floor_a: exemption_floor(&inputs.parent_a),
        floor_b: exemption_floor(&inputs.parent_b),
        allocated_to_a,
        exposure_a: model.exposure_a(allocated_to_a),
        exposure_b: model.exposure_b(allocated_to_a),
        tax_a,
        tax_b,
        delta_a: inputs.parent_a.tax_paid - tax_a,
        delta_b: inputs.parent_b.tax_paid - tax_b,
        min_cost: tax_a + tax_b,
        allocation: fractions
            .iter()
            .zip(&coefficients)
            .enumerate()
            .map(|(index, (&fraction_a, &coefficient))| AllocationEntry {
                index,
                coefficient,
                fraction_a,
            })
            .collect(),
        candidates,
    }
}
