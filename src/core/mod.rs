mod engine;
mod solver;
mod types;

pub use engine::{
    BASE_ALLOWANCE, BRACKET_LIMIT, DEFAULT_TAX_YEAR, HouseholdModel, allocated_amount,
    child_coefficient, coefficients, effective_lower_rate, exemption_floor, pool, solve, tax,
};
pub use solver::{
    CriticalPoint, FRACTION_STEP, allocate, best_candidate, correct, critical_points,
    evaluate_candidates,
};
pub use types::{
    AllocationEntry, Candidate, CandidateLabel, Disability, InputError, Inputs, MAX_DEPENDENTS,
    Parent, Rates, SplitReport,
};
