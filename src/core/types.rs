use serde::Serialize;
use thiserror::Error;

pub const MAX_DEPENDENTS: u32 = 30;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Disability {
    #[default]
    None,
    Partial,
    Full,
}

#[derive(Debug, Clone, Copy)]
pub struct Parent {
    pub income_annual: f64,
    pub tax_paid: f64,
    pub birth_year: i32,
    pub disability: Disability,
}

// Fractions, 0.2 = 20%.
#[derive(Debug, Clone, Copy)]
pub struct Rates {
    pub lower: f64,
    pub higher: f64,
}

#[derive(Debug, Clone)]
pub struct Inputs {
    pub parent_a: Parent,
    pub parent_b: Parent,
    pub rates: Rates,
    pub child_count: u32,
    pub dependent_count: u32,
    pub tax_year: i32,
}

#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("parent {parent} income must be a finite amount >= 0")]
    InvalidIncome { parent: char },
    #[error("parent {parent} tax paid must be a finite amount")]
    InvalidTaxPaid { parent: char },
    #[error("parent {parent} birth year {birth_year} is after tax year {tax_year}")]
    BirthYearAfterTaxYear {
        parent: char,
        birth_year: i32,
        tax_year: i32,
    },
    #[error("{name} rate must be between 0 and 100 percent")]
    InvalidRate { name: &'static str },
    #[error("children plus dependents must be <= {max}, got {total}")]
    TooManyDependents { total: u64, max: u32 },
}

impl Inputs {
    pub fn validate(&self) -> Result<(), InputError> {
        for (label, parent) in [('A', &self.parent_a), ('B', &self.parent_b)] {
            if !parent.income_annual.is_finite() || parent.income_annual < 0.0 {
                return Err(InputError::InvalidIncome { parent: label });
            }
            if !parent.tax_paid.is_finite() {
                return Err(InputError::InvalidTaxPaid { parent: label });
            }
            if parent.birth_year > self.tax_year {
                return Err(InputError::BirthYearAfterTaxYear {
                    parent: label,
                    birth_year: parent.birth_year,
                    tax_year: self.tax_year,
                });
            }
        }

        for (name, rate) in [("lower", self.rates.lower), ("higher", self.rates.higher)] {
            if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
                return Err(InputError::InvalidRate { name });
            }
        }

        let total = u64::from(self.child_count) + u64::from(self.dependent_count);
        if total > u64::from(MAX_DEPENDENTS) {
            return Err(InputError::TooManyDependents {
                total,
                max: MAX_DEPENDENTS,
            });
        }

        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CandidateLabel {
    Origin,
    ParentABracket,
    ParentAZeroed,
    ParentBZeroed,
    ParentBBracket,
    FullPool,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub x: f64,
    pub label: CandidateLabel,
    #[serde(rename = "H")]
    pub cost: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationEntry {
    pub index: usize,
    pub coefficient: f64,
    pub fraction_a: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitReport {
    pub split_point: f64,
    pub pool: f64,
    pub threshold_a: f64,
    pub threshold_b: f64,
    pub lower_rate_a: f64,
    pub lower_rate_b: f64,
    pub floor_a: f64,
    pub floor_b: f64,
    pub allocated_to_a: f64,
    pub exposure_a: f64,
    pub exposure_b: f64,
    pub tax_a: f64,
    pub tax_b: f64,
    pub delta_a: f64,
    pub delta_b: f64,
    pub min_cost: f64,
    pub allocation: Vec<AllocationEntry>,
    pub candidates: Vec<Candidate>,
}
