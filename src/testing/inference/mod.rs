//! Adaptive two-sample test selection.
//!
//! The aggregate samples coming out of the differential engine have very
//! different shapes: single scalars, a handful of replicates, or dozens of
//! them. The selector picks the strongest defensible test for each shape:
//! nothing below three observations, the rank-based Mann-Whitney U for small
//! samples of unknown distribution, and an equal-variance t-test for large
//! samples that pass the variance-homogeneity and normality checks.

use crate::testing::assumptions::{levene_median, normality_test};
use crate::testing::{Alternative, TestChoice, TestResult};

pub mod nonparametric;
pub mod parametric;

/// Significance threshold for the assumption checks gating the t-test.
pub const ASSUMPTION_ALPHA: f64 = 0.05;

/// Below this many observations on either side, no test is attempted.
const MIN_OBSERVATIONS: usize = 3;

/// From this many observations on both sides, the parametric branch is
/// considered.
const LARGE_SAMPLE: usize = 30;

/// Decide which test applies to the given treatment/control samples.
///
/// Mixed sizes (one sample large, the other small) stay on the rank-based
/// test: the central-limit argument for the t-test needs both sides large.
pub fn select_test(treatment: &[f64], control: &[f64]) -> TestChoice {
    if treatment.len() < MIN_OBSERVATIONS || control.len() < MIN_OBSERVATIONS {
        return TestChoice::Underpowered;
    }
    if treatment.len() >= LARGE_SAMPLE && control.len() >= LARGE_SAMPLE {
        let equal_variances =
            levene_median(treatment, control).p_value > ASSUMPTION_ALPHA;
        let both_normal = normality_test(treatment).p_value > ASSUMPTION_ALPHA
            && normality_test(control).p_value > ASSUMPTION_ALPHA;
        if equal_variances && both_normal {
            return TestChoice::StudentT;
        }
        return TestChoice::MannWhitney;
    }
    TestChoice::MannWhitney
}

/// Run the selected test and return its result.
///
/// Underpowered comparisons carry a p-value of exactly 1: with fewer than
/// three observations no claim of significance is made.
pub fn compare_samples(treatment: &[f64], control: &[f64]) -> TestResult<f64> {
    match select_test(treatment, control) {
        TestChoice::Underpowered => TestResult::new(f64::NAN, 1.0),
        TestChoice::MannWhitney => {
            nonparametric::mann_whitney(treatment, control, Alternative::TwoSided)
        }
        TestChoice::StudentT => parametric::student_t_test(treatment, control),
    }
}
