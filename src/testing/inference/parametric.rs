//! Parametric inference for aggregate abundance samples.
//!
//! Only the equal-variance (Student's) t-test is provided: the selector falls
//! back to the rank-based test whenever the variance-homogeneity or normality
//! assumptions fail, so an unequal-variance variant is never reached.

use crate::testing::TestResult;
use single_utilities::traits::FloatOps;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Perform a two-sided equal-variance t-test comparing two samples.
///
/// # Arguments
///
/// * `x` - First sample
/// * `y` - Second sample
///
/// # Returns
///
/// `TestResult` containing the t-statistic, p-value and degrees of freedom.
pub fn student_t_test<T>(x: &[T], y: &[T]) -> TestResult<f64>
where
    T: FloatOps,
{
    let nx = x.len();
    let ny = y.len();

    if nx < 2 || ny < 2 {
        return TestResult::new(0.0, 1.0);
    }

    let mut sum_x = T::zero();
    let mut sum_sq_x = T::zero();
    for &val in x {
        sum_x += val;
        sum_sq_x += val * val;
    }

    let mut sum_y = T::zero();
    let mut sum_sq_y = T::zero();
    for &val in y {
        sum_y += val;
        sum_sq_y += val * val;
    }

    t_test_from_sums(
        sum_x.to_f64().unwrap(),
        sum_sq_x.to_f64().unwrap(),
        nx as f64,
        sum_y.to_f64().unwrap(),
        sum_sq_y.to_f64().unwrap(),
        ny as f64,
    )
}

/// Perform the t-test from precomputed summary statistics.
///
/// # Arguments
///
/// * `sum1`, `sum_sq1`, `n1` - Sum, sum of squares, and count for group 1
/// * `sum2`, `sum_sq2`, `n2` - Sum, sum of squares, and count for group 2
pub fn t_test_from_sums(
    sum1: f64,
    sum_sq1: f64,
    n1: f64,
    sum2: f64,
    sum_sq2: f64,
    n2: f64,
) -> TestResult<f64> {
    if n1 < 2.0 || n2 < 2.0 {
        return TestResult::new(0.0, 1.0);
    }

    let mean1 = sum1 / n1;
    let mean2 = sum2 / n2;

    // Variances via the computational formula
    let var1 = (sum_sq1 - sum1 * sum1 / n1) / (n1 - 1.0);
    let var2 = (sum_sq2 - sum2 * sum2 / n2) / (n2 - 1.0);

    let pooled_var = ((n1 - 1.0) * var1 + (n2 - 1.0) * var2) / (n1 + n2 - 2.0);
    let std_err = (pooled_var * (1.0 / n1 + 1.0 / n2)).sqrt();
    let t_stat = (mean1 - mean2) / std_err;
    let df = n1 + n2 - 2.0;

    let p_value = two_sided_t_p_value(t_stat, df);
    TestResult::new(t_stat, p_value).with_degrees_of_freedom(df)
}

fn two_sided_t_p_value(t_stat: f64, df: f64) -> f64 {
    if !t_stat.is_finite() {
        return if t_stat.is_infinite() { 0.0 } else { 1.0 };
    }
    if df <= 0.0 || !df.is_finite() {
        return 1.0;
    }

    match StudentsT::new(0.0, 1.0, df) {
        Ok(t_dist) => 2.0 * (1.0 - t_dist.cdf(t_stat.abs())),
        Err(_) => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn clearly_separated_groups_are_significant() {
        let result = student_t_test(&[1.0, 2.0, 3.0], &[7.0, 8.0, 9.0]);
        assert_relative_eq!(result.statistic, -7.348469228, epsilon = 1e-8);
        assert_relative_eq!(result.p_value, 0.001826261, epsilon = 1e-7);
        assert_relative_eq!(result.degrees_of_freedom.unwrap(), 4.0);
    }

    #[test]
    fn identical_groups_give_p_one() {
        let result = student_t_test(&[5.0, 5.0, 5.0], &[5.0, 5.0, 5.0]);
        assert!(result.statistic.is_nan() || result.statistic.abs() < 1e-9);
        assert_relative_eq!(result.p_value, 1.0);
    }

    #[test]
    fn undersized_groups_give_p_one() {
        let result = student_t_test(&[1.0], &[2.0, 3.0, 4.0]);
        assert_relative_eq!(result.p_value, 1.0);
    }

    #[test]
    fn perfect_separation_with_zero_variance() {
        let result = student_t_test(&[1.0, 1.0, 1.0], &[5.0, 5.0, 5.0]);
        assert!(result.statistic.is_infinite());
        assert_relative_eq!(result.p_value, 0.0);
    }

    #[test]
    fn shifted_means_match_from_sums_path() {
        let x = [3.1, 3.2, 3.0, 3.1, 3.0];
        let y = [2.9, 2.8, 3.0, 2.9, 3.0];
        let direct = student_t_test(&x, &y);
        let sums = t_test_from_sums(15.4, 47.46, 5.0, 14.6, 42.66, 5.0);
        assert_relative_eq!(direct.statistic, sums.statistic, epsilon = 1e-9);
        assert_relative_eq!(direct.p_value, sums.p_value, epsilon = 1e-9);
    }
}
