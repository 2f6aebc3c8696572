//! Assumption checks gating the parametric branch of test selection.
//!
//! Large aggregate samples may use a t-test, but only when its assumptions
//! hold: homogeneous variances (Levene's test, median-centred) and normality
//! of each sample (D'Agostino-Pearson omnibus test). Both checks report a
//! conventional statistic/p-value pair.

use crate::testing::TestResult;
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor};

/// Levene's test for equality of variances, median-centred (the
/// Brown-Forsythe variant), for two groups.
///
/// The statistic follows an F distribution with (1, n_x + n_y - 2) degrees
/// of freedom under the null of equal variances.
pub fn levene_median(x: &[f64], y: &[f64]) -> TestResult<f64> {
    if x.len() < 2 || y.len() < 2 {
        return TestResult::new(f64::NAN, 1.0);
    }

    let dev_x: Vec<f64> = deviations_from_median(x);
    let dev_y: Vec<f64> = deviations_from_median(y);

    let nx = dev_x.len() as f64;
    let ny = dev_y.len() as f64;
    let n = nx + ny;

    let mean_x = dev_x.iter().sum::<f64>() / nx;
    let mean_y = dev_y.iter().sum::<f64>() / ny;
    let grand = (dev_x.iter().sum::<f64>() + dev_y.iter().sum::<f64>()) / n;

    let between = nx * (mean_x - grand).powi(2) + ny * (mean_y - grand).powi(2);
    let within: f64 = dev_x.iter().map(|d| (d - mean_x).powi(2)).sum::<f64>()
        + dev_y.iter().map(|d| (d - mean_y).powi(2)).sum::<f64>();

    if within == 0.0 {
        // no spread in the deviations at all
        return if between == 0.0 {
            TestResult::new(0.0, 1.0)
        } else {
            TestResult::new(f64::INFINITY, 0.0)
        };
    }

    let df = n - 2.0;
    let statistic = df * between / within;
    let p_value = match FisherSnedecor::new(1.0, df) {
        Ok(f_dist) => 1.0 - f_dist.cdf(statistic),
        Err(_) => 1.0,
    };
    TestResult::new(statistic, p_value).with_degrees_of_freedom(df)
}

fn deviations_from_median(values: &[f64]) -> Vec<f64> {
    let center = median(values);
    values.iter().map(|v| (v - center).abs()).collect()
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// D'Agostino-Pearson omnibus normality test.
///
/// Combines the skewness and kurtosis z-scores into
/// `K^2 = z_skew^2 + z_kurt^2`, chi-squared with 2 degrees of freedom under
/// the null of normality. Requires at least 8 observations; smaller samples
/// report no evidence against normality (the selector never sends them
/// here).
pub fn normality_test(sample: &[f64]) -> TestResult<f64> {
    let n = sample.len();
    if n < 8 {
        return TestResult::new(f64::NAN, 1.0);
    }

    let (m2, m3, m4) = central_moments(sample);
    if m2 == 0.0 {
        // a constant sample is maximally non-normal
        return TestResult::new(f64::INFINITY, 0.0);
    }

    let z_skew = skewness_z(n as f64, m2, m3);
    let z_kurt = kurtosis_z(n as f64, m2, m4);
    let k2 = z_skew * z_skew + z_kurt * z_kurt;

    let chi2 = ChiSquared::new(2.0).unwrap();
    TestResult::new(k2, 1.0 - chi2.cdf(k2))
}

fn central_moments(values: &[f64]) -> (f64, f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let mut m2 = 0.0;
    let mut m3 = 0.0;
    let mut m4 = 0.0;
    for &v in values {
        let d = v - mean;
        m2 += d * d;
        m3 += d * d * d;
        m4 += d * d * d * d;
    }
    (m2 / n, m3 / n, m4 / n)
}

/// Transformed skewness z-score (D'Agostino).
fn skewness_z(n: f64, m2: f64, m3: f64) -> f64 {
    let g1 = m3 / m2.powf(1.5);
    let mut y = g1 * (((n + 1.0) * (n + 3.0)) / (6.0 * (n - 2.0))).sqrt();
    let beta2 = 3.0 * (n * n + 27.0 * n - 70.0) * (n + 1.0) * (n + 3.0)
        / ((n - 2.0) * (n + 5.0) * (n + 7.0) * (n + 9.0));
    let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
    let delta = 1.0 / (0.5 * w2.ln()).sqrt();
    let alpha = (2.0 / (w2 - 1.0)).sqrt();
    if y == 0.0 {
        y = 1.0;
    }
    delta * (y / alpha + ((y / alpha).powi(2) + 1.0).sqrt()).ln()
}

/// Transformed kurtosis z-score (Anscombe-Glynn).
fn kurtosis_z(n: f64, m2: f64, m4: f64) -> f64 {
    let b2 = m4 / (m2 * m2);
    let expected = 3.0 * (n - 1.0) / (n + 1.0);
    let variance = 24.0 * n * (n - 2.0) * (n - 3.0)
        / ((n + 1.0).powi(2) * (n + 3.0) * (n + 5.0));
    let x = (b2 - expected) / variance.sqrt();

    let sqrt_beta1 = 6.0 * (n * n - 5.0 * n + 2.0) / ((n + 7.0) * (n + 9.0))
        * ((6.0 * (n + 3.0) * (n + 5.0)) / (n * (n - 2.0) * (n - 3.0))).sqrt();
    let a = 6.0
        + 8.0 / sqrt_beta1
            * (2.0 / sqrt_beta1 + (1.0 + 4.0 / (sqrt_beta1 * sqrt_beta1)).sqrt());

    let term1 = 1.0 - 2.0 / (9.0 * a);
    let denom = 1.0 + x * (2.0 / (a - 4.0)).sqrt();
    let term2 = denom.signum() * ((1.0 - 2.0 / a) / denom.abs()).cbrt();
    (term1 - term2) / (2.0 / (9.0 * a)).sqrt()
}
