use crate::testing::{Alternative, TestResult};
use num_traits::Float;
use single_utilities::traits::FloatOps;
use statrs::distribution::{ContinuousCDF, Normal};
use std::cmp::Ordering;

/// Mann-Whitney U test on two independent samples.
///
/// Uses the normal approximation with continuity correction; the variance is
/// tie-corrected so heavily tied abundance vectors (e.g. repeated zeros) do
/// not overstate significance. When every observation is tied there is no
/// ordering information and the p-value is 1.
pub fn mann_whitney<T>(x: &[T], y: &[T], alternative: Alternative) -> TestResult<T>
where
    T: FloatOps,
{
    let nx = x.len();
    let ny = y.len();

    if nx == 0 || ny == 0 {
        return TestResult::new(<T as num_traits::Float>::nan(), T::one()); // Insufficient data
    }

    // Combine samples and assign group labels (0 for x, 1 for y)
    let mut combined: Vec<(T, usize)> = Vec::with_capacity(nx + ny);
    combined.extend(x.iter().map(|&v| (v, 0)));
    combined.extend(y.iter().map(|&v| (v, 1)));

    // Sort by value
    combined.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    // Assign ranks (with ties averaged), accumulating the tie-correction
    // term sum(t^3 - t) over tie groups
    let mut ranks = vec![T::zero(); nx + ny];
    let mut tie_term = T::zero();
    let mut i = 0;
    while i < combined.len() {
        let val = combined[i].0;
        let mut j = i + 1;

        // Find tied values
        while j < combined.len() && combined[j].0 == val {
            j += 1;
        }

        // Assign average rank to ties
        let rank = T::from(i + j - 1).unwrap() / T::from(2.0).unwrap() + T::one();
        for k in i..j {
            ranks[k] = rank;
        }

        let ties = T::from(j - i).unwrap();
        tie_term += ties * ties * ties - ties;
        i = j;
    }

    // Calculate rank sum for group X
    let mut rank_sum_x = T::zero();
    for i in 0..combined.len() {
        if combined[i].1 == 0 {
            rank_sum_x += ranks[i];
        }
    }

    let u_x = rank_sum_x - T::from(nx * (nx + 1)).unwrap() / T::from(2.0).unwrap();
    let u_y = T::from(nx * ny).unwrap() - u_x;

    let n = T::from(nx + ny).unwrap();
    let mean_u = T::from(nx * ny).unwrap() / T::from(2.0).unwrap();
    let var_u = T::from(nx * ny).unwrap() / T::from(12.0).unwrap()
        * ((n + T::one()) - tie_term / (n * (n - T::one())));

    if var_u <= T::zero() {
        // every observation tied
        return TestResult::new(Float::min(u_x, u_y), T::one());
    }

    let correction = T::from(0.5).unwrap();

    let (u, z) = match alternative {
        Alternative::TwoSided => {
            let z_score = (Float::max(u_x, u_y) - mean_u - correction) / var_u.sqrt();
            (Float::min(u_x, u_y), Float::max(z_score, T::zero()))
        }
        Alternative::Less => (u_x, (u_x - mean_u + correction) / var_u.sqrt()),
        Alternative::Greater => (u_y, (u_y - mean_u + correction) / var_u.sqrt()),
    };

    let normal = Normal::new(0.0, 1.0).unwrap();
    let z_f64 = z.to_f64().unwrap();

    let p_value = match alternative {
        Alternative::TwoSided => (2.0 * (1.0 - normal.cdf(z_f64))).min(1.0),
        _ => 1.0 - normal.cdf(z_f64),
    };
    let p_value = T::from(p_value).unwrap();

    let effect_size = z / n.sqrt();

    TestResult::with_effect_size(u, p_value, effect_size)
}
