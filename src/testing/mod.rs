use single_utilities::traits::FloatOps;

pub mod assumptions;
pub mod inference;

/// Which hypothesis test the selector settles on for a pair of aggregate
/// samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestChoice {
    /// Fewer than three observations on either side; no test is run and the
    /// p-value is fixed at 1.
    Underpowered,
    /// Two-sided Mann-Whitney U with continuity correction.
    MannWhitney,
    /// Two-sided equal-variance Student's t-test.
    StudentT,
}

#[derive(Debug, Clone, Copy)]
pub enum Alternative {
    TwoSided,
    Less,
    Greater,
}

/// Outcome of a single hypothesis test.
#[derive(Debug, Clone)]
pub struct TestResult<T> {
    /// The test statistic (e.g. U statistic, t-statistic, Levene's W).
    pub statistic: T,
    /// The p-value of the test.
    pub p_value: T,
    /// Degrees of freedom (for parametric inference).
    pub degrees_of_freedom: Option<T>,
    /// Effect size measurement, where the test provides one.
    pub effect_size: Option<T>,
}

impl<T> TestResult<T>
where
    T: FloatOps,
{
    /// Create a new test result with minimal information.
    pub fn new(statistic: T, p_value: T) -> Self {
        TestResult {
            statistic,
            p_value,
            degrees_of_freedom: None,
            effect_size: None,
        }
    }

    /// Create a new test result with effect size.
    pub fn with_effect_size(statistic: T, p_value: T, effect_size: T) -> Self {
        TestResult {
            statistic,
            p_value,
            degrees_of_freedom: None,
            effect_size: Some(effect_size),
        }
    }

    /// Add degrees of freedom to the result.
    pub fn with_degrees_of_freedom(mut self, df: T) -> Self {
        self.degrees_of_freedom = Some(df);
        self
    }

    /// Check if the result is statistically significant at the given threshold.
    pub fn is_significant(&self, alpha: T) -> bool {
        self.p_value < alpha
    }
}
