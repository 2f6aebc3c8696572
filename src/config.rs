//! Run configuration passed explicitly into the pipeline entry point.

/// Configuration for one CSI pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Value of the `treatment` column identifying the baseline condition.
    /// Every (experimental unit, cell line) pair with a non-control treatment
    /// must also carry rows under this name.
    pub control_name: String,
}

impl PipelineConfig {
    pub fn new(control_name: impl Into<String>) -> Self {
        PipelineConfig {
            control_name: control_name.into(),
        }
    }
}
