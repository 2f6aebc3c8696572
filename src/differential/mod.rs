//! Exon-pair differential relative abundance.
//!
//! For an unordered pair of exon columns and a presence state observed in the
//! control, the co-spliced form is the complementary state (each presence flag
//! flipped). This stage aggregates the relative abundance of the co-spliced
//! form in treatment and control and reports the difference together with the
//! isoform counts that feed the confidence score.
//!
//! Aggregation semantics over the row subset at one state:
//! - one isoform without replicates: the scalar mean abundance;
//! - one isoform with N replicates: its N-length replicate vector;
//! - several isoforms with N replicates each: the element-wise sum across
//!   isoforms, aligned by replicate position;
//! - several isoforms without replicates: the sum of their scalar means.
//!
//! All aggregation happens on freshly accumulated [`Sample`]s; the
//! consolidated table's replicate vectors are never mutated or aliased.

use crate::condition::ConditionRow;
use crate::model::{Sample, SpliceType};
use anyhow::Result;

/// Presence states examined on the control side, with the splicing type each
/// one maps to. The co-spliced state in treatment is the bitwise flip.
pub const SPLICE_STATES: [(u8, u8, SpliceType); 4] = [
    (1, 1, SpliceType::CoExclusion),
    (0, 0, SpliceType::CoInclusion),
    (1, 0, SpliceType::Swap),
    (0, 1, SpliceType::Swap),
];

/// Differential result for one exon pair and one control-side state.
#[derive(Debug, Clone)]
pub struct PairDifferential {
    /// Treatment aggregate mean minus control aggregate mean, both taken at
    /// the co-spliced state.
    pub diff_relative_abundance: f64,
    /// Nonzero-abundance isoforms in the control at the examined state.
    pub contributing_isoforms: usize,
    /// Nonzero-abundance isoforms in the treatment at the co-spliced state.
    pub cospliced_isoforms: usize,
    /// Aggregate treatment sample at the co-spliced state, for testing.
    pub treatment_sample: Sample,
    /// Aggregate control sample at the co-spliced state, for testing.
    pub control_sample: Sample,
}

fn rows_at_state<'a>(
    rows: &[&'a ConditionRow],
    e1: usize,
    e2: usize,
    p1: u8,
    p2: u8,
) -> Vec<&'a ConditionRow> {
    rows.iter()
        .copied()
        .filter(|row| row.presence[e1] == p1 && row.presence[e2] == p2)
        .collect()
}

fn abundance_sum(rows: &[&ConditionRow]) -> f64 {
    rows.iter().map(|row| row.relative_abundance).sum()
}

fn nonzero_isoforms(rows: &[&ConditionRow]) -> usize {
    rows.iter()
        .filter(|row| row.relative_abundance != 0.0)
        .count()
}

/// Element-wise aggregate of the subset's samples, starting from a fresh
/// [`Sample::Empty`].
fn aggregate_sample(rows: &[&ConditionRow]) -> Result<Sample> {
    let mut total = Sample::Empty;
    for row in rows {
        total.accumulate(&row.sample)?;
    }
    Ok(total)
}

/// Evaluate one exon pair `(e1, e2)` at the control-side state `(p1, p2)`.
///
/// Returns `Ok(None)` when the combination is not biologically observed:
/// either the control carries no abundance at the examined state, or the
/// treatment carries no abundance at the co-spliced state. Shape-contract
/// violations during aggregation (mixed or misaligned replicate vectors)
/// abort with an error.
pub fn pair_differential(
    treatment_rows: &[&ConditionRow],
    control_rows: &[&ConditionRow],
    e1: usize,
    e2: usize,
    p1: u8,
    p2: u8,
) -> Result<Option<PairDifferential>> {
    let control_state = rows_at_state(control_rows, e1, e2, p1, p2);
    if abundance_sum(&control_state) == 0.0 {
        return Ok(None);
    }

    let (q1, q2) = (1 - p1, 1 - p2);
    let treatment_cospliced = rows_at_state(treatment_rows, e1, e2, q1, q2);
    if abundance_sum(&treatment_cospliced) == 0.0 {
        return Ok(None);
    }
    let control_cospliced = rows_at_state(control_rows, e1, e2, q1, q2);

    let treatment_sample = aggregate_sample(&treatment_cospliced)?;
    let control_sample = aggregate_sample(&control_cospliced)?;

    Ok(Some(PairDifferential {
        diff_relative_abundance: treatment_sample.location() - control_sample.location(),
        contributing_isoforms: nonzero_isoforms(&control_state),
        cospliced_isoforms: nonzero_isoforms(&treatment_cospliced),
        treatment_sample,
        control_sample,
    }))
}
