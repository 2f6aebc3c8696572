//! Core data model for CSI computation.
//!
//! The input side of the model is the validated measurement table handed over
//! by the ingestion layer; the output side is the per-comparison record table
//! handed to the export layer. In between, replicate structure is carried by
//! the tagged [`Sample`] type instead of being re-derived from runtime value
//! shapes.
//!
//! Caller responsibilities, not checked here: every row of one experimental
//! unit declares the same exon set; relative abundances sum to 1 within one
//! (unit, cell line, treatment, replicate) group; isoform names are unique
//! within a unit. Violations produce incorrect but non-crashing output.

use anyhow::{Result, bail};
use std::fmt;

/// One row of the validated input table.
///
/// The exon-presence columns are positional (`E1..En` in the sheet); which of
/// them are meaningful for a given experimental unit is declared by the
/// comma-separated `exons` field and resolved by the condition subsetter.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRow {
    pub expt_unit: String,
    pub cell_line: String,
    pub treatment: String,
    pub isoform: String,
    /// Comma-separated exon indices declared for this experimental unit,
    /// e.g. `"2,3,7"`.
    pub exons: String,
    /// Positional presence flags: `Some(0)`, `Some(1)` or `None` when the
    /// column is not applicable to this experiment.
    pub presence: Vec<Option<u8>>,
    /// Biological replicate identifier, consecutive from 1 when present.
    pub replicate_id: Option<u32>,
    pub relative_abundance: f64,
}

impl MeasurementRow {
    /// Rows whose descriptive fields are all blank are synthetic artifacts of
    /// upstream sheet joins and carry no measurement.
    pub(crate) fn is_descriptive_blank(&self) -> bool {
        self.expt_unit.is_empty()
            && self.cell_line.is_empty()
            && self.treatment.is_empty()
            && self.isoform.is_empty()
            && self.exons.is_empty()
    }
}

/// Replicate structure of one consolidated measurement, or of an aggregate
/// over several of them.
///
/// Carrying the shape explicitly means the aggregation and test-selection
/// stages pattern-match instead of sniffing whether a value is a scalar, a
/// vector, or a vector of vectors.
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    /// Additive identity; also the aggregate over an empty row subset.
    Empty,
    /// A single measurement with no true replicates.
    Scalar(f64),
    /// Replicate values ordered by replicate id, length >= 2.
    Replicates(Vec<f64>),
}

impl Sample {
    pub fn shape(&self) -> &'static str {
        match self {
            Sample::Empty => "empty",
            Sample::Scalar(_) => "scalar",
            Sample::Replicates(_) => "replicate vector",
        }
    }

    /// Number of observations available for hypothesis testing.
    pub fn len(&self) -> usize {
        self.observations().len()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Sample::Empty)
    }

    /// The observations as a slice: empty for [`Sample::Empty`], a singleton
    /// for [`Sample::Scalar`], the replicate values otherwise.
    pub fn observations(&self) -> &[f64] {
        match self {
            Sample::Empty => &[],
            Sample::Scalar(value) => std::slice::from_ref(value),
            Sample::Replicates(values) => values,
        }
    }

    /// Point estimate of the sample: the scalar itself, or the mean of the
    /// replicate vector. Zero for an empty sample.
    pub fn location(&self) -> f64 {
        match self {
            Sample::Empty => 0.0,
            Sample::Scalar(value) => *value,
            Sample::Replicates(values) => {
                values.iter().sum::<f64>() / values.len() as f64
            }
        }
    }

    /// Add another sample into this one, element-wise for replicate vectors.
    ///
    /// Replicate vectors must align by position. Mixing a scalar with a
    /// replicate vector, or summing vectors of different lengths, violates
    /// the aggregation contract and aborts the run. Absorbing into `Empty`
    /// always copies into freshly owned storage; accumulation never aliases
    /// the consolidated table's vectors.
    pub fn accumulate(&mut self, other: &Sample) -> Result<()> {
        match (&mut *self, other) {
            (_, Sample::Empty) => Ok(()),
            (Sample::Empty, rhs) => {
                *self = rhs.clone();
                Ok(())
            }
            (Sample::Scalar(lhs), Sample::Scalar(rhs)) => {
                *lhs += rhs;
                Ok(())
            }
            (Sample::Replicates(lhs), Sample::Replicates(rhs)) => {
                if lhs.len() != rhs.len() {
                    bail!(
                        "replicate vectors of length {} and {} cannot be summed; \
                         replicates must align by position",
                        lhs.len(),
                        rhs.len()
                    );
                }
                for (l, r) in lhs.iter_mut().zip(rhs) {
                    *l += r;
                }
                Ok(())
            }
            (lhs, rhs) => bail!(
                "cannot combine a {} sample with a {} sample within one condition",
                lhs.shape(),
                rhs.shape()
            ),
        }
    }
}

/// One consolidated measurement: the descriptive key of [`MeasurementRow`]
/// minus the replicate id, with all replicate values gathered into `sample`
/// and their mean in `relative_abundance`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatedRow {
    pub expt_unit: String,
    pub cell_line: String,
    pub treatment: String,
    pub isoform: String,
    pub exons: String,
    pub presence: Vec<Option<u8>>,
    pub sample: Sample,
    /// Mean of the replicate values (the value itself when unreplicated).
    pub relative_abundance: f64,
}

/// How the presence states of two exons change together between control and
/// treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpliceType {
    CoInclusion,
    CoExclusion,
    Swap,
}

impl SpliceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpliceType::CoInclusion => "co-inclusion",
            SpliceType::CoExclusion => "co-exclusion",
            SpliceType::Swap => "swap",
        }
    }
}

impl fmt::Display for SpliceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One output row: the CSI comparison for a single exon pair and splicing
/// type within one (experimental unit, cell line, treatment) triple.
#[derive(Debug, Clone, PartialEq)]
pub struct CoSplicingRecord {
    pub expt_unit: String,
    pub treatment: String,
    pub cell_line: String,
    pub control_exon1: String,
    pub control_exon2: String,
    pub splicing_type: SpliceType,
    /// Isoforms with nonzero abundance in the control at the examined state.
    pub contributing_isoforms: usize,
    /// Isoforms with nonzero abundance in the treatment at the co-spliced
    /// (complementary) state.
    pub cospliced_isoforms: usize,
    pub p_value: f64,
    pub diff_relative_abundance: f64,
    pub confidence_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn scalar_accumulation_adds_values() {
        let mut total = Sample::Empty;
        total.accumulate(&Sample::Scalar(0.25)).unwrap();
        total.accumulate(&Sample::Scalar(0.5)).unwrap();
        assert_eq!(total, Sample::Scalar(0.75));
        assert_relative_eq!(total.location(), 0.75);
    }

    #[test]
    fn replicate_accumulation_is_element_wise() {
        let mut total = Sample::Empty;
        total
            .accumulate(&Sample::Replicates(vec![0.2, 0.3]))
            .unwrap();
        total
            .accumulate(&Sample::Replicates(vec![0.15, 0.33]))
            .unwrap();
        assert_eq!(total, Sample::Replicates(vec![0.35, 0.63]));
        assert_relative_eq!(total.location(), 0.49, epsilon = 1e-12);
    }

    #[test]
    fn accumulating_empty_is_identity() {
        let mut total = Sample::Replicates(vec![0.1, 0.2]);
        total.accumulate(&Sample::Empty).unwrap();
        assert_eq!(total, Sample::Replicates(vec![0.1, 0.2]));
    }

    #[test]
    fn mismatched_replicate_lengths_are_rejected() {
        let mut total = Sample::Replicates(vec![0.1, 0.2]);
        let err = total
            .accumulate(&Sample::Replicates(vec![0.1, 0.2, 0.3]))
            .unwrap_err();
        assert!(err.to_string().contains("align by position"));
    }

    #[test]
    fn mixed_shapes_are_rejected() {
        let mut total = Sample::Scalar(0.4);
        assert!(
            total
                .accumulate(&Sample::Replicates(vec![0.1, 0.2]))
                .is_err()
        );
    }

    #[test]
    fn accumulated_replicates_do_not_alias_the_source() {
        let source = Sample::Replicates(vec![0.2, 0.3]);
        let mut total = Sample::Empty;
        total.accumulate(&source).unwrap();
        total
            .accumulate(&Sample::Replicates(vec![1.0, 1.0]))
            .unwrap();
        // the source row is untouched by later accumulation
        assert_eq!(source, Sample::Replicates(vec![0.2, 0.3]));
    }

    #[test]
    fn observations_views() {
        assert_eq!(Sample::Empty.observations(), &[] as &[f64]);
        assert_eq!(Sample::Scalar(0.5).observations(), &[0.5]);
        assert_eq!(
            Sample::Replicates(vec![0.1, 0.2, 0.3]).observations().len(),
            3
        );
    }

    #[test]
    fn splice_type_display() {
        assert_eq!(SpliceType::CoInclusion.to_string(), "co-inclusion");
        assert_eq!(SpliceType::CoExclusion.to_string(), "co-exclusion");
        assert_eq!(SpliceType::Swap.to_string(), "swap");
    }
}
