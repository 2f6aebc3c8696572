//! Condition subsetting.
//!
//! For one (experimental unit, cell line) pair this stage restricts the
//! consolidated table to the relevant rows, resolves the positional exon
//! columns against the unit's declared exon labels, and drops every column
//! that cannot discriminate between isoforms: columns that are not applicable
//! to the experiment and columns with a single constant value carry no
//! splicing signal and cannot participate in any exon-pair comparison.

use crate::model::{ConsolidatedRow, Sample};
use anyhow::{Result, bail};

/// A focused view of one (experimental unit, cell line) pair: the kept exon
/// labels and one row per isoform/treatment with presence flags aligned to
/// those labels.
#[derive(Debug, Clone)]
pub struct ConditionView {
    pub expt_unit: String,
    pub cell_line: String,
    /// Labels of the kept exon columns, e.g. `["E2", "E7"]`.
    pub exons: Vec<String>,
    pub rows: Vec<ConditionRow>,
}

#[derive(Debug, Clone)]
pub struct ConditionRow {
    pub treatment: String,
    pub isoform: String,
    /// Presence flags (0/1) aligned with [`ConditionView::exons`]. Columns
    /// with not-applicable cells never survive subsetting.
    pub presence: Vec<u8>,
    pub sample: Sample,
    pub relative_abundance: f64,
}

impl ConditionView {
    /// Rows measured under the given treatment.
    pub fn rows_for_treatment(&self, treatment: &str) -> Vec<&ConditionRow> {
        self.rows
            .iter()
            .filter(|row| row.treatment == treatment)
            .collect()
    }
}

/// Exon labels declared by the unit's `exons` field: comma-split, trimmed,
/// prefixed with `E`.
fn declared_exon_labels(exons: &str) -> Vec<String> {
    exons
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("E{s}"))
        .collect()
}

/// Build the [`ConditionView`] for one (experimental unit, cell line) pair.
///
/// Positional columns beyond the declared exon count are treated as
/// not-applicable. The declared labels are taken from the subset's first row;
/// units erroneously merging different exon sets are a documented caller
/// responsibility and are not detected here.
pub fn condition_view(
    table: &[ConsolidatedRow],
    expt_unit: &str,
    cell_line: &str,
) -> Result<ConditionView> {
    let subset: Vec<&ConsolidatedRow> = table
        .iter()
        .filter(|row| row.expt_unit == expt_unit && row.cell_line == cell_line)
        .collect();
    if subset.is_empty() {
        bail!(
            "no measurements for experimental unit '{expt_unit}', cell line '{cell_line}'"
        );
    }

    let labels = declared_exon_labels(&subset[0].exons);
    let width = subset[0].presence.len();

    let mut kept_labels: Vec<String> = Vec::new();
    let mut kept_columns: Vec<Vec<u8>> = Vec::new();
    for (idx, label) in labels.iter().enumerate().take(width) {
        let mut column = Vec::with_capacity(subset.len());
        for row in &subset {
            match row.presence.get(idx).copied().flatten() {
                Some(value) => column.push(value),
                None => break,
            }
        }
        if column.len() != subset.len() {
            // not applicable somewhere in this view
            continue;
        }
        if column.iter().all(|&value| value == column[0]) {
            // constant column, no splicing activity
            continue;
        }
        kept_labels.push(label.clone());
        kept_columns.push(column);
    }

    let rows = subset
        .iter()
        .enumerate()
        .map(|(r, row)| ConditionRow {
            treatment: row.treatment.clone(),
            isoform: row.isoform.clone(),
            presence: kept_columns.iter().map(|column| column[r]).collect(),
            sample: row.sample.clone(),
            relative_abundance: row.relative_abundance,
        })
        .collect();

    Ok(ConditionView {
        expt_unit: expt_unit.to_string(),
        cell_line: cell_line.to_string(),
        exons: kept_labels,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn consolidated(
        expt_unit: &str,
        treatment: &str,
        isoform: &str,
        exons: &str,
        presence: Vec<Option<u8>>,
        relative_abundance: f64,
    ) -> ConsolidatedRow {
        ConsolidatedRow {
            expt_unit: expt_unit.to_string(),
            cell_line: "HeLa".to_string(),
            treatment: treatment.to_string(),
            isoform: isoform.to_string(),
            exons: exons.to_string(),
            presence,
            sample: Sample::Scalar(relative_abundance),
            relative_abundance,
        }
    }

    #[test]
    fn exon_columns_are_renamed_from_the_declared_labels() {
        let table = vec![
            consolidated("G1", "NC", "A", "2, 7", vec![Some(1), Some(0)], 0.6),
            consolidated("G1", "NC", "B", "2, 7", vec![Some(0), Some(1)], 0.4),
        ];
        let view = condition_view(&table, "G1", "HeLa").unwrap();
        assert_eq!(view.exons, vec!["E2", "E7"]);
        assert_eq!(view.rows[0].presence, vec![1, 0]);
        assert_eq!(view.rows[1].presence, vec![0, 1]);
    }

    #[test]
    fn constant_columns_are_dropped() {
        let table = vec![
            consolidated("G1", "NC", "A", "1,2,3", vec![Some(1), Some(1), Some(0)], 0.6),
            consolidated("G1", "NC", "B", "1,2,3", vec![Some(1), Some(0), Some(1)], 0.4),
        ];
        let view = condition_view(&table, "G1", "HeLa").unwrap();
        // E1 is constant across the view and carries no signal
        assert_eq!(view.exons, vec!["E2", "E3"]);
        assert_eq!(view.rows[0].presence, vec![1, 0]);
    }

    #[test]
    fn not_applicable_columns_are_dropped() {
        // E3 is declared but one row carries a not-applicable cell in it
        let table = vec![
            consolidated("G1", "NC", "A", "1,2,3", vec![Some(1), Some(0), None], 0.6),
            consolidated("G1", "NC", "B", "1,2,3", vec![Some(0), Some(1), Some(1)], 0.4),
        ];
        let view = condition_view(&table, "G1", "HeLa").unwrap();
        assert_eq!(view.exons, vec!["E1", "E2"]);
    }

    #[test]
    fn declared_labels_beyond_the_column_count_are_padding() {
        // three labels declared but only two positional columns exist
        let table = vec![
            consolidated("G1", "NC", "A", "1,2,9", vec![Some(1), Some(0)], 0.6),
            consolidated("G1", "NC", "B", "1,2,9", vec![Some(0), Some(1)], 0.4),
        ];
        let view = condition_view(&table, "G1", "HeLa").unwrap();
        assert_eq!(view.exons, vec!["E1", "E2"]);
    }

    #[test]
    fn positional_columns_beyond_declared_labels_are_not_applicable() {
        let table = vec![
            consolidated("G1", "NC", "A", "4", vec![Some(1), Some(0)], 0.6),
            consolidated("G1", "NC", "B", "4", vec![Some(0), Some(1)], 0.4),
        ];
        let view = condition_view(&table, "G1", "HeLa").unwrap();
        // the single declared label names the first positional slot; the
        // second slot has no label and is not applicable
        assert_eq!(view.exons, vec!["E4"]);
    }

    #[test]
    fn rows_from_other_units_are_excluded() {
        let table = vec![
            consolidated("G1", "NC", "A", "1,2", vec![Some(1), Some(0)], 0.6),
            consolidated("G1", "NC", "B", "1,2", vec![Some(0), Some(1)], 0.4),
            consolidated("G2", "NC", "A", "1,2", vec![Some(0), Some(0)], 1.0),
        ];
        let view = condition_view(&table, "G1", "HeLa").unwrap();
        assert_eq!(view.rows.len(), 2);
    }

    #[test]
    fn empty_subset_is_an_error() {
        let err = condition_view(&[], "G1", "HeLa").unwrap_err();
        assert!(err.to_string().contains("G1"));
    }

    #[test]
    fn treatment_split() {
        let table = vec![
            consolidated("G1", "NC", "A", "1,2", vec![Some(1), Some(0)], 0.6),
            consolidated("G1", "SSO_A", "A", "1,2", vec![Some(0), Some(1)], 0.4),
        ];
        let view = condition_view(&table, "G1", "HeLa").unwrap();
        assert_eq!(view.rows_for_treatment("NC").len(), 1);
        assert_eq!(view.rows_for_treatment("SSO_A").len(), 1);
        assert!(view.rows_for_treatment("SSO_B").is_empty());
    }
}
