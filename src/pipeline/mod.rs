//! Pipeline orchestration: from the validated measurement table to the CSI
//! record table.
//!
//! Consolidation runs once over the whole input. Every (experimental unit,
//! cell line, non-control treatment) triple is then evaluated independently:
//! the triples share no mutable state, so they are fanned out across the
//! rayon pool and each worker fills a private record buffer; the buffers are
//! concatenated in triple order at the end, keeping the output deterministic.

use crate::condition::condition_view;
use crate::config::PipelineConfig;
use crate::consolidate::consolidate;
use crate::differential::{SPLICE_STATES, pair_differential};
use crate::model::{CoSplicingRecord, ConsolidatedRow, MeasurementRow};
use crate::scoring::confidence_score;
use crate::testing::inference::compare_samples;
use anyhow::{Context, Result, bail};
use log::{debug, info};
use rayon::prelude::*;
use std::collections::HashSet;

/// Run the full CSI computation over a validated measurement table.
///
/// Returns one record per biologically-observed (exon pair, splicing type)
/// combination per comparison triple. A triple without control rows is a
/// configuration error and aborts the whole run.
pub fn run(rows: &[MeasurementRow], config: &PipelineConfig) -> Result<Vec<CoSplicingRecord>> {
    let table = consolidate(rows);
    info!(
        "consolidated {} measurement rows into {} samples",
        rows.len(),
        table.len()
    );

    let triples = comparison_triples(&table, &config.control_name);
    info!("{} treatment conditions to compare against control", triples.len());

    let per_triple: Vec<Vec<CoSplicingRecord>> = triples
        .par_iter()
        .map(|(expt_unit, cell_line, treatment)| {
            process_triple(&table, expt_unit, cell_line, treatment, config)
        })
        .collect::<Result<_>>()?;

    Ok(per_triple.into_iter().flatten().collect())
}

/// Every (experimental unit, cell line, treatment) triple with a non-control
/// treatment, in first-appearance order.
fn comparison_triples(
    table: &[ConsolidatedRow],
    control_name: &str,
) -> Vec<(String, String, String)> {
    let mut seen = HashSet::new();
    let mut triples = Vec::new();
    for row in table {
        if row.treatment == control_name {
            continue;
        }
        let key = (
            row.expt_unit.clone(),
            row.cell_line.clone(),
            row.treatment.clone(),
        );
        if seen.insert(key.clone()) {
            triples.push(key);
        }
    }
    triples
}

fn process_triple(
    table: &[ConsolidatedRow],
    expt_unit: &str,
    cell_line: &str,
    treatment: &str,
    config: &PipelineConfig,
) -> Result<Vec<CoSplicingRecord>> {
    info!(
        "calculating CSI for experimental unit '{expt_unit}', \
         cell line '{cell_line}', treatment '{treatment}'"
    );
    let view = condition_view(table, expt_unit, cell_line)?;
    let treatment_rows = view.rows_for_treatment(treatment);
    let control_rows = view.rows_for_treatment(&config.control_name);
    if control_rows.is_empty() {
        bail!(
            "control '{}' not found for experimental unit '{expt_unit}', \
             cell line '{cell_line}', treatment '{treatment}'; include the \
             control rows or fix the configured control name",
            config.control_name
        );
    }

    let mut records = Vec::new();
    for e1 in 0..view.exons.len() {
        for e2 in (e1 + 1)..view.exons.len() {
            for (p1, p2, splicing_type) in SPLICE_STATES {
                debug!(
                    "examining {} ({p1}) and {} ({p2}) in control",
                    view.exons[e1], view.exons[e2]
                );
                let differential =
                    pair_differential(&treatment_rows, &control_rows, e1, e2, p1, p2)
                        .with_context(|| {
                            format!(
                                "aggregating {}/{} at state ({p1},{p2}) for \
                                 experimental unit '{expt_unit}'",
                                view.exons[e1], view.exons[e2]
                            )
                        })?;
                let Some(differential) = differential else {
                    continue;
                };

                let test = compare_samples(
                    differential.treatment_sample.observations(),
                    differential.control_sample.observations(),
                );
                records.push(CoSplicingRecord {
                    expt_unit: expt_unit.to_string(),
                    treatment: treatment.to_string(),
                    cell_line: cell_line.to_string(),
                    control_exon1: view.exons[e1].clone(),
                    control_exon2: view.exons[e2].clone(),
                    splicing_type,
                    contributing_isoforms: differential.contributing_isoforms,
                    cospliced_isoforms: differential.cospliced_isoforms,
                    p_value: test.p_value,
                    diff_relative_abundance: differential.diff_relative_abundance,
                    confidence_score: confidence_score(
                        differential.contributing_isoforms,
                        differential.cospliced_isoforms,
                        test.p_value,
                    ),
                });
            }
        }
    }
    Ok(records)
}
