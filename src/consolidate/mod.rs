//! Replicate consolidation.
//!
//! Rows sharing every descriptive attribute and differing only in replicate
//! id are biological replicates of the same quantity. Consolidation collapses
//! each such group into one [`ConsolidatedRow`] carrying the ordered replicate
//! values and their mean, so that every descriptive key appears exactly once
//! in the table handed to the downstream stages.

use crate::model::{ConsolidatedRow, MeasurementRow, Sample};
use std::collections::BTreeMap;
use std::collections::HashMap;

/// Full descriptive key of a measurement: everything except the replicate id
/// and the measured abundance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupKey {
    expt_unit: String,
    cell_line: String,
    treatment: String,
    isoform: String,
    exons: String,
    presence: Vec<Option<u8>>,
}

impl GroupKey {
    fn of(row: &MeasurementRow) -> Self {
        GroupKey {
            expt_unit: row.expt_unit.clone(),
            cell_line: row.cell_line.clone(),
            treatment: row.treatment.clone(),
            isoform: row.isoform.clone(),
            exons: row.exons.clone(),
            presence: row.presence.clone(),
        }
    }
}

/// Collapse biological replicates into one row per descriptive key.
///
/// Groups of size one become [`Sample::Scalar`]; larger groups are ordered by
/// replicate id ascending (a duplicated id keeps the later row's value) and
/// become [`Sample::Replicates`] with `relative_abundance` set to the
/// arithmetic mean. Output preserves the first-appearance order of keys, so a
/// given input always consolidates to the same table.
pub fn consolidate(rows: &[MeasurementRow]) -> Vec<ConsolidatedRow> {
    let mut order: Vec<GroupKey> = Vec::new();
    let mut groups: HashMap<GroupKey, Vec<(Option<u32>, f64)>> = HashMap::new();

    for row in rows {
        // synthetic artifacts of upstream sheet joins
        if row.is_descriptive_blank() {
            continue;
        }
        let key = GroupKey::of(row);
        let members = groups.entry(key.clone()).or_default();
        if members.is_empty() {
            order.push(key);
        }
        members.push((row.replicate_id, row.relative_abundance));
    }

    order
        .into_iter()
        .map(|key| {
            let members = groups.remove(&key).unwrap_or_default();
            let (sample, mean) = gather_replicates(&members);
            ConsolidatedRow {
                expt_unit: key.expt_unit,
                cell_line: key.cell_line,
                treatment: key.treatment,
                isoform: key.isoform,
                exons: key.exons,
                presence: key.presence,
                sample,
                relative_abundance: mean,
            }
        })
        .collect()
}

/// Turn one group's `(replicate_id, abundance)` members into a [`Sample`]
/// and its mean abundance.
fn gather_replicates(members: &[(Option<u32>, f64)]) -> (Sample, f64) {
    if let [(_, value)] = members {
        return (Sample::Scalar(*value), *value);
    }

    // Sorted by replicate id; inserting twice under the same id keeps the
    // later row, matching the sheet convention that ids are unique.
    let mut by_id: BTreeMap<u32, f64> = BTreeMap::new();
    for (id, value) in members {
        by_id.insert(id.unwrap_or(0), *value);
    }
    let values: Vec<f64> = by_id.into_values().collect();
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if let [value] = values.as_slice() {
        // duplicate ids collapsed the group back to a single observation
        return (Sample::Scalar(*value), *value);
    }
    (Sample::Replicates(values), mean)
}
