//! Confidence scoring.
//!
//! The score combines isoform-count specificity with statistical
//! significance:
//!
//! `(1/contributing + 1/cospliced) * 25 + min(-ln(p), 50) * 10`
//!
//! Fewer isoforms sharing an exon-pair state mean the measured change is
//! attributable to a specific co-spliced form; the log-p term is capped so a
//! vanishing p-value cannot produce an unbounded score.

/// Cap on the `-ln(p)` significance term.
pub const LOG_P_CAP: f64 = 50.0;

/// Heuristic confidence score for one exon-pair observation.
///
/// Both isoform counts are at least 1 by construction: the differential
/// engine only emits observations backed by nonzero abundance on both sides.
pub fn confidence_score(
    contributing_isoforms: usize,
    cospliced_isoforms: usize,
    p_value: f64,
) -> f64 {
    let specificity =
        1.0 / contributing_isoforms as f64 + 1.0 / cospliced_isoforms as f64;
    let significance = (-p_value.ln()).min(LOG_P_CAP);
    specificity * 25.0 + significance * 10.0
}
