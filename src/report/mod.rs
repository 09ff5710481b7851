//! Formatted terminal output for reconciliation runs.

use crate::domain::{AdjustedSeries, RunConfig};
use crate::reconcile::{RawInputs, Reconciliation};

/// Format the run summary: inputs, anchoring diagnostics and adjusted ranges.
pub fn format_run_summary(config: &RunConfig, inputs: &RawInputs, out: &Reconciliation) -> String {
    let diag = &out.diagnostics;
    let mut s = String::new();

    s.push_str(&format!("=== trends - {} ===\n", config.keyword));
    s.push_str(&format!("Range: {} .. {}\n", config.range.start, config.range.end));
    s.push_str(&format!(
        "Raw rows: monthly={} | weekly={} | daily={}\n",
        inputs.monthly.len(),
        inputs.weekly.len(),
        inputs.daily.len(),
    ));

    s.push_str("\nAnchoring:\n");
    s.push_str(&format!(
        "  weekly anchors placed: {} (stride {} weeks / {} months)\n",
        diag.weekly_anchors.len(),
        config.cadence.weekly_anchor_stride,
        config.cadence.monthly_anchor_stride,
    ));
    s.push_str(&format!(
        "  daily increments: {} anchored, {} missed\n",
        diag.increments.len() - diag.increments_missed(),
        diag.increments_missed(),
    ));
    for inc in diag.increments.iter().filter(|inc| inc.anchor.is_none()) {
        s.push_str(&format!("    missed: increment starting {} ({} rows)\n", inc.start, inc.rows));
    }
    s.push_str(&format!("  gaps back-filled: {} ({} rows)\n", diag.gaps, diag.gap_rows_filled));

    s.push_str("\nAdjusted:\n");
    s.push_str(&format_range_line(&out.weekly));
    s.push_str(&format_range_line(&out.daily));

    s
}

fn format_range_line(series: &AdjustedSeries) -> String {
    match series.value_range() {
        Some((lo, hi)) => format!("  {}: n={} | value=[{lo:.4}, {hi:.4}]\n", series.resolution, series.len()),
        None => format!("  {}: n=0\n", series.resolution),
    }
}
