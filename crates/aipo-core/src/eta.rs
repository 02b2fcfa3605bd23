use crate::task::{TaskRow, HOURS_PER_DAY};
use serde::Serialize;

// ---------------------------------------------------------------------------
// PERT model constants
// ---------------------------------------------------------------------------

// Three-point spread around a single estimate m: optimistic 0.7m,
// pessimistic 1.6m. Tasks are treated as independent, so variances add.
const OPTIMISTIC_FACTOR: f64 = 0.7;
const PESSIMISTIC_FACTOR: f64 = 1.6;

// Two-sided 90% interval.
const Z_90: f64 = 1.645;

// ---------------------------------------------------------------------------
// EtaOutcome
// ---------------------------------------------------------------------------

/// Result of the ETA computation over every task in a program.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EtaOutcome {
    /// Nothing left to do: zero duration, full confidence.
    NoRemaining,
    /// Remaining tasks exist but none carries a usable estimate; no
    /// numeric interval can be produced.
    CannotCompute { remaining: usize },
    /// 90%-confidence duration interval over the remaining work.
    Interval {
        mean_hours: f64,
        std_hours: f64,
        low_hours: f64,
        high_hours: f64,
        /// Fraction of remaining tasks that had a parsed estimate.
        coverage: f64,
    },
}

/// Sum a PERT three-point distribution per estimated remaining task and
/// report the 90% interval, clamped at zero on the low side.
pub fn estimate(tasks: &[TaskRow]) -> EtaOutcome {
    let remaining: Vec<&TaskRow> = tasks
        .iter()
        .filter(|t| !t.status_bucket().is_done())
        .collect();
    if remaining.is_empty() {
        return EtaOutcome::NoRemaining;
    }

    let known: Vec<f64> = remaining.iter().filter_map(|t| t.estimate_hours).collect();
    if known.is_empty() {
        return EtaOutcome::CannotCompute {
            remaining: remaining.len(),
        };
    }
    let coverage = known.len() as f64 / remaining.len() as f64;

    let mut total_mean = 0.0;
    let mut total_variance = 0.0;
    for m in known {
        let o = OPTIMISTIC_FACTOR * m;
        let p = PESSIMISTIC_FACTOR * m;
        let mean = (o + 4.0 * m + p) / 6.0;
        let std = (p - o) / 6.0;
        total_mean += mean;
        total_variance += std * std;
    }
    let total_std = total_variance.sqrt();

    EtaOutcome::Interval {
        mean_hours: total_mean,
        std_hours: total_std,
        low_hours: (total_mean - Z_90 * total_std).max(0.0),
        high_hours: (total_mean + Z_90 * total_std).max(0.0),
        coverage,
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Hours formatted for the report: day units (8h/day) once a bound
/// reaches two working days, plain hours below that.
pub fn format_hours(hours: f64) -> String {
    if hours >= 2.0 * HOURS_PER_DAY {
        format!("{:.1}d ({hours:.1}h)", hours / HOURS_PER_DAY)
    } else {
        format!("{hours:.1}h")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
