//! Tolerance checks against reference values

use serde::Serialize;

use super::extract::{scan_log, Extraction};
use super::report::Failure;

/// Symmetric acceptance window around a reference value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Criterion {
    pub reference: f64,
    pub tolerance: f64,
}

impl Criterion {
    pub fn new(reference: f64, tolerance: f64) -> Self {
        Self {
            reference,
            tolerance,
        }
    }

    /// Whether `value` lies in `[reference - tolerance, reference + tolerance]`
    ///
    /// Both bounds are inclusive. NaN is never accepted.
    pub fn accepts(&self, value: f64) -> bool {
        value >= self.reference - self.tolerance && value <= self.reference + self.tolerance
    }
}

/// Values and failures found in one log
#[derive(Debug, Default)]
pub struct Evaluation {
    pub values: Vec<f64>,
    pub failures: Vec<Failure>,
}

/// Check every marker occurrence in `content` against `criterion`
///
/// Each out-of-tolerance occurrence is its own failure. A log without
/// any marker line fails.
pub fn evaluate_log(content: &str, marker: &str, criterion: Criterion) -> Evaluation {
    let hits = scan_log(content, marker);
    let mut evaluation = Evaluation::default();

    if hits.is_empty() {
        evaluation.failures.push(Failure::MarkerMissing {
            marker: marker.to_string(),
        });
        return evaluation;
    }

    for hit in hits {
        match hit.extraction {
            Extraction::Value(value) => {
                evaluation.values.push(value);
                if !criterion.accepts(value) {
                    evaluation.failures.push(Failure::Mismatch {
                        line: hit.line,
                        value,
                        reference: criterion.reference,
                        tolerance: criterion.tolerance,
                    });
                }
            }
            Extraction::Unparseable(text) => {
                evaluation.failures.push(Failure::Unparseable {
                    line: hit.line,
                    text,
                });
            }
        }
    }

    evaluation
}
