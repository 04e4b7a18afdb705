//! Tolerance-based comparison of actual vs. expected outputs

use serde::{Deserialize, Serialize};

use crate::error::{VerifyError, VerifyResult};
use crate::scenario::Tolerance;

/// Outcome of one assertion or scenario-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "PASSED")]
    Passed,
    #[serde(rename = "FAILED")]
    Failed,
    #[serde(rename = "ERROR")]
    Error,
}

impl Status {
    pub fn glyph(&self) -> &'static str {
        match self {
            Status::Passed => "✓",
            Status::Failed => "✗",
            Status::Error => "⚠",
        }
    }
}

/// The recorded outcome of one assertion. Appended to the run's result
/// sequence and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub name: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factor: Option<f64>,
    pub detail: String,
    pub duration_ms: u64,
}

impl Verdict {
    /// Scenario-level failure that never reached comparison.
    pub fn error(name: impl Into<String>, detail: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            name: name.into(),
            status: Status::Error,
            expected: None,
            actual: None,
            accuracy_percent: None,
            factor: None,
            detail: detail.into(),
            duration_ms,
        }
    }

    /// Synthetic assertion outcome with no numeric payload (e.g. the data
    /// retention check).
    pub fn synthetic(
        name: impl Into<String>,
        passed: bool,
        detail: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            name: name.into(),
            status: if passed { Status::Passed } else { Status::Failed },
            expected: None,
            actual: None,
            accuracy_percent: None,
            factor: None,
            detail: detail.into(),
            duration_ms,
        }
    }
}

/// Parse an output field's raw text as a floating-point number.
/// Grouping separators and surrounding whitespace are stripped first.
pub fn parse_numeric(field: &str, text: &str) -> VerifyResult<f64> {
    let cleaned = text.trim().replace(',', "");
    cleaned.parse::<f64>().map_err(|_| VerifyError::Parse {
        field: field.to_string(),
        text: text.to_string(),
    })
}

/// Compare an actual value against an expectation and produce the verdict.
///
/// Both modes use strict inequality: a discrepancy of exactly the tolerance
/// fails.
pub fn compare(
    name: impl Into<String>,
    expected: f64,
    actual: f64,
    tolerance: Tolerance,
    factor: Option<f64>,
    duration_ms: u64,
) -> Verdict {
    let direction = if actual > expected {
        "above expected"
    } else {
        "below expected"
    };

    let (passed, accuracy_percent, detail) = match tolerance {
        Tolerance::Relative(tol) => {
            // Guard the degenerate expected==0 case rather than dividing.
            let percent_difference = if expected == 0.0 {
                if actual == 0.0 {
                    0.0
                } else {
                    f64::INFINITY
                }
            } else {
                ((actual - expected) / expected * 100.0).abs()
            };
            let passed = percent_difference < tol;
            let detail = if passed {
                format!("Calculation accurate within {:.3}%", percent_difference)
            } else {
                format!(
                    "Calculation off by {:.2}% ({})",
                    percent_difference, direction
                )
            };
            (passed, Some(100.0 - percent_difference), detail)
        }
        Tolerance::Absolute(tol) => {
            let difference = (actual - expected).abs();
            let passed = difference < tol;
            let detail = if passed {
                format!("Within {:.4} of expected", difference)
            } else {
                format!("Off by {:.4} ({})", difference, direction)
            };
            (passed, None, detail)
        }
    };

    Verdict {
        name: name.into(),
        status: if passed { Status::Passed } else { Status::Failed },
        expected: Some(expected),
        actual: Some(actual),
        accuracy_percent,
        factor,
        detail,
        duration_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn parses_grouped_numbers() {
        assert_eq!(parse_numeric("#scope1Total", "2,025.129").unwrap(), 2025.129);
        assert_eq!(parse_numeric("#scope1Total", " 6.60 ").unwrap(), 6.60);
    }

    #[test]
    fn unparseable_text_is_a_parse_error() {
        let err = parse_numeric("#scope1Total", "n/a").unwrap_err();
        assert!(matches!(err, VerifyError::Parse { .. }));
    }

    // Natural gas: 1000 m³ × 0.0393 GJ/m³ × 0.05153 t/GJ = 2.025129 t
    #[test_case(2.025129, 2.02, true; "small rounding drift passes")]
    #[test_case(2.025129, 2.10, false; "3.7 percent drift fails")]
    #[test_case(2.025129, 2.025129, true; "exact match passes")]
    fn relative_tolerance_cases(expected: f64, actual: f64, should_pass: bool) {
        let v = compare("gas", expected, actual, Tolerance::Relative(0.5), None, 0);
        assert_eq!(v.status == Status::Passed, should_pass, "{}", v.detail);
    }

    #[test]
    fn relative_boundary_at_exact_tolerance_fails() {
        // 100 vs 100.5 is exactly 0.5% off; strict inequality says FAILED.
        let v = compare("boundary", 100.0, 100.5, Tolerance::Relative(0.5), None, 0);
        assert_eq!(v.status, Status::Failed);
        assert!(v.detail.contains("off by"));
        assert!(v.detail.contains("above expected"));
    }

    // Electricity: 10,000 kWh × 0.66 / 1000 = 6.60 t
    #[test_case(6.60, 6.61, false; "difference of exactly the tolerance fails")]
    #[test_case(6.60, 6.605, true; "half the tolerance passes")]
    #[test_case(6.60, 6.60, true; "exact match passes")]
    fn absolute_tolerance_cases(expected: f64, actual: f64, should_pass: bool) {
        let v = compare("elec", expected, actual, Tolerance::Absolute(0.01), None, 0);
        assert_eq!(v.status == Status::Passed, should_pass, "{}", v.detail);
    }

    #[test]
    fn failed_verdict_states_magnitude_and_direction() {
        let v = compare("gas", 2.025129, 2.10, Tolerance::Relative(0.5), None, 12);
        assert_eq!(v.status, Status::Failed);
        assert!(v.detail.contains("3.70"), "detail: {}", v.detail);
        assert!(v.detail.contains("above expected"));
        assert_eq!(v.expected, Some(2.025129));
        assert_eq!(v.actual, Some(2.10));

        let v = compare("gas", 2.025129, 1.90, Tolerance::Relative(0.5), None, 12);
        assert!(v.detail.contains("below expected"));
    }

    #[test]
    fn zero_expected_is_not_a_division_error() {
        let v = compare("zero", 0.0, 0.0, Tolerance::Relative(0.5), None, 0);
        assert_eq!(v.status, Status::Passed);

        let v = compare("zero", 0.0, 0.1, Tolerance::Relative(0.5), None, 0);
        assert_eq!(v.status, Status::Failed);
    }

    #[test]
    fn verdict_carries_factor() {
        let v = compare("NSW/ACT electricity", 6.60, 6.60, Tolerance::Absolute(0.01), Some(0.66), 0);
        assert_eq!(v.factor, Some(0.66));
    }

    #[test]
    fn status_serializes_in_report_format() {
        assert_eq!(serde_json::to_string(&Status::Passed).unwrap(), "\"PASSED\"");
        assert_eq!(serde_json::to_string(&Status::Failed).unwrap(), "\"FAILED\"");
        assert_eq!(serde_json::to_string(&Status::Error).unwrap(), "\"ERROR\"");
    }
}
