use serde::Serialize;
use std::fmt;

/// Outcome of a single structural check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckOutcome {
    Pass,
    Fail,
}

impl CheckOutcome {
    pub fn is_pass(self) -> bool {
        self == CheckOutcome::Pass
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckOutcome::Pass => write!(f, "PASS"),
            CheckOutcome::Fail => write!(f, "FAIL"),
        }
    }
}

/// One PASS/FAIL line of a stage's companion run report.
///
/// These are operator-facing findings. A FAIL never aborts the pipeline; the
/// run already degraded the offending values to absent where needed.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub check: String,
    pub result: CheckOutcome,
    pub details: String,
}

impl CheckResult {
    pub fn new(check: impl Into<String>, passed: bool, details: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            result: if passed {
                CheckOutcome::Pass
            } else {
                CheckOutcome::Fail
            },
            details: details.into(),
        }
    }
}

/// One `metric,value` line of a summary report.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryMetric {
    pub metric: String,
    pub value: String,
}

impl SummaryMetric {
    pub fn new(metric: impl Into<String>, value: impl ToString) -> Self {
        Self {
            metric: metric.into(),
            value: value.to_string(),
        }
    }
}
