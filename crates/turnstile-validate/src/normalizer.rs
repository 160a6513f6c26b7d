//! Reduces a validation report to a single client error.
//!
//! Only one failure is reported per request:
//!
//! 1. a fail-fast cross-field violation (for example a cursor conflict), if any;
//! 2. otherwise the first failing field in declaration order, using its first
//!    constraint message;
//! 3. otherwise the first remaining cross-field violation.
//!
//! Messages of violations flagged general are dropped; the property is kept.

use crate::violation::{ValidationReport, Violation};
use turnstile_core::ApiError;

/// Converts validation reports into [`ApiError`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationErrorNormalizer;

impl ValidationErrorNormalizer {
    /// Returns the error to report, or `None` when the report is clean.
    #[must_use]
    pub fn normalize(report: &ValidationReport) -> Option<ApiError> {
        Self::select(report).map(|v| v.clone().into_error())
    }

    /// Returns the violation that would be reported.
    #[must_use]
    pub fn select(report: &ValidationReport) -> Option<&Violation> {
        let fail_fast = report
            .object_violations()
            .iter()
            .find(|v| v.code.is_fail_fast());

        fail_fast
            .or_else(|| {
                report
                    .field_failures()
                    .first()
                    .and_then(|failure| failure.violations.first())
            })
            .or_else(|| report.object_violations().first())
    }
}
