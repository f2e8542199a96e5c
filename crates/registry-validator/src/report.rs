//! Error-accumulating verdicts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered findings of one or more checks.
///
/// Reports are concatenated rather than short-circuited: merging two reports
/// keeps every error and warning of both, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationReport {
    /// A report with no findings
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failing finding
    pub fn push_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Record an advisory finding that does not affect validity
    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Record the error of a failed check, if any
    pub fn record<E: fmt::Display>(&mut self, result: Result<(), E>) {
        if let Err(e) = result {
            self.push_error(e.to_string());
        }
    }

    /// Append every finding of `other`
    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Whether no error has been recorded
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl<E: fmt::Display> FromIterator<E> for ValidationReport {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().map(|e| e.to_string()).collect(),
            warnings: Vec::new(),
        }
    }
}
