//! Custom error types for the crate.
//!
//! All failure modes of the windowed trace evaluation are collected into a
//! single opaque type, [`SpectralError`], wrapping a private kind enum. The
//! [`thiserror`] crate provides the `Display`/`Error` implementations with
//! minimal boilerplate. [`faer::linalg::evd::EvdError`] does not implement the
//! standard [`std::error::Error`] trait, so it is wrapped manually.
//!
//! Every precondition failure is detected eagerly, before any Chebyshev
//! recurrence is started; there is no partial-result mode.

use thiserror::Error;

/// Represents all possible errors that can occur during a trace evaluation.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct SpectralError(#[from] SpectralErrorKind);

/// Private enum containing the distinct kinds of errors.
/// This separation allows for a clean `Display` implementation via [`thiserror`]
/// while keeping the set of variants free to evolve.
#[derive(Error, Debug, PartialEq)]
pub(crate) enum SpectralErrorKind {
    /// The operators, the coefficient matrix, or a factor output do not have
    /// consistent shapes. Reported before any streaming begins.
    #[error(
        "Dimension mismatch: {context} is {actual_rows}x{actual_cols} but {expected_rows}x{expected_cols} was required."
    )]
    DimensionMismatch {
        context: &'static str,
        expected_rows: usize,
        expected_cols: usize,
        actual_rows: usize,
        actual_cols: usize,
    },

    /// A Chebyshev stream was asked to advance past its final term. The
    /// evaluator pulls each stream exactly `n` times, so seeing this error
    /// from [`crate::trace_windowed`] indicates a pull-count bookkeeping bug.
    #[error("Chebyshev stream exhausted: all {limit} terms have already been produced.")]
    Exhausted { limit: usize },

    /// The two scalar-factor specifications of a separable approximation
    /// differ. The windowed evaluator assumes both sides of the bilinear form
    /// share the same factor `q`.
    #[error(
        "Scalar factor mismatch: both sides of the separable approximation must use the same factor."
    )]
    FactorMismatch,

    /// The user-supplied scalar factor `q` failed when applied to a seed vector.
    #[error("Scalar factor application failed: {0}")]
    Factor(String),

    /// Indicates that an invalid input parameter was provided to a function.
    #[error("Invalid input parameter: {0}")]
    InputError(String),

    /// Wraps an error originating from [`faer`]'s eigendecomposition module,
    /// raised by the dense reference evaluator.
    #[error("A numerical error occurred during the eigendecomposition of H: {0:?}")]
    Evd(faer::linalg::evd::EvdError),
}

// Manually implement PartialEq for the public error type.
// We compare the inner `SpectralErrorKind`.
impl PartialEq for SpectralError {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

// Unit tests to ensure error messages are formatted correctly.
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_error_message() {
        let error = SpectralError(SpectralErrorKind::DimensionMismatch {
            context: "weight operator Da",
            expected_rows: 100,
            expected_cols: 100,
            actual_rows: 99,
            actual_cols: 100,
        });
        let expected_message =
            "Dimension mismatch: weight operator Da is 99x100 but 100x100 was required.";
        assert_eq!(error.to_string(), expected_message);
    }

    #[test]
    fn test_exhausted_error_message() {
        let error = SpectralError(SpectralErrorKind::Exhausted { limit: 64 });
        let expected_message =
            "Chebyshev stream exhausted: all 64 terms have already been produced.";
        assert_eq!(error.to_string(), expected_message);
    }

    #[test]
    fn test_factor_mismatch_error_message() {
        let error = SpectralError(SpectralErrorKind::FactorMismatch);
        assert!(error.to_string().contains("Scalar factor mismatch"));
    }

    #[test]
    fn test_input_error_message() {
        let error = SpectralError(SpectralErrorKind::InputError(
            "The coefficient matrix must not be empty.".to_string(),
        ));
        let expected_message = "Invalid input parameter: The coefficient matrix must not be empty.";
        assert_eq!(error.to_string(), expected_message);
    }
}
