//! Error types for the evaluation pipeline.
//!
//! Every fallible operation in this crate returns `Result<T, CasError>`.
//! Nothing panics on malformed user input; the public entry point
//! (`Workspace::evaluate`) catches every `CasError` and turns it into the
//! `{ok: false, error: ...}` result shape.

use std::fmt;

/// The closed set of ways an evaluation can fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasError {
    /// The LaTeX or algebraic surface syntax did not parse.
    ParseError(String),
    /// A named command was not recognized.
    UnknownCommand(String),
    /// A command or user function was called with the wrong number of arguments.
    ArityMismatch { name: String, expected: String, got: usize },
    /// A matrix-only command was given a non-matrix argument.
    NotAMatrix(String),
    /// A matrix command that requires a square matrix was given a non-square one.
    NonSquare { rows: usize, cols: usize },
    /// Matrix inversion was requested on a singular matrix.
    Singular(String),
    /// A matrix environment had rows of differing widths.
    JaggedMatrix { row: usize, expected: usize, got: usize },
    /// Variable resolution found a cycle in the binding graph.
    CircularDependency(String),
    /// Any other downstream algebra failure.
    Engine(String),
}

impl fmt::Display for CasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CasError::ParseError(s) => write!(f, "Could not parse '{s}'"),
            CasError::UnknownCommand(name) => write!(f, "Unknown command: {name}"),
            CasError::ArityMismatch { name, expected, got } => write!(
                f,
                "'{name}' expects {expected} argument(s), got {got}"
            ),
            CasError::NotAMatrix(s) => write!(f, "'{s}' is not a matrix"),
            CasError::NonSquare { rows, cols } => {
                write!(f, "expected a square matrix, got {rows}×{cols}")
            }
            CasError::Singular(name) => write!(f, "matrix '{name}' is singular or non-invertible"),
            CasError::JaggedMatrix { row, expected, got } => write!(
                f,
                "jagged matrix: row {row} has {got} column(s), expected {expected}"
            ),
            CasError::CircularDependency(name) => {
                write!(f, "Circular dependency detected involving '{name}'")
            }
            CasError::Engine(s) => write!(f, "{s}"),
        }
    }
}

impl std::error::Error for CasError {}

pub type CasResult<T> = Result<T, CasError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circular_message_names_the_variable() {
        let err = CasError::CircularDependency("q".to_string());
        assert!(err.to_string().contains("ircular"));
        assert!(err.to_string().contains('q'));
    }

    #[test]
    fn non_square_reports_dimensions() {
        let err = CasError::NonSquare { rows: 2, cols: 3 };
        assert_eq!(err.to_string(), "expected a square matrix, got 2×3");
    }
}
