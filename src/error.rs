//! Error types shared by the grid model and the value iteration engine.

use std::time::Duration;

use ndarray::Array2;
use thiserror::Error;

use crate::mdp::grid::Cell;

/// Reasons a textual grid is rejected before any iteration begins.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GridError {
    /// No rows, or rows with no symbols.
    #[error("grid has no cells")]
    Empty,
    /// A row whose length differs from the first row.
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    /// A symbol other than `.`, `*`, `x` or `G`.
    #[error("unrecognized symbol {symbol:?} at {row}, {col}")]
    UnrecognizedSymbol { symbol: char, row: usize, col: usize },
    /// More than one `G`.
    #[error("second goal at {second}, first goal at {first}")]
    DuplicateGoal { first: Cell, second: Cell },
}

/// Everything that can go wrong building or solving a grid.
#[derive(Debug, Error)]
pub enum Error {
    /// The grid text was rejected; nothing was computed.
    #[error("malformed grid: {0}")]
    MalformedGrid(#[from] GridError),

    /// A cell outside the grid was passed to a lookup.
    #[error("coordinate {cell} lies outside a {height}x{width} grid")]
    InvalidCoordinate {
        cell: Cell,
        height: usize,
        width: usize,
    },

    /// `action` is not one of the moves available from `state` under the
    /// current configuration.
    #[error("{action} is not a legal action from {state}")]
    InvalidAction { state: Cell, action: Cell },

    /// A configuration field is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// The sweep budget ran out. `values` holds the best-effort matrix.
    #[error("no convergence after {sweeps} sweeps (last change {biggest_change})")]
    NonConvergence {
        sweeps: usize,
        biggest_change: f64,
        values: Array2<f64>,
    },

    /// The wall-clock deadline passed. `values` holds the best-effort matrix.
    #[error("deadline exceeded after {sweeps} sweeps ({elapsed:?})")]
    DeadlineExceeded {
        sweeps: usize,
        elapsed: Duration,
        values: Array2<f64>,
    },

    /// The grid file could not be read.
    #[error("failed to read grid: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The partial value matrix carried by iteration-time failures.
    pub fn best_effort_values(&self) -> Option<&Array2<f64>> {
        match self {
            Error::NonConvergence { values, .. } | Error::DeadlineExceeded { values, .. } => {
                Some(values)
            }
            _ => None,
        }
    }
}
