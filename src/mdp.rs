pub mod batch;
pub mod config;
pub mod grid;
pub mod observer;
pub mod value_iteration;


// Re-export the grid world and its solver
pub use batch::{solve, solve_batch};
pub use config::{UpdateScheme, ValueIterationConfig};
pub use grid::{Action, Cell, CellKind, GridModel, GridRewards};
pub use observer::{NoopObserver, Snapshot, SnapshotRecorder, SweepObserver};
pub use value_iteration::{Convergence, ValueIteration};
