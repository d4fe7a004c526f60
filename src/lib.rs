//! Finite-horizon value iteration over small discrete grid worlds.
//!
//! A [`GridModel`] is parsed from rows of symbols (`.` free, `*` wall,
//! `x` pit, `G` goal) and [`ValueIteration`] repeatedly sweeps it until the
//! biggest per-cell change falls below a threshold.
//!
//! ```
//! use grid_mdp::{GridModel, ValueIteration, ValueIterationConfig};
//!
//! let grid: GridModel = "...G\n.*..\n....".parse().unwrap();
//! let mut engine = ValueIteration::new(grid, ValueIterationConfig::default()).unwrap();
//! engine.run().unwrap();
//! println!("{}", engine.model());
//! ```

pub mod error;
pub mod mdp;

pub use error::{Error, GridError, Result};
pub use mdp::*;
