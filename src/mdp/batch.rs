//! Independent runs over many grids.
//!
//! Each run owns its grid outright; nothing is shared between runs except the
//! read-only configuration. With the `parallel` feature the runs are spread
//! over rayon's thread pool.

use crate::error::Result;
use crate::mdp::config::ValueIterationConfig;
use crate::mdp::grid::GridModel;
use crate::mdp::value_iteration::{Convergence, ValueIteration};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Runs `model` to convergence and hands it back with the run summary.
pub fn solve(model: GridModel, config: &ValueIterationConfig) -> Result<(GridModel, Convergence)> {
    let mut engine = ValueIteration::new(model, config.clone())?;
    let convergence = engine.run()?;
    Ok((engine.into_model(), convergence))
}

/// Solves every grid independently. Results keep the input order.
pub fn solve_batch(
    models: Vec<GridModel>,
    config: &ValueIterationConfig,
) -> Vec<Result<(GridModel, Convergence)>> {
    #[cfg(feature = "parallel")]
    {
        models
            .into_par_iter()
            .map(|model| solve(model, config))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        models
            .into_iter()
            .map(|model| solve(model, config))
            .collect()
    }
}
