//! Value iteration over a [`GridModel`] under a noisy movement model.
//!
//! An intended move lands on its target with probability 0.8. Every other
//! candidate target receives 0.05, and slipping in place receives 0.05.
//! Outcomes that would leave the grid are dropped rather than redistributed,
//! so near edges and corners the probability mass sums to less than one.
//!
//! Updates are monotone: a cell takes `max(current, best action reward)`, so
//! values converge from below and never decrease during a run.

use std::time::{Duration, Instant};

use log::{debug, info, warn};
use ndarray::{Array2, ArrayView2};

use crate::error::{Error, Result};
use crate::mdp::config::{UpdateScheme, ValueIterationConfig};
use crate::mdp::grid::{Cell, GridModel};
use crate::mdp::observer::{NoopObserver, SweepObserver};

const INTENDED_PROBABILITY: f64 = 0.8;
const SLIP_PROBABILITY: f64 = 0.05;

/// Summary of a converged run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Convergence {
    /// Sweeps performed, including the final one under the threshold.
    pub sweeps: usize,
    pub biggest_change: f64,
    pub elapsed: Duration,
}

/// Drives a [`GridModel`] to convergence.
///
/// # Examples
///
/// ```
/// use grid_mdp::{Cell, GridModel, ValueIteration, ValueIterationConfig};
///
/// let grid: GridModel = "..G\n.x.\n...".parse().unwrap();
/// let mut engine = ValueIteration::new(grid, ValueIterationConfig::default()).unwrap();
/// let convergence = engine.run().unwrap();
///
/// assert!(convergence.biggest_change < 0.05);
/// // Pits keep their initial value.
/// assert_eq!(engine.model().value(Cell::new(1, 1)).unwrap(), -1.0);
/// // Next to the goal is worth more than the far corner.
/// let values = engine.values();
/// assert!(values[[0, 1]] > values[[2, 0]]);
/// ```
#[derive(Debug, Clone)]
pub struct ValueIteration {
    model: GridModel,
    config: ValueIterationConfig,
}

impl ValueIteration {
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `config` fails validation.
    pub fn new(model: GridModel, config: ValueIterationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { model, config })
    }

    pub fn model(&self) -> &GridModel {
        &self.model
    }

    pub fn config(&self) -> &ValueIterationConfig {
        &self.config
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.model.values()
    }

    pub fn into_model(self) -> GridModel {
        self.model
    }

    /// Sweeps until the biggest change drops below the threshold.
    ///
    /// # Errors
    ///
    /// [`Error::NonConvergence`] once `max_iterations` sweeps have run, or
    /// [`Error::DeadlineExceeded`] once the configured deadline passes. Both
    /// carry the values reached so far.
    pub fn run(&mut self) -> Result<Convergence> {
        self.run_with(&mut NoopObserver)
    }

    /// Like [`run`](Self::run), calling `observer` after every sweep.
    pub fn run_with<O>(&mut self, observer: &mut O) -> Result<Convergence>
    where
        O: SweepObserver + ?Sized,
    {
        let start = Instant::now();
        let mut biggest_change = f64::INFINITY;

        for sweep in 0..self.config.max_iterations {
            biggest_change = self.sweep();
            debug!("sweep {}: biggest change {}", sweep, biggest_change);
            observer.on_sweep(sweep, self.model.values(), biggest_change);

            if biggest_change < self.config.threshold {
                let convergence = Convergence {
                    sweeps: sweep + 1,
                    biggest_change,
                    elapsed: start.elapsed(),
                };
                info!(
                    "converged after {} sweeps in {:?}",
                    convergence.sweeps, convergence.elapsed
                );
                return Ok(convergence);
            }

            if let Some(deadline) = self.config.deadline {
                let elapsed = start.elapsed();
                if elapsed >= deadline {
                    warn!(
                        "deadline of {:?} exceeded after {} sweeps",
                        deadline,
                        sweep + 1
                    );
                    return Err(Error::DeadlineExceeded {
                        sweeps: sweep + 1,
                        elapsed,
                        values: self.model.values().to_owned(),
                    });
                }
            }
        }

        warn!(
            "no convergence after {} sweeps, last change {}",
            self.config.max_iterations, biggest_change
        );
        Err(Error::NonConvergence {
            sweeps: self.config.max_iterations,
            biggest_change,
            values: self.model.values().to_owned(),
        })
    }

    /// Performs one sweep over every non-terminal cell in row-major order
    /// and returns the biggest absolute change applied to any cell.
    pub fn sweep(&mut self) -> f64 {
        let previous: Option<Array2<f64>> = match self.config.scheme {
            UpdateScheme::InPlace => None,
            UpdateScheme::Synchronous => Some(self.model.values().to_owned()),
        };
        let allow_stay = self.config.allow_stay_action;
        let discount = self.config.discount_rate;
        let (height, width) = self.model.dim();
        let mut biggest_change = 0.0_f64;

        for row in 0..height {
            for col in 0..width {
                let state = Cell::new(row, col);
                if self.model.is_terminal(state) {
                    continue;
                }

                let candidates = self.model.actions_from(state, allow_stay);
                // Staying on the goal collects the bonus once per visit.
                let bonus = if self.collects_goal_bonus(state) {
                    self.model.decay_goal_bonus(discount)
                } else {
                    0.0
                };

                let source = match &previous {
                    Some(values) => values.view(),
                    None => self.model.values(),
                };
                let best = candidates
                    .iter()
                    .map(|&target| action_value(source, state, target, &candidates, bonus, discount))
                    .fold(f64::NEG_INFINITY, f64::max);

                let current = self.model.values()[state.index()];
                let updated = self.config.round(current.max(best));
                self.model.values_mut()[state.index()] = updated;
                biggest_change = biggest_change.max(self.config.round((updated - current).abs()));
            }
        }

        biggest_change
    }

    /// Expected reward of taking `action` (a target cell) from `state`
    /// against the current values.
    ///
    /// `action` must be one of [`GridModel::actions_from`] for `state` under
    /// the configured stay rule. Staying on a non-terminal goal collects, and
    /// therefore decays, the goal bonus exactly as a sweep would.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCoordinate`] if either cell is off the grid,
    /// or [`Error::InvalidAction`] if `action` is not a legal move.
    pub fn reward(&mut self, state: Cell, action: Cell) -> Result<f64> {
        for cell in [state, action] {
            if !self.model.in_bounds(cell) {
                return Err(self.model.invalid(cell));
            }
        }

        let candidates = self
            .model
            .actions_from(state, self.config.allow_stay_action);
        if !candidates.contains(&action) {
            return Err(Error::InvalidAction { state, action });
        }

        let discount = self.config.discount_rate;
        let bonus = if action == state && self.collects_goal_bonus(state) {
            self.model.decay_goal_bonus(discount)
        } else {
            0.0
        };
        Ok(action_value(
            self.model.values(),
            state,
            action,
            &candidates,
            bonus,
            discount,
        ))
    }

    /// The target with the highest expected reward from `cell`, or `None`
    /// for terminal cells and cells with nowhere to go. Earlier candidates
    /// win ties. The goal bonus is previewed, not collected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCoordinate`] if `cell` is off the grid.
    pub fn best_action(&self, cell: Cell) -> Result<Option<Cell>> {
        if !self.model.in_bounds(cell) {
            return Err(self.model.invalid(cell));
        }
        if self.model.is_terminal(cell) {
            return Ok(None);
        }

        let allow_stay = self.config.allow_stay_action;
        let discount = self.config.discount_rate;
        let candidates = self.model.actions_from(cell, allow_stay);
        let bonus = if self.collects_goal_bonus(cell) {
            self.model.remaining_goal_bonus() * discount
        } else {
            0.0
        };

        let mut best: Option<(Cell, f64)> = None;
        for &target in &candidates {
            let value = action_value(
                self.model.values(),
                cell,
                target,
                &candidates,
                bonus,
                discount,
            );
            if best.map_or(true, |(_, best_value)| value > best_value) {
                best = Some((target, value));
            }
        }
        Ok(best.map(|(target, _)| target))
    }

    /// Staying on `state` pays the goal bonus only when staying is allowed
    /// and `state` is a goal that still updates.
    fn collects_goal_bonus(&self, state: Cell) -> bool {
        self.config.allow_stay_action
            && self.model.goal() == Some(state)
            && !self.model.is_terminal(state)
    }
}

/// Q-value of moving from `state` toward `target` given `values`.
fn action_value(
    values: ArrayView2<'_, f64>,
    state: Cell,
    target: Cell,
    candidates: &[Cell],
    bonus: f64,
    discount: f64,
) -> f64 {
    if target == state {
        return values[state.index()] + bonus;
    }

    let mut reward = INTENDED_PROBABILITY * values[target.index()];
    for &other in candidates {
        if other != target && other != state {
            reward += SLIP_PROBABILITY * values[other.index()];
        }
    }
    // One slip in place, even when staying is itself a candidate.
    reward += SLIP_PROBABILITY * values[state.index()];

    reward * discount
}
