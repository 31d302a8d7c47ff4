//! # Toy Problem
//!
//! A separable quadratic with a known optimum, so a run can be checked
//! against the answer. The hub iterate moves halfway to the target each
//! iteration; spokes derive bounds from their own schedule or from what the
//! hub publishes.
//!
//! ```text
//! objective(x) = optimum + s * |x - target|^2      s = +1 (min), -1 (max)
//! feasible(d)   = optimum + s * d
//! relaxation(d) = optimum - s * d
//! ```

use cy_02_spoke::{BoundSpoke, SolutionSource};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared_types::{Sense, SpokeKind, SpokeVariant};
use std::sync::Arc;
use thiserror::Error;

/// Optimal objective value of every toy instance.
pub const OPTIMUM: f64 = 100.0;

/// Initial distance scale of the self-driven bound schedules.
const SPREAD: f64 = 10.0;

/// Per-step contraction of the self-driven bound schedules.
const DECAY: f64 = 0.6;

/// Chance a plain inner-bound unit fails.
const FAILURE_RATE: f64 = 0.05;

/// A unit whose subproblem had no feasible solution.
#[derive(Debug, Error)]
#[error("Unit {unit} has no feasible solution")]
pub struct Infeasible {
    pub unit: String,
}

#[derive(Debug, Clone)]
pub struct ToyProblem {
    sense: Sense,
    target: Vec<f64>,
}

impl ToyProblem {
    pub fn new(sense: Sense, nonant_len: usize) -> Self {
        Self {
            sense,
            target: (0..nonant_len).map(|i| 1.0 + i as f64).collect(),
        }
    }

    fn sign(&self) -> f64 {
        if self.sense.is_minimizing() {
            1.0
        } else {
            -1.0
        }
    }

    pub fn starting_point(&self) -> Vec<f64> {
        self.target.iter().map(|t| t + 4.0).collect()
    }

    pub fn distance(&self, x: &[f64]) -> f64 {
        x.iter()
            .zip(&self.target)
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }

    /// Objective of a feasible point; never better than `OPTIMUM`.
    pub fn objective(&self, x: &[f64]) -> f64 {
        OPTIMUM + self.sign() * self.distance(x)
    }

    /// A feasible objective value `slack` away from the optimum.
    pub fn feasible(&self, slack: f64) -> f64 {
        OPTIMUM + self.sign() * slack.abs()
    }

    /// A valid outer bound `slack` away from the optimum.
    pub fn relaxation(&self, slack: f64) -> f64 {
        OPTIMUM - self.sign() * slack.abs()
    }

    /// One hub iteration: halve the distance to the target.
    pub fn hub_step(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(&self.target)
            .map(|(a, t)| t + (a - t) / 2.0)
            .collect()
    }

    /// Dual weights of the hub iterate.
    pub fn duals(&self, x: &[f64]) -> Vec<f64> {
        x.iter().zip(&self.target).map(|(a, t)| a - t).collect()
    }
}

/// Solution vector of an incumbent-caching spoke.
pub struct ToySolution {
    current: Mutex<Vec<f64>>,
    restored: Mutex<Option<Vec<f64>>>,
}

impl ToySolution {
    pub fn new(initial: Vec<f64>) -> Self {
        Self {
            current: Mutex::new(initial),
            restored: Mutex::new(None),
        }
    }

    pub fn set(&self, values: &[f64]) {
        *self.current.lock() = values.to_vec();
    }

    /// Values loaded back by `finalize`, if any.
    pub fn restored(&self) -> Option<Vec<f64>> {
        self.restored.lock().clone()
    }
}

impl SolutionSource for ToySolution {
    fn coordinates(&self) -> Vec<usize> {
        (0..self.current.lock().len()).collect()
    }

    fn snapshot(&self) -> Vec<f64> {
        self.current.lock().clone()
    }

    fn restore(&self, values: &[f64]) {
        *self.restored.lock() = Some(values.to_vec());
        *self.current.lock() = values.to_vec();
    }
}

/// Per-variant candidate generator of one spoke rank.
///
/// Every member of a cylinder must offer the same candidates in the same
/// order, so the generator is seeded per cylinder, not per rank.
pub struct BoundGenerator {
    variant: SpokeVariant,
    problem: ToyProblem,
    rng: StdRng,
    step: u32,
    solution: Option<Arc<ToySolution>>,
}

impl BoundGenerator {
    pub fn new(
        variant: SpokeVariant,
        problem: ToyProblem,
        seed: u64,
        solution: Option<Arc<ToySolution>>,
    ) -> Self {
        Self {
            variant,
            problem,
            rng: StdRng::seed_from_u64(seed),
            step: 0,
            solution,
        }
    }

    /// Next unit name and candidate, reading hub inputs from `spoke`.
    pub fn next(&mut self, spoke: &BoundSpoke) -> (String, Result<Option<f64>, Infeasible>) {
        self.step += 1;
        let unit = format!("{}-{}", self.variant.name(), self.step);
        let scale = SPREAD * DECAY.powi(self.step as i32) * (1.0 + 0.5 * self.rng.gen::<f64>());

        let outcome = match self.variant {
            SpokeVariant::InnerBound => {
                if self.rng.gen_bool(FAILURE_RATE) {
                    Err(Infeasible { unit: unit.clone() })
                } else {
                    Ok(Some(self.problem.feasible(scale)))
                }
            }
            SpokeVariant::OuterBound => Ok(Some(self.problem.relaxation(scale))),
            SpokeVariant::InnerBoundWithIncumbent => Ok(spoke
                .new_nonants()
                .then(|| spoke.local_nonants())
                .flatten()
                .map(|x| {
                    if let Some(solution) = &self.solution {
                        solution.set(x);
                    }
                    self.problem.objective(x)
                })),
            SpokeVariant::OuterBoundWithDuals => Ok(spoke
                .new_ws()
                .then(|| spoke.local_ws())
                .flatten()
                .map(|w| self.problem.relaxation(w.iter().map(|v| v * v).sum()))),
            SpokeVariant::OuterBoundWithNonants => Ok(spoke
                .new_nonants()
                .then(|| spoke.local_nonants())
                .flatten()
                .map(|x| self.problem.relaxation(1.5 * self.problem.distance(x)))),
        };
        (unit, outcome)
    }
}
