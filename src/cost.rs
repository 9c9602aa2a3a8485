//! Scoring a rooted quintet hypothesis against an observed distribution.
//!
//! Each rooted quintet topology predicts a partial order over the frequencies
//! of the 15 unrooted gene tree topologies (see [`crate::topology`]). The cost
//! measures how far the observed frequencies are from satisfying it:
//!
//! ```text
//! default     Σ_eq |f_i - f_j|  +  Σ_ineq max(0, f_j - f_i)  [+ caterpillar term]
//! inequality                       Σ_ineq max(0, f_j - f_i)
//! ```
//!
//! A balanced species quintet produces exactly the frequencies a caterpillar
//! allows at the boundary of its order (the two strict relations collapse to
//! equalities). The caterpillar term charges `SHAPE_TIE_BREAK` for every strict
//! relation whose greater side carries mass but does not exceed the lesser one,
//! so the balanced rooting wins such exact ties. The weight sits far below any
//! frequency difference, and a distribution that puts no mass on either side
//! of a strict relation costs nothing.

use std::fmt;
use std::str::FromStr;

use crate::distribution::TopologyDistribution;
use crate::error::QuintetError;
use crate::topology::{ComparisonIndices, N_ROOTINGS, Shape, TopologyIndex};

/// Charge per collapsed caterpillar strict relation.
pub const SHAPE_TIE_BREAK: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CostPolicy {
    #[default]
    Default,
    Inequality,
}

impl FromStr for CostPolicy {
    type Err = QuintetError;

    /// Accepts the short codes `d` and `inq` as well as the full names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "d" | "default" => Ok(CostPolicy::Default),
            "inq" | "inequality" => Ok(CostPolicy::Inequality),
            _ => Err(QuintetError::InvalidPolicy {
                kind: "cost",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for CostPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostPolicy::Default => write!(f, "default"),
            CostPolicy::Inequality => write!(f, "inequality"),
        }
    }
}

/// Cost of one rooted hypothesis. Lower is better; a degenerate distribution
/// costs `0.0` under every hypothesis.
///
/// # Example
/// ```
/// # use quintet_rooting::{cost::{cost, CostPolicy}, distribution::TopologyDistribution,
/// #     topology::TopologyIndex};
/// let index = TopologyIndex::new();
/// let r = index.u2r(0)[5];
/// let mut counts = [0; 15];
/// counts[0] = 10;
/// let dist = TopologyDistribution::from_counts(counts);
/// assert_eq!(cost(&dist, index.comparisons(r), index.shape(r), CostPolicy::Default), 0.0);
/// ```
pub fn cost(
    distribution: &TopologyDistribution,
    comparisons: &ComparisonIndices,
    shape: Shape,
    policy: CostPolicy,
) -> f64 {
    if distribution.is_degenerate() {
        return 0.0;
    }
    let f = &distribution.frequencies;

    let violations: f64 = comparisons
        .inequalities
        .iter()
        .map(|&(i, j)| (f[j] - f[i]).max(0.0))
        .sum();

    match policy {
        CostPolicy::Inequality => violations,
        CostPolicy::Default => {
            let spread: f64 = comparisons
                .equalities
                .iter()
                .map(|&(i, j)| (f[i] - f[j]).abs())
                .sum();
            let tie_break = if shape == Shape::Caterpillar {
                let collapsed = comparisons
                    .strict
                    .iter()
                    .filter(|&&(i, j)| f[i] > 0.0 && f[i] <= f[j])
                    .count();
                SHAPE_TIE_BREAK * collapsed as f64
            } else {
                0.0
            };
            spread + violations + tie_break
        }
    }
}

/// Cost of each of the seven rootings of unrooted topology `u`, by edge
/// position.
pub fn compute_cost_rooted_quintets(
    distribution: &TopologyDistribution,
    u: usize,
    index: &TopologyIndex,
    policy: CostPolicy,
) -> [f64; N_ROOTINGS] {
    let rootings = *index.u2r(u);
    rootings.map(|r| cost(distribution, index.comparisons(r), index.shape(r), policy))
}
