//! Two-phase scoring: a per-quintet cost table, then a per-candidate sum.
//!
//! ```text
//!  quintets ──par_iter──► QuintetEvidence { unrooted, costs: [f64; 7] }
//!                                   │
//!  candidates ──par_iter──► Σ costs[position of candidate in quintet]
//! ```
//! Both passes only read shared data, so rayon can split them freely.

use log::debug;
use rayon::prelude::*;

use crate::candidates::RootedCandidate;
use crate::cost::{CostPolicy, compute_cost_rooted_quintets};
use crate::distribution::TopologyDistribution;
use crate::error::{QuintetError, Result};
use crate::sampling::Quintet;
use crate::snapshot::TreeSnapshot;
use crate::topology::{N_ROOTINGS, TopologyIndex};

/// What one quintet contributes to the score of any rooting.
#[derive(Debug, Clone)]
pub struct QuintetEvidence {
    pub quintet: Quintet,
    /// Unrooted topology of the species tree on this quintet.
    pub unrooted: usize,
    /// Cost of each rooting of `unrooted`, by edge position.
    pub costs: [f64; N_ROOTINGS],
    /// Gene trees that resolved the quintet.
    pub resolved: usize,
}

/// Builds the cost table for every sampled quintet.
///
/// # Errors
/// `Resolution` when the species tree does not resolve a quintet, or when a
/// restriction matches no template.
pub fn preprocess(
    quintets: &[Quintet],
    species: &TreeSnapshot,
    genes: &[TreeSnapshot],
    index: &TopologyIndex,
    policy: CostPolicy,
) -> Result<Vec<QuintetEvidence>> {
    quintets
        .par_iter()
        .map(|quintet| -> Result<QuintetEvidence> {
            let splits = species.quintet_unrooted(quintet).ok_or_else(|| {
                QuintetError::Resolution(format!("species tree on quintet {quintet:?}"))
            })?;
            let unrooted = index.resolve_unrooted(&splits)?;
            let distribution = TopologyDistribution::estimate(quintet, genes, index)?;
            if distribution.is_degenerate() {
                debug!("no gene tree resolves quintet {quintet:?}");
            }
            Ok(QuintetEvidence {
                quintet: *quintet,
                unrooted,
                costs: compute_cost_rooted_quintets(&distribution, unrooted, index, policy),
                resolved: distribution.resolved,
            })
        })
        .collect()
}

/// Total cost of every candidate, in candidate order.
pub fn score_candidates(
    candidates: &[RootedCandidate],
    evidence: &[QuintetEvidence],
    index: &TopologyIndex,
) -> Result<Vec<f64>> {
    candidates
        .par_iter()
        .map(|candidate| {
            evidence.iter().try_fold(0.0, |total, ev| -> Result<f64> {
                let clades = candidate.snapshot.quintet_rooted(&ev.quintet).ok_or_else(|| {
                    QuintetError::Resolution(format!("candidate on quintet {:?}", ev.quintet))
                })?;
                let position = index.resolve_rooted(ev.unrooted, &clades)?;
                Ok(total + ev.costs[position])
            })
        })
        .collect()
}

/// Index of the lowest cost; ties go to the earliest candidate.
///
/// # Example
/// ```
/// # use quintet_rooting::scoring::best_index;
/// assert_eq!(best_index(&[3.0, 1.0, 1.0, 2.0]), Some(1));
/// assert_eq!(best_index(&[]), None);
/// ```
pub fn best_index(costs: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &c) in costs.iter().enumerate() {
        match best {
            Some((_, b)) if c >= b => {}
            _ => best = Some((i, c)),
        }
    }
    best.map(|(i, _)| i)
}

/// `(max - cost[i]) / Σ (max - cost[j])`, or `1/len` each when all costs are
/// equal.
pub fn confidence_scores(costs: &[f64]) -> Vec<f64> {
    let max = costs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let gaps: Vec<f64> = costs.iter().map(|c| max - c).collect();
    let total: f64 = gaps.iter().sum();
    if total > 0.0 {
        gaps.into_iter().map(|g| g / total).collect()
    } else {
        vec![1.0 / costs.len() as f64; costs.len()]
    }
}

/// Candidate indices by ascending cost; equal costs keep candidate order.
pub fn ranking(costs: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..costs.len()).collect();
    order.sort_by(|&a, &b| costs[a].total_cmp(&costs[b]));
    order
}
