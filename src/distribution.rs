//! Empirical gene-tree topology frequencies for one quintet.

use crate::error::Result;
use crate::sampling::Quintet;
use crate::snapshot::TreeSnapshot;
use crate::topology::{N_UNROOTED, TopologyIndex};

/// Relative frequency of each of the 15 unrooted quintet topologies among the
/// gene trees that resolve the quintet.
///
/// Gene trees that miss one of the five taxa, or whose restriction is not
/// binary, are left out of both the counts and `resolved`. When no gene tree
/// resolves the quintet every frequency is 0.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyDistribution {
    pub frequencies: [f64; N_UNROOTED],
    pub resolved: usize,
}

impl TopologyDistribution {
    pub fn from_counts(counts: [usize; N_UNROOTED]) -> Self {
        let resolved: usize = counts.iter().sum();
        let frequencies = if resolved == 0 {
            [0.0; N_UNROOTED]
        } else {
            counts.map(|c| c as f64 / resolved as f64)
        };
        TopologyDistribution {
            frequencies,
            resolved,
        }
    }

    /// Restricts every gene tree to `quintet` and tallies the result.
    ///
    /// # Errors
    /// `Resolution` if a binary restriction matches no unrooted template.
    pub fn estimate(
        quintet: &Quintet,
        genes: &[TreeSnapshot],
        index: &TopologyIndex,
    ) -> Result<Self> {
        let mut counts = [0usize; N_UNROOTED];
        for gene in genes {
            if let Some(splits) = gene.quintet_unrooted(quintet) {
                counts[index.resolve_unrooted(&splits)?] += 1;
            }
        }
        Ok(Self::from_counts(counts))
    }

    /// No gene tree resolved the quintet.
    pub fn is_degenerate(&self) -> bool {
        self.resolved == 0
    }

    pub fn total(&self) -> f64 {
        self.frequencies.iter().sum()
    }

    #[inline]
    pub fn get(&self, u: usize) -> f64 {
        self.frequencies[u]
    }
}
