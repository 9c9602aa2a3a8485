//! Choosing which 5-taxon subsets to score.
//!
//! # Overview
//! | policy            | code | quintets              |
//! |-------------------|------|-----------------------|
//! | exhaustive        | `d`  | `C(n,5)`              |
//! | triplet cover     | `tc` | at most `C(n,3)`      |
//! | linear encoding   | `le` | `n`                   |
//! | random linear     | `rl` | `n`                   |
//!
//! With exactly five taxa every policy returns the single quintet.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{QuintetError, Result};
use crate::taxa::TaxonId;

/// Five distinct taxa, ascending.
pub type Quintet = [TaxonId; 5];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplingPolicy {
    #[default]
    Exhaustive,
    TripletCover,
    LinearEncoding,
    RandomLinear,
}

impl FromStr for SamplingPolicy {
    type Err = QuintetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "d" | "exhaustive" => Ok(SamplingPolicy::Exhaustive),
            "tc" | "triplet-cover" => Ok(SamplingPolicy::TripletCover),
            "le" | "linear-encoding" => Ok(SamplingPolicy::LinearEncoding),
            "rl" | "random-linear" => Ok(SamplingPolicy::RandomLinear),
            _ => Err(QuintetError::InvalidPolicy {
                kind: "sampling",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for SamplingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SamplingPolicy::Exhaustive => "exhaustive",
            SamplingPolicy::TripletCover => "triplet-cover",
            SamplingPolicy::LinearEncoding => "linear-encoding",
            SamplingPolicy::RandomLinear => "random-linear",
        };
        f.write_str(name)
    }
}

/// Samples quintets over the taxa in `leaf_order`, the depth-first leaf order
/// of the species tree. `seed` only matters for [`SamplingPolicy::RandomLinear`].
///
/// The result is sorted and free of duplicates.
///
/// # Errors
/// `TooFewTaxa` when fewer than five taxa are given.
///
/// # Example
/// ```
/// # use quintet_rooting::sampling::{sample_quintets, SamplingPolicy};
/// let all = sample_quintets(SamplingPolicy::Exhaustive, &[0, 1, 2, 3, 4, 5], 1).unwrap();
/// assert_eq!(all.len(), 6);
/// assert_eq!(all[0], [0, 1, 2, 3, 4]);
/// ```
pub fn sample_quintets(
    policy: SamplingPolicy,
    leaf_order: &[TaxonId],
    seed: u64,
) -> Result<Vec<Quintet>> {
    let n = leaf_order.len();
    if n < 5 {
        return Err(QuintetError::TooFewTaxa(n));
    }
    let taxa: Vec<TaxonId> = leaf_order.iter().copied().sorted_unstable().collect();

    let mut quintets = match policy {
        _ if n == 5 => vec![quintet_of(&taxa)],
        SamplingPolicy::Exhaustive => exhaustive(&taxa),
        SamplingPolicy::TripletCover => triplet_cover(&taxa),
        SamplingPolicy::LinearEncoding => linear_windows(leaf_order),
        SamplingPolicy::RandomLinear => {
            let mut order = taxa.clone();
            let mut rng = StdRng::seed_from_u64(seed);
            order.shuffle(&mut rng);
            linear_windows(&order)
        }
    };
    quintets.sort_unstable();
    quintets.dedup();
    Ok(quintets)
}

fn quintet_of(members: &[TaxonId]) -> Quintet {
    let mut q = [members[0], members[1], members[2], members[3], members[4]];
    q.sort_unstable();
    q
}

fn exhaustive(taxa: &[TaxonId]) -> Vec<Quintet> {
    taxa.iter()
        .copied()
        .tuple_combinations::<(_, _, _, _, _)>()
        .map(|(a, b, c, d, e)| [a, b, c, d, e])
        .collect()
}

/// Greedy cover: each uncovered triple (in lexicographic order) is completed
/// with the next two taxa after its last member, cyclically.
fn triplet_cover(taxa: &[TaxonId]) -> Vec<Quintet> {
    let n = taxa.len();
    let mut covered: HashSet<(usize, usize, usize)> = HashSet::new();
    let mut out = Vec::new();

    for (i, j, k) in (0..n).tuple_combinations::<(_, _, _)>() {
        if covered.contains(&(i, j, k)) {
            continue;
        }
        let mut positions: Vec<usize> = (1..n)
            .map(|step| (k + step) % n)
            .filter(|p| *p != i && *p != j)
            .take(2)
            .collect();
        positions.extend([i, j, k]);
        positions.sort_unstable();

        covered.extend(positions.iter().copied().tuple_combinations::<(_, _, _)>());
        out.push(quintet_of(&positions.iter().map(|&p| taxa[p]).collect_vec()));
    }
    out
}

/// Every window of five consecutive taxa of `order`, wrapping around.
fn linear_windows(order: &[TaxonId]) -> Vec<Quintet> {
    let n = order.len();
    (0..n)
        .map(|start| {
            let window: Vec<TaxonId> = (0..5).map(|k| order[(start + k) % n]).collect();
            quintet_of(&window)
        })
        .collect()
}
