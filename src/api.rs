//! Python binding layer for quintet rooting.
//!
//! Provides a Python function that roots a species tree read from a newick
//! file using gene trees read from another.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::cost::CostPolicy;
use crate::io::{read_newick_trees, read_species_tree};
use crate::rooting::{DEFAULT_SEED, RootingSettings, root_species_tree as root};
use crate::sampling::SamplingPolicy;
use crate::topology::TopologyIndex;

/// Root a species tree using quintet frequencies of gene trees.
///
/// Args:
///     species_path: Path to the unrooted species tree (newick)
///     gene_trees_path: Path to the gene trees (newick, optionally .gz)
///     sampling: Quintet sampling, one of "d", "tc", "le", "rl" (default: "d")
///     cost: Cost function, "d" or "inq" (default: "d")
///     seed: Seed for "rl" sampling (default: 1234)
///
/// Returns:
///     A tuple of (best_tree, ranking) where:
///     - best_tree is the newick string of the lowest-cost rooting
///     - ranking lists (newick, confidence) for every rooting by ascending cost
///
/// Raises:
///     ValueError: If a file cannot be read, a policy is unknown, or the trees are unusable
#[pyfunction]
#[pyo3(signature = (species_path, gene_trees_path, sampling="d", cost="d", seed=DEFAULT_SEED))]
fn root_species_tree(
    species_path: String,
    gene_trees_path: String,
    sampling: &str,
    cost: &str,
    seed: u64,
) -> PyResult<(String, Vec<(String, f64)>)> {
    let to_py = |e: crate::error::QuintetError| PyValueError::new_err(e.to_string());

    let settings = RootingSettings {
        sampling: sampling.parse::<SamplingPolicy>().map_err(to_py)?,
        cost: cost.parse::<CostPolicy>().map_err(to_py)?,
        seed,
    };
    let species = read_species_tree(&species_path).map_err(to_py)?;
    let genes = read_newick_trees(&gene_trees_path).map_err(to_py)?;
    if genes.is_empty() {
        return Err(PyValueError::new_err(format!(
            "No gene trees found in file '{}'",
            gene_trees_path
        )));
    }

    let index = TopologyIndex::new();
    let outcome = root(&species, &genes, &settings, &index).map_err(to_py)?;
    let ranking = outcome
        .ranking
        .into_iter()
        .map(|r| (r.newick, r.confidence))
        .collect();

    Ok((outcome.best.newick, ranking))
}

/// Python module definition
#[pymodule]
fn quintet_rooting(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(root_species_tree, m)?)?;
    Ok(())
}
