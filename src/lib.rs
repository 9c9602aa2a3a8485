//! Crate root: quintet-based rooting of species trees.
//!
//! Modules:
//! - `taxa`, `bitset`: taxon namespace and compact taxon sets.
//! - `tree`: arena tree built from `phylotree`, with rerooting and newick output.
//! - `snapshot`: clade snapshots and their restriction to quintets.
//! - `topology`: the 15 unrooted / 105 rooted quintet templates and their partial orders.
//! - `distribution`: gene tree topology frequencies per quintet.
//! - `cost`: cost of a rooted quintet hypothesis.
//! - `sampling`: which quintets to score.
//! - `candidates`: every rooting of the species tree.
//! - `scoring`: per-quintet cost tables, candidate totals, ranking and confidence.
//! - `rooting`: the end-to-end pipeline.
//! - `io`: reading newick files and writing results.
//! - `api`: Python bindings via `pyo3` (gated behind "python" feature).

pub mod bitset;
pub mod candidates;
pub mod cost;
pub mod distribution;
pub mod error;
pub mod io;
pub mod rooting;
pub mod sampling;
pub mod scoring;
pub mod snapshot;
pub mod taxa;
pub mod topology;
pub mod tree;

#[cfg(feature = "python")]
pub mod api;

// Re-export frequently used types & functions
pub use bitset::Bitset;
pub use cost::CostPolicy;
pub use error::{QuintetError, Result};
pub use rooting::{RankedRooting, RootingOutcome, RootingSettings, root_species_tree};
pub use sampling::SamplingPolicy;
pub use snapshot::TreeSnapshot;
pub use topology::TopologyIndex;
