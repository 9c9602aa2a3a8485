//! Crate-wide error type.

use phylotree::tree::TreeError;
use thiserror::Error;

use crate::tree::NodeId;

/// Everything that can go wrong while rooting a species tree.
#[derive(Error, Debug)]
pub enum QuintetError {
    /// The species tree must span at least one quintet.
    #[error("species tree has {0} taxa, at least 5 are required")]
    TooFewTaxa(usize),

    #[error("species tree is not fully resolved (binary)")]
    NotBinary,

    #[error("found a leaf without a taxon label")]
    UnnamedLeaf,

    #[error("taxon `{0}` appears more than once in the same tree")]
    DuplicateTaxon(String),

    #[error("taxon `{0}` is not part of the species tree")]
    UnknownTaxon(String),

    /// A restricted quintet matched none of the canonical templates.
    #[error("no quintet template matches {0}")]
    Resolution(String),

    #[error("nodes ({0}, {1}) do not form an edge of the tree")]
    InvalidEdge(NodeId, NodeId),

    #[error("failed to parse newick: {0}")]
    Newick(String),

    #[error("no gene trees provided")]
    NoGeneTrees,

    #[error("no rooting of the species tree could be built")]
    NoCandidates,

    #[error("unknown {kind} policy `{value}`")]
    InvalidPolicy { kind: &'static str, value: String },

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, QuintetError>;
