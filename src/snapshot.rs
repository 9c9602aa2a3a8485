//! Clade snapshots of trees and their restriction to quintets.
//!
//! # Overview
//! A `TreeSnapshot` records, for every non-root node, the set of taxa below it.
//! Once taken, a snapshot is immutable and can be shared across threads while
//! thousands of quintets are restricted against it.
//!
//! # Restriction to a quintet
//! Intersecting every clade with the five taxa of a quintet gives the clades
//! of the induced subtree (degree-2 nodes simply repeat their child's mask):
//! ```text
//!            root                    quintet [A, B, C, D, F]
//!           /    \
//!        n1       n2                 n1 ∩ q = {A,B,C}   → 0b00111
//!       /  \     /  \                n3 ∩ q = {A,B}     → 0b00011
//!     n3    C   D    n4              n2 ∩ q = {D,F}     → 0b11000
//!    /  \           /  \             n4 ∩ q = {F}       (trivial)
//!   A    B         E    F
//! ```
//! For an unrooted reading the root is meaningless, so each clade is turned
//! into the pair side of its split: `{A,B,C}` becomes `{D,F}`.

use std::collections::HashSet;

use crate::bitset::Bitset;
use crate::sampling::Quintet;
use crate::topology::{FULL_MASK, QuintetClades, QuintetSplits};
use crate::tree::Tree;

#[derive(Debug, Clone)]
pub struct TreeSnapshot {
    /// Taxon set below every non-root internal node, in arena order.
    pub clades: Vec<Bitset>,

    /// Every taxon present in the tree.
    pub leaves: Bitset,

    /// Number of taxa in the shared namespace (needed for complements).
    pub num_taxa: usize,

    pub rooted: bool,
}

impl TreeSnapshot {
    /// Builds the snapshot bottom-up over the arena.
    ///
    /// `num_taxa` is the size of the shared namespace, not the number of
    /// leaves in this tree: gene trees may miss taxa.
    pub fn from_tree(tree: &Tree, num_taxa: usize) -> Self {
        let words = Bitset::words_for(num_taxa);
        let mut below = vec![Bitset::zeros(words); tree.len()];
        Self::fill(tree, tree.root(), &mut below);

        let leaves = below[tree.root()].clone();
        let clades = below
            .into_iter()
            .enumerate()
            .filter(|(id, clade)| {
                *id != tree.root() && !tree.node(*id).is_leaf() && clade.count_ones() > 1
            })
            .map(|(_, clade)| clade)
            .collect();

        TreeSnapshot {
            clades,
            leaves,
            num_taxa,
            rooted: tree.is_rooted(),
        }
    }

    fn fill(tree: &Tree, id: usize, below: &mut [Bitset]) {
        let node = tree.node(id);
        if let Some(t) = node.taxon {
            below[id].set(t);
        }
        for &child in &node.children {
            Self::fill(tree, child, below);
            let child_set = below[child].clone();
            below[id].or_assign(&child_set);
        }
    }

    /// Whether all five taxa of `quintet` are leaves of this tree.
    pub fn covers(&self, quintet: &Quintet) -> bool {
        self.leaves.quintet_mask(quintet) == FULL_MASK
    }

    /// Unrooted restriction: the two cherry masks of the induced quintet
    /// tree, or `None` when a taxon is missing or the restriction is not
    /// fully resolved.
    ///
    /// # Example
    /// ```
    /// # use quintet_rooting::{snapshot::TreeSnapshot, taxa::TaxonSet, tree::{Tree, UnknownTaxa}};
    /// let taxa = TaxonSet::from_names(["A", "B", "C", "D", "E"]).unwrap();
    /// let tree = Tree::from_newick("((A,B),C,(D,E));", &taxa, UnknownTaxa::Reject).unwrap();
    /// let snap = TreeSnapshot::from_tree(&tree, taxa.len());
    /// let splits = snap.quintet_unrooted(&[0, 1, 2, 3, 4]).unwrap();
    /// assert_eq!(splits.pairs(), [0b00011, 0b11000]);
    /// ```
    pub fn quintet_unrooted(&self, quintet: &Quintet) -> Option<QuintetSplits> {
        if !self.covers(quintet) {
            return None;
        }
        let mut pairs: Vec<u8> = self
            .clades
            .iter()
            .filter_map(|clade| {
                let mask = clade.quintet_mask(quintet);
                match mask.count_ones() {
                    2 => Some(mask),
                    3 => Some(FULL_MASK ^ mask),
                    _ => None,
                }
            })
            .collect();
        pairs.sort_unstable();
        pairs.dedup();
        match pairs.as_slice() {
            &[a, b] => Some(QuintetSplits::new(a, b)),
            _ => None,
        }
    }

    /// Rooted restriction: the three non-trivial clade masks of the induced
    /// rooted quintet tree, or `None` if it is not fully resolved.
    pub fn quintet_rooted(&self, quintet: &Quintet) -> Option<QuintetClades> {
        if !self.rooted || !self.covers(quintet) {
            return None;
        }
        let mut clades: Vec<u8> = self
            .clades
            .iter()
            .map(|clade| clade.quintet_mask(quintet))
            .filter(|mask| (2..=4).contains(&mask.count_ones()))
            .collect();
        clades.sort_unstable();
        clades.dedup();
        match clades.as_slice() {
            &[a, b, c] => Some(QuintetClades::new([a, b, c])),
            _ => None,
        }
    }

    /// Splits canonicalised to the side that does not contain taxon 0.
    pub fn splits(&self) -> HashSet<Bitset> {
        self.clades
            .iter()
            .map(|clade| {
                if clade.contains(0) {
                    clade.complement(self.num_taxa)
                } else {
                    clade.clone()
                }
            })
            .filter(|split| {
                let size = split.count_ones();
                size > 1 && size + 1 < self.num_taxa
            })
            .collect()
    }

    /// Number of splits found in exactly one of the two trees.
    pub fn split_distance(&self, other: &TreeSnapshot) -> usize {
        self.splits().symmetric_difference(&other.splits()).count()
    }

    /// Sorted clade list. Two rooted trees on the same taxa are the same
    /// rooted topology exactly when their keys are equal.
    pub fn clade_key(&self) -> Vec<Bitset> {
        let mut key = self.clades.clone();
        key.sort_unstable();
        key.dedup();
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxa::TaxonSet;
    use crate::tree::UnknownTaxa;

    fn snapshot(newick: &str, taxa: &TaxonSet) -> TreeSnapshot {
        let tree = Tree::from_newick(newick, taxa, UnknownTaxa::Ignore).unwrap();
        TreeSnapshot::from_tree(&tree, taxa.len())
    }

    fn taxa(names: &str) -> TaxonSet {
        TaxonSet::from_names(names.chars().map(String::from)).unwrap()
    }

    /// ```text
    ///              root
    ///             /    \
    ///         node1     E
    ///         /   \
    ///     node2    D
    ///     /   \
    ///    A    node3
    ///         /   \
    ///        B     C
    /// ```
    /// Clades: {B,C}, {A,B,C}, {A,B,C,D}. The leaf E is trivial.
    #[test]
    fn test_clades_of_caterpillar() {
        let t = taxa("ABCDE");
        let snap = snapshot("(((A,(B,C)),D),E);", &t);
        assert!(snap.rooted);
        let key: Vec<u64> = snap.clade_key().iter().map(|c| c.0[0]).collect();
        assert_eq!(key, vec![0b00110, 0b00111, 0b01111]);
        assert_eq!(snap.leaves.0[0], 0b11111);
    }

    #[test]
    fn test_rooted_restriction_suppresses_unifurcations() {
        let t = taxa("ABCDEF");
        // induced on A,B,C,D,F the node above E and F keeps only F
        let snap = snapshot("(((A,B),C),(D,(E,F)));", &t);
        let q = [0, 1, 2, 3, 5];
        let clades = snap.quintet_rooted(&q).unwrap();
        assert_eq!(clades.masks(), [0b00011, 0b00111, 0b11000]);

        let splits = snap.quintet_unrooted(&q).unwrap();
        assert_eq!(splits.pairs(), [0b00011, 0b11000]);
    }

    #[test]
    fn test_unrooted_restriction_ignores_root_position() {
        let t = taxa("ABCDE");
        let a = snapshot("(((A,B),C),(D,E));", &t);
        let b = snapshot("((A,B),(C,(D,E)));", &t);
        let c = snapshot("((A,B),C,(D,E));", &t);
        let q = [0, 1, 2, 3, 4];
        let expected = a.quintet_unrooted(&q).unwrap();
        assert_eq!(b.quintet_unrooted(&q), Some(expected));
        assert_eq!(c.quintet_unrooted(&q), Some(expected));
        assert_ne!(a.quintet_rooted(&q), b.quintet_rooted(&q));
        assert_eq!(c.quintet_rooted(&q), None);
    }

    #[test]
    fn test_missing_taxon_or_polytomy_is_unresolved() {
        let t = taxa("ABCDEF");
        let missing = snapshot("((A,B),C,(D,X));", &t);
        assert_eq!(missing.quintet_unrooted(&[0, 1, 2, 3, 4]), None);

        let star = snapshot("((A,B,C),D,(E,F));", &t);
        // on A,B,C,D,E only {A,B,C} vs {D,E} survives
        assert_eq!(star.quintet_unrooted(&[0, 1, 2, 3, 4]), None);
        // on A,B,D,E,F the polytomy does not matter
        assert!(star.quintet_unrooted(&[0, 1, 3, 4, 5]).is_some());
    }

    #[test]
    fn test_canonical_splits() {
        let t = taxa("ABCDEF");
        let rooted = snapshot("(((A,B),C),(D,(E,F)));", &t);
        let unrooted = snapshot("((A,B),C,(D,(E,F)));", &t);
        let other = snapshot("((A,C),B,(D,(E,F)));", &t);
        assert_eq!(rooted.splits().len(), 3);
        assert_eq!(rooted.split_distance(&unrooted), 0);
        assert_eq!(rooted.split_distance(&other), 2);
        assert!(rooted.splits().iter().all(|s| !s.contains(0)));
    }
}
