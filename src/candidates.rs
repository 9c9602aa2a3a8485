//! Every distinct rooting of the unrooted species tree.

use std::collections::HashSet;

use log::debug;

use crate::snapshot::TreeSnapshot;
use crate::tree::Tree;

/// One rooted species tree, together with the snapshot used to restrict it to
/// quintets.
#[derive(Debug, Clone)]
pub struct RootedCandidate {
    pub tree: Tree,
    pub snapshot: TreeSnapshot,
}

impl RootedCandidate {
    pub fn new(tree: Tree, num_taxa: usize) -> Self {
        let snapshot = TreeSnapshot::from_tree(&tree, num_taxa);
        RootedCandidate { tree, snapshot }
    }
}

/// Reroots `species` on each of its edges and drops repeated topologies.
///
/// An unrooted binary tree on `n` taxa yields `2n - 3` candidates. Edges that
/// cannot be rerooted are skipped.
pub fn rooted_candidates(species: &Tree, num_taxa: usize) -> Vec<RootedCandidate> {
    let candidates = species
        .edges()
        .into_iter()
        .filter_map(|(parent, child)| match species.reroot_at_edge(parent, child) {
            Ok(tree) => Some(RootedCandidate::new(tree, num_taxa)),
            Err(e) => {
                debug!("skipping edge ({parent}, {child}): {e}");
                None
            }
        })
        .collect();
    deduplicate(candidates)
}

/// Keeps the first candidate of every rooted topology, preserving order.
pub fn deduplicate(candidates: Vec<RootedCandidate>) -> Vec<RootedCandidate> {
    let before = candidates.len();
    let mut seen = HashSet::with_capacity(before);
    let kept: Vec<RootedCandidate> = candidates
        .into_iter()
        .filter(|c| seen.insert(c.snapshot.clade_key()))
        .collect();
    if kept.len() < before {
        debug!("removed {} duplicate rootings", before - kept.len());
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxa::TaxonSet;
    use crate::tree::UnknownTaxa;
    use itertools::Itertools;
    use phylotree::tree::Tree as PhyloTree;

    fn species(newick: &str) -> (TaxonSet, Tree) {
        let phylo = PhyloTree::from_newick(newick).unwrap();
        Tree::species_from_phylo(&phylo).unwrap()
    }

    fn caterpillar(n: usize) -> String {
        let mut newick = "T00".to_string();
        for i in 1..n {
            newick = format!("({newick},T{i:02})");
        }
        newick + ";"
    }

    fn balanced(names: &[String]) -> String {
        match names {
            [one] => one.clone(),
            _ => {
                let (left, right) = names.split_at(names.len() / 2);
                format!("({},{})", balanced(left), balanced(right))
            }
        }
    }

    #[test]
    fn test_every_edge_gives_a_distinct_rooting() {
        let mut newicks: Vec<String> = (5..=12).map(caterpillar).collect();
        for n in 5..=12 {
            let names = (0..n).map(|i| format!("T{i:02}")).collect_vec();
            newicks.push(balanced(&names) + ";");
        }
        newicks.push("((A,B),(C,D),((E,F),(G,(H,I))));".to_string());

        for newick in &newicks {
            let (taxa, tree) = species(newick);
            let n = taxa.len();
            let candidates = rooted_candidates(&tree, n);
            assert!(candidates.len() >= 2 * n - 5 && candidates.len() <= 2 * n - 3);
            assert_eq!(candidates.len(), 2 * n - 3, "{newick}");

            let reference = TreeSnapshot::from_tree(&tree, n);
            for c in &candidates {
                assert!(c.tree.is_rooted() && c.tree.is_binary());
                assert_eq!(c.snapshot.split_distance(&reference), 0);
            }
            for (a, b) in candidates.iter().tuple_combinations() {
                assert_ne!(a.snapshot.clade_key(), b.snapshot.clade_key());
            }
        }
    }

    /// A rooted input has two edges below its root that give the same
    /// rooting; only one survives.
    #[test]
    fn test_rooted_input_collapses_root_edges() {
        let taxa = TaxonSet::from_names(["A", "B", "C", "D", "E"]).unwrap();
        let tree = Tree::from_newick("(((A,B),C),(D,E));", &taxa, UnknownTaxa::Reject).unwrap();
        assert_eq!(tree.edges().len(), 8);
        assert_eq!(rooted_candidates(&tree, taxa.len()).len(), 7);
    }

    #[test]
    fn test_deduplicate_removes_every_repeat() {
        let taxa = TaxonSet::from_names(["A", "B", "C", "D", "E"]).unwrap();
        let make = |nw: &str| {
            RootedCandidate::new(
                Tree::from_newick(nw, &taxa, UnknownTaxa::Reject).unwrap(),
                taxa.len(),
            )
        };
        let candidates = vec![
            make("(((A,B),C),(D,E));"),
            make("((D,E),(C,(B,A)));"),
            make("(A,(B,(C,(D,E))));"),
            make("(((B,A),C),(E,D));"),
            make("((((D,E),C),B),A);"),
        ];
        let kept = deduplicate(candidates);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].tree.to_newick(&taxa), "(((A,B),C),(D,E));");
        assert_eq!(kept[1].tree.to_newick(&taxa), "(A,(B,(C,(D,E))));");
    }
}
