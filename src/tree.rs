//! Arena tree over taxon ids.
//!
//! Newick parsing is done by `phylotree`; the parsed tree is copied into this
//! arena so that leaves carry [`TaxonId`]s and so the tree can be rerooted
//! without touching the parser's representation.
//!
//! An unrooted tree is stored hanging from an internal node of degree 3 (the
//! same "virtual root" convention `phylotree` uses); a rooted tree hangs from a
//! node of degree 2.

use std::collections::HashSet;
use std::fmt::Write;

use log::debug;
use phylotree::tree::Tree as PhyloTree;

use crate::error::{QuintetError, Result};
use crate::taxa::{TaxonId, TaxonSet};

pub type NodeId = usize;

#[derive(Debug, Clone, Default)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Only leaves carry a taxon; `None` on a leaf means the label was ignored.
    pub taxon: Option<TaxonId>,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// What to do with a leaf whose label is not in the [`TaxonSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownTaxa {
    Reject,
    Ignore,
}

#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Tree {
    /// Copies a parsed `phylotree` tree, resolving leaf labels through `taxa`.
    ///
    /// # Errors
    /// - `UnnamedLeaf` / `UnknownTaxon` when a leaf cannot be resolved and
    ///   `unknown` is [`UnknownTaxa::Reject`]
    /// - `DuplicateTaxon` when two leaves share a label
    pub fn from_phylo(tree: &PhyloTree, taxa: &TaxonSet, unknown: UnknownTaxa) -> Result<Self> {
        let phylo_root = tree.get_root()?;
        let mut out = Tree {
            nodes: Vec::new(),
            root: 0,
        };
        let mut seen = HashSet::new();
        out.root = out.copy_phylo(tree, phylo_root, None, taxa, unknown, &mut seen)?;
        Ok(out)
    }

    /// Parses a newick string against an existing namespace.
    pub fn from_newick(newick: &str, taxa: &TaxonSet, unknown: UnknownTaxa) -> Result<Self> {
        let phylo = PhyloTree::from_newick(newick)
            .map_err(|e| QuintetError::Newick(format!("{e} in `{newick}`")))?;
        Self::from_phylo(&phylo, taxa, unknown)
    }

    /// Builds the namespace from the leaves of a species tree and copies it,
    /// suppressing a degree-2 root so the result is unrooted.
    pub fn species_from_phylo(tree: &PhyloTree) -> Result<(TaxonSet, Self)> {
        let names = tree
            .get_leaves()
            .iter()
            .map(|id| {
                tree.get(id)?
                    .name
                    .clone()
                    .filter(|n| !n.is_empty())
                    .ok_or(QuintetError::UnnamedLeaf)
            })
            .collect::<Result<Vec<_>>>()?;
        let taxa = TaxonSet::from_names(names)?;
        let tree = Self::from_phylo(tree, &taxa, UnknownTaxa::Reject)?.unrooted();
        Ok((taxa, tree))
    }

    fn copy_phylo(
        &mut self,
        tree: &PhyloTree,
        id: usize,
        parent: Option<NodeId>,
        taxa: &TaxonSet,
        unknown: UnknownTaxa,
        seen: &mut HashSet<TaxonId>,
    ) -> Result<NodeId> {
        let node = tree.get(&id)?;
        let me = self.push(Node {
            parent,
            ..Node::default()
        });

        if node.children.is_empty() {
            let name = node.name.as_deref().filter(|n| !n.is_empty());
            match (name, name.and_then(|n| taxa.id(n))) {
                (Some(name), Some(taxon)) => {
                    if !seen.insert(taxon) {
                        return Err(QuintetError::DuplicateTaxon(name.to_string()));
                    }
                    self.nodes[me].taxon = Some(taxon);
                }
                (name, None) if unknown == UnknownTaxa::Ignore => {
                    debug!("ignoring leaf {:?} absent from the species tree", name);
                }
                (Some(name), None) => return Err(QuintetError::UnknownTaxon(name.to_string())),
                (None, _) => return Err(QuintetError::UnnamedLeaf),
            }
        } else {
            for &child in &node.children {
                let c = self.copy_phylo(tree, child, Some(me), taxa, unknown, seen)?;
                self.nodes[me].children.push(c);
            }
        }
        Ok(me)
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// A tree is rooted when its top node has exactly two children.
    pub fn is_rooted(&self) -> bool {
        self.nodes[self.root].children.len() == 2
    }

    /// Fully resolved: every internal node below the top has two children and
    /// the top has two (rooted) or three (unrooted).
    pub fn is_binary(&self) -> bool {
        let top = self.nodes[self.root].children.len();
        (top == 2 || top == 3)
            && self
                .nodes
                .iter()
                .enumerate()
                .filter(|&(id, n)| id != self.root && !n.is_leaf())
                .all(|(_, n)| n.children.len() == 2)
    }

    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).filter(|&id| self.nodes[id].is_leaf())
    }

    /// Taxa in depth-first (preorder) leaf order, children visited in storage
    /// order.
    pub fn leaf_order(&self) -> Vec<TaxonId> {
        let mut order = Vec::with_capacity(self.nodes.len() / 2 + 1);
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if let Some(t) = node.taxon {
                order.push(t);
            }
            stack.extend(node.children.iter().rev());
        }
        order
    }

    /// All `(parent, child)` pairs.
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        (0..self.nodes.len())
            .filter_map(|id| self.nodes[id].parent.map(|p| (p, id)))
            .collect()
    }

    fn neighbours(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let node = &self.nodes[id];
        node.children.iter().copied().chain(node.parent)
    }

    /// Copies the component that contains `id` once the link to `from` is cut,
    /// oriented away from `from`. Unlabelled nodes left with a single child are
    /// spliced out.
    fn orient(&self, id: NodeId, from: Option<NodeId>, out: &mut Tree) -> NodeId {
        let next: Vec<NodeId> = self.neighbours(id).filter(|&m| Some(m) != from).collect();
        if let [only] = next.as_slice() {
            if self.nodes[id].taxon.is_none() {
                return self.orient(*only, Some(id), out);
            }
        }

        let me = out.push(Node {
            parent: None,
            children: Vec::with_capacity(next.len()),
            taxon: self.nodes[id].taxon,
        });
        for m in next {
            let child = self.orient(m, Some(id), out);
            out.attach(me, child);
        }
        me
    }

    /// Drops the root when it has degree 2, hanging the tree from one of its
    /// internal children instead.
    pub fn unrooted(self) -> Tree {
        if !self.is_rooted() {
            return self;
        }
        let top = self.nodes[self.root]
            .children
            .iter()
            .copied()
            .find(|&c| !self.nodes[c].is_leaf());
        match top {
            Some(top) => {
                let mut out = Tree {
                    nodes: Vec::with_capacity(self.nodes.len()),
                    root: 0,
                };
                out.root = self.orient(top, None, &mut out);
                out
            }
            // two leaves, nothing to unroot
            None => self,
        }
    }

    /// The rooted tree obtained by placing a root on edge `(parent, child)`.
    ///
    /// # Errors
    /// `InvalidEdge` if `child` does not hang directly from `parent`.
    ///
    /// # Example
    /// ```
    /// # use quintet_rooting::{taxa::TaxonSet, tree::{Tree, UnknownTaxa}};
    /// let taxa = TaxonSet::from_names(["A", "B", "C", "D"]).unwrap();
    /// let tree = Tree::from_newick("((A,B),C,D);", &taxa, UnknownTaxa::Reject).unwrap();
    /// let d = tree.leaves().find(|&l| tree.node(l).taxon == Some(3)).unwrap();
    /// let rooted = tree.reroot_at_edge(tree.root(), d).unwrap();
    /// assert!(rooted.is_rooted());
    /// assert_eq!(rooted.to_newick(&taxa), "(D,((A,B),C));");
    /// ```
    pub fn reroot_at_edge(&self, parent: NodeId, child: NodeId) -> Result<Tree> {
        if self.nodes.get(child).and_then(|n| n.parent) != Some(parent) {
            return Err(QuintetError::InvalidEdge(parent, child));
        }
        let mut out = Tree {
            nodes: Vec::with_capacity(self.nodes.len() + 1),
            root: 0,
        };
        out.push(Node::default());
        let below = self.orient(child, Some(parent), &mut out);
        let above = self.orient(parent, Some(child), &mut out);
        out.attach(0, below);
        out.attach(0, above);
        Ok(out)
    }

    pub fn to_newick(&self, taxa: &TaxonSet) -> String {
        let mut out = String::new();
        self.write_newick(self.root, taxa, &mut out);
        out.push(';');
        out
    }

    fn write_newick(&self, id: NodeId, taxa: &TaxonSet, out: &mut String) {
        let node = &self.nodes[id];
        if node.is_leaf() {
            if let Some(t) = node.taxon {
                let _ = write!(out, "{}", taxa.name(t));
            }
            return;
        }
        out.push('(');
        for (k, &c) in node.children.iter().enumerate() {
            if k > 0 {
                out.push(',');
            }
            self.write_newick(c, taxa, out);
        }
        out.push(')');
    }
}
