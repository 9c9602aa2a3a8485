//! Catalog of quintet topologies over five generic leaf positions.
//!
//! # Overview
//! Positions `0..5` stand for the five taxa of a sampled quintet, in the order
//! they appear in the quintet. A clade over positions is a 5-bit mask.
//!
//! - 15 unrooted topologies, each identified by its two cherries
//!   (`{xy, zw}` with the fifth position in the middle).
//! - 105 rooted topologies in three shapes:
//!
//! ```text
//!   caterpillar        pseudo-caterpillar     balanced
//!   ((((p,q),r),s),t)  (((p,q),(r,s)),t)      (((p,q),r),(s,t))
//!       60                   15                    30
//! ```
//!
//! Every unrooted topology has seven edges and so seven rootings: the five
//! pendant edges (positions 0..5) and the two internal edges (the one next to
//! the smaller cherry mask first). [`TopologyIndex::u2r`] lists them in that
//! order, and each rooted topology appears under exactly one unrooted one.
//!
//! # Partial orders
//! Under the multispecies coalescent, the frequencies of the 15 unrooted gene
//! tree topologies produced by a rooted species quintet fall into classes of
//! equal expected frequency, and some classes are never less frequent than
//! others. For a caterpillar with labels `((((a,b),c),d),e)`:
//!
//! ```text
//!   C1 ab|de ──► C2 ab|cd ══► C3 ab|ce
//!    │            │             │
//!    ▼            ▼             ▼
//!   C4 {ac,bc}|de C5 ac|bd,bc|ad ══► C6 ac|be,bc|ae ──► C7 (rest)
//!    └──────────────────────────────►┘
//! ```
//! `──►` is "at least as frequent", `══►` is strictly more frequent for any
//! caterpillar with positive internal branches. The balanced and
//! pseudo-caterpillar shapes have their own (coarser) orders. These relations
//! are what [`ComparisonIndices`] encodes.

use std::collections::HashMap;

use itertools::Itertools;

use crate::error::{QuintetError, Result};

/// All five positions.
pub const FULL_MASK: u8 = 0b11111;

pub const N_UNROOTED: usize = 15;
pub const N_ROOTED: usize = 105;
/// Edges of an unrooted binary tree on five leaves.
pub const N_ROOTINGS: usize = 7;

/// The ways to split four items into two pairs, as indices into the four.
const PAIRINGS: [[usize; 4]; 3] = [[0, 1, 2, 3], [0, 2, 1, 3], [0, 3, 1, 2]];

/// Class orderings as `(greater, lesser)`, 0-based class indices.
const CATERPILLAR_ORDER: [(usize, usize); 8] =
    [(0, 1), (0, 3), (1, 2), (1, 4), (2, 5), (4, 5), (3, 5), (5, 6)];
const CATERPILLAR_STRICT: [(usize, usize); 2] = [(1, 2), (4, 5)];
const PSEUDO_ORDER: [(usize, usize); 6] = [(0, 1), (0, 2), (0, 3), (1, 4), (2, 4), (3, 4)];
const BALANCED_ORDER: [(usize, usize); 5] = [(0, 1), (0, 2), (1, 3), (2, 3), (3, 4)];

#[inline]
fn bit(p: u8) -> u8 {
    1 << p
}

#[inline]
fn pair(x: u8, y: u8) -> u8 {
    bit(x) | bit(y)
}

/// Positions not in `excluded`, ascending.
fn rest(excluded: &[u8]) -> Vec<u8> {
    (0..5u8).filter(|p| !excluded.contains(p)).collect()
}

/// An unrooted quintet topology: its two cherries, smaller mask first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuintetSplits([u8; 2]);

impl QuintetSplits {
    pub fn new(a: u8, b: u8) -> Self {
        QuintetSplits([a.min(b), a.max(b)])
    }

    pub fn pairs(&self) -> [u8; 2] {
        self.0
    }

    /// The position shared by neither cherry.
    #[cfg(test)]
    fn middle(&self) -> u8 {
        (FULL_MASK ^ self.0[0] ^ self.0[1]).trailing_zeros() as u8
    }
}

/// A rooted quintet topology: its three non-trivial clades, sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuintetClades([u8; 3]);

impl QuintetClades {
    pub fn new(mut masks: [u8; 3]) -> Self {
        masks.sort_unstable();
        QuintetClades(masks)
    }

    pub fn masks(&self) -> [u8; 3] {
        self.0
    }

    /// The unrooted topology left once the root is removed, if the clades
    /// describe a binary rooted quintet.
    pub fn unrooted(&self) -> Option<QuintetSplits> {
        let pairs: Vec<u8> = self
            .0
            .iter()
            .filter_map(|&m| match m.count_ones() {
                2 => Some(m),
                3 => Some(FULL_MASK ^ m),
                _ => None,
            })
            .sorted_unstable()
            .dedup()
            .collect();
        match pairs.as_slice() {
            &[a, b] if a & b == 0 => Some(QuintetSplits::new(a, b)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Caterpillar,
    PseudoCaterpillar,
    Balanced,
}

/// Frequency relations implied by one rooted topology, over unrooted indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonIndices {
    /// Equivalence classes, most frequent first.
    pub classes: Vec<Vec<usize>>,
    /// Pairs expected to have equal frequency.
    pub equalities: Vec<(usize, usize)>,
    /// `(i, j)`: topology `i` is expected at least as frequent as `j`.
    pub inequalities: Vec<(usize, usize)>,
    /// Subset of the inequalities that hold strictly.
    pub strict: Vec<(usize, usize)>,
}

#[derive(Debug, Clone)]
pub struct RootedTemplate {
    pub clades: QuintetClades,
    pub shape: Shape,
    /// Unrooted image.
    pub unrooted: usize,
    /// Edge of the unrooted image the root sits on, `0..7`.
    pub position: usize,
    pub comparisons: ComparisonIndices,
}

/// Read-only topology tables, built once and shared by reference.
#[derive(Debug, Clone)]
pub struct TopologyIndex {
    unrooted: Vec<QuintetSplits>,
    unrooted_lookup: HashMap<QuintetSplits, usize>,
    rooted: Vec<RootedTemplate>,
    rooted_lookup: HashMap<QuintetClades, usize>,
    u2r: Vec<[usize; N_ROOTINGS]>,
}

impl Default for TopologyIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl TopologyIndex {
    pub fn new() -> Self {
        // unrooted index = 3 * middle + pairing
        let unrooted: Vec<QuintetSplits> = (0..5u8)
            .flat_map(|middle| {
                let r = rest(&[middle]);
                PAIRINGS
                    .iter()
                    .map(move |k| QuintetSplits::new(pair(r[k[0]], r[k[1]]), pair(r[k[2]], r[k[3]])))
            })
            .collect();
        let unrooted_lookup = unrooted.iter().enumerate().map(|(u, &s)| (s, u)).collect();

        let mut index = TopologyIndex {
            unrooted,
            unrooted_lookup,
            rooted: Vec::with_capacity(N_ROOTED),
            rooted_lookup: HashMap::with_capacity(N_ROOTED),
            u2r: vec![[usize::MAX; N_ROOTINGS]; N_UNROOTED],
        };

        for (shape, labels) in Self::rooted_labels() {
            let template = index.build_rooted(shape, labels);
            let r = index.rooted.len();
            debug_assert_eq!(index.u2r[template.unrooted][template.position], usize::MAX);
            index.u2r[template.unrooted][template.position] = r;
            index.rooted_lookup.insert(template.clades, r);
            index.rooted.push(template);
        }
        index
    }

    /// Labels `[a, b, c, d, e]` of every rooted template, in index order.
    ///
    /// ```text
    /// caterpillar   ((((a,b),c),d),e)
    /// pseudo        (((a,b),(d,e)),c)
    /// balanced      (((a,b),c),(d,e))
    /// ```
    fn rooted_labels() -> Vec<(Shape, [u8; 5])> {
        let mut out = Vec::with_capacity(N_ROOTED);
        for t in 0..5u8 {
            for s in rest(&[t]) {
                for r in rest(&[t, s]) {
                    let pq = rest(&[t, s, r]);
                    out.push((Shape::Caterpillar, [pq[0], pq[1], r, s, t]));
                }
            }
        }
        for t in 0..5u8 {
            let others = rest(&[t]);
            for k in PAIRINGS {
                let [p, q, r, s] = k.map(|i| others[i]);
                out.push((Shape::PseudoCaterpillar, [p, q, t, r, s]));
            }
        }
        for (s, t) in (0..5u8).tuple_combinations() {
            for r in rest(&[s, t]) {
                let pq = rest(&[s, t, r]);
                out.push((Shape::Balanced, [pq[0], pq[1], r, s, t]));
            }
        }
        out
    }

    fn build_rooted(&self, shape: Shape, labels: [u8; 5]) -> RootedTemplate {
        let [a, b, c, d, e] = labels;
        let masks = match shape {
            Shape::Caterpillar => [pair(a, b), pair(a, b) | bit(c), FULL_MASK ^ bit(e)],
            Shape::PseudoCaterpillar => [pair(a, b), pair(d, e), FULL_MASK ^ bit(c)],
            Shape::Balanced => [pair(a, b), pair(a, b) | bit(c), pair(d, e)],
        };
        let clades = QuintetClades::new(masks);
        // all three shapes keep {a,b} and {d,e} as cherries once unrooted
        let splits = QuintetSplits::new(pair(a, b), pair(d, e));
        let unrooted = self.unrooted_lookup[&splits];

        let position = match shape {
            // the root hangs off the pendant edge of the leaf outside the 4-clade
            Shape::Caterpillar => e as usize,
            Shape::PseudoCaterpillar => c as usize,
            Shape::Balanced if pair(d, e) == splits.pairs()[0] => 5,
            Shape::Balanced => 6,
        };

        RootedTemplate {
            clades,
            shape,
            unrooted,
            position,
            comparisons: self.comparisons_for(shape, labels),
        }
    }

    fn topology(&self, x: u8, y: u8, z: u8, w: u8) -> usize {
        self.unrooted_lookup[&QuintetSplits::new(pair(x, y), pair(z, w))]
    }

    fn comparisons_for(&self, shape: Shape, labels: [u8; 5]) -> ComparisonIndices {
        let [a, b, c, d, e] = labels;
        let t = |x, y, z, w| self.topology(x, y, z, w);
        let (mut classes, order, strict): (Vec<Vec<usize>>, &[(usize, usize)], &[(usize, usize)]) =
            match shape {
                Shape::Caterpillar => (
                    vec![
                        vec![t(a, b, d, e)],
                        vec![t(a, b, c, d)],
                        vec![t(a, b, c, e)],
                        vec![t(a, c, d, e), t(b, c, d, e)],
                        vec![t(a, c, b, d), t(b, c, a, d)],
                        vec![t(a, c, b, e), t(b, c, a, e)],
                    ],
                    &CATERPILLAR_ORDER[..],
                    &CATERPILLAR_STRICT[..],
                ),
                Shape::PseudoCaterpillar => (
                    vec![
                        vec![t(a, b, d, e)],
                        vec![t(a, b, c, e), t(a, b, c, d)],
                        vec![t(a, c, d, e), t(b, c, d, e)],
                        vec![t(a, d, b, e), t(a, e, b, d)],
                    ],
                    &PSEUDO_ORDER[..],
                    &[],
                ),
                Shape::Balanced => (
                    vec![
                        vec![t(a, b, d, e)],
                        vec![t(a, c, d, e), t(b, c, d, e)],
                        vec![t(a, b, c, e), t(a, b, c, d)],
                        vec![t(a, c, b, e), t(a, c, b, d), t(b, c, a, e), t(b, c, a, d)],
                    ],
                    &BALANCED_ORDER[..],
                    &[],
                ),
            };
        let last: Vec<usize> = (0..N_UNROOTED)
            .filter(|u| !classes.iter().flatten().contains(u))
            .collect();
        classes.push(last);

        let expand = |relations: &[(usize, usize)]| -> Vec<(usize, usize)> {
            relations
                .iter()
                .flat_map(|&(g, l)| {
                    classes[g]
                        .iter()
                        .cartesian_product(&classes[l])
                        .map(|(&i, &j)| (i, j))
                })
                .collect()
        };
        let equalities = classes
            .iter()
            .flat_map(|class| class[1..].iter().map(|&j| (class[0], j)))
            .collect();
        let inequalities = expand(order);
        let strict = expand(strict);

        ComparisonIndices {
            classes,
            equalities,
            inequalities,
            strict,
        }
    }

    pub fn unrooted(&self, u: usize) -> QuintetSplits {
        self.unrooted[u]
    }

    pub fn rooted(&self, r: usize) -> &RootedTemplate {
        &self.rooted[r]
    }

    /// The seven rooted indices of unrooted topology `u`, by edge position.
    pub fn u2r(&self, u: usize) -> &[usize; N_ROOTINGS] {
        &self.u2r[u]
    }

    pub fn shape(&self, r: usize) -> Shape {
        self.rooted[r].shape
    }

    pub fn comparisons(&self, r: usize) -> &ComparisonIndices {
        &self.rooted[r].comparisons
    }

    /// Index of the unrooted template with the given cherries.
    ///
    /// # Example
    /// ```
    /// # use quintet_rooting::topology::{QuintetSplits, TopologyIndex};
    /// let index = TopologyIndex::new();
    /// // {01, 34} with position 2 in the middle
    /// let u = index.resolve_unrooted(&QuintetSplits::new(0b00011, 0b11000)).unwrap();
    /// assert_eq!(u, 6);
    /// assert_eq!(index.unrooted(u).pairs(), [0b00011, 0b11000]);
    /// ```
    pub fn resolve_unrooted(&self, splits: &QuintetSplits) -> Result<usize> {
        self.unrooted_lookup
            .get(splits)
            .copied()
            .ok_or_else(|| QuintetError::Resolution(format!("unrooted {splits:?}")))
    }

    /// Edge position (`0..7`) of a rooted quintet among the rootings of
    /// unrooted topology `u`.
    pub fn resolve_rooted(&self, u: usize, clades: &QuintetClades) -> Result<usize> {
        match self.rooted_lookup.get(clades).map(|&r| &self.rooted[r]) {
            Some(template) if template.unrooted == u => Ok(template.position),
            Some(template) => Err(QuintetError::Resolution(format!(
                "rooted {clades:?} belongs to unrooted topology {}, not {u}",
                template.unrooted
            ))),
            None => Err(QuintetError::Resolution(format!("rooted {clades:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_sizes() {
        let index = TopologyIndex::new();
        let unrooted: HashSet<_> = (0..N_UNROOTED).map(|u| index.unrooted(u)).collect();
        assert_eq!(unrooted.len(), N_UNROOTED);
        for u in 0..N_UNROOTED {
            let [x, y] = index.unrooted(u).pairs();
            assert_eq!(x & y, 0);
            assert_eq!(index.unrooted(u).middle() as usize, u / 3);
        }

        let shapes = (0..N_ROOTED).map(|r| index.shape(r)).counts();
        assert_eq!(shapes[&Shape::Caterpillar], 60);
        assert_eq!(shapes[&Shape::PseudoCaterpillar], 15);
        assert_eq!(shapes[&Shape::Balanced], 30);
    }

    #[test]
    fn test_u2r_is_a_bijection() {
        let index = TopologyIndex::new();
        let all: Vec<usize> = (0..N_UNROOTED)
            .flat_map(|u| *index.u2r(u))
            .sorted()
            .collect();
        assert_eq!(all, (0..N_ROOTED).collect::<Vec<_>>());

        for u in 0..N_UNROOTED {
            for (pos, &r) in index.u2r(u).iter().enumerate() {
                let template = index.rooted(r);
                assert_eq!(template.unrooted, u);
                assert_eq!(template.position, pos);
                assert_eq!(template.clades.unrooted(), Some(index.unrooted(u)));
                assert_eq!(index.resolve_rooted(u, &template.clades).unwrap(), pos);
            }
        }
    }

    /// ```text
    ///  pos 0..5: pendant edges        pos 5/6: internal edges
    ///  caterpillar or pseudo          balanced
    /// ```
    #[test]
    fn test_rooting_positions_by_shape() {
        let index = TopologyIndex::new();
        for u in 0..N_UNROOTED {
            let middle = index.unrooted(u).middle() as usize;
            for (pos, &r) in index.u2r(u).iter().enumerate() {
                let expected = match pos {
                    5 | 6 => Shape::Balanced,
                    p if p == middle => Shape::PseudoCaterpillar,
                    _ => Shape::Caterpillar,
                };
                assert_eq!(index.shape(r), expected, "u={u} pos={pos}");
            }
        }
    }

    #[test]
    fn test_classes_partition_the_unrooted_topologies() {
        let index = TopologyIndex::new();
        for r in 0..N_ROOTED {
            let cmp = index.comparisons(r);
            let members: Vec<usize> = cmp.classes.iter().flatten().copied().sorted().collect();
            assert_eq!(members, (0..N_UNROOTED).collect::<Vec<_>>());
            // the species topology is the unique most frequent one
            assert_eq!(cmp.classes[0], vec![index.rooted(r).unrooted]);
            assert_eq!(cmp.equalities.len(), N_UNROOTED - cmp.classes.len());
            assert!(cmp.strict.iter().all(|s| cmp.inequalities.contains(s)));
        }
    }

    #[test]
    fn test_caterpillar_relations() {
        let index = TopologyIndex::new();
        // ((((0,1),2),3),4)
        let clades = QuintetClades::new([0b00011, 0b00111, 0b01111]);
        let u = index.resolve_unrooted(&clades.unrooted().unwrap()).unwrap();
        let r = index.u2r(u)[index.resolve_rooted(u, &clades).unwrap()];
        assert_eq!(index.shape(r), Shape::Caterpillar);

        let cmp = index.comparisons(r);
        let sizes: Vec<usize> = cmp.classes.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![1, 1, 1, 2, 2, 2, 6]);
        // 1+2+1+2+2+4+4+12 member pairs over the eight class relations
        assert_eq!(cmp.inequalities.len(), 28);
        // ab|cd over ab|ce, and {ac|bd, bc|ad} over {ac|be, bc|ae}
        assert_eq!(cmp.strict.len(), 1 + 4);
    }

    #[test]
    fn test_resolution_failures() {
        let index = TopologyIndex::new();
        assert!(matches!(
            index.resolve_unrooted(&QuintetSplits::new(0b00011, 0b00110)),
            Err(QuintetError::Resolution(_))
        ));
        let clades = QuintetClades::new([0b00011, 0b00111, 0b01111]);
        let u = index.resolve_unrooted(&clades.unrooted().unwrap()).unwrap();
        let other = (u + 1) % N_UNROOTED;
        assert!(index.resolve_rooted(other, &clades).is_err());
        assert_eq!(QuintetClades::new([0b00011, 0b00110, 0b01111]).unrooted(), None);
    }
}
