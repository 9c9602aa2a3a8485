//! Compact taxon sets for clades and splits.
//!
//! # Overview
//! Every taxon of the species tree owns one bit position (its `TaxonId`).
//! A clade (the taxa below a node) is the set of bits of its leaves.
//!
//! # Example
//! For taxa [A, B, C, D] with ids [0, 1, 2, 3]:
//! - Clade {A, C} → `0b0101`
//! - Clade {B, C, D} → `0b1110`
//!
//! Restricting a clade to a quintet only needs five membership tests, which is
//! what [`Bitset::quintet_mask`] does.

use crate::taxa::TaxonId;

/// A set of taxa, one bit per `TaxonId`.
///
/// Stored in `u64` words so trees of any size fit; taxon `i` lives in word
/// `i / 64`, bit `i % 64`.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Bitset(pub Vec<u64>);

impl Bitset {
    /// Number of words needed for `taxa` bit positions.
    pub fn words_for(taxa: usize) -> usize {
        taxa.div_ceil(64).max(1)
    }

    /// Creates an empty set spanning `words` words.
    ///
    /// # Example
    /// ```
    /// # use quintet_rooting::bitset::Bitset;
    /// let bs = Bitset::zeros(2);
    /// assert_eq!(bs.count_ones(), 0);
    /// ```
    pub fn zeros(words: usize) -> Self {
        Bitset(vec![0u64; words])
    }

    /// Adds taxon `idx` to the set.
    #[inline]
    pub fn set(&mut self, idx: TaxonId) {
        self.0[idx >> 6] |= 1u64 << (idx & 63);
    }

    /// Whether taxon `idx` belongs to the set. Ids beyond the last word are
    /// never members.
    ///
    /// # Example
    /// ```
    /// # use quintet_rooting::bitset::Bitset;
    /// let mut bs = Bitset::zeros(1);
    /// bs.set(3);
    /// assert!(bs.contains(3));
    /// assert!(!bs.contains(2));
    /// assert!(!bs.contains(500));
    /// ```
    #[inline]
    pub fn contains(&self, idx: TaxonId) -> bool {
        self.0
            .get(idx >> 6)
            .is_some_and(|w| w & (1u64 << (idx & 63)) != 0)
    }

    /// In-place union: `self` becomes `self ∪ other`.
    #[inline]
    pub fn or_assign(&mut self, other: &Bitset) {
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a |= *b;
        }
    }

    /// Number of taxa in the set.
    #[inline]
    pub fn count_ones(&self) -> usize {
        self.0.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Complement within the first `taxa` positions.
    pub fn complement(&self, taxa: usize) -> Bitset {
        let mut out = Bitset::zeros(self.0.len());
        for i in 0..taxa {
            if !self.contains(i) {
                out.set(i);
            }
        }
        out
    }

    /// Projects the set onto a quintet: bit `k` of the result is set when
    /// `quintet[k]` belongs to `self`.
    ///
    /// # Example
    /// ```
    /// # use quintet_rooting::bitset::Bitset;
    /// let mut clade = Bitset::zeros(1);
    /// clade.set(2);
    /// clade.set(7);
    /// // positions 1 and 3 of the quintet hold taxa 2 and 7
    /// assert_eq!(clade.quintet_mask(&[0, 2, 5, 7, 9]), 0b01010);
    /// ```
    #[inline]
    pub fn quintet_mask(&self, quintet: &[TaxonId; 5]) -> u8 {
        quintet
            .iter()
            .enumerate()
            .filter(|&(_, &t)| self.contains(t))
            .fold(0u8, |mask, (k, _)| mask | (1 << k))
    }
}
