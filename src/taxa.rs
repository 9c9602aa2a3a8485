//! Taxon namespace shared by the species tree, the gene trees and the quintets.
//!
//! Taxa are sorted alphabetically by label before ids are assigned, so the same
//! label always maps to the same bit position regardless of the order leaves
//! appear in a newick string.

use std::collections::HashMap;

use crate::error::{QuintetError, Result};

pub type TaxonId = usize;

#[derive(Debug, Clone, Default)]
pub struct TaxonSet {
    names: Vec<String>,
    index: HashMap<String, TaxonId>,
}

impl TaxonSet {
    /// Builds the namespace from leaf labels.
    ///
    /// # Errors
    /// `DuplicateTaxon` if a label occurs twice.
    ///
    /// # Example
    /// ```
    /// # use quintet_rooting::taxa::TaxonSet;
    /// let taxa = TaxonSet::from_names(["C", "A", "B"]).unwrap();
    /// assert_eq!(taxa.id("A"), Some(0));
    /// assert_eq!(taxa.name(2), "C");
    /// ```
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        names.sort();
        if let Some(dup) = names.windows(2).find(|w| w[0] == w[1]) {
            return Err(QuintetError::DuplicateTaxon(dup[0].clone()));
        }
        let index = names
            .iter()
            .enumerate()
            .map(|(id, name)| (name.clone(), id))
            .collect();
        Ok(TaxonSet { names, index })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn id(&self, name: &str) -> Option<TaxonId> {
        self.index.get(name).copied()
    }

    pub fn name(&self, id: TaxonId) -> &str {
        &self.names[id]
    }

}
