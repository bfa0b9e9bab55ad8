//! Taxon label storage shared by tree leaves.

use std::collections::HashMap;
use std::ops::Index;

/// Index of a taxon label in a [TaxonLabelMap].
pub type LabelIndex = usize;

// =#========================================================================#=
// TAXON LABEL MAP
// =#========================================================================#=
/// Maps taxon labels (strings) to compact indices.
///
/// Labels are stored once; leaves reference them by [LabelIndex]. The
/// index of a taxon is its position in the input label list, so matrix
/// row `i` and label index `i` denote the same taxon at the start of a
/// run.
///
/// # Example
/// ```
/// use njtree::model::TaxonLabelMap;
///
/// let labels = TaxonLabelMap::from_labels(&["cat", "dog", "rat"]).unwrap();
/// assert_eq!(labels.num_labels(), 3);
/// assert_eq!(labels.get_label(1), Some("dog"));
/// assert_eq!(labels.index_of("rat"), Some(2));
/// ```
#[derive(Debug, Clone)]
pub struct TaxonLabelMap {
    /// Labels in input order
    labels: Vec<String>,
    /// Map from label to its index
    map: HashMap<String, LabelIndex>,
}

impl TaxonLabelMap {
    /// Builds a map from the input label list, preserving order.
    ///
    /// # Arguments
    /// * `labels` - Taxon labels in matrix-row order
    ///
    /// # Errors
    /// The first duplicated label, if any two labels are equal.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Result<Self, String> {
        let mut map = HashMap::with_capacity(labels.len());
        let mut stored = Vec::with_capacity(labels.len());
        for (index, label) in labels.iter().enumerate() {
            let label = label.as_ref().to_string();
            if map.insert(label.clone(), index).is_some() {
                return Err(label);
            }
            stored.push(label);
        }
        Ok(TaxonLabelMap {
            labels: stored,
            map,
        })
    }

    /// Returns the number of labels.
    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }

    /// Returns the label at `index`, or `None` if out of range.
    pub fn get_label(&self, index: LabelIndex) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Returns the index of `label`, or `None` if unknown.
    pub fn index_of(&self, label: &str) -> Option<LabelIndex> {
        self.map.get(label).copied()
    }

    /// Returns `true` if `label` is present.
    pub fn contains_label(&self, label: &str) -> bool {
        self.map.contains_key(label)
    }

    /// Returns all labels in input order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl Index<LabelIndex> for TaxonLabelMap {
    type Output = String;

    fn index(&self, index: LabelIndex) -> &Self::Output {
        &self.labels[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_label_is_reported() {
        let result = TaxonLabelMap::from_labels(&["cat", "dog", "cat"]);
        assert_eq!(result.unwrap_err(), "cat");
    }
}
