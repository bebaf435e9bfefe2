//! Label Sets
//!
//! A sorted, de-duplicated set of string identifiers. Used for task labels,
//! channel labels and pay-method ids, all of which are only ever probed for
//! membership or overlap.

use std::{
    cmp::Ordering,
    fmt,
    ops::{BitOr, BitOrAssign},
};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Sorted string set backed by a `SmallVec`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct LabelSet {
    labels: SmallVec<[String; 4]>,
}

impl LabelSet {
    /// Create an empty label set.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            labels: SmallVec::new(),
        }
    }

    /// Create a label set from string slices.
    pub fn from_strs(labels: &[&str]) -> Self {
        labels.iter().copied().collect()
    }

    /// Check if the set contains a specific label.
    pub fn contains(&self, label: &str) -> bool {
        self.labels
            .binary_search_by(|probe| probe.as_str().cmp(label))
            .is_ok()
    }

    /// Check if this set shares at least one label with `other`.
    pub fn intersects(&self, other: &Self) -> bool {
        // Both sides are sorted, so walk them together in O(n + m).
        let mut left = self.labels.iter();
        let mut right = other.labels.iter();
        let mut left_label = left.next();
        let mut right_label = right.next();

        while let (Some(l), Some(r)) = (left_label, right_label) {
            match l.cmp(r) {
                Ordering::Equal => return true,
                Ordering::Less => left_label = left.next(),
                Ordering::Greater => right_label = right.next(),
            }
        }

        false
    }

    /// Add a label, keeping the set sorted.
    pub fn insert(&mut self, label: impl Into<String>) {
        let label = label.into();

        if let Err(pos) = self.labels.binary_search(&label) {
            self.labels.insert(pos, label);
        }
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of labels in the set.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Iterate labels in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for LabelSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut labels: SmallVec<[String; 4]> = iter.into_iter().map(Into::into).collect();

        labels.sort_unstable();
        labels.dedup();

        Self { labels }
    }
}

impl From<Vec<String>> for LabelSet {
    fn from(labels: Vec<String>) -> Self {
        labels.into_iter().collect()
    }
}

impl From<LabelSet> for Vec<String> {
    fn from(set: LabelSet) -> Self {
        set.labels.into_vec()
    }
}

impl BitOr for LabelSet {
    type Output = Self;

    fn bitor(mut self, rhs: Self) -> Self::Output {
        self |= rhs;
        self
    }
}

impl BitOrAssign for LabelSet {
    fn bitor_assign(&mut self, rhs: Self) {
        let capacity = self.labels.len().saturating_add(rhs.labels.len());
        let mut result = SmallVec::with_capacity(capacity);
        let mut left = std::mem::take(&mut self.labels).into_iter().peekable();
        let mut right = rhs.labels.into_iter().peekable();

        while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
            match l.cmp(r) {
                Ordering::Less => result.extend(left.next()),
                Ordering::Greater => result.extend(right.next()),
                Ordering::Equal => {
                    result.extend(left.next());
                    right.next();
                }
            }
        }

        result.extend(left);
        result.extend(right);

        self.labels = result;
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;

        for label in &self.labels {
            if !first {
                f.write_str(", ")?;
            }

            f.write_str(label)?;
            first = false;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_strs_sorts_and_dedups() {
        let labels = LabelSet::from_strs(&["oversea", "digital", "oversea"]);

        assert_eq!(labels.len(), 2);
        assert_eq!(labels.iter().collect::<Vec<_>>(), ["digital", "oversea"]);
    }

    #[test]
    fn contains_uses_sorted_lookup() {
        let labels = LabelSet::from_strs(&["restaurant", "domestic", "digital"]);

        assert!(labels.contains("domestic"));
        assert!(labels.contains("restaurant"));
        assert!(!labels.contains("oversea"));
    }

    #[test]
    fn intersects_requires_one_shared_label() {
        let left = LabelSet::from_strs(&["a", "c", "e"]);

        assert!(left.intersects(&LabelSet::from_strs(&["b", "e"])));
        assert!(!left.intersects(&LabelSet::from_strs(&["b", "d"])));
        assert!(!left.intersects(&LabelSet::empty()));
        assert!(!LabelSet::empty().intersects(&left));
    }

    #[test]
    fn insert_keeps_order_and_ignores_duplicates() {
        let mut labels = LabelSet::from_strs(&["b"]);

        labels.insert("a");
        labels.insert("c");
        labels.insert("b");

        assert_eq!(labels.iter().collect::<Vec<_>>(), ["a", "b", "c"]);
    }

    #[test]
    fn union_merges_sorted_sets() {
        let merged = LabelSet::from_strs(&["a", "c"]) | LabelSet::from_strs(&["b", "c", "d"]);

        assert_eq!(merged.iter().collect::<Vec<_>>(), ["a", "b", "c", "d"]);
    }

    #[test]
    fn deserializes_from_plain_list() -> Result<(), serde_json::Error> {
        let labels: LabelSet = serde_json::from_str(r#"["z", "a", "z"]"#)?;

        assert_eq!(labels, LabelSet::from_strs(&["a", "z"]));
        assert_eq!(serde_json::to_string(&labels)?, r#"["a","z"]"#);

        Ok(())
    }

    #[test]
    fn display_joins_labels() {
        assert_eq!(LabelSet::from_strs(&["b", "a"]).to_string(), "a, b");
        assert_eq!(LabelSet::empty().to_string(), "");
    }
}
