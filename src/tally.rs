//! Insertion-ordered frequency counting.
//!
//! Ranking a tally never depends on hash order: entries remember when their
//! key was first counted, and among equal counts the earlier key ranks first.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct Tally<K> {
    index: HashMap<K, usize>,
    entries: Vec<(K, usize)>,
}

impl<K> Default for Tally<K> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> Tally<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: K) {
        match self.index.get(&key) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, 1));
            }
        }
    }

    pub fn count(&self, key: &K) -> usize {
        self.index.get(key).map_or(0, |&slot| self.entries[slot].1)
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `n` most frequent keys with their counts, count descending,
    /// first insertion winning ties.
    pub fn top(&self, n: usize) -> Vec<(K, usize)> {
        let mut ranked = self.entries.clone();
        // Stable sort keeps insertion order among equal counts.
        ranked.sort_by(|(_, a), (_, b)| b.cmp(a));
        ranked.truncate(n);
        ranked
    }
}

impl<K: Eq + Hash + Clone> FromIterator<K> for Tally<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tally = Self::new();
        for key in iter {
            tally.add(key);
        }
        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_total() {
        let tally: Tally<&str> = ["a", "b", "a", "c", "a"].into_iter().collect();
        assert_eq!(tally.count(&"a"), 3);
        assert_eq!(tally.count(&"z"), 0);
        assert_eq!(tally.total(), 5);
        assert_eq!(tally.len(), 3);
    }

    #[test]
    fn test_top_breaks_ties_by_first_insertion() {
        let tally: Tally<&str> = ["x", "y", "z", "y", "x", "w"].into_iter().collect();
        assert_eq!(tally.top(3), vec![("x", 2), ("y", 2), ("z", 1)]);
    }

    #[test]
    fn test_top_of_empty() {
        let tally: Tally<String> = Tally::new();
        assert!(tally.is_empty());
        assert!(tally.top(5).is_empty());
    }
}
