//! Collection helpers

use std::collections::HashSet;
use std::hash::Hash;

/// Remove duplicates, keeping the first occurrence of each item in place
pub fn dedup_preserving_order<T, I>(items: I) -> Vec<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
