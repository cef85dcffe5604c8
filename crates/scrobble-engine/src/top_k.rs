//! Top-K ranking of category counts.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A category and its count within the current window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RankedCategory {
    /// Category key.
    pub key: String,
    /// Number of events.
    pub count: u64,
}

/// Selects the `k` largest categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopKSelector {
    k: usize,
}

impl TopKSelector {
    /// Selector returning at most `k` entries.
    pub const fn new(k: usize) -> Self {
        Self { k }
    }

    /// Configured `k`.
    pub const fn k(&self) -> usize {
        self.k
    }

    /// See [`select_top_k`].
    pub fn select<K: AsRef<str>>(&self, counts: &[(K, u64)]) -> Vec<RankedCategory> {
        select_top_k(counts, self.k)
    }
}

/// The `min(k, len)` entries with the largest counts, count descending.
///
/// Equal counts keep their input order. `counts` is not modified; a
/// partial selection over a copy of `(index, count)` pairs keeps the cost
/// at O(n + k log k).
pub fn select_top_k<K: AsRef<str>>(counts: &[(K, u64)], k: usize) -> Vec<RankedCategory> {
    if k == 0 || counts.is_empty() {
        return Vec::new();
    }

    let mut ranked: Vec<(usize, u64)> = counts
        .iter()
        .enumerate()
        .map(|(index, (_, count))| (index, *count))
        .collect();

    if k < ranked.len() {
        ranked.select_nth_unstable_by(k - 1, by_rank);
        ranked.truncate(k);
    }
    ranked.sort_unstable_by(by_rank);

    ranked
        .into_iter()
        .map(|(index, count)| RankedCategory {
            key: counts[index].0.as_ref().to_string(),
            count,
        })
        .collect()
}

fn by_rank(a: &(usize, u64), b: &(usize, u64)) -> Ordering {
    b.1.cmp(&a.1).then(a.0.cmp(&b.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use scrobble_common::test_utils::property_testing::counts_strategy;

    fn ranked(key: &str, count: u64) -> RankedCategory {
        RankedCategory {
            key: key.to_string(),
            count,
        }
    }

    #[test]
    fn test_top_one() {
        let counts = vec![("A", 2), ("B", 1)];
        assert_eq!(select_top_k(&counts, 1), vec![ranked("A", 2)]);
    }

    #[test]
    fn test_k_larger_than_input() {
        let counts = vec![("A", 1), ("B", 3)];
        assert_eq!(
            TopKSelector::new(10).select(&counts),
            vec![ranked("B", 3), ranked("A", 1)]
        );
    }

    #[test]
    fn test_zero_k_and_empty_input() {
        assert!(select_top_k(&[("A", 1)], 0).is_empty());
        assert!(select_top_k::<&str>(&[], 5).is_empty());
    }

    #[test]
    fn test_ties_keep_input_order() {
        let counts = vec![("C", 4), ("A", 4), ("B", 4), ("D", 9)];
        assert_eq!(
            select_top_k(&counts, 3),
            vec![ranked("D", 9), ranked("C", 4), ranked("A", 4)]
        );
    }

    #[test]
    fn test_input_untouched() {
        let counts = vec![("A".to_string(), 1), ("B".to_string(), 5)];
        let before = counts.clone();
        let _ = select_top_k(&counts, 1);
        assert_eq!(counts, before);
    }

    proptest! {
        #[test]
        fn prop_matches_full_sort(counts in counts_strategy(60), k in 0usize..70) {
            let result = select_top_k(&counts, k);
            prop_assert_eq!(result.len(), k.min(counts.len()));

            let mut expected: Vec<(usize, &(String, u64))> = counts.iter().enumerate().collect();
            expected.sort_by(|a, b| b.1 .1.cmp(&a.1 .1).then(a.0.cmp(&b.0)));
            let expected: Vec<RankedCategory> = expected
                .into_iter()
                .take(k)
                .map(|(_, (key, count))| ranked(key, *count))
                .collect();
            prop_assert_eq!(&result, &expected);

            for pair in result.windows(2) {
                prop_assert!(pair[0].count >= pair[1].count);
            }
        }
    }
}
