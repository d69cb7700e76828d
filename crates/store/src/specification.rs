//! Specification pattern: a storage-agnostic description of a read query.
//!
//! A specification carries filter criteria (conjunctive), relation names to
//! eagerly attach, at most one active sort key, and opt-in paging bounds. It is
//! built once per query, handed to a repository call, and discarded.
//!
//! Resolution order (enforced by the repository read path):
//! criteria → includes → ordering → total count of the filtered set →
//! skip/take slice when paging is enabled. The count is always taken before
//! the slice, so pagination metadata stays correct regardless of `take`.

use std::cmp::Ordering;
use std::sync::Arc;

type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Comparator over an entity, built from a key extractor.
#[derive(Clone)]
pub struct SortKey<T>(Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>);

impl<T> SortKey<T> {
    /// Sort by an `Ord` key of the entity, ascending.
    pub fn by<K, F>(key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self(Arc::new(move |a, b| key(a).cmp(&key(b))))
    }

    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.0)(a, b)
    }
}

impl<T> core::fmt::Debug for SortKey<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SortKey")
    }
}

/// Sort direction attached to the active sort key.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Clone, Debug)]
pub(crate) struct Order<T> {
    pub(crate) key: SortKey<T>,
    pub(crate) direction: Direction,
}

/// A composable read-query description for one entity type.
#[derive(Clone)]
pub struct Specification<T> {
    criteria: Vec<Predicate<T>>,
    includes: Vec<String>,
    order: Option<Order<T>>,
    skip: usize,
    take: usize,
    paging_enabled: bool,
    include_deleted: bool,
}

impl<T> Specification<T> {
    /// Matches every non-deleted record, no ordering, no paging.
    pub fn new() -> Self {
        Self {
            criteria: Vec::new(),
            includes: Vec::new(),
            order: None,
            skip: 0,
            take: 0,
            paging_enabled: false,
            include_deleted: false,
        }
    }

    /// Add a filter condition. Multiple conditions combine with AND.
    pub fn filter(mut self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.criteria.push(Arc::new(predicate));
        self
    }

    /// Name a relation to eagerly attach to each result.
    pub fn include(mut self, relation: impl Into<String>) -> Self {
        let relation = relation.into();
        if !self.includes.contains(&relation) {
            self.includes.push(relation);
        }
        self
    }

    /// Sort ascending by the given key.
    ///
    /// At most one sort key is active; applying a second ordering (either
    /// direction) replaces the first — last write wins.
    pub fn order_by<K, F>(mut self, key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.order = Some(Order {
            key: SortKey::by(key),
            direction: Direction::Ascending,
        });
        self
    }

    /// Sort descending by the given key. Last write wins, see [`Self::order_by`].
    pub fn order_by_descending<K, F>(mut self, key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.order = Some(Order {
            key: SortKey::by(key),
            direction: Direction::Descending,
        });
        self
    }

    /// Set the active order from a prebuilt comparator. Last write wins, same
    /// as the public ordering mutators.
    pub(crate) fn with_sort_key(mut self, key: SortKey<T>, ascending: bool) -> Self {
        self.order = Some(Order {
            key,
            direction: if ascending {
                Direction::Ascending
            } else {
                Direction::Descending
            },
        });
        self
    }

    /// Enable paging: drop `skip` records, keep at most `take`.
    pub fn apply_paging(mut self, skip: usize, take: usize) -> Self {
        self.skip = skip;
        self.take = take;
        self.paging_enabled = true;
        self
    }

    /// Opt in to seeing soft-deleted records. Off by default.
    pub fn including_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    /// Whether `item` satisfies every criterion.
    pub fn matches(&self, item: &T) -> bool {
        self.criteria.iter().all(|p| p(item))
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    pub(crate) fn order(&self) -> Option<&Order<T>> {
        self.order.as_ref()
    }

    pub fn skip(&self) -> usize {
        self.skip
    }

    pub fn take(&self) -> usize {
        self.take
    }

    pub fn is_paging_enabled(&self) -> bool {
        self.paging_enabled
    }

    pub fn is_deleted_included(&self) -> bool {
        self.include_deleted
    }

    /// Sort `items` in place according to the active order, if any.
    pub(crate) fn sort(&self, items: &mut [T]) {
        if let Some(order) = &self.order {
            match order.direction {
                Direction::Ascending => items.sort_by(|a, b| order.key.compare(a, b)),
                Direction::Descending => items.sort_by(|a, b| order.key.compare(b, a)),
            }
        }
    }
}

impl<T> Default for Specification<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> core::fmt::Debug for Specification<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Specification")
            .field("criteria", &self.criteria.len())
            .field("includes", &self.includes)
            .field("order", &self.order.as_ref().map(|o| o.direction))
            .field("skip", &self.skip)
            .field("take", &self.take)
            .field("paging_enabled", &self.paging_enabled)
            .field("include_deleted", &self.include_deleted)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criteria_combine_with_and() {
        let spec = Specification::<i64>::new()
            .filter(|n| *n > 10)
            .filter(|n| *n < 20);
        assert!(spec.matches(&15));
        assert!(!spec.matches(&5));
        assert!(!spec.matches(&25));
    }

    #[test]
    fn empty_specification_matches_everything() {
        let spec = Specification::<i64>::new();
        assert!(spec.matches(&0));
        assert!(spec.matches(&i64::MAX));
    }

    #[test]
    fn last_ordering_wins() {
        let spec = Specification::<i64>::new()
            .order_by(|n| *n)
            .order_by_descending(|n| *n);

        let mut items = vec![1, 3, 2];
        spec.sort(&mut items);
        assert_eq!(items, vec![3, 2, 1]);

        // And the other way round.
        let spec = Specification::<i64>::new()
            .order_by_descending(|n| *n)
            .order_by(|n| *n);
        let mut items = vec![1, 3, 2];
        spec.sort(&mut items);
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn paging_is_opt_in() {
        let spec = Specification::<i64>::new();
        assert!(!spec.is_paging_enabled());

        let spec = spec.apply_paging(10, 5);
        assert!(spec.is_paging_enabled());
        assert_eq!(spec.skip(), 10);
        assert_eq!(spec.take(), 5);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn sort_is_a_permutation_in_key_order(
                mut items in proptest::collection::vec(any::<i64>(), 0..64),
            ) {
                let spec = Specification::<i64>::new().order_by(|n| *n);
                let mut expected = items.clone();
                expected.sort();
                spec.sort(&mut items);
                prop_assert_eq!(items, expected);
            }

            #[test]
            fn paged_slice_stays_within_take(
                items in proptest::collection::vec(any::<i64>(), 0..64),
                skip in 0usize..80,
                take in 0usize..80,
            ) {
                let spec = Specification::<i64>::new().apply_paging(skip, take);
                let sliced: Vec<i64> = items
                    .iter()
                    .copied()
                    .skip(spec.skip())
                    .take(spec.take())
                    .collect();
                prop_assert!(sliced.len() <= take);
                prop_assert!(sliced.len() <= items.len().saturating_sub(skip));
            }
        }
    }

    #[test]
    fn includes_are_deduplicated_and_ordered() {
        let spec = Specification::<i64>::new()
            .include("donor")
            .include("account")
            .include("donor");
        assert_eq!(spec.includes(), &["donor".to_string(), "account".to_string()]);
    }
}
