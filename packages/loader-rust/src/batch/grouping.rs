//! Partitioning of pending requests into one batch group per distinct filter.

use std::collections::{HashMap, HashSet};

use coalesce_core::{ChildFilter, LoadRequest, PrimaryKey};

/// The keys requested under one filter value, fetched with a single round-trip.
///
/// Transient: exists only while one flush is being executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchGroup {
    /// Filter shared by every request in the group. `None` is its own group.
    pub filter: Option<ChildFilter>,
    /// Distinct keys, in the order they were first requested.
    pub keys: Vec<PrimaryKey>,
}

impl BatchGroup {
    /// Splits the group into consecutive chunks of at most `max_keys` keys.
    ///
    /// A `max_keys` of zero is treated as unbounded.
    #[must_use]
    pub fn chunks(&self, max_keys: usize) -> Vec<BatchGroup> {
        if max_keys == 0 || self.keys.len() <= max_keys {
            return vec![self.clone()];
        }
        self.keys
            .chunks(max_keys)
            .map(|keys| BatchGroup {
                filter: self.filter.clone(),
                keys: keys.to_vec(),
            })
            .collect()
    }
}

/// Groups requests by filter value.
///
/// Groups come out in first-appearance order of their filter. Filters are
/// compared by value, so equal filters built separately share a group.
/// Duplicate keys within a group are collapsed.
pub fn group_requests<'a, I>(requests: I) -> Vec<BatchGroup>
where
    I: IntoIterator<Item = &'a LoadRequest>,
{
    let mut index: HashMap<&'a Option<ChildFilter>, usize> = HashMap::new();
    let mut seen: HashSet<(usize, PrimaryKey)> = HashSet::new();
    let mut groups: Vec<BatchGroup> = Vec::new();

    for request in requests {
        let slot = *index.entry(&request.filter).or_insert_with(|| {
            groups.push(BatchGroup {
                filter: request.filter.clone(),
                keys: Vec::new(),
            });
            groups.len() - 1
        });
        if seen.insert((slot, request.key)) {
            groups[slot].keys.push(request.key);
        }
    }

    groups
}
