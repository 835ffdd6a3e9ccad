//! Scanned entries, the top-N selector and the stats aggregate.

use crate::error::ScanError;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::path::PathBuf;

/// A qualifying filesystem node with its size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Path as produced by the walk (under the scan root)
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
}

impl Entry {
    /// Create a new Entry
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }
}

/// Ranking wrapper: greater means larger, then earlier by path.
#[derive(Debug, PartialEq, Eq)]
struct Ranked(Entry);

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .size
            .cmp(&other.0.size)
            .then_with(|| other.0.path.as_os_str().cmp(self.0.path.as_os_str()))
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Bounded selection of the `n` highest ranked entries.
///
/// Holds a min-heap of at most `n` items, so feeding `m` entries costs
/// `O(m log n)`.
#[derive(Debug)]
pub struct TopN {
    limit: usize,
    heap: BinaryHeap<Reverse<Ranked>>,
}

impl TopN {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            heap: BinaryHeap::with_capacity(limit.min(1024)),
        }
    }

    pub fn push(&mut self, entry: Entry) {
        if self.limit == 0 {
            return;
        }
        let candidate = Ranked(entry);
        if self.heap.len() < self.limit {
            self.heap.push(Reverse(candidate));
        } else if let Some(mut worst) = self.heap.peek_mut() {
            if candidate > worst.0 {
                *worst = Reverse(candidate);
            }
        }
    }

    /// Largest first; equal sizes ordered by path ascending.
    pub fn into_sorted_vec(self) -> Vec<Entry> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(Ranked(entry))| entry)
            .collect()
    }
}

/// The `n` largest entries, sorted by size descending then path ascending.
pub fn top_n<I>(entries: I, n: usize) -> Vec<Entry>
where
    I: IntoIterator<Item = Entry>,
{
    let mut top = TopN::new(n);
    for entry in entries {
        top.push(entry);
    }
    top.into_sorted_vec()
}

/// Aggregate over every entry that passed the filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    /// Number of qualifying entries
    pub count: u64,
    /// Sum of all qualifying sizes, independent of the top-N cut
    pub total_bytes: u64,
    /// Largest entries, at most `top_n` of them
    pub top: Vec<Entry>,
}

/// Single pass over `entries` computing count, total and top-N.
///
/// Fails if the total no longer fits in a `u64`; the stream is not consumed
/// past the entry that overflowed.
pub fn aggregate<I>(entries: I, n: usize) -> Result<Stats, ScanError>
where
    I: IntoIterator<Item = Entry>,
{
    let mut count = 0u64;
    let mut total_bytes = 0u64;
    let mut overflow = false;
    let top = top_n(
        entries
            .into_iter()
            .map_while(|entry| match total_bytes.checked_add(entry.size) {
                Some(total) => {
                    count += 1;
                    total_bytes = total;
                    Some(entry)
                }
                None => {
                    overflow = true;
                    None
                }
            }),
        n,
    );

    if overflow {
        return Err(ScanError::TotalOverflow { count });
    }
    Ok(Stats {
        count,
        total_bytes,
        top,
    })
}
