//! Ordered lists with contiguous 1-indexed ranks.
//!
//! Position in the backing vector is the only source of truth for rank: every
//! mutating operation renumbers before it returns, so `ranks_are_contiguous`
//! holds between any two calls.

use std::{collections::HashSet, fmt, hash::Hash};

use shared::{
    domain::{MovieId, MovieSummary},
    protocol::OrderedRankedItem,
};
use tracing::debug;

use crate::error::{CurationError, Result};

/// Items that carry a stable identity within a ranked list.
pub trait Keyed {
    type Key: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;

    fn key(&self) -> Self::Key;
}

impl Keyed for MovieSummary {
    type Key = MovieId;

    fn key(&self) -> MovieId {
        self.movie_id
    }
}

impl Keyed for MovieId {
    type Key = MovieId;

    fn key(&self) -> MovieId {
        *self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedItem<T> {
    rank: u32,
    item: T,
}

impl<T> RankedItem<T> {
    pub fn rank(&self) -> u32 {
        self.rank
    }

    pub fn item(&self) -> &T {
        &self.item
    }

    pub fn into_item(self) -> T {
        self.item
    }
}

#[derive(Debug, Clone)]
pub struct RankedList<T> {
    items: Vec<RankedItem<T>>,
    dirty: bool,
    revision: u64,
}

impl<T> Default for RankedList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            dirty: false,
            revision: 0,
        }
    }
}

impl<T: Keyed> RankedList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a clean list ranked in iteration order.
    pub fn from_items(items: impl IntoIterator<Item = T>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut ranked = Vec::new();
        for (index, item) in items.into_iter().enumerate() {
            let key = item.key();
            if !seen.insert(key.clone()) {
                return Err(CurationError::DuplicateItem(key.to_string()));
            }
            ranked.push(RankedItem {
                rank: rank_at(index),
                item,
            });
        }
        Ok(Self {
            items: ranked,
            dirty: false,
            revision: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True when local state has diverged from the last successful save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Counter bumped by every mutation; saves compare it to detect edits
    /// that landed after their snapshot.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn items(&self) -> &[RankedItem<T>] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter().map(|entry| &entry.item)
    }

    pub fn position(&self, key: &T::Key) -> Option<usize> {
        self.items.iter().position(|entry| entry.item.key() == *key)
    }

    pub fn is_present(&self, key: &T::Key) -> bool {
        self.position(key).is_some()
    }

    /// Appends `item` at rank `len + 1` and returns that rank.
    pub fn add(&mut self, item: T) -> Result<u32> {
        let key = item.key();
        if self.is_present(&key) {
            return Err(CurationError::DuplicateItem(key.to_string()));
        }
        let rank = rank_at(self.items.len());
        self.items.push(RankedItem { rank, item });
        self.touch();
        debug!(%key, rank, "added item to ranked list");
        Ok(rank)
    }

    /// Removes the item and closes the gap it leaves.
    pub fn remove(&mut self, key: &T::Key) -> Result<T> {
        let index = self
            .position(key)
            .ok_or_else(|| CurationError::ItemNotFound(key.to_string()))?;
        let removed = self.items.remove(index);
        self.renumber_from(index);
        self.touch();
        debug!(%key, rank = removed.rank, remaining = self.items.len(), "removed item from ranked list");
        Ok(removed.item)
    }

    /// Relocates the item to zero-based `to_index`, shifting the items in
    /// between. Returns `false` when the item already sits there.
    pub fn move_item(&mut self, key: &T::Key, to_index: usize) -> Result<bool> {
        let from_index = self
            .position(key)
            .ok_or_else(|| CurationError::ItemNotFound(key.to_string()))?;
        if to_index >= self.items.len() {
            return Err(CurationError::IndexOutOfRange {
                index: to_index,
                len: self.items.len(),
            });
        }
        if from_index == to_index {
            return Ok(false);
        }

        let entry = self.items.remove(from_index);
        self.items.insert(to_index, entry);
        self.renumber_from(from_index.min(to_index));
        self.touch();
        debug!(%key, from_index, to_index, "moved item in ranked list");
        Ok(true)
    }

    pub fn to_ordered(&self) -> Vec<OrderedRankedItem<T::Key>> {
        self.items
            .iter()
            .map(|entry| OrderedRankedItem {
                id: entry.item.key(),
                rank: entry.rank,
            })
            .collect()
    }

    pub fn ranks_are_contiguous(&self) -> bool {
        self.items
            .iter()
            .enumerate()
            .all(|(index, entry)| entry.rank == rank_at(index))
    }

    /// Clears the dirty flag if nothing changed since `revision` was read.
    pub fn mark_saved(&mut self, revision: u64) -> bool {
        if self.revision != revision {
            return false;
        }
        self.dirty = false;
        true
    }

    /// Takes over `previous`'s revision counter, bumped once, so a list
    /// swapped in by a load never reuses a revision a reader already saw.
    pub(crate) fn succeed(mut self, previous: &Self) -> Self {
        self.revision = previous.revision + 1;
        self
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.revision += 1;
    }

    fn renumber_from(&mut self, start: usize) {
        for (index, entry) in self.items.iter_mut().enumerate().skip(start) {
            entry.rank = rank_at(index);
        }
    }
}

/// Checks the wire form of a ranking: ranks run `1..=N` in array order and
/// no id appears twice.
pub fn validate_ordered<K>(items: &[OrderedRankedItem<K>]) -> Result<()>
where
    K: Eq + Hash + fmt::Display,
{
    let mut seen = HashSet::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let expected = rank_at(index);
        if item.rank != expected {
            return Err(CurationError::InvalidRanking(format!(
                "position {index} carries rank {}, expected {expected}",
                item.rank
            )));
        }
        if !seen.insert(&item.id) {
            return Err(CurationError::DuplicateItem(item.id.to_string()));
        }
    }
    Ok(())
}

fn rank_at(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[path = "tests/ranked_list_tests.rs"]
mod tests;
