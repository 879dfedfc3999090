//! Shadow queue
//!
//! The engine timeline decides order and the current position, but its
//! sources cannot be read back. [`Queue`] keeps the [`AudioItem`]s in the
//! same order so the player can answer "what is playing" without asking the
//! engine for more than an index.
//!
//! Validation lives here so every player operation can check its arguments
//! before touching either side.

use crate::error::{PlaybackError, Result};
use crate::models::AudioItem;
use std::ops::Range;

#[derive(Debug, Clone, Default)]
pub struct Queue {
    items: Vec<AudioItem>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[AudioItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&AudioItem> {
        self.items.get(index)
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// `index` must address an existing item.
    pub fn check_index(&self, index: usize) -> Result<()> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(PlaybackError::IndexOutOfBounds {
                index,
                size: self.items.len(),
            })
        }
    }

    /// Resolve an insert position; `None` appends. `len` itself is valid.
    pub fn insert_position(&self, at: Option<usize>) -> Result<usize> {
        match at {
            None => Ok(self.items.len()),
            Some(index) if index <= self.items.len() => Ok(index),
            Some(index) => Err(PlaybackError::IndexOutOfBounds {
                index,
                size: self.items.len(),
            }),
        }
    }

    /// Resolve a move target. Targets past the end clamp to the last slot;
    /// negative targets are rejected.
    pub fn move_target(&self, to: isize) -> Result<usize> {
        if to < 0 {
            return Err(PlaybackError::InvalidArgument(format!(
                "move target must not be negative, got {}",
                to
            )));
        }
        let last = self.items.len().saturating_sub(1);
        Ok((to as usize).min(last))
    }

    /// Sort removal indices descending and drop duplicates.
    ///
    /// Fails on the first out-of-range index so nothing is removed.
    pub fn removal_order(&self, indices: &[usize]) -> Result<Vec<usize>> {
        if indices.is_empty() {
            return Err(PlaybackError::InvalidArgument(
                "no indices to remove".to_string(),
            ));
        }
        for &index in indices {
            self.check_index(index)?;
        }
        let mut ordered = indices.to_vec();
        ordered.sort_unstable_by(|a, b| b.cmp(a));
        ordered.dedup();
        Ok(ordered)
    }

    // ========================================================================
    // Mutation
    // ========================================================================
    //
    // Callers validate first; these mirror exactly what the engine was told.

    pub fn insert(&mut self, at: usize, items: Vec<AudioItem>) {
        self.items.splice(at..at, items);
    }

    pub fn remove(&mut self, index: usize) -> AudioItem {
        self.items.remove(index)
    }

    pub fn move_item(&mut self, from: usize, to: usize) {
        let item = self.items.remove(from);
        self.items.insert(to, item);
    }

    pub fn replace(&mut self, index: usize, item: AudioItem) -> AudioItem {
        std::mem::replace(&mut self.items[index], item)
    }

    /// Drop everything after `index`.
    pub fn truncate_after(&mut self, index: usize) {
        self.items.truncate(index + 1);
    }

    /// Drop everything before `index`.
    pub fn drain_before(&mut self, index: usize) {
        self.items.drain(..index);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// Items strictly before `current`.
    pub fn previous(&self, current: Option<usize>) -> &[AudioItem] {
        match current {
            Some(index) => &self.items[..index.min(self.items.len())],
            None => &[],
        }
    }

    /// Items strictly after `current`.
    pub fn upcoming(&self, current: Option<usize>) -> &[AudioItem] {
        match current {
            Some(index) if index < self.items.len() => &self.items[index + 1..],
            _ => &[],
        }
    }
}

/// Group a descending removal order into ranges of adjacent indices,
/// highest range first.
pub fn descending_runs(order: &[usize]) -> Vec<Range<usize>> {
    let mut runs: Vec<Range<usize>> = Vec::new();
    for &index in order {
        match runs.last_mut() {
            Some(run) if run.start == index + 1 => run.start = index,
            _ => runs.push(index..index + 1),
        }
    }
    runs
}
