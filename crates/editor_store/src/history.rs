//! Bounded undo/redo over section snapshots.
//!
//! A snapshot is a `Vec<Arc<Section>>`, so untouched sections are shared
//! between snapshots and with the live state.

use crate::model::Section;
use std::collections::VecDeque;
use std::sync::Arc;

pub type Snapshot = Vec<Arc<Section>>;

#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<Snapshot>,
    future: Vec<Snapshot>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            past: VecDeque::with_capacity(limit.min(64)),
            future: Vec::new(),
            limit,
        }
    }

    /// Records `current` as an undo point and invalidates redo.
    ///
    /// Skipped when `current` is empty or equal to the newest undo point.
    /// Returns whether a snapshot was stored.
    pub fn save(&mut self, current: &Snapshot) -> bool {
        if current.is_empty() || self.past.back() == Some(current) {
            return false;
        }

        self.future.clear();
        self.past.push_back(current.clone());
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
        true
    }

    /// Previous state; `current` moves onto the redo stack.
    pub fn undo(&mut self, current: &Snapshot) -> Option<Snapshot> {
        let previous = self.past.pop_back()?;
        self.future.push(current.clone());
        Some(previous)
    }

    /// Next state; `current` moves back onto the undo stack.
    pub fn redo(&mut self, current: &Snapshot) -> Option<Snapshot> {
        let next = self.future.pop()?;
        self.past.push_back(current.clone());
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
        Some(next)
    }

    #[inline]
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    #[inline]
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}
