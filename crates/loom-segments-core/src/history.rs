// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Undo/redo over tree snapshots.

use std::collections::VecDeque;

use tracing::debug;

use crate::config::{SegmentsConfig, DEFAULT_HISTORY_CAPACITY};
use crate::tree::FilterTree;

/// Edit history for one filter being edited.
///
/// Keeps the current snapshot plus up to `capacity` earlier ones. When full,
/// the oldest snapshot is evicted. Committing a new snapshot clears the redo
/// stack.
#[derive(Debug, Clone)]
pub struct TreeHistory {
	past: VecDeque<FilterTree>,
	current: FilterTree,
	future: Vec<FilterTree>,
	capacity: usize,
}

impl TreeHistory {
	/// Create a history starting at `tree`, keeping at most `capacity` undo
	/// steps (at least one).
	pub fn new(tree: FilterTree, capacity: usize) -> Self {
		let capacity = capacity.max(1);
		Self {
			past: VecDeque::with_capacity(capacity),
			current: tree,
			future: Vec::new(),
			capacity,
		}
	}

	/// Create a history sized by `config.history_capacity`.
	pub fn from_config(tree: FilterTree, config: &SegmentsConfig) -> Self {
		Self::new(tree, config.history_capacity)
	}

	pub fn current(&self) -> &FilterTree {
		&self.current
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	/// Number of steps that can be undone.
	pub fn undo_depth(&self) -> usize {
		self.past.len()
	}

	/// Number of steps that can be redone.
	pub fn redo_depth(&self) -> usize {
		self.future.len()
	}

	pub fn can_undo(&self) -> bool {
		!self.past.is_empty()
	}

	pub fn can_redo(&self) -> bool {
		!self.future.is_empty()
	}

	/// Make `next` the current snapshot.
	///
	/// Returns false and records nothing if `next` equals the current
	/// snapshot, so edits that changed nothing leave no undo step.
	pub fn commit(&mut self, next: FilterTree) -> bool {
		if next == self.current {
			return false;
		}
		let previous = std::mem::replace(&mut self.current, next);
		self.push_past(previous);
		self.future.clear();
		true
	}

	/// Commit the result of applying `edit` to the current snapshot.
	pub fn apply(&mut self, edit: impl FnOnce(&FilterTree) -> FilterTree) -> bool {
		let next = edit(&self.current);
		self.commit(next)
	}

	/// Step back one snapshot. Returns false if there is nothing to undo.
	pub fn undo(&mut self) -> bool {
		let Some(previous) = self.past.pop_back() else {
			return false;
		};
		let current = std::mem::replace(&mut self.current, previous);
		self.future.push(current);
		true
	}

	/// Step forward one undone snapshot. Returns false if there is nothing
	/// to redo.
	pub fn redo(&mut self) -> bool {
		let Some(next) = self.future.pop() else {
			return false;
		};
		let current = std::mem::replace(&mut self.current, next);
		self.push_past(current);
		true
	}

	fn push_past(&mut self, tree: FilterTree) {
		if self.past.len() >= self.capacity {
			self.past.pop_front();
			debug!(capacity = self.capacity, "evicted oldest filter snapshot");
		}
		self.past.push_back(tree);
	}
}

impl Default for TreeHistory {
	fn default() -> Self {
		Self::new(FilterTree::new(), DEFAULT_HISTORY_CAPACITY)
	}
}
