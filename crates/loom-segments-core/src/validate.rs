// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Filter validation.
//!
//! Legacy filters get a boolean verdict ([`is_valid_filter`]); trees get the
//! full list of problems found ([`validate_filter_tree`]) so an editor can
//! show every error at once. Neither ever fails.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::FilterLimits;
use crate::legacy::FilterComposite;
use crate::operator::ConditionOperator;
use crate::tree::{Condition, FilterNode, FilterTree, Group};
use crate::NodeId;

/// Returns true if a legacy filter is structurally and semantically valid.
///
/// A group needs at least one child, all of them valid. A condition needs an
/// operator from the legacy vocabulary.
pub fn is_valid_filter(filter: &FilterComposite) -> bool {
	match filter {
		FilterComposite::Condition(c) => c.legacy_operator().is_some(),
		FilterComposite::Group(g) => {
			!g.children.is_empty() && g.children.iter().all(is_valid_filter)
		}
	}
}

/// Like [`is_valid_filter`], for JSON that may not have a filter shape at all.
pub fn is_valid_filter_json(value: &serde_json::Value) -> bool {
	FilterComposite::deserialize(value)
		.map(|filter| is_valid_filter(&filter))
		.unwrap_or(false)
}

/// Outcome of [`validate_filter_tree`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
	pub is_valid: bool,
	pub errors: Vec<String>,
}

impl ValidationResult {
	fn from_errors(errors: Vec<String>) -> Self {
		Self {
			is_valid: errors.is_empty(),
			errors,
		}
	}
}

/// Validates a tree against the default tree limits.
pub fn validate_filter_tree(tree: &FilterTree) -> ValidationResult {
	validate_filter_tree_within(tree, &FilterLimits::tree())
}

/// Walks the tree once in pre-order, children in order, and collects every
/// problem found.
pub fn validate_filter_tree_within(tree: &FilterTree, limits: &FilterLimits) -> ValidationResult {
	let mut walk = Walk {
		limits,
		seen: HashSet::new(),
		conditions: 0,
		errors: Vec::new(),
	};
	walk.group(&tree.root, 0);

	if let Some(max) = limits.max_conditions {
		if walk.conditions > max {
			walk.errors.push(format!(
				"Filter has {} conditions, more than the maximum of {max}",
				walk.conditions
			));
		}
	}

	ValidationResult::from_errors(walk.errors)
}

struct Walk<'a> {
	limits: &'a FilterLimits,
	seen: HashSet<&'a NodeId>,
	conditions: usize,
	errors: Vec<String>,
}

impl<'a> Walk<'a> {
	fn group(&mut self, group: &'a Group, depth: usize) {
		let label = if group.id.is_empty() {
			self.errors.push("Group is missing an id".to_string());
			"<unnamed>".to_string()
		} else {
			self.check_unique(&group.id);
			group.id.to_string()
		};

		if group.is_empty() {
			self.errors
				.push(format!(
					"{} group {label} has no conditions or subgroups",
					group.operator.label()
				));
		}
		if depth > self.limits.max_depth {
			self.errors.push(format!(
				"Group {label} is nested {depth} levels deep, more than the maximum of {}",
				self.limits.max_depth
			));
		}
		if group.child_count() > self.limits.max_children {
			self.errors.push(format!(
				"Group {label} has {} children, more than the maximum of {}",
				group.child_count(),
				self.limits.max_children
			));
		}

		for child in &group.children {
			match child {
				FilterNode::Group(g) => self.group(g, depth + 1),
				FilterNode::Condition(c) => self.condition(c),
			}
		}
	}

	fn condition(&mut self, condition: &'a Condition) {
		self.conditions += 1;

		let label = if condition.id.is_empty() {
			self.errors.push("Condition is missing an id".to_string());
			"<unnamed>".to_string()
		} else {
			self.check_unique(&condition.id);
			condition.id.to_string()
		};

		if condition.attribute.trim().is_empty() {
			self.errors
				.push(format!("Condition {label} is missing a field"));
		}

		match &condition.operator {
			ConditionOperator::Unknown(op) if op.trim().is_empty() => {
				self.errors
					.push(format!("Condition {label} is missing an operator"));
			}
			ConditionOperator::Unknown(op) => {
				self.errors
					.push(format!("Condition {label} has unrecognized operator '{op}'"));
			}
			op if op.is_boolean() => {}
			op => {
				let value = condition.value.as_ref().filter(|v| !v.is_blank());
				if value.is_none() {
					self.errors
						.push(format!("Condition {label} is missing a value"));
				} else if !op.arity().accepts(value) {
					self.errors.push(format!(
						"Condition {label} has a value that does not fit operator '{op}'"
					));
				}
			}
		}
	}

	fn check_unique(&mut self, id: &'a NodeId) {
		if !self.seen.insert(id) {
			self.errors.push(format!("Duplicate node id {id}"));
		}
	}
}
