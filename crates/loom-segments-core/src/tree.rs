// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The segment filter tree.
//!
//! A [`FilterTree`] is a version tag plus a root [`Group`]. Groups combine
//! their children with AND/OR; children are either [`Condition`] leaves or
//! nested groups. Parent/child links are plain containment and every node
//! carries a [`NodeId`] used to address it from the outside.
//!
//! Trees are value snapshots. Every mutation takes `&self` and returns a new
//! tree, so holders of an older snapshot never observe a partial edit and
//! undo is a matter of keeping the previous value (see
//! [`TreeHistory`](crate::TreeHistory)).
//!
//! Id-addressed operations search depth-first, children in order, and act on
//! the first match. Ids are expected to be unique; duplicates are reported
//! by [`validate_filter_tree`](crate::validate_filter_tree) but not rejected
//! here. An id that matches nothing leaves the tree unchanged.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::codec::deserialize_object;
use crate::config::FilterLimits;
use crate::error::SegmentsError;
use crate::operator::{ConditionOperator, ConditionValue, GroupOperator};
use crate::NodeId;

/// Current version of the tree wire format.
pub const TREE_VERSION: u32 = 1;

/// Discriminates the two node variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
	Group,
	Condition,
}

/// A child of a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterNode {
	Group(Group),
	Condition(Condition),
}

impl FilterNode {
	pub fn id(&self) -> &NodeId {
		match self {
			Self::Group(g) => &g.id,
			Self::Condition(c) => &c.id,
		}
	}

	pub fn kind(&self) -> NodeKind {
		match self {
			Self::Group(_) => NodeKind::Group,
			Self::Condition(_) => NodeKind::Condition,
		}
	}

	pub fn is_group(&self) -> bool {
		matches!(self, Self::Group(_))
	}

	pub fn is_condition(&self) -> bool {
		matches!(self, Self::Condition(_))
	}

	pub fn as_group(&self) -> Option<&Group> {
		match self {
			Self::Group(g) => Some(g),
			Self::Condition(_) => None,
		}
	}

	pub fn as_condition(&self) -> Option<&Condition> {
		match self {
			Self::Condition(c) => Some(c),
			Self::Group(_) => None,
		}
	}

	/// Group levels below and including this node: 0 for a condition.
	pub fn nesting_depth(&self) -> usize {
		match self {
			Self::Group(g) => g.nesting_depth(),
			Self::Condition(_) => 0,
		}
	}

	/// Number of condition leaves: 1 for a condition.
	pub fn condition_count(&self) -> usize {
		match self {
			Self::Group(g) => g.condition_count(),
			Self::Condition(_) => 1,
		}
	}
}

impl From<Group> for FilterNode {
	fn from(group: Group) -> Self {
		Self::Group(group)
	}
}

impl From<Condition> for FilterNode {
	fn from(condition: Condition) -> Self {
		Self::Condition(condition)
	}
}

/// A borrowed node returned by lookups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
	Group(&'a Group),
	Condition(&'a Condition),
}

impl<'a> NodeRef<'a> {
	pub fn id(&self) -> &'a NodeId {
		match self {
			Self::Group(g) => &g.id,
			Self::Condition(c) => &c.id,
		}
	}

	pub fn kind(&self) -> NodeKind {
		match self {
			Self::Group(_) => NodeKind::Group,
			Self::Condition(_) => NodeKind::Condition,
		}
	}

	pub fn as_group(&self) -> Option<&'a Group> {
		match self {
			Self::Group(g) => Some(g),
			Self::Condition(_) => None,
		}
	}

	pub fn as_condition(&self) -> Option<&'a Condition> {
		match self {
			Self::Condition(c) => Some(c),
			Self::Group(_) => None,
		}
	}
}

/// An AND/OR group of conditions and nested groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
	pub id: NodeId,
	pub operator: GroupOperator,
	/// Order is significant and preserved by every mutation.
	pub children: Vec<FilterNode>,
}

#[derive(Deserialize)]
struct GroupWire {
	id: NodeId,
	operator: GroupOperator,
	#[serde(default)]
	children: Vec<FilterNode>,
}

impl<'de> Deserialize<'de> for Group {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let wire: GroupWire = deserialize_object(deserializer, "a filter group object")?;
		Ok(Self {
			id: wire.id,
			operator: wire.operator,
			children: wire.children,
		})
	}
}

impl Group {
	/// Creates an empty group with a fresh id.
	pub fn new(operator: GroupOperator) -> Self {
		Self {
			id: NodeId::new(),
			operator,
			children: Vec::new(),
		}
	}

	/// Sets the id (builder pattern).
	pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
		self.id = id.into();
		self
	}

	/// Appends a child (builder pattern).
	pub fn with_child(mut self, child: impl Into<FilterNode>) -> Self {
		self.children.push(child.into());
		self
	}

	pub fn is_empty(&self) -> bool {
		self.children.is_empty()
	}

	/// Number of direct children.
	pub fn child_count(&self) -> usize {
		self.children.len()
	}

	/// `1 + max(child depths)`, so an empty group has depth 1.
	pub fn nesting_depth(&self) -> usize {
		1 + self
			.children
			.iter()
			.map(FilterNode::nesting_depth)
			.max()
			.unwrap_or(0)
	}

	/// Total condition leaves across all nested groups.
	pub fn condition_count(&self) -> usize {
		self.children.iter().map(FilterNode::condition_count).sum()
	}

	/// All condition leaves, depth-first in child order.
	pub fn conditions(&self) -> Vec<&Condition> {
		let mut out = Vec::new();
		self.collect_conditions(&mut out);
		out
	}

	fn collect_conditions<'a>(&'a self, out: &mut Vec<&'a Condition>) {
		for child in &self.children {
			match child {
				FilterNode::Condition(c) => out.push(c),
				FilterNode::Group(g) => g.collect_conditions(out),
			}
		}
	}

	/// Finds the first node with `id`, considering this group first.
	pub fn find(&self, id: &NodeId) -> Option<NodeRef<'_>> {
		if self.id == *id {
			return Some(NodeRef::Group(self));
		}
		for child in &self.children {
			match child {
				FilterNode::Condition(c) if c.id == *id => return Some(NodeRef::Condition(c)),
				FilterNode::Condition(_) => {}
				FilterNode::Group(g) => {
					if let Some(found) = g.find(id) {
						return Some(found);
					}
				}
			}
		}
		None
	}

	/// Depth of the group with `id` relative to this group (this group is 0).
	pub fn depth_of(&self, id: &NodeId) -> Option<usize> {
		if self.id == *id {
			return Some(0);
		}
		self.children
			.iter()
			.filter_map(FilterNode::as_group)
			.find_map(|g| g.depth_of(id))
			.map(|depth| depth + 1)
	}

	/// Finds the first group with `id`, considering this group first.
	pub fn find_group(&self, id: &NodeId) -> Option<&Group> {
		if self.id == *id {
			return Some(self);
		}
		self.children
			.iter()
			.filter_map(FilterNode::as_group)
			.find_map(|g| g.find_group(id))
	}

	fn find_group_mut(&mut self, id: &NodeId) -> Option<&mut Group> {
		if self.id == *id {
			return Some(self);
		}
		for child in self.children.iter_mut() {
			if let FilterNode::Group(g) = child {
				if let Some(found) = g.find_group_mut(id) {
					return Some(found);
				}
			}
		}
		None
	}

	/// Finds the first condition with `id` in traversal order. A group
	/// sharing the id does not stop the search.
	fn find_condition_mut(&mut self, id: &NodeId) -> Option<&mut Condition> {
		for child in self.children.iter_mut() {
			match child {
				FilterNode::Condition(c) => {
					if c.id == *id {
						return Some(c);
					}
				}
				FilterNode::Group(g) => {
					if let Some(found) = g.find_condition_mut(id) {
						return Some(found);
					}
				}
			}
		}
		None
	}

	fn remove_condition(&mut self, id: &NodeId) -> bool {
		for index in 0..self.children.len() {
			let hit = matches!(&self.children[index], FilterNode::Condition(c) if c.id == *id);
			if hit {
				self.children.remove(index);
				return true;
			}
			if let FilterNode::Group(g) = &mut self.children[index] {
				if g.remove_condition(id) {
					return true;
				}
			}
		}
		false
	}

	/// Removes the first descendant group with `id`. This group itself is
	/// never removed.
	fn remove_group(&mut self, id: &NodeId) -> bool {
		for index in 0..self.children.len() {
			let hit = matches!(&self.children[index], FilterNode::Group(g) if g.id == *id);
			if hit {
				self.children.remove(index);
				return true;
			}
			if let FilterNode::Group(g) = &mut self.children[index] {
				if g.remove_group(id) {
					return true;
				}
			}
		}
		false
	}
}

impl Default for Group {
	fn default() -> Self {
		Self::new(GroupOperator::And)
	}
}

/// A single dimension test.
///
/// Negation is carried by the operator (`is_not`, `not_equals`, ...). The
/// wire format's `negated` flag is always written as `false`; a `true` read
/// from the wire is folded into the operator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "ConditionWire")]
pub struct Condition {
	pub id: NodeId,
	/// Dimension being filtered, e.g. `visit:country`.
	pub attribute: String,
	pub operator: ConditionOperator,
	/// `None` for boolean operators.
	pub value: Option<ConditionValue>,
}

impl Condition {
	/// Creates a condition with a fresh id.
	pub fn new(
		attribute: impl Into<String>,
		operator: ConditionOperator,
		value: impl Into<ConditionValue>,
	) -> Self {
		Self {
			id: NodeId::new(),
			attribute: attribute.into(),
			operator,
			value: Some(value.into()),
		}
	}

	/// Creates a condition for an operator that takes no value.
	pub fn boolean(attribute: impl Into<String>, operator: ConditionOperator) -> Self {
		Self {
			id: NodeId::new(),
			attribute: attribute.into(),
			operator,
			value: None,
		}
	}

	/// Sets the id (builder pattern).
	pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
		self.id = id.into();
		self
	}

	/// Merges the fields present in `update`, leaving the rest untouched.
	pub fn apply(&mut self, update: &ConditionUpdate) {
		if let Some(attribute) = &update.attribute {
			self.attribute = attribute.clone();
		}
		if let Some(operator) = &update.operator {
			self.operator = operator.clone();
		}
		if let Some(value) = &update.value {
			self.value = value.clone();
		}
	}
}

/// Empty attribute, `is`, empty value: what the editor inserts for a new row.
impl Default for Condition {
	fn default() -> Self {
		Self::new("", ConditionOperator::Is, "")
	}
}

#[derive(Serialize, Deserialize)]
struct ConditionWire {
	id: NodeId,
	#[serde(alias = "field", alias = "dimension")]
	attribute: String,
	operator: ConditionOperator,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	value: Option<ConditionValue>,
	#[serde(default)]
	negated: bool,
}

impl<'de> Deserialize<'de> for Condition {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let wire: ConditionWire = deserialize_object(deserializer, "a filter condition object")?;
		Condition::try_from(wire).map_err(serde::de::Error::custom)
	}
}

impl TryFrom<ConditionWire> for Condition {
	type Error = SegmentsError;

	fn try_from(wire: ConditionWire) -> Result<Self, Self::Error> {
		let operator = if wire.negated {
			wire.operator
				.negate()
				.ok_or_else(|| SegmentsError::NotNegatable(wire.operator.to_string()))?
		} else {
			wire.operator
		};
		Ok(Self {
			id: wire.id,
			attribute: wire.attribute,
			operator,
			value: wire.value,
		})
	}
}

impl From<Condition> for ConditionWire {
	fn from(condition: Condition) -> Self {
		Self {
			id: condition.id,
			attribute: condition.attribute,
			operator: condition.operator,
			value: condition.value,
			negated: false,
		}
	}
}

/// A partial update of a condition. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionUpdate {
	pub attribute: Option<String>,
	pub operator: Option<ConditionOperator>,
	/// `Some(None)` clears the value.
	pub value: Option<Option<ConditionValue>>,
}

impl ConditionUpdate {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn attribute(mut self, attribute: impl Into<String>) -> Self {
		self.attribute = Some(attribute.into());
		self
	}

	pub fn operator(mut self, operator: ConditionOperator) -> Self {
		self.operator = Some(operator);
		self
	}

	pub fn value(mut self, value: impl Into<ConditionValue>) -> Self {
		self.value = Some(Some(value.into()));
		self
	}

	pub fn clear_value(mut self) -> Self {
		self.value = Some(None);
		self
	}
}

/// A versioned filter tree with a single root group. Only a JSON object
/// decodes as a tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterTree {
	pub version: u32,
	#[serde(with = "root_group")]
	pub root: Group,
}

#[derive(Deserialize)]
struct FilterTreeWire {
	version: u32,
	#[serde(with = "root_group")]
	root: Group,
}

impl<'de> Deserialize<'de> for FilterTree {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let wire: FilterTreeWire = deserialize_object(deserializer, "a filter tree object")?;
		Ok(Self {
			version: wire.version,
			root: wire.root,
		})
	}
}

impl FilterTree {
	/// Creates an empty tree: version 1, empty AND root.
	pub fn new() -> Self {
		Self::from_root(Group::new(GroupOperator::And))
	}

	pub fn from_root(root: Group) -> Self {
		Self {
			version: TREE_VERSION,
			root,
		}
	}

	pub fn root_id(&self) -> &NodeId {
		&self.root.id
	}

	/// Appends `condition` to the group with `group_id`.
	pub fn add_condition(&self, group_id: &NodeId, condition: Condition) -> FilterTree {
		self.edit_group(group_id, |group| {
			group.children.push(FilterNode::Condition(condition))
		})
	}

	/// Removes the first condition with `condition_id`.
	pub fn remove_condition(&self, condition_id: &NodeId) -> FilterTree {
		let mut next = self.clone();
		if !next.root.remove_condition(condition_id) {
			debug!(condition_id = %condition_id, "condition not found, tree unchanged");
		}
		next
	}

	/// Merges `update` into the first condition with `condition_id`.
	pub fn update_condition(&self, condition_id: &NodeId, update: &ConditionUpdate) -> FilterTree {
		let mut next = self.clone();
		match next.root.find_condition_mut(condition_id) {
			Some(condition) => condition.apply(update),
			None => debug!(condition_id = %condition_id, "condition not found, tree unchanged"),
		}
		next
	}

	/// Appends `group` as a child of the group with `parent_id`.
	pub fn add_group(&self, parent_id: &NodeId, group: Group) -> FilterTree {
		self.edit_group(parent_id, |parent| parent.children.push(FilterNode::Group(group)))
	}

	/// Removes the first non-root group with `group_id`, with its subtree.
	/// Targeting the root is a no-op.
	pub fn remove_group(&self, group_id: &NodeId) -> FilterTree {
		let mut next = self.clone();
		if next.root.id == *group_id {
			debug!(group_id = %group_id, "root group cannot be removed");
		} else if !next.root.remove_group(group_id) {
			debug!(group_id = %group_id, "group not found, tree unchanged");
		}
		next
	}

	/// Sets the AND/OR operator of the group with `group_id`.
	pub fn update_group_operator(&self, group_id: &NodeId, operator: GroupOperator) -> FilterTree {
		self.edit_group(group_id, |group| group.operator = operator)
	}

	fn edit_group(&self, group_id: &NodeId, edit: impl FnOnce(&mut Group)) -> FilterTree {
		let mut next = self.clone();
		match next.root.find_group_mut(group_id) {
			Some(group) => edit(group),
			None => debug!(group_id = %group_id, "group not found, tree unchanged"),
		}
		next
	}

	/// Finds the first group or condition with `id`.
	pub fn find_node(&self, id: &NodeId) -> Option<NodeRef<'_>> {
		self.root.find(id)
	}

	/// Finds the first group with `id`.
	pub fn find_group(&self, id: &NodeId) -> Option<&Group> {
		self.root.find_group(id)
	}

	/// Number of group boundaries between the root and the group with
	/// `group_id`. The root is at depth 0.
	pub fn group_depth(&self, group_id: &NodeId) -> Option<usize> {
		self.root.depth_of(group_id)
	}

	/// Total condition leaves in the tree.
	pub fn condition_count(&self) -> usize {
		self.root.condition_count()
	}

	/// All condition leaves, depth-first in child order.
	pub fn conditions(&self) -> Vec<&Condition> {
		self.root.conditions()
	}

	/// Returns true if another condition fits under the default tree limits.
	pub fn can_add_condition(&self) -> bool {
		self.can_add_condition_within(&FilterLimits::tree())
	}

	/// Returns true unless the tree already holds `max_conditions` leaves.
	pub fn can_add_condition_within(&self, limits: &FilterLimits) -> bool {
		match limits.max_conditions {
			Some(max) => self.condition_count() < max,
			None => true,
		}
	}

	/// Returns true if a group may be nested under `group_id` within the
	/// default tree limits.
	pub fn can_add_group(&self, group_id: &NodeId) -> bool {
		self.can_add_group_within(group_id, &FilterLimits::tree())
	}

	/// Returns true iff a child group of `group_id` would sit at a depth of at
	/// most `limits.max_depth`. False when the group does not exist.
	pub fn can_add_group_within(&self, group_id: &NodeId, limits: &FilterLimits) -> bool {
		self.group_depth(group_id)
			.is_some_and(|depth| depth < limits.max_depth)
	}

	/// Returns true if the group with `group_id` is below the default fan-out
	/// limit.
	pub fn can_add_child(&self, group_id: &NodeId) -> bool {
		self.can_add_child_within(group_id, &FilterLimits::tree())
	}

	pub fn can_add_child_within(&self, group_id: &NodeId, limits: &FilterLimits) -> bool {
		self.find_group(group_id)
			.is_some_and(|group| group.child_count() < limits.max_children)
	}
}

impl Default for FilterTree {
	fn default() -> Self {
		Self::new()
	}
}

/// The root is written with its `"type": "group"` tag like any other group,
/// and a root tagged as anything else is rejected.
mod root_group {
	use serde::{Deserialize, Deserializer, Serialize, Serializer};

	use super::Group;

	#[derive(Serialize)]
	#[serde(tag = "type", rename_all = "snake_case")]
	enum RootRef<'a> {
		Group(&'a Group),
	}

	#[derive(Deserialize)]
	#[serde(tag = "type", rename_all = "snake_case")]
	enum RootOwned {
		Group(Group),
	}

	pub fn serialize<S: Serializer>(group: &Group, serializer: S) -> Result<S::Ok, S::Error> {
		RootRef::Group(group).serialize(serializer)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Group, D::Error> {
		let RootOwned::Group(group) = RootOwned::deserialize(deserializer)?;
		Ok(group)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn country(value: &str) -> Condition {
		Condition::new("visit:country", ConditionOperator::Is, value)
	}

	/// root(AND) -> [c1, g1(OR) -> [c2, g2(AND) -> [c3]]]
	fn sample_tree() -> FilterTree {
		let g2 = Group::new(GroupOperator::And)
			.with_id("g2")
			.with_child(country("DE").with_id("c3"));
		let g1 = Group::new(GroupOperator::Or)
			.with_id("g1")
			.with_child(country("FR").with_id("c2"))
			.with_child(g2);
		let root = Group::new(GroupOperator::And)
			.with_id("root")
			.with_child(country("US").with_id("c1"))
			.with_child(g1);
		FilterTree::from_root(root)
	}

	fn chain(depth: usize) -> (FilterTree, NodeId) {
		let mut tree = FilterTree::new();
		let mut parent = tree.root_id().clone();
		for _ in 0..depth {
			let group = Group::default();
			let id = group.id.clone();
			tree = tree.add_group(&parent, group);
			parent = id;
		}
		(tree, parent)
	}

	#[test]
	fn test_empty_tree() {
		let tree = FilterTree::new();
		assert_eq!(tree.version, TREE_VERSION);
		assert_eq!(tree.root.operator, GroupOperator::And);
		assert!(tree.root.is_empty());
		assert_eq!(tree.condition_count(), 0);
	}

	#[test]
	fn test_fresh_nodes_have_distinct_ids() {
		assert_ne!(Group::default().id, Group::default().id);
		assert_ne!(Condition::default().id, Condition::default().id);
	}

	#[test]
	fn test_condition_defaults() {
		let c = Condition::default();
		assert_eq!(c.attribute, "");
		assert_eq!(c.operator, ConditionOperator::Is);
		assert_eq!(c.value, Some(ConditionValue::from("")));
	}

	#[test]
	fn test_add_condition_leaves_original_untouched() {
		let tree = FilterTree::new();
		let root_id = tree.root_id().clone();
		let next = tree.add_condition(&root_id, country("US"));

		assert_eq!(tree.root.child_count(), 0);
		assert_eq!(next.root.child_count(), 1);
	}

	#[test]
	fn test_add_condition_to_nested_group() {
		let tree = sample_tree();
		let next = tree.add_condition(&NodeId::from("g2"), country("IT").with_id("c4"));
		let g2 = next.find_group(&NodeId::from("g2")).unwrap();
		assert_eq!(g2.child_count(), 2);
		assert_eq!(g2.children[1].id(), &NodeId::from("c4"));
	}

	#[test]
	fn test_add_condition_unknown_group_is_noop() {
		let tree = sample_tree();
		let next = tree.add_condition(&NodeId::from("missing"), country("IT"));
		assert_eq!(next, tree);
	}

	#[test]
	fn test_add_condition_to_condition_id_is_noop() {
		let tree = sample_tree();
		let next = tree.add_condition(&NodeId::from("c1"), country("IT"));
		assert_eq!(next, tree);
	}

	#[test]
	fn test_remove_condition() {
		let tree = sample_tree();
		let next = tree.remove_condition(&NodeId::from("c3"));
		assert_eq!(next.condition_count(), 2);
		assert!(next.find_node(&NodeId::from("c3")).is_none());
		assert!(next.find_group(&NodeId::from("g2")).unwrap().is_empty());
		assert_eq!(tree.condition_count(), 3);
	}

	#[test]
	fn test_remove_condition_stops_at_first_match() {
		let root = Group::new(GroupOperator::And)
			.with_child(country("US").with_id("dup"))
			.with_child(Group::default().with_child(country("FR").with_id("dup")));
		let tree = FilterTree::from_root(root);

		let next = tree.remove_condition(&NodeId::from("dup"));
		assert_eq!(next.condition_count(), 1);
		assert_eq!(next.conditions()[0].value, Some(ConditionValue::from("FR")));
	}

	#[test]
	fn test_remove_condition_ignores_groups_with_same_id() {
		let tree = sample_tree();
		let next = tree.remove_condition(&NodeId::from("g1"));
		assert_eq!(next, tree);
	}

	#[test]
	fn test_update_condition_merges_fields() {
		let tree = sample_tree();
		let update = ConditionUpdate::new().operator(ConditionOperator::IsNot);
		let next = tree.update_condition(&NodeId::from("c2"), &update);

		let c2 = next
			.find_node(&NodeId::from("c2"))
			.and_then(|n| n.as_condition())
			.unwrap();
		assert_eq!(c2.operator, ConditionOperator::IsNot);
		assert_eq!(c2.attribute, "visit:country");
		assert_eq!(c2.value, Some(ConditionValue::from("FR")));
	}

	#[test]
	fn test_update_condition_can_clear_value() {
		let tree = sample_tree();
		let update = ConditionUpdate::new()
			.attribute("user:verified")
			.operator(ConditionOperator::IsTrue)
			.clear_value();
		let next = tree.update_condition(&NodeId::from("c1"), &update);

		let c1 = next
			.find_node(&NodeId::from("c1"))
			.and_then(|n| n.as_condition())
			.unwrap();
		assert_eq!(c1.attribute, "user:verified");
		assert_eq!(c1.value, None);
	}

	#[test]
	fn test_add_and_remove_group() {
		let tree = sample_tree();
		let group = Group::new(GroupOperator::Or).with_id("g3");
		let next = tree.add_group(&NodeId::from("g1"), group);
		assert_eq!(next.group_depth(&NodeId::from("g3")), Some(2));

		let removed = next.remove_group(&NodeId::from("g1"));
		assert!(removed.find_node(&NodeId::from("g1")).is_none());
		assert!(removed.find_node(&NodeId::from("g3")).is_none());
		assert_eq!(removed.condition_count(), 1);
	}

	#[test]
	fn test_remove_root_is_noop() {
		let tree = sample_tree();
		let next = tree.remove_group(&NodeId::from("root"));
		assert_eq!(next, tree);
	}

	#[test]
	fn test_update_group_operator() {
		let tree = sample_tree();
		let next = tree.update_group_operator(&NodeId::from("root"), GroupOperator::Or);
		assert_eq!(next.root.operator, GroupOperator::Or);
		assert_eq!(tree.root.operator, GroupOperator::And);

		let next = tree.update_group_operator(&NodeId::from("c1"), GroupOperator::Or);
		assert_eq!(next, tree);
	}

	#[test]
	fn test_find_node() {
		let tree = sample_tree();
		assert_eq!(
			tree.find_node(&NodeId::from("root")).map(|n| n.kind()),
			Some(NodeKind::Group)
		);
		assert_eq!(
			tree.find_node(&NodeId::from("c3")).map(|n| n.kind()),
			Some(NodeKind::Condition)
		);
		assert!(tree.find_node(&NodeId::from("nope")).is_none());
	}

	#[test]
	fn test_group_depth() {
		let tree = sample_tree();
		assert_eq!(tree.group_depth(&NodeId::from("root")), Some(0));
		assert_eq!(tree.group_depth(&NodeId::from("g1")), Some(1));
		assert_eq!(tree.group_depth(&NodeId::from("g2")), Some(2));
		assert_eq!(tree.group_depth(&NodeId::from("c1")), None);
	}

	#[test]
	fn test_nesting_depth() {
		assert_eq!(Group::default().nesting_depth(), 1);
		assert_eq!(FilterNode::from(country("US")).nesting_depth(), 0);
		assert_eq!(sample_tree().root.nesting_depth(), 3);
	}

	#[test]
	fn test_condition_count_is_recursive() {
		let nested = Group::default()
			.with_child(country("FR"))
			.with_child(country("DE"));
		let root = Group::default().with_child(country("US")).with_child(nested);
		let tree = FilterTree::from_root(root);
		assert_eq!(tree.condition_count(), 3);
		assert_eq!(tree.conditions().len(), 3);
	}

	#[test]
	fn test_conditions_in_traversal_order() {
		let ids: Vec<_> = sample_tree()
			.conditions()
			.iter()
			.map(|c| c.id.to_string())
			.collect();
		assert_eq!(ids, vec!["c1", "c2", "c3"]);
	}

	#[test]
	fn test_can_add_group_boundary() {
		let (tree, deepest) = chain(4);
		assert_eq!(tree.group_depth(&deepest), Some(4));
		assert!(tree.can_add_group(&deepest));

		let (tree, deepest) = chain(5);
		assert_eq!(tree.group_depth(&deepest), Some(5));
		assert!(!tree.can_add_group(&deepest));
	}

	#[test]
	fn test_can_add_group_unknown_id() {
		assert!(!FilterTree::new().can_add_group(&NodeId::from("missing")));
	}

	#[test]
	fn test_can_add_condition_with_cap() {
		let tree = sample_tree();
		assert!(tree.can_add_condition());

		let limits = FilterLimits {
			max_conditions: Some(3),
			..FilterLimits::tree()
		};
		assert!(!tree.can_add_condition_within(&limits));
	}

	#[test]
	fn test_can_add_child_fan_out() {
		let mut tree = FilterTree::new();
		let root_id = tree.root_id().clone();
		for _ in 0..9 {
			tree = tree.add_condition(&root_id, country("US"));
		}
		assert!(tree.can_add_child(&root_id));
		tree = tree.add_condition(&root_id, country("US"));
		assert!(!tree.can_add_child(&root_id));
	}

	#[test]
	fn test_node_classification() {
		let condition = FilterNode::from(country("US"));
		let group = FilterNode::from(Group::default());
		assert!(condition.is_condition() && !condition.is_group());
		assert!(group.is_group() && !group.is_condition());
	}

	#[test]
	fn test_wire_shape() {
		let tree = FilterTree::from_root(
			Group::new(GroupOperator::And)
				.with_id("root")
				.with_child(country("US").with_id("c1")),
		);
		let json = serde_json::to_value(&tree).unwrap();
		assert_eq!(
			json,
			serde_json::json!({
				"version": 1,
				"root": {
					"type": "group",
					"id": "root",
					"operator": "and",
					"children": [{
						"type": "condition",
						"id": "c1",
						"attribute": "visit:country",
						"operator": "is",
						"value": "US",
						"negated": false
					}]
				}
			})
		);
	}

	#[test]
	fn test_negated_flag_folds_into_operator() {
		let json = serde_json::json!({
			"type": "condition",
			"id": "c1",
			"attribute": "visit:country",
			"operator": "is",
			"value": "US",
			"negated": true
		});
		let node: FilterNode = serde_json::from_value(json).unwrap();
		let condition = node.as_condition().unwrap();
		assert_eq!(condition.operator, ConditionOperator::IsNot);
	}

	#[test]
	fn test_negated_flag_rejected_without_counterpart() {
		let json = serde_json::json!({
			"type": "condition",
			"id": "c1",
			"attribute": "event:goal",
			"operator": "has_not_done",
			"value": ["Signup"],
			"negated": true
		});
		assert!(serde_json::from_value::<FilterNode>(json).is_err());
	}

	#[test]
	fn test_field_alias_accepted() {
		let json = serde_json::json!({
			"type": "condition",
			"id": "c1",
			"field": "plan",
			"operator": "equals",
			"value": "pro"
		});
		let node: FilterNode = serde_json::from_value(json).unwrap();
		assert_eq!(node.as_condition().unwrap().attribute, "plan");
	}

	#[test]
	fn test_root_must_be_group() {
		let json = serde_json::json!({
			"version": 1,
			"root": {"type": "condition", "id": "c1", "attribute": "a", "operator": "is", "value": "x"}
		});
		assert!(serde_json::from_value::<FilterTree>(json).is_err());
	}

	#[test]
	fn test_nodes_must_be_objects() {
		for json in [
			serde_json::json!(["group", "g1", "and", []]),
			serde_json::json!(["condition", "c1", "plan", "is", "pro", false]),
		] {
			assert!(
				serde_json::from_value::<FilterNode>(json.clone()).is_err(),
				"{json} should not decode as a node"
			);
		}

		let json = serde_json::json!({"version": 1, "root": ["group", "r", "and", []]});
		assert!(serde_json::from_value::<FilterTree>(json).is_err());

		let json = serde_json::json!([1, {"type": "group", "id": "r", "operator": "and", "children": []}]);
		assert!(serde_json::from_value::<FilterTree>(json).is_err());

		let json = serde_json::json!({"version": 1, "root": {
			"type": "group", "id": "r", "operator": "and",
			"children": [["condition", "c1", "plan", "is", "pro", false]]
		}});
		assert!(serde_json::from_value::<FilterTree>(json).is_err());
	}

	fn arb_condition() -> impl Strategy<Value = Condition> {
		(
			"[a-z]{1,8}:[a-z]{1,8}",
			0usize..19,
			prop_oneof![
				"[a-zA-Z0-9 ]{0,12}".prop_map(ConditionValue::Text),
				prop::collection::vec("[a-z]{1,6}", 1..4).prop_map(ConditionValue::List),
				any::<i64>().prop_map(ConditionValue::from),
				any::<bool>().prop_map(ConditionValue::Bool),
			],
		)
			.prop_map(|(attribute, op, value)| {
				Condition::new(attribute, ConditionOperator::KNOWN[op].clone(), value)
			})
	}

	fn arb_group() -> impl Strategy<Value = Group> {
		let leaf = arb_condition().prop_map(FilterNode::Condition);
		let node = leaf.prop_recursive(4, 32, 5, |inner| {
			(
				prop_oneof![Just(GroupOperator::And), Just(GroupOperator::Or)],
				prop::collection::vec(inner, 0..5),
			)
				.prop_map(|(operator, children)| {
					FilterNode::Group(Group {
						children,
						..Group::new(operator)
					})
				})
		});
		prop::collection::vec(node, 0..5).prop_map(|children| Group {
			children,
			..Group::default()
		})
	}

	proptest! {
		#[test]
		fn tree_serde_roundtrip(root in arb_group()) {
			let tree = FilterTree::from_root(root);
			let json = serde_json::to_string(&tree).unwrap();
			let parsed: FilterTree = serde_json::from_str(&json).unwrap();
			prop_assert_eq!(parsed, tree);
		}

		#[test]
		fn condition_count_is_sum_of_children(root in arb_group()) {
			let sum: usize = root.children.iter().map(FilterNode::condition_count).sum();
			prop_assert_eq!(root.condition_count(), sum);
			prop_assert_eq!(root.conditions().len(), sum);
		}

		#[test]
		fn add_then_remove_restores_tree(root in arb_group()) {
			let tree = FilterTree::from_root(root);
			let condition = Condition::default();
			let id = condition.id.clone();
			let added = tree.add_condition(tree.root_id(), condition);
			prop_assert_eq!(added.condition_count(), tree.condition_count() + 1);
			prop_assert_eq!(added.remove_condition(&id), tree);
		}

		#[test]
		fn nesting_depth_is_one_plus_max_child(root in arb_group()) {
			let expected = 1 + root
				.children
				.iter()
				.map(FilterNode::nesting_depth)
				.max()
				.unwrap_or(0);
			prop_assert_eq!(root.nesting_depth(), expected);
		}
	}
}
