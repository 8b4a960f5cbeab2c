// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The legacy tuple filter format.
//!
//! Older dashboards encode a leaf as `[operator, dimension, clauses]` and a
//! group as `{ "filter_type": "and" | "or", "children": [...] }`. A top-level
//! AND of plain leaves travels as a bare list of tuples (the flat form).
//!
//! ```json
//! { "filter_type": "and", "children": [
//!     ["is", "visit:country", ["US", "CA"]],
//!     { "filter_type": "or", "children": [
//!         ["contains", "event:page", ["/blog"]],
//!         ["is_not", "visit:source", ["Google"]]
//!     ]}
//! ]}
//! ```
//!
//! Conversion to the flat form is lossy for OR groups, which are carried
//! through unchanged inside the flat list.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeTuple, Serializer};
use serde::{Deserialize, Serialize};

use crate::codec::deserialize_object;
use crate::config::FilterLimits;
use crate::error::{Result, SegmentsError};
use crate::operator::{ConditionOperator, ConditionValue, GroupOperator};
use crate::tree::{Condition, FilterNode, FilterTree, Group, NodeKind};
use crate::NodeId;

/// A leaf tuple: `[operator, dimension, clauses]`.
///
/// The operator is kept as text; whether it is a recognized legacy operator
/// is a validation concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCondition {
	pub operator: String,
	pub dimension: String,
	pub clauses: Vec<String>,
}

impl FilterCondition {
	pub fn new<I, S>(operator: impl Into<String>, dimension: impl Into<String>, clauses: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			operator: operator.into(),
			dimension: dimension.into(),
			clauses: clauses.into_iter().map(Into::into).collect(),
		}
	}

	/// Returns the operator if it belongs to the legacy vocabulary.
	pub fn legacy_operator(&self) -> Option<ConditionOperator> {
		let operator = ConditionOperator::from(self.operator.as_str());
		operator.is_legacy().then_some(operator)
	}
}

impl Serialize for FilterCondition {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		let mut tuple = serializer.serialize_tuple(3)?;
		tuple.serialize_element(&self.operator)?;
		tuple.serialize_element(&self.dimension)?;
		tuple.serialize_element(&self.clauses)?;
		tuple.end()
	}
}

impl<'de> Deserialize<'de> for FilterCondition {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
		let items = Vec::<serde_json::Value>::deserialize(deserializer)?;
		let [operator, dimension, clauses]: [serde_json::Value; 3] = items
			.try_into()
			.map_err(|items: Vec<_>| de::Error::invalid_length(items.len(), &"a 3-element tuple"))?;
		let operator = serde_json::from_value(operator).map_err(de::Error::custom)?;
		let dimension = serde_json::from_value(dimension).map_err(de::Error::custom)?;
		let clauses = serde_json::from_value(clauses).map_err(de::Error::custom)?;
		Ok(Self {
			operator,
			dimension,
			clauses,
		})
	}
}

/// An AND/OR group of legacy filters. Only a JSON object decodes as a
/// group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterGroup {
	pub filter_type: GroupOperator,
	pub children: Vec<FilterComposite>,
}

#[derive(Deserialize)]
struct FilterGroupWire {
	#[serde(alias = "operator")]
	filter_type: GroupOperator,
	children: Vec<FilterComposite>,
}

impl<'de> Deserialize<'de> for FilterGroup {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
		let wire: FilterGroupWire = deserialize_object(deserializer, "a filter group object")?;
		Ok(Self {
			filter_type: wire.filter_type,
			children: wire.children,
		})
	}
}

impl FilterGroup {
	pub fn new(filter_type: GroupOperator, children: Vec<FilterComposite>) -> Self {
		Self {
			filter_type,
			children,
		}
	}
}

/// Either a leaf tuple or a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterComposite {
	Condition(FilterCondition),
	Group(FilterGroup),
}

impl FilterComposite {
	pub fn kind(&self) -> NodeKind {
		match self {
			Self::Condition(_) => NodeKind::Condition,
			Self::Group(_) => NodeKind::Group,
		}
	}

	pub fn is_group(&self) -> bool {
		matches!(self, Self::Group(_))
	}

	pub fn is_condition(&self) -> bool {
		matches!(self, Self::Condition(_))
	}

	/// 0 for a bare condition, otherwise `1 + max(child depths)`.
	pub fn nesting_depth(&self) -> usize {
		match self {
			Self::Condition(_) => 0,
			Self::Group(g) => {
				1 + g
					.children
					.iter()
					.map(FilterComposite::nesting_depth)
					.max()
					.unwrap_or(0)
			}
		}
	}

	/// 1 for a bare condition, otherwise the number of direct children.
	pub fn child_count(&self) -> usize {
		match self {
			Self::Condition(_) => 1,
			Self::Group(g) => g.children.len(),
		}
	}

	pub fn is_valid_nesting_depth(&self) -> bool {
		self.is_valid_nesting_depth_within(&FilterLimits::legacy())
	}

	pub fn is_valid_nesting_depth_within(&self, limits: &FilterLimits) -> bool {
		self.nesting_depth() <= limits.max_depth
	}

	/// True iff no group at any level has more than the allowed children.
	pub fn is_valid_child_count(&self) -> bool {
		self.is_valid_child_count_within(&FilterLimits::legacy())
	}

	pub fn is_valid_child_count_within(&self, limits: &FilterLimits) -> bool {
		match self {
			Self::Condition(_) => true,
			Self::Group(g) => {
				g.children.len() <= limits.max_children
					&& g
						.children
						.iter()
						.all(|child| child.is_valid_child_count_within(limits))
			}
		}
	}

	/// Every leaf tuple, depth-first in child order.
	pub fn leaf_conditions(&self) -> Vec<&FilterCondition> {
		let mut out = Vec::new();
		self.collect_leaves(&mut out);
		out
	}

	fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a FilterCondition>) {
		match self {
			Self::Condition(c) => out.push(c),
			Self::Group(g) => {
				for child in &g.children {
					child.collect_leaves(out);
				}
			}
		}
	}
}

impl From<FilterCondition> for FilterComposite {
	fn from(condition: FilterCondition) -> Self {
		Self::Condition(condition)
	}
}

impl From<FilterGroup> for FilterComposite {
	fn from(group: FilterGroup) -> Self {
		Self::Group(group)
	}
}

/// Wraps a flat list of tuples in a single AND group.
pub fn flat_to_nested(conditions: Vec<FilterCondition>) -> FilterGroup {
	FilterGroup::new(
		GroupOperator::And,
		conditions.into_iter().map(FilterComposite::Condition).collect(),
	)
}

/// Flattens AND structure into a list.
///
/// An AND group contributes the flattened lists of its children in order; an
/// OR group cannot be flattened and is returned whole as a single element; a
/// bare condition is returned as a one-element list.
pub fn nested_to_flat(node: &FilterComposite) -> Vec<FilterComposite> {
	match node {
		FilterComposite::Condition(_) => vec![node.clone()],
		FilterComposite::Group(g) => match g.filter_type {
			GroupOperator::And => g.children.iter().flat_map(nested_to_flat).collect(),
			GroupOperator::Or => vec![node.clone()],
		},
	}
}

impl FilterTree {
	/// Encodes the tree in the legacy tuple format.
	///
	/// Fails for operators outside the legacy vocabulary and for boolean or
	/// numeric values, which have no clause encoding.
	pub fn to_legacy(&self) -> Result<FilterComposite> {
		group_to_legacy(&self.root).map(FilterComposite::Group)
	}

	/// Encodes the tree in the legacy flat form, see [`nested_to_flat`].
	pub fn to_flat(&self) -> Result<Vec<FilterComposite>> {
		Ok(nested_to_flat(&self.to_legacy()?))
	}

	/// Builds a tree from a legacy filter, assigning fresh ids. A bare
	/// top-level tuple is wrapped in an AND root.
	pub fn from_legacy(filter: &FilterComposite) -> FilterTree {
		match filter {
			FilterComposite::Group(g) => FilterTree::from_root(group_from_legacy(g)),
			FilterComposite::Condition(c) => FilterTree::from_root(
				Group::new(GroupOperator::And).with_child(condition_from_legacy(c)),
			),
		}
	}
}

fn group_to_legacy(group: &Group) -> Result<FilterGroup> {
	let children = group
		.children
		.iter()
		.map(|child| match child {
			FilterNode::Group(g) => group_to_legacy(g).map(FilterComposite::Group),
			FilterNode::Condition(c) => condition_to_legacy(c).map(FilterComposite::Condition),
		})
		.collect::<Result<Vec<_>>>()?;
	Ok(FilterGroup::new(group.operator, children))
}

fn condition_to_legacy(condition: &Condition) -> Result<FilterCondition> {
	if !condition.operator.is_legacy() {
		return Err(SegmentsError::UnsupportedLegacyOperator(
			condition.operator.to_string(),
		));
	}
	let clauses = match &condition.value {
		None => Vec::new(),
		Some(value) => value
			.to_clauses()
			.ok_or_else(|| SegmentsError::UnsupportedLegacyValue(condition.id.clone()))?,
	};
	Ok(FilterCondition {
		operator: condition.operator.to_string(),
		dimension: condition.attribute.clone(),
		clauses,
	})
}

fn group_from_legacy(group: &FilterGroup) -> Group {
	let children = group
		.children
		.iter()
		.map(|child| match child {
			FilterComposite::Group(g) => FilterNode::Group(group_from_legacy(g)),
			FilterComposite::Condition(c) => FilterNode::Condition(condition_from_legacy(c)),
		})
		.collect();
	Group {
		id: NodeId::new(),
		operator: group.filter_type,
		children,
	}
}

fn condition_from_legacy(condition: &FilterCondition) -> Condition {
	Condition {
		id: NodeId::new(),
		attribute: condition.dimension.clone(),
		operator: ConditionOperator::from(condition.operator.as_str()),
		value: Some(ConditionValue::List(condition.clauses.clone())),
	}
}
