// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for Loom analytics segment filters.
//!
//! A segment is described by a boolean filter tree: AND/OR groups holding
//! conditions and nested groups. This crate owns the tree model and the
//! operations the segment editor and the query layer share.
//!
//! # Overview
//!
//! - [`FilterTree`]: versioned tree with id-addressed, snapshot-returning
//!   mutations and depth/fan-out guards
//! - [`validate_filter_tree`]: collects every problem in a tree in one pass
//! - the legacy tuple format ([`FilterComposite`]) with flat/nested
//!   conversion and a bridge to and from trees
//! - JSON encoding for both formats ([`serialize_tree`], [`parse_tree`], ...)
//! - [`SegmentsConfig`]: layered limits, resolvable from TOML
//! - [`TreeHistory`]: bounded undo/redo over snapshots
//!
//! # Example
//!
//! ```
//! use loom_segments_core::{
//!     parse_tree, serialize_tree, validate_filter_tree, Condition, ConditionOperator,
//!     FilterTree, Group, GroupOperator,
//! };
//!
//! let tree = FilterTree::new();
//! let tree = tree.add_condition(
//!     tree.root_id(),
//!     Condition::new("visit:country", ConditionOperator::Is, "US"),
//! );
//!
//! let sub = Group::new(GroupOperator::Or);
//! let sub_id = sub.id.clone();
//! let tree = tree
//!     .add_group(tree.root_id(), sub)
//!     .add_condition(&sub_id, Condition::new("plan", ConditionOperator::Equals, "pro"))
//!     .add_condition(&sub_id, Condition::boolean("verified", ConditionOperator::IsTrue));
//!
//! assert_eq!(tree.condition_count(), 3);
//! assert!(validate_filter_tree(&tree).is_valid);
//!
//! let json = serialize_tree(&tree).unwrap();
//! assert_eq!(parse_tree(&json), Some(tree));
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod history;
pub mod id;
pub mod legacy;
pub mod operator;
pub mod tree;
pub mod validate;

pub use codec::{
	deserialize_filter, parse_tree, serialize_filter, serialize_tree, try_deserialize_filter,
	try_parse_tree,
};
pub use config::{
	FilterLimits, FilterLimitsLayer, SegmentsConfig, SegmentsConfigLayer, DEFAULT_HISTORY_CAPACITY,
	MAX_CHILDREN_PER_GROUP, MAX_GROUP_DEPTH, MAX_NESTING_DEPTH,
};
pub use error::{Result, SegmentsError};
pub use history::TreeHistory;
pub use id::NodeId;
pub use legacy::{flat_to_nested, nested_to_flat, FilterComposite, FilterCondition, FilterGroup};
pub use operator::{ConditionOperator, ConditionValue, GroupOperator, OperatorFamily, ValueArity};
pub use tree::{
	Condition, ConditionUpdate, FilterNode, FilterTree, Group, NodeKind, NodeRef, TREE_VERSION,
};
pub use validate::{
	is_valid_filter, is_valid_filter_json, validate_filter_tree, validate_filter_tree_within,
	ValidationResult,
};
