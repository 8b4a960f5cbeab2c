// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Structural limits for filter trees.
//!
//! Limits are resolved from partial layers, later layers winning field by
//! field, then filled with defaults and validated:
//!
//! ```toml
//! history_capacity = 50
//!
//! [tree]
//! max_depth = 3
//! max_conditions = 25
//!
//! [legacy]
//! max_children = 8
//! ```
//!
//! The crate never reads files or the environment itself; hosts pass the
//! TOML text to [`SegmentsConfig::from_toml_str`] or build layers directly.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SegmentsError};

/// Deepest group depth allowed in a tree, root being 0.
pub const MAX_GROUP_DEPTH: usize = 5;

/// Deepest nesting depth allowed in the legacy tuple format, a bare
/// condition being 0.
pub const MAX_NESTING_DEPTH: usize = 2;

/// Most direct children allowed in a single group.
pub const MAX_CHILDREN_PER_GROUP: usize = 10;

/// Snapshots kept for undo.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Limits applied to one wire format.
///
/// `max_depth` is measured the way the format measures it: group depth from
/// the root for trees, nesting depth for legacy filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterLimits {
	pub max_depth: usize,
	pub max_children: usize,
	/// Global cap on condition leaves; `None` is unbounded.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max_conditions: Option<usize>,
}

impl FilterLimits {
	pub const fn tree() -> Self {
		Self {
			max_depth: MAX_GROUP_DEPTH,
			max_children: MAX_CHILDREN_PER_GROUP,
			max_conditions: None,
		}
	}

	pub const fn legacy() -> Self {
		Self {
			max_depth: MAX_NESTING_DEPTH,
			max_children: MAX_CHILDREN_PER_GROUP,
			max_conditions: None,
		}
	}

	fn validate(&self, section: &str) -> Result<()> {
		if self.max_depth == 0 {
			return Err(SegmentsError::InvalidConfig(format!(
				"{section}.max_depth must be at least 1"
			)));
		}
		if self.max_children == 0 {
			return Err(SegmentsError::InvalidConfig(format!(
				"{section}.max_children must be at least 1"
			)));
		}
		if self.max_conditions == Some(0) {
			return Err(SegmentsError::InvalidConfig(format!(
				"{section}.max_conditions must be at least 1"
			)));
		}
		Ok(())
	}
}

impl Default for FilterLimits {
	fn default() -> Self {
		Self::tree()
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FilterLimitsLayer {
	pub max_depth: Option<usize>,
	pub max_children: Option<usize>,
	pub max_conditions: Option<usize>,
}

impl FilterLimitsLayer {
	pub fn merge(&mut self, other: Self) {
		if other.max_depth.is_some() {
			self.max_depth = other.max_depth;
		}
		if other.max_children.is_some() {
			self.max_children = other.max_children;
		}
		if other.max_conditions.is_some() {
			self.max_conditions = other.max_conditions;
		}
	}

	pub fn finalize(self, defaults: FilterLimits) -> FilterLimits {
		FilterLimits {
			max_depth: self.max_depth.unwrap_or(defaults.max_depth),
			max_children: self.max_children.unwrap_or(defaults.max_children),
			max_conditions: self.max_conditions.or(defaults.max_conditions),
		}
	}
}

/// Partial configuration, all fields optional for merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SegmentsConfigLayer {
	#[serde(default)]
	pub history_capacity: Option<usize>,
	#[serde(default)]
	pub tree: Option<FilterLimitsLayer>,
	#[serde(default)]
	pub legacy: Option<FilterLimitsLayer>,
}

impl SegmentsConfigLayer {
	pub fn merge(&mut self, other: Self) {
		merge_section(&mut self.tree, other.tree);
		merge_section(&mut self.legacy, other.legacy);
		if other.history_capacity.is_some() {
			self.history_capacity = other.history_capacity;
		}
	}

	/// Fills unset fields with defaults and validates the result.
	pub fn finalize(self) -> Result<SegmentsConfig> {
		let config = SegmentsConfig {
			history_capacity: self.history_capacity.unwrap_or(DEFAULT_HISTORY_CAPACITY),
			tree: self.tree.unwrap_or_default().finalize(FilterLimits::tree()),
			legacy: self
				.legacy
				.unwrap_or_default()
				.finalize(FilterLimits::legacy()),
		};

		if let Err(e) = config.validate() {
			warn!(error = %e, "rejecting segment filter configuration");
			return Err(e);
		}

		info!(
			tree_max_depth = config.tree.max_depth,
			tree_max_children = config.tree.max_children,
			tree_max_conditions = ?config.tree.max_conditions,
			legacy_max_depth = config.legacy.max_depth,
			legacy_max_children = config.legacy.max_children,
			history_capacity = config.history_capacity,
			"segment filter configuration resolved"
		);

		Ok(config)
	}
}

fn merge_section(base: &mut Option<FilterLimitsLayer>, other: Option<FilterLimitsLayer>) {
	match (base.as_mut(), other) {
		(Some(base), Some(other)) => base.merge(other),
		(None, Some(other)) => *base = Some(other),
		(_, None) => {}
	}
}

/// Fully resolved limits for both wire formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentsConfig {
	pub history_capacity: usize,
	pub tree: FilterLimits,
	pub legacy: FilterLimits,
}

impl SegmentsConfig {
	/// Resolves a single TOML document over the defaults.
	pub fn from_toml_str(s: &str) -> Result<Self> {
		let layer: SegmentsConfigLayer = toml::from_str(s)?;
		layer.finalize()
	}

	/// Merges `layers` in order and resolves the result.
	pub fn from_layers(layers: impl IntoIterator<Item = SegmentsConfigLayer>) -> Result<Self> {
		let mut merged = SegmentsConfigLayer::default();
		for layer in layers {
			merged.merge(layer);
		}
		merged.finalize()
	}

	fn validate(&self) -> Result<()> {
		self.tree.validate("tree")?;
		self.legacy.validate("legacy")?;
		if self.history_capacity == 0 {
			return Err(SegmentsError::InvalidConfig(
				"history_capacity must be at least 1".to_string(),
			));
		}
		Ok(())
	}
}

impl Default for SegmentsConfig {
	fn default() -> Self {
		Self {
			history_capacity: DEFAULT_HISTORY_CAPACITY,
			tree: FilterLimits::tree(),
			legacy: FilterLimits::legacy(),
		}
	}
}
