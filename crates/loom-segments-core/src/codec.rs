// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! JSON wire encoding for trees and legacy filters.
//!
//! The `parse_*`/`deserialize_*` functions return `None` on any failure so
//! callers handling untrusted input only check for absence; the `try_*`
//! variants carry the reason.

use std::fmt;
use std::marker::PhantomData;

use serde::de::value::MapAccessDeserializer;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use tracing::debug;

use crate::error::{Result, SegmentsError};
use crate::legacy::FilterComposite;
use crate::tree::{FilterTree, TREE_VERSION};

/// Encodes a tree as JSON.
pub fn serialize_tree(tree: &FilterTree) -> Result<String> {
	Ok(serde_json::to_string(tree)?)
}

/// Decodes a tree, requiring a supported `version` and a root tagged
/// `"type": "group"`.
pub fn try_parse_tree(json: &str) -> Result<FilterTree> {
	let tree: FilterTree = serde_json::from_str(json)?;
	if tree.version != TREE_VERSION {
		return Err(SegmentsError::UnsupportedVersion(tree.version));
	}
	Ok(tree)
}

/// Decodes a tree, returning `None` if the input is not a valid tree.
pub fn parse_tree(json: &str) -> Option<FilterTree> {
	match try_parse_tree(json) {
		Ok(tree) => Some(tree),
		Err(e) => {
			debug!(error = %e, "rejected filter tree JSON");
			None
		}
	}
}

/// Encodes a legacy filter as JSON.
pub fn serialize_filter(filter: &FilterComposite) -> Result<String> {
	Ok(serde_json::to_string(filter)?)
}

/// Decodes a legacy filter; input matching neither the group nor the tuple
/// shape is an error.
pub fn try_deserialize_filter(json: &str) -> Result<FilterComposite> {
	Ok(serde_json::from_str(json)?)
}

/// Decodes a legacy filter, returning `None` if the input has neither shape.
pub fn deserialize_filter(json: &str) -> Option<FilterComposite> {
	match try_deserialize_filter(json) {
		Ok(filter) => Some(filter),
		Err(e) => {
			debug!(error = %e, "rejected legacy filter JSON");
			None
		}
	}
}

/// Deserializes `T` from a JSON object only.
///
/// Derived struct impls also accept a sequence of field values, which would
/// let arrays such as `["and", []]` pass for groups.
pub(crate) fn deserialize_object<'de, D, T>(
	deserializer: D,
	expecting: &'static str,
) -> std::result::Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de>,
{
	struct ObjectVisitor<T> {
		expecting: &'static str,
		marker: PhantomData<T>,
	}

	impl<'de, T: Deserialize<'de>> Visitor<'de> for ObjectVisitor<T> {
		type Value = T;

		fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
			f.write_str(self.expecting)
		}

		fn visit_map<A: MapAccess<'de>>(self, map: A) -> std::result::Result<T, A::Error> {
			T::deserialize(MapAccessDeserializer::new(map))
		}
	}

	deserializer.deserialize_map(ObjectVisitor {
		expecting,
		marker: PhantomData,
	})
}
