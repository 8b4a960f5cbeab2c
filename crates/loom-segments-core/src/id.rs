// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Node identifiers.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of a group or condition within a filter tree.
///
/// Fresh ids are UUIDv4 strings, but ids read off the wire are opaque: any
/// string a client persisted is kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
	pub fn new() -> Self {
		Self(Uuid::new_v4().to_string())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Returns true for the empty id, which the validator reports as missing.
	pub fn is_empty(&self) -> bool {
		self.0.trim().is_empty()
	}
}

impl Default for NodeId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for NodeId {
	type Err = Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Self(s.to_string()))
	}
}

impl From<&str> for NodeId {
	fn from(s: &str) -> Self {
		Self(s.to_string())
	}
}

impl From<String> for NodeId {
	fn from(s: String) -> Self {
		Self(s)
	}
}

impl PartialEq<str> for NodeId {
	fn eq(&self, other: &str) -> bool {
		self.0 == other
	}
}

impl PartialEq<&str> for NodeId {
	fn eq(&self, other: &&str) -> bool {
		self.0 == *other
	}
}
