// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for segment filters.

use thiserror::Error;

use crate::NodeId;

/// Result type for segment filter operations.
pub type Result<T> = std::result::Result<T, SegmentsError>;

/// Errors that can occur while encoding, decoding or configuring filters.
#[derive(Debug, Error)]
pub enum SegmentsError {
	#[error("unsupported filter tree version: {0}")]
	UnsupportedVersion(u32),

	#[error("operator '{0}' has no legacy tuple encoding")]
	UnsupportedLegacyOperator(String),

	#[error("value of condition {0} cannot be encoded as legacy clauses")]
	UnsupportedLegacyValue(NodeId),

	#[error("operator '{0}' has no negated counterpart")]
	NotNegatable(String),

	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("config parse error: {0}")]
	ConfigParse(#[from] toml::de::Error),
}
