// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Group connectors, condition operators and condition values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a group combines its children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupOperator {
	#[default]
	#[serde(alias = "AND")]
	And,
	#[serde(alias = "OR")]
	Or,
}

impl GroupOperator {
	/// Wire form: `"and"` / `"or"`.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::And => "and",
			Self::Or => "or",
		}
	}

	/// Upper-case label shown to users: `"AND"` / `"OR"`.
	pub fn label(&self) -> &'static str {
		match self {
			Self::And => "AND",
			Self::Or => "OR",
		}
	}
}

impl fmt::Display for GroupOperator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

/// Which operator vocabulary an operator belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorFamily {
	/// Dimension operators of the legacy tuple format (`is`, `contains`, ...).
	Legacy,
	/// Operators of typed fields (`equals`, `greater_than`, `is_true`, ...).
	Typed,
}

/// What kind of value an operator expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueArity {
	/// Boolean operators carry no value.
	NoValue,
	/// Exactly one scalar.
	Single,
	/// A non-empty list of strings.
	Multiple,
	/// Legacy dimension clauses: a non-blank string or a non-empty list.
	Clauses,
}

impl ValueArity {
	/// Returns true if `value` is an acceptable value for this arity.
	///
	/// Blank values (empty text, empty list) count as absent.
	pub fn accepts(&self, value: Option<&ConditionValue>) -> bool {
		let value = value.filter(|v| !v.is_blank());
		match (self, value) {
			(Self::NoValue, None) => true,
			(Self::NoValue, Some(_)) => false,
			(_, None) => false,
			(Self::Single, Some(v)) => !matches!(v, ConditionValue::List(_)),
			(Self::Multiple, Some(v)) => matches!(v, ConditionValue::List(_)),
			(Self::Clauses, Some(v)) => {
				matches!(v, ConditionValue::Text(_) | ConditionValue::List(_))
			}
		}
	}

	/// Returns true if the operator requires a value.
	pub fn requires_value(&self) -> bool {
		!matches!(self, Self::NoValue)
	}
}

/// The comparison performed by a condition.
///
/// Unknown operator strings are preserved as [`ConditionOperator::Unknown`]
/// so that a tree written by a newer client still parses; the validator
/// reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionOperator {
	#[default]
	Is,
	IsNot,
	Contains,
	ContainsNot,
	HasNotDone,
	Matches,
	MatchesNot,
	MatchesWildcard,
	MatchesWildcardNot,
	Equals,
	NotEquals,
	GreaterThan,
	LessThan,
	GreaterOrEqual,
	LessOrEqual,
	IsOneOf,
	IsNotOneOf,
	IsTrue,
	IsFalse,
	Unknown(String),
}

impl ConditionOperator {
	/// Every recognized operator, legacy set first.
	pub const KNOWN: [ConditionOperator; 19] = [
		Self::Is,
		Self::IsNot,
		Self::Contains,
		Self::ContainsNot,
		Self::HasNotDone,
		Self::Matches,
		Self::MatchesNot,
		Self::MatchesWildcard,
		Self::MatchesWildcardNot,
		Self::Equals,
		Self::NotEquals,
		Self::GreaterThan,
		Self::LessThan,
		Self::GreaterOrEqual,
		Self::LessOrEqual,
		Self::IsOneOf,
		Self::IsNotOneOf,
		Self::IsTrue,
		Self::IsFalse,
	];

	pub fn as_str(&self) -> &str {
		match self {
			Self::Is => "is",
			Self::IsNot => "is_not",
			Self::Contains => "contains",
			Self::ContainsNot => "contains_not",
			Self::HasNotDone => "has_not_done",
			Self::Matches => "matches",
			Self::MatchesNot => "matches_not",
			Self::MatchesWildcard => "matches_wildcard",
			Self::MatchesWildcardNot => "matches_wildcard_not",
			Self::Equals => "equals",
			Self::NotEquals => "not_equals",
			Self::GreaterThan => "greater_than",
			Self::LessThan => "less_than",
			Self::GreaterOrEqual => "greater_or_equal",
			Self::LessOrEqual => "less_or_equal",
			Self::IsOneOf => "is_one_of",
			Self::IsNotOneOf => "is_not_one_of",
			Self::IsTrue => "is_true",
			Self::IsFalse => "is_false",
			Self::Unknown(s) => s,
		}
	}

	/// Returns the vocabulary this operator belongs to, or `None` if unknown.
	pub fn family(&self) -> Option<OperatorFamily> {
		match self {
			Self::Is
			| Self::IsNot
			| Self::Contains
			| Self::ContainsNot
			| Self::HasNotDone
			| Self::Matches
			| Self::MatchesNot
			| Self::MatchesWildcard
			| Self::MatchesWildcardNot => Some(OperatorFamily::Legacy),
			Self::Equals
			| Self::NotEquals
			| Self::GreaterThan
			| Self::LessThan
			| Self::GreaterOrEqual
			| Self::LessOrEqual
			| Self::IsOneOf
			| Self::IsNotOneOf
			| Self::IsTrue
			| Self::IsFalse => Some(OperatorFamily::Typed),
			Self::Unknown(_) => None,
		}
	}

	pub fn is_known(&self) -> bool {
		self.family().is_some()
	}

	pub fn is_legacy(&self) -> bool {
		self.family() == Some(OperatorFamily::Legacy)
	}

	/// Returns true for `is_true` / `is_false`, which take no value.
	pub fn is_boolean(&self) -> bool {
		matches!(self, Self::IsTrue | Self::IsFalse)
	}

	/// Returns the value shape this operator expects.
	///
	/// Unknown operators are treated as taking legacy clauses.
	pub fn arity(&self) -> ValueArity {
		match self.family() {
			Some(OperatorFamily::Legacy) | None => ValueArity::Clauses,
			Some(OperatorFamily::Typed) => match self {
				Self::IsTrue | Self::IsFalse => ValueArity::NoValue,
				Self::IsOneOf | Self::IsNotOneOf => ValueArity::Multiple,
				_ => ValueArity::Single,
			},
		}
	}

	/// Returns the logical complement of this operator, if one exists.
	pub fn negate(&self) -> Option<Self> {
		let negated = match self {
			Self::Is => Self::IsNot,
			Self::IsNot => Self::Is,
			Self::Contains => Self::ContainsNot,
			Self::ContainsNot => Self::Contains,
			Self::Matches => Self::MatchesNot,
			Self::MatchesNot => Self::Matches,
			Self::MatchesWildcard => Self::MatchesWildcardNot,
			Self::MatchesWildcardNot => Self::MatchesWildcard,
			Self::Equals => Self::NotEquals,
			Self::NotEquals => Self::Equals,
			Self::GreaterThan => Self::LessOrEqual,
			Self::LessOrEqual => Self::GreaterThan,
			Self::LessThan => Self::GreaterOrEqual,
			Self::GreaterOrEqual => Self::LessThan,
			Self::IsOneOf => Self::IsNotOneOf,
			Self::IsNotOneOf => Self::IsOneOf,
			Self::IsTrue => Self::IsFalse,
			Self::IsFalse => Self::IsTrue,
			Self::HasNotDone | Self::Unknown(_) => return None,
		};
		Some(negated)
	}
}

impl fmt::Display for ConditionOperator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

impl From<&str> for ConditionOperator {
	fn from(s: &str) -> Self {
		Self::KNOWN
			.iter()
			.find(|op| op.as_str() == s)
			.cloned()
			.unwrap_or_else(|| Self::Unknown(s.to_string()))
	}
}

impl From<String> for ConditionOperator {
	fn from(s: String) -> Self {
		match Self::from(s.as_str()) {
			Self::Unknown(_) => Self::Unknown(s),
			known => known,
		}
	}
}

impl From<ConditionOperator> for String {
	fn from(op: ConditionOperator) -> Self {
		match op {
			ConditionOperator::Unknown(s) => s,
			known => known.as_str().to_string(),
		}
	}
}

/// The value side of a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
	Bool(bool),
	Number(serde_json::Number),
	Text(String),
	List(Vec<String>),
}

impl ConditionValue {
	/// Returns true for empty text or an empty list.
	pub fn is_blank(&self) -> bool {
		match self {
			Self::Text(s) => s.is_empty(),
			Self::List(items) => items.is_empty(),
			Self::Bool(_) | Self::Number(_) => false,
		}
	}

	/// Returns the value as legacy clauses, if it has a string form.
	pub fn to_clauses(&self) -> Option<Vec<String>> {
		match self {
			Self::Text(s) => Some(vec![s.clone()]),
			Self::List(items) => Some(items.clone()),
			Self::Bool(_) | Self::Number(_) => None,
		}
	}
}

impl From<&str> for ConditionValue {
	fn from(s: &str) -> Self {
		Self::Text(s.to_string())
	}
}

impl From<String> for ConditionValue {
	fn from(s: String) -> Self {
		Self::Text(s)
	}
}

impl From<bool> for ConditionValue {
	fn from(b: bool) -> Self {
		Self::Bool(b)
	}
}

impl From<i64> for ConditionValue {
	fn from(n: i64) -> Self {
		Self::Number(n.into())
	}
}

impl From<Vec<String>> for ConditionValue {
	fn from(items: Vec<String>) -> Self {
		Self::List(items)
	}
}

impl From<Vec<&str>> for ConditionValue {
	fn from(items: Vec<&str>) -> Self {
		Self::List(items.into_iter().map(String::from).collect())
	}
}
