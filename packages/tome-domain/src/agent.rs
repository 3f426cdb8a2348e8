//! Declarative agent rules: a tag trigger paired with an action name.
//!
//! Rules are stored as a JSON object mapping a rule name to `{ "trigger": .., "action": .. }`.
//! Object order is the evaluation order.

use std::{fmt, str::FromStr};

use serde::Deserialize;
use serde_json::{Map, Value};

const TAG_PREFIX: &str = "tag:";
const NO_TAGS_MARKER: &str = "[]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
	HasTag(String),
	HasNoTags,
}
impl Trigger {
	pub fn parse(raw: &str) -> Result<Self, TriggerParseError> {
		let Some(condition) = raw.trim().strip_prefix(TAG_PREFIX) else {
			return Err(TriggerParseError { raw: raw.to_string() });
		};
		let condition = condition.trim();

		match condition {
			NO_TAGS_MARKER => Ok(Self::HasNoTags),
			"" => Err(TriggerParseError { raw: raw.to_string() }),
			tag => Ok(Self::HasTag(tag.to_string())),
		}
	}

	pub fn matches(&self, tags: &[String]) -> bool {
		match self {
			Self::HasTag(tag) => tags.iter().any(|value| value == tag),
			Self::HasNoTags => tags.is_empty(),
		}
	}
}
impl FromStr for Trigger {
	type Err = TriggerParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}
impl fmt::Display for Trigger {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::HasTag(tag) => write!(f, "{TAG_PREFIX}{tag}"),
			Self::HasNoTags => write!(f, "{TAG_PREFIX}{NO_TAGS_MARKER}"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported trigger {raw:?}; expected tag:<name> or tag:[].")]
pub struct TriggerParseError {
	pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRule {
	pub name: String,
	pub trigger: Trigger,
	pub action: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRule {
	pub name: String,
	pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRules {
	pub rules: Vec<AgentRule>,
	pub rejected: Vec<RejectedRule>,
}
impl ParsedRules {
	/// Parses a rules document. Malformed entries are collected in `rejected` instead of failing
	/// the whole document.
	pub fn from_json(raw: &str) -> serde_json::Result<Self> {
		let document: Map<String, Value> = serde_json::from_str(raw)?;
		let mut parsed = Self::default();

		for (name, value) in document {
			match parse_rule(&name, value) {
				Ok(rule) => parsed.rules.push(rule),
				Err(reason) => parsed.rejected.push(RejectedRule { name, reason }),
			}
		}

		Ok(parsed)
	}
}

#[derive(Debug, Deserialize)]
struct RawRule {
	trigger: Option<String>,
	action: Option<String>,
}

fn parse_rule(name: &str, value: Value) -> Result<AgentRule, String> {
	let raw: RawRule = serde_json::from_value(value).map_err(|err| err.to_string())?;
	let trigger = raw
		.trigger
		.filter(|trigger| !trigger.trim().is_empty())
		.ok_or_else(|| "Rule has no trigger.".to_string())?;
	let action = raw
		.action
		.map(|action| action.trim().to_string())
		.filter(|action| !action.is_empty())
		.ok_or_else(|| "Rule has no action.".to_string())?;
	let trigger = Trigger::parse(&trigger).map_err(|err| err.to_string())?;

	Ok(AgentRule { name: name.to_string(), trigger, action })
}
