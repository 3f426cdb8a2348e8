//! Tag-triggered agent actions.
//!
//! Rules are read from `agents.rules_path` on every evaluation so edits apply without a restart.
//! A failing or unknown action never stops the remaining rules.

use std::{collections::HashMap, io::ErrorKind, sync::Arc};

use crate::{ActionError, BoxFuture, TomeService, actions};
use tome_domain::{AgentRule, Note, ParsedRules};

pub trait AgentAction
where
	Self: Send + Sync,
{
	fn apply<'a>(
		&'a self,
		service: &'a TomeService,
		note: &'a Note,
	) -> BoxFuture<'a, Result<(), ActionError>>;
}

/// Action handlers by name.
#[derive(Clone, Default)]
pub struct ActionRegistry {
	actions: HashMap<String, Arc<dyn AgentAction>>,
}
impl ActionRegistry {
	pub fn builtin() -> Self {
		let rephrase: Arc<dyn AgentAction> = Arc::new(actions::Rephrase);

		Self::default()
			.with("calendar_event", Arc::new(actions::CalendarEvent))
			.with("share_to_whatsapp", Arc::new(actions::ShareToWhatsapp))
			.with("rephrase", rephrase.clone())
			.with("rephrase_with_gemini", rephrase)
			.with("suggest_tags", Arc::new(actions::SuggestTags))
	}

	pub fn with(mut self, name: impl Into<String>, action: Arc<dyn AgentAction>) -> Self {
		self.actions.insert(name.into(), action);

		self
	}

	pub fn get(&self, name: &str) -> Option<&Arc<dyn AgentAction>> {
		self.actions.get(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.actions.contains_key(name)
	}
}

/// Rule names grouped by outcome, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentReport {
	pub fired: Vec<String>,
	pub failed: Vec<String>,
	pub unknown: Vec<String>,
}
impl AgentReport {
	pub fn is_empty(&self) -> bool {
		self.fired.is_empty() && self.failed.is_empty() && self.unknown.is_empty()
	}
}

impl TomeService {
	/// Reads the rule file. A missing or unreadable file yields no rules.
	pub async fn load_agent_rules(&self) -> Vec<AgentRule> {
		let path = &self.cfg.agents.rules_path;
		let raw = match tokio::fs::read_to_string(path).await {
			Ok(raw) => raw,
			Err(err) if err.kind() == ErrorKind::NotFound => {
				tracing::info!(?path, "Agent rules file not found.");

				return Vec::new();
			},
			Err(err) => {
				tracing::warn!(?path, error = %err, "Failed to read agent rules.");

				return Vec::new();
			},
		};
		let parsed = match ParsedRules::from_json(&raw) {
			Ok(parsed) => parsed,
			Err(err) => {
				tracing::warn!(?path, error = %err, "Agent rules file is not a JSON object of rules.");

				return Vec::new();
			},
		};

		for rejected in &parsed.rejected {
			tracing::warn!(rule = %rejected.name, reason = %rejected.reason, "Skipping agent rule.");
		}

		parsed.rules
	}

	/// Runs every rule whose trigger matches `note`, in file order.
	pub async fn run_agents(&self, note: &Note) -> AgentReport {
		let rules = self.load_agent_rules().await;

		self.evaluate_rules(&rules, note).await
	}

	pub async fn evaluate_rules(&self, rules: &[AgentRule], note: &Note) -> AgentReport {
		let mut report = AgentReport::default();

		for rule in rules {
			if !rule.trigger.matches(&note.tags) {
				continue;
			}

			let Some(action) = self.actions().get(&rule.action) else {
				tracing::warn!(rule = %rule.name, action = %rule.action, "Unknown agent action.");
				report.unknown.push(rule.name.clone());

				continue;
			};

			match action.apply(self, note).await {
				Ok(()) => {
					tracing::info!(
						rule = %rule.name,
						action = %rule.action,
						note_id = note.note_id,
						"Agent action applied."
					);
					report.fired.push(rule.name.clone());
				},
				Err(err) => {
					tracing::error!(
						rule = %rule.name,
						action = %rule.action,
						note_id = note.note_id,
						error = %err,
						"Agent action failed."
					);
					report.failed.push(rule.name.clone());
				},
			}
		}

		report
	}
}
