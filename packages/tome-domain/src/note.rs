use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub const DEFAULT_WORKSPACE: &str = "default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
	pub note_id: i64,
	pub title: String,
	/// Ciphertext when `encrypted` is set.
	pub content: String,
	pub tags: Vec<String>,
	pub workspace: String,
	#[serde(default)]
	pub encrypted: bool,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}
impl Note {
	pub fn has_tag(&self, tag: &str) -> bool {
		self.tags.iter().any(|value| value == tag)
	}
}

/// Equality and set-membership filter used by `list`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilter {
	pub workspace: Option<String>,
	/// Every tag listed here must be present on the note.
	pub tags: Vec<String>,
	pub note_ids: Option<Vec<i64>>,
}
impl NoteFilter {
	pub fn by_ids(note_ids: Vec<i64>) -> Self {
		Self { note_ids: Some(note_ids), ..Self::default() }
	}

	pub fn matches(&self, note: &Note) -> bool {
		if let Some(workspace) = self.workspace.as_deref()
			&& note.workspace != workspace
		{
			return false;
		}
		if let Some(note_ids) = self.note_ids.as_ref()
			&& !note_ids.contains(&note.note_id)
		{
			return false;
		}

		self.tags.iter().all(|tag| note.has_tag(tag))
	}
}

/// Partial update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteChanges {
	pub title: Option<String>,
	pub content: Option<String>,
	pub tags: Option<Vec<String>>,
	pub workspace: Option<String>,
	/// Only honored together with `content`.
	pub encrypted: Option<bool>,
}
impl NoteChanges {
	pub fn is_empty(&self) -> bool {
		self.title.is_none()
			&& self.content.is_none()
			&& self.tags.is_none()
			&& self.workspace.is_none()
	}
}

pub fn has_indexable_content(content: &str) -> bool {
	!content.trim().is_empty()
}

/// Splits a comma separated tag list, as typed on the command line or returned by a model.
pub fn parse_tags(raw: &str) -> Vec<String> {
	normalize_tags(raw.split(',').map(str::to_string))
}

/// Trims tags, drops empty ones and removes duplicates while keeping first occurrences.
pub fn normalize_tags<I>(tags: I) -> Vec<String>
where
	I: IntoIterator<Item = String>,
{
	let mut out: Vec<String> = Vec::new();

	for tag in tags {
		let trimmed = tag.trim();

		if trimmed.is_empty() || out.iter().any(|existing| existing == trimmed) {
			continue;
		}

		out.push(trimmed.to_string());
	}

	out
}

pub fn normalize_workspace(workspace: Option<&str>) -> String {
	match workspace.map(str::trim) {
		Some(value) if !value.is_empty() => value.to_string(),
		_ => DEFAULT_WORKSPACE.to_string(),
	}
}
