use time::OffsetDateTime;

use crate::{Result, TomeService, crypto::ContentCipher};
use tome_domain::{NoteChanges, has_indexable_content, normalize_tags, normalize_workspace};

impl TomeService {
	/// Applies a partial update and returns the number of modified notes.
	///
	/// A content change re-embeds the note before touching storage. The old index entry is
	/// removed first and only replaced when a row was modified, so an unknown id never gains an
	/// entry. A failed write restores the removed entry.
	pub async fn update(&self, note_id: i64, changes: NoteChanges) -> Result<u64> {
		if changes.is_empty() {
			return Ok(0);
		}

		let changes = self.prepare_changes(changes)?;
		let vector = match changes.content.as_deref() {
			Some(content) if has_indexable_content(content) => Some(self.embed_one(content).await?),
			_ => None,
		};
		let removed =
			if changes.content.is_some() { self.remove_vector(note_id).await? } else { None };
		let modified = match self
			.store
			.update_note(note_id, &changes, OffsetDateTime::now_utc())
			.await
		{
			Ok(modified) => modified,
			Err(err) => {
				if let Some(previous) = removed
					&& let Err(restore_err) = self.put_vector(note_id, previous).await
				{
					tracing::error!(note_id, error = %restore_err, "Failed to restore index entry.");
				}

				return Err(err.into());
			},
		};

		if modified > 0
			&& let Some(vector) = vector
		{
			self.put_vector(note_id, vector).await?;
		}

		tracing::info!(note_id, modified, "Note update finished.");

		Ok(modified)
	}

	fn prepare_changes(&self, changes: NoteChanges) -> Result<NoteChanges> {
		let NoteChanges { title, content, tags, workspace, encrypted } = changes;
		let encrypt = encrypted.unwrap_or(false);
		let (content, encrypted) = match content {
			Some(content) if encrypt => {
				(Some(ContentCipher::from_config(&self.cfg)?.encrypt(&content)?), Some(true))
			},
			Some(content) => (Some(content), Some(false)),
			None => (None, None),
		};

		Ok(NoteChanges {
			title,
			content,
			tags: tags.map(normalize_tags),
			workspace: workspace.map(|value| normalize_workspace(Some(&value))),
			encrypted,
		})
	}
}
