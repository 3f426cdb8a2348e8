use crate::{Result, TomeService};

impl TomeService {
	/// Deletes a note and its index entry. Returns 1 when the note existed, 0 otherwise.
	pub async fn delete(&self, note_id: i64) -> Result<u64> {
		let deleted = self.store.delete_note(note_id).await?;

		if deleted > 0 {
			self.remove_vector(note_id).await?;
		}

		tracing::info!(note_id, deleted, "Note delete finished.");

		Ok(deleted)
	}
}
