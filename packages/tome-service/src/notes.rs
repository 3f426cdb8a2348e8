use crate::{Result, TomeService};
use tome_domain::Note;

impl TomeService {
	pub async fn get_note(&self, note_id: i64) -> Result<Option<Note>> {
		Ok(self.store.get_note(note_id).await?)
	}
}
