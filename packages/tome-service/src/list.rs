use crate::{Result, TomeService};
use tome_domain::{Note, NoteFilter};

impl TomeService {
	/// Every note matching `filter`, in storage order.
	pub async fn list(&self, filter: &NoteFilter) -> Result<Vec<Note>> {
		Ok(self.store.find_notes(filter).await?)
	}
}
