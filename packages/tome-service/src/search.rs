use std::collections::HashMap;

use crate::{Error, Result, TomeService};
use tome_domain::{Note, NoteFilter};

impl TomeService {
	/// Notes whose title or content matches any word of `query`.
	pub async fn full_text_search(&self, query: &str) -> Result<Vec<Note>> {
		Ok(self.store.full_text_search(query).await?)
	}

	/// The `k` notes nearest to `query`, closest first.
	pub async fn similar(&self, query: &str, k: usize) -> Result<Vec<Note>> {
		let ids = self.similar_notes(query, k).await?;

		if ids.is_empty() {
			return Ok(Vec::new());
		}

		let mut by_id = self
			.store
			.find_notes(&NoteFilter::by_ids(ids.clone()))
			.await?
			.into_iter()
			.map(|note| (note.note_id, note))
			.collect::<HashMap<_, _>>();

		Ok(ids.into_iter().filter_map(|note_id| by_id.remove(&note_id)).collect())
	}

	/// Semantic neighbors of `question` in storage order, followed by full-text matches that are
	/// not already present. The result is not truncated to `k`.
	///
	/// An unavailable embedding provider leaves only the full-text matches.
	pub async fn find_relevant(&self, question: &str, k: usize) -> Result<Vec<Note>> {
		let semantic_ids = match self.similar_notes(question, k).await {
			Ok(ids) => ids,
			Err(Error::Provider { message }) => {
				tracing::warn!(error = %message, "Semantic search failed. Using full-text matches.");

				Vec::new()
			},
			Err(err) => return Err(err),
		};
		let text_matches = self.full_text_search(question).await?;
		let mut notes = if semantic_ids.is_empty() {
			Vec::new()
		} else {
			self.store.find_notes(&NoteFilter::by_ids(semantic_ids.clone())).await?
		};
		let semantic_hits = notes.len();

		notes.extend(text_matches.into_iter().filter(|note| !semantic_ids.contains(&note.note_id)));

		tracing::debug!(
			k,
			semantic = semantic_hits,
			full_text = notes.len() - semantic_hits,
			"Collected relevant notes."
		);

		Ok(notes)
	}
}
