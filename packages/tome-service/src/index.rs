use std::sync::Mutex;

use crate::{Error, Result, TomeService};
use tome_storage::vector::VectorIndex;

impl TomeService {
	/// Embeds a single text with the configured embedding provider.
	pub(crate) async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
		let cfg = &self.cfg.providers.embedding;
		let texts = vec![text.to_string()];
		let mut vectors = self.providers.embedding.embed(cfg, &texts).await?;
		let vector = vectors.pop().ok_or_else(|| Error::Provider {
			message: "Embedding provider returned no vectors.".to_string(),
		})?;

		if vector.len() != cfg.dimensions as usize {
			return Err(Error::Provider {
				message: format!(
					"Embedding has {} dimensions, expected {}.",
					vector.len(),
					cfg.dimensions
				),
			});
		}

		Ok(vector)
	}

	/// Ids of the `k` notes nearest to `query`, closest first.
	pub async fn similar_notes(&self, query: &str, k: usize) -> Result<Vec<i64>> {
		if k == 0 {
			return Ok(Vec::new());
		}

		let vector = self.embed_one(query).await?;
		let ids = self.with_index(|index| index.search(&vector, k).map_err(Error::index)).await?;

		tracing::debug!(k, hits = ids.len(), "Vector search finished.");

		Ok(ids)
	}

	pub async fn index_contains(&self, note_id: i64) -> Result<bool> {
		self.with_index(|index| Ok(index.contains(note_id))).await
	}

	/// Writes the vector index file when it changed. Returns whether a write happened.
	pub async fn save_index(&self) -> Result<bool> {
		// Nothing to persist when the index was never opened.
		if !self.index.initialized() {
			return Ok(false);
		}

		self.with_index(|index| index.save().map_err(Error::index)).await
	}

	/// Opens the index if needed so a load failure surfaces before storage is touched.
	pub(crate) async fn ensure_index(&self) -> Result<()> {
		self.with_index(|_| Ok(())).await
	}

	pub(crate) async fn put_vector(&self, note_id: i64, vector: Vec<f32>) -> Result<()> {
		self.with_index(|index| index.insert(note_id, vector).map_err(Error::index)).await?;

		tracing::debug!(note_id, "Indexed note.");

		Ok(())
	}

	pub(crate) async fn remove_vector(&self, note_id: i64) -> Result<Option<Vec<f32>>> {
		let removed = self.with_index(|index| Ok(index.remove(note_id))).await?;

		if removed.is_some() {
			tracing::debug!(note_id, "Removed note from vector index.");
		}

		Ok(removed)
	}

	async fn with_index<T, F>(&self, f: F) -> Result<T>
	where
		F: FnOnce(&mut VectorIndex) -> Result<T>,
	{
		let cell = self
			.index
			.get_or_try_init(|| async {
				let cfg = &self.cfg.storage.vector_index;

				VectorIndex::open(&cfg.path, cfg.dimensions).map(Mutex::new).map_err(Error::index)
			})
			.await?;
		let mut index = cell.lock().map_err(|_| Error::Index {
			message: "Vector index lock is poisoned.".to_string(),
		})?;

		f(&mut index)
	}
}
