//! Exact nearest-neighbor index over note embeddings, persisted as a single file.
//!
//! The index lives in memory. `save` rewrites the backing file only when a mutation happened
//! since the last load or save. The file is not safe to share between processes.

use std::{
	ffi::OsString,
	fs,
	io::ErrorKind,
	path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
	dimensions: u32,
	entries: Vec<IndexEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
	note_id: i64,
	vector: Vec<f32>,
}

#[derive(Debug)]
pub struct VectorIndex {
	path: PathBuf,
	dimensions: u32,
	// Kept in insertion order; search ties resolve to the older entry.
	entries: Vec<IndexEntry>,
	dirty: bool,
}
impl VectorIndex {
	/// Loads the index at `path`, or starts an empty one when the file does not exist.
	pub fn open(path: &Path, dimensions: u32) -> Result<Self> {
		let entries = match fs::read(path) {
			Ok(raw) => {
				let file: IndexFile = serde_json::from_slice(&raw)?;

				if file.dimensions != dimensions {
					return Err(Error::InvalidArgument(format!(
						"Vector index at {path:?} has {} dimensions, expected {dimensions}.",
						file.dimensions
					)));
				}

				tracing::debug!(?path, entries = file.entries.len(), "Loaded vector index.");

				file.entries
			},
			Err(err) if err.kind() == ErrorKind::NotFound => {
				tracing::debug!(?path, "Vector index file not found; starting empty.");

				Vec::new()
			},
			Err(err) => return Err(err.into()),
		};

		Ok(Self { path: path.to_path_buf(), dimensions, entries, dirty: false })
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn is_dirty(&self) -> bool {
		self.dirty
	}

	pub fn contains(&self, note_id: i64) -> bool {
		self.entries.iter().any(|entry| entry.note_id == note_id)
	}

	/// Inserts the vector for `note_id`, replacing any previous one. A replaced entry moves to
	/// the end of the insertion order.
	pub fn insert(&mut self, note_id: i64, vector: Vec<f32>) -> Result<()> {
		self.check_dimensions(&vector)?;
		self.remove(note_id);
		self.entries.push(IndexEntry { note_id, vector });

		self.dirty = true;

		Ok(())
	}

	/// Removes the entry for `note_id` and returns its vector. Unknown ids are ignored.
	pub fn remove(&mut self, note_id: i64) -> Option<Vec<f32>> {
		let position = self.entries.iter().position(|entry| entry.note_id == note_id)?;
		let entry = self.entries.remove(position);

		self.dirty = true;

		Some(entry.vector)
	}

	/// Returns up to `k` note ids ordered by ascending squared L2 distance to `query`.
	pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<i64>> {
		self.check_dimensions(query)?;

		if k == 0 {
			return Ok(Vec::new());
		}

		let mut scored = self
			.entries
			.iter()
			.map(|entry| (entry.note_id, squared_l2(&entry.vector, query)))
			.collect::<Vec<_>>();

		// Stable sort keeps insertion order between equal distances.
		scored.sort_by(|a, b| a.1.total_cmp(&b.1));
		scored.truncate(k);

		Ok(scored.into_iter().map(|(note_id, _)| note_id).collect())
	}

	/// Writes the index when it changed since the last load or save. Returns whether a write
	/// happened.
	pub fn save(&mut self) -> Result<bool> {
		if !self.dirty {
			return Ok(false);
		}

		if let Some(parent) = self.path.parent()
			&& !parent.as_os_str().is_empty()
		{
			fs::create_dir_all(parent)?;
		}

		let file = IndexFile { dimensions: self.dimensions, entries: self.entries.clone() };
		let payload = serde_json::to_vec(&file)?;
		let tmp_path = tmp_path(&self.path);

		fs::write(&tmp_path, payload)?;
		fs::rename(&tmp_path, &self.path)?;

		self.dirty = false;

		tracing::debug!(path = ?self.path, entries = self.entries.len(), "Saved vector index.");

		Ok(true)
	}

	fn check_dimensions(&self, vector: &[f32]) -> Result<()> {
		if vector.len() != self.dimensions as usize {
			return Err(Error::InvalidArgument(format!(
				"Vector has {} dimensions, expected {}.",
				vector.len(),
				self.dimensions
			)));
		}

		Ok(())
	}
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
	a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn tmp_path(path: &Path) -> PathBuf {
	let mut raw = OsString::from(path.as_os_str());

	raw.push(".tmp");

	PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn index(dir: &tempfile::TempDir) -> VectorIndex {
		VectorIndex::open(&dir.path().join("index.json"), 2).expect("open failed")
	}

	#[test]
	fn missing_file_opens_empty_and_clean() {
		let dir = tempfile::tempdir().expect("tempdir failed");
		let index = index(&dir);

		assert!(index.is_empty());
		assert!(!index.is_dirty());
	}

	#[test]
	fn search_orders_by_distance_then_insertion() {
		let dir = tempfile::tempdir().expect("tempdir failed");
		let mut index = index(&dir);

		index.insert(1, vec![1.0, 0.0]).expect("insert failed");
		index.insert(2, vec![0.0, 1.0]).expect("insert failed");
		index.insert(3, vec![0.0, 1.0]).expect("insert failed");
		index.insert(4, vec![5.0, 5.0]).expect("insert failed");

		assert_eq!(index.search(&[0.0, 0.9], 3).expect("search failed"), vec![2, 3, 1]);
		assert_eq!(index.search(&[0.0, 0.9], 10).expect("search failed").len(), 4);
		assert!(index.search(&[0.0, 0.9], 0).expect("search failed").is_empty());
	}

	#[test]
	fn insert_overwrites_and_moves_entry_to_the_end() {
		let dir = tempfile::tempdir().expect("tempdir failed");
		let mut index = index(&dir);

		index.insert(1, vec![0.0, 1.0]).expect("insert failed");
		index.insert(2, vec![0.0, 1.0]).expect("insert failed");
		index.insert(1, vec![0.0, 1.0]).expect("insert failed");

		assert_eq!(index.len(), 2);
		assert_eq!(index.search(&[0.0, 1.0], 2).expect("search failed"), vec![2, 1]);
	}

	#[test]
	fn remove_unknown_id_is_a_noop() {
		let dir = tempfile::tempdir().expect("tempdir failed");
		let mut index = index(&dir);

		assert_eq!(index.remove(42), None);
		assert!(!index.is_dirty());
	}

	#[test]
	fn wrong_dimensions_are_rejected() {
		let dir = tempfile::tempdir().expect("tempdir failed");
		let mut index = index(&dir);

		assert!(index.insert(1, vec![1.0]).is_err());
		assert!(index.search(&[1.0, 2.0, 3.0], 1).is_err());
		assert!(index.is_empty());
	}

	#[test]
	fn save_only_writes_when_dirty_and_reloads() {
		let dir = tempfile::tempdir().expect("tempdir failed");
		let path = dir.path().join("nested").join("index.json");
		let mut index = VectorIndex::open(&path, 2).expect("open failed");

		assert!(!index.save().expect("save failed"));
		assert!(!path.exists());

		index.insert(9, vec![0.5, 0.5]).expect("insert failed");

		assert!(index.save().expect("save failed"));
		assert!(!index.save().expect("save failed"));

		let reloaded = VectorIndex::open(&path, 2).expect("reopen failed");

		assert!(reloaded.contains(9));
		assert!(VectorIndex::open(&path, 3).is_err());
	}
}
