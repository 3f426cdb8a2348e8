//! Persistence seam between the service and Postgres.

use time::OffsetDateTime;

use crate::BoxFuture;
use tome_domain::{Note, NoteChanges, NoteFilter};
use tome_storage::{
	db::Db,
	queries::{self, NOTE_ID_COUNTER},
};

pub trait NoteStore
where
	Self: Send + Sync,
{
	/// Next value of the note id counter. Strictly increasing across concurrent callers.
	fn next_note_id(&self) -> BoxFuture<'_, tome_storage::Result<i64>>;

	fn insert_note<'a>(&'a self, note: &'a Note) -> BoxFuture<'a, tome_storage::Result<()>>;

	fn find_notes<'a>(
		&'a self,
		filter: &'a NoteFilter,
	) -> BoxFuture<'a, tome_storage::Result<Vec<Note>>>;

	fn get_note(&self, note_id: i64) -> BoxFuture<'_, tome_storage::Result<Option<Note>>>;

	/// Returns the number of modified rows.
	fn update_note<'a>(
		&'a self,
		note_id: i64,
		changes: &'a NoteChanges,
		updated_at: OffsetDateTime,
	) -> BoxFuture<'a, tome_storage::Result<u64>>;

	/// Returns the number of deleted rows.
	fn delete_note(&self, note_id: i64) -> BoxFuture<'_, tome_storage::Result<u64>>;

	fn full_text_search<'a>(
		&'a self,
		query: &'a str,
	) -> BoxFuture<'a, tome_storage::Result<Vec<Note>>>;
}

impl NoteStore for Db {
	fn next_note_id(&self) -> BoxFuture<'_, tome_storage::Result<i64>> {
		Box::pin(queries::next_sequence(self, NOTE_ID_COUNTER))
	}

	fn insert_note<'a>(&'a self, note: &'a Note) -> BoxFuture<'a, tome_storage::Result<()>> {
		Box::pin(queries::insert_note(self, note))
	}

	fn find_notes<'a>(
		&'a self,
		filter: &'a NoteFilter,
	) -> BoxFuture<'a, tome_storage::Result<Vec<Note>>> {
		Box::pin(queries::find_notes(self, filter))
	}

	fn get_note(&self, note_id: i64) -> BoxFuture<'_, tome_storage::Result<Option<Note>>> {
		Box::pin(queries::get_note(self, note_id))
	}

	fn update_note<'a>(
		&'a self,
		note_id: i64,
		changes: &'a NoteChanges,
		updated_at: OffsetDateTime,
	) -> BoxFuture<'a, tome_storage::Result<u64>> {
		Box::pin(queries::update_note(self, note_id, changes, updated_at))
	}

	fn delete_note(&self, note_id: i64) -> BoxFuture<'_, tome_storage::Result<u64>> {
		Box::pin(queries::delete_note(self, note_id))
	}

	fn full_text_search<'a>(
		&'a self,
		query: &'a str,
	) -> BoxFuture<'a, tome_storage::Result<Vec<Note>>> {
		Box::pin(queries::full_text_search(self, query))
	}
}
