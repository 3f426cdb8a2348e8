use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use unicode_segmentation::UnicodeSegmentation;

use crate::{Result, db::Db, models::NoteRow};
use tome_domain::{Note, NoteChanges, NoteFilter};

pub const NOTE_ID_COUNTER: &str = "note_id";

const TEXT_INDEX_NAME: &str = "notes_text_idx";
const NOTE_COLUMNS: &str =
	"note_id, title, content, tags, workspace, encrypted, created_at, updated_at";

/// Atomically increments the named counter and returns the new value. The first call returns 1.
pub async fn next_sequence(db: &Db, name: &str) -> Result<i64> {
	let seq: i64 = sqlx::query_scalar(
		"\
INSERT INTO counters (name, seq)
VALUES ($1, 1)
ON CONFLICT (name) DO UPDATE SET seq = counters.seq + 1
RETURNING seq",
	)
	.bind(name)
	.fetch_one(&db.pool)
	.await?;

	Ok(seq)
}

pub async fn insert_note(db: &Db, note: &Note) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO notes (
	note_id,
	title,
	content,
	tags,
	workspace,
	encrypted,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
	)
	.bind(note.note_id)
	.bind(note.title.as_str())
	.bind(note.content.as_str())
	.bind(&note.tags)
	.bind(note.workspace.as_str())
	.bind(note.encrypted)
	.bind(note.created_at)
	.bind(note.updated_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn find_notes(db: &Db, filter: &NoteFilter) -> Result<Vec<Note>> {
	let mut builder: QueryBuilder<'_, Postgres> =
		QueryBuilder::new(format!("SELECT {NOTE_COLUMNS} FROM notes WHERE TRUE"));

	if let Some(workspace) = filter.workspace.as_deref() {
		builder.push(" AND workspace = ");
		builder.push_bind(workspace);
	}
	if !filter.tags.is_empty() {
		builder.push(" AND tags @> ");
		builder.push_bind(&filter.tags);
	}
	if let Some(note_ids) = filter.note_ids.as_ref() {
		builder.push(" AND note_id = ANY(");
		builder.push_bind(note_ids);
		builder.push(")");
	}

	builder.push(" ORDER BY note_id");

	let rows: Vec<NoteRow> = builder.build_query_as().fetch_all(&db.pool).await?;

	Ok(rows.into_iter().map(Note::from).collect())
}

pub async fn get_note(db: &Db, note_id: i64) -> Result<Option<Note>> {
	let row: Option<NoteRow> =
		sqlx::query_as(&format!("SELECT {NOTE_COLUMNS} FROM notes WHERE note_id = $1"))
			.bind(note_id)
			.fetch_optional(&db.pool)
			.await?;

	Ok(row.map(Note::from))
}

/// Applies the present fields of `changes` and returns the number of modified rows.
pub async fn update_note(
	db: &Db,
	note_id: i64,
	changes: &NoteChanges,
	updated_at: OffsetDateTime,
) -> Result<u64> {
	let result = sqlx::query(
		"\
UPDATE notes
SET
	title = COALESCE($1, title),
	content = COALESCE($2, content),
	tags = COALESCE($3, tags),
	workspace = COALESCE($4, workspace),
	encrypted = COALESCE($5, encrypted),
	updated_at = $6
WHERE note_id = $7",
	)
	.bind(changes.title.as_deref())
	.bind(changes.content.as_deref())
	.bind(changes.tags.as_ref())
	.bind(changes.workspace.as_deref())
	.bind(changes.encrypted)
	.bind(updated_at)
	.bind(note_id)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected())
}

pub async fn delete_note(db: &Db, note_id: i64) -> Result<u64> {
	let result =
		sqlx::query("DELETE FROM notes WHERE note_id = $1").bind(note_id).execute(&db.pool).await?;

	Ok(result.rows_affected())
}

/// Creates the title+content text index when it does not exist yet.
pub async fn ensure_text_index(db: &Db) -> Result<()> {
	let exists: bool = sqlx::query_scalar(
		"SELECT EXISTS (SELECT 1 FROM pg_indexes WHERE tablename = 'notes' AND indexname = $1)",
	)
	.bind(TEXT_INDEX_NAME)
	.fetch_one(&db.pool)
	.await?;

	if exists {
		return Ok(());
	}

	sqlx::query(&format!(
		"CREATE INDEX IF NOT EXISTS {TEXT_INDEX_NAME} ON notes \
		 USING gin (to_tsvector('english', title || ' ' || content))"
	))
	.execute(&db.pool)
	.await?;

	tracing::info!(index = TEXT_INDEX_NAME, "Created full-text index.");

	Ok(())
}

/// Notes whose title or content matches any word of `query`.
pub async fn full_text_search(db: &Db, query: &str) -> Result<Vec<Note>> {
	let Some(tsquery) = text_search_terms(query) else {
		return Ok(Vec::new());
	};

	ensure_text_index(db).await?;

	let rows: Vec<NoteRow> = sqlx::query_as(&format!(
		"\
SELECT {NOTE_COLUMNS}
FROM notes
WHERE to_tsvector('english', title || ' ' || content) @@ to_tsquery('english', $1)
ORDER BY note_id"
	))
	.bind(tsquery.as_str())
	.fetch_all(&db.pool)
	.await?;

	tracing::debug!(query, matches = rows.len(), "Full-text search finished.");

	Ok(rows.into_iter().map(Note::from).collect())
}

/// Builds an OR-ed `to_tsquery` expression from the words of `query`. Returns `None` when the
/// query has no words.
pub fn text_search_terms(query: &str) -> Option<String> {
	let mut terms: Vec<String> = Vec::new();

	for word in query.unicode_words() {
		let term = word.chars().filter(|c| c.is_alphanumeric()).collect::<String>().to_lowercase();

		if term.is_empty() || terms.contains(&term) {
			continue;
		}

		terms.push(term);
	}

	if terms.is_empty() { None } else { Some(terms.join(" | ")) }
}
