use time::OffsetDateTime;

use tome_domain::Note;

#[derive(Debug, sqlx::FromRow)]
pub struct NoteRow {
	pub note_id: i64,
	pub title: String,
	pub content: String,
	pub tags: Vec<String>,
	pub workspace: String,
	pub encrypted: bool,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
impl From<NoteRow> for Note {
	fn from(row: NoteRow) -> Self {
		Self {
			note_id: row.note_id,
			title: row.title,
			content: row.content,
			tags: row.tags,
			workspace: row.workspace,
			encrypted: row.encrypted,
			created_at: row.created_at,
			updated_at: row.updated_at,
		}
	}
}
