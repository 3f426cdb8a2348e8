use std::path::{Path, PathBuf};

use time::OffsetDateTime;

use crate::{Error, Result, TomeService, crypto::ContentCipher};
use tome_domain::{Note, has_indexable_content, normalize_tags, normalize_workspace};

#[derive(Clone, Debug)]
pub enum NoteBody {
	Text(String),
	/// Audio file whose transcript becomes the note content.
	Audio(PathBuf),
}

#[derive(Clone, Debug)]
pub struct NewNote {
	pub title: String,
	pub body: NoteBody,
	pub tags: Vec<String>,
	pub workspace: Option<String>,
	pub encrypt: bool,
}
impl NewNote {
	pub fn text(title: impl Into<String>, content: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			body: NoteBody::Text(content.into()),
			tags: Vec::new(),
			workspace: None,
			encrypt: false,
		}
	}

	pub fn with_tags<I, S>(mut self, tags: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.tags = tags.into_iter().map(Into::into).collect();

		self
	}

	pub fn in_workspace(mut self, workspace: impl Into<String>) -> Self {
		self.workspace = Some(workspace.into());

		self
	}
}

impl TomeService {
	/// Stores a new note and indexes its content. Returns the allocated id.
	///
	/// Nothing is stored when transcription, embedding or loading the index fails.
	pub async fn create(&self, req: NewNote) -> Result<i64> {
		let NewNote { title, body, tags, workspace, encrypt } = req;
		let content = match body {
			NoteBody::Text(content) => content,
			NoteBody::Audio(path) => self.transcribe_file(&path).await?,
		};
		let content =
			if encrypt { ContentCipher::from_config(&self.cfg)?.encrypt(&content)? } else { content };
		let vector = if has_indexable_content(&content) {
			Some(self.embed_one(&content).await?)
		} else {
			None
		};

		self.ensure_index().await?;

		let note_id = self.store.next_note_id().await?;
		let now = OffsetDateTime::now_utc();
		let note = Note {
			note_id,
			title,
			content,
			tags: normalize_tags(tags),
			workspace: normalize_workspace(workspace.as_deref()),
			encrypted: encrypt,
			created_at: now,
			updated_at: now,
		};

		self.store.insert_note(&note).await?;

		if let Some(vector) = vector {
			self.put_vector(note_id, vector).await?;
		}

		tracing::info!(note_id, workspace = %note.workspace, "Note created.");

		Ok(note_id)
	}

	async fn transcribe_file(&self, path: &Path) -> Result<String> {
		let audio = tokio::fs::read(path).await.map_err(|err| Error::Transcription {
			message: format!("Failed to read audio file {path:?}: {err}."),
		})?;
		let file_name = path
			.file_name()
			.map(|name| name.to_string_lossy().into_owned())
			.unwrap_or_else(|| "audio".to_string());
		let transcript = self
			.providers
			.transcription
			.transcribe(&self.cfg.providers.transcription, &file_name, audio)
			.await
			.map_err(Error::transcription)?;

		tracing::debug!(?path, chars = transcript.len(), "Transcribed audio note.");

		Ok(transcript)
	}
}
