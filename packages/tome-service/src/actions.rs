//! Built-in agent actions.

use std::path::Path;

use time::{
	Duration, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
};
use tokio::{fs, io::AsyncWriteExt};

use crate::{ActionError, AgentAction, BoxFuture, TomeService, crypto::ContentCipher};
use tome_domain::{Note, NoteChanges, normalize_tags, parse_tags};

const ICS_TIMESTAMP: &[BorrowedFormatItem<'static>] =
	format_description!("[year][month][day]T[hour][minute][second]Z");
const LOG_TIMESTAMP: &[BorrowedFormatItem<'static>] =
	format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Schedules the note as a one hour event starting tomorrow.
pub struct CalendarEvent;

impl AgentAction for CalendarEvent {
	fn apply<'a>(
		&'a self,
		service: &'a TomeService,
		note: &'a Note,
	) -> BoxFuture<'a, Result<(), ActionError>> {
		Box::pin(async move {
			let content = plaintext(service, note)?;
			let now = OffsetDateTime::now_utc();
			let ics = render_event(note.note_id, &note.title, &content, now)?;
			let output_dir = service.cfg.agents.output_dir.as_path();
			let events_dir = output_dir.join("calendar_events");
			let event_path = events_dir.join(format!("event_{}.ics", note.note_id));

			fs::create_dir_all(&events_dir).await?;
			fs::write(&event_path, &ics).await?;
			append(&output_dir.join("reminders.ics"), &format!("{ics}\r\n")).await?;

			tracing::info!(note_id = note.note_id, path = ?event_path, "Calendar event written.");

			Ok(())
		})
	}
}

/// Prepares a share message for the note and logs the share.
pub struct ShareToWhatsapp;

impl AgentAction for ShareToWhatsapp {
	fn apply<'a>(
		&'a self,
		service: &'a TomeService,
		note: &'a Note,
	) -> BoxFuture<'a, Result<(), ActionError>> {
		Box::pin(async move {
			let content = plaintext(service, note)?;
			let message = share_message(&note.title, &content);
			let timestamp = OffsetDateTime::now_utc().format(LOG_TIMESTAMP).map_err(format_error)?;
			let output_dir = service.cfg.agents.output_dir.as_path();
			let share_path = output_dir.join(format!("whatsapp_share_{}.txt", note.note_id));

			fs::create_dir_all(output_dir).await?;
			append(
				&output_dir.join("whatsapp_shares.log"),
				&format!("[{timestamp}] WhatsApp Share: {}\nMessage: {message}\n\n", note.title),
			)
			.await?;
			fs::write(&share_path, &message).await?;

			tracing::info!(note_id = note.note_id, path = ?share_path, "Share message written.");

			Ok(())
		})
	}
}

/// Rewrites the note content with the generation provider.
pub struct Rephrase;

impl AgentAction for Rephrase {
	fn apply<'a>(
		&'a self,
		service: &'a TomeService,
		note: &'a Note,
	) -> BoxFuture<'a, Result<(), ActionError>> {
		Box::pin(async move {
			let content = plaintext(service, note)?;
			let rephrased =
				generate(service, &format!("Rephrase the following note: {content}")).await?;
			let changes = NoteChanges {
				content: Some(rephrased),
				encrypted: Some(note.encrypted),
				..Default::default()
			};

			service.update(note.note_id, changes).await?;

			Ok(())
		})
	}
}

/// Adds up to three generated tags to the note.
pub struct SuggestTags;

impl AgentAction for SuggestTags {
	fn apply<'a>(
		&'a self,
		service: &'a TomeService,
		note: &'a Note,
	) -> BoxFuture<'a, Result<(), ActionError>> {
		Box::pin(async move {
			let content = plaintext(service, note)?;
			let raw =
				generate(service, &format!("Suggest 1 to 3 tags for this note: {content}")).await?;
			let suggested = parse_tags(&raw);
			let tags = normalize_tags(note.tags.iter().cloned().chain(suggested.iter().cloned()));

			tracing::debug!(note_id = note.note_id, ?suggested, "Suggested tags.");

			if tags == note.tags {
				return Ok(());
			}

			service
				.update(note.note_id, NoteChanges { tags: Some(tags), ..Default::default() })
				.await?;

			Ok(())
		})
	}
}

/// Renders a single-event iCalendar document.
pub fn render_event(
	note_id: i64,
	title: &str,
	content: &str,
	now: OffsetDateTime,
) -> Result<String, ActionError> {
	let start = now + Duration::days(1);
	let end = start + Duration::hours(1);
	let lines = [
		"BEGIN:VCALENDAR".to_string(),
		"VERSION:2.0".to_string(),
		"PRODID:-//Tome//Agent Calendar Event//EN".to_string(),
		"CALSCALE:GREGORIAN".to_string(),
		"METHOD:PUBLISH".to_string(),
		"BEGIN:VEVENT".to_string(),
		format!("UID:{note_id}@tome"),
		format!("DTSTAMP:{}", now.format(ICS_TIMESTAMP).map_err(format_error)?),
		format!("DTSTART:{}", start.format(ICS_TIMESTAMP).map_err(format_error)?),
		format!("DTEND:{}", end.format(ICS_TIMESTAMP).map_err(format_error)?),
		format!("SUMMARY:{}", escape_text(title)),
		format!("DESCRIPTION:{}", escape_text(content)),
		"STATUS:CONFIRMED".to_string(),
		"SEQUENCE:0".to_string(),
		"END:VEVENT".to_string(),
		"END:VCALENDAR".to_string(),
	];

	Ok(format!("{}\r\n", lines.join("\r\n")))
}

pub fn share_message(title: &str, content: &str) -> String {
	format!("Shared Note: {title}\n\n{content}\n\n---\nShared via Tome")
}

// iCalendar TEXT escaping.
fn escape_text(raw: &str) -> String {
	raw.replace('\\', "\\\\")
		.replace(';', "\\;")
		.replace(',', "\\,")
		.replace("\r\n", "\\n")
		.replace('\n', "\\n")
}

fn plaintext(service: &TomeService, note: &Note) -> Result<String, ActionError> {
	if !note.encrypted {
		return Ok(note.content.clone());
	}

	Ok(ContentCipher::from_config(&service.cfg)?.decrypt(&note.content)?)
}

async fn generate(service: &TomeService, prompt: &str) -> Result<String, ActionError> {
	let cfg = &service.cfg.providers.generation;
	let answer = service
		.providers
		.generation
		.generate(cfg, cfg.model.as_str(), prompt)
		.await
		.map_err(crate::Error::from)?;

	if answer.trim().is_empty() {
		return Err(ActionError::Failed { message: "Generation returned no text.".to_string() });
	}

	Ok(answer)
}

async fn append(path: &Path, text: &str) -> Result<(), ActionError> {
	let mut file = fs::OpenOptions::new().create(true).append(true).open(path).await?;

	file.write_all(text.as_bytes()).await?;
	file.flush().await?;

	Ok(())
}

fn format_error(err: time::error::Format) -> ActionError {
	ActionError::Failed { message: format!("Failed to format timestamp: {err}.") }
}
