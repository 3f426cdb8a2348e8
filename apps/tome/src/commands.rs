use std::path::PathBuf;

use clap::Args;
use color_eyre::eyre;

use crate::{Command, mic};
use tome_domain::{Note, NoteChanges, NoteFilter, parse_tags};
use tome_service::{AgentReport, NewNote, NoteBody, TomeService, crypto::ContentCipher};

#[derive(Debug, Args)]
pub struct AddArgs {
	pub title: String,
	#[arg(long, default_value = "")]
	pub content: String,
	/// Comma separated tags.
	#[arg(long, default_value = "")]
	pub tags: String,
	#[arg(long)]
	pub workspace: Option<String>,
	#[arg(long)]
	pub encrypt: bool,
	/// Transcribe this audio file and use the transcript as content.
	#[arg(long, value_name = "FILE")]
	pub audio: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct AddVoiceArgs {
	#[arg(value_name = "FILE")]
	pub audio: PathBuf,
	#[arg(long, default_value = "Voice note")]
	pub title: String,
	#[arg(long, default_value = "")]
	pub tags: String,
	#[arg(long)]
	pub workspace: Option<String>,
	#[arg(long)]
	pub encrypt: bool,
}

#[derive(Debug, Args)]
pub struct AddMicVoiceArgs {
	#[arg(long, default_value = "Voice note")]
	pub title: String,
	#[arg(long, default_value = "")]
	pub tags: String,
	#[arg(long)]
	pub workspace: Option<String>,
	#[arg(long)]
	pub encrypt: bool,
}

#[derive(Debug, Args)]
pub struct ListArgs {
	#[arg(long)]
	pub workspace: Option<String>,
	/// Only notes carrying all of these comma separated tags.
	#[arg(long, default_value = "")]
	pub tags: String,
	/// Show the plaintext of encrypted notes.
	#[arg(long)]
	pub decrypt: bool,
}

#[derive(Debug, Args)]
pub struct EditArgs {
	pub id: i64,
	#[arg(long)]
	pub title: Option<String>,
	#[arg(long)]
	pub content: Option<String>,
	/// Replaces the tag set. Comma separated.
	#[arg(long)]
	pub tags: Option<String>,
	/// Encrypt the new content. Requires `--content`.
	#[arg(long)]
	pub encrypt: bool,
}

pub async fn dispatch(service: &TomeService, command: Command) -> color_eyre::Result<()> {
	match command {
		Command::Add(args) => {
			let body = match args.audio {
				Some(path) => NoteBody::Audio(path),
				None => NoteBody::Text(args.content),
			};
			let note = NewNote {
				title: args.title,
				body,
				tags: parse_tags(&args.tags),
				workspace: args.workspace,
				encrypt: args.encrypt,
			};

			add(service, note).await
		},
		Command::AddVoice(args) => {
			let note = NewNote {
				title: args.title,
				body: NoteBody::Audio(args.audio),
				tags: parse_tags(&args.tags),
				workspace: args.workspace,
				encrypt: args.encrypt,
			};

			add(service, note).await
		},
		Command::AddMicVoice(args) => {
			// The recording lives until the note is created.
			let recording = mic::record_wav().await?;
			let note = NewNote {
				title: args.title,
				body: NoteBody::Audio(recording.path().to_path_buf()),
				tags: parse_tags(&args.tags),
				workspace: args.workspace,
				encrypt: args.encrypt,
			};

			add(service, note).await
		},
		Command::List(args) => list(service, args).await,
		Command::Edit(args) => edit(service, args).await,
		Command::Delete { id } => {
			let deleted = service.delete(id).await?;

			println!("Deleted {deleted} note(s).");

			Ok(())
		},
		Command::Search { query } => {
			let notes = service.full_text_search(&query).await?;

			if notes.is_empty() {
				println!("No results found for: {query}");
			}

			print_notes(&notes);

			Ok(())
		},
		Command::Similar { query, k } => {
			let k = k.unwrap_or(service.cfg.search.top_k as usize);

			print_notes(&service.similar(&query, k).await?);

			Ok(())
		},
		Command::Ask { question } => {
			println!("Answer: {}", service.ask(&question).await?);

			Ok(())
		},
		Command::AskWeb { question } => {
			println!("Answer: {}", service.ask_web(&question).await?);

			Ok(())
		},
		Command::InitDb | Command::Keygen => {
			Err(eyre::eyre!("Command is handled before the service starts."))
		},
	}
}

async fn add(service: &TomeService, note: NewNote) -> color_eyre::Result<()> {
	let note_id = service.create(note).await?;

	println!("Note added with ID {note_id}.");

	run_agents(service, note_id).await
}

async fn list(service: &TomeService, args: ListArgs) -> color_eyre::Result<()> {
	let filter =
		NoteFilter { workspace: args.workspace, tags: parse_tags(&args.tags), note_ids: None };
	let notes = service.list(&filter).await?;
	let notes = if args.decrypt && notes.iter().any(|note| note.encrypted) {
		let cipher = ContentCipher::from_config(&service.cfg)?;

		notes.into_iter().map(|note| cipher.decrypt_note(note)).collect::<Result<Vec<_>, _>>()?
	} else {
		notes
	};

	print_notes(&notes);

	Ok(())
}

async fn edit(service: &TomeService, args: EditArgs) -> color_eyre::Result<()> {
	if args.encrypt && args.content.is_none() {
		return Err(eyre::eyre!("--encrypt requires --content."));
	}

	let changes = NoteChanges {
		title: args.title,
		content: args.content,
		tags: args.tags.as_deref().map(parse_tags),
		workspace: None,
		encrypted: Some(args.encrypt),
	};
	let modified = service.update(args.id, changes).await?;

	println!("Modified {modified} note(s).");

	if modified > 0 {
		run_agents(service, args.id).await?;
	}

	Ok(())
}

async fn run_agents(service: &TomeService, note_id: i64) -> color_eyre::Result<()> {
	let Some(note) = service.get_note(note_id).await? else {
		return Ok(());
	};
	let report = service.run_agents(&note).await;

	print_report(&report);

	Ok(())
}

fn print_report(report: &AgentReport) {
	if !report.fired.is_empty() {
		println!("Agents applied: {}", report.fired.join(", "));
	}
	if !report.failed.is_empty() {
		println!("Agents failed: {}", report.failed.join(", "));
	}
	if !report.unknown.is_empty() {
		println!("Agents with unknown actions: {}", report.unknown.join(", "));
	}
}

fn print_notes(notes: &[Note]) {
	for note in notes {
		let content = if note.encrypted { "[encrypted]" } else { note.content.as_str() };

		println!(
			"ID: {} | Title: {} | Tags: {} | Workspace: {} | Content: {content}",
			note.note_id,
			note.title,
			note.tags.join(", "),
			note.workspace,
		);
	}
}
