pub mod commands;
pub mod mic;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tome_service::{TomeService, crypto};
use tome_storage::db::Db;

#[derive(Debug, Parser)]
#[command(
	version = tome_cli::VERSION,
	rename_all = "kebab",
	styles = tome_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE", default_value = "tome.toml")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Create the Postgres tables and indexes.
	InitDb,
	/// Print a new base64 key for `security.encryption_key`.
	Keygen,
	/// Add a text note, or a voice note with `--audio`.
	Add(commands::AddArgs),
	/// Add a note transcribed from an audio file.
	AddVoice(commands::AddVoiceArgs),
	/// Record a voice note from the microphone. Enter starts and stops the recording.
	AddMicVoice(commands::AddMicVoiceArgs),
	List(commands::ListArgs),
	Edit(commands::EditArgs),
	Delete {
		id: i64,
	},
	/// Full-text search over titles and content.
	Search {
		query: String,
	},
	/// Notes closest in meaning to the query.
	Similar {
		query: String,
		#[arg(long, short = 'k')]
		k: Option<usize>,
	},
	/// Ask a question answered from your notes.
	Ask {
		question: String,
	},
	/// Ask for a current answer, with your notes as extra context.
	AskWeb {
		question: String,
	},
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	if let Command::Keygen = args.command {
		println!("{}", crypto::generate_key());

		return Ok(());
	}

	let config = tome_config::load(&args.config)?;

	init_tracing(&config)?;

	let db = Db::connect(&config.storage.postgres).await?;

	if let Command::InitDb = args.command {
		db.ensure_schema().await?;

		println!("Database schema is ready.");

		return Ok(());
	}

	let service = TomeService::new(config, db);
	let result = commands::dispatch(&service, args.command).await;

	// Persist index changes even when the command itself failed after mutating it.
	if service.save_index().await? {
		tracing::debug!(path = ?service.cfg.storage.vector_index.path, "Vector index saved.");
	}

	result
}

fn init_tracing(config: &tome_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	Ok(())
}
