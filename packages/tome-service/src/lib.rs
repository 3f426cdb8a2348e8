pub mod actions;
pub mod add_note;
pub mod agents;
pub mod ask;
pub mod crypto;
pub mod delete;
pub mod list;
pub mod notes;
pub mod search;
pub mod store;
pub mod update;

mod error;
mod index;

pub use add_note::{NewNote, NoteBody};
pub use agents::{ActionRegistry, AgentAction, AgentReport};
pub use ask::{AI_FAILURE_ANSWER, NO_MATCH_ANSWER};
pub use error::{ActionError, Error, Result};
pub use store::NoteStore;

use std::{
	collections::HashMap,
	future::Future,
	pin::Pin,
	sync::{Arc, Mutex},
};

use tokio::sync::OnceCell;

use tome_config::{Config, EmbeddingProviderConfig, LlmProviderConfig, ProviderConfig};
use tome_providers::{embedding, generation, transcription};
use tome_storage::{db::Db, vector::VectorIndex};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, tome_providers::Result<Vec<Vec<f32>>>>;
}

pub trait GenerationProvider
where
	Self: Send + Sync,
{
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		model: &'a str,
		prompt: &'a str,
	) -> BoxFuture<'a, tome_providers::Result<String>>;
}

pub trait TranscriptionProvider
where
	Self: Send + Sync,
{
	fn transcribe<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		file_name: &'a str,
		audio: Vec<u8>,
	) -> BoxFuture<'a, tome_providers::Result<String>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub generation: Arc<dyn GenerationProvider>,
	pub transcription: Arc<dyn TranscriptionProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		generation: Arc<dyn GenerationProvider>,
		transcription: Arc<dyn TranscriptionProvider>,
	) -> Self {
		Self { embedding, generation, transcription }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), generation: provider.clone(), transcription: provider }
	}
}

/// Notes, their vector index and the agent actions, bound to one configuration.
///
/// The vector index is opened on first use and kept for the lifetime of the service. Callers
/// persist it with [`TomeService::save_index`] after mutating operations.
pub struct TomeService {
	pub cfg: Config,
	pub store: Arc<dyn NoteStore>,
	pub providers: Providers,
	actions: ActionRegistry,
	index: OnceCell<Mutex<VectorIndex>>,
	answers: Mutex<HashMap<String, String>>,
}
impl TomeService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self::with_store(cfg, Arc::new(db), Providers::default())
	}

	pub fn with_store(cfg: Config, store: Arc<dyn NoteStore>, providers: Providers) -> Self {
		Self {
			cfg,
			store,
			providers,
			actions: ActionRegistry::builtin(),
			index: OnceCell::new(),
			answers: Mutex::new(HashMap::new()),
		}
	}

	pub fn with_actions(mut self, actions: ActionRegistry) -> Self {
		self.actions = actions;

		self
	}

	pub fn actions(&self) -> &ActionRegistry {
		&self.actions
	}
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, tome_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl GenerationProvider for DefaultProviders {
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		model: &'a str,
		prompt: &'a str,
	) -> BoxFuture<'a, tome_providers::Result<String>> {
		Box::pin(generation::generate(cfg, model, prompt))
	}
}

impl TranscriptionProvider for DefaultProviders {
	fn transcribe<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		file_name: &'a str,
		audio: Vec<u8>,
	) -> BoxFuture<'a, tome_providers::Result<String>> {
		Box::pin(transcription::transcribe(cfg, file_name, audio))
	}
}
