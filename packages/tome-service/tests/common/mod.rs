#![allow(dead_code)]

use std::{
	collections::BTreeMap,
	path::Path,
	sync::{
		Arc, Mutex,
		atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering},
	},
};

use serde_json::Map;
use time::OffsetDateTime;

use tome_config::{
	Agents, Config, EmbeddingProviderConfig, LlmProviderConfig, Postgres, ProviderConfig,
	Providers as ProviderConfigs, Search, Security, Service, Storage, VectorIndex,
};
use tome_domain::{Note, NoteChanges, NoteFilter};
use tome_service::{
	BoxFuture, EmbeddingProvider, GenerationProvider, NoteStore, Providers, TomeService,
	TranscriptionProvider,
};

/// Each word of the vocabulary owns one dimension; other words are ignored.
pub const VOCABULARY: [&str; 8] =
	["apple", "banana", "rocket", "engine", "tomato", "garden", "dentist", "milk"];

pub fn words(text: &str) -> Vec<String> {
	text.split(|c: char| !c.is_alphanumeric())
		.filter(|word| !word.is_empty())
		.map(str::to_lowercase)
		.collect()
}

#[derive(Default)]
pub struct MemoryStore {
	notes: Mutex<BTreeMap<i64, Note>>,
	seq: AtomicI64,
	pub fail_updates: AtomicBool,
}
impl MemoryStore {
	pub fn notes(&self) -> Vec<Note> {
		self.notes.lock().expect("store lock").values().cloned().collect()
	}

	fn storage_error() -> tome_storage::Error {
		tome_storage::Error::Io(std::io::Error::other("Injected storage failure."))
	}
}
impl NoteStore for MemoryStore {
	fn next_note_id(&self) -> BoxFuture<'_, tome_storage::Result<i64>> {
		let id = self.seq.fetch_add(1, Ordering::SeqCst) + 1;

		Box::pin(async move { Ok(id) })
	}

	fn insert_note<'a>(&'a self, note: &'a Note) -> BoxFuture<'a, tome_storage::Result<()>> {
		self.notes.lock().expect("store lock").insert(note.note_id, note.clone());

		Box::pin(async { Ok(()) })
	}

	fn find_notes<'a>(
		&'a self,
		filter: &'a NoteFilter,
	) -> BoxFuture<'a, tome_storage::Result<Vec<Note>>> {
		let notes = self
			.notes
			.lock()
			.expect("store lock")
			.values()
			.filter(|note| filter.matches(note))
			.cloned()
			.collect();

		Box::pin(async move { Ok(notes) })
	}

	fn get_note(&self, note_id: i64) -> BoxFuture<'_, tome_storage::Result<Option<Note>>> {
		let note = self.notes.lock().expect("store lock").get(&note_id).cloned();

		Box::pin(async move { Ok(note) })
	}

	fn update_note<'a>(
		&'a self,
		note_id: i64,
		changes: &'a NoteChanges,
		updated_at: OffsetDateTime,
	) -> BoxFuture<'a, tome_storage::Result<u64>> {
		if self.fail_updates.load(Ordering::SeqCst) {
			return Box::pin(async { Err(Self::storage_error()) });
		}

		let mut notes = self.notes.lock().expect("store lock");
		let modified = match notes.get_mut(&note_id) {
			Some(note) => {
				if let Some(title) = changes.title.clone() {
					note.title = title;
				}
				if let Some(content) = changes.content.clone() {
					note.content = content;
				}
				if let Some(tags) = changes.tags.clone() {
					note.tags = tags;
				}
				if let Some(workspace) = changes.workspace.clone() {
					note.workspace = workspace;
				}
				if let Some(encrypted) = changes.encrypted {
					note.encrypted = encrypted;
				}

				note.updated_at = updated_at;

				1
			},
			None => 0,
		};

		Box::pin(async move { Ok(modified) })
	}

	fn delete_note(&self, note_id: i64) -> BoxFuture<'_, tome_storage::Result<u64>> {
		let deleted = self.notes.lock().expect("store lock").remove(&note_id).map_or(0, |_| 1);

		Box::pin(async move { Ok(deleted) })
	}

	fn full_text_search<'a>(
		&'a self,
		query: &'a str,
	) -> BoxFuture<'a, tome_storage::Result<Vec<Note>>> {
		let terms = words(query);
		let notes = self
			.notes
			.lock()
			.expect("store lock")
			.values()
			.filter(|note| {
				let haystack = words(&format!("{} {}", note.title, note.content));

				terms.iter().any(|term| haystack.contains(term))
			})
			.cloned()
			.collect();

		Box::pin(async move { Ok(notes) })
	}
}

/// Counts vocabulary words per dimension.
#[derive(Default)]
pub struct VocabularyEmbedding {
	pub calls: AtomicUsize,
	pub fail: AtomicBool,
}
impl EmbeddingProvider for VocabularyEmbedding {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, tome_providers::Result<Vec<Vec<f32>>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		if self.fail.load(Ordering::SeqCst) {
			return Box::pin(async {
				Err(tome_providers::Error::InvalidResponse {
					message: "Embedding service unavailable.".to_string(),
				})
			});
		}

		let dims = cfg.dimensions as usize;
		let vectors = texts
			.iter()
			.map(|text| {
				let mut vector = vec![0.0; dims];

				for word in words(text) {
					if let Some(slot) = VOCABULARY.iter().position(|known| *known == word) {
						vector[slot % dims] += 1.0;
					}
				}

				vector
			})
			.collect();

		Box::pin(async move { Ok(vectors) })
	}
}

#[derive(Clone, Debug)]
pub enum Reply {
	Text(String),
	Fail,
	MissingCredential,
}

/// Records every prompt and answers with the configured reply.
pub struct SpyGeneration {
	pub calls: Mutex<Vec<(String, String)>>,
	pub reply: Mutex<Reply>,
}
impl SpyGeneration {
	pub fn new(reply: Reply) -> Self {
		Self { calls: Mutex::new(Vec::new()), reply: Mutex::new(reply) }
	}

	pub fn count(&self) -> usize {
		self.calls.lock().expect("calls lock").len()
	}

	pub fn prompts(&self) -> Vec<String> {
		self.calls.lock().expect("calls lock").iter().map(|(_, prompt)| prompt.clone()).collect()
	}

	pub fn models(&self) -> Vec<String> {
		self.calls.lock().expect("calls lock").iter().map(|(model, _)| model.clone()).collect()
	}

	pub fn set_reply(&self, reply: Reply) {
		*self.reply.lock().expect("reply lock") = reply;
	}
}
impl GenerationProvider for SpyGeneration {
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		model: &'a str,
		prompt: &'a str,
	) -> BoxFuture<'a, tome_providers::Result<String>> {
		self.calls.lock().expect("calls lock").push((model.to_string(), prompt.to_string()));

		let reply = self.reply.lock().expect("reply lock").clone();

		Box::pin(async move {
			match reply {
				Reply::Text(text) => Ok(text),
				Reply::Fail => Err(tome_providers::Error::InvalidResponse {
					message: "Quota exceeded.".to_string(),
				}),
				Reply::MissingCredential => {
					Err(tome_providers::Error::MissingCredential { provider: cfg.provider_id.clone() })
				},
			}
		})
	}
}

pub struct StubTranscription {
	pub transcript: Option<String>,
}
impl TranscriptionProvider for StubTranscription {
	fn transcribe<'a>(
		&'a self,
		_cfg: &'a ProviderConfig,
		_file_name: &'a str,
		audio: Vec<u8>,
	) -> BoxFuture<'a, tome_providers::Result<String>> {
		let result = match self.transcript.clone() {
			Some(text) if !audio.is_empty() => Ok(text),
			_ => Err(tome_providers::Error::InvalidResponse {
				message: "Could not understand audio.".to_string(),
			}),
		};

		Box::pin(async move { result })
	}
}

pub fn test_config(dir: &Path) -> Config {
	Config {
		service: Service { log_level: "debug".to_string() },
		storage: Storage {
			postgres: Postgres {
				dsn: "postgres://unused@127.0.0.1/tome".to_string(),
				pool_max_conns: 1,
			},
			vector_index: VectorIndex { path: dir.join("index.json"), dimensions: 8 },
		},
		providers: ProviderConfigs {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/embeddings".to_string(),
				model: "vocabulary".to_string(),
				dimensions: 8,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			generation: LlmProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/chat/completions".to_string(),
				model: "notes-model".to_string(),
				web_model: Some("web-model".to_string()),
				temperature: 0.2,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			transcription: ProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/audio/transcriptions".to_string(),
				model: "whisper-1".to_string(),
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		search: Search { top_k: 5 },
		agents: Agents { rules_path: dir.join("agents.json"), output_dir: dir.join("out") },
		security: Security::default(),
	}
}

pub struct Harness {
	pub service: Arc<TomeService>,
	pub store: Arc<MemoryStore>,
	pub embedding: Arc<VocabularyEmbedding>,
	pub generation: Arc<SpyGeneration>,
	pub dir: tempfile::TempDir,
}

pub fn harness() -> Harness {
	harness_with(|_| {}, Reply::Text("Answer.".to_string()))
}

pub fn harness_with(configure: impl FnOnce(&mut Config), reply: Reply) -> Harness {
	let dir = tempfile::tempdir().expect("Failed to create temp dir.");
	let mut cfg = test_config(dir.path());

	configure(&mut cfg);

	let store = Arc::new(MemoryStore::default());
	let embedding = Arc::new(VocabularyEmbedding::default());
	let generation = Arc::new(SpyGeneration::new(reply));
	let transcription =
		Arc::new(StubTranscription { transcript: Some("Buy milk after work".to_string()) });
	let providers = Providers::new(embedding.clone(), generation.clone(), transcription);
	let service = Arc::new(TomeService::with_store(cfg, store.clone(), providers));

	Harness { service, store, embedding, generation, dir }
}
