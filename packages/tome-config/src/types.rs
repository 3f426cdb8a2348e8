use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub search: Search,
	pub agents: Agents,
	#[serde(default)]
	pub security: Security,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub vector_index: VectorIndex,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VectorIndex {
	/// Backing file. Created on the first save when missing.
	pub path: PathBuf,
	pub dimensions: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub generation: LlmProviderConfig,
	pub transcription: ProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	/// Checked when the provider is first called, not at load time.
	#[serde(default)]
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	#[serde(default)]
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	#[serde(default)]
	pub api_key: String,
	pub path: String,
	pub model: String,
	/// Model used by `ask-web`. Falls back to `model`.
	#[serde(default)]
	pub web_model: Option<String>,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	/// Vector search breadth, also the number of notes placed in a prompt.
	pub top_k: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Agents {
	pub rules_path: PathBuf,
	#[serde(default = "default_output_dir")]
	pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Security {
	/// Base64 encoded 32-byte key.
	#[serde(default)]
	pub encryption_key: Option<String>,
}

impl LlmProviderConfig {
	pub fn web_model(&self) -> &str {
		self.web_model.as_deref().unwrap_or(&self.model)
	}
}

fn default_output_dir() -> PathBuf {
	PathBuf::from(".")
}
