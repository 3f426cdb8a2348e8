mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Agents, Config, EmbeddingProviderConfig, LlmProviderConfig, Postgres, ProviderConfig,
	Providers, Search, Security, Service, Storage, VectorIndex,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.vector_index.path.as_os_str().is_empty() {
		return Err(Error::Validation {
			message: "storage.vector_index.path must be non-empty.".to_string(),
		});
	}
	if cfg.storage.vector_index.dimensions == 0 {
		return Err(Error::Validation {
			message: "storage.vector_index.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.vector_index.dimensions {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.vector_index.dimensions."
				.to_string(),
		});
	}

	for (label, timeout_ms) in [
		("embedding", cfg.providers.embedding.timeout_ms),
		("generation", cfg.providers.generation.timeout_ms),
		("transcription", cfg.providers.transcription.timeout_ms),
	] {
		if timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("Provider {label} timeout_ms must be greater than zero."),
			});
		}
	}

	if !cfg.providers.generation.temperature.is_finite()
		|| cfg.providers.generation.temperature < 0.0
	{
		return Err(Error::Validation {
			message: "providers.generation.temperature must be a finite number, zero or greater."
				.to_string(),
		});
	}
	if cfg.search.top_k == 0 {
		return Err(Error::Validation {
			message: "search.top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.agents.rules_path.as_os_str().is_empty() {
		return Err(Error::Validation {
			message: "agents.rules_path must be non-empty.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.security.encryption_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		cfg.security.encryption_key = None;
	}
	if cfg
		.providers
		.generation
		.web_model
		.as_deref()
		.map(|model| model.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.providers.generation.web_model = None;
	}
	if cfg.agents.output_dir.as_os_str().is_empty() {
		cfg.agents.output_dir = ".".into();
	}
}
