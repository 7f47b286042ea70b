mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, Elasticsearch, EmbeddingProviderConfig, GenerationProviderConfig, Postgres, Providers,
	Resolution, ResolutionEndpoint, Retrieval, Service, Storage,
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
	if cfg.service.poll_interval_ms == 0 {
		return Err(Error::Validation {
			message: "service.poll_interval_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	for (label, value) in [
		("storage.elasticsearch.url", &cfg.storage.elasticsearch.url),
		("storage.elasticsearch.documents_index", &cfg.storage.elasticsearch.documents_index),
		("storage.elasticsearch.pages_index", &cfg.storage.elasticsearch.pages_index),
		("storage.elasticsearch.vectors_index", &cfg.storage.elasticsearch.vectors_index),
		("storage.elasticsearch.responses_index", &cfg.storage.elasticsearch.responses_index),
		("providers.resolution.gampes.url", &cfg.providers.resolution.gampes.url),
		("providers.resolution.mni.url", &cfg.providers.resolution.mni.url),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding.api_key must be non-empty.".to_string(),
		});
	}
	if cfg.providers.generation.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.generation.api_key must be non-empty.".to_string(),
		});
	}
	if cfg.providers.generation.max_tokens == 0 {
		return Err(Error::Validation {
			message: "providers.generation.max_tokens must be greater than zero.".to_string(),
		});
	}
	if !(0.0..=2.0).contains(&cfg.providers.generation.temperature) {
		return Err(Error::Validation {
			message: "providers.generation.temperature must be in the range 0.0-2.0.".to_string(),
		});
	}
	if cfg.retrieval.lexical_top_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.lexical_top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.vector_top_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.vector_top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.fused_top_n == 0 {
		return Err(Error::Validation {
			message: "retrieval.fused_top_n must be greater than zero.".to_string(),
		});
	}
	if !cfg.retrieval.rrf_k.is_finite() || cfg.retrieval.rrf_k <= 0.0 {
		return Err(Error::Validation {
			message: "retrieval.rrf_k must be a positive finite number.".to_string(),
		});
	}
	if !(-1.0..=1.0).contains(&cfg.retrieval.similarity_threshold) {
		return Err(Error::Validation {
			message: "retrieval.similarity_threshold must be in the range -1.0-1.0.".to_string(),
		});
	}
	if cfg.retrieval.max_context_chars == 0 {
		return Err(Error::Validation {
			message: "retrieval.max_context_chars must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for url in [
		&mut cfg.storage.elasticsearch.url,
		&mut cfg.providers.embedding.api_base,
		&mut cfg.providers.generation.api_base,
		&mut cfg.providers.resolution.gampes.url,
		&mut cfg.providers.resolution.mni.url,
	] {
		while url.ends_with('/') {
			url.pop();
		}
	}
}
