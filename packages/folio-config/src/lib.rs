mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Chat, Config, EmbeddingProviderConfig, Index, Providers, Search, Service, Storage};

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
	if cfg.storage.cache_path.as_os_str().is_empty() {
		return Err(Error::Validation {
			message: "storage.cache_path must be non-empty.".to_string(),
		});
	}
	if cfg.storage.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding.api_key must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.index.batch_size == 0 {
		return Err(Error::Validation {
			message: "index.batch_size must be greater than zero.".to_string(),
		});
	}
	if cfg.index.staleness_tolerance == 0 {
		return Err(Error::Validation {
			message: "index.staleness_tolerance must be greater than zero.".to_string(),
		});
	}
	if cfg.index.max_concurrent_batches == 0 {
		return Err(Error::Validation {
			message: "index.max_concurrent_batches must be greater than zero.".to_string(),
		});
	}
	if cfg.search.top_k == 0 {
		return Err(Error::Validation {
			message: "search.top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.chat.history_turns == 0 {
		return Err(Error::Validation {
			message: "chat.history_turns must be greater than zero.".to_string(),
		});
	}
	if cfg.chat.max_context_chars == 0 {
		return Err(Error::Validation {
			message: "chat.max_context_chars must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	while cfg.providers.embedding.api_base.ends_with('/') {
		cfg.providers.embedding.api_base.pop();
	}

	if !cfg.providers.embedding.path.starts_with('/') {
		cfg.providers.embedding.path.insert(0, '/');
	}
}
