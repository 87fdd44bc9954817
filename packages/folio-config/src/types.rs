use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub index: Index,
	pub search: Search,
	pub chat: Chat,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Storage {
	/// SQLite file holding the persisted embedding index.
	pub cache_path: PathBuf,
	#[serde(default = "default_pool_max_conns")]
	pub pool_max_conns: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Index {
	#[serde(default = "default_batch_size")]
	pub batch_size: usize,
	/// Accepted absolute difference between the cached item count and the
	/// expected record count before the cache is considered stale.
	#[serde(default = "default_staleness_tolerance")]
	pub staleness_tolerance: usize,
	#[serde(default = "default_max_concurrent_batches")]
	pub max_concurrent_batches: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Search {
	#[serde(default = "default_top_k")]
	pub top_k: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Chat {
	/// How many prior conversation turns accompany each completion request.
	#[serde(default = "default_history_turns")]
	pub history_turns: usize,
	#[serde(default = "default_max_context_chars")]
	pub max_context_chars: usize,
}

fn default_pool_max_conns() -> u32 {
	2
}

fn default_batch_size() -> usize {
	50
}

fn default_staleness_tolerance() -> usize {
	5
}

fn default_max_concurrent_batches() -> usize {
	4
}

fn default_top_k() -> usize {
	20
}

fn default_history_turns() -> usize {
	4
}

fn default_max_context_chars() -> usize {
	6_000
}
