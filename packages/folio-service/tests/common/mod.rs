#![allow(dead_code)]

use std::sync::{
	Arc, Mutex,
	atomic::{AtomicUsize, Ordering},
};

use serde_json::Value;
use tempfile::TempDir;

use folio_config::EmbeddingProviderConfig;
use folio_service::{BoxFuture, CompletionProvider, EmbeddingProvider, FolioService, Providers};
use folio_storage::cache::Cache;

/// Deterministic embeddings with a call counter; identical texts get
/// identical vectors.
pub struct StubEmbedding {
	pub dimensions: usize,
	pub calls: Arc<AtomicUsize>,
}

impl StubEmbedding {
	pub fn new(dimensions: usize) -> Self {
		Self { dimensions, calls: Arc::new(AtomicUsize::new(0)) }
	}
}

impl EmbeddingProvider for StubEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		Box::pin(async move {
			Ok(texts
				.iter()
				.map(|text| folio_testkit::deterministic_vector(text, self.dimensions))
				.collect())
		})
	}
}

/// Like `StubEmbedding`, but the n-th call (1-based) fails. Use with
/// `max_concurrent_batches = 1` so call order equals batch order.
pub struct FailingEmbedding {
	pub dimensions: usize,
	pub fail_on_call: usize,
	pub calls: Arc<AtomicUsize>,
}

impl FailingEmbedding {
	pub fn new(dimensions: usize, fail_on_call: usize) -> Self {
		Self { dimensions, fail_on_call, calls: Arc::new(AtomicUsize::new(0)) }
	}
}

impl EmbeddingProvider for FailingEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

		Box::pin(async move {
			if call == self.fail_on_call {
				return Err(color_eyre::eyre::eyre!("Simulated provider outage."));
			}

			Ok(texts
				.iter()
				.map(|text| folio_testkit::deterministic_vector(text, self.dimensions))
				.collect())
		})
	}
}

/// Deterministic embeddings with exact-text overrides, for crafting
/// zero-norm or otherwise known vectors.
pub struct MappedEmbedding {
	pub dimensions: usize,
	pub overrides: Vec<(String, Vec<f32>)>,
}

impl EmbeddingProvider for MappedEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(async move {
			Ok(texts
				.iter()
				.map(|text| {
					self.overrides
						.iter()
						.find(|(key, _)| key == text)
						.map(|(_, vector)| vector.clone())
						.unwrap_or_else(|| {
							folio_testkit::deterministic_vector(text, self.dimensions)
						})
				})
				.collect())
		})
	}
}

/// Records the messages it was handed and replies with a canned answer.
pub struct SpyCompletion {
	pub calls: Arc<AtomicUsize>,
	pub last_messages: Arc<Mutex<Vec<Value>>>,
	pub reply: String,
}

impl SpyCompletion {
	pub fn new(reply: &str) -> Self {
		Self {
			calls: Arc::new(AtomicUsize::new(0)),
			last_messages: Arc::new(Mutex::new(Vec::new())),
			reply: reply.to_string(),
		}
	}
}

impl CompletionProvider for SpyCompletion {
	fn complete<'a>(
		&'a self,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		*self.last_messages.lock().unwrap_or_else(|err| err.into_inner()) = messages.to_vec();

		Box::pin(async move { Ok(self.reply.clone()) })
	}
}

pub async fn build_service(dimensions: u32, providers: Providers) -> (TempDir, FolioService) {
	let (dir, storage) = folio_testkit::temp_storage();
	let cfg = folio_testkit::test_config(storage.cache_path.clone(), dimensions);
	let cache = Cache::connect(&cfg.storage).await.expect("Failed to open cache.");

	(dir, FolioService::with_providers(cfg, cache, providers))
}
