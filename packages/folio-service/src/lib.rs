pub mod chat;
pub mod context;
pub mod index;
pub mod search;

mod error;

pub use error::{Error, Result};

use std::{
	future::Future,
	pin::Pin,
	sync::{Arc, Mutex},
};

use serde_json::Value;

pub use chat::{ChatTurn, Role};
pub use index::{BuildReport, IndexState};
pub use search::SearchItem;

use folio_config::{Config, EmbeddingProviderConfig};
use folio_providers::embedding;
use folio_storage::{cache::Cache, vector_store::VectorStore};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

/// The opaque text-completion capability this subsystem hands its prompt
/// to. Transport and model choice belong to the host; only the message
/// contract lives here.
pub trait CompletionProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(&'a self, messages: &'a [Value]) -> BoxFuture<'a, color_eyre::Result<String>>;
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
}

impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>) -> Self {
		Self { embedding }
	}
}

impl Default for Providers {
	fn default() -> Self {
		Self { embedding: Arc::new(DefaultProviders) }
	}
}

pub struct FolioService {
	pub cfg: Config,
	pub cache: Cache,
	pub store: VectorStore,
	pub providers: Providers,
	index_state: Mutex<IndexState>,
}

impl FolioService {
	pub fn new(cfg: Config, cache: Cache) -> Self {
		Self::with_providers(cfg, cache, Providers::default())
	}

	pub fn with_providers(cfg: Config, cache: Cache, providers: Providers) -> Self {
		Self {
			cfg,
			cache,
			store: VectorStore::new(),
			providers,
			index_state: Mutex::new(IndexState::Uninitialized),
		}
	}

	pub fn index_state(&self) -> IndexState {
		*self.index_state.lock().unwrap_or_else(|err| err.into_inner())
	}

	pub(crate) fn set_index_state(&self, state: IndexState) {
		*self.index_state.lock().unwrap_or_else(|err| err.into_inner()) = state;
	}

	pub(crate) fn lock_index_state(&self) -> std::sync::MutexGuard<'_, IndexState> {
		self.index_state.lock().unwrap_or_else(|err| err.into_inner())
	}
}
