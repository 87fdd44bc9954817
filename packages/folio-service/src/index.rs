use tokio::task::JoinSet;

use folio_domain::records::{Holding, Trade};
use folio_storage::models::{EmbeddedItem, ItemMetadata};

use crate::{Error, FolioService, Result};

/// Readiness of the embedding index, owned by the service instance so
/// independent services (and tests) never share state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexState {
	Uninitialized,
	Building { percent: u8 },
	Ready,
	Failed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BuildReport {
	pub expected: usize,
	pub indexed: usize,
	/// Zero-based offsets of batches the provider failed; their records are
	/// absent from this run's index.
	pub failed_batches: Vec<usize>,
	pub from_cache: bool,
}

struct PendingItem {
	id: i64,
	text: String,
	metadata: ItemMetadata,
}

struct BatchJob {
	index: usize,
	start: usize,
	items: Vec<PendingItem>,
}

impl FolioService {
	/// Builds or loads the embedding index. Idempotent: once an index is
	/// building or ready, further calls are a no-op returning `None`.
	///
	/// A failed embedding batch is logged and skipped rather than aborting
	/// the build; availability is favored over completeness.
	pub async fn build_index(
		&self,
		holdings: &[Holding],
		trades: &[Trade],
		mut on_progress: impl FnMut(u8),
	) -> Result<Option<BuildReport>> {
		{
			let mut state = self.lock_index_state();

			match *state {
				IndexState::Building { .. } | IndexState::Ready => {
					tracing::info!("Index build skipped; an index is already building or ready.");

					return Ok(None);
				},
				IndexState::Uninitialized | IndexState::Failed => {
					*state = IndexState::Building { percent: 0 };
				},
			}
		}

		let result = self.build_index_inner(holdings, trades, &mut on_progress).await;

		match &result {
			Ok(_) => self.set_index_state(IndexState::Ready),
			Err(err) => {
				tracing::error!(error = %err, "Index build failed.");
				self.set_index_state(IndexState::Failed);
			},
		}

		result.map(Some)
	}

	async fn build_index_inner(
		&self,
		holdings: &[Holding],
		trades: &[Trade],
		on_progress: &mut impl FnMut(u8),
	) -> Result<BuildReport> {
		let pending = synthesize_items(holdings, trades);
		let expected = pending.len();
		let fingerprint = content_fingerprint(&pending);
		let dimensions = self.cfg.providers.embedding.dimensions as usize;
		let tolerance = self.cfg.index.staleness_tolerance;

		match self.cache.load_all().await {
			Ok(cached) if cache_is_valid(&cached, expected, tolerance, dimensions) => {
				if let Ok(Some(stored)) = self.cache.fingerprint().await
					&& stored != fingerprint
				{
					tracing::warn!(
						"Cached row count matches the loaded records but the content fingerprint differs; reusing the cache anyway."
					);
				}

				let indexed = cached.len();

				self.store.replace_all(cached);
				self.report_progress(on_progress, 100);
				tracing::info!(indexed, "Loaded embedding index from cache; skipping provider calls.");

				return Ok(BuildReport {
					expected,
					indexed,
					failed_batches: Vec::new(),
					from_cache: true,
				});
			},
			Ok(_) => {
				tracing::info!("Cached index is missing or stale; regenerating embeddings.");
			},
			Err(err) => {
				tracing::warn!(error = %err, "Embedding cache unavailable; regenerating embeddings.");
			},
		}

		if expected == 0 {
			self.store.replace_all(Vec::new());
			self.report_progress(on_progress, 100);
			tracing::info!("No records to index.");

			return Ok(BuildReport {
				expected: 0,
				indexed: 0,
				failed_batches: Vec::new(),
				from_cache: false,
			});
		}

		let jobs = partition_batches(pending, self.cfg.index.batch_size);
		let batch_count = jobs.len();
		// Completed batches land in per-batch slots and are flattened in
		// batch order below, so insertion order equals id order no matter
		// how the workers interleave.
		let mut slots: Vec<Option<Vec<EmbeddedItem>>> = Vec::new();
		let mut failed_batches = Vec::new();
		let mut workers = JoinSet::new();
		let mut queue = jobs.into_iter();
		let mut max_completed_end = 0_usize;

		slots.resize_with(batch_count, || None);

		loop {
			while workers.len() < self.cfg.index.max_concurrent_batches {
				let Some(job) = queue.next() else {
					break;
				};
				let provider = self.providers.embedding.clone();
				let cfg = self.cfg.providers.embedding.clone();

				workers.spawn(async move {
					let texts: Vec<String> =
						job.items.iter().map(|item| item.text.clone()).collect();
					let result = provider.embed(&cfg, &texts).await;

					(job, result)
				});
			}

			let Some(joined) = workers.join_next().await else {
				break;
			};
			let (job, result) = joined.map_err(|err| Error::Provider {
				message: format!("Embedding worker task failed: {err}."),
			})?;
			let BatchJob { index, start, items } = job;
			let end = start + items.len();

			match result {
				Ok(vectors) => match finish_batch(items, vectors, dimensions) {
					Ok(embedded) => {
						slots[index] = Some(embedded);
					},
					Err(message) => {
						tracing::error!(
							batch = index,
							"Embedding batch rejected ({message}); its records will be absent from this index."
						);
						failed_batches.push(index);
					},
				},
				Err(err) => {
					tracing::error!(
						error = %err,
						batch = index,
						"Embedding batch failed; its records will be absent from this index."
					);
					failed_batches.push(index);
				},
			}

			// Progress tracks the furthest completed offset so it stays
			// monotonic when batches finish out of order.
			max_completed_end = max_completed_end.max(end);
			self.report_progress(on_progress, progress_percent(max_completed_end, expected));
		}

		let mut items = Vec::with_capacity(expected);

		for slot in slots {
			if let Some(batch) = slot {
				items.extend(batch);
			}
		}

		let indexed = items.len();

		self.store.replace_all(items);

		if let Err(err) = self.cache.save_all(&self.store.snapshot(), &fingerprint).await {
			tracing::warn!(
				error = %err,
				"Failed to persist the embedding index; the in-memory index stays usable for this process."
			);
		}

		failed_batches.sort_unstable();
		tracing::info!(
			indexed,
			expected,
			failed_batches = failed_batches.len(),
			"Embedding index built."
		);

		Ok(BuildReport { expected, indexed, failed_batches, from_cache: false })
	}

	fn report_progress(&self, on_progress: &mut impl FnMut(u8), percent: u8) {
		self.set_index_state(IndexState::Building { percent });
		on_progress(percent);
	}
}

fn synthesize_items(holdings: &[Holding], trades: &[Trade]) -> Vec<PendingItem> {
	let mut items = Vec::with_capacity(holdings.len() + trades.len());

	for holding in holdings {
		items.push(PendingItem {
			id: items.len() as i64,
			text: holding.describe(),
			metadata: ItemMetadata::Holding(holding.clone()),
		});
	}
	for trade in trades {
		items.push(PendingItem {
			id: items.len() as i64,
			text: trade.describe(),
			metadata: ItemMetadata::Trade(trade.clone()),
		});
	}

	items
}

fn content_fingerprint(items: &[PendingItem]) -> String {
	let mut hasher = blake3::Hasher::new();

	for item in items {
		hasher.update(item.text.as_bytes());
		hasher.update(b"\n");
	}

	hasher.finalize().to_hex().to_string()
}

fn partition_batches(items: Vec<PendingItem>, batch_size: usize) -> Vec<BatchJob> {
	let mut jobs: Vec<BatchJob> = Vec::new();
	let mut batch = Vec::with_capacity(batch_size);
	let mut start = 0_usize;

	for item in items {
		batch.push(item);

		if batch.len() == batch_size {
			jobs.push(BatchJob {
				index: jobs.len(),
				start,
				items: std::mem::replace(&mut batch, Vec::with_capacity(batch_size)),
			});
			start += batch_size;
		}
	}
	if !batch.is_empty() {
		jobs.push(BatchJob { index: jobs.len(), start, items: batch });
	}

	jobs
}

fn finish_batch(
	items: Vec<PendingItem>,
	vectors: Vec<Vec<f32>>,
	dimensions: usize,
) -> Result<Vec<EmbeddedItem>, String> {
	if vectors.len() != items.len() {
		return Err(format!(
			"provider returned {} vectors for {} texts",
			vectors.len(),
			items.len()
		));
	}

	for vector in &vectors {
		if vector.len() != dimensions {
			return Err(format!(
				"embedding dimension {} does not match the configured {dimensions}",
				vector.len()
			));
		}
	}

	Ok(items
		.into_iter()
		.zip(vectors)
		.map(|(pending, embedding)| EmbeddedItem {
			id: pending.id,
			text: pending.text,
			embedding,
			metadata: pending.metadata,
		})
		.collect())
}

fn cache_is_valid(
	cached: &[EmbeddedItem],
	expected: usize,
	tolerance: usize,
	dimensions: usize,
) -> bool {
	if cached.is_empty() {
		return false;
	}
	if cached.len().abs_diff(expected) >= tolerance {
		return false;
	}

	cached.iter().all(|item| item.embedding.len() == dimensions)
}

fn progress_percent(completed_end: usize, expected: usize) -> u8 {
	if expected == 0 {
		return 100;
	}

	let percent = ((completed_end as f64 / expected as f64) * 100.0).round() as u8;

	percent.min(100)
}
