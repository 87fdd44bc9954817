use std::cmp::Ordering;

use folio_storage::models::EmbeddedItem;

use crate::{Error, FolioService, IndexState, Result};

#[derive(Clone, Debug)]
pub struct SearchItem {
	pub item: EmbeddedItem,
	pub score: f32,
}

impl FolioService {
	/// Ranks every stored item against the query by cosine similarity and
	/// returns the best `top_k`. An unbuilt index is `Error::NotIndexed`,
	/// never an empty success; callers must be able to tell "nothing
	/// relevant" from "nothing indexed yet".
	pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchItem>> {
		if self.index_state() != IndexState::Ready || self.store.is_empty() {
			return Err(Error::NotIndexed);
		}
		if top_k == 0 {
			return Ok(Vec::new());
		}

		let embedding_cfg = &self.cfg.providers.embedding;
		let vectors =
			self.providers.embedding.embed(embedding_cfg, &[query.to_string()]).await?;
		let Some(query_vector) = vectors.into_iter().next() else {
			return Err(Error::Provider {
				message: "Embedding provider returned no vectors for the query.".to_string(),
			});
		};

		if query_vector.len() != embedding_cfg.dimensions as usize {
			return Err(Error::Provider {
				message: format!(
					"Query embedding dimension {} does not match the configured {}.",
					query_vector.len(),
					embedding_cfg.dimensions
				),
			});
		}

		let hits = self.store.with_items(|items| {
			let mut scored: Vec<(usize, f64)> = items
				.iter()
				.enumerate()
				.map(|(index, item)| (index, cosine_similarity(&query_vector, &item.embedding)))
				.collect();

			// Stable sort: ties keep insertion order. Undefined scores
			// (zero-norm vectors) sort last and are dropped whenever any
			// defined score exists.
			scored.sort_by(|a, b| compare_scores(a.1, b.1));

			if scored.first().map(|(_, score)| !score.is_nan()).unwrap_or(false) {
				scored.retain(|(_, score)| !score.is_nan());
			}

			scored.truncate(top_k);

			scored
				.into_iter()
				.map(|(index, score)| SearchItem {
					item: items[index].clone(),
					score: score as f32,
				})
				.collect::<Vec<_>>()
		});

		tracing::debug!(query, hits = hits.len(), "Similarity search complete.");

		Ok(hits)
	}
}

/// Cosine similarity over the raw vectors with f64 accumulation, so long
/// vectors do not lose precision to cancellation. NaN when either vector
/// has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
	let mut dot = 0.0_f64;
	let mut norm_a = 0.0_f64;
	let mut norm_b = 0.0_f64;

	for (x, y) in a.iter().zip(b.iter()) {
		let x = f64::from(*x);
		let y = f64::from(*y);

		dot += x * y;
		norm_a += x * x;
		norm_b += y * y;
	}

	dot / (norm_a.sqrt() * norm_b.sqrt())
}

fn compare_scores(a: f64, b: f64) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}
