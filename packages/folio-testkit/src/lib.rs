use std::path::PathBuf;

use serde_json::Map;
use tempfile::TempDir;

use folio_config::Config;
use folio_domain::records::{Holding, Trade};

/// A throwaway SQLite location for one test. Keep the `TempDir` alive for
/// as long as the cache is in use.
pub fn temp_storage() -> (TempDir, folio_config::Storage) {
	let dir = TempDir::new().expect("Failed to create temp dir.");
	let storage =
		folio_config::Storage { cache_path: dir.path().join("cache.db"), pool_max_conns: 1 };

	(dir, storage)
}

pub fn test_config(cache_path: PathBuf, dimensions: u32) -> Config {
	Config {
		service: folio_config::Service { log_level: "info".to_string() },
		storage: folio_config::Storage { cache_path, pool_max_conns: 1 },
		providers: folio_config::Providers {
			embedding: folio_config::EmbeddingProviderConfig {
				provider_id: "stub".to_string(),
				api_base: "http://localhost".to_string(),
				api_key: "key".to_string(),
				path: "/v1/embeddings".to_string(),
				model: "stub-embedding".to_string(),
				dimensions,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		index: folio_config::Index {
			batch_size: 50,
			staleness_tolerance: 5,
			max_concurrent_batches: 1,
		},
		search: folio_config::Search { top_k: 20 },
		chat: folio_config::Chat { history_turns: 4, max_context_chars: 6_000 },
	}
}

/// A reproducible non-zero vector derived from the text, so stub providers
/// return stable embeddings without a remote call.
pub fn deterministic_vector(text: &str, dimensions: usize) -> Vec<f32> {
	let mut hasher = blake3::Hasher::new();

	hasher.update(text.as_bytes());

	let mut reader = hasher.finalize_xof();
	let mut bytes = vec![0_u8; dimensions * 4];

	reader.fill(&mut bytes);

	bytes
		.chunks_exact(4)
		.map(|chunk| {
			let raw = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);

			(raw as f64 / u32::MAX as f64 * 2.0 - 1.0) as f32
		})
		.collect()
}

pub fn sample_holding(fund: &str, security_type: &str, mv: f64, pl: f64) -> Holding {
	Holding {
		portfolio_name: fund.to_string(),
		short_name: String::new(),
		security_type_name: security_type.to_string(),
		mv_base: mv,
		pl_ytd: pl,
	}
}

pub fn sample_trade(fund: &str, trade_type: &str, date: &str, qty: f64, price: f64) -> Trade {
	Trade {
		portfolio_name: fund.to_string(),
		trade_type_name: trade_type.to_string(),
		trade_date: date.to_string(),
		quantity: qty,
		price,
	}
}

/// `count` distinct holdings/trades spread over a handful of funds.
pub fn sample_records(holding_count: usize, trade_count: usize) -> (Vec<Holding>, Vec<Trade>) {
	let funds = ["Garfield", "Ytum", "Odie", "Nermal"];
	let holdings = (0..holding_count)
		.map(|i| {
			sample_holding(
				funds[i % funds.len()],
				if i % 2 == 0 { "Equity" } else { "Bond" },
				1_000.0 + i as f64,
				(i as f64) - 10.0,
			)
		})
		.collect();
	let trades = (0..trade_count)
		.map(|i| {
			sample_trade(
				funds[i % funds.len()],
				if i % 2 == 0 { "Buy" } else { "Sell" },
				&format!("2024-03-{:02}", (i % 28) + 1),
				10.0 + i as f64,
				50.0 + i as f64,
			)
		})
		.collect();

	(holdings, trades)
}
