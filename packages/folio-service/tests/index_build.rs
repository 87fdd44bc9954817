mod common;

use std::sync::{Arc, atomic::Ordering};

use folio_service::{Error, IndexState, Providers};
use folio_storage::{
	cache::Cache,
	models::{EmbeddedItem, ItemMetadata},
};
use folio_testkit::{sample_records, temp_storage, test_config};

use common::{FailingEmbedding, StubEmbedding, build_service};

const DIMS: u32 = 8;

#[tokio::test]
async fn three_batches_index_all_records() {
	let stub = StubEmbedding::new(DIMS as usize);
	let calls = stub.calls.clone();
	let (_dir, service) = build_service(DIMS, Providers::new(Arc::new(stub))).await;
	let (holdings, trades) = sample_records(120, 30);
	let mut progress = Vec::new();
	let report = service
		.build_index(&holdings, &trades, |percent| progress.push(percent))
		.await
		.expect("Build failed.")
		.expect("Expected a build report.");

	assert_eq!(calls.load(Ordering::SeqCst), 3);
	assert_eq!(report.expected, 150);
	assert_eq!(report.indexed, 150);
	assert!(report.failed_batches.is_empty());
	assert!(!report.from_cache);
	assert_eq!(service.store.len(), 150);
	assert_eq!(service.index_state(), IndexState::Ready);

	// Progress is monotone and finishes at 100.
	assert!(progress.windows(2).all(|pair| pair[0] <= pair[1]));
	assert_eq!(progress.last().copied(), Some(100));
}

#[tokio::test]
async fn ids_are_dense_holdings_first() {
	let (_dir, service) =
		build_service(DIMS, Providers::new(Arc::new(StubEmbedding::new(DIMS as usize)))).await;
	let (holdings, trades) = sample_records(3, 2);

	service.build_index(&holdings, &trades, |_| {}).await.expect("Build failed.");

	let snapshot = service.store.snapshot();
	let ids: Vec<i64> = snapshot.iter().map(|item| item.id).collect();

	assert_eq!(ids, vec![0, 1, 2, 3, 4]);
	assert!(matches!(snapshot[0].metadata, ItemMetadata::Holding(_)));
	assert!(matches!(snapshot[3].metadata, ItemMetadata::Trade(_)));
	assert_eq!(snapshot[0].text, holdings[0].describe());
	assert_eq!(snapshot[3].text, trades[0].describe());
}

#[tokio::test]
async fn failed_batch_is_skipped_and_build_completes() {
	let stub = FailingEmbedding::new(DIMS as usize, 2);
	let (_dir, service) = build_service(DIMS, Providers::new(Arc::new(stub))).await;
	let (holdings, trades) = sample_records(120, 30);
	let mut progress = Vec::new();
	let report = service
		.build_index(&holdings, &trades, |percent| progress.push(percent))
		.await
		.expect("Build failed.")
		.expect("Expected a build report.");

	assert_eq!(report.failed_batches, vec![1]);
	assert_eq!(report.indexed, 100);
	assert_eq!(progress.last().copied(), Some(100));
	assert_eq!(service.index_state(), IndexState::Ready);

	// The failed batch covered ids 50..=99; everything else survived.
	let ids: Vec<i64> = service.store.snapshot().iter().map(|item| item.id).collect();

	assert!(ids.contains(&0) && ids.contains(&49));
	assert!(!ids.contains(&50) && !ids.contains(&99));
	assert!(ids.contains(&100) && ids.contains(&149));

	// The partial index is still searchable.
	let hits = service.search("garfield equity position", 5).await.expect("Search failed.");

	assert_eq!(hits.len(), 5);
}

#[tokio::test]
async fn second_build_is_a_noop() {
	let stub = StubEmbedding::new(DIMS as usize);
	let calls = stub.calls.clone();
	let (_dir, service) = build_service(DIMS, Providers::new(Arc::new(stub))).await;
	let (holdings, trades) = sample_records(10, 0);

	service
		.build_index(&holdings, &trades, |_| {})
		.await
		.expect("Build failed.")
		.expect("Expected a build report.");

	let calls_after_first = calls.load(Ordering::SeqCst);
	let second = service.build_index(&holdings, &trades, |_| {}).await.expect("Build failed.");

	assert!(second.is_none());
	assert_eq!(calls.load(Ordering::SeqCst), calls_after_first);
}

#[tokio::test]
async fn zero_records_build_is_ready_but_unsearchable() {
	let (_dir, service) =
		build_service(DIMS, Providers::new(Arc::new(StubEmbedding::new(DIMS as usize)))).await;
	let mut progress = Vec::new();
	let report = service
		.build_index(&[], &[], |percent| progress.push(percent))
		.await
		.expect("Build failed.")
		.expect("Expected a build report.");

	assert_eq!(report.indexed, 0);
	assert_eq!(progress, vec![100]);
	assert_eq!(service.index_state(), IndexState::Ready);

	match service.search("anything", 5).await {
		Err(Error::NotIndexed) => {},
		other => panic!("Expected NotIndexed, got {other:?}"),
	}
}

#[tokio::test]
async fn second_process_loads_from_cache_without_provider_calls() {
	let (dir, storage) = temp_storage();
	let cfg = test_config(storage.cache_path.clone(), DIMS);
	let (holdings, trades) = sample_records(40, 10);

	{
		let cache = Cache::connect(&cfg.storage).await.expect("Failed to open cache.");
		let service = folio_service::FolioService::with_providers(
			cfg.clone(),
			cache,
			Providers::new(Arc::new(StubEmbedding::new(DIMS as usize))),
		);

		service.build_index(&holdings, &trades, |_| {}).await.expect("Build failed.");
	}

	// Fresh service over the same SQLite file, as after a restart.
	let stub = StubEmbedding::new(DIMS as usize);
	let calls = stub.calls.clone();
	let cache = Cache::connect(&cfg.storage).await.expect("Failed to open cache.");
	let service = folio_service::FolioService::with_providers(
		cfg,
		cache,
		Providers::new(Arc::new(stub)),
	);
	let mut progress = Vec::new();
	let report = service
		.build_index(&holdings, &trades, |percent| progress.push(percent))
		.await
		.expect("Build failed.")
		.expect("Expected a build report.");

	assert!(report.from_cache);
	assert_eq!(report.indexed, 50);
	assert_eq!(calls.load(Ordering::SeqCst), 0);
	assert_eq!(progress, vec![100]);
	assert_eq!(service.store.len(), 50);

	drop(dir);
}

#[tokio::test]
async fn cache_within_tolerance_is_accepted() {
	assert_cache_acceptance(46, true).await;
	assert_cache_acceptance(54, true).await;
}

#[tokio::test]
async fn cache_outside_tolerance_triggers_regeneration() {
	assert_cache_acceptance(44, false).await;
	assert_cache_acceptance(56, false).await;
}

/// Seeds the cache with `cached_count` rows, then builds an index over 50
/// records and checks whether the fast path was taken.
async fn assert_cache_acceptance(cached_count: usize, expect_fast_path: bool) {
	let (dir, storage) = temp_storage();
	let cfg = test_config(storage.cache_path.clone(), DIMS);
	let cache = Cache::connect(&cfg.storage).await.expect("Failed to open cache.");
	let seeded: Vec<EmbeddedItem> = (0..cached_count)
		.map(|id| EmbeddedItem {
			id: id as i64,
			text: format!("seeded {id}"),
			embedding: folio_testkit::deterministic_vector(&format!("seeded {id}"), DIMS as usize),
			metadata: ItemMetadata::Holding(folio_testkit::sample_holding(
				"Seed", "Equity", 1.0, 0.0,
			)),
		})
		.collect();

	cache.save_all(&seeded, "seeded").await.expect("Failed to seed cache.");

	let stub = StubEmbedding::new(DIMS as usize);
	let calls = stub.calls.clone();
	let service =
		folio_service::FolioService::with_providers(cfg, cache, Providers::new(Arc::new(stub)));
	let (holdings, trades) = sample_records(30, 20);
	let report = service
		.build_index(&holdings, &trades, |_| {})
		.await
		.expect("Build failed.")
		.expect("Expected a build report.");

	assert_eq!(report.from_cache, expect_fast_path, "cached_count = {cached_count}");

	if expect_fast_path {
		assert_eq!(calls.load(Ordering::SeqCst), 0);
		assert_eq!(service.store.len(), cached_count);
	} else {
		assert!(calls.load(Ordering::SeqCst) > 0);
		assert_eq!(service.store.len(), 50);
	}

	drop(dir);
}

#[tokio::test]
async fn slow_build_persists_the_index() {
	let (dir, storage) = temp_storage();
	let cfg = test_config(storage.cache_path.clone(), DIMS);
	let cache = Cache::connect(&cfg.storage).await.expect("Failed to open cache.");
	let service = folio_service::FolioService::with_providers(
		cfg.clone(),
		cache,
		Providers::new(Arc::new(StubEmbedding::new(DIMS as usize))),
	);
	let (holdings, trades) = sample_records(12, 3);

	service.build_index(&holdings, &trades, |_| {}).await.expect("Build failed.");

	let reopened = Cache::connect(&cfg.storage).await.expect("Failed to reopen cache.");
	let persisted = reopened.load_all().await.expect("Failed to load persisted items.");

	assert_eq!(persisted.len(), 15);
	assert_eq!(persisted, service.store.snapshot());
	assert!(reopened.fingerprint().await.expect("Failed to read fingerprint.").is_some());

	drop(dir);
}
