use std::sync::RwLock;

use crate::models::EmbeddedItem;

/// Process-lifetime, insertion-ordered vector collection. Populated
/// wholesale through `replace_all`; readers never observe a store that is
/// partially old and partially new.
#[derive(Debug, Default)]
pub struct VectorStore {
	items: RwLock<Vec<EmbeddedItem>>,
}

impl VectorStore {
	pub fn new() -> Self {
		Self { items: RwLock::new(Vec::new()) }
	}

	/// Appends without deduplication.
	pub fn insert(&self, item: EmbeddedItem) {
		self.write().push(item);
	}

	/// Atomic wholesale replacement.
	pub fn replace_all(&self, items: Vec<EmbeddedItem>) {
		*self.write() = items;
	}

	/// Read-only copy for persistence.
	pub fn snapshot(&self) -> Vec<EmbeddedItem> {
		self.read().clone()
	}

	/// Runs `f` over the live items under the read lock; used by the
	/// similarity scan to avoid copying every embedding per query.
	pub fn with_items<T>(&self, f: impl FnOnce(&[EmbeddedItem]) -> T) -> T {
		f(&self.read())
	}

	pub fn is_empty(&self) -> bool {
		self.read().is_empty()
	}

	pub fn len(&self) -> usize {
		self.read().len()
	}

	fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<EmbeddedItem>> {
		self.items.read().unwrap_or_else(|err| err.into_inner())
	}

	fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<EmbeddedItem>> {
		self.items.write().unwrap_or_else(|err| err.into_inner())
	}
}
