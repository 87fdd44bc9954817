use sqlx::{
	SqlitePool,
	sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::{Error, Result, models::EmbeddedItem};

const FINGERPRINT_KEY: &str = "fingerprint";

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS embedded_items (
	id INTEGER PRIMARY KEY,
	text TEXT NOT NULL,
	embedding TEXT NOT NULL,
	metadata TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS index_meta (
	key TEXT PRIMARY KEY,
	value TEXT NOT NULL
)";

/// Durable copy of the embedding index, one SQLite file.
pub struct Cache {
	pub pool: SqlitePool,
}

impl Cache {
	pub async fn connect(cfg: &folio_config::Storage) -> Result<Self> {
		let options =
			SqliteConnectOptions::new().filename(&cfg.cache_path).create_if_missing(true);
		let pool = SqlitePoolOptions::new()
			.max_connections(cfg.pool_max_conns)
			.connect_with(options)
			.await?;
		let cache = Self { pool };

		cache.ensure_schema().await?;

		Ok(cache)
	}

	async fn ensure_schema(&self) -> Result<()> {
		for statement in SCHEMA.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&self.pool).await?;
		}

		Ok(())
	}

	/// All persisted items in id order. Any undecodable row fails the whole
	/// load; callers treat that as a missing cache and regenerate.
	pub async fn load_all(&self) -> Result<Vec<EmbeddedItem>> {
		let rows: Vec<(i64, String, String, String)> = sqlx::query_as(
			"SELECT id, text, embedding, metadata FROM embedded_items ORDER BY id ASC",
		)
		.fetch_all(&self.pool)
		.await?;
		let mut items = Vec::with_capacity(rows.len());

		for (id, text, embedding, metadata) in rows {
			let embedding = serde_json::from_str(&embedding).map_err(|err| Error::Decode {
				message: format!("Cached item {id} has an undecodable embedding: {err}."),
			})?;
			let metadata = serde_json::from_str(&metadata).map_err(|err| Error::Decode {
				message: format!("Cached item {id} has undecodable metadata: {err}."),
			})?;

			items.push(EmbeddedItem { id, text, embedding, metadata });
		}

		Ok(items)
	}

	/// Clears and rewrites the table in one transaction, so entries from a
	/// previous, differently-sized dataset never accumulate. The content
	/// fingerprint is stored in the same transaction.
	pub async fn save_all(&self, items: &[EmbeddedItem], fingerprint: &str) -> Result<()> {
		let mut tx = self.pool.begin().await?;

		sqlx::query("DELETE FROM embedded_items").execute(&mut *tx).await?;

		for item in items {
			let embedding = serde_json::to_string(&item.embedding).map_err(|err| Error::Decode {
				message: format!("Failed to encode embedding for item {}: {err}.", item.id),
			})?;
			let metadata = serde_json::to_string(&item.metadata).map_err(|err| Error::Decode {
				message: format!("Failed to encode metadata for item {}: {err}.", item.id),
			})?;

			sqlx::query(
				"INSERT INTO embedded_items (id, text, embedding, metadata) VALUES (?1, ?2, ?3, ?4)",
			)
			.bind(item.id)
			.bind(&item.text)
			.bind(embedding)
			.bind(metadata)
			.execute(&mut *tx)
			.await?;
		}

		sqlx::query(
			"\
INSERT INTO index_meta (key, value)
VALUES (?1, ?2)
ON CONFLICT (key) DO UPDATE SET value = excluded.value",
		)
		.bind(FINGERPRINT_KEY)
		.bind(fingerprint)
		.execute(&mut *tx)
		.await?;

		tx.commit().await?;

		Ok(())
	}

	pub async fn fingerprint(&self) -> Result<Option<String>> {
		let row: Option<(String,)> =
			sqlx::query_as("SELECT value FROM index_meta WHERE key = ?1")
				.bind(FINGERPRINT_KEY)
				.fetch_optional(&self.pool)
				.await?;

		Ok(row.map(|(value,)| value))
	}
}
