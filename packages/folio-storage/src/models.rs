use folio_domain::records::{Holding, Trade};
use serde::{Deserialize, Serialize};

/// The record a stored vector was synthesized from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "record", rename_all = "snake_case")]
pub enum ItemMetadata {
	Holding(Holding),
	Trade(Trade),
}

/// One indexed row: a synthesized sentence, its embedding, and the source
/// record. Ids are assigned densely per indexing run, holdings first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedItem {
	pub id: i64,
	pub text: String,
	pub embedding: Vec<f32>,
	pub metadata: ItemMetadata,
}
