use std::{fs, path::Path};

use color_eyre::{Result, eyre};
use serde::de::DeserializeOwned;

use folio_domain::records::{Holding, Trade};

pub fn load_holdings(path: &Path) -> Result<Vec<Holding>> {
	read_json(path, "holdings")
}

pub fn load_trades(path: &Path) -> Result<Vec<Trade>> {
	read_json(path, "trades")
}

fn read_json<T>(path: &Path, label: &str) -> Result<Vec<T>>
where
	T: DeserializeOwned,
{
	let raw = fs::read_to_string(path)
		.map_err(|err| eyre::eyre!("Failed to read {label} file {path:?}: {err}."))?;

	serde_json::from_str(&raw)
		.map_err(|err| eyre::eyre!("Failed to parse {label} file {path:?}: {err}."))
}
