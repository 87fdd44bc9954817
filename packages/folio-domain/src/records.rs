use serde::{Deserialize, Serialize};

/// A position row from the holdings export. Field names follow the upstream
/// report columns, so the raw JSON deserializes without a mapping layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Holding {
	#[serde(rename = "PortfolioName")]
	pub portfolio_name: String,
	#[serde(rename = "ShortName", default)]
	pub short_name: String,
	#[serde(rename = "SecurityTypeName")]
	pub security_type_name: String,
	#[serde(rename = "MV_Base")]
	pub mv_base: f64,
	#[serde(rename = "PL_YTD")]
	pub pl_ytd: f64,
}

/// A trade allocation row from the trades export.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trade {
	#[serde(rename = "PortfolioName")]
	pub portfolio_name: String,
	#[serde(rename = "TradeTypeName")]
	pub trade_type_name: String,
	#[serde(rename = "TradeDate")]
	pub trade_date: String,
	#[serde(rename = "Quantity")]
	pub quantity: f64,
	#[serde(rename = "Price")]
	pub price: f64,
}

impl Holding {
	/// The fund a holding belongs to. Some exports leave `PortfolioName`
	/// blank and carry the fund in `ShortName`.
	pub fn fund_name(&self) -> Option<&str> {
		if !self.portfolio_name.trim().is_empty() {
			return Some(&self.portfolio_name);
		}
		if !self.short_name.trim().is_empty() {
			return Some(&self.short_name);
		}

		None
	}

	/// One-sentence description fed to the embedding provider and reused
	/// verbatim as the retrieval bullet text.
	pub fn describe(&self) -> String {
		format!(
			"Holding Fund: {}, Security: {}, MV: {}, PL: {}",
			self.portfolio_name, self.security_type_name, self.mv_base, self.pl_ytd
		)
	}
}

impl Trade {
	pub fn fund_name(&self) -> Option<&str> {
		if self.portfolio_name.trim().is_empty() {
			None
		} else {
			Some(&self.portfolio_name)
		}
	}

	pub fn describe(&self) -> String {
		format!(
			"Trade Fund: {}, Type: {}, Date: {}, Qty: {}, Price: {}",
			self.portfolio_name, self.trade_type_name, self.trade_date, self.quantity, self.price
		)
	}
}
