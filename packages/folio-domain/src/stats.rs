use ahash::{AHashMap, AHashSet};
use time::{Date, macros::format_description};

use crate::{
	fmt::{format_count, format_usd},
	records::{Holding, Trade},
};

/// Portfolio-wide aggregates. Cheap to recompute, never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct GlobalStats {
	pub total_holdings: usize,
	pub total_trades: usize,
	pub total_market_value: f64,
	pub total_pl_ytd: f64,
	pub unique_fund_count: usize,
	pub first_trade_date: Option<Date>,
	pub last_trade_date: Option<Date>,
	pub top_fund_by_pl: Option<String>,
	pub top_fund_by_mv: Option<String>,
}

/// Per-fund rollup used by the `stats` surface.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FundSummary {
	pub name: String,
	pub total_holdings: usize,
	pub total_trades: usize,
	pub total_pl_ytd: f64,
	pub total_mv_base: f64,
}

pub fn global_stats(holdings: &[Holding], trades: &[Trade]) -> GlobalStats {
	let total_market_value = holdings.iter().map(|h| h.mv_base).sum();
	let total_pl_ytd = holdings.iter().map(|h| h.pl_ytd).sum();
	let mut funds = AHashSet::new();

	for holding in holdings {
		if let Some(fund) = holding.fund_name() {
			funds.insert(fund.to_string());
		}
	}
	for trade in trades {
		if let Some(fund) = trade.fund_name() {
			funds.insert(fund.to_string());
		}
	}

	// First strictly-best row wins, which keeps ties deterministic.
	let mut best_by_pl: Option<&Holding> = None;
	let mut best_by_mv: Option<&Holding> = None;

	for holding in holdings {
		if best_by_pl.map(|best| holding.pl_ytd > best.pl_ytd).unwrap_or(true) {
			best_by_pl = Some(holding);
		}
		if best_by_mv.map(|best| holding.mv_base > best.mv_base).unwrap_or(true) {
			best_by_mv = Some(holding);
		}
	}

	let mut first_trade_date = None;
	let mut last_trade_date = None;

	for trade in trades {
		let Some(date) = parse_trade_date(&trade.trade_date) else {
			continue;
		};

		if first_trade_date.map(|first| date < first).unwrap_or(true) {
			first_trade_date = Some(date);
		}
		if last_trade_date.map(|last| date > last).unwrap_or(true) {
			last_trade_date = Some(date);
		}
	}

	GlobalStats {
		total_holdings: holdings.len(),
		total_trades: trades.len(),
		total_market_value,
		total_pl_ytd,
		unique_fund_count: funds.len(),
		first_trade_date,
		last_trade_date,
		top_fund_by_pl: best_by_pl.and_then(|h| h.fund_name()).map(str::to_string),
		top_fund_by_mv: best_by_mv.and_then(|h| h.fund_name()).map(str::to_string),
	}
}

/// Renders the fixed-format block consumed verbatim by the completion
/// prompt. Labels are part of the external contract; do not reword them.
pub fn format_global_stats(stats: &GlobalStats) -> String {
	let range_start =
		stats.first_trade_date.map(|date| date.to_string()).unwrap_or_else(|| "N/A".to_string());
	let range_end =
		stats.last_trade_date.map(|date| date.to_string()).unwrap_or_else(|| "N/A".to_string());

	format!(
		"GLOBAL PORTFOLIO STATS:\n\
		- Total Funds: {}\n\
		- Total Holdings Records: {}\n\
		- Total Trade Records: {}\n\
		- Total Market Value: {}\n\
		- Total YTD P&L: {}\n\
		- Best Performing Fund (YTD): {}\n\
		- Largest Holding (MV): {}\n\
		- Trading Activity Range: {} to {}",
		format_count(stats.unique_fund_count),
		format_count(stats.total_holdings),
		format_count(stats.total_trades),
		format_usd(stats.total_market_value),
		format_usd(stats.total_pl_ytd),
		stats.top_fund_by_pl.as_deref().unwrap_or("N/A"),
		stats.top_fund_by_mv.as_deref().unwrap_or("N/A"),
		range_start,
		range_end,
	)
}

pub fn fund_summaries(holdings: &[Holding], trades: &[Trade]) -> Vec<FundSummary> {
	let mut by_fund: AHashMap<String, FundSummary> = AHashMap::new();

	for holding in holdings {
		let Some(fund) = holding.fund_name() else {
			continue;
		};
		let entry = by_fund
			.entry(fund.to_string())
			.or_insert_with(|| FundSummary { name: fund.to_string(), ..FundSummary::default() });

		entry.total_holdings += 1;
		entry.total_pl_ytd += holding.pl_ytd;
		entry.total_mv_base += holding.mv_base;
	}
	for trade in trades {
		let Some(fund) = trade.fund_name() else {
			continue;
		};
		let entry = by_fund
			.entry(fund.to_string())
			.or_insert_with(|| FundSummary { name: fund.to_string(), ..FundSummary::default() });

		entry.total_trades += 1;
	}

	let mut summaries: Vec<FundSummary> = by_fund.into_values().collect();

	summaries.sort_by(|a, b| a.name.cmp(&b.name));

	summaries
}

/// Funds ordered by summed YTD P&L, best first.
pub fn best_performing_funds(holdings: &[Holding], trades: &[Trade]) -> Vec<FundSummary> {
	let mut summaries = fund_summaries(holdings, trades);

	summaries.sort_by(|a, b| {
		b.total_pl_ytd.partial_cmp(&a.total_pl_ytd).unwrap_or(std::cmp::Ordering::Equal)
	});

	summaries
}

pub fn security_type_breakdown(holdings: &[Holding]) -> Vec<(String, usize)> {
	breakdown(holdings.iter().map(|h| h.security_type_name.as_str()))
}

pub fn trade_type_breakdown(trades: &[Trade]) -> Vec<(String, usize)> {
	breakdown(trades.iter().map(|t| t.trade_type_name.as_str()))
}

fn breakdown<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
	let mut counts: AHashMap<String, usize> = AHashMap::new();

	for label in labels {
		let label = if label.trim().is_empty() { "Unknown" } else { label };

		*counts.entry(label.to_string()).or_insert(0) += 1;
	}

	let mut out: Vec<(String, usize)> = counts.into_iter().collect();

	out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

	out
}

/// Trade dates arrive as strings; only the ISO `YYYY-MM-DD` prefix is
/// trusted, anything else is skipped for the activity range.
pub fn parse_trade_date(raw: &str) -> Option<Date> {
	let prefix = raw.get(..10)?;

	Date::parse(prefix, format_description!("[year]-[month]-[day]")).ok()
}
