pub mod records;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use folio_domain::{
	fmt,
	records::{Holding, Trade},
	stats,
};
use folio_service::{Error as ServiceError, FolioService, context};
use folio_storage::cache::Cache;

#[derive(Debug, Parser)]
#[command(version, rename_all = "kebab")]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// JSON array of holding records.
	#[arg(long, value_name = "FILE")]
	pub holdings: PathBuf,
	/// JSON array of trade records.
	#[arg(long, value_name = "FILE")]
	pub trades: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Print portfolio-wide statistics.
	Stats,
	/// Build the embedding index, loading from cache when it is still fresh.
	Index,
	/// Rank records against a query by cosine similarity.
	Search {
		#[arg(long)]
		query: String,
		#[arg(long)]
		top_k: Option<usize>,
	},
	/// Print the grounded context block a completion request would carry.
	Context {
		#[arg(long)]
		query: String,
	},
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = folio_config::load(&args.config)?;
	let filter = EnvFilter::new(config.service.log_level.clone());

	tracing_subscriber::fmt().with_env_filter(filter).init();

	let holdings = records::load_holdings(&args.holdings)?;
	let trades = records::load_trades(&args.trades)?;

	tracing::info!(
		holdings = holdings.len(),
		trades = trades.len(),
		"Loaded portfolio records."
	);

	match args.command {
		Command::Stats => print_stats(&holdings, &trades),
		Command::Index => {
			let service = connect(config).await?;
			let report = build_index(&service, &holdings, &trades).await?;

			if let Some(report) = report {
				println!(
					"Indexed {} of {} records ({}{} failed batches).",
					report.indexed,
					report.expected,
					if report.from_cache { "from cache, " } else { "" },
					report.failed_batches.len(),
				);
			}
		},
		Command::Search { query, top_k } => {
			let service = connect(config).await?;

			build_index(&service, &holdings, &trades).await?;

			let top_k = top_k.unwrap_or(service.cfg.search.top_k);

			match service.search(&query, top_k).await {
				Ok(hits) => {
					for hit in hits {
						println!("{:>8.4}  {}", hit.score, hit.item.text);
					}
				},
				Err(ServiceError::NotIndexed) => print_not_indexed(),
				Err(err) => return Err(err.into()),
			}
		},
		Command::Context { query } => {
			let service = connect(config).await?;

			build_index(&service, &holdings, &trades).await?;

			let global = stats::global_stats(&holdings, &trades);
			let max_chars = service.cfg.chat.max_context_chars;

			match service.search(&query, service.cfg.search.top_k).await {
				Ok(hits) => {
					println!("{}", context::build_context(&global, Some(&hits), max_chars));
				},
				Err(ServiceError::NotIndexed) => {
					println!("{}", context::build_context(&global, None, max_chars));
					print_not_indexed();
				},
				Err(err) => return Err(err.into()),
			}
		},
	}

	Ok(())
}

async fn connect(config: folio_config::Config) -> color_eyre::Result<FolioService> {
	let cache = Cache::connect(&config.storage).await?;

	Ok(FolioService::new(config, cache))
}

async fn build_index(
	service: &FolioService,
	holdings: &[Holding],
	trades: &[Trade],
) -> color_eyre::Result<Option<folio_service::BuildReport>> {
	let report = service
		.build_index(holdings, trades, |percent| tracing::info!(percent, "Indexing progress."))
		.await?;

	Ok(report)
}

fn print_not_indexed() {
	println!("The knowledge base is still preparing; ask again once indexing has completed.");
}

fn print_stats(holdings: &[Holding], trades: &[Trade]) {
	let global = stats::global_stats(holdings, trades);

	println!("{}", stats::format_global_stats(&global));
	println!();
	println!("TOP FUNDS BY YTD P&L:");

	for summary in stats::best_performing_funds(holdings, trades).iter().take(5) {
		println!(
			"- {}: {} across {} holdings",
			summary.name,
			fmt::format_usd(summary.total_pl_ytd),
			fmt::format_count(summary.total_holdings),
		);
	}

	println!();
	println!("SECURITY TYPES:");

	for (label, count) in stats::security_type_breakdown(holdings) {
		println!("- {label}: {}", fmt::format_count(count));
	}

	println!();
	println!("TRADE TYPES:");

	for (label, count) in stats::trade_type_breakdown(trades) {
		println!("- {label}: {}", fmt::format_count(count));
	}
}
