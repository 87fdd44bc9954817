use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	folio_cli::run(folio_cli::Args::parse()).await
}
