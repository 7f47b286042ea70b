use clap::Parser;

use lexrag_worker::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	lexrag_worker::run(args).await
}
