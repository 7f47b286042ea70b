use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use lexrag_service::LexRagService;
use lexrag_storage::{db::Db, search::SearchStore};

pub mod worker;

#[derive(Debug, Parser)]
#[command(version, rename_all = "kebab")]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: std::path::PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = lexrag_config::load(&args.config)?;
	let filter = EnvFilter::new(config.service.log_level.clone());

	tracing_subscriber::fmt().with_env_filter(filter).init();

	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	let store = Arc::new(SearchStore::new(&config.storage.elasticsearch)?);
	let service = LexRagService::new(config, store.clone());
	let state = worker::WorkerState { db, store, service };

	worker::run_worker(state).await
}
