pub mod context;
pub mod pipeline;
pub mod resolve;
pub mod search;

use std::{future::Future, pin::Pin, sync::Arc};

pub use context::{EnrichedResult, SourceRef, TaskResponse};
pub use pipeline::PipelineOutput;

use lexrag_config::{Config, EmbeddingProviderConfig, GenerationProviderConfig, ResolutionEndpoint};
use lexrag_domain::{Fault, ScoredCandidate};
use lexrag_providers::{ChatCompletion, embedding, generation, resolution};
use lexrag_storage::{
	models::{DocumentRefs, PageRecord},
	search::SearchStore,
};

pub type ServiceResult<T> = Result<T, ServiceError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>>;
}

pub trait GenerationProvider
where
	Self: Send + Sync,
{
	fn chat<'a>(
		&'a self,
		cfg: &'a GenerationProviderConfig,
		system_role: &'a str,
		prompt: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<ChatCompletion>>;
}

pub trait ResolutionProvider
where
	Self: Send + Sync,
{
	fn resolve<'a>(
		&'a self,
		cfg: &'a ResolutionEndpoint,
		document_ids: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<String>>>;
}

/// The search-engine surface the pipeline depends on. `SearchStore` is the
/// production implementation; tests substitute an in-memory one.
pub trait SearchEngine
where
	Self: Send + Sync,
{
	fn pages_for_document<'a>(
		&'a self,
		internal_document_id: &'a str,
	) -> BoxFuture<'a, lexrag_storage::Result<Vec<String>>>;

	fn get_page<'a>(
		&'a self,
		page_id: &'a str,
	) -> BoxFuture<'a, lexrag_storage::Result<Option<PageRecord>>>;

	fn document_refs<'a>(
		&'a self,
		internal_document_id: &'a str,
	) -> BoxFuture<'a, lexrag_storage::Result<DocumentRefs>>;

	fn embedding_exists<'a>(
		&'a self,
		page_id: &'a str,
	) -> BoxFuture<'a, lexrag_storage::Result<bool>>;

	fn index_embedding<'a>(
		&'a self,
		page_id: &'a str,
		vector: &'a [f32],
	) -> BoxFuture<'a, lexrag_storage::Result<()>>;

	fn lexical_search<'a>(
		&'a self,
		query_text: &'a str,
		page_ids: &'a [String],
		k: usize,
	) -> BoxFuture<'a, lexrag_storage::Result<Vec<ScoredCandidate>>>;

	fn vector_search<'a>(
		&'a self,
		query_vector: &'a [f32],
		page_ids: &'a [String],
		k: usize,
		threshold: f32,
	) -> BoxFuture<'a, lexrag_storage::Result<Vec<ScoredCandidate>>>;
}

/// Pipeline failure carrying its retry classification. The worker maps the
/// classification to a terminal status or a requeue; nothing downstream
/// matches on error text.
#[derive(Debug)]
pub enum ServiceError {
	InvalidPayload { message: String },
	QueryEmbeddingShape { expected: usize, actual: usize },
	Provider { message: String },
	Storage { message: String },
	Integrity { message: String },
}

impl ServiceError {
	pub fn fault(&self) -> Fault {
		match self {
			Self::InvalidPayload { .. } | Self::QueryEmbeddingShape { .. } => Fault::Permanent,
			Self::Provider { .. } | Self::Storage { .. } => Fault::Transient,
			Self::Integrity { .. } => Fault::DataIntegrity,
		}
	}
}

impl std::fmt::Display for ServiceError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidPayload { message } => write!(f, "Invalid payload: {message}"),
			Self::QueryEmbeddingShape { expected, actual } => {
				write!(f, "Query embedding has {actual} dimensions, expected {expected}.")
			},
			Self::Provider { message } => write!(f, "Provider error: {message}"),
			Self::Storage { message } => write!(f, "Storage error: {message}"),
			Self::Integrity { message } => write!(f, "Data integrity fault: {message}"),
		}
	}
}

impl std::error::Error for ServiceError {}

impl From<lexrag_storage::Error> for ServiceError {
	fn from(err: lexrag_storage::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<color_eyre::Report> for ServiceError {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub generation: Arc<dyn GenerationProvider>,
	pub resolution: Arc<dyn ResolutionProvider>,
}

impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		generation: Arc<dyn GenerationProvider>,
		resolution: Arc<dyn ResolutionProvider>,
	) -> Self {
		Self { embedding, generation, resolution }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), generation: provider.clone(), resolution: provider }
	}
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>> {
		Box::pin(embedding::embed(cfg, text))
	}
}

impl GenerationProvider for DefaultProviders {
	fn chat<'a>(
		&'a self,
		cfg: &'a GenerationProviderConfig,
		system_role: &'a str,
		prompt: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<ChatCompletion>> {
		Box::pin(generation::chat(cfg, system_role, prompt))
	}
}

impl ResolutionProvider for DefaultProviders {
	fn resolve<'a>(
		&'a self,
		cfg: &'a ResolutionEndpoint,
		document_ids: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<String>>> {
		Box::pin(resolution::resolve(cfg, document_ids))
	}
}

impl SearchEngine for SearchStore {
	fn pages_for_document<'a>(
		&'a self,
		internal_document_id: &'a str,
	) -> BoxFuture<'a, lexrag_storage::Result<Vec<String>>> {
		Box::pin(Self::pages_for_document(self, internal_document_id))
	}

	fn get_page<'a>(
		&'a self,
		page_id: &'a str,
	) -> BoxFuture<'a, lexrag_storage::Result<Option<PageRecord>>> {
		Box::pin(Self::get_page(self, page_id))
	}

	fn document_refs<'a>(
		&'a self,
		internal_document_id: &'a str,
	) -> BoxFuture<'a, lexrag_storage::Result<DocumentRefs>> {
		Box::pin(Self::document_refs(self, internal_document_id))
	}

	fn embedding_exists<'a>(
		&'a self,
		page_id: &'a str,
	) -> BoxFuture<'a, lexrag_storage::Result<bool>> {
		Box::pin(Self::embedding_exists(self, page_id))
	}

	fn index_embedding<'a>(
		&'a self,
		page_id: &'a str,
		vector: &'a [f32],
	) -> BoxFuture<'a, lexrag_storage::Result<()>> {
		Box::pin(Self::index_embedding(self, page_id, vector))
	}

	fn lexical_search<'a>(
		&'a self,
		query_text: &'a str,
		page_ids: &'a [String],
		k: usize,
	) -> BoxFuture<'a, lexrag_storage::Result<Vec<ScoredCandidate>>> {
		Box::pin(Self::lexical_search(self, query_text, page_ids, k))
	}

	fn vector_search<'a>(
		&'a self,
		query_vector: &'a [f32],
		page_ids: &'a [String],
		k: usize,
		threshold: f32,
	) -> BoxFuture<'a, lexrag_storage::Result<Vec<ScoredCandidate>>> {
		Box::pin(Self::vector_search(self, query_vector, page_ids, k, threshold))
	}
}

pub struct LexRagService {
	pub cfg: Config,
	pub engine: Arc<dyn SearchEngine>,
	pub providers: Providers,
}

impl LexRagService {
	pub fn new(cfg: Config, engine: Arc<dyn SearchEngine>) -> Self {
		Self { cfg, engine, providers: Providers::default() }
	}

	pub fn with_providers(
		cfg: Config,
		engine: Arc<dyn SearchEngine>,
		providers: Providers,
	) -> Self {
		Self { cfg, engine, providers }
	}
}
