use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub retrieval: Retrieval,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
	/// Logical agent consuming the queue. Only rows tagged with this id are claimed.
	pub agent_id: i32,
	#[serde(default = "default_poll_interval_ms")]
	pub poll_interval_ms: u64,
	/// Pause before the final generation call, to respect upstream rate limits.
	#[serde(default = "default_generation_throttle_ms")]
	pub generation_throttle_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub elasticsearch: Elasticsearch,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Elasticsearch {
	pub url: String,
	pub username: String,
	pub password: String,
	/// Document-level metadata index (external GAMPES/MNI identifiers live here).
	pub documents_index: String,
	/// Page-level full-text index, one record per page.
	pub pages_index: String,
	/// Page-embedding index, one record per page.
	pub vectors_index: String,
	/// Task status documents read by callers.
	pub responses_index: String,
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub generation: GenerationProviderConfig,
	pub resolution: Resolution,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingProviderConfig {
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: usize,
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationProviderConfig {
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub max_tokens: u32,
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Resolution {
	pub gampes: ResolutionEndpoint,
	pub mni: ResolutionEndpoint,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResolutionEndpoint {
	pub url: String,
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Retrieval {
	#[serde(default = "default_top_k")]
	pub lexical_top_k: usize,
	#[serde(default = "default_top_k")]
	pub vector_top_k: usize,
	#[serde(default = "default_fused_top_n")]
	pub fused_top_n: usize,
	#[serde(default = "default_rrf_k")]
	pub rrf_k: f32,
	#[serde(default = "default_similarity_threshold")]
	pub similarity_threshold: f32,
	#[serde(default = "default_max_context_chars")]
	pub max_context_chars: usize,
}

fn default_poll_interval_ms() -> u64 {
	5_000
}

fn default_generation_throttle_ms() -> u64 {
	1_000
}

fn default_top_k() -> usize {
	10
}

fn default_fused_top_n() -> usize {
	5
}

fn default_rrf_k() -> f32 {
	60.0
}

fn default_similarity_threshold() -> f32 {
	0.7
}

fn default_max_context_chars() -> usize {
	24_000
}
