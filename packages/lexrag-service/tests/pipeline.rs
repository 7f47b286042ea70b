//! Pipeline tests against in-memory engine and provider stubs.

use std::{
	collections::{HashMap, HashSet},
	sync::{Arc, Mutex},
};

use serde_json::json;

use lexrag_config::{
	Config, EmbeddingProviderConfig, GenerationProviderConfig, ResolutionEndpoint,
};
use lexrag_domain::{Fault, ScoredCandidate};
use lexrag_providers::ChatCompletion;
use lexrag_service::{
	BoxFuture, EmbeddingProvider, GenerationProvider, LexRagService, Providers,
	ResolutionProvider, SearchEngine, ServiceError, pipeline,
};
use lexrag_storage::models::{DocumentRefs, PageRecord};

const DIMS: usize = 8;

fn test_config() -> Config {
	let raw = format!(
		r#"
		[service]
		log_level = "info"
		agent_id = 101
		generation_throttle_ms = 0

		[storage.postgres]
		dsn = "postgres://localhost/lexrag"
		pool_max_conns = 4

		[storage.elasticsearch]
		url = "http://localhost:9200"
		username = "elastic"
		password = "secret"
		documents_index = "documents"
		pages_index = "pages"
		vectors_index = "vectors"
		responses_index = "responses"
		timeout_ms = 1000

		[providers.embedding]
		api_base = "http://localhost:1"
		api_key = "k"
		path = "/embeddings"
		model = "test-embedding"
		dimensions = {DIMS}
		timeout_ms = 1000

		[providers.generation]
		api_base = "http://localhost:1"
		api_key = "k"
		path = "/chat/completions"
		model = "test-chat"
		temperature = 0.2
		max_tokens = 1024
		timeout_ms = 1000

		[providers.resolution.gampes]
		url = "http://localhost:1/gampes"
		timeout_ms = 1000

		[providers.resolution.mni]
		url = "http://localhost:1/mni"
		timeout_ms = 1000

		[retrieval]
		"#
	);

	toml::from_str(&raw).expect("test config must parse")
}

#[derive(Default)]
struct StubEngine {
	pages_by_doc: HashMap<String, Vec<String>>,
	pages: HashMap<String, PageRecord>,
	refs: HashMap<String, DocumentRefs>,
	lexical: Vec<ScoredCandidate>,
	vector: Vec<ScoredCandidate>,
	embeddings: Mutex<HashSet<String>>,
	index_calls: Mutex<Vec<String>>,
	search_pools: Mutex<Vec<Vec<String>>>,
}

impl StubEngine {
	fn with_corpus(docs: &[(&str, &[&str])]) -> Self {
		let mut engine = Self::default();

		for (doc_id, page_ids) in docs {
			let pages: Vec<_> = page_ids.iter().map(|p| p.to_string()).collect();

			engine.pages_by_doc.insert(doc_id.to_string(), pages);
			engine.refs.insert(
				doc_id.to_string(),
				DocumentRefs {
					id_documento_gampes: Some(format!("gampes-{doc_id}")),
					id_documento_mni: Some(format!("mni-{doc_id}")),
				},
			);

			for (number, page_id) in page_ids.iter().enumerate() {
				engine.pages.insert(
					page_id.to_string(),
					PageRecord {
						page_id: page_id.to_string(),
						internal_document_id: doc_id.to_string(),
						page_number: number as i64 + 1,
						text: format!("texto da pagina {page_id}"),
					},
				);
			}
		}

		engine
	}
}

impl SearchEngine for StubEngine {
	fn pages_for_document<'a>(
		&'a self,
		internal_document_id: &'a str,
	) -> BoxFuture<'a, lexrag_storage::Result<Vec<String>>> {
		Box::pin(async move {
			Ok(self.pages_by_doc.get(internal_document_id).cloned().unwrap_or_default())
		})
	}

	fn get_page<'a>(
		&'a self,
		page_id: &'a str,
	) -> BoxFuture<'a, lexrag_storage::Result<Option<PageRecord>>> {
		Box::pin(async move { Ok(self.pages.get(page_id).cloned()) })
	}

	fn document_refs<'a>(
		&'a self,
		internal_document_id: &'a str,
	) -> BoxFuture<'a, lexrag_storage::Result<DocumentRefs>> {
		Box::pin(async move {
			Ok(self.refs.get(internal_document_id).cloned().unwrap_or_default())
		})
	}

	fn embedding_exists<'a>(
		&'a self,
		page_id: &'a str,
	) -> BoxFuture<'a, lexrag_storage::Result<bool>> {
		Box::pin(async move { Ok(self.embeddings.lock().unwrap().contains(page_id)) })
	}

	fn index_embedding<'a>(
		&'a self,
		page_id: &'a str,
		_vector: &'a [f32],
	) -> BoxFuture<'a, lexrag_storage::Result<()>> {
		Box::pin(async move {
			self.embeddings.lock().unwrap().insert(page_id.to_string());
			self.index_calls.lock().unwrap().push(page_id.to_string());

			Ok(())
		})
	}

	fn lexical_search<'a>(
		&'a self,
		_query_text: &'a str,
		page_ids: &'a [String],
		_k: usize,
	) -> BoxFuture<'a, lexrag_storage::Result<Vec<ScoredCandidate>>> {
		Box::pin(async move {
			self.search_pools.lock().unwrap().push(page_ids.to_vec());

			Ok(self.lexical.clone())
		})
	}

	fn vector_search<'a>(
		&'a self,
		_query_vector: &'a [f32],
		page_ids: &'a [String],
		_k: usize,
		_threshold: f32,
	) -> BoxFuture<'a, lexrag_storage::Result<Vec<ScoredCandidate>>> {
		Box::pin(async move {
			self.search_pools.lock().unwrap().push(page_ids.to_vec());

			Ok(self.vector.clone())
		})
	}
}

struct StubProviders {
	embedding_dims: usize,
	failing_source: Option<&'static str>,
}

impl StubProviders {
	fn healthy() -> Self {
		Self { embedding_dims: DIMS, failing_source: None }
	}
}

impl EmbeddingProvider for StubProviders {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		_text: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>> {
		Box::pin(async move { Ok(vec![0.1; self.embedding_dims]) })
	}
}

impl GenerationProvider for StubProviders {
	fn chat<'a>(
		&'a self,
		_cfg: &'a GenerationProviderConfig,
		_system_role: &'a str,
		prompt: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<ChatCompletion>> {
		let content = format!("resposta para: {}", prompt.lines().next().unwrap_or_default());

		Box::pin(async move { Ok(ChatCompletion { id: "chatcmpl-test".to_string(), content }) })
	}
}

impl ResolutionProvider for StubProviders {
	fn resolve<'a>(
		&'a self,
		cfg: &'a ResolutionEndpoint,
		document_ids: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<String>>> {
		Box::pin(async move {
			if let Some(marker) = self.failing_source
				&& cfg.url.contains(marker)
			{
				return Err(color_eyre::eyre::eyre!("endpoint unreachable"));
			}

			Ok(document_ids.iter().map(|id| format!("doc-{id}")).collect())
		})
	}
}

fn service(engine: Arc<StubEngine>, providers: StubProviders) -> LexRagService {
	let providers = Arc::new(providers);

	LexRagService::with_providers(
		test_config(),
		engine,
		Providers::new(providers.clone(), providers.clone(), providers),
	)
}

fn payload() -> serde_json::Value {
	json!({
		"texto_prompt": "Quem são as vítimas?",
		"id_documentos_gampes": ["g1"],
		"id_documentos_mni": ["m1"],
		"user": "promotor",
	})
}

#[tokio::test]
async fn happy_path_produces_ranked_sources() {
	let mut engine =
		StubEngine::with_corpus(&[("doc-g1", &["p1", "p2"]), ("doc-m1", &["p3", "p4"])]);

	engine.lexical = vec![ScoredCandidate::new("p2", 9.0), ScoredCandidate::new("p1", 7.0)];
	engine.vector = vec![ScoredCandidate::new("p2", 0.9), ScoredCandidate::new("p3", 0.8)];

	let svc = service(Arc::new(engine), StubProviders::healthy());
	let output = pipeline::process_task(&svc, &payload()).await.expect("pipeline failed");

	assert_eq!(output.response.id, "chatcmpl-test");
	assert_eq!(output.user, "promotor");
	// p2 is ranked by both lists, so it leads the fused order.
	assert_eq!(output.enriched[0].page_id, "p2");
	assert_eq!(output.response.sources.len(), 3);
	assert_eq!(output.response.sources["fonte_1"]["id_documento_gampes"], "gampes-doc-g1");
	assert!(output.response.sources.len() <= svc.cfg.retrieval.fused_top_n);
}

#[tokio::test]
async fn one_unreachable_source_degrades_instead_of_failing() {
	let mut engine = StubEngine::with_corpus(&[("doc-g1", &["p1"]), ("doc-m1", &["p9"])]);

	engine.lexical = vec![ScoredCandidate::new("p1", 5.0)];

	let providers = StubProviders { embedding_dims: DIMS, failing_source: Some("mni") };
	let svc = service(Arc::new(engine), providers);
	let output = pipeline::process_task(&svc, &payload()).await.expect("pipeline failed");

	// Only the reachable source's document contributes candidates.
	assert_eq!(output.enriched.len(), 1);
	assert_eq!(output.enriched[0].page_id, "p1");
}

#[tokio::test]
async fn searches_are_scoped_to_the_resolved_pool() {
	let engine =
		Arc::new(StubEngine::with_corpus(&[("doc-g1", &["p1", "p2"]), ("doc-m1", &["p3"])]));
	let svc = service(engine.clone(), StubProviders::healthy());

	pipeline::process_task(&svc, &payload()).await.expect("pipeline failed");

	let pools = engine.search_pools.lock().unwrap();

	assert_eq!(pools.len(), 2);

	for pool in pools.iter() {
		let mut sorted = pool.clone();

		sorted.sort();
		assert_eq!(sorted, ["p1", "p2", "p3"]);
	}
}

#[tokio::test]
async fn embeddings_are_created_once_per_page() {
	let engine = Arc::new(StubEngine::with_corpus(&[("doc-g1", &["p1", "p2"])]));
	let svc = service(engine.clone(), StubProviders::healthy());

	pipeline::process_task(&svc, &payload()).await.expect("first run failed");
	pipeline::process_task(&svc, &payload()).await.expect("second run failed");

	let calls = engine.index_calls.lock().unwrap();
	let mut sorted = calls.clone();

	sorted.sort();
	// Two runs, still one write per page.
	assert_eq!(sorted, ["p1", "p2"]);
}

#[tokio::test]
async fn wrong_query_embedding_length_is_a_permanent_fault() {
	let engine = StubEngine::with_corpus(&[("doc-g1", &["p1"])]);

	engine.embeddings.lock().unwrap().insert("p1".to_string());

	let providers = StubProviders { embedding_dims: DIMS + 1, failing_source: None };
	let svc = service(Arc::new(engine), providers);
	let err = pipeline::process_task(&svc, &payload()).await.expect_err("must fail");

	assert!(matches!(err, ServiceError::QueryEmbeddingShape { expected, actual }
		if expected == DIMS && actual == DIMS + 1));
	assert_eq!(err.fault(), Fault::Permanent);
}

#[tokio::test]
async fn malformed_payload_is_a_permanent_fault() {
	let svc = service(Arc::new(StubEngine::default()), StubProviders::healthy());
	let raw = json!({ "texto_prompt": "pergunta" });
	let err = pipeline::process_task(&svc, &raw).await.expect_err("must fail");

	assert!(matches!(err, ServiceError::InvalidPayload { .. }));
	assert_eq!(err.fault(), Fault::Permanent);
}
