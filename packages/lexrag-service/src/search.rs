//! Query preparation and the hybrid search step: lexical and vector rankings
//! over the candidate page set, merged by reciprocal rank fusion.

use lexrag_domain::{ScoredCandidate, reciprocal_rank_fusion};

use crate::{LexRagService, ServiceError, ServiceResult};

/// System role for the query-refinement call.
pub const QUERY_REWRITE_ROLE: &str = "Você é um especialista em análise de documentos jurídicos extensos como inquéritos policiais, autos de prisão, etc. Sua tarefa é aprimorar consultas para facilitar a recuperação de informações desses documentos. Dada a seguinte consulta do usuário: Tarefas: Refine e Expanda: Reescreva a consulta para torná-la mais detalhada e abrangente, incluindo possíveis sinônimos e termos jurídicos relacionados. Por exemplo, se a consulta for - Quem são as vítimas? -, considere incluir variações como - identificação das vítimas -, - pessoas lesadas -, ou - partes prejudicadas -. Contextualize: Considere que os documentos podem conter informações distribuídas em diferentes seções e com terminologias variadas. Justifique: Após a reformulação, forneça uma breve explicação das mudanças realizadas para melhorar a recuperação de informações. Retorno: Forneça a consulta refinada apenas e mais nada.";

/// Rewrites the raw user question into a retrieval-friendly query. The
/// rewritten text drives both the lexical query and the query embedding.
pub async fn rewrite_query(svc: &LexRagService, question: &str) -> ServiceResult<String> {
	let completion = svc
		.providers
		.generation
		.chat(&svc.cfg.providers.generation, QUERY_REWRITE_ROLE, question)
		.await?;

	Ok(completion.content)
}

/// Runs both rankings over the candidate pages and fuses them.
///
/// The query embedding must match the configured dimensionality; a mismatch
/// fails the whole search step as a request-shape fault rather than quietly
/// returning no results. The two searches run concurrently and both must
/// complete before fusion.
pub async fn run_searches(
	svc: &LexRagService,
	query: &str,
	page_ids: &[String],
) -> ServiceResult<Vec<ScoredCandidate>> {
	let retrieval = &svc.cfg.retrieval;
	let query_vector =
		svc.providers.embedding.embed(&svc.cfg.providers.embedding, query).await?;
	let expected = svc.cfg.providers.embedding.dimensions;

	if query_vector.len() != expected {
		tracing::error!(
			expected,
			actual = query_vector.len(),
			"Query embedding has the wrong dimensionality; aborting the search step."
		);

		return Err(ServiceError::QueryEmbeddingShape { expected, actual: query_vector.len() });
	}

	let (lexical, vector) = tokio::join!(
		svc.engine.lexical_search(query, page_ids, retrieval.lexical_top_k),
		svc.engine.vector_search(
			&query_vector,
			page_ids,
			retrieval.vector_top_k,
			retrieval.similarity_threshold
		),
	);
	let lexical = lexical?;
	let vector = vector?;

	tracing::debug!(
		lexical_hits = lexical.len(),
		vector_hits = vector.len(),
		"Hybrid search completed; fusing rankings."
	);

	Ok(reciprocal_rank_fusion(&lexical, &vector, retrieval.rrf_k))
}
