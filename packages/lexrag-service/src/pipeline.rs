//! End-to-end task processing: payload validation, reference resolution,
//! hybrid search, context assembly, and answer generation.

use std::time::Duration;

use serde_json::Value;

use lexrag_domain::TaskPayload;

use crate::{LexRagService, ServiceError, ServiceResult, context, resolve, search};

/// Everything the worker needs to finalize a processed task.
#[derive(Debug)]
pub struct PipelineOutput {
	pub response: context::TaskResponse,
	pub enriched: Vec<context::EnrichedResult>,
	pub user: String,
}

/// Runs one task through the whole pipeline.
///
/// Every failure path returns a classified [`ServiceError`]; the worker
/// decides between requeue and terminal status from the classification.
pub async fn process_task(svc: &LexRagService, payload: &Value) -> ServiceResult<PipelineOutput> {
	let payload = TaskPayload::parse(payload)
		.map_err(|err| ServiceError::InvalidPayload { message: err.to_string() })?;

	tracing::info!(
		gampes_refs = payload.id_documentos_gampes.len(),
		mni_refs = payload.id_documentos_mni.len(),
		"Pipeline started."
	);

	let internal_ids = resolve::resolve_document_ids(svc, &payload).await?;
	let page_ids = resolve::resolve_pages(svc, &internal_ids).await?;
	let page_ids = resolve::ensure_embeddings(svc, page_ids).await?;

	tracing::info!(
		documents = internal_ids.len(),
		pages = page_ids.len(),
		"References resolved; candidate pool ready."
	);

	let query = search::rewrite_query(svc, &payload.texto_prompt).await?;
	let fused = search::run_searches(svc, &query, &page_ids).await?;
	let enriched = context::hydrate(svc, &fused).await?;
	let prompt = context::build_prompt(&svc.cfg.retrieval, &query, &enriched);

	tracing::info!(
		fused = fused.len(),
		cited = enriched.len(),
		prompt_chars = prompt.len(),
		"Context assembled; generating the answer."
	);

	// Upstream rate-limit courtesy pause before the generation call.
	tokio::time::sleep(Duration::from_millis(svc.cfg.service.generation_throttle_ms)).await;

	let completion = svc
		.providers
		.generation
		.chat(&svc.cfg.providers.generation, context::ANSWER_ROLE, &prompt)
		.await?;
	let response = context::build_response(&completion.id, &completion.content, &enriched);

	tracing::info!(completion_id = %completion.id, "Pipeline finished.");

	Ok(PipelineOutput { response, enriched, user: payload.user })
}
