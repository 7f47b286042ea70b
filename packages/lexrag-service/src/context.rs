//! Context assembly: hydrating fused candidates into citable passages,
//! building the bounded generation prompt, and shaping the final response.

use serde::Serialize;

use lexrag_config::Retrieval;
use lexrag_domain::ScoredCandidate;

use crate::{LexRagService, ServiceResult};

/// System role for the final answer.
pub const ANSWER_ROLE: &str = "Você é um assistente jurídico especializado em auxiliar promotores de justiça na análise de processos. Sua função é fornecer respostas somente com base nos documentos fornecidos. Se a informação não estiver nos documentos, responda claramente que não há referência disponível. Não tente adivinhar ou inferir respostas além do conteúdo recuperado. Mantenha um tom formal e objetivo, adequado ao ambiente jurídico. Sempre que fornecer uma resposta baseada nos documentos, inclua as fontes utilizadas como notas de rodapé, indicando claramente a ID do documento e a página correspondente. Se a pergunta for irrelevante ao contexto processual, informe educadamente que sua função é auxiliar exclusivamente na análise dos documentos.";

/// A fused candidate hydrated with its page text and citation identifiers.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedResult {
	pub page_id: String,
	pub pagina: i64,
	pub score: f32,
	pub texto: String,
	pub id_documento_gampes: Option<String>,
	pub id_documento_mni: Option<String>,
}

/// One citation entry in the structured response, keyed `fonte_N` by fused
/// rank.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRef {
	pub pagina: i64,
	pub score: f32,
	pub id_documento_gampes: Option<String>,
	pub id_documento_mni: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskResponse {
	pub id: String,
	pub content: String,
	pub sources: serde_json::Map<String, serde_json::Value>,
}

/// Hydrates the top fused candidates with page text and document references.
/// A candidate whose page record disappeared between ranking and hydration is
/// dropped and logged.
pub async fn hydrate(
	svc: &LexRagService,
	fused: &[ScoredCandidate],
) -> ServiceResult<Vec<EnrichedResult>> {
	let top_n = svc.cfg.retrieval.fused_top_n;
	let mut enriched = Vec::with_capacity(top_n);

	for candidate in fused.iter().take(top_n) {
		let Some(page) = svc.engine.get_page(&candidate.page_id).await? else {
			tracing::warn!(
				page_id = %candidate.page_id,
				"Fused candidate has no stored page record; dropping it."
			);

			continue;
		};
		let refs = svc.engine.document_refs(&page.internal_document_id).await?;

		enriched.push(EnrichedResult {
			page_id: page.page_id,
			pagina: page.page_number,
			score: candidate.score,
			texto: page.text,
			id_documento_gampes: refs.id_documento_gampes,
			id_documento_mni: refs.id_documento_mni,
		});
	}

	Ok(enriched)
}

/// Appends the retrieved passages to the question, each under a citation
/// header, capped at `max_context_chars`. Passages past the cap are left out
/// whole rather than truncated mid-text.
pub fn build_prompt(retrieval: &Retrieval, question: &str, results: &[EnrichedResult]) -> String {
	let mut prompt = format!("{question}\n\n Fontes de informação:\n\n");

	for result in results {
		let gampes = result.id_documento_gampes.as_deref().unwrap_or("-");
		let mni = result.id_documento_mni.as_deref().unwrap_or("-");
		let passage = format!(
			"Documento: GAMPES ID n: {gampes} PJe ID n: {mni}\nPagina {}:\n{}\n\n",
			result.pagina, result.texto
		);

		if prompt.len() + passage.len() > retrieval.max_context_chars {
			tracing::warn!(
				page_id = %result.page_id,
				"Context window is full; omitting the remaining passages."
			);

			break;
		}

		prompt.push_str(&passage);
	}

	prompt
}

/// Shapes the final response: the generated answer plus `fonte_1..fonte_N`
/// citations in fused-rank order.
pub fn build_response(
	completion_id: &str,
	content: &str,
	results: &[EnrichedResult],
) -> TaskResponse {
	let mut sources = serde_json::Map::new();

	for (index, result) in results.iter().enumerate() {
		let source = SourceRef {
			pagina: result.pagina,
			score: result.score,
			id_documento_gampes: result.id_documento_gampes.clone(),
			id_documento_mni: result.id_documento_mni.clone(),
		};

		match serde_json::to_value(&source) {
			Ok(value) => {
				sources.insert(format!("fonte_{}", index + 1), value);
			},
			Err(err) => tracing::warn!(?err, "Failed to serialize a source reference."),
		}
	}

	TaskResponse { id: completion_id.to_string(), content: content.to_string(), sources }
}
