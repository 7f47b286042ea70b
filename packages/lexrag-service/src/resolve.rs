//! Reference resolution: external document references to internal document
//! ids, documents to pages, and pages to cached embeddings.

use lexrag_domain::TaskPayload;

use crate::{LexRagService, ServiceResult};

/// Resolves both external reference lists to internal textual-document ids.
///
/// The two sources are queried concurrently. A source whose endpoint stays
/// unreachable after its own retries contributes an empty list instead of
/// failing the task; the fault is logged here.
pub async fn resolve_document_ids(
	svc: &LexRagService,
	payload: &TaskPayload,
) -> ServiceResult<Vec<String>> {
	let resolution = &svc.cfg.providers.resolution;
	let (gampes, mni) = tokio::join!(
		svc.providers.resolution.resolve(&resolution.gampes, &payload.id_documentos_gampes),
		svc.providers.resolution.resolve(&resolution.mni, &payload.id_documentos_mni),
	);
	let mut resolved = degraded("gampes", gampes);

	resolved.extend(degraded("mni", mni));

	Ok(resolved)
}

fn degraded(source: &str, result: color_eyre::Result<Vec<String>>) -> Vec<String> {
	match result {
		Ok(ids) => ids,
		Err(err) => {
			tracing::warn!(
				source,
				?err,
				"Reference resolution exhausted its retries; continuing without this source."
			);

			Vec::new()
		},
	}
}

/// Expands internal document ids into their page ids. Unknown documents
/// contribute nothing.
pub async fn resolve_pages(
	svc: &LexRagService,
	internal_document_ids: &[String],
) -> ServiceResult<Vec<String>> {
	let mut page_ids = Vec::new();

	for id in internal_document_ids {
		let pages = svc.engine.pages_for_document(id).await?;

		if pages.is_empty() {
			tracing::warn!(internal_document_id = %id, "Document has no indexed pages.");
		}

		page_ids.extend(pages);
	}

	Ok(page_ids)
}

/// Guarantees an embedding record for every candidate page, computing one on
/// cache miss. This is the only place embeddings are created, so a page ends
/// up with at most one record.
///
/// Pages whose stored text is missing or whose computed vector has the wrong
/// dimensionality are dropped from the candidate set and logged; they never
/// abort the task.
pub async fn ensure_embeddings(
	svc: &LexRagService,
	page_ids: Vec<String>,
) -> ServiceResult<Vec<String>> {
	let expected = svc.cfg.providers.embedding.dimensions;
	let mut usable = Vec::with_capacity(page_ids.len());

	for page_id in page_ids {
		if svc.engine.embedding_exists(&page_id).await? {
			usable.push(page_id);

			continue;
		}

		let Some(page) = svc.engine.get_page(&page_id).await? else {
			tracing::warn!(page_id, "Candidate page has no stored record; dropping it.");

			continue;
		};
		let vector = svc.providers.embedding.embed(&svc.cfg.providers.embedding, &page.text).await?;

		if vector.len() != expected {
			tracing::warn!(
				page_id,
				expected,
				actual = vector.len(),
				"Computed page embedding has the wrong dimensionality; dropping the page."
			);

			continue;
		}

		svc.engine.index_embedding(&page_id, &vector).await?;
		usable.push(page_id);
	}

	Ok(usable)
}
