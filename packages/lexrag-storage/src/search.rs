use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;

use lexrag_domain::ScoredCandidate;

use crate::{
	Error, Result,
	models::{DocumentRefs, PageRecord},
};

/// The engine-side similarity script adds this offset so scores stay positive
/// in the scoring DSL. It is removed before thresholding and before any score
/// leaves this adapter: callers always see true cosine similarity in [-1, 1].
const COSINE_SCORE_OFFSET: f32 = 1.0;

/// Page sets are bounded by the documents attached to one task, so a flat
/// size cap stands in for pagination on the scoped lookups.
const SCOPED_LOOKUP_SIZE: u32 = 1_000;

/// Partial update for a task status document in the responses index. Only the
/// populated fields are written.
#[derive(Debug, Default, Serialize)]
pub struct TaskDocumentUpdate {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub id_requisicao: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub texto_resposta: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub texto_aux: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub status: Option<i32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub mensagem_erro: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data_criacao: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub usuario: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tipo_requisicao: Option<String>,
}

/// Thin REST adapter over the search engine's three logical indices
/// (documents, pages, vectors) plus the responses index.
pub struct SearchStore {
	client: Client,
	cfg: lexrag_config::Elasticsearch,
}

impl SearchStore {
	pub fn new(cfg: &lexrag_config::Elasticsearch) -> Result<Self> {
		let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self { client, cfg: cfg.clone() })
	}

	/// All page ids belonging to one internal textual document. An unknown
	/// document simply yields no pages.
	pub async fn pages_for_document(&self, internal_document_id: &str) -> Result<Vec<String>> {
		let body = serde_json::json!({
			"query": { "match": { "id_textual": internal_document_id } },
			"size": SCOPED_LOOKUP_SIZE,
			"_source": false,
		});
		let json = self.search(&self.cfg.pages_index, body).await?;

		hit_ids(&json)
	}

	pub async fn get_page(&self, page_id: &str) -> Result<Option<PageRecord>> {
		let Some(source) = self.get_source(&self.cfg.pages_index, page_id).await? else {
			return Ok(None);
		};

		parse_page_record(page_id, &source).map(Some)
	}

	/// External citation identifiers for a textual document. Missing fields
	/// stay `None`; callers decide whether that degrades the result.
	pub async fn document_refs(&self, internal_document_id: &str) -> Result<DocumentRefs> {
		let Some(source) = self.get_source(&self.cfg.documents_index, internal_document_id).await?
		else {
			return Ok(DocumentRefs::default());
		};

		Ok(DocumentRefs {
			id_documento_gampes: string_field(&source, "id_documento_gampes"),
			id_documento_mni: string_field(&source, "id_identificador_MNI"),
		})
	}

	pub async fn embedding_exists(&self, page_id: &str) -> Result<bool> {
		let body = serde_json::json!({
			"query": { "term": { "id_pagina": page_id } },
			"size": 1,
			"_source": false,
		});
		let json = self.search(&self.cfg.vectors_index, body).await?;

		Ok(!hit_ids(&json)?.is_empty())
	}

	pub async fn index_embedding(&self, page_id: &str, vector: &[f32]) -> Result<()> {
		let url = format!("{}/{}/_doc", self.cfg.url, self.cfg.vectors_index);
		let body = serde_json::json!({
			"id_pagina": page_id,
			"embedding": vector,
		});

		self.client
			.post(url)
			.basic_auth(&self.cfg.username, Some(&self.cfg.password))
			.json(&body)
			.send()
			.await?
			.error_for_status()?;

		Ok(())
	}

	/// BM25 ranking of the candidate page set against the query text. Scores
	/// are on the engine's native scale.
	pub async fn lexical_search(
		&self,
		query_text: &str,
		page_ids: &[String],
		k: usize,
	) -> Result<Vec<ScoredCandidate>> {
		let body = serde_json::json!({
			"query": {
				"bool": {
					"must": [{
						"multi_match": {
							"query": query_text,
							"fields": ["texto"],
							"type": "best_fields",
							"tie_breaker": 0.3,
						}
					}],
					"filter": [{ "terms": { "_id": page_ids } }],
				}
			},
			"size": k,
		});
		let json = self.search(&self.cfg.pages_index, body).await?;

		lexical_hits(&json)
	}

	/// Cosine ranking of the candidate page set against the query embedding.
	/// Results below `threshold` are discarded; returned scores are true
	/// cosine similarity.
	pub async fn vector_search(
		&self,
		query_vector: &[f32],
		page_ids: &[String],
		k: usize,
		threshold: f32,
	) -> Result<Vec<ScoredCandidate>> {
		let body = serde_json::json!({
			"size": k,
			"query": {
				"script_score": {
					"query": {
						"bool": {
							"filter": [{ "terms": { "id_pagina": page_ids } }],
						}
					},
					"script": {
						"source": "cosineSimilarity(params.query_vector, 'embedding') + 1.0",
						"params": { "query_vector": query_vector },
					}
				}
			},
		});
		let json = self.search(&self.cfg.vectors_index, body).await?;

		vector_hits(&json, threshold)
	}

	pub async fn update_task_document(
		&self,
		task_id: &str,
		update: &TaskDocumentUpdate,
	) -> Result<()> {
		let url = format!("{}/{}/_update/{}", self.cfg.url, self.cfg.responses_index, task_id);
		let body = serde_json::json!({ "doc": update });

		self.client
			.post(url)
			.basic_auth(&self.cfg.username, Some(&self.cfg.password))
			.json(&body)
			.send()
			.await?
			.error_for_status()?;

		Ok(())
	}

	async fn search(&self, index: &str, body: Value) -> Result<Value> {
		let url = format!("{}/{}/_search", self.cfg.url, index);
		let res = self
			.client
			.post(url)
			.basic_auth(&self.cfg.username, Some(&self.cfg.password))
			.json(&body)
			.send()
			.await?;
		let json = res.error_for_status()?.json().await?;

		Ok(json)
	}

	async fn get_source(&self, index: &str, id: &str) -> Result<Option<Value>> {
		let url = format!("{}/{}/_doc/{}", self.cfg.url, index, id);
		let res = self
			.client
			.get(url)
			.basic_auth(&self.cfg.username, Some(&self.cfg.password))
			.send()
			.await?;

		if res.status() == StatusCode::NOT_FOUND {
			return Ok(None);
		}

		let json: Value = res.error_for_status()?.json().await?;

		if json.get("found").and_then(Value::as_bool) != Some(true) {
			return Ok(None);
		}

		Ok(json.get("_source").cloned())
	}
}

fn hits<'a>(json: &'a Value) -> Result<&'a Vec<Value>> {
	json.get("hits")
		.and_then(|v| v.get("hits"))
		.and_then(Value::as_array)
		.ok_or_else(|| Error::MalformedResponse("missing hits.hits array".to_string()))
}

fn hit_ids(json: &Value) -> Result<Vec<String>> {
	let mut ids = Vec::new();

	for hit in hits(json)? {
		let Some(id) = hit.get("_id").and_then(Value::as_str) else {
			tracing::warn!("Search hit is missing _id; dropping it.");

			continue;
		};

		ids.push(id.to_string());
	}

	Ok(ids)
}

fn lexical_hits(json: &Value) -> Result<Vec<ScoredCandidate>> {
	let mut out = Vec::new();

	for hit in hits(json)? {
		let id = hit.get("_id").and_then(Value::as_str);
		let score = hit.get("_score").and_then(Value::as_f64);

		match (id, score) {
			(Some(id), Some(score)) => out.push(ScoredCandidate::new(id, score as f32)),
			_ => tracing::warn!("Lexical hit is missing _id or _score; dropping it."),
		}
	}

	Ok(out)
}

fn vector_hits(json: &Value, threshold: f32) -> Result<Vec<ScoredCandidate>> {
	let mut out = Vec::new();

	for hit in hits(json)? {
		let page_id = hit.get("_source").and_then(|s| s.get("id_pagina")).and_then(Value::as_str);
		let raw_score = hit.get("_score").and_then(Value::as_f64);

		let (Some(page_id), Some(raw_score)) = (page_id, raw_score) else {
			tracing::warn!("Vector hit is missing id_pagina or _score; dropping it.");

			continue;
		};

		let cosine = raw_score as f32 - COSINE_SCORE_OFFSET;

		if cosine >= threshold {
			out.push(ScoredCandidate::new(page_id, cosine));
		}
	}

	out.sort_by(|a, b| b.score.total_cmp(&a.score));

	Ok(out)
}

fn parse_page_record(page_id: &str, source: &Value) -> Result<PageRecord> {
	let internal_document_id = string_field(source, "id_textual")
		.ok_or_else(|| Error::MalformedResponse(format!("page {page_id} missing id_textual")))?;
	let page_number = source
		.get("pagina")
		.and_then(Value::as_i64)
		.ok_or_else(|| Error::MalformedResponse(format!("page {page_id} missing pagina")))?;
	let text = string_field(source, "texto")
		.ok_or_else(|| Error::MalformedResponse(format!("page {page_id} missing texto")))?;

	Ok(PageRecord { page_id: page_id.to_string(), internal_document_id, page_number, text })
}

fn string_field(source: &Value, field: &str) -> Option<String> {
	source.get(field).and_then(Value::as_str).map(str::to_string)
}
