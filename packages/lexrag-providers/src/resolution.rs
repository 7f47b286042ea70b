use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

const RESOLUTION_ATTEMPTS: u32 = 3;
const RESOLUTION_BACKOFF: Duration = Duration::from_secs(2);

/// Resolves a batch of external document references into internal textual
/// document identifiers via one OCR endpoint.
///
/// The endpoint is retried up to three times with a fixed two second backoff;
/// only an HTTP 200 with a `resultados` map counts as success. References
/// absent from the map are dropped, and the returned ids keep the request
/// order of their references.
pub async fn resolve(
	cfg: &lexrag_config::ResolutionEndpoint,
	document_ids: &[String],
) -> Result<Vec<String>> {
	if document_ids.is_empty() {
		return Ok(Vec::new());
	}

	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let body = serde_json::json!({ "document_ids": document_ids });
	let mut last_error = eyre::eyre!("Resolution endpoint never called.");

	for attempt in 1..=RESOLUTION_ATTEMPTS {
		match client.post(&cfg.url).json(&body).send().await {
			Ok(res) => match res.error_for_status() {
				Ok(res) => match res.json::<Value>().await {
					Ok(json) => return parse_resolution_response(&json, document_ids),
					Err(err) => last_error = err.into(),
				},
				Err(err) => last_error = err.into(),
			},
			Err(err) => last_error = err.into(),
		}

		tracing::warn!(
			url = %cfg.url,
			attempt,
			error = %last_error,
			"Resolution request failed.",
		);

		if attempt < RESOLUTION_ATTEMPTS {
			tokio::time::sleep(RESOLUTION_BACKOFF).await;
		}
	}

	Err(last_error)
}

fn parse_resolution_response(json: &Value, document_ids: &[String]) -> Result<Vec<String>> {
	let results = json
		.get("resultados")
		.and_then(|v| v.as_object())
		.ok_or_else(|| eyre::eyre!("Resolution response is missing resultados map."))?;

	let mut resolved = Vec::with_capacity(results.len());

	for document_id in document_ids {
		if let Some(value) = results.get(document_id).and_then(|v| v.as_str()) {
			resolved.push(value.to_string());
		}
	}

	Ok(resolved)
}
