use serde::{Deserialize, Serialize};

/// Strict task payload schema, validated once before a task enters the
/// pipeline. Field names match the wire contract of the queue callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPayload {
	pub texto_prompt: String,
	pub id_documentos_gampes: Vec<String>,
	pub id_documentos_mni: Vec<String>,
	pub user: String,
	#[serde(default)]
	pub idfuncao: Option<i64>,
	#[serde(default)]
	pub idorgao: Option<i64>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum PayloadError {
	InvalidJson(String),
	MissingField(&'static str),
	EmptyPrompt,
}

impl std::fmt::Display for PayloadError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidJson(message) => write!(f, "Payload is not valid JSON: {message}"),
			Self::MissingField(field) => write!(f, "Payload is missing required field {field}."),
			Self::EmptyPrompt => write!(f, "Payload texto_prompt must be non-empty."),
		}
	}
}

impl std::error::Error for PayloadError {}

impl TaskPayload {
	/// Parses and validates a raw payload value. Reference lists may be
	/// empty (a task scoped to a single source system is legal), but every
	/// field must be present and the prompt must carry text.
	pub fn parse(raw: &serde_json::Value) -> Result<Self, PayloadError> {
		for field in ["texto_prompt", "id_documentos_gampes", "id_documentos_mni", "user"] {
			if raw.get(field).is_none() {
				return Err(match field {
					"texto_prompt" => PayloadError::MissingField("texto_prompt"),
					"id_documentos_gampes" => PayloadError::MissingField("id_documentos_gampes"),
					"id_documentos_mni" => PayloadError::MissingField("id_documentos_mni"),
					_ => PayloadError::MissingField("user"),
				});
			}
		}

		let payload: Self = serde_json::from_value(raw.clone())
			.map_err(|err| PayloadError::InvalidJson(err.to_string()))?;

		if payload.texto_prompt.trim().is_empty() {
			return Err(PayloadError::EmptyPrompt);
		}

		Ok(payload)
	}
}
