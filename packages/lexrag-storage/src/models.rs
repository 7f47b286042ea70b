use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

/// One row of the durable task queue. Rows are retained for audit and only
/// ever mutated through the transitions in [`crate::queue`].
#[derive(Debug, sqlx::FromRow)]
pub struct TaskRow {
	pub id: Uuid,
	/// Identifier of the task status document read by callers.
	pub external_task_id: String,
	pub payload: Value,
	pub status: i32,
	pub attempts: i32,
	pub created_at: OffsetDateTime,
	pub started_at: Option<OffsetDateTime>,
	pub finished_at: Option<OffsetDateTime>,
	pub error_message: Option<String>,
	pub agent_id: i32,
}

/// A page record as stored in the pages index.
#[derive(Debug, Clone)]
pub struct PageRecord {
	pub page_id: String,
	pub internal_document_id: String,
	pub page_number: i64,
	pub text: String,
}

/// External identifiers of one textual document, for citation provenance.
#[derive(Debug, Clone, Default)]
pub struct DocumentRefs {
	pub id_documento_gampes: Option<String>,
	pub id_documento_mni: Option<String>,
}
