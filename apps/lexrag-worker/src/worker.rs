//! Polling consumer of the task queue. Claims one task at a time, runs it
//! through the pipeline, and commits the outcome to the queue row and to the
//! task status document.

use std::{sync::Arc, time::Duration as StdDuration};

use color_eyre::Result;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tokio::time as tokio_time;

use lexrag_domain::{Disposition, dispose};
use lexrag_service::{LexRagService, PipelineOutput, ServiceError, pipeline};
use lexrag_storage::{
	db::Db,
	models::TaskRow,
	queue,
	search::{SearchStore, TaskDocumentUpdate},
};

const REQUEST_TYPE: &str = "RAG";

pub struct WorkerState {
	pub db: Db,
	pub store: Arc<SearchStore>,
	pub service: LexRagService,
}

pub async fn run_worker(state: WorkerState) -> Result<()> {
	let poll_interval = StdDuration::from_millis(state.service.cfg.service.poll_interval_ms);

	tracing::info!(
		agent_id = state.service.cfg.service.agent_id,
		"Worker started; polling the task queue."
	);

	loop {
		match process_once(&state).await {
			Ok(true) => {},
			Ok(false) => tokio_time::sleep(poll_interval).await,
			Err(err) => {
				tracing::error!(error = %err, "Queue cycle failed.");
				tokio_time::sleep(poll_interval).await;
			},
		}
	}
}

/// Claims and processes at most one task. Returns whether a task was claimed,
/// so the loop can poll again immediately while the queue has work.
async fn process_once(state: &WorkerState) -> Result<bool> {
	let now = OffsetDateTime::now_utc();
	let Some(task) = queue::claim_next(&state.db, state.service.cfg.service.agent_id, now).await?
	else {
		return Ok(false);
	};

	tracing::info!(
		task_id = %task.id,
		external_task_id = %task.external_task_id,
		attempt = task.attempts,
		"Task claimed."
	);

	match pipeline::process_task(&state.service, &task.payload).await {
		Ok(output) => finish_success(state, &task, output).await?,
		Err(err) => finish_failure(state, &task, err).await?,
	}

	Ok(true)
}

async fn finish_success(state: &WorkerState, task: &TaskRow, output: PipelineOutput) -> Result<()> {
	let now = OffsetDateTime::now_utc();

	queue::mark_succeeded(&state.db, task.id, now).await?;

	let texto_aux = serde_json::to_string(&output.enriched).unwrap_or_default();
	let update = TaskDocumentUpdate {
		id_requisicao: Some(output.response.id.clone()),
		texto_resposta: Some(output.response.content.clone()),
		texto_aux: Some(texto_aux),
		status: Some(lexrag_domain::TaskStatus::Succeeded.code()),
		data_criacao: now.format(&Rfc3339).ok(),
		usuario: Some(output.user),
		tipo_requisicao: Some(REQUEST_TYPE.to_string()),
		..Default::default()
	};

	write_status_document(state, task, &update).await;
	tracing::info!(task_id = %task.id, "Task succeeded.");

	Ok(())
}

async fn finish_failure(state: &WorkerState, task: &TaskRow, err: ServiceError) -> Result<()> {
	let now = OffsetDateTime::now_utc();
	let fault = err.fault();
	let message = err.to_string();

	tracing::warn!(
		task_id = %task.id,
		attempt = task.attempts,
		?fault,
		error = %message,
		"Task attempt failed."
	);

	let status = match dispose(fault, task.attempts) {
		Disposition::Requeue => {
			queue::requeue(&state.db, task.id, &message, now).await?;

			lexrag_domain::TaskStatus::Unexpected
		},
		Disposition::Terminal(status) => {
			queue::mark_failed(&state.db, task.id, status, &message, now).await?;
			tracing::error!(task_id = %task.id, code = status.code(), "Task failed terminally.");

			status
		},
	};
	let update = TaskDocumentUpdate {
		status: Some(status.code()),
		mensagem_erro: Some(message),
		data_criacao: now.format(&Rfc3339).ok(),
		tipo_requisicao: Some(REQUEST_TYPE.to_string()),
		..Default::default()
	};

	write_status_document(state, task, &update).await;

	Ok(())
}

/// The queue row is the source of truth; a failed status-document write is
/// logged, not escalated.
async fn write_status_document(state: &WorkerState, task: &TaskRow, update: &TaskDocumentUpdate) {
	if let Err(err) = state.store.update_task_document(&task.external_task_id, update).await {
		tracing::warn!(
			task_id = %task.id,
			external_task_id = %task.external_task_id,
			error = %err,
			"Failed to update the task status document."
		);
	}
}
