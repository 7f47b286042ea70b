use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use lexrag_domain::TaskStatus;

use crate::{Result, db::Db, models::TaskRow};

/// Inserts a new task in the `Queued` state.
pub async fn enqueue(
	db: &Db,
	external_task_id: &str,
	payload: &Value,
	agent_id: i32,
	now: OffsetDateTime,
) -> Result<Uuid> {
	let id = Uuid::new_v4();

	sqlx::query(
		"\
INSERT INTO task_queue (id, external_task_id, payload, status, attempts, created_at, agent_id)
VALUES ($1, $2, $3, $4, 0, $5, $6)",
	)
	.bind(id)
	.bind(external_task_id)
	.bind(payload)
	.bind(TaskStatus::Queued.code())
	.bind(now)
	.bind(agent_id)
	.execute(&db.pool)
	.await?;

	Ok(id)
}

/// Atomically claims the oldest eligible task for one agent.
///
/// Select-and-mark runs in a single transaction with `FOR UPDATE SKIP
/// LOCKED`, so concurrent workers polling the same table never claim the same
/// row. The attempt counter increments here and only here, on the transition
/// into `Claimed`.
pub async fn claim_next(db: &Db, agent_id: i32, now: OffsetDateTime) -> Result<Option<TaskRow>> {
	let mut tx = db.pool.begin().await?;
	let row: Option<TaskRow> = sqlx::query_as(
		"\
SELECT id, external_task_id, payload, status, attempts, created_at, started_at, finished_at,
	error_message, agent_id
FROM task_queue
WHERE status = $1 AND agent_id = $2
ORDER BY created_at ASC
LIMIT 1
FOR UPDATE SKIP LOCKED",
	)
	.bind(TaskStatus::Queued.code())
	.bind(agent_id)
	.fetch_optional(&mut *tx)
	.await?;

	let claimed = if let Some(mut task) = row {
		sqlx::query(
			"UPDATE task_queue SET status = $1, attempts = attempts + 1, started_at = $2 WHERE id = $3",
		)
		.bind(TaskStatus::Claimed.code())
		.bind(now)
		.bind(task.id)
		.execute(&mut *tx)
		.await?;

		task.status = TaskStatus::Claimed.code();
		task.attempts += 1;
		task.started_at = Some(now);

		Some(task)
	} else {
		None
	};

	tx.commit().await?;

	Ok(claimed)
}

pub async fn mark_succeeded(db: &Db, id: Uuid, now: OffsetDateTime) -> Result<()> {
	sqlx::query("UPDATE task_queue SET status = $1, finished_at = $2, error_message = NULL WHERE id = $3")
		.bind(TaskStatus::Succeeded.code())
		.bind(now)
		.bind(id)
		.execute(&db.pool)
		.await?;

	Ok(())
}

/// Returns a failed task to the `Queued` state so a later claim can retry it.
/// The attempt counter is untouched; it already advanced at claim time.
pub async fn requeue(db: &Db, id: Uuid, error_message: &str, now: OffsetDateTime) -> Result<()> {
	sqlx::query(
		"UPDATE task_queue SET status = $1, error_message = $2, finished_at = $3 WHERE id = $4",
	)
	.bind(TaskStatus::Queued.code())
	.bind(error_message)
	.bind(now)
	.bind(id)
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// Commits a terminal failure (bad payload or attempts exhausted).
pub async fn mark_failed(
	db: &Db,
	id: Uuid,
	status: TaskStatus,
	error_message: &str,
	now: OffsetDateTime,
) -> Result<()> {
	sqlx::query(
		"UPDATE task_queue SET status = $1, error_message = $2, finished_at = $3 WHERE id = $4",
	)
	.bind(status.code())
	.bind(error_message)
	.bind(now)
	.bind(id)
	.execute(&db.pool)
	.await?;

	Ok(())
}
