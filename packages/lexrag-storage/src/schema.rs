/// Task queue DDL, applied idempotently at worker startup.
pub fn render_schema() -> String {
	"\
CREATE TABLE IF NOT EXISTS task_queue (
	id UUID PRIMARY KEY,
	external_task_id TEXT NOT NULL,
	payload JSONB NOT NULL,
	status INTEGER NOT NULL,
	attempts INTEGER NOT NULL DEFAULT 0,
	created_at TIMESTAMPTZ NOT NULL,
	started_at TIMESTAMPTZ,
	finished_at TIMESTAMPTZ,
	error_message TEXT,
	agent_id INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_task_queue_claim
	ON task_queue (agent_id, status, created_at)
"
	.to_string()
}
