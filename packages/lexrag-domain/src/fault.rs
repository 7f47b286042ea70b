use crate::status::TaskStatus;

/// A task is abandoned after this many processing attempts, so a poison
/// payload or a permanently unreachable upstream cannot loop forever.
pub const MAX_ATTEMPTS: i32 = 3;

/// Classification attached to every pipeline failure. The worker loop decides
/// retry versus terminal failure from this, never from error type matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
	/// Upstream failure that survived the call-local retries. Worth retrying
	/// at the task level.
	Transient,
	/// Malformed request or request-shape violation. Retrying cannot help.
	Permanent,
	/// Stored data violates an invariant (for example an embedding of the
	/// wrong dimension escalated from the query side).
	DataIntegrity,
}

/// Outcome of a failed attempt, as applied to the queue row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
	/// Back to `Queued`; the task stays eligible for a later claim.
	Requeue,
	/// Terminal failure with the given status code.
	Terminal(TaskStatus),
}

/// Maps a fault and the attempt count of the failed run to a queue
/// transition. `attempts` is the value recorded on the transition into
/// `Claimed`, so the first failed run carries `attempts == 1`.
pub const fn dispose(fault: Fault, attempts: i32) -> Disposition {
	match fault {
		Fault::Permanent | Fault::DataIntegrity => Disposition::Terminal(TaskStatus::BadPayload),
		Fault::Transient =>
			if attempts >= MAX_ATTEMPTS {
				Disposition::Terminal(TaskStatus::AttemptsExhausted)
			} else {
				Disposition::Requeue
			},
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn transient_faults_requeue_until_the_cap() {
		assert_eq!(dispose(Fault::Transient, 1), Disposition::Requeue);
		assert_eq!(dispose(Fault::Transient, 2), Disposition::Requeue);
		assert_eq!(
			dispose(Fault::Transient, 3),
			Disposition::Terminal(TaskStatus::AttemptsExhausted)
		);
		assert_eq!(
			dispose(Fault::Transient, 7),
			Disposition::Terminal(TaskStatus::AttemptsExhausted)
		);
	}

	#[test]
	fn permanent_faults_never_consume_retries() {
		assert_eq!(dispose(Fault::Permanent, 1), Disposition::Terminal(TaskStatus::BadPayload));
		assert_eq!(dispose(Fault::DataIntegrity, 1), Disposition::Terminal(TaskStatus::BadPayload));
	}
}
