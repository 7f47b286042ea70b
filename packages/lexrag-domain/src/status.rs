/// Domain status codes shared between the queue rows and the task status
/// documents. `Queued` is the only claimable code; `Claimed` marks a task
/// currently held by a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
	Queued,
	Claimed,
	Succeeded,
	BadPayload,
	AttemptsExhausted,
	Unexpected,
}

impl TaskStatus {
	pub const fn code(self) -> i32 {
		match self {
			Self::Queued => 102,
			Self::Claimed => 202,
			Self::Succeeded => 200,
			Self::BadPayload => 400,
			Self::AttemptsExhausted => 429,
			Self::Unexpected => 500,
		}
	}

	pub const fn from_code(code: i32) -> Option<Self> {
		match code {
			102 => Some(Self::Queued),
			202 => Some(Self::Claimed),
			200 => Some(Self::Succeeded),
			400 => Some(Self::BadPayload),
			429 => Some(Self::AttemptsExhausted),
			500 => Some(Self::Unexpected),
			_ => None,
		}
	}

	/// Terminal states are never claimed again.
	pub const fn is_terminal(self) -> bool {
		matches!(self, Self::Succeeded | Self::BadPayload | Self::AttemptsExhausted)
	}

	pub const fn is_eligible(self) -> bool {
		matches!(self, Self::Queued)
	}
}
