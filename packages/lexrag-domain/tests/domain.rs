use lexrag_domain::{
	Disposition, Fault, MAX_ATTEMPTS, ScoredCandidate, TaskPayload, TaskStatus, dispose,
	reciprocal_rank_fusion,
};

#[test]
fn failed_task_lifecycle_reaches_terminal_after_three_attempts() {
	let mut attempts = 0;

	loop {
		attempts += 1;

		match dispose(Fault::Transient, attempts) {
			Disposition::Requeue => {
				assert!(attempts < MAX_ATTEMPTS);
			},
			Disposition::Terminal(status) => {
				assert_eq!(attempts, MAX_ATTEMPTS);
				assert_eq!(status, TaskStatus::AttemptsExhausted);
				assert!(status.is_terminal());

				break;
			},
		}
	}
}

#[test]
fn malformed_payload_maps_to_a_permanent_fault() {
	let raw = serde_json::json!({ "texto_prompt": "pergunta" });

	assert!(TaskPayload::parse(&raw).is_err());
	assert_eq!(dispose(Fault::Permanent, 1), Disposition::Terminal(TaskStatus::BadPayload));
}

#[test]
fn fusion_of_overlapping_lists_is_a_permutation_of_the_union() {
	let lexical: Vec<ScoredCandidate> = (0..10)
		.map(|i| ScoredCandidate::new(format!("p{i}"), 10.0 - i as f32))
		.collect();
	let vector: Vec<ScoredCandidate> = (5..15)
		.map(|i| ScoredCandidate::new(format!("p{i}"), 1.0 - i as f32 / 20.0))
		.collect();
	let fused = reciprocal_rank_fusion(&lexical, &vector, 60.0);

	assert_eq!(fused.len(), 15);

	for i in 0..15 {
		assert!(fused.iter().any(|c| c.page_id == format!("p{i}")));
	}

	for pair in fused.windows(2) {
		assert!(pair[0].score >= pair[1].score);
	}
}
