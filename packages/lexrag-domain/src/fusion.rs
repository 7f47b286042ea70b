use std::collections::HashMap;

/// A page with a relevance score. The score scale depends on which search
/// produced it (BM25 versus cosine), so raw scores from different searches
/// must never be compared directly; rank fusion removes that dependency.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
	pub page_id: String,
	pub score: f32,
}

impl ScoredCandidate {
	pub fn new(page_id: impl Into<String>, score: f32) -> Self {
		Self { page_id: page_id.into(), score }
	}
}

/// Reciprocal Rank Fusion over the lexical and vector result lists.
///
/// Each list contributes `1 / (k + rank)` per page with 1-based ranks; a page
/// present in both lists accumulates both terms. The output contains every
/// page appearing in either list, sorted descending by fused score. Ties keep
/// input order, with the lexical list processed first.
pub fn reciprocal_rank_fusion(
	lexical: &[ScoredCandidate],
	vector: &[ScoredCandidate],
	k: f32,
) -> Vec<ScoredCandidate> {
	let mut fused: Vec<ScoredCandidate> = Vec::with_capacity(lexical.len() + vector.len());
	let mut index_by_page: HashMap<&str, usize> = HashMap::new();

	for list in [lexical, vector] {
		for (rank, candidate) in list.iter().enumerate() {
			let contribution = 1.0 / (k + rank as f32 + 1.0);

			match index_by_page.get(candidate.page_id.as_str()) {
				Some(&idx) => fused[idx].score += contribution,
				None => {
					index_by_page.insert(candidate.page_id.as_str(), fused.len());
					fused.push(ScoredCandidate::new(candidate.page_id.clone(), contribution));
				},
			}
		}
	}

	// Stable sort keeps first-seen order for equal scores.
	fused.sort_by(|a, b| b.score.total_cmp(&a.score));

	fused
}
