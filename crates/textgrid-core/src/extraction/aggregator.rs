//! Weighted vote aggregation: run every extractor for a field over every
//! extraction variant, sum votes per candidate value, and select the
//! highest-scoring result.

use std::collections::HashMap;

use super::{ExtractionContext, FieldExtractor};

/// One (text, extractor, result) contribution to a candidate's vote total,
/// kept only for insertion-order tie-breaking.
struct Candidate {
    value: String,
    votes: i32,
    matched_text: Option<String>,
    first_seen: usize,
}

/// Sum votes for every non-empty, non-zero-vote result produced by running
/// `extractors` against every context in `contexts`. Ordering of `contexts`
/// is significant only for the stability of tie-breaks (ties broken by
/// insertion order).
fn tally(
    contexts: &[ExtractionContext],
    extractors: &[&dyn FieldExtractor],
) -> Vec<Candidate> {
    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<String, Candidate> = HashMap::new();
    let mut seen_count = 0usize;

    for ctx in contexts {
        for extractor in extractors {
            tracing::trace!(extractor = extractor.name(), "running extractor");
            for result in extractor.extract_all(ctx) {
                if !result.is_match() {
                    continue;
                }
                let value = result.value.clone().unwrap();
                match totals.get_mut(&value) {
                    Some(existing) => {
                        existing.votes += result.votes;
                        if existing.matched_text.is_none() {
                            existing.matched_text = result.matched_text.clone();
                        }
                    }
                    None => {
                        totals.insert(
                            value.clone(),
                            Candidate {
                                value: value.clone(),
                                votes: result.votes,
                                matched_text: result.matched_text.clone(),
                                first_seen: seen_count,
                            },
                        );
                        order.push(value);
                        seen_count += 1;
                    }
                }
            }
        }
    }

    let mut candidates: Vec<Candidate> = order
        .into_iter()
        .filter_map(|key| totals.remove(&key))
        .collect();
    candidates.sort_by(|a, b| {
        b.votes
            .cmp(&a.votes)
            .then_with(|| a.first_seen.cmp(&b.first_seen))
    });
    candidates
}

/// The candidate value string with the highest vote sum across every
/// (context, extractor, result) triple, or `None` if nothing survives.
pub fn extract_best(
    contexts: &[ExtractionContext],
    extractors: &[&dyn FieldExtractor],
) -> Option<String> {
    tally(contexts, extractors).into_iter().next().map(|c| c.value)
}

/// The candidate value string plus the raw matched text that produced it,
/// for the highest-voted candidate.
pub fn extract_best_with_match(
    contexts: &[ExtractionContext],
    extractors: &[&dyn FieldExtractor],
) -> Option<(String, Option<String>)> {
    tally(contexts, extractors)
        .into_iter()
        .next()
        .map(|c| (c.value, c.matched_text))
}

/// All surviving candidates, sorted by vote sum descending (ties broken by
/// insertion order).
pub fn extract_all(
    contexts: &[ExtractionContext],
    extractors: &[&dyn FieldExtractor],
) -> Vec<(String, i32)> {
    tally(contexts, extractors)
        .into_iter()
        .map(|c| (c.value, c.votes))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::ExtractionResult;
    use crate::locale::Locale;

    struct AlwaysOne(&'static str, i32);
    impl FieldExtractor for AlwaysOne {
        fn name(&self) -> &'static str {
            "always-one"
        }
        fn extract(&self, _ctx: &ExtractionContext) -> ExtractionResult {
            ExtractionResult::new(self.0, self.1, self.0)
        }
        fn extract_all(&self, ctx: &ExtractionContext) -> Vec<ExtractionResult> {
            vec![self.extract(ctx)]
        }
    }

    #[test]
    fn sums_votes_across_variants_and_extractors() {
        let contexts = vec![
            ExtractionContext::new("a", Locale::Unknown),
            ExtractionContext::new("b", Locale::Unknown),
        ];
        let e1 = AlwaysOne("INV-1", 2);
        let e2 = AlwaysOne("INV-1", 3);
        let extractors: Vec<&dyn FieldExtractor> = vec![&e1, &e2];
        assert_eq!(extract_best(&contexts, &extractors), Some("INV-1".to_string()));
        let all = extract_all(&contexts, &extractors);
        assert_eq!(all[0], ("INV-1".to_string(), 10));
    }

    #[test]
    fn zero_vote_results_are_dropped() {
        struct NoMatch;
        impl FieldExtractor for NoMatch {
            fn name(&self) -> &'static str {
                "no-match"
            }
            fn extract(&self, _ctx: &ExtractionContext) -> ExtractionResult {
                ExtractionResult::no_match()
            }
            fn extract_all(&self, _ctx: &ExtractionContext) -> Vec<ExtractionResult> {
                vec![ExtractionResult::no_match()]
            }
        }
        let contexts = vec![ExtractionContext::new("a", Locale::Unknown)];
        let nm = NoMatch;
        let extractors: Vec<&dyn FieldExtractor> = vec![&nm];
        assert_eq!(extract_best(&contexts, &extractors), None);
    }
}
