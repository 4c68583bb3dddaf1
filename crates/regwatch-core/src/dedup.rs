//! Number-based deduplication of freshly normalised records.

use std::collections::HashSet;

use tracing::debug;

use crate::corpus::Corpus;
use crate::regulation::Regulation;

/// Keep the records whose number is not yet known, where "known" starts as
/// every number in `published ∪ pending` and grows as the batch is scanned,
/// so the first of several same-numbered records wins. Order is preserved.
pub fn dedup_against(corpus: &Corpus, batch: Vec<Regulation>) -> Vec<Regulation> {
    let mut known: HashSet<String> = corpus.numbers().map(str::to_string).collect();
    batch
        .into_iter()
        .filter(|reg| {
            let fresh = known.insert(reg.number.clone());
            if !fresh {
                debug!(number = %reg.number, id = %reg.id, "duplicate regulation number skipped");
            }
            fresh
        })
        .collect()
}
