use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::postings::models::Posting;
use crate::postings::normalize::{canonical_fields, dedup_key};

#[derive(Debug, Error)]
pub enum PostingError {
    #[error("Cannot merge postings with different dedup keys ({left} vs {right})")]
    KeyMismatch { left: String, right: String },
}

/// Result of folding a batch of postings by dedup key.
#[derive(Debug, Clone, Serialize)]
pub struct DedupOutcome {
    pub postings: Vec<Posting>,
    /// Number of input records folded into an earlier one.
    pub merged: usize,
}

/// Orders two postings by richness: longer description first, then a total
/// order over identifying fields so the choice never depends on argument order.
fn richness(a: &Posting, b: &Posting) -> Ordering {
    a.description
        .chars()
        .count()
        .cmp(&b.description.chars().count())
        .then_with(|| a.description.cmp(&b.description))
        .then_with(|| a.source.cmp(&b.source))
        .then_with(|| a.source_id.cmp(&b.source_id))
        .then_with(|| a.id.cmp(&b.id))
}

fn union_sorted(a: &[String], b: &[String]) -> Vec<String> {
    a.iter()
        .chain(b.iter())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn non_empty_or(primary: &str, fallback: &str) -> String {
    if primary.is_empty() {
        fallback.to_string()
    } else {
        primary.to_string()
    }
}

/// Merges two postings describing the same role.
///
/// The richer record supplies the primary fields; gaps are filled from the
/// other one. Tags and keywords are unioned, the earliest posted and latest
/// collected timestamps win, and the smaller id is kept. A score survives only
/// when both sides agree on it. Commutative and idempotent.
///
/// Keys are recomputed from the display fields; a stored `canonical` block is
/// never trusted, and the merged one is rebuilt from the winner.
pub fn merge(existing: &Posting, incoming: &Posting) -> Result<Posting, PostingError> {
    let left = dedup_key(existing);
    let right = dedup_key(incoming);
    if left != right {
        return Err(PostingError::KeyMismatch { left, right });
    }

    let (winner, loser) = match richness(existing, incoming) {
        Ordering::Less => (incoming, existing),
        _ => (existing, incoming),
    };

    let date_posted = match (winner.date_posted, loser.date_posted) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };

    Ok(Posting {
        id: winner.id.min(loser.id),
        source: winner.source.clone(),
        source_id: winner.source_id.clone(),
        title: winner.title.clone(),
        company: winner.company.clone(),
        location: winner.location.clone(),
        description: winner.description.clone(),
        url: non_empty_or(&winner.url, &loser.url),
        salary_min: winner.salary_min.or(loser.salary_min),
        salary_max: winner.salary_max.or(loser.salary_max),
        date_posted,
        date_collected: winner.date_collected.max(loser.date_collected),
        tags: union_sorted(&winner.tags, &loser.tags),
        keywords: union_sorted(&winner.keywords, &loser.keywords),
        canonical: canonical_fields(&winner.company, &winner.title, &winner.location),
        score: if winner.score == loser.score {
            winner.score.clone()
        } else {
            None
        },
    })
}

/// Folds a batch by dedup key, keeping first-seen order.
pub fn deduplicate(postings: Vec<Posting>) -> DedupOutcome {
    let mut out: Vec<Posting> = Vec::with_capacity(postings.len());
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut merged = 0usize;

    for posting in postings {
        let key = dedup_key(&posting);
        match index.get(&key) {
            Some(&slot) => {
                // Same key by construction, so merge cannot fail.
                if let Ok(combined) = merge(&out[slot], &posting) {
                    debug!(
                        "Merged duplicate posting {} into {}",
                        posting.id, combined.id
                    );
                    out[slot] = combined;
                    merged += 1;
                }
            }
            None => {
                index.insert(key, out.len());
                out.push(posting);
            }
        }
    }

    DedupOutcome {
        postings: out,
        merged,
    }
}
