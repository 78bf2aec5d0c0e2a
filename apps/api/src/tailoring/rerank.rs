//! Capability-assisted bullet re-ranking on top of the baseline selector.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use crate::llm_client::fallback::enhanced_or;
use crate::llm_client::{complete_as, Capability};
use crate::matching::keywords::KeywordSet;
use crate::postings::models::Posting;
use crate::profile::models::Profile;
use crate::profile::validation::check_entry;
use crate::tailoring::models::{TailorOptions, TailoredView};
use crate::tailoring::prompts::{rerank_prompt, RERANK_SYSTEM};
use crate::tailoring::selector::{entry_unit, ranked_candidates, tailor_with_orders};

#[derive(Debug, Deserialize)]
struct RerankReply {
    order: Vec<usize>,
}

/// Asks the capability for a relevance order of each entry's baseline
/// candidates, then tailors with whatever orders came back. Entries without a
/// usable answer keep the baseline order.
pub async fn tailor_enhanced(
    profile: &Profile,
    posting: &Posting,
    keywords: &KeywordSet,
    focus: Option<&str>,
    options: &TailorOptions,
    capability: &dyn Capability,
    timeout: Duration,
) -> TailoredView {
    let mut orders: HashMap<String, Vec<usize>> = HashMap::new();

    if capability.available() {
        for (position, entry) in profile.entries.iter().enumerate() {
            if !entry.enabled || check_entry(entry).is_err() {
                continue;
            }
            // Issues are recorded by the final tailoring pass.
            let mut scratch = Vec::new();
            let candidates =
                ranked_candidates(entry, &entry_unit(entry, position), keywords, &mut scratch);
            if candidates.len() < 2 {
                continue;
            }

            let prompt = rerank_prompt(posting, &candidates);
            if let Some(reply) = enhanced_or(capability, timeout, "bullet re-ranking", || {
                complete_as::<RerankReply>(capability, &prompt, RERANK_SYSTEM)
            })
            .await
            {
                orders.insert(entry.id.clone(), reply.order);
            }
        }
    }

    tailor_with_orders(profile, posting, keywords, focus, options, &orders)
}
