//! Module Selector: reduces, reorders and focus-adapts a profile for one posting.
//!
//! No capability calls here. `rerank` supplies optional per-entry orders.

use std::cmp::{Ordering, Reverse};
use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::matching::keywords::KeywordSet;
use crate::postings::models::Posting;
use crate::postings::normalize::normalize_text;
use crate::profile::models::{localized, Bullet, Entry, Profile, Skill};
use crate::profile::validation::{check_entry, valid_bullet_indices, ValidationIssue};
use crate::tailoring::models::{TailorOptions, TailoredBullet, TailoredEntry, TailoredView};

const SKILL_KEYWORD_HIT_WEIGHT: f64 = 3.0;

/// A well-formed bullet of an entry in baseline rank order.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub index: usize,
    pub bullet: &'a Bullet,
    pub overlap: usize,
}

fn keyword_terms(keywords: &KeywordSet) -> HashSet<String> {
    keywords.terms().map(str::to_string).collect()
}

fn tag_overlap(tags: &[String], terms: &HashSet<String>) -> usize {
    tags.iter()
        .map(|t| normalize_text(t))
        .collect::<HashSet<_>>()
        .iter()
        .filter(|t| terms.contains(*t))
        .count()
}

/// Unit name used in validation issues for an entry.
pub fn entry_unit(entry: &Entry, position: usize) -> String {
    if entry.id.trim().is_empty() {
        format!("entry[{position}]")
    } else {
        format!("entry '{}'", entry.id)
    }
}

/// Ranks an entry's valid bullets by tag overlap (desc), priority (asc), then
/// declaration order. Malformed bullets are recorded in `issues`.
pub fn ranked_candidates<'a>(
    entry: &'a Entry,
    unit: &str,
    keywords: &KeywordSet,
    issues: &mut Vec<ValidationIssue>,
) -> Vec<Candidate<'a>> {
    let terms = keyword_terms(keywords);
    let mut candidates: Vec<Candidate<'a>> = valid_bullet_indices(entry, unit, issues)
        .into_iter()
        .map(|index| {
            let bullet = &entry.bullets[index];
            Candidate {
                index,
                bullet,
                overlap: tag_overlap(&bullet.tags, &terms),
            }
        })
        .collect();
    candidates.sort_by_key(|c| (Reverse(c.overlap), c.bullet.priority, c.index));
    candidates
}

/// True when `order` is a permutation of `0..len`.
pub fn validate_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    for &i in order {
        if i >= len || seen[i] {
            return false;
        }
        seen[i] = true;
    }
    true
}

/// Focus variation, else requested translation, else base text.
fn resolve_bullet(bullet: &Bullet, focus: Option<&str>, language: &str) -> (String, Option<String>) {
    if let Some(focus) = focus {
        if let Some(variation) = bullet.variations.get(focus).filter(|v| !v.trim().is_empty()) {
            return (variation.clone(), Some(focus.to_string()));
        }
    }
    (
        localized(&bullet.text, &bullet.translations, language).to_string(),
        None,
    )
}

fn select_summary(profile: &Profile, focus: Option<&str>) -> String {
    let summary = &profile.personal.summary;
    focus
        .and_then(|f| summary.variations.get(f))
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(&summary.default)
        .clone()
}

fn skill_score(skill: &Skill, keywords: &KeywordSet, terms: &HashSet<String>) -> f64 {
    let hit = if keywords.contains(&skill.name) {
        SKILL_KEYWORD_HIT_WEIGHT
    } else {
        0.0
    };
    let tag_ratio = tag_overlap(&skill.tags, terms) as f64 / skill.tags.len().max(1) as f64;
    let priority_bonus = (4.0 - f64::from(skill.priority)) / 3.0;
    hit + tag_ratio + priority_bonus
}

/// Top `max_skills` skill names by relevance; equal scores keep declaration order.
fn select_skills(profile: &Profile, keywords: &KeywordSet, max_skills: usize) -> Vec<String> {
    let terms = keyword_terms(keywords);
    let mut scored: Vec<(usize, f64, &Skill)> = profile
        .skills
        .technical
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.name.trim().is_empty())
        .map(|(i, s)| (i, skill_score(s, keywords, &terms), s))
        .collect();
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    scored
        .into_iter()
        .take(max_skills)
        .map(|(_, _, s)| s.name.clone())
        .collect()
}

fn tailor_entry(
    entry: &Entry,
    candidates: Vec<Candidate<'_>>,
    focus: Option<&str>,
    options: &TailorOptions,
) -> TailoredEntry {
    let bullets = candidates
        .into_iter()
        .take(options.max_bullets_per_entry)
        .map(|c| {
            let (text, variation) = resolve_bullet(c.bullet, focus, &options.language);
            TailoredBullet {
                id: c.bullet.id.clone(),
                text,
                relevance: c.overlap,
                variation,
            }
        })
        .collect();

    TailoredEntry {
        id: entry.id.clone(),
        kind: entry.kind,
        title: localized(&entry.title, &entry.title_translations, &options.language).to_string(),
        organization: localized(
            &entry.organization,
            &entry.organization_translations,
            &options.language,
        )
        .to_string(),
        dates: localized(&entry.dates, &entry.dates_translations, &options.language).to_string(),
        location: entry.location.clone(),
        note: entry
            .note
            .as_deref()
            .map(|note| localized(note, &entry.note_translations, &options.language).to_string()),
        gpa: entry.gpa.clone(),
        skills: entry.skills.clone(),
        bullets,
    }
}

/// Baseline tailoring.
pub fn tailor(
    profile: &Profile,
    posting: &Posting,
    keywords: &KeywordSet,
    focus: Option<&str>,
    options: &TailorOptions,
) -> TailoredView {
    tailor_with_orders(profile, posting, keywords, focus, options, &HashMap::new())
}

/// Tailoring with optional per-entry re-rank permutations keyed by entry id.
/// Each permutation indexes the entry's baseline candidates; invalid ones
/// are ignored.
pub fn tailor_with_orders(
    profile: &Profile,
    posting: &Posting,
    keywords: &KeywordSet,
    focus: Option<&str>,
    options: &TailorOptions,
    orders: &HashMap<String, Vec<usize>>,
) -> TailoredView {
    let mut issues = Vec::new();

    let mut entries: Vec<(usize, &Entry)> = profile
        .entries
        .iter()
        .enumerate()
        .filter(|(position, entry)| {
            if !entry.enabled {
                debug!("Skipping disabled entry '{}'", entry.id);
                return false;
            }
            match check_entry(entry) {
                Ok(()) => true,
                Err(reason) => {
                    issues.push(ValidationIssue::new(entry_unit(entry, *position), reason));
                    false
                }
            }
        })
        .collect();
    entries.sort_by_key(|(position, entry)| (entry.priority, *position));

    let tailored = entries
        .into_iter()
        .map(|(position, entry)| {
            let unit = entry_unit(entry, position);
            let mut candidates = ranked_candidates(entry, &unit, keywords, &mut issues);

            if let Some(order) = orders.get(&entry.id) {
                if validate_permutation(order, candidates.len()) {
                    candidates = order.iter().map(|&i| candidates[i].clone()).collect();
                } else {
                    debug!("Ignoring invalid re-rank order for {unit}: {order:?}");
                }
            }

            tailor_entry(entry, candidates, focus, options)
        })
        .collect();

    TailoredView {
        posting_id: posting.id,
        focus: focus.map(str::to_string),
        summary: select_summary(profile, focus),
        skills: select_skills(profile, keywords, options.max_skills),
        languages: profile.skills.languages.clone(),
        personal: profile.personal.clone(),
        entries: tailored,
        issues,
    }
}
