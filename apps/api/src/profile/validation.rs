use serde::{Deserialize, Serialize};

use crate::profile::models::{Bullet, Entry};

/// A profile unit (file, entry or bullet) that was skipped, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub unit: String,
    pub reason: String,
}

impl ValidationIssue {
    pub fn new(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            reason: reason.into(),
        }
    }
}

/// Checks the fields an entry cannot be rendered without.
pub fn check_entry(entry: &Entry) -> Result<(), String> {
    if entry.id.trim().is_empty() {
        return Err("entry has no id".to_string());
    }
    if entry.title.trim().is_empty() {
        return Err(format!("entry '{}' has no title", entry.id));
    }
    Ok(())
}

pub fn check_bullet(bullet: &Bullet) -> Result<(), String> {
    if bullet.id.trim().is_empty() {
        return Err("bullet has no id".to_string());
    }
    if bullet.text.trim().is_empty() {
        return Err(format!("bullet '{}' has no text", bullet.id));
    }
    Ok(())
}

/// Returns the indices of well-formed bullets, recording an issue for each bad one.
pub fn valid_bullet_indices(
    entry: &Entry,
    unit: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Vec<usize> {
    entry
        .bullets
        .iter()
        .enumerate()
        .filter_map(|(idx, bullet)| match check_bullet(bullet) {
            Ok(()) => Some(idx),
            Err(reason) => {
                issues.push(ValidationIssue::new(
                    format!("{unit}#bullet[{idx}]"),
                    reason,
                ));
                None
            }
        })
        .collect()
}
