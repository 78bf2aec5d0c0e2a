//! Profile loader: assembles a profile from a directory of YAML files.
//!
//! Layout: `personal.yaml`, `skills.yaml`, and one file per entry under
//! `experience/`, `education/` and `other/`. Personal and skills files are
//! required. Entry files are loaded independently: a bad one is reported and
//! excluded, never fatal to the rest of the profile.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_yaml::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::profile::models::{Bullet, Entry, EntryKind, PersonalInfo, Profile, SkillsData};
use crate::profile::validation::{check_bullet, check_entry, ValidationIssue};

pub const PERSONAL_FILE: &str = "personal.yaml";
pub const SKILLS_FILE: &str = "skills.yaml";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Missing required profile file: {0}")]
    MissingFile(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// A profile together with every unit that was skipped while loading it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadedProfile {
    pub profile: Profile,
    pub issues: Vec<ValidationIssue>,
}

/// Accumulator for the entry-file fold.
#[derive(Default)]
struct EntryFold {
    entries: Vec<Entry>,
    issues: Vec<ValidationIssue>,
    seen_ids: HashSet<String>,
}

impl EntryFold {
    fn accept(mut self, path: &Path, kind: EntryKind) -> Self {
        let unit = path.display().to_string();

        let mut value: Value = match read_yaml(path) {
            Ok(value) => value,
            Err(e) => {
                warn!("Skipping entry file {unit}: {e}");
                self.issues.push(ValidationIssue::new(unit, e.to_string()));
                return self;
            }
        };

        // Bullets are decoded one by one so a bad bullet never sinks its entry.
        let raw_bullets = match value.as_mapping_mut().and_then(|m| m.remove("bullets")) {
            Some(Value::Sequence(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(_) => {
                self.issues.push(ValidationIssue::new(
                    format!("{unit}#bullets"),
                    "bullets must be a list",
                ));
                Vec::new()
            }
        };

        let mut entry: Entry = if value.is_null() {
            Entry::default()
        } else {
            match serde_yaml::from_value(value) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping entry file {unit}: {e}");
                    self.issues.push(ValidationIssue::new(unit, e.to_string()));
                    return self;
                }
            }
        };
        entry.kind = kind;

        if let Err(reason) = check_entry(&entry) {
            warn!("Skipping entry file {unit}: {reason}");
            self.issues.push(ValidationIssue::new(unit, reason));
            return self;
        }

        if !self.seen_ids.insert(entry.id.clone()) {
            self.issues.push(ValidationIssue::new(
                unit,
                format!("duplicate entry id '{}'", entry.id),
            ));
            return self;
        }

        let mut kept = Vec::with_capacity(raw_bullets.len());
        for (idx, raw) in raw_bullets.into_iter().enumerate() {
            let bullet_unit = format!("{unit}#bullet[{idx}]");
            match serde_yaml::from_value::<Bullet>(raw) {
                Ok(bullet) => match check_bullet(&bullet) {
                    Ok(()) => kept.push(bullet),
                    Err(reason) => self.issues.push(ValidationIssue::new(bullet_unit, reason)),
                },
                Err(e) => {
                    warn!("Dropping bullet {bullet_unit}: {e}");
                    self.issues.push(ValidationIssue::new(bullet_unit, e.to_string()));
                }
            }
        }
        entry.bullets = kept;

        self.entries.push(entry);
        self
    }
}

/// Loads the full profile from `profile_dir`.
pub fn load_profile(profile_dir: &Path) -> Result<LoadedProfile, ProfileError> {
    let personal: PersonalInfo = read_required(&profile_dir.join(PERSONAL_FILE))?;
    let skills: SkillsData = read_required(&profile_dir.join(SKILLS_FILE))?;

    let mut fold = EntryFold::default();
    for kind in EntryKind::ALL {
        let dir = profile_dir.join(kind.dir_name());
        match entry_files(&dir) {
            Ok(files) => {
                fold = files
                    .iter()
                    .fold(fold, |acc, path| acc.accept(path, kind));
            }
            Err(e) => fold.issues.push(ValidationIssue::new(
                dir.display().to_string(),
                format!("unreadable directory: {e}"),
            )),
        }
    }

    info!(
        "Profile loaded from {}: {} entries, {} issues",
        profile_dir.display(),
        fold.entries.len(),
        fold.issues.len()
    );

    Ok(LoadedProfile {
        profile: Profile {
            personal,
            skills,
            entries: fold.entries,
        },
        issues: fold.issues,
    })
}

/// Lists `*.yaml` / `*.yml` files in `dir`, sorted by name. A missing directory is empty.
fn entry_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && matches!(
                    p.extension().and_then(|x| x.to_str()),
                    Some("yaml") | Some("yml")
                )
        })
        .collect();
    files.sort();
    Ok(files)
}

fn read_required<T: DeserializeOwned + Default>(path: &Path) -> Result<T, ProfileError> {
    if !path.exists() {
        return Err(ProfileError::MissingFile(path.to_path_buf()));
    }
    read_yaml(path)
}

fn read_yaml<T: DeserializeOwned + Default>(path: &Path) -> Result<T, ProfileError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if raw.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(&raw).map_err(|source| ProfileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn base_profile() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            PERSONAL_FILE,
            r#"
name: Ada Example
email: ada@example.com
titles: [AI Engineer]
summary:
  default: Engineer who ships.
  variations:
    ml_focus: ML engineer who ships models.
"#,
        );
        write(
            dir.path(),
            SKILLS_FILE,
            r#"
technical:
  - name: Python
    tags: [ml, backend]
    priority: 1
  - name: PyTorch
    tags: [ml]
languages:
  - language: English
    level: Native
"#,
        );
        dir
    }

    #[test]
    fn test_loads_personal_skills_and_entries() {
        let dir = base_profile();
        write(
            dir.path(),
            "experience/acme.yaml",
            r#"
id: acme
title: ML Engineer
organization: Acme
dates: 2021 - 2023
bullets:
  - id: acme-1
    text: Trained models
    tags: [pytorch]
    variations:
      ml_focus: Trained vision models in PyTorch
"#,
        );
        write(
            dir.path(),
            "education/uni.yaml",
            "id: uni\ntitle: MSc AI\norganization: Uni\n",
        );

        let loaded = load_profile(dir.path()).unwrap();
        assert!(loaded.issues.is_empty(), "{:?}", loaded.issues);
        assert_eq!(loaded.profile.personal.name, "Ada Example");
        assert_eq!(loaded.profile.skills.technical.len(), 2);
        assert_eq!(loaded.profile.entries.len(), 2);
        assert_eq!(loaded.profile.entries[0].kind, EntryKind::Experience);
        assert_eq!(loaded.profile.entries[1].kind, EntryKind::Education);
        assert_eq!(
            loaded.profile.entries[0].bullets[0].variations["ml_focus"],
            "Trained vision models in PyTorch"
        );
    }

    #[test]
    fn test_malformed_entry_file_reported_not_fatal() {
        let dir = base_profile();
        write(dir.path(), "experience/a_good.yaml", "id: good\ntitle: Dev\n");
        write(dir.path(), "experience/b_broken.yaml", "id: [unclosed\n");
        write(dir.path(), "other/hack.yaml", "id: hack\ntitle: Hackathon\n");

        let loaded = load_profile(dir.path()).unwrap();
        let ids: Vec<_> = loaded.profile.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["good", "hack"]);
        assert_eq!(loaded.issues.len(), 1);
        assert!(loaded.issues[0].unit.ends_with("b_broken.yaml"));
    }

    #[test]
    fn test_entry_missing_title_excluded() {
        let dir = base_profile();
        write(dir.path(), "experience/notitle.yaml", "id: notitle\n");

        let loaded = load_profile(dir.path()).unwrap();
        assert!(loaded.profile.entries.is_empty());
        assert!(loaded.issues[0].reason.contains("no title"));
    }

    #[test]
    fn test_duplicate_entry_id_excluded() {
        let dir = base_profile();
        write(dir.path(), "experience/a.yaml", "id: same\ntitle: First\n");
        write(dir.path(), "other/b.yaml", "id: same\ntitle: Second\n");

        let loaded = load_profile(dir.path()).unwrap();
        assert_eq!(loaded.profile.entries.len(), 1);
        assert_eq!(loaded.profile.entries[0].title, "First");
        assert!(loaded.issues[0].reason.contains("duplicate"));
    }

    #[test]
    fn test_bad_bullet_dropped_entry_kept() {
        let dir = base_profile();
        write(
            dir.path(),
            "experience/acme.yaml",
            r#"
id: acme
title: Engineer
bullets:
  - id: ok
    text: Did a thing
  - id: empty
    text: ""
"#,
        );

        let loaded = load_profile(dir.path()).unwrap();
        assert_eq!(loaded.profile.entries[0].bullets.len(), 1);
        assert_eq!(loaded.issues.len(), 1);
        assert!(loaded.issues[0].unit.ends_with("acme.yaml#bullet[1]"));
    }

    #[test]
    fn test_mistyped_bullet_dropped_entry_kept() {
        let dir = base_profile();
        write(
            dir.path(),
            "experience/acme.yaml",
            r#"
id: acme
title: Engineer
bullets:
  - id: ok
    text: Did a thing
  - id: bad
    text: Another thing
    priority: high
"#,
        );

        let loaded = load_profile(dir.path()).unwrap();
        assert_eq!(loaded.profile.entries.len(), 1);
        let bullets = &loaded.profile.entries[0].bullets;
        assert_eq!(bullets.len(), 1);
        assert_eq!(bullets[0].id, "ok");
        assert_eq!(loaded.issues.len(), 1);
        assert!(loaded.issues[0].unit.ends_with("acme.yaml#bullet[1]"));
        assert!(loaded.issues[0].reason.contains("invalid type"));
    }

    #[test]
    fn test_disabled_entry_is_loaded_with_flag() {
        let dir = base_profile();
        write(
            dir.path(),
            "other/old.yaml",
            "id: old\ntitle: Old thing\nenabled: false\n",
        );
        let loaded = load_profile(dir.path()).unwrap();
        assert!(!loaded.profile.entries[0].enabled);
    }

    #[test]
    fn test_missing_personal_is_fatal() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), SKILLS_FILE, "technical: []\n");
        assert!(matches!(
            load_profile(dir.path()),
            Err(ProfileError::MissingFile(_))
        ));
    }

    #[test]
    fn test_non_yaml_files_ignored() {
        let dir = base_profile();
        write(dir.path(), "experience/README.md", "# notes");
        write(dir.path(), "experience/x.yml", "id: x\ntitle: X\n");
        let loaded = load_profile(dir.path()).unwrap();
        assert_eq!(loaded.profile.entries.len(), 1);
        assert!(loaded.issues.is_empty());
    }
}
