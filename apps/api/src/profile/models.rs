use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Language served when no translation is requested.
pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Experience,
    Education,
    #[default]
    Other,
}

impl EntryKind {
    pub const ALL: [EntryKind; 3] = [EntryKind::Experience, EntryKind::Education, EntryKind::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Experience => "experience",
            EntryKind::Education => "education",
            EntryKind::Other => "other",
        }
    }

    /// Subdirectory of the profile directory holding entries of this kind.
    pub fn dir_name(&self) -> &'static str {
        self.as_str()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Summary {
    pub default: String,
    /// Focus-area name → summary text.
    pub variations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PersonalInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub linkedin: String,
    pub website: String,
    pub titles: Vec<String>,
    pub summary: Summary,
    pub hobbies: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Skill {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_priority")]
    pub priority: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpokenLanguage {
    pub language: String,
    pub level: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SkillsData {
    pub technical: Vec<Skill>,
    pub languages: Vec<SpokenLanguage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Bullet {
    pub id: String,
    pub text: String,
    /// Language code → translated base text.
    pub translations: BTreeMap<String, String>,
    pub tags: Vec<String>,
    #[serde(default = "default_priority")]
    pub priority: u32,
    /// Focus-area name → alternate phrasing.
    pub variations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    #[serde(default)]
    pub id: String,
    /// Set by the loader from the directory the entry file lives in.
    #[serde(default)]
    pub kind: EntryKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub title_translations: BTreeMap<String, String>,
    /// Company, institution or organization.
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub organization_translations: BTreeMap<String, String>,
    #[serde(default)]
    pub dates: String,
    #[serde(default)]
    pub dates_translations: BTreeMap<String, String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub note_translations: BTreeMap<String, String>,
    #[serde(default)]
    pub gpa: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub bullets: Vec<Bullet>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// The assembled career profile. Entries keep their load (declaration) order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub personal: PersonalInfo,
    pub skills: SkillsData,
    pub entries: Vec<Entry>,
}

impl Profile {
    /// Lowercased technical skill names.
    pub fn skill_names(&self) -> Vec<String> {
        self.skills
            .technical
            .iter()
            .map(|s| s.name.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Personal titles followed by every entry title.
    pub fn reference_titles(&self) -> Vec<&str> {
        self.personal
            .titles
            .iter()
            .map(String::as_str)
            .chain(self.entries.iter().map(|e| e.title.as_str()))
            .filter(|t| !t.trim().is_empty())
            .collect()
    }
}

/// Picks `translations[language]` when a non-default language is requested and present.
pub fn localized<'a>(
    base: &'a str,
    translations: &'a BTreeMap<String, String>,
    language: &str,
) -> &'a str {
    if language == DEFAULT_LANGUAGE {
        return base;
    }
    translations
        .get(language)
        .map(String::as_str)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(base)
}

fn default_priority() -> u32 {
    1
}

fn default_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_kind_serde_snake_case() {
        let kind: EntryKind = serde_yaml::from_str("experience").unwrap();
        assert_eq!(kind, EntryKind::Experience);
        assert_eq!(serde_json::to_string(&EntryKind::Other).unwrap(), "\"other\"");
    }

    #[test]
    fn test_bullet_defaults() {
        let bullet: Bullet = serde_yaml::from_str("id: b1\ntext: Shipped it").unwrap();
        assert_eq!(bullet.priority, 1);
        assert!(bullet.tags.is_empty());
        assert!(bullet.variations.is_empty());
    }

    #[test]
    fn test_localized_prefers_translation() {
        let translations = BTreeMap::from([("es".to_string(), "Hola".to_string())]);
        assert_eq!(localized("Hello", &translations, "es"), "Hola");
        assert_eq!(localized("Hello", &translations, "en"), "Hello");
        assert_eq!(localized("Hello", &translations, "fr"), "Hello");
    }

    #[test]
    fn test_localized_ignores_blank_translation() {
        let translations = BTreeMap::from([("es".to_string(), "  ".to_string())]);
        assert_eq!(localized("Hello", &translations, "es"), "Hello");
    }

    #[test]
    fn test_reference_titles_include_entries() {
        let mut profile = Profile::default();
        profile.personal.titles = vec!["AI Engineer".to_string()];
        profile.entries.push(Entry {
            id: "acme".to_string(),
            kind: EntryKind::Experience,
            title: "Backend Developer".to_string(),
            title_translations: BTreeMap::new(),
            organization: "Acme".to_string(),
            priority: 1,
            enabled: true,
            ..Default::default()
        });
        assert_eq!(profile.reference_titles(), vec!["AI Engineer", "Backend Developer"]);
    }
}
