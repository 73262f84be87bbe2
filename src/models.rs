use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Workflow status of a copy entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyStatus {
    #[default]
    NotAssigned,
    Assigned,
    Translated,
    Reviewed,
    Approved,
    Rejected,
}

impl CopyStatus {
    pub const ALL: [CopyStatus; 6] = [
        CopyStatus::NotAssigned,
        CopyStatus::Assigned,
        CopyStatus::Translated,
        CopyStatus::Reviewed,
        CopyStatus::Approved,
        CopyStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CopyStatus::NotAssigned => "not_assigned",
            CopyStatus::Assigned => "assigned",
            CopyStatus::Translated => "translated",
            CopyStatus::Reviewed => "reviewed",
            CopyStatus::Approved => "approved",
            CopyStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for CopyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CopyStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CopyStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "copy status",
                value: s.to_string(),
            })
    }
}

/// Role of a user in the translation workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Translator,
    Reviewer,
    Developer,
}

impl UserRole {
    pub const ALL: [UserRole; 4] = [
        UserRole::Admin,
        UserRole::Translator,
        UserRole::Reviewer,
        UserRole::Developer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Translator => "translator",
            UserRole::Reviewer => "reviewer",
            UserRole::Developer => "developer",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "user role",
                value: s.to_string(),
            })
    }
}

/// A stored enum column held a value outside the known set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// A single-language text entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyEntry {
    pub id: i64,
    pub slug: Option<String>,
    pub text: String,
    pub language: String,
    pub status: CopyStatus,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CopyEntry {
    /// The slug if it takes part in the `(slug, language)` uniqueness rule.
    ///
    /// Empty and absent slugs are both exempt.
    pub fn unique_slug(&self) -> Option<&str> {
        effective_slug(self.slug.as_deref())
    }
}

/// A copy entry that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCopy {
    pub slug: Option<String>,
    pub text: String,
    pub language: String,
    pub status: CopyStatus,
    pub tags: Vec<String>,
}

impl NewCopy {
    pub fn new(slug: Option<&str>, text: &str, language: &str) -> Self {
        Self {
            slug: slug.map(str::to_string),
            text: text.to_string(),
            language: language.to_string(),
            status: CopyStatus::default(),
            tags: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: CopyStatus) -> Self {
        self.status = status;
        self
    }

    /// Replace the tag set. Repeated tags are kept once, first occurrence wins.
    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = dedup_preserving_order(tags.iter().map(|tag| tag.to_string()));
        self
    }

    pub fn unique_slug(&self) -> Option<&str> {
        effective_slug(self.slug.as_deref())
    }
}

/// A user of the admin interface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub languages: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub languages: Vec<String>,
}

impl NewUser {
    pub fn new(username: &str, email: &str, role: UserRole, languages: &[&str]) -> Self {
        Self {
            username: username.to_string(),
            email: email.to_string(),
            role,
            languages: dedup_preserving_order(languages.iter().map(|code| code.to_string())),
        }
    }
}

fn effective_slug(slug: Option<&str>) -> Option<&str> {
    slug.filter(|s| !s.is_empty())
}

fn dedup_preserving_order(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = Vec::new();
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}
