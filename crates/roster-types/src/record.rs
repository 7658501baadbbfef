//! Record types.
//!
//! A record is one retrievable entity: either a group or a user profile.
//! Records are created once from the corpus and are immutable afterward.

use serde::{Deserialize, Serialize};

/// Kind of a record, derived from its profile variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Organizational group
    Group,
    /// Individual user
    User,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Group => "group",
            RecordKind::User => "user",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured fields of a group record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupProfile {
    /// Source group identifier
    pub group_id: String,
    /// Group name, lower-cased at ingestion
    pub name: String,
    /// Organizational level
    pub level: String,
    /// Free-text description
    pub description: String,
    /// Alternative names the group is known by
    #[serde(default)]
    pub alternate_names: Vec<String>,
}

/// Structured fields of a user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Source user identifier
    pub user_id: String,
    /// User name, lower-cased at ingestion
    pub name: String,
    pub designation: String,
    pub hierarchy: String,
    pub level: String,
}

/// Kind-specific profile of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Profile {
    Group(GroupProfile),
    User(UserProfile),
}

/// A normalized, retrievable record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Globally unique identifier (e.g. `group_12`, `user_4711`)
    pub id: String,
    /// Human-readable summary; this is the text that gets embedded
    pub content: String,
    /// Structured per-kind fields
    pub profile: Profile,
}

impl Record {
    pub fn new(id: impl Into<String>, content: impl Into<String>, profile: Profile) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            profile,
        }
    }

    /// Kind of this record.
    pub fn kind(&self) -> RecordKind {
        match self.profile {
            Profile::Group(_) => RecordKind::Group,
            Profile::User(_) => RecordKind::User,
        }
    }

    /// Profile name as stored (lower-cased).
    pub fn name(&self) -> &str {
        match &self.profile {
            Profile::Group(group) => &group.name,
            Profile::User(user) => &user.name,
        }
    }
}

/// Capitalize the first letter of every alphabetic run and lower-case the rest.
///
/// `"anita o'neil"` becomes `"Anita O'Neil"`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;

    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }

    out
}
