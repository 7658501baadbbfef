//! Presentation views of records.
//!
//! A [`Summary`] is the one-line form shown when the caller must choose
//! between candidates. A [`Detail`] is the full form shown for a resolved
//! record. Both are built by matching on the profile variant, so every record
//! kind has an explicit rendering.

use std::fmt;

use serde::Serialize;

use roster_types::{title_case, Profile, Record};

/// Short form of a candidate.
///
/// Users show designation and hierarchy; groups show only their level, never
/// their content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Summary {
    User {
        name: String,
        designation: String,
        hierarchy: String,
    },
    Group {
        name: String,
        level: String,
    },
}

impl Summary {
    pub fn of(record: &Record) -> Self {
        match &record.profile {
            Profile::User(user) => Summary::User {
                name: title_case(&user.name),
                designation: user.designation.clone(),
                hierarchy: user.hierarchy.clone(),
            },
            Profile::Group(group) => Summary::Group {
                name: title_case(&group.name),
                level: group.level.clone(),
            },
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Summary::User {
                name,
                designation,
                hierarchy,
            } => write!(f, "{} | {} | {}", name, designation, hierarchy),
            Summary::Group { name, level } => write!(f, "{} | Level: {}", name, level),
        }
    }
}

/// Full form of a resolved record.
///
/// Users omit their level; groups include the full record content as the
/// description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Detail {
    User {
        name: String,
        designation: String,
        hierarchy: String,
    },
    Group {
        name: String,
        level: String,
        description: String,
    },
}

impl Detail {
    pub fn of(record: &Record) -> Self {
        match &record.profile {
            Profile::User(user) => Detail::User {
                name: title_case(&user.name),
                designation: user.designation.clone(),
                hierarchy: user.hierarchy.clone(),
            },
            Profile::Group(group) => Detail::Group {
                name: title_case(&group.name),
                level: group.level.clone(),
                description: record.content.clone(),
            },
        }
    }
}

impl fmt::Display for Detail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Detail::User {
                name,
                designation,
                hierarchy,
            } => {
                writeln!(f, "Name: {}", name)?;
                writeln!(f, "Designation: {}", designation)?;
                write!(f, "Hierarchy: {}", hierarchy)
            }
            Detail::Group {
                name,
                level,
                description,
            } => {
                writeln!(f, "Group Name: {}", name)?;
                writeln!(f, "Level: {}", level)?;
                write!(f, "Description: {}", description)
            }
        }
    }
}
