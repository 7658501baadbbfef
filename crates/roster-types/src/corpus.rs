//! Corpus normalization.
//!
//! Turns a sheet export (`{"groups": [...], "users": [...]}` with the original
//! column headers) into an ordered list of validated [`Record`]s. Groups come
//! first in sheet order, then users in sheet order. That order is the order
//! records are embedded and indexed in.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::RosterError;
use crate::record::{GroupProfile, Profile, Record, UserProfile};

/// One row of the `Groups` sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRow {
    #[serde(rename = "Group ID", default, deserialize_with = "cell")]
    pub group_id: String,
    #[serde(rename = "Group Name", default, deserialize_with = "cell")]
    pub group_name: String,
    #[serde(rename = "Description", default, deserialize_with = "cell")]
    pub description: String,
    #[serde(rename = "Level", default, deserialize_with = "cell")]
    pub level: String,
    #[serde(rename = "AlternateName1", default, deserialize_with = "cell")]
    pub alternate_name_1: String,
    #[serde(rename = "AlternateName2", default, deserialize_with = "cell")]
    pub alternate_name_2: String,
    #[serde(rename = "AlternateName3", default, deserialize_with = "cell")]
    pub alternate_name_3: String,
    #[serde(rename = "AlternateName4", default, deserialize_with = "cell")]
    pub alternate_name_4: String,
}

impl GroupRow {
    fn alternate_names(&self) -> Vec<String> {
        [
            &self.alternate_name_1,
            &self.alternate_name_2,
            &self.alternate_name_3,
            &self.alternate_name_4,
        ]
        .into_iter()
        .filter(|name| !name.is_empty())
        .cloned()
        .collect()
    }

    fn is_blank(&self) -> bool {
        self.group_id.is_empty()
            && self.group_name.is_empty()
            && self.description.is_empty()
            && self.level.is_empty()
            && self.alternate_names().is_empty()
    }

    /// Normalize this row into a group record.
    pub fn into_record(self) -> Result<Record, RosterError> {
        if self.group_id.is_empty() {
            return Err(RosterError::InvalidInput(format!(
                "group row '{}' has no Group ID",
                self.group_name
            )));
        }

        let alternate_names = self.alternate_names();
        let content = format!(
            "Group Name: {}. Description: {}. Alternative Names: {}.",
            self.group_name,
            self.description,
            alternate_names.join(", ")
        );

        Ok(Record::new(
            format!("group_{}", self.group_id),
            content,
            Profile::Group(GroupProfile {
                group_id: self.group_id,
                name: self.group_name.to_lowercase(),
                level: self.level,
                description: self.description,
                alternate_names,
            }),
        ))
    }
}

/// One row of the `Users` sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRow {
    #[serde(rename = "User name", default, deserialize_with = "cell")]
    pub user_name: String,
    #[serde(rename = "Designation", default, deserialize_with = "cell")]
    pub designation: String,
    #[serde(rename = "Hierarchy", default, deserialize_with = "cell")]
    pub hierarchy: String,
    #[serde(rename = "Level", default, deserialize_with = "cell")]
    pub level: String,
    #[serde(rename = "Appsavy ID", default, deserialize_with = "cell")]
    pub appsavy_id: String,
}

impl UserRow {
    fn is_blank(&self) -> bool {
        self.user_name.is_empty()
            && self.designation.is_empty()
            && self.hierarchy.is_empty()
            && self.level.is_empty()
            && self.appsavy_id.is_empty()
    }

    /// Normalize this row into a user record.
    pub fn into_record(self) -> Result<Record, RosterError> {
        if self.appsavy_id.is_empty() {
            return Err(RosterError::InvalidInput(format!(
                "user row '{}' has no Appsavy ID",
                self.user_name
            )));
        }

        let content = format!(
            "User Name: {}. Designation: {}. Hierarchy: {}. Level: {}.",
            self.user_name, self.designation, self.hierarchy, self.level
        );

        Ok(Record::new(
            format!("user_{}", self.appsavy_id),
            content,
            Profile::User(UserProfile {
                user_id: self.appsavy_id,
                name: self.user_name.to_lowercase(),
                designation: self.designation,
                hierarchy: self.hierarchy,
                level: self.level,
            }),
        ))
    }
}

/// Export of both sheets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Corpus {
    #[serde(default)]
    pub groups: Vec<GroupRow>,
    #[serde(default)]
    pub users: Vec<UserRow>,
}

/// Normalize a corpus into validated records, groups first.
///
/// Fully blank rows (trailing spreadsheet rows) are skipped.
pub fn normalize(corpus: Corpus) -> Result<Vec<Record>, RosterError> {
    let mut records = Vec::with_capacity(corpus.groups.len() + corpus.users.len());
    let mut skipped = 0usize;

    for row in corpus.groups {
        if row.is_blank() {
            skipped += 1;
            continue;
        }
        records.push(row.into_record()?);
    }

    for row in corpus.users {
        if row.is_blank() {
            skipped += 1;
            continue;
        }
        records.push(row.into_record()?);
    }

    if skipped > 0 {
        debug!(skipped, "Skipped blank corpus rows");
    }

    validate_records(&records)?;
    Ok(records)
}

/// Check the ingestion guarantees: unique ids and non-empty content.
pub fn validate_records(records: &[Record]) -> Result<(), RosterError> {
    let mut seen = HashSet::with_capacity(records.len());

    for record in records {
        if record.content.trim().is_empty() {
            return Err(RosterError::InvalidInput(format!(
                "record {} has empty content",
                record.id
            )));
        }
        if !seen.insert(record.id.as_str()) {
            return Err(RosterError::InvalidInput(format!(
                "duplicate record id: {}",
                record.id
            )));
        }
    }

    Ok(())
}

/// Load and normalize a sheet export.
pub fn load_corpus(path: impl AsRef<Path>) -> Result<Vec<Record>, RosterError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let corpus: Corpus = serde_json::from_slice(&bytes)?;
    let records = normalize(corpus)?;

    info!(path = ?path, records = records.len(), "Loaded corpus");
    Ok(records)
}

/// Load an already-normalized records file (a JSON array of records).
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<Record>, RosterError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let records: Vec<Record> = serde_json::from_slice(&bytes)?;
    validate_records(&records)?;

    info!(path = ?path, records = records.len(), "Loaded records");
    Ok(records)
}

/// Read a spreadsheet cell: strings are trimmed, numbers are rendered without a
/// trailing `.0` when integral, null and missing become empty.
/// Largest magnitude below which every integral `f64` is exact.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

fn cell<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < MAX_EXACT_INTEGER => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    })
}
