//! Disambiguation policy.
//!
//! Decides, from the ranked candidate list of one query, whether the answer is
//! a single record, a choice the caller has to make, or nothing at all.
//!
//! - no candidates: [`Resolution::NoMatch`]
//! - two or more candidates whose top two distances differ by less than the
//!   tie threshold: [`Resolution::Ambiguous`]
//! - otherwise: [`Resolution::Single`] with the closest candidate

use std::fmt;

use serde::Serialize;
use tracing::debug;

use roster_types::Record;

use crate::error::QueryError;
use crate::view::{Detail, Summary};

/// Default gap below which the top two candidates count as tied.
pub const DEFAULT_TIE_THRESHOLD: f32 = 0.05;

/// A search result resolved to its record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// Position in the index
    pub position: usize,
    /// Squared Euclidean distance to the query
    pub distance: f32,
    pub record: Record,
}

impl Candidate {
    pub fn summary(&self) -> Summary {
        Summary::of(&self.record)
    }

    pub fn detail(&self) -> Detail {
        Detail::of(&self.record)
    }
}

/// Outcome of one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution {
    NoMatch,
    Single { candidate: Candidate },
    Ambiguous(AmbiguousChoice),
}

impl Resolution {
    /// Resolve to a detail view, using `selection` if the result is ambiguous.
    ///
    /// Fails with [`QueryError::NoMatch`] when there is nothing to show and
    /// with [`QueryError::InvalidSelection`] when an ambiguous result has no
    /// valid selection.
    pub fn into_detail(self, selection: Option<&str>) -> Result<Detail, QueryError> {
        match self {
            Resolution::NoMatch => Err(QueryError::NoMatch),
            Resolution::Single { candidate } => Ok(candidate.detail()),
            Resolution::Ambiguous(choice) => match selection {
                Some(input) => choice.select(input).map(|candidate| candidate.detail()),
                None => Err(QueryError::InvalidSelection("no selection given".to_string())),
            },
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Resolution::Ambiguous(_))
    }
}

/// Candidates the caller must choose between, closest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmbiguousChoice {
    candidates: Vec<Candidate>,
}

impl AmbiguousChoice {
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Take the candidate chosen by a 1-based selection.
    ///
    /// `input` is trimmed and must be a plain decimal number between 1 and the
    /// number of candidates. There is no default and no retry.
    pub fn select(self, input: &str) -> Result<Candidate, QueryError> {
        let index = parse_selection(input, self.candidates.len())?;
        debug!(selection = index + 1, "Candidate selected");
        self.candidates
            .into_iter()
            .nth(index)
            .ok_or_else(|| QueryError::InvalidSelection(input.trim().to_string()))
    }
}

impl fmt::Display for AmbiguousChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, candidate) in self.candidates.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}. {}", i + 1, candidate.summary())?;
        }
        Ok(())
    }
}

/// Parse a 1-based selection into a 0-based index below `count`.
pub fn parse_selection(input: &str, count: usize) -> Result<usize, QueryError> {
    let trimmed = input.trim();
    let invalid = || QueryError::InvalidSelection(trimmed.to_string());

    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let choice: usize = trimmed.parse().map_err(|_| invalid())?;
    if choice == 0 || choice > count {
        return Err(invalid());
    }
    Ok(choice - 1)
}

/// Apply the policy to a candidate list.
///
/// Candidates are ordered by ascending distance, then by position, before the
/// policy looks at them.
pub fn disambiguate(mut candidates: Vec<Candidate>, tie_threshold: f32) -> Resolution {
    candidates.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| a.position.cmp(&b.position))
    });

    if candidates.is_empty() {
        debug!("No candidates");
        return Resolution::NoMatch;
    }

    if candidates.len() > 1 {
        let gap = (candidates[1].distance - candidates[0].distance).abs();
        if gap < tie_threshold {
            debug!(candidates = candidates.len(), gap, "Top candidates tied");
            return Resolution::Ambiguous(AmbiguousChoice { candidates });
        }
    }

    let candidate = candidates.swap_remove(0);
    debug!(id = %candidate.record.id, distance = candidate.distance, "Single match");
    Resolution::Single { candidate }
}
