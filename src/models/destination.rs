use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Stable registry identifier of a destination folder.
///
/// Ordered numerically, which is the order the selection law and the
/// prompt's requirement map rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationId(pub i64);

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DestinationId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(DestinationId)
    }
}

impl From<i64> for DestinationId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A registered target folder and its conjunctive requirement list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub id: DestinationId,
    pub folder_name: String,
    pub folder_path: PathBuf,
    pub requirements: Vec<Requirement>,
    pub created_at: NaiveDateTime,
}

impl Destination {
    pub fn requirement_count(&self) -> usize {
        self.requirements.len()
    }

    /// Requirement sentences in registry order.
    pub fn descriptions(&self) -> Vec<String> {
        self.requirements
            .iter()
            .map(|r| r.description.clone())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: i64,
    pub description: String,
}

/// Create/replace payload for a destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationInput {
    pub folder_name: String,
    pub folder_path: PathBuf,
    #[serde(default)]
    pub requirements: Vec<RequirementInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementInput {
    pub description: String,
}
