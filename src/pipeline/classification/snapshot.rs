//! Point-in-time view of the destination registry for one classification
//! round, plus the registry seam the pipeline reads it through.

use std::collections::BTreeMap;

use super::ClassificationError;
use crate::models::{Destination, DestinationId};

/// Consistent read of all destinations and their requirements.
///
/// Destinations are held sorted by identifier.
#[derive(Debug, Clone, Default)]
pub struct RequirementSnapshot {
    destinations: Vec<Destination>,
}

impl RequirementSnapshot {
    pub fn new(mut destinations: Vec<Destination>) -> Self {
        destinations.sort_by_key(|d| d.id);
        Self { destinations }
    }

    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }

    pub fn find(&self, id: DestinationId) -> Option<&Destination> {
        self.destinations
            .binary_search_by_key(&id, |d| d.id)
            .ok()
            .map(|idx| &self.destinations[idx])
    }

    /// Destinations the oracle may choose from. A destination without
    /// requirements is never offered: an empty conjunction would make it
    /// a universal match.
    pub fn offered(&self) -> impl Iterator<Item = &Destination> {
        self.destinations
            .iter()
            .filter(|d| !d.requirements.is_empty())
    }

    pub fn offered_count(&self) -> usize {
        self.offered().count()
    }

    pub fn find_offered(&self, id: DestinationId) -> Option<&Destination> {
        self.find(id).filter(|d| !d.requirements.is_empty())
    }

    /// Identifier → requirement sentences, ordered by identifier.
    pub fn requirement_map(&self) -> BTreeMap<DestinationId, Vec<String>> {
        self.offered().map(|d| (d.id, d.descriptions())).collect()
    }
}

/// Read side of the destination registry.
pub trait DestinationRegistry: Send + Sync {
    /// All destinations and requirements in one consistent read.
    fn snapshot(&self) -> Result<RequirementSnapshot, ClassificationError>;
}

/// Fixed in-memory registry.
pub struct StaticRegistry {
    destinations: Vec<Destination>,
}

impl StaticRegistry {
    pub fn new(destinations: Vec<Destination>) -> Self {
        Self { destinations }
    }
}

impl DestinationRegistry for StaticRegistry {
    fn snapshot(&self) -> Result<RequirementSnapshot, ClassificationError> {
        Ok(RequirementSnapshot::new(self.destinations.clone()))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::path::Path;

    use crate::models::{Destination, DestinationId, Requirement};

    pub fn destination(id: i64, path: &Path, reqs: &[&str]) -> Destination {
        Destination {
            id: DestinationId(id),
            folder_name: format!("folder-{id}"),
            folder_path: path.to_path_buf(),
            requirements: reqs
                .iter()
                .enumerate()
                .map(|(i, d)| Requirement {
                    id: id * 100 + i as i64,
                    description: d.to_string(),
                })
                .collect(),
            created_at: chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap(),
        }
    }
}
