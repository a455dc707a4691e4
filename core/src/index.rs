//! The conflict index: component → pull requests, plus the illegal list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::classify::ClassifiedPull;
use crate::component::ComponentId;

/// Aggregate view over one run's classified pull requests.
///
/// Components iterate in sorted order; each component's pull list preserves
/// the order the classified pulls were supplied in (the original listing
/// order), so the same snapshot always reproduces the same index. A pull
/// number appears at most once per component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictIndex {
    by_component: BTreeMap<ComponentId, Vec<u64>>,
    illegal: Vec<ClassifiedPull>,
}

impl ConflictIndex {
    /// Folds the classified pulls into the index.
    ///
    /// Legal pulls are registered under every component they touch; illegal
    /// pulls go to the illegal list (with their full component set, for
    /// reporting) and contribute to no conflict group.
    pub fn build(classified: Vec<ClassifiedPull>) -> Self {
        classified.into_iter().fold(Self::default(), |mut index, pull| {
            if pull.illegal {
                index.illegal.push(pull);
            } else {
                for component in &pull.components {
                    index
                        .by_component
                        .entry(component.clone())
                        .or_default()
                        .push(pull.number);
                }
            }
            index
        })
    }

    /// All registered components, sorted, with their pull lists.
    pub fn components(&self) -> impl Iterator<Item = (&ComponentId, &[u64])> {
        self.by_component
            .iter()
            .map(|(component, pulls)| (component, pulls.as_slice()))
    }

    /// Components touched by strictly more than one pull request.
    pub fn conflicts(&self) -> impl Iterator<Item = (&ComponentId, &[u64])> {
        self.components().filter(|(_, pulls)| pulls.len() > 1)
    }

    /// Pulls registered for a component, registration order.
    pub fn pulls_for(&self, component: &ComponentId) -> &[u64] {
        self.by_component
            .get(component)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The other pulls registered for a component, registration order.
    pub fn conflicting_partners(&self, component: &ComponentId, number: u64) -> Vec<u64> {
        self.pulls_for(component)
            .iter()
            .copied()
            .filter(|&member| member != number)
            .collect()
    }

    /// Illegal pulls, input order.
    pub fn illegal(&self) -> &[ClassifiedPull] {
        &self.illegal
    }

    pub fn has_conflicts(&self) -> bool {
        self.conflicts().next().is_some()
    }
}
