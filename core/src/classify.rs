//! Per-pull-request classification: component set and legality.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::component::{ComponentId, component_for_path};
use crate::snapshot::PullRequest;

/// A pull request reduced to what the conflict index needs.
///
/// Invariants: an illegal pull contributes to no conflict group; a pull with
/// an empty component set is legal and trivially non-conflicting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedPull {
    pub number: u64,
    pub components: BTreeSet<ComponentId>,
    pub illegal: bool,
}

/// Classifies one pull request.
///
/// The component set is the union of classifications over every changed
/// file, considering both the current and (for renames) the previous path.
///
/// Legality: touching several variant folders of a single package is a
/// routine maintenance shape and stays legal, registered under every touched
/// component. Touching components of two or more distinct packages makes the
/// pull illegal and it is registered under none.
pub fn classify_pull(pull: &PullRequest, component_root: &str) -> ClassifiedPull {
    let mut components = BTreeSet::new();
    for file in &pull.files {
        components.extend(component_for_path(&file.path, component_root));
        if let Some(previous) = &file.previous_path {
            components.extend(component_for_path(previous, component_root));
        }
    }

    let illegal = spans_multiple_packages(&components);

    ClassifiedPull {
        number: pull.number,
        components,
        illegal,
    }
}

fn spans_multiple_packages(components: &BTreeSet<ComponentId>) -> bool {
    let mut packages = components.iter().map(ComponentId::package);
    match packages.next() {
        Some(first) => packages.any(|package| package != first),
        None => false,
    }
}
