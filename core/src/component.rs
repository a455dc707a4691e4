//! Mapping changed-file paths to component identifiers.
//!
//! Components live under a reserved top-level directory, one directory per
//! package, one subdirectory per variant/version folder:
//!
//! ```text
//! recipes/zlib/1.2/conanfile.py
//! ^^^^^^^ ^^^^ ^^^
//! root    pkg  variant
//! ```
//!
//! Anything shallower than four segments, or outside the component root, is
//! not part of any component and classifies to `None`.

use serde::{Deserialize, Serialize};

/// Top-level directory that holds all components unless configured otherwise.
pub const DEFAULT_COMPONENT_ROOT: &str = "recipes";

/// Identifier of one component: `package/variant`.
///
/// Ordering is derived from the `(package, variant)` pair, which gives the
/// sorted iteration the report relies on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentId {
    package: String,
    variant: String,
}

impl ComponentId {
    pub fn new(package: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            variant: variant.into(),
        }
    }

    /// Package name, shared by every variant of the same component family.
    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn variant(&self) -> &str {
        &self.variant
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.package, self.variant)
    }
}

/// Classifies a single path.
///
/// Returns `Some(package/variant)` when the path has at least four
/// `/`-separated segments and starts with `component_root`; `None` otherwise.
/// Trailing segments beyond the variant folder are irrelevant.
pub fn component_for_path(path: &str, component_root: &str) -> Option<ComponentId> {
    let mut segments = path.split('/');
    let root = segments.next()?;
    if root != component_root {
        return None;
    }
    let package = segments.next()?;
    let variant = segments.next()?;
    // A component is only touched through files inside the variant folder;
    // a path that ends at the variant directory itself is too shallow.
    segments.next()?;
    Some(ComponentId::new(package, variant))
}
