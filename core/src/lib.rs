//! `conflictbot-core` — conflict detection and idempotent notification engine.
//!
//! Everything in this crate is pure and synchronous: it consumes an immutable
//! snapshot of the currently-open pull requests (assembled by the collaborator
//! crates) and produces values describing what, if anything, should change on
//! the remote side. No function here performs I/O or can fail; malformed
//! inputs degrade to well-defined defaults (a too-shallow path contributes no
//! component, a missing body reads as empty text).
//!
//! Pipeline, leaf first:
//!
//! 1. [`component`] maps a changed-file path to an optional component id.
//! 2. [`classify`] derives the component set of a pull request and decides
//!    whether it is legal.
//! 3. [`index`] folds the classified pulls into the component → pulls map.
//! 4. [`report`] renders the deterministic markdown summary.
//! 5. [`plan`] decides, per conflicting pull request, whether a notification
//!    comment must be created, updated, or left alone.

pub mod classify;
pub mod component;
pub mod index;
pub mod plan;
pub mod report;
pub mod snapshot;
