//! `conflictbot-github` — the GitHub REST v3 collaborator.
//!
//! Everything the engine treats as external lives here: listing open pull
//! requests and their changed files, reading issue comments, posting and
//! refreshing the bot's own comments, and maintaining the tracking issue.
//! The client owns pagination, authentication headers, rate-limit telemetry
//! and dry-run suppression of mutating calls; the engine never sees any of
//! it.

mod client;
mod error;
pub mod types;

pub use client::{GITHUB_API_BASE, GithubClient};
pub use error::GithubError;
