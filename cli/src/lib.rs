//! `conflictbot-cli` — configuration and run orchestration for the
//! `conflictbot` binary.
//!
//! One invocation is one run: fetch the snapshot of open pull requests,
//! hand it to the engine, persist the report, and execute the planned
//! notification decisions. There is no daemon mode; idempotence of the
//! engine is what makes scheduling this from cron safe.

pub mod config;
pub mod run;
