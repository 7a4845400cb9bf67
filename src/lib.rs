//! Rule knowledge base auditing: a CSV record store of agent rules, the
//! metrics and lifecycle derived from it, idempotent reconciliation into
//! Markdown documents, and a read-only health audit.

pub mod cli;
pub mod config;
pub mod content;
pub mod document;
pub mod error;
pub mod health;
pub mod metrics;
pub mod output;
pub mod platform;
pub mod reconcile;
pub mod store;
pub mod workflow;

pub use error::{Error, Result};
