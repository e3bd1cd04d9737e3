//! Backend-agnostic automation engine for the Yuque knowledge-sharing
//! site: locator resolution, interaction fallbacks, session guarding,
//! idempotent bookkeeping, and the end-to-end scenarios built on them.

pub mod backend;
pub mod commenter;
pub mod config;
pub mod diagnostics;
pub mod interact;
pub mod ledger;
pub mod locator;
pub mod resolver;
pub mod scenario;
pub mod session;
pub mod site;
pub mod store;
