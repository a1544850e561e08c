/// State management module
///
/// This module owns everything below the UI:
/// - Shared data structures (data.rs)
/// - The store contract and common validation (store.rs)
/// - The local shelf backend, one JSON file (local.rs)
/// - The shared catalog backend, SQLite with ownership (catalog.rs)

pub mod catalog;
pub mod data;
pub mod local;
pub mod store;
