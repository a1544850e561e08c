/// UI view-model module
///
/// This module handles:
/// - Filtering the snapshot against the search query
/// - Turning records into render-ready cards (cards.rs)

pub mod cards;
