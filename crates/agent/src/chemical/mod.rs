//! Chemical (agrochemical product) resolution.
//!
//! Semantic kNN search seeded by a synthesized phrase, narrowed by an exact
//! name filter, with a fuzzy name fallback and finally a fallback to the
//! product already in context.

pub mod fuzzy;
pub mod query;
pub mod resolver;

pub use fuzzy::FuzzyMatcher;
pub use query::build_semantic_query;
pub use resolver::{ChemicalResolver, SearchSettings};
