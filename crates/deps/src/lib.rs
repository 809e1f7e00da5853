//! # Content Dependency Calculator
//!
//! Trimmed transitive dependency closures over the resolved reference
//! graph, memoized per starting item.

mod calculator;

pub use calculator::{DependencyCalculator, DependencySet};
