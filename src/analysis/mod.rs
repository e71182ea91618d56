//! Insight analysis.
//!
//! Templates, the generic fan-out utility, and the aggregator that ties
//! them to a completion service.

pub mod aggregator;
pub mod fanout;
pub mod templates;

pub use aggregator::{AggregatorConfig, InsightAggregator};
pub use templates::TemplateSet;
