//! Operations over a loaded scene graph.

pub mod enrich;
pub mod query;

pub use enrich::{enrich_graph, EnrichOptions, EnrichReport, Enricher};
pub use query::{neighborhood, part_histogram};
