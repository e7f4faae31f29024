pub mod aggregator;
pub mod app;
pub mod config;
pub mod constants;
pub mod error;
pub mod extract;
pub mod infra;
pub mod observability;
pub mod orchestrator;
pub mod transport;
pub mod types;

pub use error::{EngineError, FetchError, Result};
pub use orchestrator::{CatalogRun, Orchestrator};
pub use types::{CatalogKind, ComparisonRecord, FieldValue, Identifier, ProductRecord};
