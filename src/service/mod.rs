pub mod aggregator;
pub mod fields;
pub mod narrative;
pub mod normalizer;
pub mod workbook;

pub use aggregator::aggregate;
pub use narrative::NarrativeService;
pub use normalizer::parse;
