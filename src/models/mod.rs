pub mod analysis;
pub mod listing;
pub mod metrics;

pub use analysis::{AnalysisPayload, Locale};
pub use listing::{Dataset, ListingRecord, SheetSummary};
pub use metrics::{CategorySlice, DatasetMetrics, MonthlyPoint, PriceBand};
