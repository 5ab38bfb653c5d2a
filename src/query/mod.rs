//! Query module for tallydb
//! Handles date-range resolution and report aggregation over the store.

pub mod directory;
pub mod range;
pub mod report;

pub use directory::{DirectoryEntry, NameDirectory};
pub use range::{current_month_range, resolve_date_range, resolve_full_days, DateParseError, RangeBounds};
pub use report::{ConsolidatedSection, ReportAggregator, ReportError, ReportLine};
