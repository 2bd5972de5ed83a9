//! Usage and complaint reporting: chat activity statistics, category
//! distribution and the chat usage log that feeds them.

pub mod dashboard;
pub mod usage;

pub use dashboard::ReportingAggregator;
pub use usage::UsageLog;
