//! Issued-invoices listing: row filtering, pagination and the two scan loops.
//!
//! [`process_page`] holds the per-row stop logic. [`scan_all_pages`] drives
//! it across the whole listing; [`scan_single_page`] runs it for one page so
//! an external caller can drive the loop.

mod aggregator;
mod pagination;
mod row_filter;
mod year_filter;

// Re-export public API
pub use aggregator::{scan_all_pages, scan_single_page, PageReport, ScanTotals};
pub use pagination::{has_next_page, has_next_page_in};
pub use row_filter::{
    parse_brl_value, parse_issue_date, process_document, process_page, IssueDate, PageSummary,
    RowSkipCounts, StopReason,
};
pub use year_filter::YearFilter;
