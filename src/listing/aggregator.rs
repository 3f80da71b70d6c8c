use super::pagination::has_next_page_in;
use super::row_filter::{process_document, PageSummary, RowSkipCounts, StopReason};
use super::year_filter::YearFilter;
use crate::errors::AppResult;
use crate::session::{PageFetch, PortalSession};
use crate::utils::format_duration;
use scraper::Html;
use std::time::Instant;
use tracing::{info, warn};

/// Running totals of a full scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanTotals {
    pub total: f64,
    pub count: u32,
    /// Listing pages that were processed
    pub pages: u32,
    pub skipped: RowSkipCounts,
    /// What ended the scan
    pub stop_reason: Option<StopReason>,
}

impl ScanTotals {
    fn absorb(&mut self, summary: &PageSummary) {
        self.total += summary.total;
        self.count += summary.count;
        self.pages += 1;
        self.skipped.add(&summary.skipped);
    }
}

/// Outcome of processing a single caller-chosen page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageReport {
    pub page: u32,
    pub total: f64,
    pub count: u32,
    /// `true` when the caller should request `page + 1`
    pub has_next: bool,
    pub stop_reason: Option<StopReason>,
}

/// Row filter and pagination check over one parsed page.
///
/// Parsing stays in this synchronous helper so the `Html` tree never lives
/// across an `.await`.
fn evaluate_page(html: &str, year: YearFilter) -> (PageSummary, bool) {
    let document = Html::parse_document(html);
    let summary = process_document(&document, year);
    let next_control = has_next_page_in(&document);
    (summary, next_control)
}

fn log_skips(page: u32, skipped: &RowSkipCounts) {
    if skipped.total() > 0 {
        info!(
            page = page,
            not_issued = skipped.not_issued,
            missing_date = skipped.missing_date,
            newer_year = skipped.newer_year,
            bad_value = skipped.bad_value,
            "Rows left out of the totals"
        );
    }
    if skipped.missing_date > 0 || skipped.bad_value > 0 {
        warn!(
            page = page,
            missing_date = skipped.missing_date,
            bad_value = skipped.bad_value,
            "Issued rows could not be read; listing markup may have changed"
        );
    }
}

/// Walks the listing from page 1, summing invoices issued in `year`.
///
/// Stops when a page ends the scan (earlier year, empty page), the portal
/// answers with a non-200 status, or the pagination control has no next link.
/// There is no page cap.
///
/// # Errors
///
/// Only transport failures (timeouts, dropped connections) are errors.
pub async fn scan_all_pages(session: &PortalSession, year: YearFilter) -> AppResult<ScanTotals> {
    let started = Instant::now();
    let mut totals = ScanTotals::default();
    let mut page = 1;

    loop {
        let html = match session.fetch_page(page).await? {
            PageFetch::Html(html) => html,
            PageFetch::Unavailable(status) => {
                totals.stop_reason = Some(StopReason::HttpStatus(status));
                break;
            }
        };

        let (summary, next_control) = evaluate_page(&html, year);
        totals.absorb(&summary);
        log_skips(page, &summary.skipped);
        info!(
            page = page,
            page_total = summary.total,
            page_count = summary.count,
            running_total = totals.total,
            running_count = totals.count,
            "Listing page processed"
        );

        if !summary.continuation {
            totals.stop_reason = summary.stop_reason;
            break;
        }
        if !next_control {
            totals.stop_reason = Some(StopReason::LastPage);
            break;
        }
        page += 1;
    }

    info!(
        year = %year,
        pages = totals.pages,
        total = totals.total,
        count = totals.count,
        stop_reason = %totals.stop_reason.map(|r| r.to_string()).unwrap_or_default(),
        elapsed = %format_duration(started.elapsed()),
        "Listing scan completed"
    );
    Ok(totals)
}

/// Processes exactly one listing page.
///
/// Keeps no state between calls: the caller drives the loop, asking for
/// increasing pages while [`PageReport::has_next`] is `true`.
pub async fn scan_single_page(
    session: &PortalSession,
    year: YearFilter,
    page: u32,
) -> AppResult<PageReport> {
    let html = match session.fetch_page(page).await? {
        PageFetch::Html(html) => html,
        PageFetch::Unavailable(status) => {
            return Ok(PageReport {
                page,
                total: 0.0,
                count: 0,
                has_next: false,
                stop_reason: Some(StopReason::HttpStatus(status)),
            });
        }
    };

    let (summary, next_control) = evaluate_page(&html, year);
    log_skips(page, &summary.skipped);

    let (has_next, stop_reason) = if !summary.continuation {
        (false, summary.stop_reason)
    } else if !next_control {
        (false, Some(StopReason::LastPage))
    } else {
        (true, None)
    };

    info!(
        page = page,
        year = %year,
        page_total = summary.total,
        page_count = summary.count,
        has_next = has_next,
        "Listing page processed"
    );

    Ok(PageReport {
        page,
        total: summary.total,
        count: summary.count,
        has_next,
        stop_reason,
    })
}
