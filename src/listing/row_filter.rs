use super::year_filter::YearFilter;
use crate::constants::*;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;
use tracing::debug;

static TABLE_BODY: OnceLock<Selector> = OnceLock::new();
static ROW: OnceLock<Selector> = OnceLock::new();
static ISSUED_ICON: OnceLock<Selector> = OnceLock::new();
static ISSUE_DATE_CELL: OnceLock<Selector> = OnceLock::new();
static VALUE_CELL: OnceLock<Selector> = OnceLock::new();
static ISSUE_DATE_REGEX: OnceLock<Regex> = OnceLock::new();

fn selector(cell: &'static OnceLock<Selector>, css: &'static str) -> &'static Selector {
    cell.get_or_init(|| Selector::parse(css).expect("listing selectors are valid CSS"))
}

/// Why a page ended the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A row issued before the requested year was reached
    EarlierYear(u32),
    /// Rows were present but none matched the requested year
    EmptyPage,
    /// The page has no table body or no rows
    NoNotesFound,
    /// The pagination control has no usable "next" link
    LastPage,
    /// The portal answered with a non-200 status
    HttpStatus(u16),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EarlierYear(year) => {
                write!(f, "Encontrada nota emitida em {year}, anterior ao ano filtrado")
            }
            Self::EmptyPage => write!(f, "Página vazia"),
            Self::NoNotesFound => write!(f, "Nenhuma nota encontrada na página"),
            Self::LastPage => write!(f, "Última página alcançada"),
            Self::HttpStatus(code) => write!(f, "Página indisponível (HTTP {code})"),
        }
    }
}

/// Rows left out of the totals, by cause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowSkipCounts {
    /// Row lacks the "issued" status icon
    pub not_issued: u32,
    /// Date cell missing or not `DD/MM/YYYY`
    pub missing_date: u32,
    /// Issued after the requested year
    pub newer_year: u32,
    /// Value cell missing or not a number
    pub bad_value: u32,
}

impl RowSkipCounts {
    pub fn total(&self) -> u32 {
        self.not_issued + self.missing_date + self.newer_year + self.bad_value
    }

    pub fn add(&mut self, other: &RowSkipCounts) {
        self.not_issued += other.not_issued;
        self.missing_date += other.missing_date;
        self.newer_year += other.newer_year;
        self.bad_value += other.bad_value;
    }
}

/// Totals for one listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSummary {
    pub total: f64,
    pub count: u32,
    /// `false` once no later row or page can match
    pub continuation: bool,
    pub stop_reason: Option<StopReason>,
    pub skipped: RowSkipCounts,
}

impl PageSummary {
    fn stopped(reason: StopReason) -> Self {
        Self {
            total: 0.0,
            count: 0,
            continuation: false,
            stop_reason: Some(reason),
            skipped: RowSkipCounts::default(),
        }
    }
}

/// Issuance date as printed in the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueDate {
    pub day: u32,
    pub month: u32,
    pub year: u32,
}

/// Sums the invoices on one listing page that were issued in `year`.
///
/// Rows are expected newest first. Per row:
/// - rows without the "issued" icon or a `DD/MM/YYYY` date are skipped
/// - an issuance year after `year` skips the row only
/// - an issuance year before `year` stops the scan; that row and every later one is ignored
/// - a matching row adds its value; an unreadable value skips the row
///
/// A page with rows but no match and no explicit stop also ends the scan
/// ([`StopReason::EmptyPage`]). A page without table rows ends it with
/// [`StopReason::NoNotesFound`].
pub fn process_page(html: &str, year: YearFilter) -> PageSummary {
    let document = Html::parse_document(html);
    process_document(&document, year)
}

/// Same as [`process_page`] on an already parsed document.
pub fn process_document(document: &Html, year: YearFilter) -> PageSummary {
    let Some(tbody) = document
        .select(selector(&TABLE_BODY, TABLE_BODY_SELECTOR))
        .next()
    else {
        return PageSummary::stopped(StopReason::NoNotesFound);
    };

    let rows: Vec<ElementRef> = tbody.select(selector(&ROW, ROW_SELECTOR)).collect();
    if rows.is_empty() {
        return PageSummary::stopped(StopReason::NoNotesFound);
    }

    let mut summary = PageSummary {
        total: 0.0,
        count: 0,
        continuation: true,
        stop_reason: None,
        skipped: RowSkipCounts::default(),
    };

    for (index, row) in rows.iter().enumerate() {
        if row
            .select(selector(&ISSUED_ICON, ISSUED_ICON_SELECTOR))
            .next()
            .is_none()
        {
            summary.skipped.not_issued += 1;
            continue;
        }

        let Some(date) = row
            .select(selector(&ISSUE_DATE_CELL, ISSUE_DATE_SELECTOR))
            .next()
            .and_then(|cell| parse_issue_date(&cell_text(&cell)))
        else {
            summary.skipped.missing_date += 1;
            debug!(row = index, "Skipping row without a readable issuance date");
            continue;
        };

        match date.year.cmp(&year.year()) {
            Ordering::Less => {
                summary.continuation = false;
                summary.stop_reason = Some(StopReason::EarlierYear(date.year));
                debug!(row = index, issued_year = date.year, "Reached an earlier year");
                break;
            }
            Ordering::Greater => {
                summary.skipped.newer_year += 1;
                continue;
            }
            Ordering::Equal => {}
        }

        let value = row
            .select(selector(&VALUE_CELL, VALUE_SELECTOR))
            .next()
            .and_then(|cell| parse_brl_value(&cell_text(&cell)));
        match value {
            Some(value) => {
                summary.total += value;
                summary.count += 1;
            }
            None => {
                summary.skipped.bad_value += 1;
                debug!(row = index, "Skipping row with an unreadable value");
            }
        }
    }

    if summary.count == 0 && summary.stop_reason.is_none() {
        summary.continuation = false;
        summary.stop_reason = Some(StopReason::EmptyPage);
    }

    summary
}

/// Finds the first `DD/MM/YYYY` in `text`.
pub fn parse_issue_date(text: &str) -> Option<IssueDate> {
    let regex = ISSUE_DATE_REGEX.get_or_init(|| {
        Regex::new(ISSUE_DATE_REGEX_PATTERN).expect("ISSUE_DATE_REGEX_PATTERN is a valid regex")
    });
    let captures = regex.captures(text)?;
    Some(IssueDate {
        day: captures.get(1)?.as_str().parse().ok()?,
        month: captures.get(2)?.as_str().parse().ok()?,
        year: captures.get(3)?.as_str().parse().ok()?,
    })
}

/// Parses a pt-BR formatted amount: `.` groups thousands, `,` marks decimals.
///
/// `"1.234,56"` becomes `1234.56`. Anything that is not a finite number after
/// conversion yields `None`.
pub fn parse_brl_value(text: &str) -> Option<f64> {
    let normalized = text.trim().replace('.', "").replace(',', ".");
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Cell text with each text node trimmed and concatenated.
fn cell_text(cell: &ElementRef) -> String {
    cell.text().map(str::trim).collect()
}
