use crate::constants::NEXT_PAGE_SELECTOR;
use scraper::{Html, Selector};
use std::sync::OnceLock;

static NEXT_PAGE: OnceLock<Selector> = OnceLock::new();

/// Whether the listing markup offers a usable "Próxima" link.
///
/// The portal keeps the link on the last page but points it at `javascript:`.
pub fn has_next_page(html: &str) -> bool {
    has_next_page_in(&Html::parse_document(html))
}

/// Same as [`has_next_page`] on an already parsed document.
pub fn has_next_page_in(document: &Html) -> bool {
    let selector = NEXT_PAGE.get_or_init(|| {
        Selector::parse(NEXT_PAGE_SELECTOR).expect("NEXT_PAGE_SELECTOR is a valid CSS selector")
    });
    document
        .select(selector)
        .next()
        .map(|link| {
            !link
                .value()
                .attr("href")
                .unwrap_or_default()
                .contains("javascript:")
        })
        .unwrap_or(false)
}
